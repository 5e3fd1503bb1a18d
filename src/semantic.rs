use std::collections::{HashMap, HashSet};

use crate::knowledge::{KnowledgeEntry, Value};

/// A similarity hit with its confidence in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatch {
    pub answer: Value,
    pub confidence: f64,
}

/// Finds the stored answer whose question reads most like `query`.
///
/// Implementations report their best candidate; the caller decides whether
/// the confidence is high enough to use it.
pub trait SemanticMatcher: Send + Sync {
    fn find_match(&self, query: &str) -> Option<SemanticMatch>;
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "any", "are", "as", "at", "be", "by", "can", "do", "does", "for",
    "from", "have", "how", "i", "if", "in", "is", "it", "many", "me", "much", "of", "on", "or",
    "our", "please", "so", "that", "the", "this", "to", "us", "was", "we", "what", "when",
    "which", "will", "with", "would", "you", "your",
];

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// TF-IDF vectors over the stored questions, compared by cosine similarity.
pub struct TfIdfMatcher {
    idf: HashMap<String, f64>,
    vectors: Vec<HashMap<String, f64>>,
    answers: Vec<Value>,
}

impl TfIdfMatcher {
    pub fn new(entries: &[KnowledgeEntry]) -> Self {
        let docs: Vec<Vec<String>> = entries.iter().map(|e| tokenize(&e.question)).collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in &docs {
            let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_default() += 1;
            }
        }

        // Smoothed idf: ln((1 + n) / (1 + df)) + 1
        let n = docs.len() as f64;
        let idf: HashMap<String, f64> = doc_freq
            .into_iter()
            .map(|(term, df)| (term.to_string(), ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0))
            .collect();

        let vectors = docs.iter().map(|doc| weigh(doc, &idf)).collect();

        Self {
            idf,
            vectors,
            answers: entries.iter().map(|e| e.answer.clone()).collect(),
        }
    }
}

fn weigh(tokens: &[String], idf: &HashMap<String, f64>) -> HashMap<String, f64> {
    let mut tf: HashMap<String, f64> = HashMap::new();
    for token in tokens {
        if idf.contains_key(token) {
            *tf.entry(token.clone()).or_default() += 1.0;
        }
    }
    for (term, weight) in tf.iter_mut() {
        *weight *= idf[term];
    }
    tf
}

fn cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a.iter().filter_map(|(t, w)| b.get(t).map(|v| w * v)).sum();
    let norm_a = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl SemanticMatcher for TfIdfMatcher {
    fn find_match(&self, query: &str) -> Option<SemanticMatch> {
        let query = weigh(&tokenize(query), &self.idf);
        if query.is_empty() {
            return None;
        }

        // Ties keep the earliest entry.
        let mut best: Option<(usize, f64)> = None;
        for (i, vector) in self.vectors.iter().enumerate() {
            let score = cosine(&query, vector);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }

        best.filter(|(_, score)| *score > 0.0).map(|(i, score)| SemanticMatch {
            answer: self.answers[i].clone(),
            confidence: score.min(1.0),
        })
    }
}
