use serde::Deserialize;

/// An answer as written in configuration, or a value read back from a field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Flag(bool),
    Text(String),
}

impl Value {
    /// Boolean reading of the value, for checkboxes.
    ///
    /// `no`, `false`, `0`, `off` and blank strings are negative.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Flag(flag) => *flag,
            Value::Text(text) => {
                let text = text.trim().to_ascii_lowercase();
                !matches!(text.as_str(), "" | "no" | "false" | "0" | "off")
            }
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Value::Flag(true) => "Yes".to_string(),
            Value::Flag(false) => "No".to_string(),
            Value::Text(text) => text.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Flag(b)
    }
}

/// One question fragment → answer pair.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: Value,
}

/// Ordered fragment → answer lookup.
///
/// A label matches an entry when the entry's lower-cased fragment is a
/// substring of the lower-cased label. Entries are scanned in insertion
/// order and the first hit wins, so put specific fragments before general
/// ones.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<(String, Value)>,
}

impl KnowledgeBase {
    pub fn new(entries: &[KnowledgeEntry]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|e| (e.question.trim().to_lowercase(), e.answer.clone()))
                .filter(|(fragment, _)| !fragment.is_empty())
                .collect(),
        }
    }

    /// First entry whose fragment occurs in `label`.
    pub fn lookup(&self, label: &str) -> Option<&Value> {
        let label = label.to_lowercase();
        self.entries
            .iter()
            .find(|(fragment, _)| label.contains(fragment.as_str()))
            .map(|(_, answer)| answer)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
