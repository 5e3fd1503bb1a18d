use crate::classifier::WidgetKind;
use crate::config::{ApplyConfig, DefaultPolicy};
use crate::knowledge::{KnowledgeBase, Value};
use crate::semantic::{SemanticMatcher, TfIdfMatcher};

/// What the filler should put into a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Flag(bool),
    /// Whichever option comes first after the placeholders.
    FirstOption,
}

impl From<Value> for Answer {
    fn from(value: Value) -> Self {
        match value {
            Value::Text(text) => Answer::Text(text),
            Value::Flag(flag) => Answer::Flag(flag),
        }
    }
}

impl Answer {
    /// Text to match options against. `None` for [`Answer::FirstOption`].
    pub fn text(&self) -> Option<String> {
        match self {
            Answer::Text(text) => Some(text.clone()),
            Answer::Flag(flag) => Some(Value::Flag(*flag).as_text()),
            Answer::FirstOption => None,
        }
    }

    /// Boolean reading for checkboxes.
    pub fn truthy(&self) -> bool {
        match self {
            Answer::Flag(flag) => *flag,
            Answer::Text(text) => Value::Text(text.clone()).truthy(),
            Answer::FirstOption => true,
        }
    }
}

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    KnowledgeBase,
    SemanticFallback,
    KindDefault,
    /// Nothing applies; leave the field untouched.
    None,
}

impl std::fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnswerSource::KnowledgeBase => "knowledge-base",
            AnswerSource::SemanticFallback => "semantic",
            AnswerSource::KindDefault => "default",
            AnswerSource::None => "none",
        };
        f.write_str(name)
    }
}

/// An answer with its provenance. A value is present exactly when the
/// source is not [`AnswerSource::None`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    value: Option<Answer>,
    source: AnswerSource,
}

impl ResolvedValue {
    pub fn none() -> Self {
        Self {
            value: None,
            source: AnswerSource::None,
        }
    }

    fn found(value: Answer, source: AnswerSource) -> Self {
        debug_assert!(source != AnswerSource::None);
        Self {
            value: Some(value),
            source,
        }
    }

    pub fn value(&self) -> Option<&Answer> {
        self.value.as_ref()
    }

    pub fn source(&self) -> AnswerSource {
        self.source
    }

    pub fn is_none(&self) -> bool {
        self.source == AnswerSource::None
    }
}

/// Knowledge base first, then the similarity matcher, then per-kind defaults.
///
/// Immutable for the session; `resolve` has no side effects.
pub struct AnswerResolver {
    knowledge: KnowledgeBase,
    semantic: Option<Box<dyn SemanticMatcher>>,
    threshold: f64,
    defaults: DefaultPolicy,
    identity: String,
}

impl AnswerResolver {
    pub fn new(knowledge: KnowledgeBase, defaults: DefaultPolicy, identity: impl Into<String>) -> Self {
        Self {
            knowledge,
            semantic: None,
            threshold: 1.0,
            defaults,
            identity: identity.into(),
        }
    }

    /// Build from configuration, including the TF-IDF matcher when a
    /// `[semantic]` section is present.
    pub fn from_config(config: &ApplyConfig) -> Self {
        let resolver = Self::new(
            KnowledgeBase::new(&config.knowledge),
            config.defaults.clone(),
            config.identity.clone(),
        );
        match &config.semantic {
            Some(semantic) if !semantic.entries.is_empty() => resolver.with_semantic(
                Box::new(TfIdfMatcher::new(&semantic.entries)),
                semantic.threshold,
            ),
            _ => resolver,
        }
    }

    /// Consult `matcher` for labels the knowledge base misses; its answer is
    /// used when the confidence is at least `threshold`.
    pub fn with_semantic(mut self, matcher: Box<dyn SemanticMatcher>, threshold: f64) -> Self {
        self.semantic = Some(matcher);
        self.threshold = threshold;
        self
    }

    pub fn resolve(&self, label: &str, kind: WidgetKind) -> ResolvedValue {
        // The country code picker always gets the configured code.
        if kind == WidgetKind::CountryCode {
            return ResolvedValue::found(
                Answer::Text(self.defaults.country_code.clone()),
                AnswerSource::KindDefault,
            );
        }

        if let Some(answer) = self.knowledge.lookup(label) {
            return ResolvedValue::found(answer.clone().into(), AnswerSource::KnowledgeBase);
        }

        if let Some(matcher) = &self.semantic {
            if let Some(hit) = matcher.find_match(label) {
                if hit.confidence >= self.threshold {
                    return ResolvedValue::found(hit.answer.into(), AnswerSource::SemanticFallback);
                }
            }
        }

        self.kind_default(&label.to_lowercase(), kind)
    }

    fn kind_default(&self, label: &str, kind: WidgetKind) -> ResolvedValue {
        let answer = match kind {
            WidgetKind::Text => {
                if label.contains("email") && !self.identity.is_empty() {
                    Some(Answer::Text(self.identity.clone()))
                } else if label.contains("phone") || label.contains("mobile") {
                    Some(Answer::Text(self.defaults.phone.clone()))
                } else if label.contains("year") || label.contains("experience") {
                    Some(Answer::Text(self.defaults.years_experience.clone()))
                } else {
                    None
                }
            }
            WidgetKind::Checkbox => self
                .defaults
                .check_unmatched_checkboxes
                .then_some(Answer::Flag(true)),
            WidgetKind::Radio => {
                if label.contains("sponsorship") || label.contains("visa") {
                    self.defaults.sponsorship_answer.clone().map(Answer::Text)
                } else {
                    None
                }
            }
            WidgetKind::NativeSelect | WidgetKind::CustomDropdown => Some(Answer::FirstOption),
            WidgetKind::CountryCode => Some(Answer::Text(self.defaults.country_code.clone())),
        };

        match answer {
            Some(answer) => ResolvedValue::found(answer, AnswerSource::KindDefault),
            None => ResolvedValue::none(),
        }
    }
}
