use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};

/// How to locate elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A CSS selector list, e.g. `"input[type='text'], select"`.
    Css(String),
    /// An XPath expression evaluated against the document.
    XPath(String),
    /// A `<button>` whose visible text contains the string.
    ButtonText(String),
}

impl Selector {
    pub fn css(s: impl Into<String>) -> Self {
        Selector::Css(s.into())
    }

    pub fn button_text(s: impl Into<String>) -> Self {
        Selector::ButtonText(s.into())
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Css(s) => write!(f, "css `{s}`"),
            Selector::XPath(s) => write!(f, "xpath `{s}`"),
            Selector::ButtonText(s) => write!(f, "button containing \"{s}\""),
        }
    }
}

/// What `wait_until` waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// The element exists in the document.
    Present,
    /// The element is displayed and enabled.
    Clickable,
}

/// One `<option>` of a native select.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectOption {
    pub text: String,
    pub value: String,
    #[serde(default)]
    pub selected: bool,
}

/// One exclusive, stateful view of a live document.
///
/// Handles are opaque: they only go back to the provider that produced them
/// and may go stale as soon as the document changes.
///
/// A provider is owned by a single session and driven from a single task;
/// no two call sites mutate it at the same time.
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    type Handle: Send + Sync + 'static;

    // ── Discovery ───────────────────────────────────────────────────

    /// All elements matching `selector`, in document order.
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Self::Handle>>;

    /// First element matching `selector`.
    async fn find(&self, selector: &Selector) -> Result<Self::Handle> {
        self.find_all(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::ElementNotFound(selector.to_string()))
    }

    /// Descendants of `scope` matching `selector`.
    async fn find_within(
        &self,
        scope: &Self::Handle,
        selector: &Selector,
    ) -> Result<Vec<Self::Handle>>;

    /// Poll for an element matching `selector` until `condition` holds.
    /// Fails with [`Error::Timeout`] once `timeout` has elapsed.
    async fn wait_until(
        &self,
        selector: &Selector,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<Self::Handle>;

    // ── Actions ─────────────────────────────────────────────────────

    async fn click(&self, handle: &Self::Handle) -> Result<()>;

    /// Type `text` at the end of the element's current content.
    async fn type_text(&self, handle: &Self::Handle, text: &str) -> Result<()>;

    /// Empty a text entry.
    async fn clear(&self, handle: &Self::Handle) -> Result<()>;

    /// Choose the option of a native select whose value attribute is `value`.
    async fn select_option(&self, handle: &Self::Handle, value: &str) -> Result<()>;

    async fn scroll_into_view(&self, handle: &Self::Handle) -> Result<()>;

    // ── Introspection ───────────────────────────────────────────────

    /// Checked state for checkboxes and radios, selected state for options.
    async fn is_selected(&self, handle: &Self::Handle) -> Result<bool>;

    async fn is_enabled(&self, handle: &Self::Handle) -> Result<bool>;

    async fn is_displayed(&self, handle: &Self::Handle) -> Result<bool>;

    async fn attribute(&self, handle: &Self::Handle, name: &str) -> Result<Option<String>>;

    /// Visible text, trimmed.
    async fn text(&self, handle: &Self::Handle) -> Result<String>;

    /// Current value of an input, empty when unset.
    async fn value(&self, handle: &Self::Handle) -> Result<String>;

    /// Options of a native select, in document order.
    async fn options(&self, handle: &Self::Handle) -> Result<Vec<SelectOption>>;

    /// Text of a `<label for=…>` or enclosing `<label>`.
    async fn associated_label(&self, handle: &Self::Handle) -> Result<Option<String>>;

    /// Text of the element immediately preceding this one.
    async fn preceding_sibling_text(&self, handle: &Self::Handle) -> Result<Option<String>>;

    /// Visible text of the element's parent.
    async fn container_text(&self, handle: &Self::Handle) -> Result<String>;

    // ── Side effects ────────────────────────────────────────────────

    /// Record the current document state under `name` (e.g. a screenshot).
    async fn checkpoint(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}
