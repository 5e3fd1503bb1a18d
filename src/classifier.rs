use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::Result;
use crate::knowledge::Value;
use crate::provider::{DocumentProvider, Selector};
use crate::selectors;

/// Interaction category of a form element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Text,
    Checkbox,
    /// A whole radio group.
    Radio,
    NativeSelect,
    CustomDropdown,
    CountryCode,
}

impl std::fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WidgetKind::Text => "text",
            WidgetKind::Checkbox => "checkbox",
            WidgetKind::Radio => "radio",
            WidgetKind::NativeSelect => "select",
            WidgetKind::CustomDropdown => "dropdown",
            WidgetKind::CountryCode => "country-code",
        };
        f.write_str(name)
    }
}

/// A classified element of the current page.
///
/// Only valid until the document changes; rebuild after every navigation.
#[derive(Debug)]
pub struct FieldDescriptor<H> {
    pub handle: H,
    pub kind: WidgetKind,
    pub label: String,
    /// What the element shows right now. `None` means empty or unselected.
    pub current: Option<Value>,
}

impl<H> FieldDescriptor<H> {
    /// Whether the field already holds an answer and must be left alone.
    pub fn is_populated(&self) -> bool {
        match &self.current {
            None => false,
            Some(Value::Flag(flag)) => *flag,
            Some(Value::Text(text)) => !text.trim().is_empty(),
        }
    }
}

/// Structural rule an element was discovered by, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Text,
    Checkbox,
    RadioGroup,
    Select,
    Dropdown,
}

impl Rule {
    const ORDER: [Rule; 5] = [
        Rule::Text,
        Rule::Checkbox,
        Rule::RadioGroup,
        Rule::Select,
        Rule::Dropdown,
    ];

    fn selector(self) -> &'static str {
        match self {
            Rule::Text => selectors::TEXT_INPUTS,
            Rule::Checkbox => selectors::CHECKBOXES,
            Rule::RadioGroup => selectors::RADIO_GROUPS,
            Rule::Select => selectors::NATIVE_SELECTS,
            Rule::Dropdown => selectors::CUSTOM_DROPDOWNS,
        }
    }
}

/// Scans pages for fillable fields.
#[derive(Debug, Clone)]
pub struct FieldClassifier {
    placeholders: Vec<String>,
}

impl FieldClassifier {
    pub fn new(placeholders: Vec<String>) -> Self {
        Self { placeholders }
    }

    fn is_placeholder(&self, text: &str) -> bool {
        let text = text.trim();
        text.is_empty() || self.placeholders.iter().any(|p| p.eq_ignore_ascii_case(text))
    }

    /// Lazily classify the page's visible interactive elements.
    ///
    /// Candidates are collected up front, one query per rule; each element is
    /// introspected only when the stream is polled for it. Elements that
    /// cannot be introspected (detached, hidden, no options) are skipped.
    /// The stream is single-use: call again after the page changes.
    pub async fn classify<'a, D: DocumentProvider>(
        &'a self,
        doc: &'a D,
    ) -> impl Stream<Item = FieldDescriptor<D::Handle>> + 'a {
        let mut candidates = Vec::new();
        for rule in Rule::ORDER {
            match doc.find_all(&Selector::css(rule.selector())).await {
                Ok(found) => candidates.extend(found.into_iter().map(|h| (rule, h))),
                Err(e) => warn!(?rule, error = %e, "field discovery failed; skipping rule"),
            }
        }

        stream::iter(candidates).filter_map(move |(rule, handle)| async move {
            match self.inspect(doc, rule, handle).await {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    debug!(?rule, error = %e, "skipping element that could not be inspected");
                    None
                }
            }
        })
    }

    async fn inspect<D: DocumentProvider>(
        &self,
        doc: &D,
        rule: Rule,
        handle: D::Handle,
    ) -> Result<Option<FieldDescriptor<D::Handle>>> {
        if !doc.is_displayed(&handle).await? {
            return Ok(None);
        }

        let (kind, label, current) = match rule {
            Rule::Text => {
                let value = doc.value(&handle).await?;
                let current = (!value.trim().is_empty()).then(|| Value::Text(value));
                (WidgetKind::Text, accessible_name(doc, &handle).await?, current)
            }
            Rule::Checkbox => {
                let checked = doc.is_selected(&handle).await?;
                (
                    WidgetKind::Checkbox,
                    accessible_name(doc, &handle).await?,
                    Some(Value::Flag(checked)),
                )
            }
            Rule::RadioGroup => {
                let radios = doc.find_within(&handle, &Selector::css(selectors::RADIO_OPTIONS)).await?;
                if radios.is_empty() {
                    return Ok(None);
                }
                let mut answered = false;
                for radio in &radios {
                    if doc.is_selected(radio).await? {
                        answered = true;
                        break;
                    }
                }
                let current = answered.then_some(Value::Flag(true));
                (WidgetKind::Radio, group_label(doc, &handle).await?, current)
            }
            Rule::Select => {
                let options = doc.options(&handle).await?;
                if options.is_empty() {
                    return Ok(None);
                }
                let container = doc.container_text(&handle).await?.to_lowercase();
                let kind = if container.contains(selectors::COUNTRY_CODE_MARKER) {
                    WidgetKind::CountryCode
                } else {
                    WidgetKind::NativeSelect
                };
                let current = match (kind, options.iter().find(|o| o.selected)) {
                    (WidgetKind::CountryCode, Some(o)) => Some(Value::Text(o.value.clone())),
                    (_, Some(o)) if !self.is_placeholder(&o.text) => Some(Value::Text(o.text.clone())),
                    _ => None,
                };
                (kind, accessible_name(doc, &handle).await?, current)
            }
            Rule::Dropdown => {
                let shown = doc.text(&handle).await?;
                let current = (!self.is_placeholder(&shown)).then(|| Value::Text(shown));
                (WidgetKind::CustomDropdown, accessible_name(doc, &handle).await?, current)
            }
        };

        Ok(Some(FieldDescriptor {
            handle,
            kind,
            label,
            current,
        }))
    }
}

/// `aria-label`, then an associated `<label>`, then `placeholder`.
async fn accessible_name<D: DocumentProvider>(doc: &D, handle: &D::Handle) -> Result<String> {
    if let Some(name) = doc.attribute(handle, "aria-label").await? {
        if !name.trim().is_empty() {
            return Ok(name.trim().to_string());
        }
    }
    if let Some(label) = doc.associated_label(handle).await? {
        if !label.trim().is_empty() {
            return Ok(label.trim().to_string());
        }
    }
    Ok(doc
        .attribute(handle, "placeholder")
        .await?
        .map(|p| p.trim().to_string())
        .unwrap_or_default())
}

/// `<legend>` text, falling back to the preceding sibling's text.
async fn group_label<D: DocumentProvider>(doc: &D, group: &D::Handle) -> Result<String> {
    let legends = doc.find_within(group, &Selector::css(selectors::LEGEND)).await?;
    if let Some(legend) = legends.first() {
        let text = doc.text(legend).await?;
        if !text.trim().is_empty() {
            return Ok(text.trim().to_string());
        }
    }
    Ok(doc
        .preceding_sibling_text(group)
        .await?
        .map(|t| t.trim().to_string())
        .unwrap_or_default())
}
