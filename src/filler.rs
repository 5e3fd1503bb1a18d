use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::classifier::{FieldDescriptor, WidgetKind};
use crate::config::ApplyConfig;
use crate::error::{Error, Result};
use crate::knowledge::Value;
use crate::provider::{DocumentProvider, SelectOption, Selector, WaitCondition};
use crate::resolver::{Answer, ResolvedValue};
use crate::selectors;

/// Result of filling one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    /// The field was changed; carries what was entered or chosen.
    Filled(String),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyPopulated,
    NoAnswer,
    Disabled,
    /// The field already has the state the answer asks for.
    AlreadyInTargetState,
    NoMatchingOption,
}

/// Ways to pick a value in a custom dropdown, tried in [`DROPDOWN_STRATEGIES`]
/// order until one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownStrategy {
    /// Click the open option whose text matches the answer.
    ClickMatching,
    /// Click the first open option that is not a placeholder.
    ClickFirst,
    /// Type the answer into the dropdown's search box and take the first hit.
    SearchAndPick,
}

pub const DROPDOWN_STRATEGIES: [DropdownStrategy; 3] = [
    DropdownStrategy::ClickMatching,
    DropdownStrategy::ClickFirst,
    DropdownStrategy::SearchAndPick,
];

/// Applies resolved answers to classified fields through a provider.
///
/// Already populated fields are left untouched, so a second pass over the
/// same page is a no-op.
pub struct FormFiller<'a, D> {
    doc: &'a D,
    config: &'a ApplyConfig,
}

impl<'a, D: DocumentProvider> FormFiller<'a, D> {
    pub fn new(doc: &'a D, config: &'a ApplyConfig) -> Self {
        Self { doc, config }
    }

    /// Fill `field` with `resolved`.
    ///
    /// Errors are scoped to this field; the caller records them and moves on.
    pub async fn fill(
        &self,
        field: &FieldDescriptor<D::Handle>,
        resolved: &ResolvedValue,
    ) -> Result<FillOutcome> {
        // The country code is compared against its target instead.
        if field.kind != WidgetKind::CountryCode && field.is_populated() {
            return Ok(FillOutcome::Skipped(SkipReason::AlreadyPopulated));
        }

        match field.kind {
            WidgetKind::Text => self.fill_text(&field.handle, resolved.value()).await,
            WidgetKind::Checkbox => self.fill_checkbox(&field.handle, resolved.value()).await,
            WidgetKind::Radio => self.fill_radio(&field.handle, resolved.value()).await,
            WidgetKind::NativeSelect => self.fill_native_select(&field.handle, resolved.value()).await,
            WidgetKind::CustomDropdown => self.fill_dropdown(&field.handle, resolved.value()).await,
            WidgetKind::CountryCode => self.fill_country_code(field, resolved.value()).await,
        }
    }

    fn keystroke_delay(&self) -> Duration {
        let typing = &self.config.typing;
        if typing.max_delay_ms == 0 {
            return Duration::ZERO;
        }
        let min = typing.min_delay_ms.min(typing.max_delay_ms);
        let ms = rand::rng().random_range(min..=typing.max_delay_ms);
        Duration::from_millis(ms)
    }

    async fn pause(&self) {
        let delay = self.keystroke_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Type `text` one character at a time.
    async fn type_slowly(&self, handle: &D::Handle, text: &str) -> Result<()> {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.doc.type_text(handle, ch.encode_utf8(&mut buf)).await?;
            self.pause().await;
        }
        Ok(())
    }

    async fn fill_text(&self, handle: &D::Handle, answer: Option<&Answer>) -> Result<FillOutcome> {
        let Some(text) = answer.and_then(Answer::text) else {
            return Ok(FillOutcome::Skipped(SkipReason::NoAnswer));
        };

        self.doc.scroll_into_view(handle).await?;
        self.doc.clear(handle).await?;
        self.type_slowly(handle, &text).await?;
        Ok(FillOutcome::Filled(text))
    }

    async fn fill_checkbox(&self, handle: &D::Handle, answer: Option<&Answer>) -> Result<FillOutcome> {
        if !self.doc.is_enabled(handle).await? {
            return Ok(FillOutcome::Skipped(SkipReason::Disabled));
        }
        let Some(answer) = answer else {
            return Ok(FillOutcome::Skipped(SkipReason::NoAnswer));
        };
        // Checked boxes never reach here, so an unticked box is already
        // where a negative answer wants it.
        if !answer.truthy() {
            return Ok(FillOutcome::Skipped(SkipReason::AlreadyInTargetState));
        }

        self.doc.scroll_into_view(handle).await?;
        self.doc.click(handle).await?;
        Ok(FillOutcome::Filled("checked".into()))
    }

    async fn fill_radio(&self, group: &D::Handle, answer: Option<&Answer>) -> Result<FillOutcome> {
        let Some(answer) = answer else {
            return Ok(FillOutcome::Skipped(SkipReason::NoAnswer));
        };

        let radios = self
            .doc
            .find_within(group, &Selector::css(selectors::RADIO_OPTIONS))
            .await?;
        let mut labelled = Vec::with_capacity(radios.len());
        for radio in radios {
            let label = self.radio_label(&radio).await?;
            labelled.push((label, radio));
        }

        let chosen = match answer.text() {
            Some(want) => best_match(&want, labelled.iter().map(|(label, _)| label.as_str()))
                .map(|i| &labelled[i]),
            None => labelled.first(),
        };
        let Some((label, radio)) = chosen else {
            return Ok(FillOutcome::Skipped(SkipReason::NoMatchingOption));
        };

        self.doc.scroll_into_view(radio).await?;
        self.doc.click(radio).await?;
        Ok(FillOutcome::Filled(label.clone()))
    }

    /// `aria-label`, then the `value` attribute, then visible text.
    async fn radio_label(&self, radio: &D::Handle) -> Result<String> {
        for attr in ["aria-label", "value"] {
            if let Some(v) = self.doc.attribute(radio, attr).await? {
                if !v.trim().is_empty() {
                    return Ok(v.trim().to_string());
                }
            }
        }
        self.doc.text(radio).await
    }

    async fn fill_native_select(
        &self,
        handle: &D::Handle,
        answer: Option<&Answer>,
    ) -> Result<FillOutcome> {
        let options = self.doc.options(handle).await?;
        let choices: Vec<&SelectOption> = options
            .iter()
            .filter(|o| !self.config.is_placeholder(&o.text))
            .collect();

        let matched = answer
            .and_then(Answer::text)
            .and_then(|want| best_match(&want, choices.iter().map(|o| o.text.as_str())));
        let Some(option) = matched.map(|i| choices[i]).or_else(|| choices.first().copied()) else {
            return Ok(FillOutcome::Skipped(SkipReason::NoMatchingOption));
        };

        self.doc.scroll_into_view(handle).await?;
        self.doc.select_option(handle, &option.value).await?;
        Ok(FillOutcome::Filled(option.text.clone()))
    }

    async fn fill_country_code(
        &self,
        field: &FieldDescriptor<D::Handle>,
        answer: Option<&Answer>,
    ) -> Result<FillOutcome> {
        let Some(code) = answer.and_then(Answer::text) else {
            return Ok(FillOutcome::Skipped(SkipReason::NoAnswer));
        };
        if let Some(Value::Text(current)) = &field.current {
            if current.eq_ignore_ascii_case(&code) {
                return Ok(FillOutcome::Skipped(SkipReason::AlreadyInTargetState));
            }
        }

        let options = self.doc.options(&field.handle).await?;
        let Some(option) = options.iter().find(|o| o.value.eq_ignore_ascii_case(&code)) else {
            return Ok(FillOutcome::Skipped(SkipReason::NoMatchingOption));
        };

        self.doc.scroll_into_view(&field.handle).await?;
        self.doc.select_option(&field.handle, &option.value).await?;
        Ok(FillOutcome::Filled(option.value.clone()))
    }

    async fn fill_dropdown(&self, handle: &D::Handle, answer: Option<&Answer>) -> Result<FillOutcome> {
        let want = answer.and_then(Answer::text);

        self.doc.scroll_into_view(handle).await?;
        self.doc.click(handle).await?;
        self.pause().await;

        let mut matched_but_unclickable = false;
        for strategy in DROPDOWN_STRATEGIES {
            // The wanted option exists; any other option would be a wrong answer.
            if matched_but_unclickable && strategy == DropdownStrategy::ClickFirst {
                continue;
            }
            match self.try_dropdown_strategy(strategy, handle, want.as_deref()).await {
                Ok(Some(chosen)) => return Ok(FillOutcome::Filled(chosen)),
                Ok(None) => debug!(?strategy, "dropdown strategy not applicable"),
                Err(e) => {
                    debug!(?strategy, error = %e, "dropdown strategy failed");
                    matched_but_unclickable |= strategy == DropdownStrategy::ClickMatching;
                }
            }
        }

        // Collapse the popup so it does not cover the fields after it.
        if let Err(e) = self.doc.click(handle).await {
            debug!(error = %e, "could not close dropdown");
        }
        Err(Error::InteractionFailed(format!(
            "no dropdown strategy could pick {}",
            want.as_deref().unwrap_or("an option")
        )))
    }

    /// Run one dropdown strategy. `Ok(None)` means it does not apply here;
    /// `Err` from `ClickMatching` means the wanted option was found but could
    /// not be clicked.
    pub async fn try_dropdown_strategy(
        &self,
        strategy: DropdownStrategy,
        dropdown: &D::Handle,
        want: Option<&str>,
    ) -> Result<Option<String>> {
        match strategy {
            DropdownStrategy::ClickMatching => {
                let Some(want) = want else { return Ok(None) };
                let options = self.open_options().await?;
                let Some(i) = best_match(want, options.iter().map(|(text, _)| text.as_str())) else {
                    return Ok(None);
                };
                let (text, option) = &options[i];
                self.doc.click(option).await?;
                Ok(Some(text.clone()))
            }
            DropdownStrategy::ClickFirst => {
                let options = self.open_options().await?;
                let Some((text, option)) = options.first() else {
                    return Ok(None);
                };
                self.doc.click(option).await?;
                Ok(Some(text.clone()))
            }
            DropdownStrategy::SearchAndPick => {
                let Some(want) = want else { return Ok(None) };
                let search = match self
                    .doc
                    .find_within(dropdown, &Selector::css(selectors::DROPDOWN_SEARCH))
                    .await?
                    .into_iter()
                    .next()
                {
                    Some(input) => input,
                    None => self.doc.find(&Selector::css(selectors::PAGE_SEARCH)).await?,
                };
                self.type_slowly(&search, want).await?;
                let first = self
                    .doc
                    .wait_until(
                        &Selector::css(selectors::DROPDOWN_OPTIONS),
                        WaitCondition::Clickable,
                        self.config.wait_timeout(),
                    )
                    .await?;
                let text = self.doc.text(&first).await?;
                self.doc.click(&first).await?;
                Ok(Some(text))
            }
        }
    }

    /// Displayed, non-placeholder options of the open dropdown with their text.
    async fn open_options(&self) -> Result<Vec<(String, D::Handle)>> {
        let mut open = Vec::new();
        for option in self
            .doc
            .find_all(&Selector::css(selectors::DROPDOWN_OPTIONS))
            .await?
        {
            if !self.doc.is_displayed(&option).await? {
                continue;
            }
            let text = self.doc.text(&option).await?;
            if !self.config.is_placeholder(&text) {
                open.push((text, option));
            }
        }
        Ok(open)
    }
}

/// Index of the candidate equal to `want` (ignoring case), else the first
/// one containing it.
fn best_match<'s>(want: &str, mut candidates: impl Iterator<Item = &'s str> + Clone) -> Option<usize> {
    let want = want.trim().to_lowercase();
    if want.is_empty() {
        return None;
    }
    candidates
        .clone()
        .position(|c| c.trim().to_lowercase() == want)
        .or_else(|| candidates.position(|c| c.to_lowercase().contains(&want)))
}
