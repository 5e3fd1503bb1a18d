use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::classifier::{FieldClassifier, WidgetKind};
use crate::config::{ApplyConfig, StepConfig};
use crate::error::Error;
use crate::filler::{FillOutcome, FormFiller};
use crate::provider::{DocumentProvider, Selector, WaitCondition};
use crate::resolver::{AnswerResolver, AnswerSource};
use crate::selectors;

/// Navigation controls, in the order they are looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavControl {
    Next,
    Review,
    Submit,
}

impl NavControl {
    pub const ORDER: [NavControl; 3] = [NavControl::Next, NavControl::Review, NavControl::Submit];

    pub fn label(self, steps: &StepConfig) -> &str {
        match self {
            NavControl::Next => &steps.next_label,
            NavControl::Review => &steps.review_label,
            NavControl::Submit => &steps.submit_label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The page offered no navigation control. Often just the end of a
    /// flow without a final submit.
    NoNavigationControl,
    /// Controls were present but every click failed.
    NavigationFailed,
    /// `max_steps` fill passes ran without reaching a terminal state.
    StepLimitReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyState {
    Filling,
    Advancing,
    Submitted,
    Aborted(AbortReason),
}

impl ApplyState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ApplyState::Submitted | ApplyState::Aborted(_))
    }
}

/// What happened to one field.
#[derive(Debug, Clone)]
pub struct FieldReport {
    pub label: String,
    pub kind: WidgetKind,
    pub source: AnswerSource,
    /// The outcome, or the error message when filling failed.
    pub outcome: Result<FillOutcome, String>,
}

/// One fill pass over one page.
#[derive(Debug, Clone, Default)]
pub struct PageReport {
    pub step: usize,
    pub fields: Vec<FieldReport>,
}

impl PageReport {
    pub fn filled(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| matches!(f.outcome, Ok(FillOutcome::Filled(_))))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields.iter().filter(|f| f.outcome.is_err())
    }
}

/// Final state of one application plus what each page pass did.
#[derive(Debug, Clone)]
pub struct ApplicationOutcome {
    pub state: ApplyState,
    pub pages: Vec<PageReport>,
    pub confirmation_dismissed: bool,
}

impl ApplicationOutcome {
    pub fn fill_passes(&self) -> usize {
        self.pages.len()
    }

    pub fn is_submitted(&self) -> bool {
        self.state == ApplyState::Submitted
    }
}

/// Drives one application through its wizard pages.
///
/// ```text
/// Filling ──fill page──▶ Advancing ──Next/Review──▶ Filling
///                            │
///                            ├──Submit application──▶ Submitted
///                            └──no control───────────▶ Aborted
/// ```
///
/// Every `Filling` entry counts against `steps.max_steps`, so a page that
/// keeps regenerating its "Next" button still terminates.
pub struct StepController<'a, D> {
    doc: &'a D,
    config: &'a ApplyConfig,
    resolver: &'a AnswerResolver,
    classifier: FieldClassifier,
    filler: FormFiller<'a, D>,
}

impl<'a, D: DocumentProvider> StepController<'a, D> {
    pub fn new(doc: &'a D, config: &'a ApplyConfig, resolver: &'a AnswerResolver) -> Self {
        Self {
            doc,
            config,
            resolver,
            classifier: FieldClassifier::new(config.placeholders.clone()),
            filler: FormFiller::new(doc, config),
        }
    }

    /// Run the wizard to a terminal state, then try to dismiss the
    /// confirmation overlay.
    pub async fn run(&self) -> ApplicationOutcome {
        let mut state = ApplyState::Filling;
        let mut pages = Vec::new();

        while !state.is_terminal() {
            state = match state {
                ApplyState::Filling if pages.len() >= self.config.steps.max_steps => {
                    warn!(max_steps = self.config.steps.max_steps, "step limit reached");
                    ApplyState::Aborted(AbortReason::StepLimitReached)
                }
                ApplyState::Filling => {
                    let report = self.fill_page(pages.len() + 1).await;
                    pages.push(report);
                    ApplyState::Advancing
                }
                ApplyState::Advancing => match self.advance().await {
                    Ok(NavControl::Submit) => {
                        info!(steps = pages.len(), "application submitted");
                        ApplyState::Submitted
                    }
                    Ok(_) => ApplyState::Filling,
                    Err(reason) => {
                        info!(?reason, steps = pages.len(), "application flow stopped");
                        ApplyState::Aborted(reason)
                    }
                },
                terminal => terminal,
            };
        }

        let confirmation_dismissed =
            dismiss_confirmation(self.doc, self.config.dismiss_timeout()).await;

        ApplicationOutcome {
            state,
            pages,
            confirmation_dismissed,
        }
    }

    /// Classify, resolve and fill every field of the current page.
    ///
    /// Field failures are recorded in the report; they never stop the pass.
    pub async fn fill_page(&self, step: usize) -> PageReport {
        let fields = self.classifier.classify(self.doc).await;
        let mut fields = std::pin::pin!(fields);
        let mut report = PageReport {
            step,
            fields: Vec::new(),
        };

        while let Some(field) = fields.next().await {
            let resolved = self.resolver.resolve(&field.label, field.kind);
            debug!(
                step,
                label = %field.label,
                kind = %field.kind,
                source = %resolved.source(),
                value = ?resolved.value(),
                "resolved field"
            );

            let outcome = match self.filler.fill(&field, &resolved).await {
                Ok(outcome) => {
                    debug!(step, label = %field.label, kind = %field.kind, ?outcome, "field done");
                    Ok(outcome)
                }
                Err(e) => {
                    warn!(step, label = %field.label, kind = %field.kind, error = %e, "field fill failed");
                    Err(e.to_string())
                }
            };

            report.fields.push(FieldReport {
                label: field.label.clone(),
                kind: field.kind,
                source: resolved.source(),
                outcome,
            });
        }

        report
    }

    /// Click the first available navigation control.
    async fn advance(&self) -> Result<NavControl, AbortReason> {
        let mut found_any = false;

        for control in NavControl::ORDER {
            let label = control.label(&self.config.steps);
            let button = match self.doc.find(&Selector::button_text(label)).await {
                Ok(button) => button,
                Err(Error::ElementNotFound(_)) => {
                    debug!(control = label, "navigation control not present");
                    continue;
                }
                Err(e) => {
                    // The control may well be there; the page could not be read.
                    warn!(control = label, error = %e, "navigation control lookup failed");
                    found_any = true;
                    continue;
                }
            };
            found_any = true;

            let clicked = async {
                self.doc.scroll_into_view(&button).await?;
                self.doc.click(&button).await
            };
            match clicked.await {
                Ok(()) => {
                    debug!(control = label, "clicked navigation control");
                    let settle = self.config.steps.settle();
                    if !settle.is_zero() {
                        tokio::time::sleep(settle).await;
                    }
                    return Ok(control);
                }
                Err(e) => warn!(control = label, error = %e, "navigation click failed"),
            }
        }

        Err(if found_any {
            AbortReason::NavigationFailed
        } else {
            AbortReason::NoNavigationControl
        })
    }
}

/// Close the post-submission confirmation if one shows up within `timeout`.
/// Returns whether an overlay was dismissed; failures are only logged.
pub async fn dismiss_confirmation<D: DocumentProvider>(
    doc: &D,
    timeout: std::time::Duration,
) -> bool {
    let selector = Selector::css(selectors::CONFIRMATION_DISMISS);
    let button = match doc.wait_until(&selector, WaitCondition::Clickable, timeout).await {
        Ok(button) => button,
        Err(e) => {
            debug!(error = %e, "no confirmation overlay to dismiss");
            return false;
        }
    };
    match doc.click(&button).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "failed to dismiss confirmation overlay");
            false
        }
    }
}
