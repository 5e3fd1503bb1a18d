use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::ApplyConfig;
use crate::controller::{dismiss_confirmation, ApplicationOutcome, StepController};
use crate::error::{Error, Result};
use crate::provider::{DocumentProvider, Selector, WaitCondition};
use crate::resolver::AnswerResolver;
use crate::selectors;

/// Result of one job in a batch.
#[derive(Debug, Clone)]
pub struct JobReport {
    /// 1-based position in the listing.
    pub index: usize,
    /// The application outcome, or why the job could not be worked on.
    pub result: std::result::Result<ApplicationOutcome, String>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub jobs: Vec<JobReport>,
}

impl BatchReport {
    pub fn submitted(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| matches!(&j.result, Ok(outcome) if outcome.is_submitted()))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.jobs.iter().filter(|j| j.result.is_err()).count()
    }
}

/// Owns the document for the whole session, together with the immutable
/// configuration and the resolver built from it.
pub struct ApplySession<D> {
    doc: D,
    config: ApplyConfig,
    resolver: AnswerResolver,
}

impl<D> std::fmt::Debug for ApplySession<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplySession")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<D: DocumentProvider> ApplySession<D> {
    /// Fails with [`Error::ConfigError`] when `config` does not validate.
    pub fn new(doc: D, config: ApplyConfig) -> Result<Self> {
        let resolver = AnswerResolver::from_config(&config);
        Self::with_resolver(doc, config, resolver)
    }

    /// Use a custom resolver, e.g. one with a different similarity matcher.
    pub fn with_resolver(doc: D, config: ApplyConfig, resolver: AnswerResolver) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            doc,
            config,
            resolver,
        })
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn config(&self) -> &ApplyConfig {
        &self.config
    }

    /// Step controller for the application currently open in the document.
    pub fn controller(&self) -> StepController<'_, D> {
        StepController::new(&self.doc, &self.config, &self.resolver)
    }

    /// Apply to the first `max_jobs` jobs of the listing, one after another.
    ///
    /// Only a listing that never shows up is an error. A failing job is
    /// logged, checkpointed and recorded, and the next job is attempted.
    pub async fn process_applications(&self, max_jobs: usize) -> Result<BatchReport> {
        let cards = Selector::css(selectors::JOB_CARDS);
        self.doc
            .wait_until(&cards, WaitCondition::Present, self.config.wait_timeout())
            .await
            .map_err(|e| Error::NavigationError(format!("job listing did not load: {e}")))?;

        let jobs: Vec<_> = self.doc.find_all(&cards).await?.into_iter().take(max_jobs).collect();
        info!(jobs = jobs.len(), "processing applications");

        let mut report = BatchReport::default();
        for (i, card) in jobs.iter().enumerate() {
            let index = i + 1;
            let result = self
                .apply_to_job(card)
                .instrument(info_span!("job", index))
                .await;

            let result = match result {
                Ok(outcome) => {
                    info!(
                        job = index,
                        state = ?outcome.state,
                        steps = outcome.fill_passes(),
                        "job finished"
                    );
                    Ok(outcome)
                }
                Err(e) => {
                    warn!(job = index, error = %e, "job failed; moving on");
                    if let Err(shot) = self.doc.checkpoint(&format!("job_{index}_failed")).await {
                        debug!(job = index, error = %shot, "checkpoint failed");
                    }
                    dismiss_confirmation(&self.doc, self.config.dismiss_timeout()).await;
                    Err(e.to_string())
                }
            };
            report.jobs.push(JobReport { index, result });
        }

        info!(
            submitted = report.submitted(),
            failed = report.failed(),
            total = report.jobs.len(),
            "batch complete"
        );
        Ok(report)
    }

    /// Open the job behind `card`, start its Easy Apply flow and drive it to
    /// a terminal state.
    pub async fn apply_to_job(&self, card: &D::Handle) -> Result<ApplicationOutcome> {
        self.doc.scroll_into_view(card).await?;
        self.close_overlays().await;
        self.doc.click(card).await?;
        self.settle(self.config.job_settle()).await;

        let apply = self
            .doc
            .wait_until(
                &Selector::css(selectors::APPLY_BUTTON),
                WaitCondition::Clickable,
                self.config.wait_timeout(),
            )
            .await
            .map_err(|e| match e {
                Error::Timeout(_) => Error::ElementNotFound("Easy Apply button".into()),
                other => other,
            })?;
        self.doc.scroll_into_view(&apply).await?;
        self.doc.click(&apply).await?;
        self.settle(self.config.steps.settle()).await;

        Ok(self.controller().run().await)
    }

    /// Click every displayed overlay close button. Returns how many closed.
    pub async fn close_overlays(&self) -> usize {
        let buttons = match self.doc.find_all(&Selector::css(selectors::OVERLAY_CLOSE)).await {
            Ok(buttons) => buttons,
            Err(e) => {
                debug!(error = %e, "overlay lookup failed");
                return 0;
            }
        };

        let mut closed = 0;
        for button in &buttons {
            if !matches!(self.doc.is_displayed(button).await, Ok(true)) {
                continue;
            }
            match self.doc.click(button).await {
                Ok(()) => closed += 1,
                Err(e) => debug!(error = %e, "overlay close click failed"),
            }
        }
        closed
    }

    async fn settle(&self, delay: std::time::Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
