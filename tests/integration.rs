mod common;

use agentic_apply::{
    AbortReason, AnswerResolver, ApplySession, ApplyState, Error, FillOutcome, StepController,
};
use common::{config, Effect, FakeDocument, Node};

#[tokio::test]
async fn next_then_submit_reaches_submitted() {
    let doc = FakeDocument::new();
    let years = doc.text_input(0, "Years of experience");
    doc.button(0, "Next", Effect::GoTo(1));
    let checkbox = doc.checkbox(1, "I agree to the terms");
    doc.button(1, "Submit application", Effect::GoTo(2));
    doc.dismiss_button(2, Effect::GoTo(3));

    let config = config().answer("years of experience", "2");
    let resolver = AnswerResolver::from_config(&config);
    let outcome = StepController::new(&doc, &config, &resolver).run().await;

    assert_eq!(outcome.state, ApplyState::Submitted);
    assert!(outcome.is_submitted());
    assert_eq!(outcome.fill_passes(), 2);
    assert!(outcome.confirmation_dismissed);
    assert_eq!(doc.node(years).value, "2");
    assert!(doc.node(checkbox).selected);
    assert_eq!(doc.current_page(), 3);
}

#[tokio::test]
async fn review_page_is_filled_before_submit() {
    let doc = FakeDocument::new();
    doc.button(0, "Next", Effect::GoTo(1));
    doc.button(1, "Review", Effect::GoTo(2));
    let phone = doc.text_input(2, "Mobile phone number");
    doc.button(2, "Submit application", Effect::GoTo(3));

    let config = config();
    let resolver = AnswerResolver::from_config(&config);
    let outcome = StepController::new(&doc, &config, &resolver).run().await;

    assert_eq!(outcome.state, ApplyState::Submitted);
    assert_eq!(outcome.fill_passes(), 3);
    assert_eq!(doc.node(phone).value, "1234567890");
    assert!(!outcome.confirmation_dismissed);
}

#[tokio::test]
async fn page_without_controls_aborts() {
    let doc = FakeDocument::new();
    let field = doc.text_input(0, "Email");

    let config = config();
    let resolver = AnswerResolver::from_config(&config);
    let outcome = StepController::new(&doc, &config, &resolver).run().await;

    assert_eq!(outcome.state, ApplyState::Aborted(AbortReason::NoNavigationControl));
    assert_eq!(outcome.fill_passes(), 1);
    assert_eq!(doc.node(field).value, "jane@example.com");
}

#[tokio::test]
async fn failing_control_click_aborts_as_navigation_failure() {
    let doc = FakeDocument::new();
    doc.button(0, "Next", Effect::Fail);

    let config = config();
    let resolver = AnswerResolver::from_config(&config);
    let outcome = StepController::new(&doc, &config, &resolver).run().await;

    assert_eq!(outcome.state, ApplyState::Aborted(AbortReason::NavigationFailed));
}

#[tokio::test]
async fn unreadable_page_aborts_as_navigation_failure() {
    let doc = FakeDocument::new();
    doc.button(0, "Next", Effect::GoTo(1));
    doc.disconnect();

    let config = config();
    let resolver = AnswerResolver::from_config(&config);
    let outcome = StepController::new(&doc, &config, &resolver).run().await;

    assert_eq!(outcome.state, ApplyState::Aborted(AbortReason::NavigationFailed));
    assert!(doc.clicks().is_empty());
}

#[tokio::test]
async fn failing_next_falls_through_to_submit() {
    let doc = FakeDocument::new();
    doc.button(0, "Next", Effect::Fail);
    doc.button(0, "Submit application", Effect::GoTo(1));

    let config = config();
    let resolver = AnswerResolver::from_config(&config);
    let outcome = StepController::new(&doc, &config, &resolver).run().await;

    assert_eq!(outcome.state, ApplyState::Submitted);
}

#[tokio::test]
async fn regenerating_next_stops_at_step_limit() {
    let doc = FakeDocument::new();
    doc.text_input(0, "Cover letter");
    doc.button(0, "Next", Effect::GoTo(0));

    let config = config().max_steps(3);
    let resolver = AnswerResolver::from_config(&config);
    let outcome = StepController::new(&doc, &config, &resolver).run().await;

    assert_eq!(outcome.state, ApplyState::Aborted(AbortReason::StepLimitReached));
    assert_eq!(outcome.fill_passes(), 3);
    assert_eq!(doc.clicks().len(), 3);
}

#[tokio::test]
async fn field_failure_does_not_stop_the_flow() {
    let doc = FakeDocument::new();
    doc.add(
        Node::new(&["input[type='text']"])
            .on_page(0)
            .attr("aria-label", "Mobile phone")
            .on_type(Effect::Fail),
    );
    doc.button(0, "Submit application", Effect::GoTo(1));

    let config = config();
    let resolver = AnswerResolver::from_config(&config);
    let outcome = StepController::new(&doc, &config, &resolver).run().await;

    assert!(outcome.is_submitted());
    assert_eq!(outcome.pages[0].failed().count(), 1);
}

/// One listing with `jobs` cards; each card opens a job page whose Easy Apply
/// flow is one page with a submit button followed by a confirmation.
fn listing(doc: &FakeDocument, jobs: usize) -> Vec<usize> {
    (0..jobs)
        .map(|i| {
            let base = 10 * (i + 1);
            let card = doc.job_card(Effect::GoTo(base));
            doc.apply_button(base, base + 1);
            doc.text_input(base + 1, "Years of experience");
            doc.button(base + 1, "Submit application", Effect::GoTo(base + 2));
            doc.dismiss_button(base + 2, Effect::GoTo(0));
            card
        })
        .collect()
}

#[tokio::test]
async fn batch_applies_to_each_job() {
    let doc = FakeDocument::new();
    let cards = listing(&doc, 3);

    let session = ApplySession::new(doc, config().answer("years of experience", "2")).unwrap();
    let report = session.process_applications(2).await.unwrap();

    assert_eq!(report.jobs.len(), 2);
    assert_eq!(report.submitted(), 2);
    assert_eq!(report.failed(), 0);
    let clicks = session.document().clicks();
    assert!(clicks.contains(&cards[0]));
    assert!(clicks.contains(&cards[1]));
    assert!(!clicks.contains(&cards[2]));
}

#[tokio::test]
async fn failing_job_does_not_stop_the_batch() {
    let doc = FakeDocument::new();
    let cards = listing(&doc, 3);
    doc.set_on_click(cards[1], Effect::Fail);

    let session = ApplySession::new(doc, config()).unwrap();
    let report = session.process_applications(3).await.unwrap();

    assert_eq!(report.jobs.len(), 3);
    assert!(report.jobs[0].result.as_ref().is_ok_and(|o| o.is_submitted()));
    assert!(report.jobs[1].result.is_err());
    assert!(report.jobs[2].result.as_ref().is_ok_and(|o| o.is_submitted()));
    assert_eq!(report.submitted(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(session.document().checkpoints(), ["job_2_failed"]);
    assert!(session.document().clicks().contains(&cards[2]));
}

#[tokio::test]
async fn missing_apply_button_is_a_job_failure() {
    let doc = FakeDocument::new();
    doc.job_card(Effect::GoTo(5));

    let session = ApplySession::new(doc, config()).unwrap();
    let report = session.process_applications(1).await.unwrap();

    let err = report.jobs[0].result.as_ref().unwrap_err();
    assert!(err.contains("Easy Apply button"), "error was: {err}");
}

#[tokio::test]
async fn session_rejects_invalid_config() {
    let err = ApplySession::new(FakeDocument::new(), config().typing_delay(200, 10)).unwrap_err();
    assert!(matches!(err, Error::ConfigError(_)));
}

#[tokio::test]
async fn empty_listing_is_fatal() {
    let session = ApplySession::new(FakeDocument::new(), config()).unwrap();
    let err = session.process_applications(2).await.unwrap_err();
    assert!(matches!(err, Error::NavigationError(_)));
}

#[tokio::test]
async fn overlays_are_closed_before_opening_a_job() {
    let doc = FakeDocument::new();
    let cards = listing(&doc, 1);
    let overlay = doc.add(
        Node::new(&["button.artdeco-modal__dismiss"])
            .on_page(0)
            .on_click(Effect::None),
    );
    doc.add(Node::new(&["button[data-test-modal-close-btn]"]).on_page(0).hidden());

    let session = ApplySession::new(doc, config()).unwrap();
    assert_eq!(session.close_overlays().await, 1);

    let report = session.process_applications(1).await.unwrap();
    assert_eq!(report.submitted(), 1);
    let clicks = session.document().clicks();
    let overlay_at = clicks.iter().rposition(|&c| c == overlay).unwrap();
    let card_at = clicks.iter().position(|&c| c == cards[0]).unwrap();
    assert!(overlay_at < card_at);
}

#[tokio::test]
async fn outcome_lists_each_field() {
    let doc = FakeDocument::new();
    doc.text_input(0, "Years of experience");
    doc.button(0, "Submit application", Effect::GoTo(1));

    let config = config().answer("years of experience", "2");
    let resolver = AnswerResolver::from_config(&config);
    let outcome = StepController::new(&doc, &config, &resolver).run().await;

    let page = &outcome.pages[0];
    assert_eq!(page.step, 1);
    assert_eq!(page.fields[0].label, "Years of experience");
    assert_eq!(page.fields[0].outcome, Ok(FillOutcome::Filled("2".into())));
}
