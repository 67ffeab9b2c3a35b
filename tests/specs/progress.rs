//! Progress streaming: emission order preserved end to end.

use crate::prelude::*;

#[tokio::test]
async fn progress_arrives_in_emission_order_with_final_value_last() {
    let mut farm = Farm::start().await;
    let descriptor = farm
        .add_agent(test_entries(), ScriptedBuilder::new(["checking out", "compiling"]))
        .await;

    let broker = farm.broker(test_filter(), SelectionPolicy::FailFast);
    let transcript = Arc::new(Transcript::new());
    broker.build(BuildRequest::new("demo"), transcript.clone()).await.unwrap();

    let expected_last = format!("retrieving results from {}", descriptor.id);
    assert_eq!(
        transcript.lines(),
        vec!["checking out".to_string(), "compiling".to_string(), expected_last.clone()]
    );
    assert_eq!(transcript.current(), Some(expected_last));
}

#[tokio::test]
async fn status_line_polls_to_the_latest_update() {
    let mut farm = Farm::start().await;
    farm.add_agent(test_entries(), ScriptedBuilder::new(["one", "two", "three"])).await;

    let broker = farm.broker(test_filter(), SelectionPolicy::FailFast);
    let status = Arc::new(StatusLine::new());
    broker.build(BuildRequest::new("demo"), status.clone()).await.unwrap();

    // the last update wins; intermediate values are overwritten
    assert!(status.current().starts_with("retrieving results from"));
}

#[tokio::test]
async fn a_silent_build_streams_zero_updates() {
    let mut farm = Farm::start().await;
    farm.add_agent(test_entries(), ScriptedBuilder::default()).await;

    let broker = farm.broker(test_filter(), SelectionPolicy::FailFast);
    let transcript = Arc::new(Transcript::new());
    let outcome = broker.build(BuildRequest::new("demo"), transcript.clone()).await.unwrap();

    assert!(matches!(outcome, BuildOutcome::Completed(_)));
    // only the broker's own retrieval line
    assert_eq!(transcript.lines().len(), 1);
}
