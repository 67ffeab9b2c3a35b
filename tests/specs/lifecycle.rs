//! The full agent lifecycle as a master observes it: appear, get
//! claimed, build, get released, get claimed again.

use crate::prelude::*;

#[tokio::test]
async fn end_to_end_claim_release_cycle() {
    let mut farm = Farm::start().await;
    let broker = farm.broker(test_filter(), SelectionPolicy::FailFast);

    // zero agents registered: selection comes back empty
    let picked = broker.pick_agent(&test_filter(), SelectionPolicy::FailFast).await.unwrap();
    assert!(picked.is_none());

    // one matching agent appears
    let descriptor = farm.add_agent(test_entries(), ScriptedBuilder::default()).await;

    // it gets picked and is now observably busy
    let picked = broker.pick_agent(&test_filter(), SelectionPolicy::FailFast).await.unwrap();
    let claimed = picked.expect("the registered agent should be claimed");
    assert_eq!(claimed.id(), &descriptor.id);
    assert!(claimed.is_busy().await.unwrap());

    // the only agent is busy: the next selection is empty
    let second = broker.pick_agent(&test_filter(), SelectionPolicy::FailFast).await.unwrap();
    assert!(second.is_none());

    // clearing outputs is the one and only release path
    claimed.clear_outputs().await.unwrap();
    assert!(!claimed.is_busy().await.unwrap());

    // and the same agent is claimable again
    let again = broker.pick_agent(&test_filter(), SelectionPolicy::FailFast).await.unwrap();
    assert_eq!(again.expect("released agent should be claimable").id(), &descriptor.id);
}

#[tokio::test]
async fn build_with_a_real_build_tool() {
    let mut farm = Farm::start().await;
    let builder = bf_agent::CommandBuilder::new(
        "/bin/sh",
        vec!["-c".to_string(), "echo checking out; echo compiling; echo ok > status.txt".to_string()],
    );
    farm.add_agent(test_entries(), builder).await;

    let broker = farm.broker(test_filter(), SelectionPolicy::FailFast);
    let sink = Arc::new(Transcript::new());
    let outcome = broker.build(BuildRequest::new("connectfour"), sink.clone()).await.unwrap();

    let report = match outcome {
        BuildOutcome::Completed(report) => report,
        BuildOutcome::NoAgent => panic!("expected a completed build"),
    };
    assert_eq!(report.properties.get("successful").map(String::as_str), Some("true"));
    assert_eq!(report.properties.get("project").map(String::as_str), Some("connectfour"));

    // the tool's stdout became progress and the build log
    let lines = sink.lines();
    assert!(lines.contains(&"checking out".to_string()));
    assert!(lines.contains(&"compiling".to_string()));

    let paths: Vec<&str> = report.outputs.iter().map(|f| f.path.as_str()).collect();
    assert!(paths.contains(&"build.log"));
    assert!(paths.contains(&"status.txt"), "tool-written artifacts come back too: {:?}", paths);
}

#[tokio::test]
async fn lease_expiry_evicts_a_dead_agent() {
    // agents in this spec never renew, so a short TTL means death
    let mut farm = Farm::start().await;
    farm.add_agent(test_entries(), ScriptedBuilder::default()).await;

    // re-register with a tiny TTL to simulate a crashed agent
    let agents = farm.directory.lookup(&Entries::new()).await.unwrap();
    farm.directory.register(&agents[0], Duration::from_millis(200)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    let remaining = farm.directory.lookup(&Entries::new()).await.unwrap();
    assert!(remaining.is_empty(), "expired lease should be invisible to lookup");
}
