//! Discovery feeding the broker: find a directory, then build
//! through it.

use crate::prelude::*;

fn probe_only(addr: SocketAddr) -> DiscoveryConfig {
    DiscoveryConfig {
        multicast: None,
        probes: vec![addr],
        probe_interval: Duration::from_millis(50),
        beacon_ttl: Duration::from_secs(60),
    }
}

#[tokio::test]
async fn discovered_directory_serves_a_build() {
    let mut farm = Farm::start().await;
    farm.add_agent(test_entries(), ScriptedBuilder::new(["compiling"])).await;

    let discovery = DiscoveryClient::spawn(probe_only(farm.directory_addr));
    let directory =
        discovery.discover(Duration::from_secs(5)).await.expect("directory should be found");

    let broker =
        AgentBroker::new(directory, BrokerSettings::new(test_filter())).unwrap();
    let outcome =
        broker.build(BuildRequest::new("demo"), Arc::new(Transcript::new())).await.unwrap();
    assert!(matches!(outcome, BuildOutcome::Completed(_)));
}

#[tokio::test]
async fn discovery_timeout_is_an_outcome_not_an_error() {
    // nothing is listening here
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let discovery = DiscoveryClient::spawn(probe_only(addr));
    let started = Instant::now();
    let found = discovery.discover(Duration::from_millis(300)).await;

    assert!(found.is_none());
    assert!(started.elapsed() >= Duration::from_millis(300));
}
