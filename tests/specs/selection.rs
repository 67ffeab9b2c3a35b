//! Selection policy timing and mutual exclusion under contention.

use crate::prelude::*;

#[tokio::test]
async fn fail_fast_ignores_any_configured_blocking_window() {
    let farm = Farm::start().await;
    // a broker configured to block still fails fast when asked to
    let broker =
        farm.broker(test_filter(), SelectionPolicy::Block { timeout: Duration::from_secs(120) });

    let started = Instant::now();
    let picked = broker.pick_agent(&test_filter(), SelectionPolicy::FailFast).await.unwrap();

    assert!(picked.is_none());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn blocking_selection_respects_its_deadline() {
    let farm = Farm::start().await;
    let broker = farm.broker(test_filter(), SelectionPolicy::FailFast);

    let timeout = Duration::from_millis(500);
    let started = Instant::now();
    let picked =
        broker.pick_agent(&test_filter(), SelectionPolicy::Block { timeout }).await.unwrap();

    assert!(picked.is_none());
    assert!(started.elapsed() >= timeout, "returned {:?} before the deadline", started.elapsed());
}

#[tokio::test]
async fn concurrent_masters_claim_one_agent_exactly_once() {
    let mut farm = Farm::start().await;
    farm.add_agent(test_entries(), ScriptedBuilder::default()).await;
    let directory = farm.directory.clone();

    // eight masters race for a single idle agent
    let mut picks = Vec::new();
    for _ in 0..8 {
        let directory = directory.clone();
        picks.push(tokio::spawn(async move {
            let broker =
                AgentBroker::new(directory, BrokerSettings::new(test_filter())).unwrap();
            broker.pick_agent(&test_filter(), SelectionPolicy::FailFast).await.unwrap()
        }));
    }

    let mut winners = 0;
    for pick in picks {
        if pick.await.unwrap().is_some() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1, "exactly one master may win the claim");
}

#[tokio::test]
async fn contending_masters_spread_over_distinct_agents() {
    let mut farm = Farm::start().await;
    let a = farm.add_agent(test_entries(), ScriptedBuilder::default()).await;
    let b = farm.add_agent(test_entries(), ScriptedBuilder::default()).await;
    let directory = farm.directory.clone();

    let mut picks = Vec::new();
    for _ in 0..2 {
        let directory = directory.clone();
        picks.push(tokio::spawn(async move {
            let broker =
                AgentBroker::new(directory, BrokerSettings::new(test_filter())).unwrap();
            broker.pick_agent(&test_filter(), SelectionPolicy::FailFast).await.unwrap()
        }));
    }

    let mut claimed = Vec::new();
    for pick in picks {
        if let Some(agent) = pick.await.unwrap() {
            claimed.push(agent.id().clone());
        }
    }
    claimed.sort_by(|x, y| x.as_str().cmp(y.as_str()));
    claimed.dedup();
    assert_eq!(claimed.len(), 2, "two masters over two idle agents never share");
    assert!(claimed.contains(&a.id) && claimed.contains(&b.id));
}
