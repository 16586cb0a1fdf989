//! Failure tolerance tests
//!
//! One agent's recomputation failing, panicking, or outliving the deadline
//! must never abort the dispatch, and must never surface to the event
//! publisher: `dispatch` returns Ok, the failure only shows in the logs and
//! counters, and every remaining eligible entry is still attempted.

use std::sync::Arc;
use std::time::Duration;

use config_distribution::actors::messages::ChangeEvent;
use config_distribution::cache::AgentCacheRegistry;
use pretty_assertions::assert_eq;

use crate::helpers::*;

const DEADLINE: Duration = Duration::from_secs(5);

#[tokio::test]
async fn failing_job_does_not_surface_to_caller() {
    let registry = Arc::new(AgentCacheRegistry::new());
    initialized_entry(&registry, 1, "id").await;
    let resolver = RecordingResolver::new();
    resolver.map_agent(1, "id");
    resolver.set_behavior(1, Behavior::Fail);
    let handle = spawn_dispatcher(registry, resolver.clone(), DEADLINE);

    let result = handle.dispatch(ChangeEvent::AgentMappingsUpdate).await;

    assert!(result.is_ok());
    assert_eq!(resolver.resolved_agents(), vec![1]);
    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.jobs_submitted, 1);
    assert_eq!(stats.jobs_failed, 1);
    assert_eq!(stats.events_processed, 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn panicking_job_does_not_surface_to_caller() {
    let registry = Arc::new(AgentCacheRegistry::new());
    initialized_entry(&registry, 1, "id").await;
    let resolver = RecordingResolver::new();
    resolver.set_behavior(1, Behavior::Panic);
    let handle = spawn_dispatcher(registry, resolver.clone(), DEADLINE);

    let result = handle.dispatch(ChangeEvent::environment_update("id")).await;

    assert!(result.is_ok());
    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.jobs_failed, 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn failures_do_not_stop_remaining_entries() {
    let registry = Arc::new(AgentCacheRegistry::new());
    for agent_id in 1..=4 {
        initialized_entry(&registry, agent_id, "id").await;
    }
    let resolver = RecordingResolver::new();
    resolver.set_behavior(1, Behavior::Fail);
    resolver.set_behavior(2, Behavior::Panic);
    let handle = spawn_dispatcher(registry.clone(), resolver.clone(), DEADLINE);

    handle
        .dispatch(ChangeEvent::environment_update("id"))
        .await
        .unwrap();

    // every eligible entry was attempted, not just the ones before a failure
    assert_eq!(resolver.resolved_agents(), vec![1, 2, 3, 4]);

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.jobs_submitted, 4);
    assert_eq!(stats.jobs_failed, 2);

    // the healthy entries were actually updated
    for agent_id in [3, 4] {
        let entry = registry.get(agent_id).await.unwrap();
        assert!(entry.holder().read().await.references_profile("refreshed"));
    }
    // the failed entry kept its previous configuration
    let entry = registry.get(1).await.unwrap();
    assert!(entry.holder().read().await.references_profile("seeded"));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn timed_out_job_is_abandoned_and_dispatch_continues() {
    let registry = Arc::new(AgentCacheRegistry::new());
    initialized_entry(&registry, 1, "id").await;
    initialized_entry(&registry, 2, "id").await;
    let resolver = RecordingResolver::new();
    resolver.set_behavior(1, Behavior::Sleep(Duration::from_millis(300)));
    let handle = spawn_dispatcher(registry.clone(), resolver.clone(), Duration::from_millis(50));

    handle
        .dispatch(ChangeEvent::environment_update("id"))
        .await
        .unwrap();

    // agent 2 was attempted despite agent 1 exceeding the deadline
    assert_eq!(resolver.resolved_agents(), vec![1, 2]);
    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.jobs_failed, 1);

    // the abandoned job keeps running and applies its result late,
    // last-writer-wins on the single mutation point
    tokio::time::sleep(Duration::from_millis(400)).await;
    let entry = registry.get(1).await.unwrap();
    assert!(entry.holder().read().await.references_profile("refreshed"));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn all_jobs_failing_still_completes_the_event() {
    let registry = Arc::new(AgentCacheRegistry::new());
    for agent_id in 1..=3 {
        initialized_entry(&registry, agent_id, "id").await;
        // no mapping configured, so every mappings resolution fails
    }
    let resolver = RecordingResolver::new();
    let handle = spawn_dispatcher(registry, resolver.clone(), DEADLINE);

    let result = handle.dispatch(ChangeEvent::AgentMappingsUpdate).await;

    assert!(result.is_ok());
    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.jobs_submitted, 3);
    assert_eq!(stats.jobs_failed, 3);
    assert_eq!(stats.events_processed, 1);

    handle.shutdown().await.unwrap();
}
