//! Concurrency tests
//!
//! These verify the dispatch-time concurrency contract:
//! - registration is never blocked by an in-flight dispatch (copy-on-read
//!   snapshots)
//! - the dispatcher keeps at most one recomputation in flight per event
//!   (sequential bounded waiting)
//! - events from many publishers are serialized through the command queue

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use config_distribution::actors::dispatcher::DispatcherHandle;
use config_distribution::actors::messages::ChangeEvent;
use config_distribution::cache::AgentCacheRegistry;
use config_distribution::jobs::JobExecutor;
use config_distribution::resolver::{ConfigurationResolver, ResolveResult};
use config_distribution::{Environment, ResolvedConfiguration};

use crate::helpers::*;

/// Resolver that sleeps briefly while tracking how many resolutions overlap
struct OverlapTrackingResolver {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl OverlapTrackingResolver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    async fn tracked(&self, environment_id: &str) -> ResolveResult<ResolvedConfiguration> {
        let running = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(ResolvedConfiguration::from_environment(Environment::new(
            environment_id,
            [],
        )))
    }
}

#[async_trait]
impl ConfigurationResolver for OverlapTrackingResolver {
    async fn resolve_environment(
        &self,
        _agent_id: u64,
        environment_id: &str,
    ) -> ResolveResult<ResolvedConfiguration> {
        self.tracked(environment_id).await
    }

    async fn resolve_mappings(&self, _agent_id: u64) -> ResolveResult<ResolvedConfiguration> {
        self.tracked("mapped").await
    }
}

#[tokio::test]
async fn at_most_one_recomputation_in_flight_per_event() {
    let registry = Arc::new(AgentCacheRegistry::new());
    for agent_id in 1..=5 {
        initialized_entry(&registry, agent_id, "id").await;
    }

    // pool allows 4 concurrent jobs, but sequential bounded waiting
    // must keep it at one
    let resolver = OverlapTrackingResolver::new();
    let handle = DispatcherHandle::spawn_with_deadline(
        registry,
        JobExecutor::new(4),
        resolver.clone(),
        Duration::from_secs(5),
    );

    handle
        .dispatch(ChangeEvent::environment_update("id"))
        .await
        .unwrap();

    assert_eq!(resolver.peak.load(Ordering::SeqCst), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn registration_proceeds_during_dispatch() {
    let registry = Arc::new(AgentCacheRegistry::new());
    initialized_entry(&registry, 1, "id").await;
    let resolver = RecordingResolver::new();
    resolver.set_behavior(1, Behavior::Sleep(Duration::from_millis(200)));
    let handle = spawn_dispatcher(registry.clone(), resolver.clone(), Duration::from_secs(5));

    handle
        .notify(ChangeEvent::environment_update("id"))
        .await
        .unwrap();
    // let the dispatch reach its bounded wait on agent 1
    tokio::time::sleep(Duration::from_millis(50)).await;

    // a registration mid-dispatch must not block on the registry
    let registered = tokio::time::timeout(Duration::from_millis(50), registry.register(2)).await;
    assert!(registered.is_ok(), "registration blocked by dispatch");

    let stats = wait_for_stats(&handle, |stats| stats.events_processed == 1).await;
    // the late registration is not part of the already-taken snapshot
    assert_eq!(stats.jobs_submitted, 1);
    assert_eq!(resolver.resolved_agents(), vec![1]);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn concurrent_publishers_are_serialized() {
    let registry = Arc::new(AgentCacheRegistry::new());
    initialized_entry(&registry, 1, "id").await;
    let resolver = RecordingResolver::new();
    let handle = spawn_dispatcher(registry, resolver.clone(), Duration::from_secs(5));

    let mut tasks = vec![];
    for _ in 0..5 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            handle.dispatch(ChangeEvent::environment_update("id")).await
        }));
    }

    let results = futures::future::join_all(tasks).await;
    for result in results {
        result.unwrap().unwrap();
    }

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.events_processed, 5);
    assert_eq!(stats.jobs_submitted, 5);
    assert_eq!(resolver.resolved_agents(), vec![1, 1, 1, 1, 1]);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn removed_entry_is_not_part_of_later_dispatches() {
    let registry = Arc::new(AgentCacheRegistry::new());
    initialized_entry(&registry, 1, "id").await;
    initialized_entry(&registry, 2, "id").await;
    let resolver = RecordingResolver::new();
    let handle = spawn_dispatcher(registry.clone(), resolver.clone(), Duration::from_secs(5));

    registry.remove(1).await;

    handle
        .dispatch(ChangeEvent::environment_update("id"))
        .await
        .unwrap();

    assert_eq!(resolver.resolved_agents(), vec![2]);

    handle.shutdown().await.unwrap();
}
