use std::sync::Arc;

use clap::Parser;
use config_distribution::{
    actors::{dispatcher::DispatcherHandle, messages::ChangeEvent},
    cache::AgentCacheRegistry,
    config::{Config, read_config_file},
    jobs::JobExecutor,
    resolver::{ConfigurationResolver, StaticResolver},
};
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("config_distribution", LevelFilter::TRACE),
        ("hub", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;

    let registry = Arc::new(AgentCacheRegistry::new());
    let resolver = Arc::new(StaticResolver::from_config(&config));
    let executor = JobExecutor::new(config.workers);

    prime_agents(&config, &registry, resolver.as_ref()).await;

    let dispatcher = DispatcherHandle::spawn_with_deadline(
        registry.clone(),
        executor,
        resolver.clone(),
        config.dispatch_deadline(),
    );

    // demonstrate the pipeline: re-dispatch every configured environment,
    // then a mappings update touching all initialized agents
    for environment in &config.environments {
        dispatcher
            .dispatch(ChangeEvent::environment_update(environment.id.clone()))
            .await?;
    }
    dispatcher.dispatch(ChangeEvent::AgentMappingsUpdate).await?;

    let stats = dispatcher.stats().await?;
    info!(
        events = stats.events_processed,
        jobs = stats.jobs_submitted,
        failed = stats.jobs_failed,
        "dispatch complete"
    );

    dispatcher.shutdown().await?;
    Ok(())
}

/// Register the configured agents and resolve their initial configuration.
///
/// The first resolution happens at registration time, outside the event
/// pipeline; the dispatcher only ever refreshes already-initialized entries.
async fn prime_agents(
    config: &Config,
    registry: &AgentCacheRegistry,
    resolver: &dyn ConfigurationResolver,
) {
    for agent in &config.agents {
        let entry = registry.register(agent.agent_id).await;
        match resolver.resolve_mappings(agent.agent_id).await {
            Ok(resolved) => {
                entry.holder().write().await.apply(resolved);
                debug!(
                    agent_id = agent.agent_id,
                    environment = %agent.environment,
                    "agent primed"
                );
            }
            Err(err) => {
                debug!(agent_id = agent.agent_id, "initial resolution failed: {err}");
            }
        }
    }
}
