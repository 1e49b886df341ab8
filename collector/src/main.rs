use std::{sync::Arc, time::Instant};

use github_stats_collector::{
    api::{GithubClient, TimeTracking, WakaTimeClient},
    assembler::StatsAssembler,
    config::{Config, Env},
    pagination::Cancellation,
    readme,
    render::Renderer,
};
use shared::{Clock, SystemClock};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let started = Instant::now();
    let config = Config::try_from(envy::from_env::<Env>()?)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.timezone));

    let time_tracking: Option<Arc<dyn TimeTracking>> = match &config.wakatime_api_key {
        Some(api_key) => Some(Arc::new(WakaTimeClient::new(api_key.clone())?)),
        None => None,
    };
    let cancellation = Cancellation::default();
    let assembler = StatsAssembler::new(
        Arc::new(GithubClient::new(config.github_token.clone())?),
        time_tracking,
        clock.clone(),
        config.fetch.clone(),
        cancellation.clone(),
    );

    let stats = tokio::select! {
        stats = assembler.build_with_deadline(config.run_timeout) => stats?,
        _ = signal::ctrl_c() => {
            warn!("Received SIGINT. Exiting.");
            cancellation.cancel();
            anyhow::bail!("Interrupted before the stats were collected");
        }
    };

    let output = Renderer::new(&config.render).render(&stats, clock.as_ref());
    readme::update_file(&config.readme_path, &config.section_name, &output).await?;

    info!("Done in {:.2?}", started.elapsed());
    Ok(())
}
