pub mod api;
pub mod config;
pub mod detector;
pub mod errors;
pub mod executor;
pub mod workflow;

use crate::errors::PostpadResult;

pub async fn run() -> PostpadResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = config::load_config()?;
    let (successful, failed) = workflow::run_all(cfg).await?;
    tracing::info!(successful, failed, "run finished");
    Ok(())
}
