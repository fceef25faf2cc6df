//! Serve command implementation.

use std::sync::Arc;

use clap::Args;
use tessera_ingest::{IngestConfig, IngestServer};
use tessera_mempool::Mempool;
use tokio_util::sync::CancellationToken;

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Path to a TOML config file
    #[arg(long, env = "TESSERA_CONFIG")]
    pub config: Option<String>,
    /// Address to listen on (overrides the config file)
    #[arg(long, env = "TESSERA_LISTEN")]
    pub listen: Option<String>,
    /// Maximum mempool entries (overrides the config file)
    #[arg(long, env = "TESSERA_CAPACITY")]
    pub capacity: Option<usize>,
    /// Shared token clients must present (overrides the config file)
    #[arg(long, env = "TESSERA_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,
}

impl ServeArgs {
    /// Loads the config file, if any, and applies the flag overrides.
    pub fn resolve(self) -> Result<IngestConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => {
                let config = IngestConfig::load(path)?;
                tracing::info!(config = %path, "loaded config");
                config
            }
            None => IngestConfig::default(),
        };
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(capacity) = self.capacity {
            config.mempool_capacity = capacity;
        }
        if let Some(token) = self.auth_token {
            config.auth_token = Some(token);
        }
        config.validate()?;
        Ok(config)
    }
}

pub async fn run(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("tessera server starting");
    let config = args.resolve()?;

    let mempool = Arc::new(Mempool::new(config.mempool_capacity)?);
    let server = IngestServer::bind(config, Arc::clone(&mempool)).await?;
    let metrics = Arc::clone(server.metrics());

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
            Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl+C, shutting down"),
        }
        signal_token.cancel();
    });

    server.run(token).await?;

    let stats = mempool.stats();
    tracing::info!(
        pooled = stats.size,
        admitted = stats.admitted_total,
        "shutdown complete"
    );
    tracing::debug!(
        metrics = %metrics.snapshot(stats.size).to_prometheus(),
        "final ingest metrics"
    );
    Ok(())
}
