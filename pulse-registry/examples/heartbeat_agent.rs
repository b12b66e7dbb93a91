use pulse_registry::{CancellationToken, Instance, RegistryClient, RegistryConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let base_url = std::env::var("REGISTRY_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
    let instance = Instance::builder("echo-service", "echo-1")
        .host("127.0.0.1")
        .port(9090)
        .meta("version", "1.0.0")
        .build()?;

    let config = RegistryConfig::new(base_url).with_heartbeat_interval(Duration::from_secs(5));
    let client = RegistryClient::from_config(config, instance)?
        .on_error(|e| log::warn!("registry: {}", e));

    client.register(&CancellationToken::new()).await?;

    let shutdown = CancellationToken::new();
    let handle = client.start_heartbeat_with(&shutdown)?;

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down gracefully...");
    shutdown.cancel();
    handle.stopped().await;
    Ok(())
}
