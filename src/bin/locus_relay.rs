use anyhow::Context;
use locus::relay::{Relay, RelayConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let content = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
            serde_json::from_str::<RelayConfig>(&content).with_context(|| format!("parsing {}", path))?
        }
        None => RelayConfig::default(),
    };

    let relay = Relay::bind(&config)
        .await
        .with_context(|| format!("binding {} / {}", config.publish_addr, config.subscribe_addr))?;

    let token = CancellationToken::new();
    let relay_task = tokio::spawn(relay.run(token.clone()));

    tracing::info!("Relay running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl+C")?;

    token.cancel();
    relay_task.await.context("relay task panicked")?;
    Ok(())
}
