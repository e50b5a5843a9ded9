use tracing_subscriber::EnvFilter;
use wicket::config::Config;
use wicket::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load();

    tokio::select! {
        res = server::listener::run(&cfg) => {
            res?;
        }

        _ = server::listener::shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
