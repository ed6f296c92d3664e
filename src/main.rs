use tracing_subscriber::EnvFilter;

use chess_ai::app;
use chess_ai::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chess_ai=info")),
        )
        .init();

    app::run(config).await
}
