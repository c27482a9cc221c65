use talkbotix::config::Config;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;

    talkbotix::server::start_server(config).await
}
