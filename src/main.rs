use heirlink_ai_service::api::server::serve;
use heirlink_ai_service::config::ServiceConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is the normal case outside local development.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = ServiceConfig::from_env();
    if !config.xai_configured() {
        tracing::warn!("XAI_API_KEY is not set; /api/analyze will answer 503");
    }

    serve(config).await?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
