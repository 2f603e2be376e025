use quizforge_backend::{
    config::Config,
    database::pool::{create_pool, run_migrations},
    routes,
    services::ai_service::GeminiClient,
    AppState,
};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = Arc::new(Config::from_env()?);

    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    let http_client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let generator = Arc::new(GeminiClient::from_config(http_client, &config));

    let app_state = AppState::new(pool, config.clone(), generator);
    let app = routes::app(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
