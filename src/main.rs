mod config;
mod routes;
mod state;

use flag_evaluator::FlagSet;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = config::Config::from_env()?;

    let flags = FlagSet::load(&config.flags_path)?;
    tracing::info!(
        path = %config.flags_path.display(),
        count = flags.len(),
        "loaded flag definitions"
    );

    let state = state::AppState::new(flags);

    let app = routes::routes()
        .with_state(state)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;

    tracing::info!("server is chilling at http://{}", config.addr());

    axum::serve(listener, app).await?;

    Ok(())
}
