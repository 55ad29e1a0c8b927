use std::sync::Arc;

use fittrack::backend::GoTrueApi;
use fittrack::config::AppConfig;
use fittrack::{routes, state};

#[tokio::main]
async fn main() {
    // Missing .env is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");
    let auth_api = GoTrueApi::new(config.supabase_url.as_str(), config.supabase_anon_key.clone(), config.timeouts)
        .expect("auth client init failed");
    tracing::info!(project = %config.supabase_url, storage_key = %config.storage_key, "auth backend configured");

    let port = config.port;
    let state = state::AppState::new(config, Arc::new(auth_api));
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "fittrack listening");
    axum::serve(listener, app).await.expect("server failed");
}
