mod config;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env().expect("invalid configuration");
    let port = config.port;
    tracing::info!(
        font = ?config.font,
        render_timeout_ms = config.render_timeout.as_millis(),
        cache_capacity = config.cache_capacity.get(),
        "configuration loaded"
    );

    let state = state::AppState::new(config);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "soukanzu og-image listening");
    axum::serve(listener, app).await.expect("server failed");
}
