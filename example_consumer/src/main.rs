//! Example consumer: runs record-api as a standalone service configured from the environment.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Settings come from env vars or a `.env` file (RECORD_STORE, DATABASE_URL, ENTITY_SCHEMA, ...).

use record_api::{build_app, build_state, ServiceConfig};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("record_api=info,tower_http=info")),
        )
        .init();

    let config = ServiceConfig::from_env()?;
    let state = build_state(&config).await?;
    let app = build_app(state, config.max_body_bytes);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
