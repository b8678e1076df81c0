//! Wellnest server.
//!
//! # API Endpoints
//!
//! - `GET|POST /todos`, `PUT|DELETE /todos/:id` - Task CRUD
//! - `POST /todos/positions` - Reorder tasks
//! - `DELETE /todos/completed` - Clear completed tasks
//! - `GET /todos/category/:category` - Tasks in a category
//! - `GET /todos/stats` - Productivity report
//! - `GET|POST /mood`, `GET /mood/:id` - Mood entries
//! - `GET /mood/insights` - Mood insights
//! - `GET /daily/quote`, `GET /daily/challenge`, `POST /daily/challenge/toggle`
//! - `GET /health` - Health check

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use wellnest::api::{AppState, router};
use wellnest::config::Config;
use wellnest::storage::Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("wellnest=info".parse()?))
        .init();

    let config = Config::from_env()?;

    info!(
        port = config.port,
        db_url = %config.database_url,
        utc_offset = %config.day_boundary,
        "Starting Wellnest server"
    );

    let storage = Storage::new(&config.database_url).await?;
    info!("Database initialized");

    let app = router(AppState::new(storage, config.day_boundary));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Wellnest is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
