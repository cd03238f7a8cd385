use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use domain::store::{DocumentStore, MemoryStore};
use persistence::PgDocumentStore;
use tracing::{info, warn};

use wedding_rsvp_api::{app, config, middleware};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting wedding RSVP API v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn DocumentStore> = if config.database.is_in_memory() {
        warn!("No database URL configured, using the in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

        info!("Running database migrations...");
        sqlx::migrate!("../persistence/src/migrations")
            .run(&pool)
            .await?;
        info!("Migrations completed");

        Arc::new(PgDocumentStore::new(pool))
    };

    let addr = config.socket_addr()?;
    let app = app::create_app(config, store);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
