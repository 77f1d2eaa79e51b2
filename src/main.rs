//! StandEase Storefront - cart, checkout and order history service

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use standease_storefront::infra::{EventSink, InMemoryDocumentStore, InMemoryIdentity, PgDocumentStore, PgIdentityProvider};
use standease_storefront::ports::{DocumentStore, IdentityProvider};
use standease_storefront::routes;
use standease_storefront::state::AppState;
use standease_storefront::StorefrontConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StorefrontConfig::from_env()?;

    let events = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => EventSink::Nats(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, logging domain events instead");
                EventSink::Log
            }
        },
        None => EventSink::Log,
    };

    match config.database_url.clone() {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(10).connect(&url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            let store = PgDocumentStore::new(db.clone());
            let identity = PgIdentityProvider::new(db);
            serve(config, store, identity, events).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            serve(config, InMemoryDocumentStore::new(), InMemoryIdentity::new(), events).await
        }
    }
}

async fn serve<S, I>(config: StorefrontConfig, store: S, identity: I, events: EventSink) -> Result<()>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    let port = config.port;
    let state = AppState::new(config, store, identity, events);
    state.spawn_session_sweeper();
    let app = routes::router(state);

    tracing::info!("StandEase storefront listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
