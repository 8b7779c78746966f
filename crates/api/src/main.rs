//! Herald API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use herald_common::config::AppConfig;
use herald_engine::clock::SystemClock;
use herald_engine::delivery::DeliveryQueue;
use herald_engine::persist::{MemoryStore, PersistentStore, RedisStore};
use herald_engine::service::SchedulerService;
use herald_engine::timer::TokioTimer;
use herald_notifier::{UnconfiguredDelivery, WebhookQueue};

use herald_api::routes::create_router;
use herald_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("herald_api=debug,herald_engine=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting Herald API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Pending-set storage
    let store: Arc<dyn PersistentStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisStore::connect(url).await?),
        None => {
            tracing::warn!("REDIS_URL not set — pending notifications are held in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    // Downstream delivery
    let delivery: Arc<dyn DeliveryQueue> = match &config.delivery_webhook_url {
        Some(url) => {
            tracing::info!(url = %url, "Webhook delivery configured");
            Arc::new(WebhookQueue::new(
                url.clone(),
                Duration::from_secs(config.delivery_timeout_secs),
            )?)
        }
        None => {
            tracing::warn!(
                "DELIVERY_WEBHOOK_URL not set — due notifications will fail delivery"
            );
            Arc::new(UnconfiguredDelivery)
        }
    };

    let (timer, fire_rx) = TokioTimer::new();
    let scheduler = Arc::new(SchedulerService::new(
        store,
        Arc::new(timer),
        delivery,
        Arc::new(SystemClock),
    ));

    // Timer fires land here; each one drains the channel that armed it.
    tokio::spawn(Arc::clone(&scheduler).run(fire_rx));

    // Build application state and router
    let state = AppState::new(scheduler, config.clone());
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
