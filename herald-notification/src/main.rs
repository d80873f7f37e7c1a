use std::sync::Arc;

use herald_notification::config::{AppConfig, StorageBackend};
use herald_notification::store::{MemoryNotificationStore, NotificationStore, PgNotificationStore};
use herald_notification::{events, router, AppState};
use herald_shared::clients::db::create_pool;
use herald_shared::clients::rabbitmq::RabbitMQClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    herald_shared::middleware::init_tracing("herald-notification");

    let config = AppConfig::load()?;
    let port = config.port;

    // Set JWT_SECRET env var for the auth extractor middleware
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let metrics_handle = herald_shared::middleware::init_metrics()?;

    let store: Arc<dyn NotificationStore> = match config.storage {
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database_url, config.db_pool_size)?;
            Arc::new(PgNotificationStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory notification store; notices are lost on restart");
            Arc::new(MemoryNotificationStore::new())
        }
    };

    let rabbitmq_url = config.rabbitmq_url.clone();
    let state = Arc::new(AppState::new(config, store, metrics_handle));

    // Notices posted by other services arrive over the bus
    match rabbitmq_url {
        Some(url) => match RabbitMQClient::connect(&url).await {
            Ok(rabbitmq) => {
                let notice_state = state.clone();
                tokio::spawn(async move {
                    if let Err(e) = events::subscriber::listen_notice_events(notice_state, rabbitmq).await {
                        tracing::error!(error = %e, "notice event subscriber failed");
                    }
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "could not reach RabbitMQ, bus notices disabled");
            }
        },
        None => tracing::info!("no rabbitmq_url configured, bus notices disabled"),
    }

    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "herald-notification starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
