use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use herald_shared::clients::rabbitmq::RabbitMQClient;
use herald_shared::types::event::{payloads, routing_keys, Event};

use crate::models::{AudienceInput, Notification};
use crate::services::notice_service;
use crate::store::{NotificationStore, StoreError};
use crate::AppState;

#[derive(Debug, thiserror::Error)]
pub enum NoticeEventError {
    #[error("malformed notice event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Turn one `notice.requested` delivery into a stored notice.
pub fn apply_notice_requested(
    store: &dyn NotificationStore,
    data: &[u8],
) -> Result<Notification, NoticeEventError> {
    let event: Event<payloads::NoticeRequested> = serde_json::from_slice(data)?;
    let payload = event.data;

    tracing::info!(
        event_id = %event.id,
        source = %event.source,
        "received notice.requested event"
    );

    let audience = payload
        .audience
        .map(serde_json::from_value::<AudienceInput>)
        .transpose()
        .map_err(|e| StoreError::Validation(format!("invalid audience: {e}")))?;

    let notice = notice_service::notice_from_parts(
        payload.title,
        payload.body,
        audience,
        payload.kind.as_deref(),
    )?;

    Ok(notice_service::post_notice(store, notice, "bus")?)
}

/// Listen for notice requests from other services (notice.requested).
///
/// Every delivery is acked: a request that cannot be stored is logged and
/// dropped rather than redelivered.
pub async fn listen_notice_events(state: Arc<AppState>, rabbitmq: RabbitMQClient) -> anyhow::Result<()> {
    let mut consumer = rabbitmq.subscribe(
        "herald-notification.notice.requested",
        &[routing_keys::NOTICE_REQUESTED],
    ).await?;

    tracing::info!("listening for notice events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                if let Err(e) = apply_notice_requested(state.store.as_ref(), &delivery.data) {
                    tracing::error!(error = %e, "failed to handle notice.requested event");
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "notice consumer error");
            }
        }
    }

    Ok(())
}
