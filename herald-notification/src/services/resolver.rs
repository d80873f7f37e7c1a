use std::sync::Arc;

use metrics::counter;
use uuid::Uuid;

use crate::models::{Notification, RecipientId};
use crate::store::{NotificationStore, StoreError, StoreResult};

/// Picks the one notice a viewer should see next.
///
/// The resolver never marks anything viewed on its own: the caller does that
/// through [`NotificationResolver::acknowledge`] once the notice was shown, so
/// a failed render leaves it pending for the next page load.
#[derive(Clone)]
pub struct NotificationResolver {
    store: Arc<dyn NotificationStore>,
}

impl NotificationResolver {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// The oldest unviewed notice addressed to `viewer_id`, if any.
    ///
    /// Store failures are logged and treated as nothing to show.
    pub fn next_for(&self, viewer_id: RecipientId) -> Option<Notification> {
        match self.first_unviewed(viewer_id) {
            Ok(Some(notification)) => {
                counter!("notifications_served_total", "kind" => notification.kind.as_str())
                    .increment(1);
                tracing::debug!(
                    viewer_id = %viewer_id,
                    notification_id = %notification.id,
                    "resolved next notification"
                );
                Some(notification)
            }
            Ok(None) => None,
            Err(e) => {
                counter!("notification_store_errors_total", "operation" => "next_for").increment(1);
                tracing::warn!(viewer_id = %viewer_id, error = %e, "suppressing notification after store error");
                None
            }
        }
    }

    /// All unviewed notices for `viewer_id`, oldest first.
    pub fn pending_for(&self, viewer_id: RecipientId) -> StoreResult<Vec<Notification>> {
        let mut pending = Vec::new();
        for candidate in self.store.list_candidates(viewer_id)? {
            if self.is_unviewed(&candidate)? {
                pending.push(candidate);
            }
        }
        Ok(pending)
    }

    /// Record that `id` was displayed.
    pub fn acknowledge(&self, id: Uuid) -> StoreResult<()> {
        self.store.mark_viewed(id)?;
        tracing::debug!(notification_id = %id, "notification marked viewed");
        Ok(())
    }

    fn first_unviewed(&self, viewer_id: RecipientId) -> StoreResult<Option<Notification>> {
        for candidate in self.store.list_candidates(viewer_id)? {
            if self.is_unviewed(&candidate)? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn is_unviewed(&self, candidate: &Notification) -> StoreResult<bool> {
        match self.store.is_viewed(candidate.id) {
            Ok(viewed) => Ok(!viewed),
            // Removed between listing and lookup.
            Err(StoreError::NotFound(id)) => {
                tracing::debug!(notification_id = %id, "candidate vanished, skipping");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
