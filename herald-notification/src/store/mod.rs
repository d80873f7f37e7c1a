//! Persistence for notices and their read state.
//!
//! Callers depend on [`NotificationStore`]; the Postgres and in-memory
//! backends are interchangeable behind it.

mod memory;
mod pg;

pub use memory::MemoryNotificationStore;
pub use pg::PgNotificationStore;

use uuid::Uuid;

use crate::models::{Audience, NewNotice, Notification, NotificationKind, RecipientId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("notification {0} not found")]
    NotFound(Uuid),

    #[error("notification store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(diesel::result::Error),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::DatabaseError(DatabaseErrorKind::ClosedConnection, info)
            | Error::DatabaseError(DatabaseErrorKind::UnableToSendCommand, info) => {
                StoreError::Unavailable(info.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

impl From<StoreError> for herald_shared::AppError {
    fn from(err: StoreError) -> Self {
        use herald_shared::{AppError, ErrorCode};

        match err {
            StoreError::Validation(msg) => AppError::Validation(msg),
            StoreError::NotFound(id) => AppError::with_details(
                ErrorCode::NotificationNotFound,
                "notification not found",
                serde_json::json!({ "id": id }),
            ),
            StoreError::Unavailable(msg) => {
                tracing::error!(error = %msg, "notification store unavailable");
                AppError::unavailable("notification store unavailable")
            }
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable creation and lookup of notices and their read receipts.
///
/// Implementations must be safe to share between concurrent requests.
pub trait NotificationStore: Send + Sync {
    /// Validate and persist a notice with an unviewed read receipt. Nothing
    /// is written when validation fails.
    fn create(&self, notice: NewNotice) -> StoreResult<Notification>;

    fn get(&self, id: Uuid) -> StoreResult<Notification>;

    /// Every notice addressed to everyone or to `viewer_id`, oldest first.
    /// Read state is not considered and the list is never truncated.
    fn list_candidates(&self, viewer_id: RecipientId) -> StoreResult<Vec<Notification>>;

    fn is_viewed(&self, id: Uuid) -> StoreResult<bool>;

    /// Idempotent. Unknown ids are ignored.
    fn mark_viewed(&self, id: Uuid) -> StoreResult<()>;

    /// Every notice, newest first, with the total count.
    fn list_all(&self, limit: i64, offset: i64) -> StoreResult<(Vec<Notification>, i64)>;

    /// Notices `viewer_id` is eligible for, newest first, with the total count.
    fn list_for_viewer(
        &self,
        viewer_id: RecipientId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<Notification>, i64)>;

    /// Cheap reachability probe for health checks.
    fn ping(&self) -> StoreResult<()>;

    fn backend(&self) -> &'static str;
}

/// A notice that passed validation and is ready to persist.
#[derive(Debug)]
pub(crate) struct PreparedNotice {
    pub title: String,
    pub body: String,
    pub audience: Audience,
    pub kind: NotificationKind,
}

pub(crate) fn prepare(notice: NewNotice) -> StoreResult<PreparedNotice> {
    if notice.title.trim().is_empty() {
        return Err(StoreError::Validation("title must not be empty".into()));
    }
    if notice.body.trim().is_empty() {
        return Err(StoreError::Validation("body must not be empty".into()));
    }

    let audience = notice.audience.normalize().map_err(StoreError::Validation)?;

    Ok(PreparedNotice {
        title: notice.title,
        body: notice.body,
        audience,
        kind: notice.kind,
    })
}
