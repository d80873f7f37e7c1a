use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ Event envelope wrapping all domain events.
///
/// Routing key format: `herald.{domain}.{action}`
/// Example: `herald.notice.requested`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            user_id: None,
            data,
        }
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    // Notice events
    pub const NOTICE_REQUESTED: &str = "herald.notice.requested";
}

/// Common event data payloads
pub mod payloads {
    use serde::{Deserialize, Serialize};

    /// A request from another service to post an administrative notice.
    ///
    /// `audience` is either the string `"everyone"`, a single recipient id,
    /// or a list of recipient ids. Missing means everyone.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct NoticeRequested {
        pub title: String,
        pub body: String,
        #[serde(default)]
        pub audience: Option<serde_json::Value>,
        #[serde(default)]
        pub kind: Option<String>,
    }
}
