use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{notification_audience, notifications, read_receipts};

pub type RecipientId = Uuid;

/// Controls how a notice is styled when shown; it has no other effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Banner,
    Alert,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Banner => "banner",
            Self::Alert => "alert",
        }
    }

    pub fn display_style(&self) -> DisplayStyle {
        match self {
            Self::Banner => DisplayStyle::Info,
            Self::Alert => DisplayStyle::Error,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "banner" => Ok(Self::Banner),
            "alert" => Ok(Self::Alert),
            _ => Err(format!("unknown notification kind: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    Info,
    Error,
}

impl DisplayStyle {
    /// Admin notice class used by the shell's stylesheet.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Info => "updated",
            Self::Error => "error",
        }
    }
}

/// Who a notice is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "recipients", rename_all = "snake_case")]
pub enum Audience {
    Everyone,
    Recipients(BTreeSet<RecipientId>),
}

impl Audience {
    pub fn includes(&self, viewer_id: RecipientId) -> bool {
        match self {
            Self::Everyone => true,
            Self::Recipients(set) => set.contains(&viewer_id),
        }
    }

    pub fn recipients(&self) -> Option<&BTreeSet<RecipientId>> {
        match self {
            Self::Everyone => None,
            Self::Recipients(set) => Some(set),
        }
    }
}

/// Audience as supplied by callers, before normalization.
///
/// Accepts `"everyone"` (any case), a single recipient id, or a list of ids.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AudienceInput {
    One(String),
    Many(Vec<String>),
}

impl AudienceInput {
    pub fn everyone() -> Self {
        Self::One("everyone".to_string())
    }

    pub fn normalize(&self) -> Result<Audience, String> {
        match self {
            Self::One(value) if value.trim().eq_ignore_ascii_case("everyone") => Ok(Audience::Everyone),
            Self::One(value) => {
                let id = parse_recipient(value)?;
                Ok(Audience::Recipients(BTreeSet::from([id])))
            }
            Self::Many(values) => {
                if values.is_empty() {
                    return Err("audience must name at least one recipient".to_string());
                }
                let set = values
                    .iter()
                    .map(|v| parse_recipient(v))
                    .collect::<Result<BTreeSet<_>, _>>()?;
                Ok(Audience::Recipients(set))
            }
        }
    }
}

impl Default for AudienceInput {
    fn default() -> Self {
        Self::everyone()
    }
}

impl From<RecipientId> for AudienceInput {
    fn from(id: RecipientId) -> Self {
        Self::One(id.to_string())
    }
}

impl From<Vec<RecipientId>> for AudienceInput {
    fn from(ids: Vec<RecipientId>) -> Self {
        Self::Many(ids.iter().map(Uuid::to_string).collect())
    }
}

fn parse_recipient(value: &str) -> Result<RecipientId, String> {
    Uuid::parse_str(value.trim()).map_err(|_| format!("invalid recipient id: {value}"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub audience: Audience,
    pub created_at: DateTime<Utc>,
}

/// Input to `NotificationStore::create`.
#[derive(Debug, Clone)]
pub struct NewNotice {
    pub title: String,
    pub body: String,
    pub audience: AudienceInput,
    pub kind: NotificationKind,
}

impl NewNotice {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            audience: AudienceInput::everyone(),
            kind: NotificationKind::Banner,
        }
    }

    pub fn for_audience(mut self, audience: impl Into<AudienceInput>) -> Self {
        self.audience = audience.into();
        self
    }

    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = kind;
        self
    }
}

#[derive(Debug, Queryable, Identifiable)]
#[diesel(table_name = notifications)]
pub struct NotificationRow {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl NotificationRow {
    pub fn into_notification(self, audience: Audience) -> Notification {
        let kind = self.kind.parse().unwrap_or_else(|_| {
            tracing::warn!(notification_id = %self.id, kind = %self.kind, "unknown stored kind, using banner");
            NotificationKind::Banner
        });

        Notification {
            id: self.id,
            title: self.title,
            body: self.body,
            kind,
            audience,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub body: &'a str,
    pub kind: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = notification_audience)]
pub struct AudienceRow {
    pub notification_id: Uuid,
    pub recipient_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = read_receipts)]
pub struct NewReadReceipt {
    pub notification_id: Uuid,
    pub viewed: bool,
}
