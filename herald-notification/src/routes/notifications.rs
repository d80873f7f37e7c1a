use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use herald_shared::errors::{AppError, AppResult, ErrorCode};
use herald_shared::middleware::AdminUser;
use herald_shared::types::api::ApiResponse;
use herald_shared::types::auth::AuthUser;
use herald_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::{Audience, AudienceInput, DisplayStyle, Notification, NotificationKind};
use crate::services::notice_service;
use crate::store::StoreError;
use crate::AppState;

/// A notice as returned to a viewer. The audience is only included for
/// privileged viewers.
#[derive(Debug, Serialize)]
pub struct NotificationView {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
}

impl NotificationView {
    pub fn for_viewer(notification: Notification, privileged: bool) -> Self {
        Self {
            id: notification.id,
            title: notification.title,
            body: notification.body,
            kind: notification.kind,
            created_at: notification.created_at,
            audience: privileged.then_some(notification.audience),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NextNotificationResponse {
    #[serde(flatten)]
    pub notification: NotificationView,
    pub display_style: DisplayStyle,
    pub css_class: &'static str,
}

/// GET /notifications/next
/// The single notice to render on this page load, or `null`. Callers mark it
/// viewed once it has actually been displayed.
pub async fn next_notification(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Json<ApiResponse<Option<NextNotificationResponse>>> {
    let next = state.resolver.next_for(auth_user.id).map(|notification| {
        let style = notification.kind.display_style();
        NextNotificationResponse {
            notification: NotificationView::for_viewer(notification, auth_user.is_privileged()),
            display_style: style,
            css_class: style.css_class(),
        }
    });

    Json(ApiResponse::ok(next))
}

#[derive(Debug, Serialize)]
pub struct PendingCountResponse {
    pub count: usize,
}

/// GET /notifications/pending-count
pub async fn pending_count(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<PendingCountResponse>>> {
    let count = state.resolver.pending_for(auth_user.id)?.len();

    Ok(Json(ApiResponse::ok(PendingCountResponse { count })))
}

#[derive(Debug, Serialize)]
pub struct ViewedStatusResponse {
    pub id: Uuid,
    pub viewed: bool,
}

/// POST /notifications/:id/viewed
/// Idempotent; unknown ids are accepted. The flag is shared by every viewer,
/// so only the notice's audience (or an admin) may set it.
pub async fn mark_viewed(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ViewedStatusResponse>>> {
    match state.store.get(id) {
        Ok(notification)
            if !auth_user.is_privileged() && !notification.audience.includes(auth_user.id) =>
        {
            tracing::warn!(notification_id = %id, viewer_id = %auth_user.id, "viewer outside audience tried to mark notification viewed");
            return Err(AppError::forbidden("notification is not addressed to you"));
        }
        Ok(_) | Err(StoreError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    state.resolver.acknowledge(id)?;

    tracing::debug!(notification_id = %id, viewer_id = %auth_user.id, "viewer acknowledged notification");

    Ok(Json(ApiResponse::ok(ViewedStatusResponse { id, viewed: true })))
}

/// GET /notifications/:id/status
pub async fn viewed_status(
    State(state): State<Arc<AppState>>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ViewedStatusResponse>>> {
    let viewed = state.store.is_viewed(id)?;

    Ok(Json(ApiResponse::ok(ViewedStatusResponse { id, viewed })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "body must not be empty"))]
    pub body: String,
    #[serde(default)]
    pub audience: Option<AudienceInput>,
    #[serde(default)]
    pub kind: Option<String>,
}

/// POST /notifications
/// Admin only.
pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateNotificationRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<NotificationView>>)> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let notice = notice_service::notice_from_parts(req.title, req.body, req.audience, req.kind.as_deref())?;
    let notification = notice_service::post_notice(state.store.as_ref(), notice, "http")?;

    tracing::info!(notification_id = %notification.id, admin_id = %admin.id, "admin posted notification");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(NotificationView::for_viewer(notification, true))),
    ))
}

/// GET /notifications
/// Management listing. Admins see every notice with its audience; everyone
/// else sees only notices addressed to them, without audiences.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<NotificationView>>>> {
    let (limit, offset) = params.to_sql_window();
    let privileged = auth_user.is_privileged();

    let (items, total) = if privileged {
        state.store.list_all(limit, offset)?
    } else {
        state.store.list_for_viewer(auth_user.id, limit, offset)?
    };

    let views = items
        .into_iter()
        .map(|n| NotificationView::for_viewer(n, privileged))
        .collect();

    let paginated = Paginated::new(views, total as u64, &params);
    Ok(Json(ApiResponse::ok(paginated)))
}
