use metrics::counter;

use crate::models::{AudienceInput, NewNotice, Notification, NotificationKind};
use crate::store::{NotificationStore, StoreError, StoreResult};

/// Build a notice from loosely typed caller input. A missing audience means
/// everyone and a missing kind means banner.
pub fn notice_from_parts(
    title: String,
    body: String,
    audience: Option<AudienceInput>,
    kind: Option<&str>,
) -> StoreResult<NewNotice> {
    let kind = match kind {
        Some(raw) => raw.parse::<NotificationKind>().map_err(StoreError::Validation)?,
        None => NotificationKind::default(),
    };

    Ok(NewNotice {
        title,
        body,
        audience: audience.unwrap_or_default(),
        kind,
    })
}

/// Persist a notice and record it. Shared by the HTTP and bus entry points.
pub fn post_notice(
    store: &dyn NotificationStore,
    notice: NewNotice,
    source: &'static str,
) -> StoreResult<Notification> {
    let notification = store.create(notice)?;

    counter!(
        "notifications_created_total",
        "kind" => notification.kind.as_str(),
        "source" => source
    )
    .increment(1);

    tracing::info!(
        notification_id = %notification.id,
        kind = %notification.kind,
        source,
        broadcast = notification.audience.recipients().is_none(),
        "notification posted"
    );

    Ok(notification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Audience;
    use crate::store::MemoryNotificationStore;

    #[test]
    fn defaults_fill_missing_audience_and_kind() {
        let notice = notice_from_parts("t".into(), "b".into(), None, None).unwrap();
        assert_eq!(notice.kind, NotificationKind::Banner);
        assert_eq!(notice.audience, AudienceInput::everyone());
    }

    #[test]
    fn unknown_kind_is_a_validation_error() {
        let err = notice_from_parts("t".into(), "b".into(), None, Some("toast")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn post_notice_persists_through_the_store() {
        let store = MemoryNotificationStore::default();
        let notice = notice_from_parts("t".into(), "b".into(), None, Some("Alert")).unwrap();

        let posted = post_notice(&store, notice, "test").unwrap();
        assert_eq!(posted.kind, NotificationKind::Alert);
        assert_eq!(posted.audience, Audience::Everyone);
        assert_eq!(store.get(posted.id).unwrap(), posted);
    }
}
