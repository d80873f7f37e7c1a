//! Postgres store checks. Needs a scratch database:
//!
//! ```text
//! HERALD_TEST_DATABASE_URL=postgres://... cargo test -p herald-notification -- --ignored
//! ```
//!
//! The schema is recreated at the start of the run.

use diesel::connection::SimpleConnection;
use uuid::Uuid;

use herald_notification::models::{Audience, NewNotice, NotificationKind};
use herald_notification::services::NotificationResolver;
use herald_notification::store::{NotificationStore, PgNotificationStore, StoreError};
use herald_shared::clients::db::create_pool;

const UP: &str = include_str!("../migrations/2026-10-01-000000_create_notifications/up.sql");

fn store() -> PgNotificationStore {
    let url = std::env::var("HERALD_TEST_DATABASE_URL").expect("HERALD_TEST_DATABASE_URL must be set");
    let pool = create_pool(&url, 2).unwrap();
    let mut conn = pool.get().unwrap();
    conn.batch_execute(
        "DROP TABLE IF EXISTS read_receipts, notification_audience, notifications CASCADE;",
    )
    .unwrap();
    conn.batch_execute(UP).unwrap();
    PgNotificationStore::new(pool)
}

#[test]
#[ignore = "requires HERALD_TEST_DATABASE_URL"]
fn postgres_store_behaves_like_the_contract() {
    let store = store();
    let a = Uuid::now_v7();
    let b = Uuid::now_v7();
    let outsider = Uuid::now_v7();

    assert!(matches!(store.create(NewNotice::new("", "b")), Err(StoreError::Validation(_))));
    assert!(matches!(store.create(NewNotice::new("t", "")), Err(StoreError::Validation(_))));
    assert_eq!(store.list_all(10, 0).unwrap().1, 0);

    let broadcast = store.create(NewNotice::new("Maintenance", "System down 5pm")).unwrap();
    let targeted = store
        .create(
            NewNotice::new("Billing issue", "Check invoice")
                .for_audience(vec![a, b])
                .with_kind(NotificationKind::Alert),
        )
        .unwrap();

    let for_a: Vec<Uuid> = store.list_candidates(a).unwrap().iter().map(|n| n.id).collect();
    assert_eq!(for_a, vec![broadcast.id, targeted.id]);
    let for_outsider: Vec<Uuid> = store.list_candidates(outsider).unwrap().iter().map(|n| n.id).collect();
    assert_eq!(for_outsider, vec![broadcast.id]);

    let loaded = store.get(targeted.id).unwrap();
    assert_eq!(loaded.kind, NotificationKind::Alert);
    assert!(matches!(loaded.audience, Audience::Recipients(ref set) if set.len() == 2));

    assert!(!store.is_viewed(broadcast.id).unwrap());
    store.mark_viewed(broadcast.id).unwrap();
    store.mark_viewed(broadcast.id).unwrap();
    assert!(store.is_viewed(broadcast.id).unwrap());
    store.mark_viewed(Uuid::now_v7()).unwrap();
    assert!(matches!(store.is_viewed(Uuid::now_v7()), Err(StoreError::NotFound(_))));

    let (mine, total) = store.list_for_viewer(outsider, 10, 0).unwrap();
    assert_eq!(total, 1);
    assert_eq!(mine[0].id, broadcast.id);

    let resolver = NotificationResolver::new(std::sync::Arc::new(store));
    assert_eq!(resolver.next_for(a).map(|n| n.id), Some(targeted.id));
    assert!(resolver.next_for(outsider).is_none());
}
