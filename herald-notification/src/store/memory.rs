use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use super::{prepare, NotificationStore, StoreError, StoreResult};
use crate::models::{NewNotice, Notification, RecipientId};

#[derive(Default)]
struct Tables {
    // Insertion order is creation order.
    notifications: Vec<Notification>,
    receipts: HashMap<Uuid, bool>,
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryNotificationStore {
    tables: RwLock<Tables>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

fn page(items: Vec<Notification>, limit: i64, offset: i64) -> (Vec<Notification>, i64) {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (items, total)
}

impl NotificationStore for MemoryNotificationStore {
    fn create(&self, notice: NewNotice) -> StoreResult<Notification> {
        let prepared = prepare(notice)?;

        let notification = Notification {
            id: Uuid::now_v7(),
            title: prepared.title,
            body: prepared.body,
            kind: prepared.kind,
            audience: prepared.audience,
            created_at: Utc::now(),
        };

        let mut tables = self.write()?;
        tables.receipts.insert(notification.id, false);
        tables.notifications.push(notification.clone());

        tracing::debug!(
            notification_id = %notification.id,
            kind = %notification.kind,
            "notification created"
        );

        Ok(notification)
    }

    fn get(&self, id: Uuid) -> StoreResult<Notification> {
        self.read()?
            .notifications
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn list_candidates(&self, viewer_id: RecipientId) -> StoreResult<Vec<Notification>> {
        let tables = self.read()?;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.audience.includes(viewer_id))
            .cloned()
            .collect())
    }

    fn is_viewed(&self, id: Uuid) -> StoreResult<bool> {
        self.read()?
            .receipts
            .get(&id)
            .copied()
            .ok_or(StoreError::NotFound(id))
    }

    fn mark_viewed(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.write()?;
        match tables.receipts.get_mut(&id) {
            Some(viewed) => *viewed = true,
            None => tracing::debug!(notification_id = %id, "mark viewed on unknown notification ignored"),
        }
        Ok(())
    }

    fn list_all(&self, limit: i64, offset: i64) -> StoreResult<(Vec<Notification>, i64)> {
        let tables = self.read()?;
        let newest_first = tables.notifications.iter().rev().cloned().collect();
        Ok(page(newest_first, limit, offset))
    }

    fn list_for_viewer(
        &self,
        viewer_id: RecipientId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<Notification>, i64)> {
        let tables = self.read()?;
        let eligible = tables
            .notifications
            .iter()
            .rev()
            .filter(|n| n.audience.includes(viewer_id))
            .cloned()
            .collect();
        Ok(page(eligible, limit, offset))
    }

    fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
