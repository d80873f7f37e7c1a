use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use uuid::Uuid;

use herald_shared::clients::db::DbPool;

use super::{prepare, NotificationStore, StoreError, StoreResult};
use crate::models::{
    Audience, AudienceRow, NewNotice, NewNotificationRow, NewReadReceipt, Notification,
    NotificationRow, RecipientId,
};
use crate::schema::{notification_audience, notifications, read_receipts};

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Postgres-backed store. An empty audience table entry means everyone.
pub struct PgNotificationStore {
    pool: DbPool,
}

impl PgNotificationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> StoreResult<PgPooledConnection> {
        self.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection");
            StoreError::Unavailable(e.to_string())
        })
    }
}

/// Notices addressed to `viewer_id` or to nobody in particular.
fn eligible_for(viewer_id: RecipientId) -> notifications::BoxedQuery<'static, Pg> {
    let targeted = notification_audience::table
        .filter(notification_audience::recipient_id.eq(viewer_id))
        .select(notification_audience::notification_id);
    let addressed = notification_audience::table.select(notification_audience::notification_id);

    notifications::table
        .filter(
            notifications::id
                .eq_any(targeted)
                .or(notifications::id.ne_all(addressed)),
        )
        .into_boxed()
}

fn with_audiences(
    conn: &mut PgConnection,
    rows: Vec<NotificationRow>,
) -> StoreResult<Vec<Notification>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let audience_rows = notification_audience::table
        .filter(notification_audience::notification_id.eq_any(&ids))
        .load::<AudienceRow>(conn)?;

    let mut recipients: HashMap<Uuid, BTreeSet<RecipientId>> = HashMap::new();
    for row in audience_rows {
        recipients
            .entry(row.notification_id)
            .or_default()
            .insert(row.recipient_id);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let audience = recipients
                .remove(&row.id)
                .map(Audience::Recipients)
                .unwrap_or(Audience::Everyone);
            row.into_notification(audience)
        })
        .collect())
}

impl NotificationStore for PgNotificationStore {
    fn create(&self, notice: NewNotice) -> StoreResult<Notification> {
        let prepared = prepare(notice)?;
        let mut conn = self.conn()?;

        let id = Uuid::now_v7();
        let created_at = Utc::now();

        conn.transaction::<_, StoreError, _>(|conn| {
            diesel::insert_into(notifications::table)
                .values(&NewNotificationRow {
                    id,
                    title: &prepared.title,
                    body: &prepared.body,
                    kind: prepared.kind.as_str(),
                    created_at,
                })
                .execute(conn)?;

            if let Some(recipients) = prepared.audience.recipients() {
                let rows: Vec<AudienceRow> = recipients
                    .iter()
                    .map(|&recipient_id| AudienceRow {
                        notification_id: id,
                        recipient_id,
                    })
                    .collect();
                diesel::insert_into(notification_audience::table)
                    .values(&rows)
                    .execute(conn)?;
            }

            diesel::insert_into(read_receipts::table)
                .values(&NewReadReceipt {
                    notification_id: id,
                    viewed: false,
                })
                .execute(conn)?;

            Ok(())
        })?;

        tracing::debug!(
            notification_id = %id,
            kind = %prepared.kind,
            "notification created"
        );

        Ok(Notification {
            id,
            title: prepared.title,
            body: prepared.body,
            kind: prepared.kind,
            audience: prepared.audience,
            created_at,
        })
    }

    fn get(&self, id: Uuid) -> StoreResult<Notification> {
        let mut conn = self.conn()?;

        let row = notifications::table
            .find(id)
            .first::<NotificationRow>(&mut conn)
            .optional()?
            .ok_or(StoreError::NotFound(id))?;

        with_audiences(&mut conn, vec![row])?
            .pop()
            .ok_or(StoreError::NotFound(id))
    }

    fn list_candidates(&self, viewer_id: RecipientId) -> StoreResult<Vec<Notification>> {
        let mut conn = self.conn()?;

        let rows = eligible_for(viewer_id)
            .order((notifications::created_at.asc(), notifications::id.asc()))
            .load::<NotificationRow>(&mut conn)?;

        with_audiences(&mut conn, rows)
    }

    fn is_viewed(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn()?;

        read_receipts::table
            .find(id)
            .select(read_receipts::viewed)
            .first::<bool>(&mut conn)
            .optional()?
            .ok_or(StoreError::NotFound(id))
    }

    fn mark_viewed(&self, id: Uuid) -> StoreResult<()> {
        let mut conn = self.conn()?;

        let updated = diesel::update(read_receipts::table.find(id))
            .set(read_receipts::viewed.eq(true))
            .execute(&mut conn)?;

        if updated == 0 {
            tracing::debug!(notification_id = %id, "mark viewed on unknown notification ignored");
        }

        Ok(())
    }

    fn list_all(&self, limit: i64, offset: i64) -> StoreResult<(Vec<Notification>, i64)> {
        let mut conn = self.conn()?;

        let total: i64 = notifications::table.count().get_result(&mut conn)?;

        let rows = notifications::table
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .limit(limit)
            .offset(offset)
            .load::<NotificationRow>(&mut conn)?;

        Ok((with_audiences(&mut conn, rows)?, total))
    }

    fn list_for_viewer(
        &self,
        viewer_id: RecipientId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<Notification>, i64)> {
        let mut conn = self.conn()?;

        let total: i64 = eligible_for(viewer_id).count().get_result(&mut conn)?;

        let rows = eligible_for(viewer_id)
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .limit(limit)
            .offset(offset)
            .load::<NotificationRow>(&mut conn)?;

        Ok((with_audiences(&mut conn, rows)?, total))
    }

    fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn()?;
        diesel::sql_query("SELECT 1").execute(&mut conn)?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
