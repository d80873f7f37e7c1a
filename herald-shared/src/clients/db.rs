use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Build a Postgres pool. No idle connections are opened up front, so a
/// service can start while its database is still coming up.
pub fn create_pool(database_url: &str, max_size: u32) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .min_idle(Some(0))
        .test_on_check_out(true)
        .connection_timeout(std::time::Duration::from_secs(5))
        .build(manager)?;

    tracing::info!(max_size, "database connection pool created");
    Ok(pool)
}
