//! Log entry persistence. Entries are append-only apart from the age-based purge.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::AppError;
use crate::models::{LogActivity, LogEntry, LogFilter, NewLogEntry, Window};
use crate::repositories::like_pattern;
use crate::schema::log_entries;

#[async_trait]
pub trait LogEntryRepository: Send + Sync {
    async fn create(&self, new_entry: NewLogEntry) -> Result<LogEntry, AppError>;

    async fn find_by_id(&self, entry_id: i32) -> Result<Option<LogEntry>, AppError>;

    /// Entries matching every set filter field, newest first.
    async fn search(&self, filter: &LogFilter, window: Window) -> Result<Vec<LogEntry>, AppError>;

    async fn count(&self, filter: &LogFilter) -> Result<i64, AppError>;

    /// Service, level and timestamp of every entry in `[from, to]`.
    async fn activity(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<LogActivity>, AppError>;

    /// Deletes entries with `timestamp < before` and returns how many went.
    async fn purge_before(&self, before: DateTime<Utc>) -> Result<usize, AppError>;
}

#[derive(Clone)]
pub struct PgLogEntryRepository {
    pool: AsyncDbPool,
}

impl PgLogEntryRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

fn filtered(filter: &LogFilter) -> log_entries::BoxedQuery<'static, Pg> {
    use crate::schema::log_entries::dsl::*;

    let mut query = log_entries.into_boxed();

    if let Some(wanted) = filter.service {
        query = query.filter(service.eq(wanted));
    }
    if let Some(wanted) = filter.level {
        query = query.filter(level.eq(wanted));
    }
    if let Some(name) = filter.username.clone() {
        query = query.filter(username.eq(name));
    }
    if let Some(text) = filter.search_text.as_deref() {
        query = query.filter(message.like(like_pattern(text)));
    }
    if let Some(from) = filter.from_date {
        query = query.filter(timestamp.ge(from));
    }
    if let Some(to) = filter.to_date {
        query = query.filter(timestamp.le(to));
    }
    if let Some(wanted) = filter.request_id.clone() {
        query = query.filter(request_id.eq(wanted));
    }

    query
}

#[async_trait]
impl LogEntryRepository for PgLogEntryRepository {
    async fn create(&self, new_entry: NewLogEntry) -> Result<LogEntry, AppError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(log_entries::table)
            .values(&new_entry)
            .returning(LogEntry::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn find_by_id(&self, entry_id: i32) -> Result<Option<LogEntry>, AppError> {
        let mut conn = self.pool.get().await?;

        log_entries::table
            .filter(log_entries::id.eq(entry_id))
            .select(LogEntry::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn search(&self, filter: &LogFilter, window: Window) -> Result<Vec<LogEntry>, AppError> {
        let mut conn = self.pool.get().await?;

        filtered(filter)
            .order((log_entries::timestamp.desc(), log_entries::id.desc()))
            .offset(window.offset)
            .limit(window.limit)
            .select(LogEntry::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn count(&self, filter: &LogFilter) -> Result<i64, AppError> {
        let mut conn = self.pool.get().await?;

        filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn activity(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<LogActivity>, AppError> {
        use crate::schema::log_entries::dsl::*;
        let mut conn = self.pool.get().await?;

        log_entries
            .filter(timestamp.ge(from))
            .filter(timestamp.le(to))
            .select(LogActivity::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn purge_before(&self, before: DateTime<Utc>) -> Result<usize, AppError> {
        use crate::schema::log_entries::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(log_entries.filter(timestamp.lt(before)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
