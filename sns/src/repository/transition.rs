use super::observed;
use crate::config::{is_identifier, MysqlConfig};
use crate::domain::Transition;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

/// Time series of a user's counters, newest first.
#[async_trait]
pub trait TransitionStore: Send + Sync {
    /// Rows for `user_id` dated `start..=end` (whole days), at most `limit`.
    async fn transitions_by_user(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        limit: u32,
    ) -> Result<Vec<Transition>>;
}

pub struct MySqlTransitionStore {
    pool: MySqlPool,
    sql: String,
}

impl MySqlTransitionStore {
    /// Build the store with a lazily connected pool; nothing is dialed until
    /// the first query.
    pub fn connect_lazy(config: &MysqlConfig) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(&config.url)?;
        Self::with_pool(pool, &config.transition_table)
    }

    pub fn with_pool(pool: MySqlPool, table: &str) -> Result<Self> {
        if !is_identifier(table) {
            return Err(Error::Config(format!("invalid transition table name '{table}'")));
        }
        Ok(Self {
            pool,
            sql: transition_sql(table),
        })
    }
}

/// Source column and row field for each integer column. The store keeps signed
/// integer columns, so each one is cast to match the unsigned row fields.
const UNSIGNED_COLUMNS: [(&str, &str); 6] = [
    ("user_id", "user_id"),
    ("followers_count", "follower_count"),
    ("friends_count", "friend_count"),
    ("listed_count", "listed_count"),
    ("favourites_count", "favorite_count"),
    ("statuses_count", "status_count"),
];

fn transition_sql(table: &str) -> String {
    let columns = UNSIGNED_COLUMNS
        .iter()
        .map(|(column, field)| format!("CAST({column} AS UNSIGNED) AS {field}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT {columns}, created_at \
         FROM {table} \
         WHERE user_id = ? AND created_at BETWEEN ? AND ? \
         ORDER BY created_at DESC \
         LIMIT ?"
    )
}

#[async_trait]
impl TransitionStore for MySqlTransitionStore {
    async fn transitions_by_user(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        limit: u32,
    ) -> Result<Vec<Transition>> {
        const OPERATION: &str = "transitions_by_user";

        let from = start.and_time(NaiveTime::MIN);
        let until = end.and_hms_opt(23, 59, 59).unwrap_or(from);

        let result = sqlx::query_as::<_, Transition>(&self.sql)
            .bind(user_id)
            .bind(from)
            .bind(until)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::from)
            .inspect_err(|e| {
                tracing::error!(
                    operation = OPERATION,
                    user_id,
                    error = %e,
                    "Transition query failed"
                )
            });

        observed(OPERATION, result)
    }
}
