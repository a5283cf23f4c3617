//! Visit history: stored visit rows and request/history merging.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::warn;

use crate::error::Result;
use crate::matrix::UserVisit;
use crate::types::{StoreKey, VisitRecord};

/// Source of stored visit rows used for model training.
#[async_trait]
pub trait VisitHistory: Send + Sync {
    /// Fetches the aggregated `(user, store, visit_count)` rows.
    async fn fetch_all(&self) -> Result<Vec<VisitRecord>>;
}

/// Used when no database is configured. The AI category then trains on
/// request-supplied visits alone.
pub struct NoVisitHistory;

#[async_trait]
impl VisitHistory for NoVisitHistory {
    async fn fetch_all(&self) -> Result<Vec<VisitRecord>> {
        Ok(Vec::new())
    }
}

/// Reads visit rows from the `user_store_visits` table.
pub struct PostgresVisitHistory {
    pool: PgPool,
}

impl PostgresVisitHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitHistory for PostgresVisitHistory {
    async fn fetch_all(&self) -> Result<Vec<VisitRecord>> {
        let rows = sqlx::query(
            "SELECT user_id, store_id, store_address, visit_count \
             FROM user_store_visits ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| VisitRecord {
                user_id: row.get("user_id"),
                store_id: row.get("store_id"),
                store_address: row.get("store_address"),
                visit_count: row.get::<i64, _>("visit_count").max(0) as u64,
            })
            .collect())
    }
}

/// Merges request-supplied visits with fetched history into training
/// tuples. Request records come first and win `(user, store)`
/// duplicates; records without a usable store key are dropped.
pub fn merge_visits(request: Vec<VisitRecord>, fetched: Vec<VisitRecord>) -> Vec<UserVisit> {
    let mut seen: HashSet<(String, StoreKey)> = HashSet::new();
    let mut merged = Vec::new();
    for record in request.into_iter().chain(fetched) {
        let store = match record.key() {
            Some(key) => key,
            None => {
                warn!(
                    "Dropping visit record without store id or address (user {})",
                    record.user_id
                );
                continue;
            }
        };
        if seen.insert((record.user_id.clone(), store.clone())) {
            merged.push(UserVisit {
                user_id: record.user_id,
                store,
                visit_count: record.visit_count,
            });
        }
    }
    merged
}
