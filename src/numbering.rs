use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::db::DbPool;
use crate::entities::document_sequence::{self, Entity as DocumentSequence};
use crate::errors::ServiceError;

/// Issues unique document numbers per prefix.
///
/// Numbers are unique and monotonically increasing per prefix; gaps are
/// allowed. An allocated number is never reissued even when the operation
/// that requested it fails afterwards.
#[async_trait]
pub trait NumberingService: Send + Sync {
    async fn next_number(&self, prefix: &str) -> Result<String, ServiceError>;
}

/// Formats an allocation as `{prefix}-{:06}`, e.g. `PR-000042`.
pub fn format_number(prefix: &str, value: i64) -> String {
    format!("{}-{:06}", prefix, value)
}

const MAX_ALLOCATION_ATTEMPTS: usize = 5;

/// Numbering backed by the `document_sequences` table.
///
/// Allocation bumps `next_value` with an update conditioned on the value
/// just read; losing that race retries with the fresh value. Sequence rows
/// are created lazily on first allocation of a prefix.
pub struct SequenceNumbering {
    db: Arc<DbPool>,
}

impl SequenceNumbering {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NumberingService for SequenceNumbering {
    #[instrument(skip(self))]
    async fn next_number(&self, prefix: &str) -> Result<String, ServiceError> {
        for _ in 0..MAX_ALLOCATION_ATTEMPTS {
            let existing = DocumentSequence::find_by_id(prefix.to_string())
                .one(&*self.db)
                .await?;

            match existing {
                Some(sequence) => {
                    let value = sequence.next_value;
                    let updated = DocumentSequence::update_many()
                        .col_expr(document_sequence::Column::NextValue, Expr::value(value + 1))
                        .col_expr(document_sequence::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(document_sequence::Column::Prefix.eq(prefix))
                        .filter(document_sequence::Column::NextValue.eq(value))
                        .exec(&*self.db)
                        .await?;

                    if updated.rows_affected == 1 {
                        return Ok(format_number(prefix, value));
                    }
                    warn!(prefix, value, "Lost sequence allocation race, retrying");
                }
                None => {
                    let row = document_sequence::ActiveModel {
                        prefix: Set(prefix.to_string()),
                        next_value: Set(2),
                        updated_at: Set(Utc::now()),
                    };
                    match row.insert(&*self.db).await {
                        Ok(_) => return Ok(format_number(prefix, 1)),
                        // another writer created the row first
                        Err(_) => warn!(prefix, "Concurrent sequence creation, retrying"),
                    }
                }
            }
        }

        Err(ServiceError::NumberingError(format!(
            "could not allocate a {} number after {} attempts",
            prefix, MAX_ALLOCATION_ATTEMPTS
        )))
    }
}

/// In-memory numbering for tests and embedded use. Same format and
/// uniqueness guarantees, no persistence.
#[derive(Default)]
pub struct InMemoryNumbering {
    counters: DashMap<String, i64>,
}

impl InMemoryNumbering {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NumberingService for InMemoryNumbering {
    async fn next_number(&self, prefix: &str) -> Result<String, ServiceError> {
        let mut entry = self.counters.entry(prefix.to_string()).or_insert(0);
        *entry += 1;
        Ok(format_number(prefix, *entry))
    }
}
