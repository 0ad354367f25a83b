use sea_orm::{ActiveModelTrait, ConnectionTrait, DbBackend, EntityTrait, Set, Statement};
use tracing::instrument;

use crate::entities::document_sequence;
use crate::errors::ServiceError;

/// Width of the numeric part of a document number (`PO000001`).
const NUMBER_WIDTH: usize = 6;

/// Formats a counter value as a document number.
pub fn format_number(prefix: &str, value: i64) -> String {
    format!("{}{:0width$}", prefix, value, width = NUMBER_WIDTH)
}

/// Keyed document-number counter.
///
/// Each prefix owns an independent counter. `next_in` must run inside the
/// caller's transaction: the increment commits or rolls back together with
/// the document insert, which is what keeps the numbering gap-free. The row
/// update serializes concurrent callers on the same prefix, so two `next_in`
/// calls can never observe the same value.
#[derive(Debug, Clone, Copy)]
pub struct SequenceService {
    start: i64,
}

impl SequenceService {
    pub fn new(start: i64) -> Self {
        Self { start }
    }

    /// Atomically consumes and returns the next number for `prefix`.
    #[instrument(skip(self, conn))]
    pub async fn next_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        prefix: &str,
    ) -> Result<String, ServiceError> {
        let backend = conn.get_database_backend();
        let sql = match backend {
            DbBackend::Postgres => {
                "UPDATE document_sequences SET current_value = current_value + 1 \
                 WHERE prefix = $1 RETURNING current_value"
            }
            _ => {
                "UPDATE document_sequences SET current_value = current_value + 1 \
                 WHERE prefix = ? RETURNING current_value"
            }
        };
        let stmt = Statement::from_sql_and_values(backend, sql, [prefix.into()]);

        if let Some(row) = conn
            .query_one(stmt)
            .await
            .map_err(ServiceError::DatabaseError)?
        {
            let value: i64 = row
                .try_get("", "current_value")
                .map_err(ServiceError::DatabaseError)?;
            return Ok(format_number(prefix, value));
        }

        // First number for this prefix. A racing first-use insert hits the
        // primary key and fails the enclosing transaction, which the caller
        // retries as a whole.
        let seed = document_sequence::ActiveModel {
            prefix: Set(prefix.to_string()),
            current_value: Set(self.start),
        };
        seed.insert(conn).await.map_err(ServiceError::DatabaseError)?;

        Ok(format_number(prefix, self.start))
    }

    /// Returns the number `next_in` would issue, without consuming it.
    pub async fn peek<C: ConnectionTrait>(
        &self,
        conn: &C,
        prefix: &str,
    ) -> Result<String, ServiceError> {
        let row = document_sequence::Entity::find_by_id(prefix.to_string())
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(match row {
            Some(sequence) => format_number(prefix, sequence.current_value + 1),
            None => format_number(prefix, self.start),
        })
    }
}
