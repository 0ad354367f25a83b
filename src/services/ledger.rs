use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::stock_document::DocumentKind;
use crate::entities::stock_movement::{self, Entity as StockMovement, MovementType};
use crate::errors::ServiceError;

/// A movement entry about to be appended. Produced by the posting planner;
/// never constructed from caller input directly.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub movement_type: MovementType,
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub document_kind: DocumentKind,
    pub document_id: Uuid,
    pub line_id: Option<Uuid>,
    pub serial_number: Option<String>,
    pub batch_number: Option<String>,
}

/// Read side of the append-only movement ledger.
///
/// There is deliberately no update or delete on this type: entries are
/// written once, inside a posting transaction, through [`MovementLedger::append`].
#[derive(Clone)]
pub struct MovementLedger {
    db: Arc<DbPool>,
}

impl MovementLedger {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Appends entries as part of the caller's posting transaction. All
    /// entries share the supplied `occurred_at` timestamp.
    pub async fn append<C: ConnectionTrait>(
        conn: &C,
        occurred_at: DateTime<Utc>,
        movements: Vec<NewMovement>,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let mut saved = Vec::with_capacity(movements.len());

        for movement in movements {
            if movement.quantity.is_zero() {
                return Err(ServiceError::ValidationError(
                    "ledger entries must carry a non-zero quantity".to_string(),
                ));
            }
            if movement.unit_cost < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "ledger entries must carry a non-negative unit cost".to_string(),
                ));
            }

            let entry = stock_movement::ActiveModel {
                id: Set(Uuid::new_v4()),
                occurred_at: Set(occurred_at),
                movement_type: Set(movement.movement_type),
                warehouse_id: Set(movement.warehouse_id),
                item_id: Set(movement.item_id),
                quantity: Set(movement.quantity),
                unit_cost: Set(movement.unit_cost),
                document_kind: Set(movement.document_kind),
                document_id: Set(movement.document_id),
                line_id: Set(movement.line_id),
                serial_number: Set(movement.serial_number),
                batch_number: Set(movement.batch_number),
            };

            let row = entry.insert(conn).await.map_err(ServiceError::DatabaseError)?;
            saved.push(row);
        }

        Ok(saved)
    }

    /// Ordered movement history for a warehouse/item, optionally narrowed to
    /// one batch.
    #[instrument(skip(self))]
    pub async fn entries(
        &self,
        warehouse_id: Uuid,
        item_id: Uuid,
        batch_number: Option<&str>,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let mut query = StockMovement::find()
            .filter(stock_movement::Column::WarehouseId.eq(warehouse_id))
            .filter(stock_movement::Column::ItemId.eq(item_id));

        if let Some(batch) = batch_number {
            query = query.filter(stock_movement::Column::BatchNumber.eq(batch));
        }

        query
            .order_by_asc(stock_movement::Column::OccurredAt)
            .order_by_asc(stock_movement::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// All entries written by one posting document.
    #[instrument(skip(self))]
    pub async fn entries_for_document(
        &self,
        kind: DocumentKind,
        document_id: Uuid,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        StockMovement::find()
            .filter(stock_movement::Column::DocumentKind.eq(kind))
            .filter(stock_movement::Column::DocumentId.eq(document_id))
            .order_by_asc(stock_movement::Column::OccurredAt)
            .order_by_asc(stock_movement::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
