use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::item::{self, Entity as Item};
use crate::entities::stock_movement::{self, Entity as StockMovement};
use crate::errors::ServiceError;

/// One row of the per-warehouse costing report.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ItemCostingRow {
    pub item_id: Uuid,
    pub sku: String,
    pub name: String,
    pub on_hand: Decimal,
    pub weighted_average_cost: Option<Decimal>,
    pub last_receipt_cost: Option<Decimal>,
    pub last_receipt_at: Option<DateTime<Utc>>,
    pub default_unit_cost: Decimal,
    pub cost_variance_percent: Option<Decimal>,
}

/// Quantity-weighted mean of unit costs across the stock-in entries of a
/// movement history. Recomputed from the full history on every call; there
/// is no cached running average to drift.
pub fn weighted_average<'a, I>(entries: I) -> Option<Decimal>
where
    I: IntoIterator<Item = &'a stock_movement::Model>,
{
    let mut total_quantity = Decimal::ZERO;
    let mut total_value = Decimal::ZERO;

    for entry in entries {
        if entry.quantity > Decimal::ZERO {
            total_quantity += entry.quantity;
            total_value += entry.quantity * entry.unit_cost;
        }
    }

    if total_quantity.is_zero() {
        None
    } else {
        Some(total_value / total_quantity)
    }
}

/// Percentage deviation of the weighted average cost from the item's default
/// unit cost. Absent (not zero) when the default cost is zero.
pub fn cost_variance_percent(
    weighted_average_cost: Decimal,
    default_unit_cost: Decimal,
) -> Option<Decimal> {
    if default_unit_cost.is_zero() {
        return None;
    }
    Some((weighted_average_cost - default_unit_cost) / default_unit_cost * Decimal::from(100))
}

/// On-hand quantity computed on the supplied connection; used by the posting
/// path to evaluate stock inside its own transaction.
pub async fn on_hand_with<C: ConnectionTrait>(
    conn: &C,
    warehouse_id: Uuid,
    item_id: Uuid,
    batch_number: Option<&str>,
) -> Result<Decimal, ServiceError> {
    let mut query = StockMovement::find()
        .filter(stock_movement::Column::WarehouseId.eq(warehouse_id))
        .filter(stock_movement::Column::ItemId.eq(item_id));

    if let Some(batch) = batch_number {
        query = query.filter(stock_movement::Column::BatchNumber.eq(batch));
    }

    let entries = query.all(conn).await.map_err(ServiceError::DatabaseError)?;

    Ok(entries
        .iter()
        .fold(Decimal::ZERO, |total, entry| total + entry.quantity))
}

/// Read-side valuation over the movement ledger. Every answer is a live
/// aggregate; nothing here caches.
#[derive(Clone)]
pub struct ValuationService {
    db: Arc<DbPool>,
}

impl ValuationService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Sum of signed quantities for the key, consistent with the ledger at
    /// the instant of the read.
    #[instrument(skip(self))]
    pub async fn on_hand(
        &self,
        warehouse_id: Uuid,
        item_id: Uuid,
        batch_number: Option<&str>,
    ) -> Result<Decimal, ServiceError> {
        on_hand_with(self.db.as_ref(), warehouse_id, item_id, batch_number).await
    }

    /// Weighted average cost over all stock-in entries, or `None` when the
    /// item has no stock-in history at the warehouse.
    #[instrument(skip(self))]
    pub async fn weighted_average_cost(
        &self,
        warehouse_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<Decimal>, ServiceError> {
        let entries = StockMovement::find()
            .filter(stock_movement::Column::WarehouseId.eq(warehouse_id))
            .filter(stock_movement::Column::ItemId.eq(item_id))
            .filter(stock_movement::Column::Quantity.gt(Decimal::ZERO))
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(weighted_average(&entries))
    }

    /// Unit cost and timestamp of the most recent stock-in entry.
    #[instrument(skip(self))]
    pub async fn last_receipt_cost(
        &self,
        warehouse_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<(Decimal, DateTime<Utc>)>, ServiceError> {
        let entry = StockMovement::find()
            .filter(stock_movement::Column::WarehouseId.eq(warehouse_id))
            .filter(stock_movement::Column::ItemId.eq(item_id))
            .filter(stock_movement::Column::Quantity.gt(Decimal::ZERO))
            .order_by_desc(stock_movement::Column::OccurredAt)
            .order_by_desc(stock_movement::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(entry.map(|e| (e.unit_cost, e.occurred_at)))
    }

    /// Costing report rows for every item with movement history at the
    /// warehouse, ordered by SKU.
    #[instrument(skip(self))]
    pub async fn item_costing(
        &self,
        warehouse_id: Uuid,
    ) -> Result<Vec<ItemCostingRow>, ServiceError> {
        let entries = StockMovement::find()
            .filter(stock_movement::Column::WarehouseId.eq(warehouse_id))
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut by_item: HashMap<Uuid, Vec<&stock_movement::Model>> = HashMap::new();
        for entry in &entries {
            by_item.entry(entry.item_id).or_default().push(entry);
        }

        let item_ids: Vec<Uuid> = by_item.keys().copied().collect();
        let items = Item::find()
            .filter(item::Column::Id.is_in(item_ids))
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let history = match by_item.get(&item.id) {
                Some(history) => history,
                None => continue,
            };

            let on_hand = history
                .iter()
                .fold(Decimal::ZERO, |total, entry| total + entry.quantity);
            let wac = weighted_average(history.iter().copied());
            let last_receipt = history
                .iter()
                .filter(|entry| entry.quantity > Decimal::ZERO)
                .max_by_key(|entry| entry.occurred_at);

            rows.push(ItemCostingRow {
                item_id: item.id,
                sku: item.sku.clone(),
                name: item.name.clone(),
                on_hand,
                weighted_average_cost: wac,
                last_receipt_cost: last_receipt.map(|entry| entry.unit_cost),
                last_receipt_at: last_receipt.map(|entry| entry.occurred_at),
                default_unit_cost: item.default_unit_cost,
                cost_variance_percent: wac
                    .and_then(|wac| cost_variance_percent(wac, item.default_unit_cost)),
            });
        }

        rows.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(rows)
    }
}
