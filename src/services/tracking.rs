use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use std::collections::HashSet;
use tracing::warn;
use uuid::Uuid;

use crate::entities::item::{self, TrackingType};
use crate::entities::stock_document_line;
use crate::entities::stock_movement::{self, Entity as StockMovement};
use crate::errors::ServiceError;

/// Upper bound for a stored serial number.
pub const MAX_SERIAL_LENGTH: usize = 64;

/// Trims, bounds and de-duplicates the serial numbers supplied for one line.
pub fn normalize_serials(raw: &[String]) -> Result<Vec<String>, ServiceError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(raw.len());

    for serial in raw {
        let trimmed = serial.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::ValidationError(
                "serial numbers cannot be blank".to_string(),
            ));
        }
        if trimmed.len() > MAX_SERIAL_LENGTH {
            return Err(ServiceError::ValidationError(format!(
                "serial number '{}' exceeds {} characters",
                trimmed, MAX_SERIAL_LENGTH
            )));
        }
        if !seen.insert(trimmed.to_string()) {
            return Err(ServiceError::ValidationError(format!(
                "duplicate serial number '{}' on line",
                trimmed
            )));
        }
        normalized.push(trimmed.to_string());
    }

    Ok(normalized)
}

/// Confirms a line's identity metadata against its item's tracking type.
///
/// `Batch` items without a batch number are accepted; the warehouse teams
/// that feed this system routinely post un-batched receipts, so the line is
/// only logged. Serial items are held to the strict rule: one serial per
/// unit, whole-number quantity, on every document kind.
pub fn validate_line(
    item: &item::Model,
    line: &stock_document_line::Model,
    serials: &[String],
) -> Result<(), ServiceError> {
    match item.tracking_type {
        TrackingType::None => Ok(()),
        TrackingType::Batch => {
            if line.batch_number.is_none() {
                warn!(
                    sku = %item.sku,
                    line_id = %line.id,
                    "batch-tracked line has no batch number"
                );
            }
            Ok(())
        }
        TrackingType::Serial => {
            let magnitude = line.quantity.abs();
            if !magnitude.fract().is_zero() {
                return Err(ServiceError::ValidationError(format!(
                    "serial-tracked item {} requires a whole-number quantity, got {}",
                    item.sku, line.quantity
                )));
            }
            let expected = magnitude.to_u64().ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "quantity {} is out of range for serial tracking",
                    line.quantity
                ))
            })?;
            if serials.len() as u64 != expected {
                return Err(ServiceError::ValidationError(format!(
                    "serial-tracked item {} requires {} serial numbers, got {}",
                    item.sku,
                    expected,
                    serials.len()
                )));
            }
            Ok(())
        }
    }
}

/// Net on-ledger quantity for one serial of an item, optionally narrowed to
/// a warehouse. Positive means the serial is currently in stock.
async fn serial_balance<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    serial: &str,
    warehouse_id: Option<Uuid>,
) -> Result<Decimal, ServiceError> {
    let mut query = StockMovement::find()
        .filter(stock_movement::Column::ItemId.eq(item_id))
        .filter(stock_movement::Column::SerialNumber.eq(serial));

    if let Some(warehouse_id) = warehouse_id {
        query = query.filter(stock_movement::Column::WarehouseId.eq(warehouse_id));
    }

    let entries = query.all(conn).await.map_err(ServiceError::DatabaseError)?;

    Ok(entries
        .iter()
        .fold(Decimal::ZERO, |total, entry| total + entry.quantity))
}

/// Ledger-wide serial availability.
///
/// Inbound postings may not re-receive a serial that is still in stock
/// anywhere; outbound postings may only take a serial that is in stock at
/// the issuing warehouse. Violations are consistency errors and reject the
/// posting rather than being silently corrected.
pub async fn ensure_serials_available<C: ConnectionTrait>(
    conn: &C,
    item: &item::Model,
    warehouse_id: Uuid,
    serials: &[String],
    inbound: bool,
) -> Result<(), ServiceError> {
    for serial in serials {
        if inbound {
            let balance = serial_balance(conn, item.id, serial, None).await?;
            if balance > Decimal::ZERO {
                return Err(ServiceError::Conflict(format!(
                    "serial number '{}' of item {} is already in stock",
                    serial, item.sku
                )));
            }
        } else {
            let balance = serial_balance(conn, item.id, serial, Some(warehouse_id)).await?;
            if balance <= Decimal::ZERO {
                return Err(ServiceError::Conflict(format!(
                    "serial number '{}' of item {} is not in stock at the issuing warehouse",
                    serial, item.sku
                )));
            }
        }
    }

    Ok(())
}
