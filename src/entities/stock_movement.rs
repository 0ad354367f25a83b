use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::stock_document::DocumentKind;

/// Movement classification. The sign of the quantity is the source of truth
/// for direction; the type records why the stock moved.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum MovementType {
    #[sea_orm(string_value = "Receipt")]
    Receipt,
    #[sea_orm(string_value = "Issue")]
    Issue,
    #[sea_orm(string_value = "Adjustment")]
    Adjustment,
    #[sea_orm(string_value = "TransferIn")]
    TransferIn,
    #[sea_orm(string_value = "TransferOut")]
    TransferOut,
    #[sea_orm(string_value = "Consumption")]
    Consumption,
    #[sea_orm(string_value = "SupplierReturn")]
    SupplierReturn,
}

/// One row of the append-only movement ledger.
///
/// Rows are created only inside a document's Post transition and are never
/// updated or deleted. Corrections are made by posting a new, compensating
/// document.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Attributed at append time; all entries of one posting share it.
    pub occurred_at: DateTime<Utc>,
    pub movement_type: MovementType,
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    /// Signed: positive = stock in, negative = stock out. Never zero.
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    /// Source-document reference: kind tag + document id + optional line id.
    pub document_kind: DocumentKind,
    pub document_id: Uuid,
    pub line_id: Option<Uuid>,
    pub serial_number: Option<String>,
    pub batch_number: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this entry adds stock.
    pub fn is_inbound(&self) -> bool {
        self.quantity > Decimal::ZERO
    }
}
