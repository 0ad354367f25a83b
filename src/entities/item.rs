use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Broad classification of an item
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ItemType {
    #[sea_orm(string_value = "SparePart")]
    SparePart,
    #[sea_orm(string_value = "Equipment")]
    Equipment,
    #[sea_orm(string_value = "Consumable")]
    Consumable,
}

/// Per-item policy governing what identity metadata a stock movement for the
/// item must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum TrackingType {
    #[sea_orm(string_value = "None")]
    None,
    #[sea_orm(string_value = "Batch")]
    Batch,
    #[sea_orm(string_value = "Serial")]
    Serial,
}

/// Item master record. Owned by master-data management; this crate only ever
/// reads it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub item_type: ItemType,
    pub tracking_type: TrackingType,
    pub unit_of_measure: String,
    pub default_unit_cost: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
