use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionError,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::item::Entity as Item;
use crate::entities::reorder_setting::{self, Entity as ReorderSetting};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::valuation;

/// A warehouse/item pair whose on-hand quantity has fallen to or below its
/// configured reorder point.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReorderAlert {
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    pub sku: String,
    pub on_hand: Decimal,
    pub reorder_point: Decimal,
    pub reorder_quantity: Decimal,
    pub default_unit_cost: Decimal,
}

/// One suggested requisition line handed to procurement.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedLine {
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

/// What procurement reports back after creating the requisition.
#[derive(Debug, Clone)]
pub struct RequisitionSummary {
    pub requisition_id: Uuid,
    pub requisition_number: String,
    pub line_count: usize,
    pub submitted: bool,
}

/// Seam to the procurement subsystem. The evaluator only computes suggested
/// lines; the requisition document and its approval workflow belong to
/// procurement.
#[async_trait]
pub trait ProcurementGateway: Send + Sync {
    async fn create_requisition(
        &self,
        warehouse_id: Uuid,
        lines: Vec<SuggestedLine>,
        notes: Option<String>,
        submit: bool,
    ) -> Result<RequisitionSummary, ServiceError>;
}

/// Compares ledger-derived on-hand quantities against reorder thresholds.
#[derive(Clone)]
pub struct ReorderService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl ReorderService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates or updates the threshold for a warehouse/item pair.
    #[instrument(skip(self))]
    pub async fn upsert_setting(
        &self,
        warehouse_id: Uuid,
        item_id: Uuid,
        reorder_point: Decimal,
        reorder_quantity: Decimal,
    ) -> Result<reorder_setting::Model, ServiceError> {
        if reorder_point < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "reorder point cannot be negative".to_string(),
            ));
        }
        if reorder_quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "reorder quantity must be positive".to_string(),
            ));
        }

        self.db
            .transaction::<_, reorder_setting::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = ReorderSetting::find()
                        .filter(reorder_setting::Column::WarehouseId.eq(warehouse_id))
                        .filter(reorder_setting::Column::ItemId.eq(item_id))
                        .one(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    let now = Utc::now();
                    match existing {
                        Some(setting) => {
                            let mut active: reorder_setting::ActiveModel = setting.into();
                            active.reorder_point = Set(reorder_point);
                            active.reorder_quantity = Set(reorder_quantity);
                            active.updated_at = Set(now);
                            active.update(txn).await.map_err(ServiceError::DatabaseError)
                        }
                        None => {
                            let setting = reorder_setting::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                warehouse_id: Set(warehouse_id),
                                item_id: Set(item_id),
                                reorder_point: Set(reorder_point),
                                reorder_quantity: Set(reorder_quantity),
                                created_at: Set(now),
                                updated_at: Set(now),
                            };
                            setting.insert(txn).await.map_err(ServiceError::DatabaseError)
                        }
                    }
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })
    }

    /// Every configured pair whose on-hand is at or below its reorder
    /// point, optionally restricted to one warehouse. Inactive items are
    /// skipped.
    #[instrument(skip(self))]
    pub async fn alerts(
        &self,
        warehouse_id: Option<Uuid>,
    ) -> Result<Vec<ReorderAlert>, ServiceError> {
        let db = self.db.as_ref();

        let mut query = ReorderSetting::find();
        if let Some(warehouse_id) = warehouse_id {
            query = query.filter(reorder_setting::Column::WarehouseId.eq(warehouse_id));
        }
        let settings = query.all(db).await.map_err(ServiceError::DatabaseError)?;

        let mut alerts = Vec::new();
        for setting in settings {
            let item = match Item::find_by_id(setting.item_id)
                .one(db)
                .await
                .map_err(ServiceError::DatabaseError)?
            {
                Some(item) => item,
                None => {
                    debug!(item_id = %setting.item_id, "reorder setting references a missing item");
                    continue;
                }
            };
            if !item.is_active {
                debug!(sku = %item.sku, "skipping reorder check for inactive item");
                continue;
            }

            let on_hand =
                valuation::on_hand_with(db, setting.warehouse_id, setting.item_id, None).await?;

            if on_hand <= setting.reorder_point {
                alerts.push(ReorderAlert {
                    warehouse_id: setting.warehouse_id,
                    item_id: setting.item_id,
                    sku: item.sku,
                    on_hand,
                    reorder_point: setting.reorder_point,
                    reorder_quantity: setting.reorder_quantity,
                    default_unit_cost: item.default_unit_cost,
                });
            }
        }

        alerts.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(alerts)
    }

    /// Aggregates the warehouse's current alerts into suggested requisition
    /// lines and hands them to procurement. Returns `None` when nothing is
    /// below its reorder point.
    #[instrument(skip(self, gateway))]
    pub async fn create_purchase_requisition_from_alerts(
        &self,
        gateway: &dyn ProcurementGateway,
        warehouse_id: Uuid,
        notes: Option<String>,
        submit: bool,
    ) -> Result<Option<RequisitionSummary>, ServiceError> {
        let alerts = self.alerts(Some(warehouse_id)).await?;
        if alerts.is_empty() {
            info!(%warehouse_id, "no reorder alerts; skipping requisition");
            return Ok(None);
        }

        self.event_sender
            .send(Event::ReorderAlertsRaised {
                warehouse_id: Some(warehouse_id),
                alert_count: alerts.len(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        let lines: Vec<SuggestedLine> = alerts
            .iter()
            .map(|alert| SuggestedLine {
                item_id: alert.item_id,
                quantity: alert.reorder_quantity,
                unit_cost: alert.default_unit_cost,
            })
            .collect();

        let summary = gateway
            .create_requisition(warehouse_id, lines, notes, submit)
            .await?;

        info!(
            %warehouse_id,
            requisition_number = %summary.requisition_number,
            line_count = summary.line_count,
            submitted = summary.submitted,
            "purchase requisition suggested from reorder alerts"
        );

        self.event_sender
            .send(Event::RequisitionSuggested {
                warehouse_id,
                requisition_id: summary.requisition_id,
                line_count: summary.line_count,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(Some(summary))
    }
}
