use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::entities::item::{Entity as Item, TrackingType};
use crate::entities::stock_document::{
    self, DocumentKind, DocumentStatus, Entity as StockDocument,
};
use crate::entities::stock_document_line::{self, Entity as StockDocumentLine};
use crate::entities::stock_document_serial::{self, Entity as StockDocumentSerial};
use crate::entities::stock_movement;
use crate::entities::warehouse::Entity as Warehouse;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::ledger::{MovementLedger, NewMovement};
use crate::services::sequences::SequenceService;
use crate::services::{posting, tracking, valuation};

/// Request to open a new draft document.
#[derive(Debug, Clone, Validate)]
pub struct NewDocument {
    pub kind: DocumentKind,
    pub warehouse_id: Uuid,
    /// Transfers only: the receiving warehouse.
    pub dest_warehouse_id: Option<Uuid>,
    /// Supplier or requesting-department reference, kind-dependent.
    pub counterpart_id: Option<Uuid>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Request to add or replace a document line.
#[derive(Debug, Clone, Validate)]
pub struct LineInput {
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    #[validate(length(max = 64))]
    pub batch_number: Option<String>,
    pub serial_numbers: Vec<String>,
}

/// Outcome of a successful post: the updated header and the ledger entries
/// it wrote.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PostResult {
    pub document: stock_document::Model,
    pub movements: Vec<stock_movement::Model>,
}

/// Read-only document view: header plus lines plus serials, enough for an
/// external renderer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DocumentDetail {
    pub document: stock_document::Model,
    pub lines: Vec<DocumentLineDetail>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DocumentLineDetail {
    pub line: stock_document_line::Model,
    pub serial_numbers: Vec<String>,
}

/// The one lifecycle shared by every stock document kind.
///
/// Drafts collect lines; `post` turns a draft into ledger entries and is the
/// only write path into the movement ledger; `void` closes a draft without
/// posting. Posted and voided documents never change again.
#[derive(Clone)]
pub struct DocumentService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    sequences: SequenceService,
    enforce_non_negative_stock: bool,
    page_default_size: u64,
    page_max_size: u64,
}

impl DocumentService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        sequences: SequenceService,
        config: &AppConfig,
    ) -> Self {
        Self {
            db,
            event_sender,
            sequences,
            enforce_non_negative_stock: config.enforce_non_negative_stock,
            page_default_size: config.page_default_size,
            page_max_size: config.page_max_size,
        }
    }

    /// Opens a draft and assigns its document number. The number issuance
    /// and the header insert share one transaction, so a failed creation
    /// consumes no number.
    #[instrument(skip(self, request), fields(kind = %request.kind))]
    pub async fn create_draft(
        &self,
        request: NewDocument,
    ) -> Result<stock_document::Model, ServiceError> {
        request.validate()?;

        if request.kind.requires_destination() {
            match request.dest_warehouse_id {
                None => {
                    return Err(ServiceError::ValidationError(
                        "transfer documents require a destination warehouse".to_string(),
                    ))
                }
                Some(dest) if dest == request.warehouse_id => {
                    return Err(ServiceError::ValidationError(
                        "transfer source and destination warehouses must differ".to_string(),
                    ))
                }
                Some(_) => {}
            }
        } else if request.dest_warehouse_id.is_some() {
            return Err(ServiceError::ValidationError(
                "only transfer documents carry a destination warehouse".to_string(),
            ));
        }

        let sequences = self.sequences;
        let document = self
            .db
            .transaction::<_, stock_document::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    for warehouse_id in std::iter::once(request.warehouse_id)
                        .chain(request.dest_warehouse_id)
                    {
                        let warehouse = Warehouse::find_by_id(warehouse_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::DatabaseError)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "warehouse {} not found",
                                    warehouse_id
                                ))
                            })?;
                        if !warehouse.is_active {
                            return Err(ServiceError::ValidationError(format!(
                                "warehouse {} is not active",
                                warehouse.code
                            )));
                        }
                    }

                    let number = sequences.next_in(txn, request.kind.prefix()).await?;
                    let now = Utc::now();

                    let draft = stock_document::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        document_number: Set(number),
                        kind: Set(request.kind),
                        status: Set(DocumentStatus::Draft),
                        warehouse_id: Set(request.warehouse_id),
                        dest_warehouse_id: Set(request.dest_warehouse_id),
                        counterpart_id: Set(request.counterpart_id),
                        notes: Set(request.notes.clone()),
                        posted_at: Set(None),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };

                    draft.insert(txn).await.map_err(ServiceError::DatabaseError)
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        info!(
            document_number = %document.document_number,
            kind = %document.kind,
            "draft document created"
        );

        Ok(document)
    }

    /// Adds a line to a draft. Quantity must be a non-zero delta for
    /// adjustments and strictly positive for every other kind; unit cost
    /// must be non-negative.
    #[instrument(skip(self, input))]
    pub async fn add_line(
        &self,
        document_id: Uuid,
        input: LineInput,
    ) -> Result<stock_document_line::Model, ServiceError> {
        input.validate()?;
        let serials = tracking::normalize_serials(&input.serial_numbers)?;

        self.db
            .transaction::<_, stock_document_line::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let document = find_draft(txn, document_id).await?;
                    validate_line_values(document.kind, input.quantity, input.unit_cost)?;

                    Item::find_by_id(input.item_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("item {} not found", input.item_id))
                        })?;

                    let now = Utc::now();
                    let line = stock_document_line::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        document_id: Set(document.id),
                        item_id: Set(input.item_id),
                        quantity: Set(input.quantity),
                        unit_cost: Set(input.unit_cost),
                        batch_number: Set(input.batch_number.clone()),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    let line = line.insert(txn).await.map_err(ServiceError::DatabaseError)?;

                    insert_serials(txn, line.id, &serials).await?;
                    touch_document(txn, document).await?;

                    Ok(line)
                })
            })
            .await
            .map_err(unwrap_transaction_error)
    }

    /// Replaces a draft line's values and serials.
    #[instrument(skip(self, input))]
    pub async fn update_line(
        &self,
        document_id: Uuid,
        line_id: Uuid,
        input: LineInput,
    ) -> Result<stock_document_line::Model, ServiceError> {
        input.validate()?;
        let serials = tracking::normalize_serials(&input.serial_numbers)?;

        self.db
            .transaction::<_, stock_document_line::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let document = find_draft(txn, document_id).await?;
                    validate_line_values(document.kind, input.quantity, input.unit_cost)?;

                    let line = StockDocumentLine::find_by_id(line_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?
                        .filter(|line| line.document_id == document_id)
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "line {} not found on document {}",
                                line_id, document.document_number
                            ))
                        })?;

                    Item::find_by_id(input.item_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("item {} not found", input.item_id))
                        })?;

                    let mut active: stock_document_line::ActiveModel = line.into();
                    active.item_id = Set(input.item_id);
                    active.quantity = Set(input.quantity);
                    active.unit_cost = Set(input.unit_cost);
                    active.batch_number = Set(input.batch_number.clone());
                    active.updated_at = Set(Utc::now());
                    let line = active.update(txn).await.map_err(ServiceError::DatabaseError)?;

                    StockDocumentSerial::delete_many()
                        .filter(stock_document_serial::Column::LineId.eq(line.id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;
                    insert_serials(txn, line.id, &serials).await?;
                    touch_document(txn, document).await?;

                    Ok(line)
                })
            })
            .await
            .map_err(unwrap_transaction_error)
    }

    /// Removes a draft line and its serials.
    #[instrument(skip(self))]
    pub async fn remove_line(
        &self,
        document_id: Uuid,
        line_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let document = find_draft(txn, document_id).await?;

                    StockDocumentSerial::delete_many()
                        .filter(stock_document_serial::Column::LineId.eq(line_id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    let deleted = StockDocumentLine::delete_many()
                        .filter(stock_document_line::Column::Id.eq(line_id))
                        .filter(stock_document_line::Column::DocumentId.eq(document_id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    if deleted.rows_affected == 0 {
                        return Err(ServiceError::NotFound(format!(
                            "line {} not found on document {}",
                            line_id, document.document_number
                        )));
                    }

                    touch_document(txn, document).await?;
                    Ok(())
                })
            })
            .await
            .map_err(unwrap_transaction_error)
    }

    /// Posts a draft: validates every line, writes the planned ledger
    /// entries and flips the status, all in one transaction. Any failure
    /// (or cancellation by dropping the future) leaves no partial entries
    /// and no status change.
    ///
    /// When the non-negative-stock guard is enabled, the on-hand check runs
    /// inside this transaction; the store's write serialization on the
    /// movement table keeps two racing issues from both passing on the same
    /// stale balance.
    #[instrument(skip(self))]
    pub async fn post(&self, document_id: Uuid) -> Result<PostResult, ServiceError> {
        let enforce_stock = self.enforce_non_negative_stock;

        let result = self
            .db
            .transaction::<_, PostResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let document = StockDocument::find_by_id(document_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("document {} not found", document_id))
                        })?;

                    if !document.is_draft() {
                        return Err(ServiceError::InvalidStatus(format!(
                            "document {} is {} and cannot be posted",
                            document.document_number,
                            document.status.as_str()
                        )));
                    }

                    let lines = StockDocumentLine::find()
                        .filter(stock_document_line::Column::DocumentId.eq(document.id))
                        .order_by_asc(stock_document_line::Column::CreatedAt)
                        .order_by_asc(stock_document_line::Column::Id)
                        .all(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    if lines.is_empty() {
                        return Err(ServiceError::ValidationError(format!(
                            "document {} has no lines and cannot be posted",
                            document.document_number
                        )));
                    }

                    let mut planned: Vec<NewMovement> = Vec::new();
                    let mut skus: HashMap<Uuid, String> = HashMap::new();

                    for line in &lines {
                        let item = Item::find_by_id(line.item_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::DatabaseError)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!("item {} not found", line.item_id))
                            })?;
                        skus.insert(item.id, item.sku.clone());

                        let serials = StockDocumentSerial::find()
                            .filter(stock_document_serial::Column::LineId.eq(line.id))
                            .all(txn)
                            .await
                            .map_err(ServiceError::DatabaseError)?
                            .into_iter()
                            .map(|row| row.serial_number)
                            .collect::<Vec<_>>();

                        tracking::validate_line(&item, line, &serials)?;

                        if item.tracking_type == TrackingType::Serial && !serials.is_empty() {
                            let signed = posting::signed_quantity(document.kind, line.quantity);
                            let inbound = document.kind != DocumentKind::Transfer
                                && signed > Decimal::ZERO;
                            tracking::ensure_serials_available(
                                txn,
                                &item,
                                document.warehouse_id,
                                &serials,
                                inbound,
                            )
                            .await?;
                        }

                        let drafts =
                            posting::plan_line(&document, line, item.tracking_type, &serials)?;
                        for draft in drafts {
                            planned.push(NewMovement {
                                movement_type: draft.movement_type,
                                warehouse_id: draft.warehouse_id,
                                item_id: line.item_id,
                                quantity: draft.quantity,
                                unit_cost: draft.unit_cost,
                                document_kind: document.kind,
                                document_id: document.id,
                                line_id: Some(line.id),
                                serial_number: draft.serial_number,
                                batch_number: draft.batch_number,
                            });
                        }
                    }

                    if enforce_stock && document.kind.is_outbound() {
                        let mut net: HashMap<(Uuid, Uuid), Decimal> = HashMap::new();
                        for movement in &planned {
                            *net.entry((movement.warehouse_id, movement.item_id))
                                .or_insert(Decimal::ZERO) += movement.quantity;
                        }
                        for ((warehouse_id, item_id), delta) in net {
                            if delta >= Decimal::ZERO {
                                continue;
                            }
                            let on_hand =
                                valuation::on_hand_with(txn, warehouse_id, item_id, None).await?;
                            if on_hand + delta < Decimal::ZERO {
                                let sku = skus
                                    .get(&item_id)
                                    .cloned()
                                    .unwrap_or_else(|| item_id.to_string());
                                return Err(ServiceError::InsufficientStock(format!(
                                    "posting {} would drive item {} to {} at warehouse {}",
                                    document.document_number,
                                    sku,
                                    on_hand + delta,
                                    warehouse_id
                                )));
                            }
                        }
                    }

                    let occurred_at = Utc::now();
                    let movements = MovementLedger::append(txn, occurred_at, planned).await?;

                    let mut active: stock_document::ActiveModel = document.into();
                    active.status = Set(DocumentStatus::Posted);
                    active.posted_at = Set(Some(occurred_at));
                    active.updated_at = Set(occurred_at);
                    let document =
                        active.update(txn).await.map_err(ServiceError::DatabaseError)?;

                    Ok(PostResult {
                        document,
                        movements,
                    })
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        counter!(
            "stockledger_documents_posted_total",
            1,
            "kind" => result.document.kind.to_string()
        );
        info!(
            document_number = %result.document.document_number,
            kind = %result.document.kind,
            movement_count = result.movements.len(),
            "document posted"
        );

        self.event_sender
            .send(Event::DocumentPosted {
                kind: result.document.kind,
                document_id: result.document.id,
                document_number: result.document.document_number.clone(),
                movement_count: result.movements.len(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(result)
    }

    /// Voids a draft. Voiding a voided document is a no-op; a posted
    /// document cannot be voided, corrections are a new compensating
    /// document.
    #[instrument(skip(self))]
    pub async fn void(&self, document_id: Uuid) -> Result<stock_document::Model, ServiceError> {
        let (document, transitioned) = self
            .db
            .transaction::<_, (stock_document::Model, bool), ServiceError>(move |txn| {
                Box::pin(async move {
                    let document = StockDocument::find_by_id(document_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("document {} not found", document_id))
                        })?;

                    match document.status {
                        DocumentStatus::Voided => Ok((document, false)),
                        DocumentStatus::Posted => Err(ServiceError::InvalidStatus(format!(
                            "document {} is posted and cannot be voided; post a compensating document instead",
                            document.document_number
                        ))),
                        DocumentStatus::Draft => {
                            let mut active: stock_document::ActiveModel = document.into();
                            active.status = Set(DocumentStatus::Voided);
                            active.updated_at = Set(Utc::now());
                            let document = active
                                .update(txn)
                                .await
                                .map_err(ServiceError::DatabaseError)?;
                            Ok((document, true))
                        }
                    }
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        if transitioned {
            info!(document_number = %document.document_number, "document voided");
            self.event_sender
                .send(Event::DocumentVoided {
                    kind: document.kind,
                    document_id: document.id,
                    document_number: document.document_number.clone(),
                })
                .await
                .map_err(ServiceError::EventError)?;
        }

        Ok(document)
    }

    /// Full document view for read-side consumers (renderers, the API
    /// layer).
    #[instrument(skip(self))]
    pub async fn get(&self, document_id: Uuid) -> Result<DocumentDetail, ServiceError> {
        let db = self.db.as_ref();

        let document = StockDocument::find_by_id(document_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("document {} not found", document_id))
            })?;

        let lines = StockDocumentLine::find()
            .filter(stock_document_line::Column::DocumentId.eq(document.id))
            .order_by_asc(stock_document_line::Column::CreatedAt)
            .order_by_asc(stock_document_line::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let line_ids: Vec<Uuid> = lines.iter().map(|line| line.id).collect();
        let serials = StockDocumentSerial::find()
            .filter(stock_document_serial::Column::LineId.is_in(line_ids))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut serials_by_line: HashMap<Uuid, Vec<String>> = HashMap::new();
        for serial in serials {
            serials_by_line
                .entry(serial.line_id)
                .or_default()
                .push(serial.serial_number);
        }

        let lines = lines
            .into_iter()
            .map(|line| {
                let serial_numbers = serials_by_line.remove(&line.id).unwrap_or_default();
                DocumentLineDetail {
                    line,
                    serial_numbers,
                }
            })
            .collect();

        Ok(DocumentDetail { document, lines })
    }

    /// Lists documents, newest first, optionally filtered by kind and
    /// status. The page size is clamped to the configured maximum.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        kind: Option<DocumentKind>,
        status: Option<DocumentStatus>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_document::Model>, u64), ServiceError> {
        let limit = if limit == 0 {
            self.page_default_size
        } else {
            limit.min(self.page_max_size)
        };

        let mut query = StockDocument::find();
        if let Some(kind) = kind {
            query = query.filter(stock_document::Column::Kind.eq(kind));
        }
        if let Some(status) = status {
            query = query.filter(stock_document::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(stock_document::Column::CreatedAt)
            .paginate(self.db.as_ref(), limit);

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let documents = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((documents, total))
    }
}

/// Loads a document and requires it to still be a draft.
async fn find_draft<C: sea_orm::ConnectionTrait>(
    conn: &C,
    document_id: Uuid,
) -> Result<stock_document::Model, ServiceError> {
    let document = StockDocument::find_by_id(document_id)
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?
        .ok_or_else(|| ServiceError::NotFound(format!("document {} not found", document_id)))?;

    if !document.is_draft() {
        return Err(ServiceError::InvalidStatus(format!(
            "document {} is {}; lines can only change while it is a draft",
            document.document_number,
            document.status.as_str()
        )));
    }

    Ok(document)
}

fn validate_line_values(
    kind: DocumentKind,
    quantity: Decimal,
    unit_cost: Decimal,
) -> Result<(), ServiceError> {
    if kind.allows_signed_quantities() {
        if quantity.is_zero() {
            return Err(ServiceError::ValidationError(
                "adjustment lines require a non-zero quantity delta".to_string(),
            ));
        }
    } else if quantity <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "line quantity must be positive".to_string(),
        ));
    }

    if unit_cost < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "unit cost cannot be negative".to_string(),
        ));
    }

    Ok(())
}

async fn insert_serials<C: sea_orm::ConnectionTrait>(
    conn: &C,
    line_id: Uuid,
    serials: &[String],
) -> Result<(), ServiceError> {
    for serial in serials {
        let row = stock_document_serial::ActiveModel {
            id: Set(Uuid::new_v4()),
            line_id: Set(line_id),
            serial_number: Set(serial.clone()),
        };
        row.insert(conn).await.map_err(ServiceError::DatabaseError)?;
    }
    Ok(())
}

/// Bumps the parent document's `updated_at` after a line change.
async fn touch_document<C: sea_orm::ConnectionTrait>(
    conn: &C,
    document: stock_document::Model,
) -> Result<(), ServiceError> {
    let mut active: stock_document::ActiveModel = document.into();
    active.updated_at = Set(Utc::now());
    active
        .update(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;
    Ok(())
}

fn unwrap_transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}
