use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The seven stock-affecting document kinds. They share one lifecycle and
/// one table; what differs per kind is the document-number prefix, the
/// header shape and the movements emitted on posting.
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
pub enum DocumentKind {
    #[sea_orm(string_value = "Adjustment")]
    Adjustment,
    #[sea_orm(string_value = "Transfer")]
    Transfer,
    #[sea_orm(string_value = "GoodsReceipt")]
    GoodsReceipt,
    #[sea_orm(string_value = "SupplierReturn")]
    SupplierReturn,
    #[sea_orm(string_value = "Dispatch")]
    Dispatch,
    #[sea_orm(string_value = "DirectPurchase")]
    DirectPurchase,
    #[sea_orm(string_value = "Requisition")]
    Requisition,
}

impl DocumentKind {
    /// Document-number prefix for the sequence generator.
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Adjustment => "ADJ",
            DocumentKind::Transfer => "TRF",
            DocumentKind::GoodsReceipt => "GRN",
            DocumentKind::SupplierReturn => "SRN",
            DocumentKind::Dispatch => "DSP",
            DocumentKind::DirectPurchase => "PO",
            DocumentKind::Requisition => "REQ",
        }
    }

    /// Adjustments carry signed quantity deltas; every other kind requires
    /// strictly positive line quantities.
    pub fn allows_signed_quantities(&self) -> bool {
        matches!(self, DocumentKind::Adjustment)
    }

    /// Transfers are the only kind with a destination warehouse.
    pub fn requires_destination(&self) -> bool {
        matches!(self, DocumentKind::Transfer)
    }

    /// Kinds whose posting removes stock from the source warehouse.
    /// Adjustments are excluded even when negative: they are corrections and
    /// exempt from the optional non-negative-stock guard.
    pub fn is_outbound(&self) -> bool {
        matches!(
            self,
            DocumentKind::Transfer
                | DocumentKind::SupplierReturn
                | DocumentKind::Dispatch
                | DocumentKind::Requisition
        )
    }
}

/// Lifecycle status shared by all document kinds. Transitions are
/// monotonic: Draft -> Posted or Draft -> Voided; both end states are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum DocumentStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Posted")]
    Posted,
    #[sea_orm(string_value = "Voided")]
    Voided,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Posted => "posted",
            DocumentStatus::Voided => "voided",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Human-readable number, assigned at creation from the sequence
    /// generator (e.g. `GRN000042`).
    pub document_number: String,
    pub kind: DocumentKind,
    pub status: DocumentStatus,
    /// Source warehouse for outbound kinds, receiving warehouse otherwise.
    pub warehouse_id: Uuid,
    /// Destination warehouse; transfers only.
    pub dest_warehouse_id: Option<Uuid>,
    /// Supplier or requesting-department reference, kind-dependent.
    pub counterpart_id: Option<Uuid>,
    pub notes: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_draft(&self) -> bool {
        self.status == DocumentStatus::Draft
    }
}
