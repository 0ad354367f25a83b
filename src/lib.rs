//! Stockledger core library
//!
//! The inventory ledger and valuation core of an ERP backend: stock
//! documents (adjustments, transfers, goods receipts, supplier returns,
//! dispatches, direct purchases, material requisitions) share one
//! draft/post/void lifecycle, posting is the only write path into the
//! append-only movement ledger, and every quantity or cost the rest of the
//! system sees is derived from that history.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::documents::DocumentService;
use crate::services::ledger::MovementLedger;
use crate::services::reorder::ReorderService;
use crate::services::sequences::SequenceService;
use crate::services::valuation::ValuationService;

/// Wired service registry handed to the in-process consumer (the API layer).
#[derive(Clone)]
pub struct InventoryCore {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub event_sender: EventSender,
    pub documents: DocumentService,
    pub ledger: MovementLedger,
    pub valuation: ValuationService,
    pub reorder: ReorderService,
}

impl InventoryCore {
    pub fn new(db: Arc<DbPool>, config: AppConfig, event_sender: EventSender) -> Self {
        let sequences = SequenceService::new(config.sequence_start);
        let documents = DocumentService::new(db.clone(), event_sender.clone(), sequences, &config);
        let ledger = MovementLedger::new(db.clone());
        let valuation = ValuationService::new(db.clone());
        let reorder = ReorderService::new(db.clone(), event_sender.clone());

        Self {
            db,
            config,
            event_sender,
            documents,
            ledger,
            valuation,
            reorder,
        }
    }
}

pub mod prelude {
    pub use crate::config::{load_config, AppConfig};
    pub use crate::db::{establish_connection_from_app_config, run_migrations, DbPool};
    pub use crate::entities::item::{ItemType, TrackingType};
    pub use crate::entities::stock_document::{DocumentKind, DocumentStatus};
    pub use crate::entities::stock_movement::MovementType;
    pub use crate::errors::ServiceError;
    pub use crate::events::{process_events, Event, EventSender};
    pub use crate::services::documents::{DocumentService, LineInput, NewDocument, PostResult};
    pub use crate::services::ledger::MovementLedger;
    pub use crate::services::reorder::{ProcurementGateway, ReorderAlert, ReorderService};
    pub use crate::services::sequences::SequenceService;
    pub use crate::services::valuation::ValuationService;
    pub use crate::InventoryCore;
}
