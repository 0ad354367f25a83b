// Master data (owned by external subsystems, read-only here)
pub mod item;
pub mod warehouse;

// Stock documents and their lines
pub mod stock_document;
pub mod stock_document_line;
pub mod stock_document_serial;

// The append-only movement ledger
pub mod stock_movement;

// Reorder thresholds and document numbering
pub mod document_sequence;
pub mod reorder_setting;
