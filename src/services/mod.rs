// Document numbering
pub mod sequences;

// The append-only movement ledger
pub mod ledger;

// Per-kind movement planning (pure)
pub mod posting;

// Serial/batch identity rules
pub mod tracking;

// Shared document lifecycle across all stock document kinds
pub mod documents;

// On-hand and costing reads
pub mod valuation;

// Reorder thresholds and requisition suggestions
pub mod reorder;
