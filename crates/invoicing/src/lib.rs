//! Invoice version store.
//!
//! Invoices are derived from executed work (work-order quantities), not from
//! the offer directly: executed quantities are grouped, classified against
//! the accepted offer, and priced from its lines. Versions are numbered per
//! project; at most one draft and at most one issued version exist at a
//! time. Finance/ledger side effects of issuance live in the lifecycle
//! controller.

pub mod service;
pub mod snapshot;
pub mod store;
pub mod version;

pub use service::{InvoiceOutcome, InvoiceVersions};
pub use snapshot::{build_snapshot_items, classify, ExecutedQuantity};
pub use store::{InvoiceDraft, InvoiceRepository, IssueOutcome};
pub use version::{line_total, InvoiceLineItem, InvoiceLineKind, InvoiceStatus, InvoiceVersion};
