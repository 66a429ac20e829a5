//! In-memory stores. Intended for tests/dev; every mutating operation runs
//! under one write guard, matching the atomic conditional-update contract of
//! the backing document store.

pub mod finance;
pub mod invoices;
pub mod material_orders;
pub mod offers;
pub mod projects;
pub mod reconciliation;
pub mod work_orders;

pub use finance::{FinanceEntry, InMemoryFinanceLedger};
pub use invoices::InMemoryInvoiceStore;
pub use material_orders::InMemoryMaterialOrders;
pub use offers::InMemoryOfferStore;
pub use projects::InMemoryProjects;
pub use reconciliation::InMemoryReconciliationLog;
pub use work_orders::InMemoryWorkOrders;
