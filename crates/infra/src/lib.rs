//! Infrastructure layer: in-memory reference implementations of the store
//! and collaborator traits, plus wiring for a fully assembled document core.
//!
//! Production deployments back the same traits with the document store's
//! native atomic find-and-modify operations; everything in here enforces the
//! identical contracts under a single in-process lock, which is what the
//! workspace-level integration tests exercise.

pub mod stores;
pub mod wiring;


pub use stores::{
    InMemoryFinanceLedger, InMemoryInvoiceStore, InMemoryMaterialOrders, InMemoryOfferStore,
    InMemoryProjects, InMemoryReconciliationLog, InMemoryWorkOrders,
};
pub use wiring::{in_memory_stack, InMemoryStack};
