//! Document lifecycle orchestration.
//!
//! The controller sits above the offer and invoice version stores and owns
//! everything a status transition drags along: work-order and material-order
//! materialization on offer acceptance, finance-ledger entries on invoice
//! issuance, project completion, document numbering, and the preview context
//! handed to the rendering layer.
//!
//! Side effects are explicit per-transition hook lists, each hook isolated:
//! one failing fan-out step never prevents the others and never rolls back
//! the primary transition; failures are logged and surfaced in the
//! operation outcome instead.

pub mod collaborators;
pub mod controller;
pub mod formula;
pub mod hooks;
pub mod preview;

pub use collaborators::{
    Collaborators, CustomerSnapshot, FinanceLedger, MaterialOrder, MaterialOrderItem,
    MaterialOrders, OrderStatus, ProjectStatus, Projects, ReconciliationConcern,
    ReconciliationEntry, ReconciliationLog, WorkOrder, WorkOrderItem, WorkOrders,
};
pub use controller::{
    AcceptOfferOutcome, IssueInvoiceOutcome, LifecycleConfig, LifecycleController,
    DOC_TYPE_INVOICE, DOC_TYPE_OFFER,
};
pub use formula::Formula;
pub use hooks::{
    material_order_items_for, work_order_items_for, CancelMaterialOrder, CancelWorkOrder,
    CompleteProjectWhenExecuted, EnsureMaterialOrder, EnsureWorkOrder, InvoiceIssuedHook,
    MaterialQuantityRules, OfferAcceptedHook, OfferCancelledHook, RecordFinanceEntry,
    SideEffectFailure, SideEffectReport, TransitionHooks,
};
pub use preview::{CompanyProfile, DocumentPreviewContext, PreviewLine};
