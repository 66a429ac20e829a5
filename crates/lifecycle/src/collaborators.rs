//! Boundary contracts the lifecycle controller fans out to.
//!
//! Work orders, material orders, the finance ledger, and project state are
//! separate subsystems; only their shapes matter here. The in-memory
//! reference implementations live in `billcraft-infra`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billcraft_core::{
    CustomerId, DomainResult, ItemKey, MaterialOrderId, OfferVersionId, ProjectId, WorkOrderId,
};
use billcraft_invoicing::{ExecutedQuantity, InvoiceVersion};

/// Status shared by work and material orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Completed,
    Cancelled,
}

/// Customer snapshot stamped onto documents at transition time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub id: CustomerId,
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub vat_id: Option<String>,
}

/// One unit of planned/executed work on a work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderItem {
    pub key: ItemKey,
    pub name: String,
    pub unit: String,
    pub offered_quantity: Decimal,
    pub planned_quantity: Decimal,
    pub executed_quantity: Decimal,
    pub is_extra: bool,
}

/// Work order materialized from an accepted offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: WorkOrderId,
    pub project_id: ProjectId,
    pub offer_id: OfferVersionId,
    pub status: OrderStatus,
    pub customer: Option<CustomerSnapshot>,
    pub items: Vec<WorkOrderItem>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// One material line of a material order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialOrderItem {
    pub key: ItemKey,
    pub name: String,
    pub unit: String,
    pub quantity: Decimal,
}

/// Material order materialized from an accepted offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialOrder {
    pub id: MaterialOrderId,
    pub project_id: ProjectId,
    pub offer_id: OfferVersionId,
    pub status: OrderStatus,
    pub customer: Option<CustomerSnapshot>,
    pub items: Vec<MaterialOrderItem>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Project status the controller may advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Completed,
}

/// Work-order subsystem.
pub trait WorkOrders: Send + Sync {
    /// Ensure exactly one work order exists for `(project, offer)`: create
    /// it if absent, else refresh items and customer in place. Never
    /// duplicates.
    fn find_or_create(
        &self,
        project_id: ProjectId,
        offer_id: OfferVersionId,
        items: Vec<WorkOrderItem>,
        customer: Option<CustomerSnapshot>,
    ) -> DomainResult<WorkOrder>;

    /// Mark the offer's work order cancelled (audit trail stays).
    fn cancel(
        &self,
        project_id: ProjectId,
        offer_id: OfferVersionId,
        at: DateTime<Utc>,
    ) -> DomainResult<()>;

    /// Executed quantities across all non-cancelled work orders of the
    /// project, for invoice snapshots.
    fn executed_quantities(&self, project_id: ProjectId) -> Vec<ExecutedQuantity>;

    /// True when every non-cancelled work order of the project is completed.
    fn all_completed(&self, project_id: ProjectId) -> bool;
}

/// Material-order subsystem.
pub trait MaterialOrders: Send + Sync {
    fn find_or_create(
        &self,
        project_id: ProjectId,
        offer_id: OfferVersionId,
        items: Vec<MaterialOrderItem>,
        customer: Option<CustomerSnapshot>,
    ) -> DomainResult<MaterialOrder>;

    fn cancel(
        &self,
        project_id: ProjectId,
        offer_id: OfferVersionId,
        at: DateTime<Utc>,
    ) -> DomainResult<()>;
}

/// Finance-ledger subsystem.
pub trait FinanceLedger: Send + Sync {
    /// Record the issuance of an invoice. Keyed by invoice id: returns
    /// `Ok(false)` when an entry already exists, making retries safe.
    fn record_invoice_issued(&self, invoice: &InvoiceVersion) -> DomainResult<bool>;
}

/// Project subsystem (status + customer snapshot for document headers).
pub trait Projects: Send + Sync {
    fn advance_status(&self, project_id: ProjectId, status: ProjectStatus) -> DomainResult<()>;

    fn customer(&self, project_id: ProjectId) -> Option<CustomerSnapshot>;
}

/// What a reconciliation entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationConcern {
    /// Finance entry failed while the invoice still issued.
    FinanceEntry,
    /// Numbering service failed; a locally-derived number was used.
    Numbering,
}

/// One operator-facing entry: a side effect that needs manual follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationEntry {
    pub project_id: ProjectId,
    pub document: String,
    pub concern: ReconciliationConcern,
    pub detail: String,
    pub at: DateTime<Utc>,
}

/// Durable log of swallowed side-effect failures.
///
/// An issued invoice must exist even when bookkeeping sync fails; this log
/// is where those deliberate swallows become visible for retry instead of
/// disappearing.
pub trait ReconciliationLog: Send + Sync {
    fn record(&self, entry: ReconciliationEntry);

    fn pending(&self) -> Vec<ReconciliationEntry>;
}

/// Bundle of collaborator handles handed to the controller.
#[derive(Clone)]
pub struct Collaborators {
    pub work_orders: Arc<dyn WorkOrders>,
    pub material_orders: Arc<dyn MaterialOrders>,
    pub finance: Arc<dyn FinanceLedger>,
    pub projects: Arc<dyn Projects>,
    pub reconciliation: Arc<dyn ReconciliationLog>,
}
