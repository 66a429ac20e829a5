use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use billcraft_core::{DomainResult, InvoiceVersionId, OfferVersionId, ProjectId};
use billcraft_invoicing::{InvoiceLineItem, InvoiceOutcome, InvoiceRepository, InvoiceVersion, InvoiceVersions};
use billcraft_numbering::{CounterStore, NumberingService};
use billcraft_offers::{OfferOutcome, OfferRepository, OfferVersion, OfferVersions};
use billcraft_totals::{DiscountConfig, LineItem};

use crate::collaborators::{
    Collaborators, ReconciliationConcern, ReconciliationEntry,
};
use crate::hooks::{
    CancelMaterialOrder, CancelWorkOrder, CompleteProjectWhenExecuted, EnsureMaterialOrder,
    EnsureWorkOrder, InvoiceIssuedHook, MaterialQuantityRules, OfferAcceptedHook,
    OfferCancelledHook, RecordFinanceEntry, SideEffectReport, TransitionHooks,
};
use crate::preview::{invoice_preview, offer_preview, CompanyProfile, DocumentPreviewContext};

pub const DOC_TYPE_OFFER: &str = "OFFER";
pub const DOC_TYPE_INVOICE: &str = "INVOICE";

/// Static configuration for the controller.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub company: CompanyProfile,
    pub material_rules: MaterialQuantityRules,
}

/// Result of accepting an offer: the transition plus its fan-out report.
#[derive(Debug, Clone)]
pub struct AcceptOfferOutcome {
    pub offer: OfferVersion,
    pub side_effects: SideEffectReport,
}

/// Result of issuing an invoice.
#[derive(Debug, Clone)]
pub struct IssueInvoiceOutcome {
    pub invoice: InvoiceVersion,
    pub newly_issued: bool,
    pub side_effects: SideEffectReport,
}

/// Orchestrates status transitions and their downstream effects.
///
/// Validation and state-conflict errors abort with no observable side
/// effect; once a transition is persisted, fan-out failures are isolated per
/// hook and reported, never rolled back.
pub struct LifecycleController<OR, IR, CS> {
    offers: OfferVersions<OR>,
    invoices: InvoiceVersions<IR>,
    numbering: NumberingService<CS>,
    collaborators: Collaborators,
    hooks: TransitionHooks,
    company: CompanyProfile,
}

impl<OR, IR, CS> LifecycleController<OR, IR, CS>
where
    OR: OfferRepository,
    IR: InvoiceRepository,
    CS: CounterStore,
{
    /// Wire the controller with the standard hook lists:
    /// `on_offer_accepted: [ensure-work-order, ensure-material-order]`,
    /// `on_offer_cancelled: [cancel-work-order, cancel-material-order]`,
    /// `on_invoice_issued: [record-finance-entry, complete-project]`.
    pub fn new(
        offer_repo: OR,
        invoice_repo: IR,
        numbering: NumberingService<CS>,
        collaborators: Collaborators,
        config: LifecycleConfig,
    ) -> Self {
        let hooks = TransitionHooks {
            on_offer_accepted: vec![
                Arc::new(EnsureWorkOrder {
                    work_orders: collaborators.work_orders.clone(),
                    projects: collaborators.projects.clone(),
                }),
                Arc::new(EnsureMaterialOrder {
                    material_orders: collaborators.material_orders.clone(),
                    projects: collaborators.projects.clone(),
                    rules: config.material_rules,
                }),
            ],
            on_offer_cancelled: vec![
                Arc::new(CancelWorkOrder {
                    work_orders: collaborators.work_orders.clone(),
                }),
                Arc::new(CancelMaterialOrder {
                    material_orders: collaborators.material_orders.clone(),
                }),
            ],
            on_invoice_issued: vec![
                Arc::new(RecordFinanceEntry {
                    finance: collaborators.finance.clone(),
                    reconciliation: collaborators.reconciliation.clone(),
                }),
                Arc::new(CompleteProjectWhenExecuted {
                    work_orders: collaborators.work_orders.clone(),
                    projects: collaborators.projects.clone(),
                }),
            ],
        };

        Self {
            offers: OfferVersions::new(offer_repo),
            invoices: InvoiceVersions::new(invoice_repo),
            numbering,
            collaborators,
            hooks,
            company: config.company,
        }
    }

    /// Append an extra hook to the offer-accepted list.
    pub fn with_offer_accepted_hook(mut self, hook: Arc<dyn OfferAcceptedHook>) -> Self {
        self.hooks.on_offer_accepted.push(hook);
        self
    }

    /// Append an extra hook to the offer-cancelled list.
    pub fn with_offer_cancelled_hook(mut self, hook: Arc<dyn OfferCancelledHook>) -> Self {
        self.hooks.on_offer_cancelled.push(hook);
        self
    }

    /// Append an extra hook to the invoice-issued list.
    pub fn with_invoice_issued_hook(mut self, hook: Arc<dyn InvoiceIssuedHook>) -> Self {
        self.hooks.on_invoice_issued.push(hook);
        self
    }

    pub fn offers(&self) -> &OfferVersions<OR> {
        &self.offers
    }

    pub fn invoices(&self) -> &InvoiceVersions<IR> {
        &self.invoices
    }

    // ----- offers -----

    pub fn create_offer(
        &self,
        project_id: ProjectId,
        title_candidate: &str,
        items: Vec<LineItem>,
        discount: DiscountConfig,
        valid_until: Option<chrono::NaiveDate>,
        now: DateTime<Utc>,
    ) -> DomainResult<OfferOutcome> {
        self.offers
            .create_version(project_id, title_candidate, items, discount, valid_until, now)
    }

    pub fn update_offer(
        &self,
        id: OfferVersionId,
        items: Vec<LineItem>,
        discount: DiscountConfig,
        now: DateTime<Utc>,
    ) -> DomainResult<OfferOutcome> {
        self.offers.update_version(id, items, discount, now)
    }

    /// Accept an offer version and fan out its side effects.
    pub fn accept_offer(
        &self,
        id: OfferVersionId,
        now: DateTime<Utc>,
    ) -> DomainResult<AcceptOfferOutcome> {
        let acceptance = self.offers.accept(id, now)?;
        let offer = self.assign_offer_number(acceptance.accepted, now)?;

        info!(offer = %offer.id, number = offer.document_number.as_deref().unwrap_or("-"), "offer accepted");
        let side_effects = self.hooks.run_offer_accepted(&offer);
        Ok(AcceptOfferOutcome {
            offer,
            side_effects,
        })
    }

    /// Revert an acceptance; without an explicit id, the project's currently
    /// accepted version is targeted. Associated orders are cancelled, never
    /// deleted.
    pub fn cancel_offer_acceptance(
        &self,
        project_id: ProjectId,
        id: Option<OfferVersionId>,
        now: DateTime<Utc>,
    ) -> DomainResult<AcceptOfferOutcome> {
        let offer = self.offers.cancel_acceptance(project_id, id, now)?;
        let side_effects = self.hooks.run_offer_cancelled(&offer, now);
        Ok(AcceptOfferOutcome {
            offer,
            side_effects,
        })
    }

    // ----- invoices -----

    /// Open (or return) the project's draft invoice from executed work.
    pub fn create_invoice_from_snapshot(
        &self,
        project_id: ProjectId,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceVersion> {
        let executed = self
            .collaborators
            .work_orders
            .executed_quantities(project_id);
        let accepted = self.offers.find_accepted(project_id);
        let (offer_lines, discount) = match &accepted {
            Some(offer) => (offer.items.clone(), offer.discount.clone()),
            None => (Vec::new(), DiscountConfig::default()),
        };

        self.invoices
            .create_from_execution_snapshot(project_id, &executed, &offer_lines, discount, now)
    }

    pub fn update_invoice(
        &self,
        project_id: ProjectId,
        id: InvoiceVersionId,
        items: Vec<InvoiceLineItem>,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceOutcome> {
        self.invoices.update_version(project_id, id, items, now)
    }

    /// Issue an invoice version and fan out its side effects.
    ///
    /// Idempotent on an already-issued version: no renumbering, no side
    /// effects.
    pub fn issue_invoice(
        &self,
        project_id: ProjectId,
        id: InvoiceVersionId,
        now: DateTime<Utc>,
    ) -> DomainResult<IssueInvoiceOutcome> {
        let outcome = self.invoices.issue(project_id, id, now)?;
        if !outcome.newly_issued {
            return Ok(IssueInvoiceOutcome {
                invoice: outcome.invoice,
                newly_issued: false,
                side_effects: SideEffectReport::default(),
            });
        }

        let invoice =
            self.assign_invoice_number(outcome.invoice, now)?;
        info!(invoice = %invoice.id, number = invoice.document_number.as_deref().unwrap_or("-"), "invoice issued");
        let side_effects = self.hooks.run_invoice_issued(&invoice);
        Ok(IssueInvoiceOutcome {
            invoice,
            newly_issued: true,
            side_effects,
        })
    }

    /// Cancel an issued invoice and open a draft clone of it for editing.
    pub fn clone_invoice_for_edit(
        &self,
        project_id: ProjectId,
        id: InvoiceVersionId,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceVersion> {
        self.invoices.clone_for_edit(project_id, id, now)
    }

    // ----- previews -----

    pub fn offer_preview(
        &self,
        id: OfferVersionId,
        notes: Vec<String>,
    ) -> DomainResult<DocumentPreviewContext> {
        let offer = self.offers.get(id)?;
        let customer = self.collaborators.projects.customer(offer.project_id);
        Ok(offer_preview(&offer, self.company.clone(), customer, notes))
    }

    pub fn invoice_preview(
        &self,
        id: InvoiceVersionId,
        notes: Vec<String>,
    ) -> DomainResult<DocumentPreviewContext> {
        let invoice = self.invoices.get(id)?;
        let customer = self.collaborators.projects.customer(invoice.project_id);
        Ok(invoice_preview(&invoice, self.company.clone(), customer, notes))
    }

    pub fn reconciliation_backlog(&self) -> Vec<ReconciliationEntry> {
        self.collaborators.reconciliation.pending()
    }

    // ----- numbering -----

    /// Derive the manual-reconciliation fallback number for a document.
    fn local_fallback_number(doc_type: &str, project_id: ProjectId, version_number: u32) -> String {
        let project = project_id.to_string();
        let prefix = &project[..8];
        format!("{doc_type}-{prefix}-V{version_number}")
    }

    fn assign_offer_number(
        &self,
        offer: OfferVersion,
        now: DateTime<Utc>,
    ) -> DomainResult<OfferVersion> {
        match self.numbering.next(DOC_TYPE_OFFER, now.date_naive()) {
            Ok(assignment) => self.offers.set_document_number(offer.id, assignment.number),
            Err(error) => {
                let fallback = Self::local_fallback_number(
                    DOC_TYPE_OFFER,
                    offer.project_id,
                    offer.version_number,
                );
                warn!(offer = %offer.id, %error, %fallback, "numbering failed, using local fallback");
                self.collaborators.reconciliation.record(ReconciliationEntry {
                    project_id: offer.project_id,
                    document: offer.id.to_string(),
                    concern: ReconciliationConcern::Numbering,
                    detail: error.to_string(),
                    at: now,
                });
                self.offers.set_document_number(offer.id, fallback)
            }
        }
    }

    fn assign_invoice_number(
        &self,
        invoice: InvoiceVersion,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceVersion> {
        match self.numbering.next(DOC_TYPE_INVOICE, now.date_naive()) {
            Ok(assignment) => self
                .invoices
                .set_document_number(invoice.id, assignment.number),
            Err(error) => {
                let fallback = Self::local_fallback_number(
                    DOC_TYPE_INVOICE,
                    invoice.project_id,
                    invoice.version_number,
                );
                warn!(invoice = %invoice.id, %error, %fallback, "numbering failed, using local fallback");
                self.collaborators.reconciliation.record(ReconciliationEntry {
                    project_id: invoice.project_id,
                    document: invoice.id.to_string(),
                    concern: ReconciliationConcern::Numbering,
                    detail: error.to_string(),
                    at: now,
                });
                self.invoices.set_document_number(invoice.id, fallback)
            }
        }
    }
}
