//! Per-transition side-effect hooks.
//!
//! Each transition carries an explicit hook list. Hooks run in order,
//! isolated from one another: a failure is logged and collected into the
//! [`SideEffectReport`], and the remaining hooks still run. The primary
//! status transition has already been persisted by the time hooks fire and
//! is never rolled back by a hook failure.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use billcraft_core::{DomainError, DomainResult, ItemKey, ProductRef};
use billcraft_invoicing::InvoiceVersion;
use billcraft_offers::OfferVersion;

use crate::collaborators::{
    FinanceLedger, MaterialOrderItem, MaterialOrders, ProjectStatus, Projects,
    ReconciliationConcern, ReconciliationEntry, ReconciliationLog, WorkOrderItem, WorkOrders,
};
use crate::formula::Formula;

/// One hook failure, by hook name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectFailure {
    pub hook: &'static str,
    pub error: DomainError,
}

/// What the fan-out of one transition reported back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideEffectReport {
    pub failures: Vec<SideEffectFailure>,
}

impl SideEffectReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Hook run after an offer version becomes accepted.
pub trait OfferAcceptedHook: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, offer: &OfferVersion) -> DomainResult<()>;
}

/// Hook run after an offer acceptance is cancelled.
pub trait OfferCancelledHook: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, offer: &OfferVersion, at: DateTime<Utc>) -> DomainResult<()>;
}

/// Hook run after an invoice version becomes issued.
pub trait InvoiceIssuedHook: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, invoice: &InvoiceVersion) -> DomainResult<()>;
}

/// The explicit per-transition hook lists.
#[derive(Default, Clone)]
pub struct TransitionHooks {
    pub on_offer_accepted: Vec<Arc<dyn OfferAcceptedHook>>,
    pub on_offer_cancelled: Vec<Arc<dyn OfferCancelledHook>>,
    pub on_invoice_issued: Vec<Arc<dyn InvoiceIssuedHook>>,
}

impl TransitionHooks {
    pub fn run_offer_accepted(&self, offer: &OfferVersion) -> SideEffectReport {
        let mut report = SideEffectReport::default();
        for hook in &self.on_offer_accepted {
            if let Err(error) = hook.run(offer) {
                warn!(hook = hook.name(), offer = %offer.id, %error, "offer-accepted hook failed");
                report.failures.push(SideEffectFailure {
                    hook: hook.name(),
                    error,
                });
            }
        }
        report
    }

    pub fn run_offer_cancelled(&self, offer: &OfferVersion, at: DateTime<Utc>) -> SideEffectReport {
        let mut report = SideEffectReport::default();
        for hook in &self.on_offer_cancelled {
            if let Err(error) = hook.run(offer, at) {
                warn!(hook = hook.name(), offer = %offer.id, %error, "offer-cancelled hook failed");
                report.failures.push(SideEffectFailure {
                    hook: hook.name(),
                    error,
                });
            }
        }
        report
    }

    pub fn run_invoice_issued(&self, invoice: &InvoiceVersion) -> SideEffectReport {
        let mut report = SideEffectReport::default();
        for hook in &self.on_invoice_issued {
            if let Err(error) = hook.run(invoice) {
                warn!(hook = hook.name(), invoice = %invoice.id, %error, "invoice-issued hook failed");
                report.failures.push(SideEffectFailure {
                    hook: hook.name(),
                    error,
                });
            }
        }
        report
    }
}

/// Per-product material quantity rules (formula over `quantity`).
pub type MaterialQuantityRules = HashMap<ProductRef, Formula>;

/// Offer lines → work-order items.
///
/// Executed starts equal to offered: operators adjust downward/upward on the
/// work order itself as the job progresses.
pub fn work_order_items_for(offer: &OfferVersion) -> Vec<WorkOrderItem> {
    offer
        .items
        .iter()
        .map(|line| WorkOrderItem {
            key: ItemKey::offer_line(line.id),
            name: line.name.clone(),
            unit: line.unit.clone(),
            offered_quantity: line.quantity,
            planned_quantity: line.quantity,
            executed_quantity: line.quantity,
            is_extra: false,
        })
        .collect()
}

/// Offer lines → material-order items.
///
/// A line whose product carries a quantity rule gets its quantity from the
/// formula evaluated over `{ quantity }`; other lines carry the offer
/// quantity unchanged.
pub fn material_order_items_for(
    offer: &OfferVersion,
    rules: &MaterialQuantityRules,
) -> DomainResult<Vec<MaterialOrderItem>> {
    offer
        .items
        .iter()
        .map(|line| {
            let quantity = match line.product_ref.and_then(|p| rules.get(&p)) {
                Some(rule) => {
                    let vars =
                        HashMap::from([("quantity".to_string(), line.quantity)]);
                    rule.eval(&vars)?
                }
                None => line.quantity,
            };
            Ok(MaterialOrderItem {
                key: match line.product_ref {
                    Some(product_ref) => ItemKey::product(product_ref),
                    None => ItemKey::offer_line(line.id),
                },
                name: line.name.clone(),
                unit: line.unit.clone(),
                quantity,
            })
        })
        .collect()
}

/// Standard hook: ensure the accepted offer has its one work order.
pub struct EnsureWorkOrder {
    pub work_orders: Arc<dyn WorkOrders>,
    pub projects: Arc<dyn Projects>,
}

impl OfferAcceptedHook for EnsureWorkOrder {
    fn name(&self) -> &'static str {
        "ensure-work-order"
    }

    fn run(&self, offer: &OfferVersion) -> DomainResult<()> {
        let customer = self.projects.customer(offer.project_id);
        self.work_orders.find_or_create(
            offer.project_id,
            offer.id,
            work_order_items_for(offer),
            customer,
        )?;
        Ok(())
    }
}

/// Standard hook: ensure the accepted offer has its one material order.
pub struct EnsureMaterialOrder {
    pub material_orders: Arc<dyn MaterialOrders>,
    pub projects: Arc<dyn Projects>,
    pub rules: MaterialQuantityRules,
}

impl OfferAcceptedHook for EnsureMaterialOrder {
    fn name(&self) -> &'static str {
        "ensure-material-order"
    }

    fn run(&self, offer: &OfferVersion) -> DomainResult<()> {
        let items = material_order_items_for(offer, &self.rules)?;
        let customer = self.projects.customer(offer.project_id);
        self.material_orders
            .find_or_create(offer.project_id, offer.id, items, customer)?;
        Ok(())
    }
}

/// Standard hook: mark the offer's work order cancelled.
pub struct CancelWorkOrder {
    pub work_orders: Arc<dyn WorkOrders>,
}

impl OfferCancelledHook for CancelWorkOrder {
    fn name(&self) -> &'static str {
        "cancel-work-order"
    }

    fn run(&self, offer: &OfferVersion, at: DateTime<Utc>) -> DomainResult<()> {
        self.work_orders.cancel(offer.project_id, offer.id, at)
    }
}

/// Standard hook: mark the offer's material order cancelled.
pub struct CancelMaterialOrder {
    pub material_orders: Arc<dyn MaterialOrders>,
}

impl OfferCancelledHook for CancelMaterialOrder {
    fn name(&self) -> &'static str {
        "cancel-material-order"
    }

    fn run(&self, offer: &OfferVersion, at: DateTime<Utc>) -> DomainResult<()> {
        self.material_orders.cancel(offer.project_id, offer.id, at)
    }
}

/// Standard hook: best-effort finance entry for an issued invoice.
///
/// An entry failure lands in the reconciliation log and is reported, but the
/// invoice stays issued.
pub struct RecordFinanceEntry {
    pub finance: Arc<dyn FinanceLedger>,
    pub reconciliation: Arc<dyn ReconciliationLog>,
}

impl InvoiceIssuedHook for RecordFinanceEntry {
    fn name(&self) -> &'static str {
        "record-finance-entry"
    }

    fn run(&self, invoice: &InvoiceVersion) -> DomainResult<()> {
        match self.finance.record_invoice_issued(invoice) {
            Ok(_created) => Ok(()),
            Err(error) => {
                self.reconciliation.record(ReconciliationEntry {
                    project_id: invoice.project_id,
                    document: invoice.id.to_string(),
                    concern: ReconciliationConcern::FinanceEntry,
                    detail: error.to_string(),
                    at: invoice.issued_at.unwrap_or(invoice.updated_at),
                });
                Err(error)
            }
        }
    }
}

/// Standard hook: advance the project to completed once every work order is.
pub struct CompleteProjectWhenExecuted {
    pub work_orders: Arc<dyn WorkOrders>,
    pub projects: Arc<dyn Projects>,
}

impl InvoiceIssuedHook for CompleteProjectWhenExecuted {
    fn name(&self) -> &'static str {
        "complete-project"
    }

    fn run(&self, invoice: &InvoiceVersion) -> DomainResult<()> {
        if self.work_orders.all_completed(invoice.project_id) {
            self.projects
                .advance_status(invoice.project_id, ProjectStatus::Completed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billcraft_core::{LineItemId, ProjectId, VatRate};
    use billcraft_offers::OfferStatus;
    use billcraft_totals::{DiscountConfig, LineItem, MonetarySummary};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn offer_with_lines(lines: Vec<LineItem>) -> OfferVersion {
        let now = Utc::now();
        OfferVersion {
            id: billcraft_core::OfferVersionId::new(),
            project_id: ProjectId::new(),
            base_title: "Facade".to_string(),
            version_number: 1,
            items: lines,
            discount: DiscountConfig::default(),
            summary: MonetarySummary::zero(),
            status: OfferStatus::Accepted,
            document_number: None,
            valid_until: None,
            created_at: now,
            updated_at: now,
            accepted_at: Some(now),
            cancelled_at: None,
        }
    }

    fn line(product_ref: Option<ProductRef>, quantity: Decimal) -> LineItem {
        LineItem {
            id: LineItemId::new(),
            product_ref,
            name: "render".to_string(),
            quantity,
            unit: "m2".to_string(),
            unit_price: dec!(12.50),
            vat_rate: VatRate::Standard,
            discount_percent: Decimal::ZERO,
        }
    }

    struct CountingHook {
        runs: AtomicUsize,
        fail: bool,
    }

    impl OfferAcceptedHook for CountingHook {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn run(&self, _offer: &OfferVersion) -> DomainResult<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DomainError::side_effect("boom"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn work_order_items_start_with_offered_equals_executed() {
        let offer = offer_with_lines(vec![line(None, dec!(40))]);
        let items = work_order_items_for(&offer);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].offered_quantity, dec!(40));
        assert_eq!(items[0].planned_quantity, dec!(40));
        assert_eq!(items[0].executed_quantity, dec!(40));
        assert!(!items[0].is_extra);
        assert_eq!(items[0].key, ItemKey::offer_line(offer.items[0].id));
    }

    #[test]
    fn material_quantities_follow_rules() {
        let product = ProductRef::new();
        let offer = offer_with_lines(vec![line(Some(product), dec!(20)), line(None, dec!(5))]);
        let rules =
            MaterialQuantityRules::from([(product, Formula::parse("quantity * 1.1").unwrap())]);

        let items = material_order_items_for(&offer, &rules).unwrap();
        assert_eq!(items[0].quantity, dec!(22.0));
        assert_eq!(items[1].quantity, dec!(5));
    }

    #[test]
    fn a_failing_hook_does_not_stop_the_rest() {
        let first = Arc::new(CountingHook {
            runs: AtomicUsize::new(0),
            fail: true,
        });
        let second = Arc::new(CountingHook {
            runs: AtomicUsize::new(0),
            fail: false,
        });
        let hooks = TransitionHooks {
            on_offer_accepted: vec![first.clone(), second.clone()],
            ..TransitionHooks::default()
        };

        let offer = offer_with_lines(vec![line(None, dec!(1))]);
        let report = hooks.run_offer_accepted(&offer);

        assert_eq!(first.runs.load(Ordering::SeqCst), 1);
        assert_eq!(second.runs.load(Ordering::SeqCst), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].hook, "counting");
    }
}
