//! Assembly of a fully in-memory document core.

use std::sync::Arc;

use billcraft_lifecycle::{Collaborators, LifecycleConfig, LifecycleController, DOC_TYPE_INVOICE, DOC_TYPE_OFFER};
use billcraft_numbering::{InMemoryCounterStore, NumberingConfig, NumberingService, ResetPolicy};

use crate::stores::{
    InMemoryFinanceLedger, InMemoryInvoiceStore, InMemoryMaterialOrders, InMemoryOfferStore,
    InMemoryProjects, InMemoryReconciliationLog, InMemoryWorkOrders,
};

/// Everything wired together, with handles onto the individual stores kept
/// for inspection (tests, dev tooling).
pub struct InMemoryStack {
    pub controller: LifecycleController<
        Arc<InMemoryOfferStore>,
        Arc<InMemoryInvoiceStore>,
        Arc<InMemoryCounterStore>,
    >,
    pub offer_store: Arc<InMemoryOfferStore>,
    pub invoice_store: Arc<InMemoryInvoiceStore>,
    pub work_orders: Arc<InMemoryWorkOrders>,
    pub material_orders: Arc<InMemoryMaterialOrders>,
    pub finance: Arc<InMemoryFinanceLedger>,
    pub projects: Arc<InMemoryProjects>,
    pub reconciliation: Arc<InMemoryReconciliationLog>,
}

/// Build the controller over in-memory stores with the stock numbering
/// patterns: `PON-{YYYY}-{SEQ:000}` for offers, `RN-{YYYY}-{SEQ:000}` for
/// invoices, both resetting yearly.
pub fn in_memory_stack(config: LifecycleConfig) -> InMemoryStack {
    let offer_store = Arc::new(InMemoryOfferStore::new());
    let invoice_store = Arc::new(InMemoryInvoiceStore::new());
    let counters = Arc::new(InMemoryCounterStore::new());
    let work_orders = Arc::new(InMemoryWorkOrders::new());
    let material_orders = Arc::new(InMemoryMaterialOrders::new());
    let finance = Arc::new(InMemoryFinanceLedger::new());
    let projects = Arc::new(InMemoryProjects::new());
    let reconciliation = Arc::new(InMemoryReconciliationLog::new());

    let numbering = NumberingService::new(counters)
        .with_config(
            DOC_TYPE_OFFER,
            NumberingConfig {
                pattern: "PON-{YYYY}-{SEQ:000}".to_string(),
                reset: ResetPolicy::Yearly,
                first_sequence: 1,
            },
        )
        .with_config(
            DOC_TYPE_INVOICE,
            NumberingConfig {
                pattern: "RN-{YYYY}-{SEQ:000}".to_string(),
                reset: ResetPolicy::Yearly,
                first_sequence: 1,
            },
        );

    let collaborators = Collaborators {
        work_orders: work_orders.clone(),
        material_orders: material_orders.clone(),
        finance: finance.clone(),
        projects: projects.clone(),
        reconciliation: reconciliation.clone(),
    };

    let controller = LifecycleController::new(
        offer_store.clone(),
        invoice_store.clone(),
        numbering,
        collaborators,
        config,
    );

    InMemoryStack {
        controller,
        offer_store,
        invoice_store,
        work_orders,
        material_orders,
        finance,
        projects,
        reconciliation,
    }
}
