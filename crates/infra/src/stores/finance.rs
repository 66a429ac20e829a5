use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use billcraft_core::{DomainError, DomainResult, InvoiceVersionId, ProjectId};
use billcraft_invoicing::InvoiceVersion;
use billcraft_lifecycle::FinanceLedger;

/// One receivable entry keyed by the invoice that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinanceEntry {
    pub invoice_id: InvoiceVersionId,
    pub project_id: ProjectId,
    pub total_with_vat: Decimal,
    pub recorded_at: DateTime<Utc>,
}

/// In-memory finance-ledger collaborator.
///
/// Keyed by invoice id so a retried issuance never double-books. The
/// `set_failing` switch lets tests exercise the swallow-and-reconcile path.
#[derive(Debug, Default)]
pub struct InMemoryFinanceLedger {
    entries: RwLock<HashMap<InvoiceVersionId, FinanceEntry>>,
    failing: AtomicBool,
}

impl InMemoryFinanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn entries(&self) -> Vec<FinanceEntry> {
        match self.entries.read() {
            Ok(entries) => entries.values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl FinanceLedger for InMemoryFinanceLedger {
    fn record_invoice_issued(&self, invoice: &InvoiceVersion) -> DomainResult<bool> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::side_effect("finance ledger unavailable"));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| DomainError::conflict("finance ledger lock poisoned"))?;

        if entries.contains_key(&invoice.id) {
            return Ok(false);
        }

        entries.insert(
            invoice.id,
            FinanceEntry {
                invoice_id: invoice.id,
                project_id: invoice.project_id,
                total_with_vat: invoice.summary.total_with_vat,
                recorded_at: invoice.issued_at.unwrap_or_else(Utc::now),
            },
        );
        Ok(true)
    }
}
