use std::sync::RwLock;

use billcraft_lifecycle::{ReconciliationEntry, ReconciliationLog};

/// In-memory reconciliation log: swallowed side-effect failures an operator
/// still has to act on.
#[derive(Debug, Default)]
pub struct InMemoryReconciliationLog {
    entries: RwLock<Vec<ReconciliationEntry>>,
}

impl InMemoryReconciliationLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReconciliationLog for InMemoryReconciliationLog {
    fn record(&self, entry: ReconciliationEntry) {
        if let Ok(mut entries) = self.entries.write() {
            entries.push(entry);
        }
    }

    fn pending(&self) -> Vec<ReconciliationEntry> {
        match self.entries.read() {
            Ok(entries) => entries.clone(),
            Err(_) => Vec::new(),
        }
    }
}
