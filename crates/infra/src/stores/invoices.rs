use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use billcraft_core::{DomainError, DomainResult, InvoiceVersionId, ProjectId};
use billcraft_invoicing::{
    InvoiceDraft, InvoiceRepository, InvoiceStatus, InvoiceVersion, IssueOutcome,
};

/// In-memory invoice version store.
///
/// The single-draft and single-issued invariants are enforced inside one
/// write guard per call.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceStore {
    versions: RwLock<HashMap<InvoiceVersionId, InvoiceVersion>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn expected_list(expected: &[InvoiceStatus]) -> String {
    expected
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl InvoiceRepository for InMemoryInvoiceStore {
    fn create_draft(&self, draft: InvoiceDraft, now: DateTime<Utc>) -> DomainResult<InvoiceVersion> {
        let mut versions = self
            .versions
            .write()
            .map_err(|_| DomainError::conflict("invoice store lock poisoned"))?;

        if let Some(existing) = versions
            .values()
            .find(|v| v.project_id == draft.project_id && v.status == InvoiceStatus::Draft)
        {
            return Ok(existing.clone());
        }

        let next_number = versions
            .values()
            .filter(|v| v.project_id == draft.project_id)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1;

        let version = InvoiceVersion {
            id: InvoiceVersionId::new(),
            project_id: draft.project_id,
            version_number: next_number,
            status: InvoiceStatus::Draft,
            items: draft.items,
            discount: draft.discount,
            summary: draft.summary,
            document_number: None,
            created_at: now,
            updated_at: now,
            issued_at: None,
            cancelled_at: None,
        };
        versions.insert(version.id, version.clone());
        Ok(version)
    }

    fn get(&self, id: InvoiceVersionId) -> DomainResult<InvoiceVersion> {
        let versions = self
            .versions
            .read()
            .map_err(|_| DomainError::conflict("invoice store lock poisoned"))?;
        versions.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    fn find_draft(&self, project_id: ProjectId) -> Option<InvoiceVersion> {
        let versions = self.versions.read().ok()?;
        versions
            .values()
            .find(|v| v.project_id == project_id && v.status == InvoiceStatus::Draft)
            .cloned()
    }

    fn find_issued(&self, project_id: ProjectId) -> Option<InvoiceVersion> {
        let versions = self.versions.read().ok()?;
        versions
            .values()
            .find(|v| v.project_id == project_id && v.status == InvoiceStatus::Issued)
            .cloned()
    }

    fn list_for_project(&self, project_id: ProjectId) -> Vec<InvoiceVersion> {
        let versions = match self.versions.read() {
            Ok(v) => v,
            Err(_) => return Vec::new(),
        };

        let mut result: Vec<InvoiceVersion> = versions
            .values()
            .filter(|v| v.project_id == project_id)
            .cloned()
            .collect();
        result.sort_by_key(|v| v.version_number);
        result
    }

    fn update_if_status(
        &self,
        id: InvoiceVersionId,
        expected: &[InvoiceStatus],
        mutate: &mut dyn FnMut(&mut InvoiceVersion),
    ) -> DomainResult<InvoiceVersion> {
        let mut versions = self
            .versions
            .write()
            .map_err(|_| DomainError::conflict("invoice store lock poisoned"))?;

        let version = versions.get_mut(&id).ok_or(DomainError::NotFound)?;
        if !expected.contains(&version.status) {
            return Err(DomainError::conflict(format!(
                "invoice version is {}, expected {}",
                version.status,
                expected_list(expected)
            )));
        }

        mutate(version);
        Ok(version.clone())
    }

    fn issue(
        &self,
        project_id: ProjectId,
        id: InvoiceVersionId,
        now: DateTime<Utc>,
    ) -> DomainResult<IssueOutcome> {
        let mut versions = self
            .versions
            .write()
            .map_err(|_| DomainError::conflict("invoice store lock poisoned"))?;

        let target = versions.get(&id).ok_or(DomainError::NotFound)?;
        if target.project_id != project_id {
            return Err(DomainError::NotFound);
        }
        match target.status {
            InvoiceStatus::Issued => {
                // Idempotent no-op: report current state, trigger nothing.
                return Ok(IssueOutcome {
                    invoice: target.clone(),
                    newly_issued: false,
                    retired: Vec::new(),
                });
            }
            InvoiceStatus::Cancelled => {
                return Err(DomainError::conflict(
                    "cannot issue a cancelled invoice version",
                ));
            }
            InvoiceStatus::Draft => {}
        }

        let mut retired = Vec::new();
        for version in versions.values_mut() {
            if version.project_id == project_id
                && version.id != id
                && version.status == InvoiceStatus::Issued
            {
                version.status = InvoiceStatus::Cancelled;
                version.cancelled_at = Some(now);
                version.updated_at = now;
                retired.push(version.clone());
            }
        }

        let target = versions.get_mut(&id).ok_or(DomainError::NotFound)?;
        target.status = InvoiceStatus::Issued;
        target.issued_at = Some(now);
        target.updated_at = now;

        Ok(IssueOutcome {
            invoice: target.clone(),
            newly_issued: true,
            retired,
        })
    }

    fn clone_for_edit(
        &self,
        project_id: ProjectId,
        id: InvoiceVersionId,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceVersion> {
        let mut versions = self
            .versions
            .write()
            .map_err(|_| DomainError::conflict("invoice store lock poisoned"))?;

        if let Some(existing) = versions
            .values()
            .find(|v| v.project_id == project_id && v.status == InvoiceStatus::Draft)
        {
            return Ok(existing.clone());
        }

        let target = versions.get(&id).ok_or(DomainError::NotFound)?;
        if target.project_id != project_id {
            return Err(DomainError::NotFound);
        }
        if target.status != InvoiceStatus::Issued {
            return Err(DomainError::conflict(format!(
                "invoice version is {}, only issued versions can be cloned for edit",
                target.status
            )));
        }

        let next_number = versions
            .values()
            .filter(|v| v.project_id == project_id)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1;

        let source = target.clone();
        let original = versions.get_mut(&id).ok_or(DomainError::NotFound)?;
        original.status = InvoiceStatus::Cancelled;
        original.cancelled_at = Some(now);
        original.updated_at = now;

        let clone = InvoiceVersion {
            id: InvoiceVersionId::new(),
            project_id,
            version_number: next_number,
            status: InvoiceStatus::Draft,
            items: source.items.clone(),
            discount: source.discount.clone(),
            summary: source.summary.clone(),
            document_number: None,
            created_at: now,
            updated_at: now,
            issued_at: None,
            cancelled_at: None,
        };
        versions.insert(clone.id, clone.clone());
        Ok(clone)
    }
}
