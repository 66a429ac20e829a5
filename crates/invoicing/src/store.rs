use chrono::{DateTime, Utc};

use billcraft_core::{DomainResult, InvoiceVersionId, ProjectId};
use billcraft_totals::{DiscountConfig, MonetarySummary};

use crate::version::{InvoiceLineItem, InvoiceStatus, InvoiceVersion};

/// Input for persisting a new draft. The repository assigns id, version
/// number, and timestamps.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub project_id: ProjectId,
    pub items: Vec<InvoiceLineItem>,
    pub discount: DiscountConfig,
    pub summary: MonetarySummary,
}

/// Result of an issue call.
#[derive(Debug, Clone)]
pub struct IssueOutcome {
    pub invoice: InvoiceVersion,
    /// False when the call was an idempotent no-op on an already-issued
    /// version; callers skip downstream side effects in that case.
    pub newly_issued: bool,
    /// Previously issued versions of the project cancelled by this call.
    pub retired: Vec<InvoiceVersion>,
}

/// Durable invoice store.
///
/// As with offers, every mutating method is one atomic find-and-update in
/// the backing store; the single-draft and single-issued invariants are
/// enforced inside those critical sections.
pub trait InvoiceRepository: Send + Sync {
    /// Persist a new `Draft` with `version_number = max + 1` per project.
    /// Idempotent: when the project already has a draft, that draft is
    /// returned unchanged and nothing is written.
    fn create_draft(&self, draft: InvoiceDraft, now: DateTime<Utc>) -> DomainResult<InvoiceVersion>;

    fn get(&self, id: InvoiceVersionId) -> DomainResult<InvoiceVersion>;

    fn find_draft(&self, project_id: ProjectId) -> Option<InvoiceVersion>;

    fn find_issued(&self, project_id: ProjectId) -> Option<InvoiceVersion>;

    fn list_for_project(&self, project_id: ProjectId) -> Vec<InvoiceVersion>;

    /// Atomic conditional update; status mismatch yields
    /// `DomainError::Conflict` naming both statuses (callers translate).
    fn update_if_status(
        &self,
        id: InvoiceVersionId,
        expected: &[InvoiceStatus],
        mutate: &mut dyn FnMut(&mut InvoiceVersion),
    ) -> DomainResult<InvoiceVersion>;

    /// Atomic issue: `Draft → Issued`, cancelling any other `Issued` version
    /// of the project in the same critical section and stamping `issued_at`.
    /// Idempotent on an already-issued version (`newly_issued = false`).
    fn issue(
        &self,
        project_id: ProjectId,
        id: InvoiceVersionId,
        now: DateTime<Utc>,
    ) -> DomainResult<IssueOutcome>;

    /// Atomic clone-for-edit. When the project already has a draft, it is
    /// returned (never two concurrent drafts). Otherwise the target must be
    /// `Issued`; it is cancelled and a fresh `Draft` clone with deep-copied
    /// items and summary is inserted with `version_number = max + 1`.
    fn clone_for_edit(
        &self,
        project_id: ProjectId,
        id: InvoiceVersionId,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceVersion>;
}

impl<R> InvoiceRepository for std::sync::Arc<R>
where
    R: InvoiceRepository + ?Sized,
{
    fn create_draft(&self, draft: InvoiceDraft, now: DateTime<Utc>) -> DomainResult<InvoiceVersion> {
        (**self).create_draft(draft, now)
    }

    fn get(&self, id: InvoiceVersionId) -> DomainResult<InvoiceVersion> {
        (**self).get(id)
    }

    fn find_draft(&self, project_id: ProjectId) -> Option<InvoiceVersion> {
        (**self).find_draft(project_id)
    }

    fn find_issued(&self, project_id: ProjectId) -> Option<InvoiceVersion> {
        (**self).find_issued(project_id)
    }

    fn list_for_project(&self, project_id: ProjectId) -> Vec<InvoiceVersion> {
        (**self).list_for_project(project_id)
    }

    fn update_if_status(
        &self,
        id: InvoiceVersionId,
        expected: &[InvoiceStatus],
        mutate: &mut dyn FnMut(&mut InvoiceVersion),
    ) -> DomainResult<InvoiceVersion> {
        (**self).update_if_status(id, expected, mutate)
    }

    fn issue(
        &self,
        project_id: ProjectId,
        id: InvoiceVersionId,
        now: DateTime<Utc>,
    ) -> DomainResult<IssueOutcome> {
        (**self).issue(project_id, id, now)
    }

    fn clone_for_edit(
        &self,
        project_id: ProjectId,
        id: InvoiceVersionId,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceVersion> {
        (**self).clone_for_edit(project_id, id, now)
    }
}
