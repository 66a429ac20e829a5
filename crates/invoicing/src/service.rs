use chrono::{DateTime, Utc};
use tracing::debug;

use billcraft_core::{DomainError, DomainResult, InvoiceVersionId, ProjectId};
use billcraft_totals::{compute_totals, validate_line_items, DiscountConfig, LineItem, TotalsWarning};

use crate::snapshot::{build_snapshot_items, ExecutedQuantity};
use crate::store::{InvoiceDraft, InvoiceRepository, IssueOutcome};
use crate::version::{line_total, InvoiceLineItem, InvoiceStatus, InvoiceVersion};

/// A persisted version together with the calculator's warning metadata.
#[derive(Debug, Clone)]
pub struct InvoiceOutcome {
    pub version: InvoiceVersion,
    pub warnings: Vec<TotalsWarning>,
}

/// Invoice version operations: aggregation, validation, totals, then one
/// atomic store call.
#[derive(Debug)]
pub struct InvoiceVersions<R> {
    repo: R,
}

impl<R> InvoiceVersions<R>
where
    R: InvoiceRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Create a draft from the project's executed work.
    ///
    /// Idempotent: an existing draft is returned unchanged, whatever the
    /// current snapshot looks like; the operator may already be editing it.
    pub fn create_from_execution_snapshot(
        &self,
        project_id: ProjectId,
        executed: &[ExecutedQuantity],
        offer_lines: &[LineItem],
        discount: DiscountConfig,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceVersion> {
        if let Some(draft) = self.repo.find_draft(project_id) {
            debug!(invoice = %draft.id, "existing draft returned for snapshot request");
            return Ok(draft);
        }

        let items = build_snapshot_items(executed, offer_lines);
        if items.is_empty() {
            return Err(DomainError::validation(
                "no executed work to invoice for project",
            ));
        }

        let lines: Vec<LineItem> = items.iter().map(|i| i.line.clone()).collect();
        let outcome = compute_totals(&lines, &discount);

        let version = self.repo.create_draft(
            InvoiceDraft {
                project_id,
                items,
                discount,
                summary: outcome.summary,
            },
            now,
        )?;
        debug!(invoice = %version.id, version = version.version_number, "invoice draft created");
        Ok(version)
    }

    /// Replace a draft's items, recomputing per-item and aggregate totals.
    pub fn update_version(
        &self,
        project_id: ProjectId,
        id: InvoiceVersionId,
        items: Vec<InvoiceLineItem>,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceOutcome> {
        let current = self.repo.get(id)?;
        if current.project_id != project_id {
            return Err(DomainError::not_found());
        }

        let lines: Vec<LineItem> = items.iter().map(|i| i.line.clone()).collect();
        validate_line_items(&lines)?;

        let items: Vec<InvoiceLineItem> = items
            .into_iter()
            .map(|mut item| {
                item.line_total = line_total(&item.line);
                item
            })
            .collect();
        let outcome = compute_totals(&lines, &current.discount);

        let version = self
            .repo
            .update_if_status(id, &[InvoiceStatus::Draft], &mut |version| {
                version.items = items.clone();
                version.summary = outcome.summary.clone();
                version.updated_at = now;
            })
            .map_err(|err| match err {
                DomainError::Conflict(msg) => DomainError::immutable(msg),
                other => other,
            })?;

        Ok(InvoiceOutcome {
            version,
            warnings: outcome.warnings,
        })
    }

    /// Issue a draft, cancelling the previously issued version of the
    /// project. Idempotent when the target is already issued.
    pub fn issue(
        &self,
        project_id: ProjectId,
        id: InvoiceVersionId,
        now: DateTime<Utc>,
    ) -> DomainResult<IssueOutcome> {
        let outcome = self.repo.issue(project_id, id, now)?;
        if outcome.newly_issued {
            debug!(
                invoice = %outcome.invoice.id,
                retired = outcome.retired.len(),
                "invoice issued"
            );
        }
        Ok(outcome)
    }

    /// Cancel an issued version and open a fresh draft clone of it.
    /// Idempotent: an existing draft is returned instead.
    pub fn clone_for_edit(
        &self,
        project_id: ProjectId,
        id: InvoiceVersionId,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceVersion> {
        self.repo.clone_for_edit(project_id, id, now)
    }

    /// Stamp the authoritative document number on an issued version.
    pub fn set_document_number(
        &self,
        id: InvoiceVersionId,
        number: String,
    ) -> DomainResult<InvoiceVersion> {
        self.repo
            .update_if_status(id, &[InvoiceStatus::Issued], &mut |version| {
                version.document_number = Some(number.clone());
            })
    }

    pub fn get(&self, id: InvoiceVersionId) -> DomainResult<InvoiceVersion> {
        self.repo.get(id)
    }

    pub fn find_draft(&self, project_id: ProjectId) -> Option<InvoiceVersion> {
        self.repo.find_draft(project_id)
    }

    pub fn find_issued(&self, project_id: ProjectId) -> Option<InvoiceVersion> {
        self.repo.find_issued(project_id)
    }

    pub fn list_for_project(&self, project_id: ProjectId) -> Vec<InvoiceVersion> {
        self.repo.list_for_project(project_id)
    }
}
