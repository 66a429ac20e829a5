use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use billcraft_core::{DomainError, DomainResult, OfferVersionId, ProjectId};
use billcraft_totals::{
    compute_totals, validate_line_items, DiscountConfig, LineItem, TotalsWarning,
};

use crate::store::{OfferAcceptance, OfferDraft, OfferRepository};
use crate::version::{base_title_of, OfferStatus, OfferVersion};

/// A persisted version together with the calculator's warning metadata.
#[derive(Debug, Clone)]
pub struct OfferOutcome {
    pub version: OfferVersion,
    pub warnings: Vec<TotalsWarning>,
}

/// Offer version operations: validation, totals, then one atomic store call.
#[derive(Debug)]
pub struct OfferVersions<R> {
    repo: R,
}

impl<R> OfferVersions<R>
where
    R: OfferRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Create a new draft version.
    ///
    /// The candidate title may carry a `_<number>` suffix from a version the
    /// client started from; the stored base title never does.
    pub fn create_version(
        &self,
        project_id: ProjectId,
        title_candidate: &str,
        items: Vec<LineItem>,
        discount: DiscountConfig,
        valid_until: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> DomainResult<OfferOutcome> {
        validate_line_items(&items)?;
        let outcome = compute_totals(&items, &discount);
        let base_title = base_title_of(title_candidate.trim()).to_string();
        if base_title.is_empty() {
            return Err(DomainError::validation("offer title must not be empty"));
        }

        let version = self.repo.create_draft(
            OfferDraft {
                project_id,
                base_title,
                items,
                discount,
                summary: outcome.summary,
                valid_until,
            },
            now,
        )?;
        debug!(offer = %version.id, title = %version.title(), "offer draft created");

        Ok(OfferOutcome {
            version,
            warnings: outcome.warnings,
        })
    }

    /// Replace a draft's items and configuration in place.
    ///
    /// Draft editing is destructive (no new version); anything past draft is
    /// immutable.
    pub fn update_version(
        &self,
        id: OfferVersionId,
        items: Vec<LineItem>,
        discount: DiscountConfig,
        now: DateTime<Utc>,
    ) -> DomainResult<OfferOutcome> {
        validate_line_items(&items)?;
        let outcome = compute_totals(&items, &discount);

        let version = self
            .repo
            .update_if_status(id, &[OfferStatus::Draft], &mut |version| {
                version.items = items.clone();
                version.discount = discount.clone();
                version.summary = outcome.summary.clone();
                version.updated_at = now;
            })
            .map_err(|err| match err {
                DomainError::Conflict(msg) => DomainError::immutable(msg),
                other => other,
            })?;

        Ok(OfferOutcome {
            version,
            warnings: outcome.warnings,
        })
    }

    /// Accept a draft version, retiring any previously accepted version of
    /// the same project. The store-level atomic transition is the guard
    /// against two concurrent accepts both succeeding.
    pub fn accept(&self, id: OfferVersionId, now: DateTime<Utc>) -> DomainResult<OfferAcceptance> {
        let acceptance = self.repo.accept(id, now)?;
        debug!(
            offer = %acceptance.accepted.id,
            retired = acceptance.retired.len(),
            "offer accepted"
        );
        Ok(acceptance)
    }

    /// Revert an acceptance to `Cancelled`. Without an explicit id this
    /// targets the project's currently accepted version.
    pub fn cancel_acceptance(
        &self,
        project_id: ProjectId,
        id: Option<OfferVersionId>,
        now: DateTime<Utc>,
    ) -> DomainResult<OfferVersion> {
        self.repo.cancel_acceptance(project_id, id, now)
    }

    /// Stamp the authoritative document number on an accepted version.
    pub fn set_document_number(
        &self,
        id: OfferVersionId,
        number: String,
    ) -> DomainResult<OfferVersion> {
        self.repo
            .update_if_status(id, &[OfferStatus::Accepted], &mut |version| {
                version.document_number = Some(number.clone());
            })
    }

    pub fn get(&self, id: OfferVersionId) -> DomainResult<OfferVersion> {
        self.repo.get(id)
    }

    pub fn find_accepted(&self, project_id: ProjectId) -> Option<OfferVersion> {
        self.repo.find_accepted(project_id)
    }

    pub fn list_for_project(&self, project_id: ProjectId) -> Vec<OfferVersion> {
        self.repo.list_for_project(project_id)
    }
}
