use chrono::{DateTime, NaiveDate, Utc};

use billcraft_core::{DomainResult, OfferVersionId, ProjectId};
use billcraft_totals::{DiscountConfig, LineItem, MonetarySummary};

use crate::version::{OfferStatus, OfferVersion};

/// Input for persisting a new draft version. The repository assigns id,
/// version number, and timestamps.
#[derive(Debug, Clone)]
pub struct OfferDraft {
    pub project_id: ProjectId,
    pub base_title: String,
    pub items: Vec<LineItem>,
    pub discount: DiscountConfig,
    pub summary: MonetarySummary,
    pub valid_until: Option<NaiveDate>,
}

/// Result of an atomic accept: the version that became accepted plus any
/// previously accepted versions of the same project that were retired.
#[derive(Debug, Clone)]
pub struct OfferAcceptance {
    pub accepted: OfferVersion,
    pub retired: Vec<OfferVersion>,
}

/// Durable offer store.
///
/// Every method that mutates state is one atomic find-and-update: the
/// backing store's conditional-update primitive is the enforcement point for
/// the version-number and single-accepted invariants; no in-process locking
/// is expected from callers.
pub trait OfferRepository: Send + Sync {
    /// Persist a new `Draft`, assigning `version_number = max + 1` (1 when
    /// none exist) for `(project_id, base_title)` in the same critical
    /// section as the insert, so concurrent creators never share a number.
    fn create_draft(&self, draft: OfferDraft, now: DateTime<Utc>) -> DomainResult<OfferVersion>;

    fn get(&self, id: OfferVersionId) -> DomainResult<OfferVersion>;

    fn list_for_project(&self, project_id: ProjectId) -> Vec<OfferVersion>;

    fn find_accepted(&self, project_id: ProjectId) -> Option<OfferVersion>;

    /// Atomic conditional update: apply `mutate` only while the current
    /// status is in `expected`. A status mismatch yields
    /// `DomainError::Conflict` naming both statuses; callers translate that
    /// into their taxonomy (`ImmutableVersion` for draft edits).
    fn update_if_status(
        &self,
        id: OfferVersionId,
        expected: &[OfferStatus],
        mutate: &mut dyn FnMut(&mut OfferVersion),
    ) -> DomainResult<OfferVersion>;

    /// Atomic accept: `Draft → Accepted`, retiring (cancelling) any other
    /// `Accepted` version of the same project in the same critical section.
    /// A second concurrent accept must observe `AlreadyAccepted`, never a
    /// silent overwrite; accepting a cancelled version is a `Conflict`.
    fn accept(&self, id: OfferVersionId, now: DateTime<Utc>) -> DomainResult<OfferAcceptance>;

    /// Atomic acceptance revert: `Accepted → Cancelled`. With no explicit
    /// id, targets the project's currently accepted version and fails with
    /// `NoAcceptedVersion` when there is none.
    fn cancel_acceptance(
        &self,
        project_id: ProjectId,
        id: Option<OfferVersionId>,
        now: DateTime<Utc>,
    ) -> DomainResult<OfferVersion>;
}

impl<R> OfferRepository for std::sync::Arc<R>
where
    R: OfferRepository + ?Sized,
{
    fn create_draft(&self, draft: OfferDraft, now: DateTime<Utc>) -> DomainResult<OfferVersion> {
        (**self).create_draft(draft, now)
    }

    fn get(&self, id: OfferVersionId) -> DomainResult<OfferVersion> {
        (**self).get(id)
    }

    fn list_for_project(&self, project_id: ProjectId) -> Vec<OfferVersion> {
        (**self).list_for_project(project_id)
    }

    fn find_accepted(&self, project_id: ProjectId) -> Option<OfferVersion> {
        (**self).find_accepted(project_id)
    }

    fn update_if_status(
        &self,
        id: OfferVersionId,
        expected: &[OfferStatus],
        mutate: &mut dyn FnMut(&mut OfferVersion),
    ) -> DomainResult<OfferVersion> {
        (**self).update_if_status(id, expected, mutate)
    }

    fn accept(&self, id: OfferVersionId, now: DateTime<Utc>) -> DomainResult<OfferAcceptance> {
        (**self).accept(id, now)
    }

    fn cancel_acceptance(
        &self,
        project_id: ProjectId,
        id: Option<OfferVersionId>,
        now: DateTime<Utc>,
    ) -> DomainResult<OfferVersion> {
        (**self).cancel_acceptance(project_id, id, now)
    }
}
