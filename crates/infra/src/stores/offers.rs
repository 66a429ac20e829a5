use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use billcraft_core::{DomainError, DomainResult, OfferVersionId, ProjectId};
use billcraft_offers::{OfferAcceptance, OfferDraft, OfferRepository, OfferStatus, OfferVersion};

/// In-memory offer version store.
///
/// Version numbering, status transitions, and the single-accepted invariant
/// are all enforced inside one write guard per call, the same guarantees a
/// document store's conditional update gives the production deployment.
#[derive(Debug, Default)]
pub struct InMemoryOfferStore {
    versions: RwLock<HashMap<OfferVersionId, OfferVersion>>,
}

impl InMemoryOfferStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn expected_list(expected: &[OfferStatus]) -> String {
    expected
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl OfferRepository for InMemoryOfferStore {
    fn create_draft(&self, draft: OfferDraft, now: DateTime<Utc>) -> DomainResult<OfferVersion> {
        let mut versions = self
            .versions
            .write()
            .map_err(|_| DomainError::conflict("offer store lock poisoned"))?;

        let next_number = versions
            .values()
            .filter(|v| v.project_id == draft.project_id && v.base_title == draft.base_title)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1;

        let version = OfferVersion {
            id: OfferVersionId::new(),
            project_id: draft.project_id,
            base_title: draft.base_title,
            version_number: next_number,
            items: draft.items,
            discount: draft.discount,
            summary: draft.summary,
            status: OfferStatus::Draft,
            document_number: None,
            valid_until: draft.valid_until,
            created_at: now,
            updated_at: now,
            accepted_at: None,
            cancelled_at: None,
        };
        versions.insert(version.id, version.clone());
        Ok(version)
    }

    fn get(&self, id: OfferVersionId) -> DomainResult<OfferVersion> {
        let versions = self
            .versions
            .read()
            .map_err(|_| DomainError::conflict("offer store lock poisoned"))?;
        versions.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    fn list_for_project(&self, project_id: ProjectId) -> Vec<OfferVersion> {
        let versions = match self.versions.read() {
            Ok(v) => v,
            Err(_) => return Vec::new(),
        };

        let mut result: Vec<OfferVersion> = versions
            .values()
            .filter(|v| v.project_id == project_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            a.base_title
                .cmp(&b.base_title)
                .then(a.version_number.cmp(&b.version_number))
        });
        result
    }

    fn find_accepted(&self, project_id: ProjectId) -> Option<OfferVersion> {
        let versions = self.versions.read().ok()?;
        versions
            .values()
            .find(|v| v.project_id == project_id && v.status == OfferStatus::Accepted)
            .cloned()
    }

    fn update_if_status(
        &self,
        id: OfferVersionId,
        expected: &[OfferStatus],
        mutate: &mut dyn FnMut(&mut OfferVersion),
    ) -> DomainResult<OfferVersion> {
        let mut versions = self
            .versions
            .write()
            .map_err(|_| DomainError::conflict("offer store lock poisoned"))?;

        let version = versions.get_mut(&id).ok_or(DomainError::NotFound)?;
        if !expected.contains(&version.status) {
            return Err(DomainError::conflict(format!(
                "offer version is {}, expected {}",
                version.status,
                expected_list(expected)
            )));
        }

        mutate(version);
        Ok(version.clone())
    }

    fn accept(&self, id: OfferVersionId, now: DateTime<Utc>) -> DomainResult<OfferAcceptance> {
        let mut versions = self
            .versions
            .write()
            .map_err(|_| DomainError::conflict("offer store lock poisoned"))?;

        let target = versions.get(&id).ok_or(DomainError::NotFound)?;
        match target.status {
            OfferStatus::Draft => {}
            OfferStatus::Accepted => {
                return Err(DomainError::already_accepted(format!(
                    "offer version {} is already accepted",
                    target.title()
                )));
            }
            OfferStatus::Cancelled => {
                return Err(DomainError::conflict(
                    "cannot accept a cancelled offer version",
                ));
            }
        }
        let project_id = target.project_id;

        let mut retired = Vec::new();
        for version in versions.values_mut() {
            if version.project_id == project_id
                && version.id != id
                && version.status == OfferStatus::Accepted
            {
                version.status = OfferStatus::Cancelled;
                version.cancelled_at = Some(now);
                version.updated_at = now;
                retired.push(version.clone());
            }
        }

        let target = versions
            .get_mut(&id)
            .ok_or(DomainError::NotFound)?;
        target.status = OfferStatus::Accepted;
        target.accepted_at = Some(now);
        target.updated_at = now;

        Ok(OfferAcceptance {
            accepted: target.clone(),
            retired,
        })
    }

    fn cancel_acceptance(
        &self,
        project_id: ProjectId,
        id: Option<OfferVersionId>,
        now: DateTime<Utc>,
    ) -> DomainResult<OfferVersion> {
        let mut versions = self
            .versions
            .write()
            .map_err(|_| DomainError::conflict("offer store lock poisoned"))?;

        let target_id = match id {
            Some(id) => {
                let version = versions.get(&id).ok_or(DomainError::NotFound)?;
                if version.project_id != project_id {
                    return Err(DomainError::NotFound);
                }
                if version.status != OfferStatus::Accepted {
                    return Err(DomainError::conflict(format!(
                        "offer version is {}, expected accepted",
                        version.status
                    )));
                }
                id
            }
            None => versions
                .values()
                .find(|v| v.project_id == project_id && v.status == OfferStatus::Accepted)
                .map(|v| v.id)
                .ok_or(DomainError::NoAcceptedVersion)?,
        };

        let version = versions
            .get_mut(&target_id)
            .ok_or(DomainError::NotFound)?;
        version.status = OfferStatus::Cancelled;
        version.cancelled_at = Some(now);
        version.updated_at = now;
        Ok(version.clone())
    }
}
