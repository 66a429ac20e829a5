use std::collections::HashMap;
use std::sync::RwLock;

use billcraft_core::{DomainResult, ProjectId};
use billcraft_lifecycle::{CustomerSnapshot, ProjectStatus, Projects};

#[derive(Debug, Clone)]
struct ProjectRecord {
    status: ProjectStatus,
    customer: Option<CustomerSnapshot>,
}

/// In-memory project collaborator (status + customer snapshot).
#[derive(Debug, Default)]
pub struct InMemoryProjects {
    records: RwLock<HashMap<ProjectId, ProjectRecord>>,
}

impl InMemoryProjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, project_id: ProjectId, customer: Option<CustomerSnapshot>) {
        if let Ok(mut records) = self.records.write() {
            records.insert(
                project_id,
                ProjectRecord {
                    status: ProjectStatus::Active,
                    customer,
                },
            );
        }
    }

    pub fn status(&self, project_id: ProjectId) -> Option<ProjectStatus> {
        let records = self.records.read().ok()?;
        records.get(&project_id).map(|r| r.status)
    }
}

impl Projects for InMemoryProjects {
    fn advance_status(&self, project_id: ProjectId, status: ProjectStatus) -> DomainResult<()> {
        if let Ok(mut records) = self.records.write() {
            records
                .entry(project_id)
                .and_modify(|r| r.status = status)
                .or_insert(ProjectRecord {
                    status,
                    customer: None,
                });
        }
        Ok(())
    }

    fn customer(&self, project_id: ProjectId) -> Option<CustomerSnapshot> {
        let records = self.records.read().ok()?;
        records.get(&project_id).and_then(|r| r.customer.clone())
    }
}
