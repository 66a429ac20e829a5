use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use billcraft_core::{OfferVersionId, ProjectId};
use billcraft_totals::{DiscountConfig, LineItem, MonetarySummary};

/// Offer version status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Draft,
    Accepted,
    Cancelled,
}

impl core::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OfferStatus::Draft => "draft",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One immutable-once-accepted offer version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferVersion {
    pub id: OfferVersionId,
    pub project_id: ProjectId,
    pub base_title: String,
    /// 1-based, strictly increasing per `(project_id, base_title)`, never reused.
    pub version_number: u32,
    pub items: Vec<LineItem>,
    pub discount: DiscountConfig,
    pub summary: MonetarySummary,
    pub status: OfferStatus,
    /// Authoritative number, assigned by the numbering service at acceptance.
    pub document_number: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl OfferVersion {
    /// Display title: `base_title` + `_` + `version_number`.
    pub fn title(&self) -> String {
        format!("{}_{}", self.base_title, self.version_number)
    }

    pub fn is_draft(&self) -> bool {
        self.status == OfferStatus::Draft
    }
}

/// Recover the base title from a candidate that may already carry a
/// `_<number>` version suffix.
///
/// `"Roof repair_3"` → `"Roof repair"`; a candidate without a numeric suffix
/// (or consisting only of one) is returned unchanged.
pub fn base_title_of(candidate: &str) -> &str {
    match candidate.rsplit_once('_') {
        Some((base, suffix))
            if !base.is_empty() && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => candidate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_version_suffix() {
        assert_eq!(base_title_of("Roof repair_3"), "Roof repair");
        assert_eq!(base_title_of("Facade_12"), "Facade");
    }

    #[test]
    fn keeps_titles_without_numeric_suffix() {
        assert_eq!(base_title_of("Roof repair"), "Roof repair");
        assert_eq!(base_title_of("Phase_one"), "Phase_one");
        assert_eq!(base_title_of("Trailing_"), "Trailing_");
    }

    #[test]
    fn strips_only_the_last_suffix() {
        assert_eq!(base_title_of("Hall_2_3"), "Hall_2");
    }

    #[test]
    fn bare_suffix_is_left_alone() {
        assert_eq!(base_title_of("_7"), "_7");
        assert_eq!(base_title_of("42"), "42");
    }
}
