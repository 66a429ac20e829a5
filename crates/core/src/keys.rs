//! Composite keys correlating offered and executed work.

use serde::{Deserialize, Serialize};

use crate::id::{LineItemId, ProductRef};

/// Identity of a unit of work across documents.
///
/// Executed quantities reported by work orders are grouped under this key and
/// matched back to accepted-offer lines: by offer-line reference when the work
/// came from the offer, else by catalog product, else by name + unit for
/// free-form extras.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKey {
    OfferLine { line_id: LineItemId },
    Product { product_ref: ProductRef },
    NameUnit { name: String, unit: String },
}

impl ItemKey {
    pub fn offer_line(line_id: LineItemId) -> Self {
        Self::OfferLine { line_id }
    }

    pub fn product(product_ref: ProductRef) -> Self {
        Self::Product { product_ref }
    }

    pub fn name_unit(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::NameUnit {
            name: name.into(),
            unit: unit.into(),
        }
    }
}

impl core::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ItemKey::OfferLine { line_id } => write!(f, "offer-line:{line_id}"),
            ItemKey::Product { product_ref } => write!(f, "product:{product_ref}"),
            ItemKey::NameUnit { name, unit } => write!(f, "{name} [{unit}]"),
        }
    }
}
