use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billcraft_core::{round_money, InvoiceVersionId, ItemKey, ProjectId};
use billcraft_totals::{DiscountConfig, LineItem, MonetarySummary};

/// Invoice version status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Cancelled,
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// How an invoice line relates to the accepted offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceLineKind {
    /// Offered and executed at least in full.
    Base,
    /// Work performed outside the offer (or explicitly flagged extra).
    Extra,
    /// Offered but under-executed.
    Shortfall,
}

/// One invoice line: the priced item plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    /// Key the executed work was grouped under (offer line / product /
    /// name+unit).
    pub key: ItemKey,
    pub kind: InvoiceLineKind,
    pub line: LineItem,
    /// Rounded per-line total after the line's own discount.
    pub line_total: Decimal,
}

/// Per-line total: `quantity × unit_price`, less the line's clamped
/// discount, rounded to 2 decimals.
pub fn line_total(line: &LineItem) -> Decimal {
    let discount = line
        .discount_percent
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    round_money(
        line.quantity * line.unit_price * (Decimal::ONE_HUNDRED - discount)
            / Decimal::ONE_HUNDRED,
    )
}

/// One invoice version, immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceVersion {
    pub id: InvoiceVersionId,
    pub project_id: ProjectId,
    /// 1-based per project.
    pub version_number: u32,
    pub status: InvoiceStatus,
    pub items: Vec<InvoiceLineItem>,
    pub discount: DiscountConfig,
    pub summary: MonetarySummary,
    /// Authoritative number, assigned by the numbering service at issuance.
    pub document_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl InvoiceVersion {
    pub fn is_draft(&self) -> bool {
        self.status == InvoiceStatus::Draft
    }

    /// The plain priced lines, for summary computation.
    pub fn plain_lines(&self) -> Vec<LineItem> {
        self.items.iter().map(|item| item.line.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billcraft_core::{LineItemId, VatRate};
    use rust_decimal_macros::dec;

    fn line(quantity: Decimal, unit_price: Decimal, discount: Decimal) -> LineItem {
        LineItem {
            id: LineItemId::new(),
            product_ref: None,
            name: "plaster".to_string(),
            quantity,
            unit: "m2".to_string(),
            unit_price,
            vat_rate: VatRate::Standard,
            discount_percent: discount,
        }
    }

    #[test]
    fn line_total_applies_discount_and_rounds() {
        assert_eq!(line_total(&line(dec!(3), dec!(19.99), dec!(0))), dec!(59.97));
        assert_eq!(line_total(&line(dec!(3), dec!(19.99), dec!(10))), dec!(53.97));
    }

    #[test]
    fn line_total_clamps_out_of_range_discount() {
        assert_eq!(line_total(&line(dec!(2), dec!(50), dec!(400))), dec!(0.00));
        assert_eq!(line_total(&line(dec!(2), dec!(50), dec!(-5))), dec!(100.00));
    }
}
