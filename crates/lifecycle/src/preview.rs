//! Flattened context for the (out-of-scope) PDF/HTML render layer.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billcraft_invoicing::{line_total, InvoiceVersion};
use billcraft_offers::OfferVersion;
use billcraft_totals::{LineItem, MonetarySummary};

use crate::collaborators::CustomerSnapshot;

/// Issuer identity printed on every document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub address: String,
    pub vat_id: String,
    pub iban: Option<String>,
}

/// One render-ready line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewLine {
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub vat_percent: Decimal,
    pub line_total: Decimal,
}

/// Everything the renderer needs, flattened; no further store access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPreviewContext {
    pub document_number: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub valid_until: Option<NaiveDate>,
    pub issued_at: Option<DateTime<Utc>>,
    pub company: CompanyProfile,
    pub customer: Option<CustomerSnapshot>,
    pub items: Vec<PreviewLine>,
    pub summary: MonetarySummary,
    pub notes: Vec<String>,
}

fn preview_line(line: &LineItem) -> PreviewLine {
    PreviewLine {
        name: line.name.clone(),
        quantity: line.quantity,
        unit: line.unit.clone(),
        unit_price: line.unit_price,
        discount_percent: line.discount_percent,
        vat_percent: line.vat_rate.percent(),
        line_total: line_total(line),
    }
}

/// Assemble the preview for an offer version.
///
/// A version that has no assigned number yet (still draft) previews under
/// its title instead.
pub fn offer_preview(
    offer: &OfferVersion,
    company: CompanyProfile,
    customer: Option<CustomerSnapshot>,
    notes: Vec<String>,
) -> DocumentPreviewContext {
    DocumentPreviewContext {
        document_number: offer
            .document_number
            .clone()
            .unwrap_or_else(|| offer.title()),
        title: offer.title(),
        created_at: offer.created_at,
        valid_until: offer.valid_until,
        issued_at: offer.accepted_at,
        company,
        customer,
        items: offer.items.iter().map(preview_line).collect(),
        summary: offer.summary.clone(),
        notes,
    }
}

/// Assemble the preview for an invoice version.
pub fn invoice_preview(
    invoice: &InvoiceVersion,
    company: CompanyProfile,
    customer: Option<CustomerSnapshot>,
    notes: Vec<String>,
) -> DocumentPreviewContext {
    DocumentPreviewContext {
        document_number: invoice
            .document_number
            .clone()
            .unwrap_or_else(|| format!("draft_{}", invoice.version_number)),
        title: format!("Invoice {}", invoice.version_number),
        created_at: invoice.created_at,
        valid_until: None,
        issued_at: invoice.issued_at,
        company,
        customer,
        items: invoice.items.iter().map(|i| preview_line(&i.line)).collect(),
        summary: invoice.summary.clone(),
        notes,
    }
}
