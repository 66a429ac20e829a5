//! Totals Calculator.
//!
//! Pure derivation of a monetary summary from line items and a discount/VAT
//! configuration. No IO, no storage, no status checks. Version stores call
//! in here every time items change and persist the result inside the version.

pub mod calculator;

pub use calculator::{
    compute_totals, validate_line_items, DiscountConfig, LineItem, MonetarySummary,
    TotalsOutcome, TotalsWarning,
};
