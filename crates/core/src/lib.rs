//! `billcraft-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by every document
//! subsystem (no infrastructure concerns): strongly-typed identifiers, the
//! domain error taxonomy, money rounding with the fixed VAT-rate set, and
//! the composite item keys used to correlate offered and executed work.

pub mod error;
pub mod id;
pub mod keys;
pub mod money;

pub use error::{DomainError, DomainResult};
pub use id::{
    CustomerId, InvoiceVersionId, LineItemId, MaterialOrderId, OfferVersionId, ProductRef,
    ProjectId, WorkOrderId,
};
pub use keys::ItemKey;
pub use money::{round_money, VatRate};
