//! Offer (quote) version store.
//!
//! Offers exist in numbered versions per `(project, base title)` pair. A
//! version is freely editable while `Draft`, becomes immutable at
//! `Accepted`, and at most one version per project is accepted at a time.
//! Side effects of acceptance (work orders, material orders, numbering) are
//! the lifecycle controller's concern, not this crate's.

pub mod service;
pub mod store;
pub mod version;

pub use service::{OfferOutcome, OfferVersions};
pub use store::{OfferAcceptance, OfferDraft, OfferRepository};
pub use version::{base_title_of, OfferStatus, OfferVersion};
