//! Sequential document numbering.
//!
//! Numbers are rendered from a token pattern (`PON-{YYYY}-{SEQ:000}`)
//! against a durable per-key counter. The counter increment is atomic
//! read-modify-write with upsert (the one genuinely contended resource in
//! the document core), so concurrent issuance of the same document type
//! never yields a duplicate.

pub mod counter;
pub mod pattern;
pub mod service;

pub use counter::{CounterStore, InMemoryCounterStore};
pub use pattern::{parse_pattern, render, Token, DEFAULT_PATTERN, MAX_PATTERN_LEN};
pub use service::{NumberAssignment, NumberingConfig, NumberingService, ResetPolicy};
