//! Durable document-number counters.

use std::collections::HashMap;
use std::sync::Mutex;

use billcraft_core::{DomainError, DomainResult};

/// Per-key monotonic counter.
///
/// `next` is an atomic increment-and-read with upsert: the first call for a
/// key yields `start`, every later call yields the previous value + 1.
/// Values are never reused and never decremented. Production backs this
/// with the document store's atomic find-and-modify; the in-memory
/// implementation below is the test/dev reference.
pub trait CounterStore: Send + Sync {
    fn next(&self, key: &str, start: u64) -> DomainResult<u64>;
}

impl<S> CounterStore for std::sync::Arc<S>
where
    S: CounterStore + ?Sized,
{
    fn next(&self, key: &str, start: u64) -> DomainResult<u64> {
        (**self).next(key, start)
    }
}

/// In-memory counter store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<String, u64>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for InMemoryCounterStore {
    fn next(&self, key: &str, start: u64) -> DomainResult<u64> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| DomainError::conflict("counter lock poisoned"))?;

        let value = counters
            .entry(key.to_string())
            .and_modify(|v| *v += 1)
            .or_insert(start);
        Ok(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_call_yields_start_then_increments() {
        let store = InMemoryCounterStore::new();
        assert_eq!(store.next("INVOICE", 1).unwrap(), 1);
        assert_eq!(store.next("INVOICE", 1).unwrap(), 2);
        assert_eq!(store.next("INVOICE", 1).unwrap(), 3);
    }

    #[test]
    fn keys_are_independent() {
        let store = InMemoryCounterStore::new();
        assert_eq!(store.next("OFFER", 100).unwrap(), 100);
        assert_eq!(store.next("INVOICE", 1).unwrap(), 1);
        assert_eq!(store.next("OFFER", 100).unwrap(), 101);
    }

    #[test]
    fn concurrent_callers_never_share_a_value() {
        let store = Arc::new(InMemoryCounterStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                (0..50)
                    .map(|_| store.next("INVOICE:2025", 1).unwrap())
                    .collect::<Vec<u64>>()
            }));
        }

        let mut seen: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        seen.sort_unstable();

        let expected: Vec<u64> = (1..=400).collect();
        assert_eq!(seen, expected);
    }
}
