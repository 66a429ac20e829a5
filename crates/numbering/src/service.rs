use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use billcraft_core::DomainResult;

use crate::counter::CounterStore;
use crate::pattern::{parse_pattern, render, Token, DEFAULT_PATTERN};

/// When the sequence restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    Never,
    Yearly,
}

/// Numbering configuration for one document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingConfig {
    pub pattern: String,
    pub reset: ResetPolicy,
    /// First sequence value handed out for a fresh counter key.
    pub first_sequence: u64,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            reset: ResetPolicy::Never,
            first_sequence: 1,
        }
    }
}

/// An assigned document number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberAssignment {
    pub number: String,
    pub sequence: u64,
}

/// Assigns sequential, format-patterned document numbers scoped by document
/// type (and year, under a yearly reset policy).
#[derive(Debug)]
pub struct NumberingService<S> {
    store: S,
    configs: HashMap<String, NumberingConfig>,
}

impl<S> NumberingService<S>
where
    S: CounterStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            configs: HashMap::new(),
        }
    }

    /// Register a configuration for a document type. Unregistered types use
    /// the default pattern with no yearly reset.
    pub fn with_config(mut self, doc_type: impl Into<String>, config: NumberingConfig) -> Self {
        self.configs.insert(doc_type.into(), config);
        self
    }

    fn tokens_for(&self, doc_type: &str, config: &NumberingConfig) -> Vec<Token> {
        match parse_pattern(&config.pattern) {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(%doc_type, %err, "rejected number pattern, using default");
                // DEFAULT_PATTERN is a compile-time constant that parses.
                parse_pattern(DEFAULT_PATTERN).unwrap_or_default()
            }
        }
    }

    /// Assign the next number for a document type.
    ///
    /// The counter increment is atomic; two concurrent callers for the same
    /// type/year observe distinct sequences.
    pub fn next(&self, doc_type: &str, reference_date: NaiveDate) -> DomainResult<NumberAssignment> {
        let default_config = NumberingConfig::default();
        let config = self.configs.get(doc_type).unwrap_or(&default_config);
        let tokens = self.tokens_for(doc_type, config);

        let key = match config.reset {
            ResetPolicy::Never => doc_type.to_string(),
            ResetPolicy::Yearly => format!("{doc_type}:{}", reference_date.year()),
        };

        let sequence = self.store.next(&key, config.first_sequence)?;
        Ok(NumberAssignment {
            number: render(&tokens, reference_date, sequence),
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::InMemoryCounterStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn offer_service() -> NumberingService<InMemoryCounterStore> {
        NumberingService::new(InMemoryCounterStore::new()).with_config(
            "OFFER",
            NumberingConfig {
                pattern: "PON-{YYYY}-{SEQ:000}".to_string(),
                reset: ResetPolicy::Yearly,
                first_sequence: 1,
            },
        )
    }

    #[test]
    fn sequential_calls_yield_sequential_numbers() {
        let service = offer_service();
        let at = date(2025, 1, 15);

        let numbers: Vec<String> = (0..3)
            .map(|_| service.next("OFFER", at).unwrap().number)
            .collect();
        assert_eq!(numbers, vec!["PON-2025-001", "PON-2025-002", "PON-2025-003"]);
    }

    #[test]
    fn yearly_reset_restarts_per_year() {
        let service = offer_service();

        assert_eq!(
            service.next("OFFER", date(2024, 12, 31)).unwrap().number,
            "PON-2024-001"
        );
        assert_eq!(
            service.next("OFFER", date(2025, 1, 1)).unwrap().number,
            "PON-2025-001"
        );
        assert_eq!(
            service.next("OFFER", date(2025, 3, 9)).unwrap().number,
            "PON-2025-002"
        );
    }

    #[test]
    fn never_reset_shares_one_counter_across_years() {
        let service = NumberingService::new(InMemoryCounterStore::new()).with_config(
            "INVOICE",
            NumberingConfig {
                pattern: "{YY}/{SEQ:0000}".to_string(),
                reset: ResetPolicy::Never,
                first_sequence: 500,
            },
        );

        assert_eq!(
            service.next("INVOICE", date(2024, 6, 1)).unwrap().number,
            "24/0500"
        );
        assert_eq!(
            service.next("INVOICE", date(2025, 6, 1)).unwrap().number,
            "25/0501"
        );
    }

    #[test]
    fn broken_pattern_falls_back_to_default() {
        let service = NumberingService::new(InMemoryCounterStore::new()).with_config(
            "OFFER",
            NumberingConfig {
                pattern: "{NOPE}-{SEQ:000}".to_string(),
                reset: ResetPolicy::Never,
                first_sequence: 1,
            },
        );

        let assignment = service.next("OFFER", date(2025, 1, 15)).unwrap();
        assert_eq!(assignment.number, "2025-0001");
        assert_eq!(assignment.sequence, 1);
    }

    #[test]
    fn unregistered_doc_type_uses_default_config() {
        let service = NumberingService::new(InMemoryCounterStore::new());
        let assignment = service.next("WORK_ORDER", date(2025, 2, 2)).unwrap();
        assert_eq!(assignment.number, "2025-0001");
    }
}
