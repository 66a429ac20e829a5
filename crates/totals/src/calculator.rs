use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billcraft_core::{round_money, DomainError, DomainResult, LineItemId, ProductRef, VatRate};

/// One priced line of an offer or invoice version.
///
/// Immutable once the owning version leaves draft; that is enforced by the
/// version stores, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub product_ref: Option<ProductRef>,
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub vat_rate: VatRate,
    pub discount_percent: Decimal,
}

/// Discount/VAT configuration a version carries alongside its items.
///
/// `vat_mode` is kept as the raw percent so an unsupported value coming from
/// an older stored document is representable; `compute_totals` falls back to
/// 0% for those and says so in the outcome warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountConfig {
    pub use_per_item_discount: bool,
    pub use_global_discount: bool,
    pub global_discount_percent: Decimal,
    pub vat_mode: Decimal,
}

impl Default for DiscountConfig {
    fn default() -> Self {
        Self {
            use_per_item_discount: false,
            use_global_discount: false,
            global_discount_percent: Decimal::ZERO,
            vat_mode: VatRate::Standard.percent(),
        }
    }
}

/// Derived monetary summary. Never stored independently of a version.
///
/// Every field is rounded to 2 decimals at the point the summary is
/// assembled; the pipeline before that runs at full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonetarySummary {
    pub base_without_vat: Decimal,
    pub per_item_discount_amount: Decimal,
    pub global_discount_amount: Decimal,
    pub base_after_discount: Decimal,
    pub vat_amount: Decimal,
    pub total_with_vat: Decimal,
}

impl MonetarySummary {
    pub fn zero() -> Self {
        Self {
            base_without_vat: Decimal::ZERO,
            per_item_discount_amount: Decimal::ZERO,
            global_discount_amount: Decimal::ZERO,
            base_after_discount: Decimal::ZERO,
            vat_amount: Decimal::ZERO,
            total_with_vat: Decimal::ZERO,
        }
    }
}

/// Non-fatal findings surfaced to the caller alongside the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TotalsWarning {
    /// `vat_mode` was outside {0, 9.5, 22}; VAT fell back to 0%.
    UnsupportedVatMode { requested: Decimal },
}

/// Summary plus warning metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsOutcome {
    pub summary: MonetarySummary,
    pub warnings: Vec<TotalsWarning>,
}

fn clamp_percent(percent: Decimal) -> Decimal {
    percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

/// Compute the monetary summary for a set of line items.
///
/// Fixed pipeline order: item base, per-item discounts, global discount,
/// VAT, total. An empty item slice yields an all-zero summary; rejecting
/// empty documents is the calling store's job.
pub fn compute_totals(items: &[LineItem], config: &DiscountConfig) -> TotalsOutcome {
    let mut warnings = Vec::new();

    let base_without_vat: Decimal = items
        .iter()
        .map(|item| item.unit_price * item.quantity)
        .sum();

    let per_item_discount_amount: Decimal = if config.use_per_item_discount {
        items
            .iter()
            .map(|item| {
                item.unit_price * item.quantity * clamp_percent(item.discount_percent)
                    / Decimal::ONE_HUNDRED
            })
            .sum()
    } else {
        Decimal::ZERO
    };

    let base_after_per_item = base_without_vat - per_item_discount_amount;

    let global_discount_amount = if config.use_global_discount {
        base_after_per_item * clamp_percent(config.global_discount_percent) / Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    let base_after_discount = base_after_per_item - global_discount_amount;

    let vat_multiplier = match VatRate::from_percent(config.vat_mode) {
        Some(rate) => rate.multiplier(),
        None => {
            warnings.push(TotalsWarning::UnsupportedVatMode {
                requested: config.vat_mode,
            });
            Decimal::ZERO
        }
    };
    let vat_amount = base_after_discount * vat_multiplier;
    let total_with_vat = base_after_discount + vat_amount;

    TotalsOutcome {
        summary: MonetarySummary {
            base_without_vat: round_money(base_without_vat),
            per_item_discount_amount: round_money(per_item_discount_amount),
            global_discount_amount: round_money(global_discount_amount),
            base_after_discount: round_money(base_after_discount),
            vat_amount: round_money(vat_amount),
            total_with_vat: round_money(total_with_vat),
        },
        warnings,
    }
}

/// Validate line items ahead of any persistence.
///
/// Discounts are not validated here: the calculator clamps percentages to
/// [0, 100] by construction, so a stray value cannot produce a negative
/// discount amount.
pub fn validate_line_items(items: &[LineItem]) -> DomainResult<()> {
    if items.is_empty() {
        return Err(DomainError::validation(
            "document must have at least one line item",
        ));
    }

    for item in items {
        if item.quantity <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "quantity must be positive on line '{}'",
                item.name
            )));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "unit price must not be negative on line '{}'",
                item.name
            )));
        }
        if item.name.trim().is_empty() {
            return Err(DomainError::validation("line item name must not be empty"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use billcraft_core::LineItemId;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn item(quantity: Decimal, unit_price: Decimal, discount_percent: Decimal) -> LineItem {
        LineItem {
            id: LineItemId::new(),
            product_ref: None,
            name: "work".to_string(),
            quantity,
            unit: "h".to_string(),
            unit_price,
            vat_rate: VatRate::Standard,
            discount_percent,
        }
    }

    fn config_vat22() -> DiscountConfig {
        DiscountConfig::default()
    }

    #[test]
    fn two_items_no_discounts_vat_22() {
        // 12 x 85 + 8 x 45, no discounts, VAT 22%.
        let items = vec![
            item(dec!(12), dec!(85), Decimal::ZERO),
            item(dec!(8), dec!(45), Decimal::ZERO),
        ];

        let outcome = compute_totals(&items, &config_vat22());
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.summary.base_without_vat, dec!(1380.00));
        assert_eq!(outcome.summary.per_item_discount_amount, dec!(0.00));
        assert_eq!(outcome.summary.global_discount_amount, dec!(0.00));
        assert_eq!(outcome.summary.base_after_discount, dec!(1380.00));
        assert_eq!(outcome.summary.vat_amount, dec!(303.60));
        assert_eq!(outcome.summary.total_with_vat, dec!(1683.60));
    }

    #[test]
    fn global_discount_ten_percent() {
        let items = vec![
            item(dec!(12), dec!(85), Decimal::ZERO),
            item(dec!(8), dec!(45), Decimal::ZERO),
        ];
        let config = DiscountConfig {
            use_per_item_discount: false,
            use_global_discount: true,
            global_discount_percent: dec!(10),
            ..DiscountConfig::default()
        };

        let outcome = compute_totals(&items, &config);
        assert_eq!(outcome.summary.global_discount_amount, dec!(138.00));
        assert_eq!(outcome.summary.base_after_discount, dec!(1242.00));
        assert_eq!(outcome.summary.vat_amount, dec!(273.24));
        assert_eq!(outcome.summary.total_with_vat, dec!(1515.24));
    }

    #[test]
    fn per_item_discount_is_clamped_to_valid_range() {
        let items = vec![
            item(dec!(1), dec!(100), dec!(150)), // clamped to 100%
            item(dec!(1), dec!(100), dec!(-20)), // clamped to 0%
        ];
        let config = DiscountConfig {
            use_per_item_discount: true,
            ..DiscountConfig::default()
        };

        let outcome = compute_totals(&items, &config);
        assert_eq!(outcome.summary.per_item_discount_amount, dec!(100.00));
        assert_eq!(outcome.summary.base_after_discount, dec!(100.00));
    }

    #[test]
    fn unsupported_vat_mode_falls_back_to_zero_with_warning() {
        let items = vec![item(dec!(2), dec!(50), Decimal::ZERO)];
        let config = DiscountConfig {
            vat_mode: dec!(19),
            ..DiscountConfig::default()
        };

        let outcome = compute_totals(&items, &config);
        assert_eq!(outcome.summary.vat_amount, dec!(0.00));
        assert_eq!(outcome.summary.total_with_vat, dec!(100.00));
        assert_eq!(
            outcome.warnings,
            vec![TotalsWarning::UnsupportedVatMode {
                requested: dec!(19)
            }]
        );
    }

    #[test]
    fn reduced_vat_mode_applies_nine_point_five_percent() {
        let items = vec![item(dec!(4), dec!(25), Decimal::ZERO)];
        let config = DiscountConfig {
            vat_mode: dec!(9.5),
            ..DiscountConfig::default()
        };

        let outcome = compute_totals(&items, &config);
        assert_eq!(outcome.summary.vat_amount, dec!(9.50));
        assert_eq!(outcome.summary.total_with_vat, dec!(109.50));
    }

    #[test]
    fn empty_items_yield_all_zero_summary() {
        let outcome = compute_totals(&[], &config_vat22());
        assert_eq!(outcome.summary, MonetarySummary::zero());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn rounding_happens_only_at_summary_fields() {
        // Three lines of 0.333 each would drift if rounded per line.
        let items = vec![
            item(dec!(1), dec!(0.333), Decimal::ZERO),
            item(dec!(1), dec!(0.333), Decimal::ZERO),
            item(dec!(1), dec!(0.333), Decimal::ZERO),
        ];
        let config = DiscountConfig {
            vat_mode: Decimal::ZERO,
            ..DiscountConfig::default()
        };

        let outcome = compute_totals(&items, &config);
        // 0.999 rounds once, to 1.00, not 3 x 0.33 = 0.99.
        assert_eq!(outcome.summary.base_without_vat, dec!(1.00));
    }

    #[test]
    fn validate_rejects_empty_items() {
        let err = validate_line_items(&[]).unwrap_err();
        match err {
            billcraft_core::DomainError::Validation(msg) => {
                assert!(msg.contains("at least one line item"))
            }
            _ => panic!("expected validation error for empty items"),
        }
    }

    #[test]
    fn validate_rejects_non_positive_quantity_and_negative_price() {
        let zero_qty = vec![item(Decimal::ZERO, dec!(10), Decimal::ZERO)];
        assert!(validate_line_items(&zero_qty).is_err());

        let negative_price = vec![item(dec!(1), dec!(-10), Decimal::ZERO)];
        assert!(validate_line_items(&negative_price).is_err());
    }

    fn arb_items() -> impl Strategy<Value = Vec<LineItem>> {
        prop::collection::vec(
            (1u32..500, 0u32..100_000, 0u32..100).prop_map(|(qty, cents, disc)| {
                item(
                    Decimal::from(qty),
                    Decimal::new(cents as i64, 2),
                    Decimal::from(disc),
                )
            }),
            1..12,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the summary is independent of item order.
        #[test]
        fn totals_are_order_independent(
            (items, shuffled) in arb_items()
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let config = DiscountConfig {
                use_per_item_discount: true,
                use_global_discount: true,
                global_discount_percent: dec!(7),
                ..DiscountConfig::default()
            };

            let a = compute_totals(&items, &config);
            let b = compute_totals(&shuffled, &config);
            prop_assert_eq!(a.summary, b.summary);
        }

        /// Property: clamped discounts can never push any amount negative,
        /// and VAT only ever adds on top of the discounted base.
        #[test]
        fn discounts_never_produce_negative_amounts(items in arb_items(), global in 0u32..100) {
            let config = DiscountConfig {
                use_per_item_discount: true,
                use_global_discount: true,
                global_discount_percent: Decimal::from(global),
                ..DiscountConfig::default()
            };

            let s = compute_totals(&items, &config).summary;
            prop_assert!(s.per_item_discount_amount >= Decimal::ZERO);
            prop_assert!(s.global_discount_amount >= Decimal::ZERO);
            prop_assert!(s.base_after_discount >= Decimal::ZERO);
            prop_assert!(s.total_with_vat >= s.base_after_discount);
        }
    }
}
