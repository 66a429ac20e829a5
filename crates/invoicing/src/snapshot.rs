//! Aggregation of executed work into invoice lines.
//!
//! Work orders report executed quantities per composite item key; this
//! module groups them, classifies each group against the accepted offer,
//! and resolves prices from the matching offer line.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billcraft_core::{ItemKey, VatRate};
use billcraft_totals::LineItem;

use crate::version::{line_total, InvoiceLineItem, InvoiceLineKind};

/// Executed-quantity report for one item key, as delivered by the work-order
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedQuantity {
    pub key: ItemKey,
    pub name: String,
    pub unit: String,
    /// Quantity the accepted offer planned for this key (0 for extras).
    pub offered: Decimal,
    /// Quantity actually executed.
    pub executed: Decimal,
    /// Explicitly flagged as extra work regardless of quantities.
    pub is_extra: bool,
}

/// Classify one aggregated group against its offered quantity.
pub fn classify(offered: Decimal, executed: Decimal, is_extra: bool) -> InvoiceLineKind {
    if is_extra || offered <= Decimal::ZERO {
        InvoiceLineKind::Extra
    } else if executed < offered {
        InvoiceLineKind::Shortfall
    } else {
        InvoiceLineKind::Base
    }
}

fn find_offer_line<'a>(key: &ItemKey, offer_lines: &'a [LineItem]) -> Option<&'a LineItem> {
    match key {
        ItemKey::OfferLine { line_id } => offer_lines.iter().find(|l| l.id == *line_id),
        ItemKey::Product { product_ref } => offer_lines
            .iter()
            .find(|l| l.product_ref == Some(*product_ref)),
        ItemKey::NameUnit { name, unit } => offer_lines
            .iter()
            .find(|l| l.name == *name && l.unit == *unit),
    }
}

/// Build invoice lines from executed quantities.
///
/// Groups arrive per work order and may repeat a key (several work orders
/// touched the same item); quantities are summed per key, preserving first
/// appearance order. Groups with nothing executed are skipped; a line item
/// must carry a positive quantity. Prices and VAT resolve from the matching
/// accepted-offer line; unmatched extras default to 0 price and standard
/// VAT, left for the operator to price on the draft.
pub fn build_snapshot_items(
    executed: &[ExecutedQuantity],
    offer_lines: &[LineItem],
) -> Vec<InvoiceLineItem> {
    let mut grouped: Vec<ExecutedQuantity> = Vec::new();

    for report in executed {
        match grouped.iter_mut().find(|g| g.key == report.key) {
            Some(group) => {
                group.offered += report.offered;
                group.executed += report.executed;
                group.is_extra |= report.is_extra;
            }
            None => grouped.push(report.clone()),
        }
    }

    grouped
        .into_iter()
        .filter(|group| group.executed > Decimal::ZERO)
        .map(|group| {
            let kind = classify(group.offered, group.executed, group.is_extra);
            let offer_line = find_offer_line(&group.key, offer_lines);

            let line = match offer_line {
                Some(source) => LineItem {
                    quantity: group.executed,
                    ..source.clone()
                },
                None => LineItem {
                    id: billcraft_core::LineItemId::new(),
                    product_ref: match group.key {
                        ItemKey::Product { product_ref } => Some(product_ref),
                        _ => None,
                    },
                    name: group.name.clone(),
                    quantity: group.executed,
                    unit: group.unit.clone(),
                    unit_price: Decimal::ZERO,
                    vat_rate: VatRate::Standard,
                    discount_percent: Decimal::ZERO,
                },
            };

            let total = line_total(&line);
            InvoiceLineItem {
                key: group.key,
                kind,
                line,
                line_total: total,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use billcraft_core::{LineItemId, ProductRef};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn offer_line(name: &str, quantity: Decimal, unit_price: Decimal) -> LineItem {
        LineItem {
            id: LineItemId::new(),
            product_ref: None,
            name: name.to_string(),
            quantity,
            unit: "m2".to_string(),
            unit_price,
            vat_rate: VatRate::Reduced,
            discount_percent: Decimal::ZERO,
        }
    }

    fn report(key: ItemKey, offered: Decimal, executed: Decimal) -> ExecutedQuantity {
        ExecutedQuantity {
            key,
            name: "work".to_string(),
            unit: "m2".to_string(),
            offered,
            executed,
            is_extra: false,
        }
    }

    #[test]
    fn classifies_base_shortfall_and_extra() {
        assert_eq!(classify(dec!(10), dec!(10), false), InvoiceLineKind::Base);
        assert_eq!(classify(dec!(10), dec!(14), false), InvoiceLineKind::Base);
        assert_eq!(classify(dec!(10), dec!(6), false), InvoiceLineKind::Shortfall);
        assert_eq!(classify(dec!(0), dec!(4), false), InvoiceLineKind::Extra);
        assert_eq!(classify(dec!(10), dec!(10), true), InvoiceLineKind::Extra);
    }

    #[test]
    fn resolves_price_and_vat_from_offer_line() {
        let source = offer_line("tiling", dec!(20), dec!(35.50));
        let key = ItemKey::offer_line(source.id);
        let items = build_snapshot_items(&[report(key.clone(), dec!(20), dec!(24))], &[source]);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, InvoiceLineKind::Base);
        assert_eq!(items[0].line.quantity, dec!(24));
        assert_eq!(items[0].line.unit_price, dec!(35.50));
        assert_eq!(items[0].line.vat_rate, VatRate::Reduced);
        assert_eq!(items[0].line_total, dec!(852.00));
    }

    #[test]
    fn unmatched_extra_defaults_to_zero_price_standard_vat() {
        let key = ItemKey::product(ProductRef::new());
        let items = build_snapshot_items(&[report(key, dec!(0), dec!(3))], &[]);

        assert_eq!(items[0].kind, InvoiceLineKind::Extra);
        assert_eq!(items[0].line.unit_price, Decimal::ZERO);
        assert_eq!(items[0].line.vat_rate, VatRate::Standard);
    }

    #[test]
    fn repeated_keys_are_summed_and_zero_executed_skipped() {
        let source = offer_line("painting", dec!(30), dec!(12));
        let key = ItemKey::offer_line(source.id);
        let untouched = ItemKey::name_unit("cleanup", "h");

        let items = build_snapshot_items(
            &[
                report(key.clone(), dec!(30), dec!(10)),
                report(key.clone(), dec!(0), dec!(8)),
                report(untouched, dec!(5), dec!(0)),
            ],
            &[source],
        );

        // 10 + 8 executed against 30 offered: still a shortfall, one line.
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, InvoiceLineKind::Shortfall);
        assert_eq!(items[0].line.quantity, dec!(18));
    }

    #[test]
    fn name_unit_keys_match_offer_lines_textually() {
        let source = offer_line("grouting", dec!(8), dec!(9.90));
        let key = ItemKey::name_unit("grouting", "m2");
        let items = build_snapshot_items(&[report(key, dec!(8), dec!(8))], &[source]);

        assert_eq!(items[0].line.unit_price, dec!(9.90));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a group is Shortfall iff executed under-runs a positive
        /// offered quantity, absent an explicit extra flag.
        #[test]
        fn classification_is_exhaustive_and_exclusive(
            offered in 0u32..100,
            executed in 0u32..100,
            is_extra in any::<bool>(),
        ) {
            let offered = Decimal::from(offered);
            let executed = Decimal::from(executed);
            let kind = classify(offered, executed, is_extra);

            if is_extra || offered == Decimal::ZERO {
                prop_assert_eq!(kind, InvoiceLineKind::Extra);
            } else if executed < offered {
                prop_assert_eq!(kind, InvoiceLineKind::Shortfall);
            } else {
                prop_assert_eq!(kind, InvoiceLineKind::Base);
            }
        }
    }
}
