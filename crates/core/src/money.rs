//! Money rounding and the fixed VAT-rate set.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round a monetary amount to 2 decimals, midpoint away from zero.
///
/// Applied only when a summary field is assembled; intermediate arithmetic
/// stays at full precision to avoid cumulative rounding drift.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// The supported VAT rates: 22% standard, 9.5% reduced, 0% exempt.
///
/// Serialized as the percent value so stored documents read naturally
/// (`"vat_rate": 22`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub enum VatRate {
    Zero,
    Reduced,
    Standard,
}

impl VatRate {
    /// The rate as a percent (0, 9.5, 22).
    pub fn percent(self) -> Decimal {
        match self {
            VatRate::Zero => Decimal::ZERO,
            VatRate::Reduced => Decimal::new(95, 1),
            VatRate::Standard => Decimal::new(22, 0),
        }
    }

    /// The rate as a multiplier (0, 0.095, 0.22).
    pub fn multiplier(self) -> Decimal {
        match self {
            VatRate::Zero => Decimal::ZERO,
            VatRate::Reduced => Decimal::new(95, 3),
            VatRate::Standard => Decimal::new(22, 2),
        }
    }

    /// Resolve a percent value against the supported set.
    ///
    /// Returns `None` for anything outside {0, 9.5, 22}; callers decide
    /// whether that is a hard validation error (line items) or a warned
    /// fallback to 0% (summary computation).
    pub fn from_percent(percent: Decimal) -> Option<Self> {
        let normalized = percent.normalize();
        if normalized == Decimal::ZERO {
            Some(VatRate::Zero)
        } else if normalized == Decimal::new(95, 1) {
            Some(VatRate::Reduced)
        } else if normalized == Decimal::new(22, 0) {
            Some(VatRate::Standard)
        } else {
            None
        }
    }
}

impl TryFrom<Decimal> for VatRate {
    type Error = String;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        VatRate::from_percent(value).ok_or_else(|| format!("unsupported VAT rate: {value}"))
    }
}

impl From<VatRate> for Decimal {
    fn from(value: VatRate) -> Self {
        value.percent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_midpoint_away_from_zero() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_money(dec!(303.6)), dec!(303.60));
    }

    #[test]
    fn resolves_supported_percents() {
        assert_eq!(VatRate::from_percent(dec!(22)), Some(VatRate::Standard));
        assert_eq!(VatRate::from_percent(dec!(22.0)), Some(VatRate::Standard));
        assert_eq!(VatRate::from_percent(dec!(9.5)), Some(VatRate::Reduced));
        assert_eq!(VatRate::from_percent(dec!(0)), Some(VatRate::Zero));
        assert_eq!(VatRate::from_percent(dec!(19)), None);
    }

    #[test]
    fn multiplier_matches_percent() {
        for rate in [VatRate::Zero, VatRate::Reduced, VatRate::Standard] {
            assert_eq!(rate.percent() / Decimal::ONE_HUNDRED, rate.multiplier());
        }
    }
}
