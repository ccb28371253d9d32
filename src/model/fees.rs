use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/**
 * GST amount and total derived from a package's basic fees and GST rate.
 * Never persisted; recomputed on every read so the stored row stays the
 * single source of truth for the two inputs.
 */
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub gst_amount: Decimal,
    pub total_fees: Decimal,
}

/**
 * Derives the GST amount and total fees for a package.
 *
 * gst_amount = basic_fees * gst_rate / 100
 * total_fees = basic_fees + gst_amount
 *
 * Both results are rounded half-up to two decimals, so the displayed and
 * stored-forward amounts always agree.
 *
 * # Arguments
 * `basic_fees`: The base package fee.
 * `gst_rate`: GST percentage (0 to 100).
 *
 * # Returns
 * The derived fee breakdown.
 */
pub fn derive_fees(basic_fees: Decimal, gst_rate: Decimal) -> FeeBreakdown {
    let gst_amount = (basic_fees * gst_rate / Decimal::ONE_HUNDRED).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let total_fees = (basic_fees + gst_amount).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    FeeBreakdown { gst_amount, total_fees }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_standard_gst_rate() {
        let fees = derive_fees(Decimal::new(1000, 0), Decimal::new(18, 0));
        assert_eq!(fees.gst_amount, Decimal::new(180, 0));
        assert_eq!(fees.total_fees, Decimal::new(1180, 0));
    }

    #[test]
    fn test_zero_rate_keeps_basic_fees() {
        let fees = derive_fees(Decimal::new(2500, 0), Decimal::ZERO);
        assert_eq!(fees.gst_amount, Decimal::ZERO);
        assert_eq!(fees.total_fees, Decimal::new(2500, 0));
    }

    #[test]
    fn test_half_up_rounding() {
        // 333.33 * 18 / 100 = 59.9994 -> 60.00
        let fees = derive_fees(Decimal::new(33333, 2), Decimal::new(18, 0));
        assert_eq!(fees.gst_amount, Decimal::new(6000, 2));
        assert_eq!(fees.total_fees, Decimal::new(39333, 2));
        // 1250.50 * 5 / 100 = 62.525 -> 62.53 (midpoint rounds up)
        let fees = derive_fees(Decimal::new(125050, 2), Decimal::new(5, 0));
        assert_eq!(fees.gst_amount, Decimal::new(6253, 2));
    }
}
