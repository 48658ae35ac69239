//! Post-debate analysis: sentence similarity, attribution, and cost.

pub mod attribution;
pub mod cost;
pub mod similarity;

pub use attribution::{
    AttributionAnalyzer, AttributionReport, DEFAULT_SIMILARITY_THRESHOLD, ProviderAttribution,
    RoundDiff,
};
pub use cost::{CostReport, ModelPrice, PricingTable, ProviderCost, compute_costs};
pub use similarity::{MIN_SENTENCE_LEN, best_match, sequence_ratio, similarity, split_sentences};

/// Round to `places` decimals, ties to even (6.25 -> 6.2)
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::round_to;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(33.333_333, 1), 33.3);
        assert_eq!(round_to(66.666_666, 1), 66.7);
        assert_eq!(round_to(0.123_456_789, 6), 0.123457);
        assert_eq!(round_to(0.0, 3), 0.0);
    }

    #[test]
    fn test_round_to_ties_to_even() {
        // 1 of 16 sentences
        assert_eq!(round_to(1.0 / 16.0 * 100.0, 1), 6.2);
        assert_eq!(round_to(18.75, 1), 18.8);
        assert_eq!(round_to(12.5, 0), 12.0);
        assert_eq!(round_to(13.5, 0), 14.0);
    }
}
