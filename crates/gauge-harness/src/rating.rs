//! Rating classifier - weighted percentage to compatibility tier

use serde::Serialize;
use std::fmt;

/// Compatibility tier, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Full,
    Majority,
    Partial,
    Limited,
    Poor,
}

impl Tier {
    /// All tiers, highest band first
    pub const ALL: [Tier; 5] = [
        Tier::Full,
        Tier::Majority,
        Tier::Partial,
        Tier::Limited,
        Tier::Poor,
    ];

    /// Inclusive lower bound of the tier's band, in percent
    pub fn threshold(&self) -> f64 {
        match self {
            Tier::Full => 95.0,
            Tier::Majority => 70.0,
            Tier::Partial => 50.0,
            Tier::Limited => 35.0,
            Tier::Poor => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Full => "Full feature coverage",
            Tier::Majority => "Handles majority/all complex use cases",
            Tier::Partial => "Handles basic + some complex use cases",
            Tier::Limited => "Limited — simple use cases only",
            Tier::Poor => "Poor — basic functionality only",
        }
    }

    /// First band (highest first) whose threshold the percentage reaches.
    ///
    /// NaN and negative values fall through to [`Tier::Poor`].
    pub fn classify(percentage: f64) -> Tier {
        Tier::ALL
            .into_iter()
            .find(|tier| percentage >= tier.threshold())
            .unwrap_or(Tier::Poor)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `100 * weighted / max`, or 0 when nothing was scored
pub fn percentage(weighted_score: u64, max_weighted_score: u64) -> f64 {
    if max_weighted_score == 0 {
        return 0.0;
    }
    100.0 * weighted_score as f64 / max_weighted_score as f64
}

/// Band table, one tier per line
pub fn tier_table() -> String {
    let mut out = String::new();
    for tier in Tier::ALL {
        let band = match tier {
            Tier::Poor => "else".to_string(),
            _ => format!(">= {:.0}", tier.threshold()),
        };
        out.push_str(&format!("{:<6}  {}\n", band, tier.label()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100.0, Tier::Full)]
    #[case(95.0, Tier::Full)]
    #[case(94.99, Tier::Majority)]
    #[case(70.0, Tier::Majority)]
    #[case(69.9, Tier::Partial)]
    #[case(50.0, Tier::Partial)]
    #[case(49.9, Tier::Limited)]
    #[case(37.5, Tier::Limited)]
    #[case(35.0, Tier::Limited)]
    #[case(34.99, Tier::Poor)]
    #[case(0.0, Tier::Poor)]
    fn test_classify_bands(#[case] pct: f64, #[case] expected: Tier) {
        assert_eq!(Tier::classify(pct), expected);
    }

    #[test]
    fn test_nan_is_poor() {
        assert_eq!(Tier::classify(f64::NAN), Tier::Poor);
    }

    #[test]
    fn test_percentage_zero_max() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(Tier::classify(percentage(0, 0)), Tier::Poor);
    }

    #[test]
    fn test_percentage_values() {
        assert_eq!(percentage(3, 8), 37.5);
        assert_eq!(percentage(20, 20), 100.0);
    }

    #[test]
    fn test_bands_are_contiguous() {
        // Every integer percentage maps to exactly the band whose range holds it.
        for p in 0..=100 {
            let tier = Tier::classify(p as f64);
            assert!(p as f64 >= tier.threshold());
            if let Some(idx) = Tier::ALL.iter().position(|t| *t == tier) {
                if idx > 0 {
                    assert!((p as f64) < Tier::ALL[idx - 1].threshold());
                }
            }
        }
    }

    #[test]
    fn test_tier_table_snapshot() {
        insta::assert_snapshot!(tier_table(), @r"
        >= 95   Full feature coverage
        >= 70   Handles majority/all complex use cases
        >= 50   Handles basic + some complex use cases
        >= 35   Limited — simple use cases only
        else    Poor — basic functionality only
        ");
    }
}
