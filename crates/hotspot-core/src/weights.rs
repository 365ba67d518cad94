//! Per-platform weights and default hot values.
//!
//! Raw popularity numbers differ by orders of magnitude between platforms.
//! The weight scales a platform's raw value into the shared range; the
//! default hot value stands in when the upstream omits or garbles it.

use std::collections::HashMap;

/// Weight used for platforms missing from the table.
pub const DEFAULT_PLATFORM_WEIGHT: f64 = 0.5;

/// Hot value used for platforms missing from the table.
pub const DEFAULT_HOT_SCORE: i64 = 1000;

/// `(platform, weight, default hot)`. Weights lie in `(0.0, 1.0]`.
pub(crate) const PLATFORM_TABLE: &[(&str, f64, i64)] = &[
    // Mass-market hot lists
    ("weibo", 1.0, 1_000_000),
    ("douyin", 0.9, 1_000_000),
    ("baidu", 0.9, 800_000),
    ("zhihu", 0.9, 500_000),
    ("toutiao", 0.85, 500_000),
    ("kuaishou", 0.8, 500_000),
    ("bilibili", 0.8, 300_000),
    // News portals
    ("thepaper", 0.7, 10_000),
    ("qq-news", 0.7, 50_000),
    ("netease-news", 0.7, 50_000),
    ("sina", 0.7, 50_000),
    ("sina-news", 0.7, 50_000),
    ("nytimes", 0.6, 10_000),
    // Tech and business media
    ("36kr", 0.6, 20_000),
    ("ithome", 0.6, 20_000),
    ("huxiu", 0.6, 10_000),
    ("ifanr", 0.5, 5_000),
    ("sspai", 0.5, 5_000),
    ("juejin", 0.5, 5_000),
    ("csdn", 0.5, 10_000),
    ("51cto", 0.4, 2_000),
    ("hellogithub", 0.4, 1_000),
    ("hackernews", 0.5, 500),
    // Communities
    ("v2ex", 0.5, 1_000),
    ("hupu", 0.6, 20_000),
    ("tieba", 0.6, 100_000),
    ("douban-group", 0.5, 5_000),
    ("douban-movie", 0.5, 5_000),
    ("ngabbs", 0.5, 5_000),
    ("coolapk", 0.4, 5_000),
    ("acfun", 0.5, 10_000),
    // Games
    ("genshin", 0.4, 5_000),
    ("miyoushe", 0.4, 5_000),
    ("lol", 0.4, 5_000),
    // Reading
    ("weread", 0.4, 2_000),
    ("jianshu", 0.4, 2_000),
    ("guokr", 0.4, 2_000),
    ("zhihu-daily", 0.5, 2_000),
];

#[derive(Debug, Clone, Copy, PartialEq)]
struct PlatformProfile {
    weight: f64,
    default_hot: i64,
}

/// Lookup for platform weights and default hot values.
#[derive(Debug, Clone)]
pub struct PlatformWeights {
    profiles: HashMap<String, PlatformProfile>,
}

impl PlatformWeights {
    /// The compiled-in table.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_table(PLATFORM_TABLE.iter().copied())
    }

    /// Builds a lookup from `(platform, weight, default hot)` rows.
    ///
    /// Weights are clamped into `(0.0, 1.0]`; non-finite or non-positive
    /// weights fall back to [`DEFAULT_PLATFORM_WEIGHT`].
    #[must_use]
    pub fn from_table<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64, i64)>,
    {
        let profiles = rows
            .into_iter()
            .map(|(name, weight, default_hot)| {
                let weight = if weight.is_finite() && weight > 0.0 {
                    weight.min(1.0)
                } else {
                    DEFAULT_PLATFORM_WEIGHT
                };
                (
                    name.to_string(),
                    PlatformProfile {
                        weight,
                        default_hot: default_hot.max(1),
                    },
                )
            })
            .collect();
        Self { profiles }
    }

    #[must_use]
    pub fn weight(&self, platform: &str) -> f64 {
        self.profiles
            .get(platform)
            .map_or(DEFAULT_PLATFORM_WEIGHT, |p| p.weight)
    }

    #[must_use]
    pub fn default_hot(&self, platform: &str) -> i64 {
        self.profiles
            .get(platform)
            .map_or(DEFAULT_HOT_SCORE, |p| p.default_hot)
    }
}

impl Default for PlatformWeights {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_weights_are_in_unit_interval() {
        for &(name, weight, default_hot) in PLATFORM_TABLE {
            assert!(weight > 0.0 && weight <= 1.0, "{name} weight {weight}");
            assert!(default_hot > 0, "{name} default hot {default_hot}");
        }
    }

    #[test]
    fn unknown_platform_uses_global_defaults() {
        let weights = PlatformWeights::builtin();
        assert!((weights.weight("nowhere") - 0.5).abs() < f64::EPSILON);
        assert_eq!(weights.default_hot("nowhere"), 1000);
    }

    #[test]
    fn known_platform_lookup() {
        let weights = PlatformWeights::builtin();
        assert!((weights.weight("weibo") - 1.0).abs() < f64::EPSILON);
        assert_eq!(weights.default_hot("weibo"), 1_000_000);
    }

    #[test]
    fn from_table_sanitizes_weights() {
        let weights =
            PlatformWeights::from_table([("a", 3.0, 10), ("b", -1.0, 10), ("c", f64::NAN, 0)]);
        assert!((weights.weight("a") - 1.0).abs() < f64::EPSILON);
        assert!((weights.weight("b") - 0.5).abs() < f64::EPSILON);
        assert!((weights.weight("c") - 0.5).abs() < f64::EPSILON);
        assert_eq!(weights.default_hot("c"), 1);
    }
}
