//! Cross-platform hot normalization and time-decayed priority.

use hotspot_core::{PlatformWeights, Topic};
use serde::Serialize;

/// Window over which the recency bonus decays linearly to zero.
pub const DECAY_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

const BASE_FACTOR: f64 = 0.7;
const TIME_FACTOR: f64 = 0.2;
const WEIGHT_FACTOR: f64 = 0.1;

/// Absorbs binary representation error (`0.7 + 0.2 + 0.1 < 1.0`) before flooring.
const FLOOR_EPSILON: f64 = 1e-9;

#[allow(clippy::cast_possible_truncation)]
fn floor_to_i64(value: f64) -> i64 {
    (value + FLOOR_EPSILON).floor() as i64
}

/// A topic with its read-path scores attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredTopic {
    #[serde(flatten)]
    pub topic: Topic,
    pub normalized_hot: i64,
    pub priority_score: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: PlatformWeights,
}

impl Scorer {
    #[must_use]
    pub fn new(weights: PlatformWeights) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn weights(&self) -> &PlatformWeights {
        &self.weights
    }

    /// `floor(hot * weight)`, never below 1. A missing or non-positive raw
    /// value is replaced by the platform's default hot value first.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn normalized_hot(&self, platform: &str, raw: Option<i64>) -> i64 {
        let hot = raw
            .filter(|h| *h > 0)
            .unwrap_or_else(|| self.weights.default_hot(platform));
        floor_to_i64(hot as f64 * self.weights.weight(platform)).max(1)
    }

    /// Recency multiplier in `[0, 1]`: 1 at the source time, 0 from seven
    /// days on. Future timestamps count as brand new.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time_factor(source_timestamp: i64, now: i64) -> f64 {
        let age = (now - source_timestamp).max(0);
        (1.0 - age as f64 / DECAY_WINDOW_SECS as f64).max(0.0)
    }

    /// `floor(normalized_hot * (0.7 + 0.2 * time_factor + 0.1 * weight))`.
    #[must_use]
    pub fn priority_score(&self, topic: &Topic, now: i64) -> i64 {
        let normalized = self.normalized_hot(&topic.platform, topic.hot);
        self.priority_from(normalized, topic, now)
    }

    #[allow(clippy::cast_precision_loss)]
    fn priority_from(&self, normalized: i64, topic: &Topic, now: i64) -> i64 {
        let multiplier = BASE_FACTOR
            + TIME_FACTOR * Self::time_factor(topic.source_timestamp, now)
            + WEIGHT_FACTOR * self.weights.weight(&topic.platform);
        floor_to_i64(normalized as f64 * multiplier)
    }

    #[must_use]
    pub fn score(&self, topic: Topic, now: i64) -> ScoredTopic {
        let normalized_hot = self.normalized_hot(&topic.platform, topic.hot);
        let priority_score = self.priority_from(normalized_hot, &topic, now);
        ScoredTopic {
            topic,
            normalized_hot,
            priority_score,
        }
    }

    /// Scores every topic and sorts by priority, highest first. Ties keep
    /// their input order.
    #[must_use]
    pub fn rank(&self, topics: Vec<Topic>, now: i64) -> Vec<ScoredTopic> {
        let mut scored: Vec<ScoredTopic> = topics.into_iter().map(|t| self.score(t, now)).collect();
        scored.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
        scored
    }
}

#[cfg(test)]
mod tests {
    use hotspot_core::RawTopic;

    use super::*;

    const NOW: i64 = 1_760_000_000;

    fn topic(platform: &str, hot: Option<i64>, source_timestamp: i64) -> Topic {
        let mut t = Topic::from_raw(
            platform,
            RawTopic {
                title: "t".into(),
                hot,
                ..RawTopic::default()
            },
            NOW,
        );
        t.source_timestamp = source_timestamp;
        t
    }

    fn scorer() -> Scorer {
        Scorer::new(PlatformWeights::from_table([("full", 1.0, 10), ("half", 0.5, 4)]))
    }

    #[test]
    fn normalized_hot_is_never_below_one() {
        let s = scorer();
        for raw in [None, Some(i64::MIN), Some(-5), Some(0), Some(1), Some(2)] {
            assert!(s.normalized_hot("half", raw) >= 1, "raw {raw:?}");
            assert!(s.normalized_hot("unknown", raw) >= 1, "raw {raw:?}");
        }
        assert_eq!(s.normalized_hot("half", Some(1)), 1);
    }

    #[test]
    fn missing_hot_uses_platform_default() {
        let s = scorer();
        assert_eq!(s.normalized_hot("full", None), 10);
        assert_eq!(s.normalized_hot("half", Some(-3)), 2);
        // unknown: 1000 * 0.5
        assert_eq!(s.normalized_hot("unknown", None), 500);
    }

    #[test]
    fn normalized_hot_floors() {
        assert_eq!(scorer().normalized_hot("half", Some(101)), 50);
    }

    #[test]
    fn priority_decays_linearly_over_a_week() {
        let s = scorer();
        let fresh = s.priority_score(&topic("full", Some(1_000), NOW), NOW);
        let half = s.priority_score(&topic("full", Some(1_000), NOW - DECAY_WINDOW_SECS / 2), NOW);
        let week = s.priority_score(&topic("full", Some(1_000), NOW - DECAY_WINDOW_SECS), NOW);
        let older = s.priority_score(&topic("full", Some(1_000), NOW - 2 * DECAY_WINDOW_SECS), NOW);
        assert_eq!(fresh, 1_000);
        assert_eq!(half, 900);
        assert_eq!(week, 800);
        assert_eq!(older, week);
    }

    #[test]
    fn priority_is_monotonic_in_age() {
        let s = scorer();
        let mut previous = i64::MAX;
        for hours in (0..=24 * 8).step_by(6) {
            let score = s.priority_score(&topic("half", Some(5_000), NOW - hours * 3_600), NOW);
            assert!(score <= previous, "score rose at {hours}h");
            previous = score;
        }
    }

    #[test]
    fn future_timestamp_counts_as_fresh() {
        assert!((Scorer::time_factor(NOW + 100, NOW) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rank_is_stable_for_ties() {
        let s = scorer();
        let mut a = topic("full", Some(10), NOW);
        a.title = "a".into();
        let mut b = topic("full", Some(10), NOW);
        b.title = "b".into();
        let mut c = topic("full", Some(99), NOW);
        c.title = "c".into();
        let ranked = s.rank(vec![a, b, c], NOW);
        let titles: Vec<_> = ranked.iter().map(|t| t.topic.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
    }

    #[test]
    fn scored_topic_serializes_flat() {
        let scored = scorer().score(topic("full", Some(10), NOW), NOW);
        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["platform"], "full");
        assert_eq!(json["normalizedHot"], 10);
        assert_eq!(json["priorityScore"], 10);
    }
}
