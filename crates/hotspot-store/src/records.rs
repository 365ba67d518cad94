use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered topic hashes owned by one platform, rebuilt every collection cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformIndex {
    pub platform: String,
    pub topic_hashes: Vec<String>,
    pub update_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStat {
    pub count: usize,
    pub update_time: i64,
}

/// Rollup written alongside every collection cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub platforms: BTreeMap<String, PlatformStat>,
    pub total_topics: usize,
    /// Platforms whose fetch failed in the most recent cycle.
    #[serde(default)]
    pub failed_platforms: Vec<String>,
    pub update_time: i64,
}
