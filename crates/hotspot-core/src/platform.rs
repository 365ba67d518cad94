use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Route names the upstream uses for itself rather than for a platform.
pub const RESERVED_PLATFORM_NAMES: &[&str] = &["all", "config"];

/// One entry of the upstream discovery response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlatformRoute {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEntry {
    pub path: String,
}

/// Cached platform name → fetch path mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    pub platforms: BTreeMap<String, PlatformEntry>,
    pub update_time: i64,
}

impl PlatformConfig {
    /// Builds a config from discovery routes.
    ///
    /// Routes with a blank name or path and routes using a reserved name are
    /// dropped; the second of two routes with the same name is ignored.
    /// Returns the config and the number of routes that were rejected.
    #[must_use]
    pub fn from_routes(routes: Vec<PlatformRoute>, update_time: i64) -> (Self, usize) {
        let mut platforms = BTreeMap::new();
        let mut rejected = 0usize;

        for route in routes {
            let name = route.name.as_deref().map(str::trim).unwrap_or_default();
            let path = route.path.as_deref().map(str::trim).unwrap_or_default();
            if name.is_empty() || path.is_empty() || is_reserved(name) {
                rejected += 1;
                continue;
            }
            let path = if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            };
            platforms
                .entry(name.to_string())
                .or_insert(PlatformEntry { path });
        }

        (
            Self {
                platforms,
                update_time,
            },
            rejected,
        )
    }

    /// Whether the mapping was refreshed less than `interval_secs` ago.
    #[must_use]
    pub fn is_fresh(&self, now: i64, interval_secs: i64) -> bool {
        now - self.update_time < interval_secs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.platforms.len()
    }
}

#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_PLATFORM_NAMES
        .iter()
        .any(|r| r.eq_ignore_ascii_case(name))
}
