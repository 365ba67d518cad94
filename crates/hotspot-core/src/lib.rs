//! Shared configuration and domain types for the hotspot aggregation service.

pub mod app_config;
pub mod category;
pub mod clock;
pub mod config;
pub mod platform;
pub mod topic;
pub mod weights;

pub use app_config::{AppConfig, Environment};
pub use category::{Category, CategoryTable};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_app_config, load_app_config_from_env};
pub use platform::{PlatformConfig, PlatformEntry, PlatformRoute, RESERVED_PLATFORM_NAMES};
pub use topic::{dedup_form, title_hash, RawTopic, Topic, TOPIC_TTL_SECS};
pub use weights::{PlatformWeights, DEFAULT_HOT_SCORE, DEFAULT_PLATFORM_WEIGHT};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
