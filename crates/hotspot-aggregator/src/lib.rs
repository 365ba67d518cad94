//! Read path of the hotspot service.
//!
//! Everything here works from the cache only; no function in this crate
//! makes a network call. [`HotspotService::query`] is the single entry
//! point and always returns a well-formed [`QueryOutcome`].

pub mod facade;
pub mod filter;
pub mod scorer;
pub mod summarizer;

pub use facade::{
    count_words, DataResult, ErrorKind, ErrorResult, HotspotService, QueryOutcome, QueryParams,
    SummaryResult,
};
pub use filter::{search, Filter, FilterError, ResolvedCategory};
pub use scorer::{ScoredTopic, Scorer};
pub use summarizer::{summarize, PlatformCount, Summary, SummaryStats};
