//! Single read entry point over the topic cache.
//!
//! [`HotspotService::query`] runs one request through filter, scorer and
//! (optionally) summarizer and wraps the result in one of four envelopes:
//! topics, summary, no data, or misconfiguration. It never returns `Err`;
//! store failures degrade to the no-data envelope.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use hotspot_core::{dedup_form, Topic};
use hotspot_store::TopicStore;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::filter::{search, Filter, FilterError};
use crate::scorer::{ScoredTopic, Scorer};
use crate::summarizer::{clamp_ratio, summarize, SummaryStats, DEFAULT_RATIO};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 50;
pub const DEFAULT_WORD_LIMIT: i64 = 500;

/// One CJK ideograph, or a run of other letters and digits.
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\p{Han}|[\p{L}\p{N}&&[^\p{Han}]]+").expect("valid word regex")
});

/// Word count used for the summarization budget.
#[must_use]
pub fn count_words(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

/// Words a reader sees in a result: titles and descriptions. Keys, numbers
/// and links of the record are not counted.
fn readable_words(topics: &[ScoredTopic]) -> usize {
    topics
        .iter()
        .map(|t| {
            count_words(&t.topic.title)
                + t.topic.description.as_deref().map_or(0, count_words)
        })
        .sum()
}

/// Parameters of one query. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryParams {
    pub category: Option<String>,
    pub keywords: Option<String>,
    /// Clamped to `[1, 50]`; defaults to 20.
    pub limit: Option<i64>,
    pub force_summarize: bool,
    /// Floored at 1; defaults to 500.
    pub word_limit: Option<i64>,
    /// Clamped to `[0.1, 0.5]`; defaults to 0.25.
    pub compression_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoData,
    Misconfigured,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResult {
    pub topics: Vec<ScoredTopic>,
    pub total: usize,
    pub platforms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_platforms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_supplemented: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplemented_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub summary: String,
    /// The top-K topics the summary was built from.
    pub topics: Vec<ScoredTopic>,
    pub total: usize,
    pub platforms: Vec<String>,
    pub stats: SummaryStats,
    pub is_summarized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_platforms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_supplemented: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplemented_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResult {
    pub error: ErrorKind,
    pub message: String,
    pub total: usize,
    pub platforms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_platforms: Vec<String>,
}

/// Result of [`HotspotService::query`]. Serializes without a tag; the
/// variants are told apart by their `topics`, `summary` or `error` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Data(DataResult),
    Summary(SummaryResult),
    Error(ErrorResult),
}

impl QueryOutcome {
    #[must_use]
    pub fn total(&self) -> usize {
        match self {
            Self::Data(d) => d.total,
            Self::Summary(s) => s.total,
            Self::Error(e) => e.total,
        }
    }

    #[must_use]
    pub fn is_summarized(&self) -> bool {
        matches!(self, Self::Summary(_))
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Error(e) => Some(e.error),
            _ => None,
        }
    }

    #[must_use]
    pub fn topics(&self) -> &[ScoredTopic] {
        match self {
            Self::Data(d) => &d.topics,
            Self::Summary(s) => &s.topics,
            Self::Error(_) => &[],
        }
    }
}

/// Normalized view of [`QueryParams`].
#[derive(Debug, Clone)]
struct Request {
    category: Option<String>,
    keywords: Option<String>,
    limit: usize,
    force_summarize: bool,
    word_limit: usize,
    ratio: f64,
}

impl Request {
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn from_params(params: QueryParams) -> Self {
        let non_blank = |s: Option<String>| {
            s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        Self {
            category: non_blank(params.category),
            keywords: non_blank(params.keywords),
            limit: params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize,
            force_summarize: params.force_summarize,
            word_limit: usize::try_from(params.word_limit.unwrap_or(DEFAULT_WORD_LIMIT).max(1))
                .unwrap_or(usize::MAX),
            ratio: clamp_ratio(params.compression_ratio.unwrap_or(DEFAULT_RATIO)),
        }
    }
}

/// Backfill bookkeeping for keyword-only queries.
#[derive(Debug, Clone, Copy)]
struct Supplement {
    matched: usize,
    supplemented: usize,
}

/// Ranked topics plus the context that goes into every envelope.
struct Selection {
    topics: Vec<ScoredTopic>,
    platforms: Vec<String>,
    supplement: Option<Supplement>,
}

pub struct HotspotService {
    store: Arc<TopicStore>,
    filter: Filter,
    scorer: Scorer,
}

impl HotspotService {
    #[must_use]
    pub fn new(store: Arc<TopicStore>, filter: Filter, scorer: Scorer) -> Self {
        Self {
            store,
            filter,
            scorer,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<TopicStore> {
        &self.store
    }

    /// Answers one query from the cache.
    pub async fn query(&self, params: QueryParams) -> QueryOutcome {
        let req = Request::from_params(params);
        let failed = self.failed_platforms().await;

        let selection = if req.keywords.is_some() && req.category.is_none() {
            self.select_by_keyword(&req).await
        } else {
            self.select_by_category(&req).await
        };

        let selection = match selection {
            Ok(selection) => selection,
            Err(outcome) => return with_failures(outcome, failed),
        };

        let Selection {
            topics,
            platforms,
            supplement,
        } = selection;
        let total = topics.len();

        if req.force_summarize || readable_words(&topics) > req.word_limit {
            let digest = summarize(&topics, req.ratio);
            debug!(
                total,
                kept = digest.topics.len(),
                forced = req.force_summarize,
                "returning summary"
            );
            return QueryOutcome::Summary(SummaryResult {
                message: format!("已将{total}条热点压缩为{}条摘要", digest.topics.len()),
                summary: digest.summary,
                topics: digest.topics,
                total,
                platforms,
                stats: digest.stats,
                is_summarized: true,
                category: req.category,
                keywords: req.keywords,
                failed_platforms: failed,
                is_supplemented: supplement.map(|s| s.supplemented > 0),
                matched_count: supplement.map(|s| s.matched),
                supplemented_count: supplement.map(|s| s.supplemented),
            });
        }

        let message = match supplement {
            Some(s) if s.supplemented > 0 => format!(
                "匹配到{}条相关热点，另从热点榜补充{}条",
                s.matched, s.supplemented
            ),
            _ => format!("获取到{total}条热点"),
        };
        QueryOutcome::Data(DataResult {
            topics,
            total,
            platforms,
            category: req.category,
            keywords: req.keywords,
            message,
            failed_platforms: failed,
            is_supplemented: supplement.map(|s| s.supplemented > 0),
            matched_count: supplement.map(|s| s.matched),
            supplemented_count: supplement.map(|s| s.supplemented),
        })
    }

    /// Category (or category + keyword) path. Zero matches is a no-data
    /// result; nothing is backfilled.
    async fn select_by_category(&self, req: &Request) -> Result<Selection, QueryOutcome> {
        let resolved = self
            .filter
            .resolve(req.category.as_deref())
            .map_err(|e| misconfigured(req, &e))?;
        if resolved.fell_back {
            debug!(requested = ?req.category, "unknown category, serving 热点");
        }

        let topics = match self.store.topics_for_platforms(&resolved.platforms).await {
            Ok(topics) => topics,
            Err(e) => {
                warn!(error = %e, "topic store read failed");
                return Err(no_data(req, resolved.platforms, "热点数据暂不可用"));
            }
        };
        let topics = match req.keywords.as_deref() {
            Some(keyword) => search(topics, keyword),
            None => topics,
        };
        if topics.is_empty() {
            let message = match req.keywords.as_deref() {
                Some(keyword) => format!("分类{}下没有与“{keyword}”相关的热点", resolved.category),
                None => format!("分类{}下暂无热点数据", resolved.category),
            };
            return Err(no_data(req, resolved.platforms, &message));
        }

        let mut ranked = self.scorer.rank(topics, self.store.now());
        ranked.truncate(req.limit);
        Ok(Selection {
            topics: ranked,
            platforms: resolved.platforms,
            supplement: None,
        })
    }

    /// Keyword-only path: search every platform with a live index, then pad
    /// with 热点 topics up to `limit`.
    async fn select_by_keyword(&self, req: &Request) -> Result<Selection, QueryOutcome> {
        let keyword = req.keywords.as_deref().unwrap_or_default();
        let now = self.store.now();

        let platforms = match self.store.all_platforms().await {
            Ok(platforms) => platforms,
            Err(e) => {
                warn!(error = %e, "listing cached platforms failed");
                return Err(no_data(req, Vec::new(), "热点数据暂不可用"));
            }
        };
        let topics = match self.store.topics_for_platforms(&platforms).await {
            Ok(topics) => topics,
            Err(e) => {
                warn!(error = %e, "topic store read failed");
                return Err(no_data(req, platforms, "热点数据暂不可用"));
            }
        };

        let mut matched = self.scorer.rank(search(topics, keyword), now);
        matched.truncate(req.limit);
        let matched_count = matched.len();

        let mut supplemented = Vec::new();
        if matched_count < req.limit {
            match self.filter.resolve(None) {
                Ok(hot) => {
                    let present: HashSet<String> = matched
                        .iter()
                        .map(|t| dedup_form(&t.topic.title))
                        .collect();
                    let hot_topics = self
                        .store
                        .topics_for_platforms(&hot.platforms)
                        .await
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "reading 热点 topics for backfill failed");
                            Vec::new()
                        });
                    let candidates: Vec<Topic> = hot_topics
                        .into_iter()
                        .filter(|t| !present.contains(&dedup_form(&t.title)))
                        .collect();
                    supplemented = self.scorer.rank(candidates, now);
                    supplemented.truncate(req.limit - matched_count);
                }
                Err(e) if matched.is_empty() => return Err(misconfigured(req, &e)),
                Err(e) => warn!(error = %e, "skipping backfill"),
            }
        }

        if matched.is_empty() && supplemented.is_empty() {
            let message = format!("没有找到与“{keyword}”相关的热点");
            return Err(no_data(req, platforms, &message));
        }

        let supplement = Supplement {
            matched: matched_count,
            supplemented: supplemented.len(),
        };
        matched.extend(supplemented);
        Ok(Selection {
            topics: matched,
            platforms,
            supplement: Some(supplement),
        })
    }

    /// Failures from the last collection cycle; empty when unknown.
    async fn failed_platforms(&self) -> Vec<String> {
        match self.store.stats().await {
            Ok(stats) => stats.map(|s| s.failed_platforms).unwrap_or_default(),
            Err(e) => {
                debug!(error = %e, "platform stats unavailable");
                Vec::new()
            }
        }
    }
}

fn no_data(req: &Request, platforms: Vec<String>, message: &str) -> QueryOutcome {
    QueryOutcome::Error(ErrorResult {
        error: ErrorKind::NoData,
        message: message.to_string(),
        total: 0,
        platforms,
        category: req.category.clone(),
        keywords: req.keywords.clone(),
        failed_platforms: Vec::new(),
    })
}

fn misconfigured(req: &Request, err: &FilterError) -> QueryOutcome {
    warn!(error = %err, "category table misconfigured");
    QueryOutcome::Error(ErrorResult {
        error: ErrorKind::Misconfigured,
        message: err.to_string(),
        total: 0,
        platforms: Vec::new(),
        category: req.category.clone(),
        keywords: req.keywords.clone(),
        failed_platforms: Vec::new(),
    })
}

fn with_failures(outcome: QueryOutcome, failed: Vec<String>) -> QueryOutcome {
    match outcome {
        QueryOutcome::Error(mut e) => {
            e.failed_platforms = failed;
            QueryOutcome::Error(e)
        }
        other => other,
    }
}
