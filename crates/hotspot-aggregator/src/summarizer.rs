//! Digest of a ranked topic list.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::scorer::ScoredTopic;

pub const MIN_RATIO: f64 = 0.1;
pub const MAX_RATIO: f64 = 0.5;
pub const DEFAULT_RATIO: f64 = 0.25;

const MIN_SUMMARY_TOPICS: usize = 3;
const TOP_PLATFORMS: usize = 3;
const TOP_KEYWORDS: usize = 5;
const HEADLINE_TITLES: usize = 3;

/// Splits titles on whitespace, punctuation and symbols.
static DELIMITER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\p{P}\p{S}]+").expect("valid delimiter regex"));

/// Separates CJK runs from the rest of a token ("Rust发布" → "Rust", "发布").
static SCRIPT_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{Han}+)|[^\p{Han}]+").expect("valid script run regex"));

/// Function characters that never sit inside a CJK keyword.
const CJK_PARTICLES: &[char] = &[
    '的', '了', '是', '在', '和', '与', '及', '或', '也', '就', '都', '而', '被', '把', '让', '吗', '呢',
];

const STOPWORDS: &[&str] = &[
    // zh
    "的", "了", "是", "在", "和", "与", "及", "或", "也", "就", "都", "而", "被", "把", "让",
    "这", "那", "有", "为", "对", "从", "到", "将", "等", "个", "上", "下", "中", "后", "前",
    "我们", "你们", "他们", "一个", "没有", "什么", "怎么", "如何", "为什么", "已经", "还是",
    "可以", "这个", "那个", "不是", "就是", "回应", "最新", "官方", "网友", "热议", "曝光",
    // en
    "the", "a", "an", "and", "or", "of", "to", "in", "on", "for", "with", "at", "by", "from",
    "is", "are", "was", "were", "be", "been", "it", "its", "this", "that", "as", "how", "why",
    "what", "new", "vs",
];

/// Clamps a compression ratio into `[0.1, 0.5]`; non-finite input uses the default.
#[must_use]
pub fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() {
        ratio.clamp(MIN_RATIO, MAX_RATIO)
    } else {
        DEFAULT_RATIO
    }
}

/// Number of topics kept by a summary: `max(3, floor(len * ratio))`,
/// never more than `len`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn summary_size(len: usize, ratio: f64) -> usize {
    let scaled = (len as f64 * clamp_ratio(ratio)).floor() as usize;
    scaled.max(MIN_SUMMARY_TOPICS).min(len)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformCount {
    pub platform: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_topics: usize,
    pub platform_count: usize,
    pub top_platforms: Vec<PlatformCount>,
    /// Mean normalized hot across all input topics, floored.
    pub average_hot: i64,
    pub keywords: Vec<String>,
    pub compression_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub summary: String,
    pub topics: Vec<ScoredTopic>,
    pub stats: SummaryStats,
}

/// Compresses `topics` into a digest.
///
/// Keeps the [`summary_size`] highest-priority topics; equal scores keep
/// their input order. Output is fully determined by the input and ratio.
#[must_use]
pub fn summarize(topics: &[ScoredTopic], ratio: f64) -> Summary {
    let ratio = clamp_ratio(ratio);

    let mut ranked: Vec<&ScoredTopic> = topics.iter().collect();
    ranked.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
    let selected: Vec<ScoredTopic> = ranked
        .into_iter()
        .take(summary_size(topics.len(), ratio))
        .cloned()
        .collect();

    let platforms = platform_counts(topics);
    let keywords = top_keywords(topics.iter().map(|t| t.topic.title.as_str()), TOP_KEYWORDS);
    let stats = SummaryStats {
        total_topics: topics.len(),
        platform_count: platforms.len(),
        top_platforms: platforms.into_iter().take(TOP_PLATFORMS).collect(),
        average_hot: average_hot(topics),
        keywords,
        compression_ratio: ratio,
    };
    let summary = render(&stats, &selected);

    Summary {
        summary,
        topics: selected,
        stats,
    }
}

/// Topic count per platform, most topics first, then by name.
fn platform_counts(topics: &[ScoredTopic]) -> Vec<PlatformCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in topics {
        *counts.entry(t.topic.platform.as_str()).or_default() += 1;
    }
    let mut counts: Vec<PlatformCount> = counts
        .into_iter()
        .map(|(platform, count)| PlatformCount {
            platform: platform.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.platform.cmp(&b.platform)));
    counts
}

#[allow(clippy::cast_possible_wrap)]
fn average_hot(topics: &[ScoredTopic]) -> i64 {
    if topics.is_empty() {
        return 0;
    }
    let sum: i128 = topics.iter().map(|t| i128::from(t.normalized_hot)).sum();
    i64::try_from(sum / topics.len() as i128).unwrap_or(i64::MAX)
}

/// Most frequent non-stopword tokens across `titles`; ties go to the token
/// seen first.
pub(crate) fn top_keywords<'a>(titles: impl Iterator<Item = &'a str>, n: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut order = 0usize;
    for title in titles {
        let mut in_title = HashSet::new();
        for term in title_terms(title) {
            if !is_keyword(&term) || !in_title.insert(term.clone()) {
                continue;
            }
            let entry = counts.entry(term).or_insert((0, order));
            entry.0 += 1;
            order += 1;
        }
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(token, (count, first))| (token, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));
    ranked.into_iter().take(n).map(|(token, ..)| token).collect()
}

/// Candidate terms of one title. Non-CJK runs are kept whole and
/// lowercased. Unspaced CJK runs are cut at function particles and
/// the pieces yield character bigrams.
fn title_terms(title: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for token in DELIMITER_RE.split(title) {
        for run in SCRIPT_RUN_RE.captures_iter(token) {
            match run.get(1) {
                Some(han) => han_bigrams(han.as_str(), &mut terms),
                None => terms.push(run[0].trim().to_lowercase()),
            }
        }
    }
    terms
}

fn han_bigrams(run: &str, out: &mut Vec<String>) {
    let chars: Vec<char> = run.chars().collect();
    for segment in chars.split(|c| CJK_PARTICLES.contains(c)) {
        out.extend(segment.windows(2).map(|pair| pair.iter().collect::<String>()));
    }
}

fn is_keyword(token: &str) -> bool {
    token.chars().count() >= 2
        && !token.chars().all(|c| c.is_ascii_digit())
        && !STOPWORDS.contains(&token)
}

fn render(stats: &SummaryStats, selected: &[ScoredTopic]) -> String {
    let mut out = format!(
        "共汇总{}条热点，覆盖{}个平台。",
        stats.total_topics, stats.platform_count
    );

    if !stats.top_platforms.is_empty() {
        let platforms: Vec<String> = stats
            .top_platforms
            .iter()
            .map(|p| format!("{}({}条)", p.platform, p.count))
            .collect();
        let _ = write!(out, "热点最多的平台：{}。", platforms.join("、"));
    }

    if !stats.keywords.is_empty() {
        let _ = write!(out, "高频关键词：{}。", stats.keywords.join("、"));
    }

    let titles: Vec<String> = selected
        .iter()
        .take(HEADLINE_TITLES)
        .map(|t| format!("「{}」", t.topic.title))
        .collect();
    if !titles.is_empty() {
        let _ = write!(out, "最受关注的话题：{}。", titles.join("；"));
    }

    out
}
