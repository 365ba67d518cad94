//! Category resolution and keyword search.

use hotspot_core::{Category, CategoryTable, Topic};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// Even the hot category has no platforms configured.
    #[error("category {requested} resolves to no platforms, even after falling back to 热点")]
    Misconfigured { requested: String },
}

/// A category request resolved to concrete platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCategory {
    pub category: Category,
    pub platforms: Vec<String>,
    /// The request named an unknown category and was served from 热点.
    pub fell_back: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Filter {
    table: CategoryTable,
}

impl Filter {
    #[must_use]
    pub fn new(table: CategoryTable) -> Self {
        Self { table }
    }

    /// Resolves a category tag to its platforms.
    ///
    /// `None`, blank and unknown tags resolve to [`Category::Hot`]. A known
    /// category with no platforms also falls back to the hot set.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Misconfigured`] when the hot category itself
    /// has no platforms.
    pub fn resolve(&self, requested: Option<&str>) -> Result<ResolvedCategory, FilterError> {
        let category = requested.map_or(Category::Hot, Category::parse);
        let platforms = self.table.platforms(&category);
        if !platforms.is_empty() {
            return Ok(ResolvedCategory {
                category,
                platforms: platforms.to_vec(),
                fell_back: false,
            });
        }

        let hot = self.table.platforms(&Category::Hot);
        if hot.is_empty() {
            return Err(FilterError::Misconfigured {
                requested: requested.unwrap_or("热点").to_string(),
            });
        }
        Ok(ResolvedCategory {
            fell_back: category != Category::Hot,
            category: Category::Hot,
            platforms: hot.to_vec(),
        })
    }
}

/// Case-insensitive substring match of `keyword` against title and
/// description. A blank keyword matches everything.
#[must_use]
pub fn search(topics: Vec<Topic>, keyword: &str) -> Vec<Topic> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return topics;
    }
    topics
        .into_iter()
        .filter(|topic| {
            topic.title.to_lowercase().contains(&needle)
                || topic
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use hotspot_core::RawTopic;

    use super::*;

    fn topic(title: &str, description: Option<&str>) -> Topic {
        Topic::from_raw(
            "weibo",
            RawTopic {
                title: title.to_string(),
                description: description.map(str::to_string),
                ..RawTopic::default()
            },
            0,
        )
    }

    #[test]
    fn unknown_category_matches_hot() {
        let filter = Filter::default();
        let hot = filter.resolve(Some("热点")).unwrap();
        let unknown = filter.resolve(Some("不存在")).unwrap();
        assert_eq!(unknown.platforms, hot.platforms);
        assert!(unknown.fell_back);
        assert!(!hot.fell_back);
        assert_eq!(filter.resolve(None).unwrap().platforms, hot.platforms);
        assert_eq!(filter.resolve(Some("  ")).unwrap().platforms, hot.platforms);
    }

    #[test]
    fn empty_category_falls_back_to_hot() {
        let filter = Filter::new(CategoryTable::from_entries([
            (Category::Hot, vec!["weibo"]),
            (Category::Tech, vec![]),
        ]));
        let resolved = filter.resolve(Some("科技")).unwrap();
        assert_eq!(resolved.category, Category::Hot);
        assert_eq!(resolved.platforms, vec!["weibo"]);
    }

    #[test]
    fn missing_hot_set_is_misconfiguration() {
        let filter = Filter::new(CategoryTable::from_entries([(Category::Tech, vec!["36kr"])]));
        assert!(filter.resolve(Some("科技")).is_ok());
        let err = filter.resolve(Some("不存在")).unwrap_err();
        assert_eq!(
            err,
            FilterError::Misconfigured {
                requested: "不存在".into()
            }
        );
        assert!(filter.resolve(None).is_err());
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let topics = vec![
            topic("Rust 2024 released", None),
            topic("unrelated", Some("mentions RUST here")),
            topic("nothing", None),
        ];
        let found = search(topics, "rust");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn blank_keyword_keeps_everything() {
        let topics = vec![topic("a", None), topic("b", None)];
        assert_eq!(search(topics, "  ").len(), 2);
    }
}
