//! Category tags and the category → platform table.

use std::collections::HashMap;

/// A topic category.
///
/// Anything that is not one of the known tags parses to
/// [`Category::Unknown`]; resolution treats unknown categories as
/// [`Category::Hot`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Hot,
    Tech,
    Finance,
    Entertainment,
    Sports,
    Community,
    Game,
    Reading,
    News,
    Unknown(String),
}

impl Category {
    pub const KNOWN: [Category; 9] = [
        Category::Hot,
        Category::Tech,
        Category::Finance,
        Category::Entertainment,
        Category::Sports,
        Category::Community,
        Category::Game,
        Category::Reading,
        Category::News,
    ];

    /// Parses a category tag. Both the Chinese tag and an English alias are
    /// accepted; surrounding whitespace is ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "热点" | "hot" => Category::Hot,
            "科技" | "tech" => Category::Tech,
            "财经" | "finance" => Category::Finance,
            "娱乐" | "entertainment" => Category::Entertainment,
            "体育" | "sports" => Category::Sports,
            "社区" | "community" => Category::Community,
            "游戏" | "game" => Category::Game,
            "阅读" | "reading" => Category::Reading,
            "新闻" | "news" => Category::News,
            _ => Category::Unknown(raw.trim().to_string()),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Category::Hot => "热点",
            Category::Tech => "科技",
            Category::Finance => "财经",
            Category::Entertainment => "娱乐",
            Category::Sports => "体育",
            Category::Community => "社区",
            Category::Game => "游戏",
            Category::Reading => "阅读",
            Category::News => "新闻",
            Category::Unknown(raw) => raw,
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Category::Unknown(_))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn builtin_platforms(category: &Category) -> &'static [&'static str] {
    match category {
        Category::Hot => &[
            "weibo", "zhihu", "baidu", "douyin", "toutiao", "bilibili", "kuaishou",
        ],
        Category::Tech => &[
            "36kr",
            "ithome",
            "sspai",
            "juejin",
            "csdn",
            "51cto",
            "v2ex",
            "hellogithub",
            "ifanr",
            "huxiu",
            "hackernews",
        ],
        Category::Finance => &["36kr", "huxiu", "sina", "thepaper", "netease-news"],
        Category::Entertainment => &[
            "weibo",
            "douyin",
            "bilibili",
            "douban-movie",
            "kuaishou",
            "acfun",
        ],
        Category::Sports => &["hupu", "sina-news", "qq-news"],
        Category::Community => &[
            "tieba",
            "douban-group",
            "v2ex",
            "ngabbs",
            "hupu",
            "zhihu",
            "coolapk",
        ],
        Category::Game => &["genshin", "miyoushe", "lol", "ngabbs", "bilibili"],
        Category::Reading => &["weread", "jianshu", "guokr", "zhihu-daily"],
        Category::News => &[
            "thepaper",
            "qq-news",
            "netease-news",
            "sina-news",
            "toutiao",
            "nytimes",
        ],
        Category::Unknown(_) => &[],
    }
}

/// Maps each known category to its member platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    entries: HashMap<Category, Vec<String>>,
}

impl CategoryTable {
    /// The compiled-in table.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = Category::KNOWN
            .into_iter()
            .map(|category| {
                let platforms = builtin_platforms(&category)
                    .iter()
                    .map(|p| (*p).to_string())
                    .collect();
                (category, platforms)
            })
            .collect();
        Self { entries }
    }

    /// Builds a table from explicit entries. Entries for
    /// [`Category::Unknown`] are ignored.
    #[must_use]
    pub fn from_entries<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Category, P)>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let entries = entries
            .into_iter()
            .filter(|(category, _)| !category.is_unknown())
            .map(|(category, platforms)| {
                (category, platforms.into_iter().map(Into::into).collect())
            })
            .collect();
        Self { entries }
    }

    /// Platforms configured for `category`, empty if none.
    #[must_use]
    pub fn platforms(&self, category: &Category) -> &[String] {
        self.entries.get(category).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_chinese_and_english_tags() {
        assert_eq!(Category::parse("热点"), Category::Hot);
        assert_eq!(Category::parse(" Tech "), Category::Tech);
        assert_eq!(Category::parse("新闻"), Category::News);
    }

    #[test]
    fn parse_unknown_keeps_raw_text() {
        assert_eq!(
            Category::parse("不存在"),
            Category::Unknown("不存在".to_string())
        );
        assert!(Category::parse("").is_unknown());
    }

    #[test]
    fn every_known_category_has_builtin_platforms() {
        let table = CategoryTable::builtin();
        for category in Category::KNOWN {
            assert!(
                !table.platforms(&category).is_empty(),
                "{category} has no platforms"
            );
        }
    }

    #[test]
    fn from_entries_drops_unknown_categories() {
        let table = CategoryTable::from_entries([
            (Category::Unknown("x".into()), vec!["a"]),
            (Category::Tech, vec!["b"]),
        ]);
        assert!(table.platforms(&Category::Unknown("x".into())).is_empty());
        assert_eq!(table.platforms(&Category::Tech), ["b".to_string()]);
        assert!(table.platforms(&Category::Hot).is_empty());
    }
}
