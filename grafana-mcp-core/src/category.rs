//! Category Gate
//!
//! Tools are grouped into coarse categories purely so operators can switch
//! whole groups off. The category is never stored on a tool; it is derived
//! from the tool name by a fixed, ordered rule table.
//!
//! | # | rule                         | category     |
//! |---|------------------------------|--------------|
//! | 1 | starts with `search_`        | `search`     |
//! | 2 | contains `dashboard`         | `dashboard`  |
//! | 3 | contains `datasource`        | `datasource` |
//! | 4 | contains `prometheus`        | `prometheus` |
//! | 5 | contains `loki`              | `loki`       |
//! | 6 | contains `incident`          | `incident`   |
//! | 7 | contains `alert`             | `alerting`   |
//! | 8 | contains `oncall`            | `oncall`     |
//! | 9 | contains `sift`              | `sift`       |
//! |10 | contains `pyroscope`         | `pyroscope`  |
//! |11 | contains `deeplink`          | `navigation` |
//! |12 | contains `assertion`         | `asserts`    |
//! |13 | contains `team` or `user`    | `admin`      |
//!
//! First match wins. Names matching nothing have no category and are never
//! gated off.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A coarse grouping of tools used for enable/disable gating
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Search,
    Dashboard,
    Datasource,
    Prometheus,
    Loki,
    Incident,
    Alerting,
    Oncall,
    Sift,
    Pyroscope,
    Navigation,
    Asserts,
    Admin,
}

/// Set of enabled categories
pub type CategorySet = BTreeSet<Category>;

impl Category {
    /// Every category, in rule-table order
    pub const ALL: [Category; 13] = [
        Category::Search,
        Category::Dashboard,
        Category::Datasource,
        Category::Prometheus,
        Category::Loki,
        Category::Incident,
        Category::Alerting,
        Category::Oncall,
        Category::Sift,
        Category::Pyroscope,
        Category::Navigation,
        Category::Asserts,
        Category::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Search => "search",
            Category::Dashboard => "dashboard",
            Category::Datasource => "datasource",
            Category::Prometheus => "prometheus",
            Category::Loki => "loki",
            Category::Incident => "incident",
            Category::Alerting => "alerting",
            Category::Oncall => "oncall",
            Category::Sift => "sift",
            Category::Pyroscope => "pyroscope",
            Category::Navigation => "navigation",
            Category::Asserts => "asserts",
            Category::Admin => "admin",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
    }
}

/// How a rule matches a tool name
enum Matcher {
    Prefix(&'static str),
    Contains(&'static [&'static str]),
}

impl Matcher {
    fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Prefix(prefix) => name.starts_with(prefix),
            Matcher::Contains(needles) => needles.iter().any(|n| name.contains(n)),
        }
    }
}

/// Rule table, checked top to bottom
const RULES: &[(Matcher, Category)] = &[
    (Matcher::Prefix("search_"), Category::Search),
    (Matcher::Contains(&["dashboard"]), Category::Dashboard),
    (Matcher::Contains(&["datasource"]), Category::Datasource),
    (Matcher::Contains(&["prometheus"]), Category::Prometheus),
    (Matcher::Contains(&["loki"]), Category::Loki),
    (Matcher::Contains(&["incident"]), Category::Incident),
    (Matcher::Contains(&["alert"]), Category::Alerting),
    (Matcher::Contains(&["oncall"]), Category::Oncall),
    (Matcher::Contains(&["sift"]), Category::Sift),
    (Matcher::Contains(&["pyroscope"]), Category::Pyroscope),
    (Matcher::Contains(&["deeplink"]), Category::Navigation),
    (Matcher::Contains(&["assertion"]), Category::Asserts),
    (Matcher::Contains(&["team", "user"]), Category::Admin),
];

/// Derive the category of a tool from its name
pub fn category_of(name: &str) -> Option<Category> {
    RULES
        .iter()
        .find(|(matcher, _)| matcher.matches(name))
        .map(|(_, category)| *category)
}

/// Whether a tool may be listed and called under the given enabled set
///
/// Uncategorised names are always allowed through.
pub fn is_enabled(name: &str, enabled: &CategorySet) -> bool {
    match category_of(name) {
        Some(category) => enabled.contains(&category),
        None => true,
    }
}

/// Every category enabled
pub fn all_categories() -> CategorySet {
    Category::ALL.iter().copied().collect()
}
