use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown filter tag: {0}")]
pub struct FilterTagError(pub String);

/// Criteria a question can be selected by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterTag {
    All,
    Marked,
    Incorrect,
    Unanswered,
}

impl FilterTag {
    pub const SPECIFIC: [FilterTag; 3] = [FilterTag::Marked, FilterTag::Incorrect, FilterTag::Unanswered];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FilterTag::All => "all",
            FilterTag::Marked => "marked",
            FilterTag::Incorrect => "incorrect",
            FilterTag::Unanswered => "unanswered",
        }
    }

    #[must_use]
    pub fn is_specific(self) -> bool {
        self != FilterTag::All
    }
}

impl fmt::Display for FilterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterTag {
    type Err = FilterTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FilterTag::All),
            "marked" => Ok(FilterTag::Marked),
            "incorrect" => Ok(FilterTag::Incorrect),
            "unanswered" => Ok(FilterTag::Unanswered),
            other => Err(FilterTagError(other.to_owned())),
        }
    }
}

/// Active filter tags, always non-empty.
///
/// Either exactly `{all}`, or one or more specific tags. Building from any tag
/// collection normalizes: specific tags win over `all`, and nothing at all
/// means `all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    tags: BTreeSet<FilterTag>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::all()
    }
}

impl FilterState {
    #[must_use]
    pub fn all() -> Self {
        Self {
            tags: BTreeSet::from([FilterTag::All]),
        }
    }

    #[must_use]
    pub fn new(tags: impl IntoIterator<Item = FilterTag>) -> Self {
        let specific: BTreeSet<FilterTag> = tags.into_iter().filter(|t| t.is_specific()).collect();
        if specific.is_empty() {
            Self::all()
        } else {
            Self { tags: specific }
        }
    }

    /// True when the whole base ordering is visible.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.tags.contains(&FilterTag::All)
    }

    #[must_use]
    pub fn contains(&self, tag: FilterTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = FilterTag> + '_ {
        self.tags.iter().copied()
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.tags.iter().map(|t| t.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}
