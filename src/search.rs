//! Fuzzy filtering for selector options.
//!
//! Selector widgets narrow their lists as the user types. This wraps the
//! underlying fuzzy matching implementation so it can be swapped without
//! touching the widgets.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::model::SelectorOption;

/// A matcher for fuzzy-filtering selector options.
pub struct Matcher {
    inner: SkimMatcherV2,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: SkimMatcherV2::default(),
        }
    }

    /// Best match score of an option against the pattern, over both its
    /// label and its value. `None` when neither matches.
    #[must_use]
    pub fn score(&self, option: &SelectorOption, pattern: &str) -> Option<i64> {
        let pattern = pattern.to_lowercase();
        let by_label = self.inner.fuzzy_match(&option.label, &pattern);
        let by_value = self.inner.fuzzy_match(&option.value, &pattern);
        by_label.max(by_value)
    }

    /// Filter options down to those matching the pattern, best matches
    /// first. An empty pattern keeps the list as-is.
    #[must_use]
    pub fn filter(&self, options: &[SelectorOption], pattern: &str) -> Vec<SelectorOption> {
        if pattern.is_empty() {
            return options.to_vec();
        }

        let mut scored: Vec<(i64, &SelectorOption)> = options
            .iter()
            .filter_map(|option| self.score(option, pattern).map(|score| (score, option)))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, option)| option.clone()).collect()
    }
}
