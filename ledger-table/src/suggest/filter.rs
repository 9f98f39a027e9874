//! Fuzzy filtering of suggestion labels using nucleo-matcher.

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

/// A label that matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterMatch {
    /// Index into the option list.
    pub index: usize,
    pub score: u32,
    /// The label starts with the query, ignoring case.
    pub is_prefix: bool,
}

/// Filter `items` by `query`, best match first.
///
/// Labels that start with the query rank above other fuzzy matches. An empty
/// query keeps every item in its original order; ties keep it too.
pub fn fuzzy_filter(query: &str, items: &[String]) -> Vec<FilterMatch> {
    let query = query.trim();
    if query.is_empty() {
        return (0..items.len())
            .map(|index| FilterMatch {
                index,
                score: 0,
                is_prefix: true,
            })
            .collect();
    }

    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::new(
        query,
        CaseMatching::Ignore,
        Normalization::Smart,
        AtomKind::Fuzzy,
    );

    let lowered = query.to_lowercase();
    let mut buf = Vec::new();
    let mut matches: Vec<FilterMatch> = items
        .iter()
        .enumerate()
        .filter_map(|(index, label)| {
            let haystack = Utf32Str::new(label, &mut buf);
            pattern
                .score(haystack, &mut matcher)
                .map(|score| FilterMatch {
                    index,
                    score,
                    is_prefix: label.to_lowercase().starts_with(&lowered),
                })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.is_prefix
            .cmp(&a.is_prefix)
            .then_with(|| b.score.cmp(&a.score))
    });
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_query_keeps_everything() {
        let items = labels(&["Oil change", "Tyre rotation"]);
        let matches = fuzzy_filter("  ", &items);
        assert_eq!(matches.iter().map(|m| m.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn non_matching_items_are_dropped() {
        let items = labels(&["Oil change", "Tyre rotation", "Oil filter"]);
        let matches = fuzzy_filter("oil", &items);
        let mut indices: Vec<_> = matches.iter().map(|m| m.index).collect();
        indices.sort();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn prefix_matches_rank_first() {
        let items = labels(&["Brake fluid flush", "Coolant flush", "Flush engine"]);
        let matches = fuzzy_filter("FLUSH", &items);
        assert_eq!(matches[0].index, 2);
        assert!(matches[0].is_prefix);
        assert!(matches[1..].iter().all(|m| !m.is_prefix));
    }
}
