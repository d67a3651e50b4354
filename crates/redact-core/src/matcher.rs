//! Matcher: collects candidate spans and resolves overlaps

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::catalog::pattern;
use crate::{Category, MatchSpan, SpanLabel, TermSet};

/// Everything a scan needs, passed in explicitly on every call
#[derive(Debug, Clone, Default)]
pub struct MatchConfig {
    pub categories: BTreeSet<Category>,
    pub terms: Arc<TermSet>,
}

impl MatchConfig {
    pub fn new(categories: impl IntoIterator<Item = Category>, terms: Arc<TermSet>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            terms,
        }
    }

    /// All five categories, no custom terms
    pub fn all_categories() -> Self {
        Self::new(Category::ALL, Arc::new(TermSet::new()))
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.terms.is_empty()
    }
}

/// Find sensitive spans in `text`.
///
/// The result is sorted by `start` and contains no overlapping spans.
/// Offsets are UTF-8 byte offsets into `text`.
pub fn find_matches(text: &str, config: &MatchConfig) -> Vec<MatchSpan> {
    if text.is_empty() || config.is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::new();

    // BTreeSet iteration follows catalog order
    for &category in &config.categories {
        for regex in pattern(category).regexes() {
            candidates.extend(
                regex
                    .find_iter(text)
                    .filter(|m| !m.is_empty())
                    .map(|m| MatchSpan::new(m.start(), m.end(), category.into(), m.as_str())),
            );
        }
    }

    for term in config.terms.iter() {
        candidates.extend(
            term.regex()
                .find_iter(text)
                .map(|m| MatchSpan::new(m.start(), m.end(), SpanLabel::Custom, m.as_str())),
        );
    }

    let spans = resolve_overlaps(candidates);
    tracing::debug!(
        "Found {} spans in {} bytes ({} categories, {} terms)",
        spans.len(),
        text.len(),
        config.categories.len(),
        config.terms.len()
    );
    spans
}

/// Earliest start wins; on equal starts the longer span wins; remaining
/// ties keep collection order. A candidate overlapping a kept span is dropped.
pub fn resolve_overlaps(mut candidates: Vec<MatchSpan>) -> Vec<MatchSpan> {
    // sort_by is stable, which keeps collection order for full ties
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.len().cmp(&a.len())));

    let mut kept: Vec<MatchSpan> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        // Kept spans are sorted and disjoint, so the last one has the largest end
        if kept.last().is_none_or(|last| candidate.start >= last.end) {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TermRegistry;

    fn config(categories: &[Category], terms: &[&str]) -> MatchConfig {
        let mut registry = TermRegistry::new();
        MatchConfig::new(categories.iter().copied(), registry.update_terms(terms))
    }

    #[test]
    fn test_contact_scenario() {
        let text = "Contact John Doe at john.doe@example.com or 555-123-4567.";
        let spans = find_matches(
            text,
            &config(&[Category::Email, Category::Phone], &["John Doe"]),
        );

        let found: Vec<_> = spans.iter().map(|s| (s.text.as_str(), s.label)).collect();
        assert_eq!(
            found,
            vec![
                ("John Doe", SpanLabel::Custom),
                ("john.doe@example.com", SpanLabel::Category(Category::Email)),
                ("555-123-4567", SpanLabel::Category(Category::Phone)),
            ]
        );
        for span in &spans {
            assert_eq!(&text[span.start..span.end], span.text);
        }
    }

    #[test]
    fn test_longer_custom_term_wins_over_contained_ssn() {
        let text = "Record: 123-45-6789 extra notes";
        let spans = find_matches(text, &config(&[Category::Ssn], &["123-45-6789 extra"]));

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "123-45-6789 extra");
        assert_eq!(spans[0].label, SpanLabel::Custom);
    }

    #[test]
    fn test_equal_spans_keep_catalog_order() {
        // "123456789" is both a bare SSN and a custom term of equal length
        let text = "id 123456789";
        let spans = find_matches(text, &config(&[Category::Ssn], &["123456789"]));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].label, SpanLabel::Category(Category::Ssn));
    }

    #[test]
    fn test_custom_terms_are_case_insensitive() {
        let text = "ACME corp bought Acme Corp.";
        let spans = find_matches(text, &config(&[], &["acme CORP"]));
        let texts: Vec<_> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["ACME corp", "Acme Corp"]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(find_matches("", &MatchConfig::all_categories()).is_empty());
        assert!(find_matches("SSN 123-45-6789", &MatchConfig::default()).is_empty());
    }

    #[test]
    fn test_disabled_category_is_ignored() {
        let text = "mail a@b.co, ssn 123-45-6789";
        let spans = find_matches(text, &config(&[Category::Ssn], &[]));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "123-45-6789");
    }

    #[test]
    fn test_offsets_are_byte_offsets() {
        let text = "Zoë → 123-45-6789";
        let spans = find_matches(text, &config(&[Category::Ssn], &["zoë"]));
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].start..spans[0].end], "Zoë");
        assert_eq!(&text[spans[1].start..spans[1].end], "123-45-6789");
    }

    #[test]
    fn test_resolve_overlaps_policy() {
        let spans = resolve_overlaps(vec![
            MatchSpan::new(5, 9, SpanLabel::Custom, "b"),
            MatchSpan::new(0, 4, SpanLabel::Custom, "a"),
            MatchSpan::new(0, 6, SpanLabel::Custom, "long"),
            MatchSpan::new(6, 7, SpanLabel::Custom, "c"),
            MatchSpan::new(8, 10, SpanLabel::Custom, "d"),
        ]);
        let ranges: Vec<_> = spans.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(ranges, vec![(0, 6), (6, 7), (8, 10)]);
    }

    #[test]
    fn test_find_matches_is_idempotent() {
        let text = "Jane, 01/02/2023, 4111 1111 1111 1111, jane@corp.io, (555) 123-4567";
        let cfg = config(&Category::ALL, &["jane"]);
        assert_eq!(find_matches(text, &cfg), find_matches(text, &cfg));
    }
}
