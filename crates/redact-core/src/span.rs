//! Match spans and redaction summaries

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Category, CoreError};

/// What produced a span: a catalog category or a custom term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpanLabel {
    Category(Category),
    Custom,
}

impl SpanLabel {
    /// Human-readable name, e.g. "Email Addresses" or "Custom Terms"
    pub fn display_name(&self) -> &'static str {
        match self {
            SpanLabel::Category(category) => category.definition().name,
            SpanLabel::Custom => "Custom Terms",
        }
    }
}

impl From<Category> for SpanLabel {
    fn from(category: Category) -> Self {
        SpanLabel::Category(category)
    }
}

impl fmt::Display for SpanLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanLabel::Category(category) => f.write_str(category.key()),
            SpanLabel::Custom => f.write_str("custom"),
        }
    }
}

impl FromStr for SpanLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("custom") {
            Ok(SpanLabel::Custom)
        } else {
            s.parse().map(SpanLabel::Category)
        }
    }
}

// Labels are map keys in JSON output, so they serialize as plain strings.
impl Serialize for SpanLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpanLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A half-open `[start, end)` byte range of scanned text identified as sensitive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    pub label: SpanLabel,
    pub text: String,
}

impl MatchSpan {
    pub fn new(start: usize, end: usize, label: SpanLabel, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label,
            text: text.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn overlaps(&self, other: &MatchSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

pub type CategoryCounts = BTreeMap<SpanLabel, usize>;

/// Count spans per label
pub fn category_counts(spans: &[MatchSpan]) -> CategoryCounts {
    let mut counts = CategoryCounts::new();
    for span in spans {
        *counts.entry(span.label).or_insert(0) += 1;
    }
    counts
}

/// Summary handed back to the caller after a redaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionResult {
    pub span_count: usize,
    pub category_counts: CategoryCounts,
}

impl RedactionResult {
    pub fn from_spans(spans: &[MatchSpan]) -> Self {
        Self {
            span_count: spans.len(),
            category_counts: category_counts(spans),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlaps_is_half_open() {
        let a = MatchSpan::new(0, 5, SpanLabel::Custom, "hello");
        let b = MatchSpan::new(5, 8, SpanLabel::Custom, "abc");
        let c = MatchSpan::new(4, 6, SpanLabel::Custom, "oa");
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_label_parse_and_display() {
        assert_eq!("custom".parse::<SpanLabel>().unwrap(), SpanLabel::Custom);
        assert_eq!(
            "email".parse::<SpanLabel>().unwrap(),
            SpanLabel::Category(Category::Email)
        );
        assert_eq!(SpanLabel::Category(Category::CreditCard).to_string(), "creditcard");
        assert_eq!(SpanLabel::Custom.display_name(), "Custom Terms");
    }

    #[test]
    fn test_result_counts_serialize_as_string_keys() {
        let spans = vec![
            MatchSpan::new(0, 3, SpanLabel::Custom, "bob"),
            MatchSpan::new(4, 15, Category::Ssn.into(), "123-45-6789"),
            MatchSpan::new(16, 19, SpanLabel::Custom, "Bob"),
        ];
        let result = RedactionResult::from_spans(&spans);
        assert_eq!(result.span_count, 3);
        assert_eq!(result.category_counts[&SpanLabel::Custom], 2);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["category_counts"]["custom"], 2);
        assert_eq!(json["category_counts"]["ssn"], 1);

        let parsed: RedactionResult = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, result);
    }
}
