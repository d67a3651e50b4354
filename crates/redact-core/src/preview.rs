//! Preview of what a scan would redact

use serde::{Deserialize, Serialize};

use crate::span::category_counts;
use crate::{CategoryCounts, MatchSpan, SpanLabel};

/// Scanned text together with the spans found in it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preview {
    pub text: String,
    pub spans: Vec<MatchSpan>,
    pub category_counts: CategoryCounts,
}

impl Preview {
    pub fn new(text: String, spans: Vec<MatchSpan>) -> Self {
        let category_counts = category_counts(&spans);
        Self {
            text,
            spans,
            category_counts,
        }
    }

    pub fn total(&self) -> usize {
        self.spans.len()
    }

    /// The text with every span wrapped in `open`/`close` markers
    pub fn highlighted(&self, open: &str, close: &str) -> String {
        let extra = self.spans.len() * (open.len() + close.len());
        let mut out = String::with_capacity(self.text.len() + extra);
        let mut last_end = 0;
        for span in &self.spans {
            out.push_str(&self.text[last_end..span.start]);
            out.push_str(open);
            out.push_str(&self.text[span.start..span.end]);
            out.push_str(close);
            last_end = span.end;
        }
        out.push_str(&self.text[last_end..]);
        out
    }

    /// Matched strings grouped by label, in first-seen order within a group
    pub fn grouped(&self) -> Vec<(SpanLabel, Vec<&str>)> {
        let mut groups: Vec<(SpanLabel, Vec<&str>)> = Vec::new();
        for span in &self.spans {
            match groups.iter_mut().find(|(label, _)| *label == span.label) {
                Some((_, items)) => items.push(span.text.as_str()),
                None => groups.push((span.label, vec![span.text.as_str()])),
            }
        }
        groups
    }
}

/// Replace every character covered by a span with `block`.
///
/// `spans` must be sorted and non-overlapping, as returned by
/// [`find_matches`](crate::find_matches).
pub fn mask(text: &str, spans: &[MatchSpan], block: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_end = 0;
    for span in spans {
        out.push_str(&text[last_end..span.start]);
        out.extend(std::iter::repeat_n(block, text[span.start..span.end].chars().count()));
        last_end = span.end;
    }
    out.push_str(&text[last_end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, MatchConfig, SpanLabel, find_matches};

    fn preview(text: &str) -> Preview {
        let spans = find_matches(text, &MatchConfig::all_categories());
        Preview::new(text.to_string(), spans)
    }

    #[test]
    fn test_highlighted_wraps_matches() {
        let p = preview("SSN 123-45-6789, mail a@b.com.");
        assert_eq!(p.highlighted("[", "]"), "SSN [123-45-6789], mail [a@b.com].");
    }

    #[test]
    fn test_no_matches_leaves_text_untouched() {
        let p = preview("nothing to see here");
        assert_eq!(p.total(), 0);
        assert_eq!(p.highlighted("<<", ">>"), "nothing to see here");
    }

    #[test]
    fn test_mask_counts_characters_not_bytes() {
        let text = "née: 123-45-6789";
        let spans = vec![
            MatchSpan::new(0, 4, SpanLabel::Custom, "née"),
            MatchSpan::new(6, 17, Category::Ssn.into(), "123-45-6789"),
        ];
        assert_eq!(mask(text, &spans, '█'), "███: ███████████");
    }

    #[test]
    fn test_grouped_by_label() {
        let p = preview("a@b.com 555-123-4567 c@d.org");
        let groups = p.grouped();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, SpanLabel::Category(Category::Email));
        assert_eq!(groups[0].1, vec!["a@b.com", "c@d.org"]);
        assert_eq!(p.category_counts[&SpanLabel::Category(Category::Phone)], 1);
    }
}
