//! Custom term registry
//!
//! Terms are literal strings matched case-insensitively. The active set is
//! an immutable snapshot behind an `Arc`; every update builds a new set and
//! swaps it in, so a snapshot handed to a scan never changes underneath it.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::{CoreError, Result};

/// A single literal term with its compiled case-insensitive matcher
#[derive(Debug, Clone)]
pub struct CustomTerm {
    text: String,
    folded: String,
    regex: Regex,
}

impl CustomTerm {
    /// Build a term from user input. Surrounding whitespace is trimmed.
    pub fn new(raw: &str) -> Result<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(CoreError::EmptyTerm);
        }

        let regex = RegexBuilder::new(&regex::escape(text))
            .case_insensitive(true)
            .build()
            .map_err(|source| CoreError::InvalidTerm {
                term: text.to_string(),
                source,
            })?;

        Ok(Self {
            text: text.to_string(),
            folded: text.to_lowercase(),
            regex,
        })
    }

    /// The term as first entered
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Ordered, case-insensitively de-duplicated set of custom terms
#[derive(Debug, Clone, Default)]
pub struct TermSet {
    terms: Vec<CustomTerm>,
}

impl TermSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a block of text lines.
    ///
    /// Each input is split on line breaks; blank lines are dropped silently
    /// and the first spelling of a duplicate wins.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for chunk in lines {
            for line in chunk.as_ref().lines() {
                match CustomTerm::new(line) {
                    Ok(term) => set.insert(term),
                    Err(CoreError::EmptyTerm) => {}
                    Err(e) => tracing::warn!("Skipping custom term: {}", e),
                }
            }
        }
        set
    }

    /// Copy of this set with one more term
    pub fn with_term(&self, raw: &str) -> Result<Self> {
        let term = CustomTerm::new(raw)?;
        let mut set = self.clone();
        set.insert(term);
        Ok(set)
    }

    fn insert(&mut self, term: CustomTerm) {
        if !self.terms.iter().any(|t| t.folded == term.folded) {
            self.terms.push(term);
        }
    }

    pub fn contains(&self, text: &str) -> bool {
        let folded = text.trim().to_lowercase();
        self.terms.iter().any(|t| t.folded == folded)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomTerm> {
        self.terms.iter()
    }

    /// Display spellings, in insertion order
    pub fn texts(&self) -> Vec<&str> {
        self.terms.iter().map(|t| t.text()).collect()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Holder of the active custom-term set for a session
#[derive(Debug, Clone, Default)]
pub struct TermRegistry {
    active: Arc<TermSet>,
}

impl TermRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active set with the terms found in `lines`
    pub fn update_terms<I, S>(&mut self, lines: I) -> Arc<TermSet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.active = Arc::new(TermSet::from_lines(lines));
        tracing::debug!("Updated {} custom terms", self.active.len());
        Arc::clone(&self.active)
    }

    /// Add a single term to the active set
    pub fn add_term(&mut self, raw: &str) -> Result<()> {
        self.active = Arc::new(self.active.with_term(raw)?);
        Ok(())
    }

    /// Snapshot of the active set
    pub fn terms(&self) -> Arc<TermSet> {
        Arc::clone(&self.active)
    }

    pub fn clear(&mut self) {
        self.active = Arc::new(TermSet::new());
    }
}
