//! Core matching logic for redact
//!
//! This crate contains:
//! - Pattern catalog (the five fixed sensitive-data categories)
//! - Term registry (user supplied literal terms)
//! - Matcher (candidate collection and overlap resolution)
//! - Span, preview and result models shared by the other crates

pub mod catalog;
pub mod error;
pub mod matcher;
pub mod preview;
pub mod span;
pub mod terms;

pub use catalog::{Category, PatternDefinition, lookup, pattern};
pub use error::{CoreError, Result};
pub use matcher::{MatchConfig, find_matches};
pub use preview::{Preview, mask};
pub use span::{CategoryCounts, MatchSpan, RedactionResult, SpanLabel, category_counts};
pub use terms::{CustomTerm, TermRegistry, TermSet};
