//! Pattern catalog for the fixed sensitive-data categories

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::{CoreError, Result};

/// A fixed class of sensitive data, in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Ssn,
    Email,
    Phone,
    CreditCard,
    Date,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Ssn,
        Category::Email,
        Category::Phone,
        Category::CreditCard,
        Category::Date,
    ];

    /// Short key used on the command line and in config files
    pub fn key(self) -> &'static str {
        match self {
            Category::Ssn => "ssn",
            Category::Email => "email",
            Category::Phone => "phone",
            Category::CreditCard => "creditcard",
            Category::Date => "date",
        }
    }

    pub fn definition(self) -> &'static PatternDefinition {
        &PATTERNS[self as usize]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssn" => Ok(Category::Ssn),
            "email" => Ok(Category::Email),
            "phone" => Ok(Category::Phone),
            "creditcard" | "credit-card" | "credit_card" => Ok(Category::CreditCard),
            "date" => Ok(Category::Date),
            _ => Err(CoreError::UnknownCategory(s.to_string())),
        }
    }
}

/// Regular-expression definition for one category
#[derive(Debug)]
pub struct PatternDefinition {
    pub category: Category,
    pub name: &'static str,
    pub description: &'static str,
    /// Expressions are matched case-insensitively, each one independently
    pub expressions: &'static [&'static str],
    pub examples: &'static [&'static str],
}

impl PatternDefinition {
    /// Compiled form of `expressions`, built once per process
    pub fn regexes(&self) -> &'static [Regex] {
        &COMPILED[self.category as usize]
    }

    /// All expressions joined into a single alternation, for display
    pub fn expression(&self) -> String {
        self.expressions
            .iter()
            .map(|e| format!("(?:{})", e))
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Catalog entry for a category
pub fn pattern(category: Category) -> &'static PatternDefinition {
    category.definition()
}

/// Catalog entry for a category key such as `"ssn"` or `"creditcard"`
pub fn lookup(key: &str) -> Result<&'static PatternDefinition> {
    key.parse::<Category>().map(pattern)
}

/// Indexed by `Category as usize`
pub static PATTERNS: [PatternDefinition; 5] = [
    PatternDefinition {
        category: Category::Ssn,
        name: "Social Security Numbers",
        description: "US Social Security Numbers (XXX-XX-XXXX format)",
        expressions: &[r"\b\d{3}-\d{2}-\d{4}\b", r"\b\d{9}\b"],
        examples: &["123-45-6789"],
    },
    PatternDefinition {
        category: Category::Email,
        name: "Email Addresses",
        description: "Email addresses",
        expressions: &[r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"],
        examples: &["example@email.com", "john.doe@example.com"],
    },
    PatternDefinition {
        category: Category::Phone,
        name: "Phone Numbers",
        description: "US phone numbers in various formats",
        expressions: &[
            r"(?:\+1[-.\s]?|\b1[-.\s]?)?\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b",
            r"(?:\+1[-.\s]?|\b1[-.\s]?)?\(\d{3}\)\s*\d{3}[-.\s]?\d{4}\b",
        ],
        examples: &["555-123-4567", "(555) 123-4567", "+1 555.123.4567"],
    },
    PatternDefinition {
        category: Category::CreditCard,
        name: "Credit Card Numbers",
        description: "Credit card numbers (13-19 digits)",
        expressions: &[
            r"\b(?:\d{4}[-\s]?){3}\d{4}(?:[-\s]?\d{1,3})?\b",
            r"\b(?:\d{4}[-\s]?){3}\d{1,3}\b",
        ],
        examples: &["4111-1111-1111-1111", "4111 1111 1111 1111", "4111111111111"],
    },
    PatternDefinition {
        category: Category::Date,
        name: "Dates",
        description: "Dates in various formats",
        expressions: &[
            r"\b\d{1,2}/\d{1,2}/\d{2,4}\b",
            r"\b\d{1,2}-\d{1,2}-\d{2,4}\b",
            r"\b\d{4}-\d{1,2}-\d{1,2}\b",
            r"\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}\b",
            r"\b\d{1,2}(?:st|nd|rd|th)?\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+\d{4}\b",
        ],
        examples: &["01/15/2024", "1-15-24", "2024-01-15", "January 15, 2024", "15 Jan 2024"],
    },
];

static COMPILED: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    PATTERNS
        .iter()
        .map(|definition| {
            definition
                .expressions
                .iter()
                .map(|expression| {
                    RegexBuilder::new(expression)
                        .case_insensitive(true)
                        .build()
                        .expect("built-in pattern must compile")
                })
                .collect()
        })
        .collect()
});
