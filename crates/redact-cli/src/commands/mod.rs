pub mod categories;
pub mod completions;
pub mod preview;
pub mod redact;
pub mod scan;

use anyhow::{Context, Result};
use redact_config::Config;
use redact_core::{Category, MatchConfig, TermRegistry};
use redact_documents::RedactionStyle;

use crate::cli::MatchArgs;

pub const RULE: &str = "============================================================";

impl MatchArgs {
    /// Selected categories; none given or `all` means the configured defaults
    pub fn selected_categories(&self, config: &Config) -> Result<Vec<Category>> {
        if self.categories.is_empty() || self.categories.iter().any(|c| c.eq_ignore_ascii_case("all")) {
            return Ok(config.default_categories.clone());
        }

        let mut selected: Vec<Category> = Vec::with_capacity(self.categories.len());
        for key in &self.categories {
            let category: Category = key.parse()?;
            if !selected.contains(&category) {
                selected.push(category);
            }
        }
        Ok(selected)
    }

    /// Custom terms from `--custom` and `--terms-file`, as one term set
    pub fn term_registry(&self) -> Result<TermRegistry> {
        let mut lines = self.custom.clone();
        if let Some(path) = &self.terms_file {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read terms file {}", path.display()))?;
            lines.push(content);
        }

        let mut registry = TermRegistry::new();
        registry.update_terms(lines);
        Ok(registry)
    }

    pub fn match_config(&self, config: &Config) -> Result<MatchConfig> {
        let categories = self.selected_categories(config)?;
        let terms = self.term_registry()?.terms();
        Ok(MatchConfig::new(categories, terms))
    }

    /// The "Categories:" and "Custom terms:" header lines
    pub fn print_summary(&self, config: &Config) -> Result<()> {
        let categories = self.selected_categories(config)?;
        let keys: Vec<&str> = categories.iter().map(|c| c.key()).collect();
        println!("Categories: {}", keys.join(", "));

        let terms = self.term_registry()?.terms();
        if !terms.is_empty() {
            println!("Custom terms: {}", terms.texts().join(", "));
        }
        Ok(())
    }
}

pub fn redaction_style(config: &Config) -> RedactionStyle {
    RedactionStyle {
        block_char: config.block_char,
        fill_color: config.pdf.fill_color,
        glyph_width: config.pdf.glyph_width,
    }
}
