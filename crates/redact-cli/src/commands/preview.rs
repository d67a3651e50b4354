use std::path::Path;

use anyhow::Result;
use redact_config::Config;
use redact_core::Preview;
use redact_engine::RedactionEngine;

use super::{RULE, redaction_style};
use crate::cli::{MatchArgs, OutputFormat};

pub async fn handle(
    input: &Path,
    matching: &MatchArgs,
    format: OutputFormat,
    highlight: bool,
    config: &Config,
) -> Result<()> {
    let match_config = matching.match_config(config)?;
    let engine = RedactionEngine::new(redaction_style(config));
    let preview = engine.preview(input, &match_config).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        OutputFormat::Text => {
            println!("Processing: {}", input.display());
            matching.print_summary(config)?;
            print_preview(&preview, highlight);
        }
    }

    Ok(())
}

fn print_preview(preview: &Preview, highlight: bool) {
    println!("\n{}", RULE);
    println!("PREVIEW: Items that will be redacted");
    println!("{}\n", RULE);

    if preview.spans.is_empty() {
        println!("No sensitive information found.");
        return;
    }

    for (label, items) in preview.grouped() {
        println!("{}:", label.display_name());
        for item in items {
            println!("  • {}", item);
        }
        println!();
    }

    if highlight {
        println!("{}", preview.highlighted("[[", "]]"));
        println!();
    }

    println!("{}", RULE);
    println!("Total: {} items to redact", preview.total());
    println!("{}", RULE);
}
