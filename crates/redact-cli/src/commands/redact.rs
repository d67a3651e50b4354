use std::path::{Path, PathBuf};

use anyhow::Result;
use redact_config::Config;
use redact_engine::{RedactionEngine, RedactionReport};

use super::{RULE, redaction_style};
use crate::cli::{MatchArgs, OutputFormat};

pub async fn handle(
    input: &Path,
    output: Option<PathBuf>,
    matching: &MatchArgs,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    let match_config = matching.match_config(config)?;
    let output = output.unwrap_or_else(|| config.default_output_path(input));

    if format == OutputFormat::Text {
        println!("Processing: {}", input.display());
        matching.print_summary(config)?;
        println!("\nRedacting document...");
    }

    let engine = RedactionEngine::new(redaction_style(config));
    let report = engine.redact(input, &output, &match_config).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &RedactionReport) {
    println!("\n{}", RULE);
    println!("✓ REDACTION COMPLETE");
    println!("{}", RULE);
    println!("\nOutput file: {}", report.output.display());
    println!("Total redactions: {}", report.result.span_count);
    println!(
        "Redacted {}: {} of {}",
        report.format.unit_name(),
        report.units_redacted,
        report.units_total
    );

    if !report.result.category_counts.is_empty() {
        println!("\nBy category:");
        for (label, count) in &report.result.category_counts {
            println!("  • {}: {}", label.display_name(), count);
        }
    }
    println!("{}\n", RULE);
}
