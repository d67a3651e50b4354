use anyhow::{Context, Result};
use redact_config::Config;
use redact_core::{MatchSpan, find_matches, mask};
use tokio::io::AsyncReadExt;

use crate::cli::{MatchArgs, OutputFormat};

pub async fn handle(
    text: Option<String>,
    matching: &MatchArgs,
    masked: bool,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let match_config = matching.match_config(config)?;
    let spans = find_matches(&text, &match_config);
    tracing::info!("Scanned {} bytes: {} matches", text.len(), spans.len());

    if masked {
        print!("{}", mask(&text, &spans, config.block_char));
        if !text.ends_with('\n') {
            println!();
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&spans)?),
        OutputFormat::Text => print_spans(&spans),
    }
    Ok(())
}

fn print_spans(spans: &[MatchSpan]) {
    if spans.is_empty() {
        println!("No sensitive information found.");
        return;
    }
    for span in spans {
        println!("{:>6}..{:<6} {:<10} {}", span.start, span.end, span.label.to_string(), span.text);
    }
    println!("\nTotal: {} matches", spans.len());
}
