use anyhow::Result;
use redact_core::{Category, pattern};
use serde_json::json;

use crate::cli::OutputFormat;

pub fn handle(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = Category::ALL
                .iter()
                .map(|&category| {
                    let definition = pattern(category);
                    json!({
                        "key": category.key(),
                        "name": definition.name,
                        "description": definition.description,
                        "expressions": definition.expressions,
                        "examples": definition.examples,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            println!("Categories:");
            for category in Category::ALL {
                let definition = pattern(category);
                println!("  {:<11} {}", category.key(), definition.name);
                println!("              {}", definition.description);
                println!("              e.g. {}", definition.examples.join(", "));
            }
            println!("\nUse -c all (or omit -c) for the configured defaults.");
        }
    }
    Ok(())
}
