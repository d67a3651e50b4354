use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "redact")]
#[command(about = "Redact sensitive information from PDF and Word documents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: config.toml in the platform config directory)
    #[arg(long, global = true, env = "REDACT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what would be redacted, without writing anything
    Preview {
        /// Input PDF or Word document
        input: PathBuf,

        #[command(flatten)]
        matching: MatchArgs,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,

        /// Print the document text with matches marked
        #[arg(long)]
        highlight: bool,
    },

    /// Write a redacted copy of a document
    Redact {
        /// Input PDF or Word document
        input: PathBuf,

        /// Output path (default: <input>_redacted.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        matching: MatchArgs,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Find sensitive text in a string or stdin
    Scan {
        /// Text to scan (default: read stdin)
        #[arg(long)]
        text: Option<String>,

        #[command(flatten)]
        matching: MatchArgs,

        /// Print the text with matches replaced by block characters
        #[arg(long)]
        mask: bool,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// List the built-in categories
    Categories {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

/// What to look for
#[derive(Args, Debug, Clone, Default)]
pub struct MatchArgs {
    /// Categories to redact, comma separated or repeated: ssn, email, phone, creditcard, date, all
    #[arg(short = 'c', long = "categories", value_delimiter = ',')]
    pub categories: Vec<String>,

    /// Custom term or name to redact; repeat for more
    #[arg(long)]
    pub custom: Vec<String>,

    /// File with one custom term per line
    #[arg(long)]
    pub terms_file: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_redact() {
        let cli = Cli::parse_from([
            "redact", "redact", "memo.docx", "-o", "out.docx", "-c", "ssn,email", "--custom",
            "John Doe", "--custom", "Acme", "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Redact {
                input,
                output,
                matching,
                format,
            } => {
                assert_eq!(input, PathBuf::from("memo.docx"));
                assert_eq!(output, Some(PathBuf::from("out.docx")));
                assert_eq!(matching.categories, vec!["ssn", "email"]);
                assert_eq!(matching.custom, vec!["John Doe", "Acme"]);
                assert_eq!(format, OutputFormat::Text);
            }
            _ => panic!("expected redact"),
        }
    }

    #[test]
    fn test_categories_accept_commas() {
        let cli = Cli::parse_from(["redact", "preview", "a.pdf", "-c", "phone,date", "--format", "json"]);
        match cli.command {
            Commands::Preview { matching, format, .. } => {
                assert_eq!(matching.categories, vec!["phone", "date"]);
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected preview"),
        }
    }

    #[test]
    fn test_options_before_input() {
        let cli = Cli::parse_from([
            "redact", "redact", "-c", "ssn", "-c", "phone", "--custom", "Jane", "memo.docx",
        ]);
        match cli.command {
            Commands::Redact { input, matching, .. } => {
                assert_eq!(input, PathBuf::from("memo.docx"));
                assert_eq!(matching.categories, vec!["ssn", "phone"]);
                assert_eq!(matching.custom, vec!["Jane"]);
            }
            _ => panic!("expected redact"),
        }
    }
}
