use anyhow::Context;
use redact_core::Category;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Defaults for redact, read from `config.toml`
///
/// The file is optional and never written back; per-run choices such as
/// categories and custom terms come from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_categories")]
    pub default_categories: Vec<Category>,

    #[serde(default = "default_block_char")]
    pub block_char: char,

    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    #[serde(default)]
    pub pdf: PdfConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// RGB fill of the redaction boxes, each component in 0.0..=1.0
    #[serde(default = "default_fill_color")]
    pub fill_color: [f32; 3],

    /// Estimated glyph advance as a fraction of the font size
    #[serde(default = "default_glyph_width")]
    pub glyph_width: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_categories: default_categories(),
            block_char: default_block_char(),
            output_suffix: default_output_suffix(),
            pdf: PdfConfig::default(),
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            fill_color: default_fill_color(),
            glyph_width: default_glyph_width(),
        }
    }
}

fn default_categories() -> Vec<Category> {
    Category::ALL.to_vec()
}

fn default_block_char() -> char {
    '█'
}

fn default_output_suffix() -> String {
    "_redacted".to_string()
}

fn default_fill_color() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

fn default_glyph_width() -> f32 {
    0.5
}

impl Config {
    /// Load config from the default location, falling back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Load config from an explicit path, which must exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "redact", "redact") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.redact/config.toml")
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.pdf.fill_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            anyhow::bail!("pdf.fill_color components must be between 0.0 and 1.0");
        }
        if self.pdf.glyph_width <= 0.0 {
            anyhow::bail!("pdf.glyph_width must be positive");
        }
        if self.output_suffix.is_empty() {
            anyhow::bail!("output_suffix must not be empty");
        }
        Ok(())
    }

    /// Default output path: `<stem><suffix>.<ext>` beside the input
    pub fn default_output_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        let file_name = match input.extension() {
            Some(ext) => format!("{}{}.{}", stem, self.output_suffix, ext.to_string_lossy()),
            None => format!("{}{}", stem, self.output_suffix),
        };
        input.with_file_name(file_name)
    }
}
