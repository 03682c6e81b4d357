//! File sink
//!
//! Writes the normalized outputs to a file. The format follows the file
//! extension:
//!
//! | extension | format |
//! |---|---|
//! | `.json` | pretty-printed JSON |
//! | `.yaml`, `.yml` | YAML |
//! | `.toml` | TOML |

use crate::error::FileWriteError;
use stackport_core::NormalizedOutputMap;
use std::path::{Path, PathBuf};
use tokio::fs;

pub type Result<T> = std::result::Result<T, FileWriteError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Toml,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(OutputFormat::Json),
            Some("yaml" | "yml") => Ok(OutputFormat::Yaml),
            Some("toml") => Ok(OutputFormat::Toml),
            _ => Err(FileWriteError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn render(&self, outputs: &NormalizedOutputMap) -> Result<String> {
        let rendered = match self {
            OutputFormat::Json => serde_json::to_string_pretty(outputs)
                .map(|s| s + "\n")
                .map_err(|e| FileWriteError::Serialize(e.to_string()))?,
            OutputFormat::Yaml => serde_yaml::to_string(outputs)
                .map_err(|e| FileWriteError::Serialize(e.to_string()))?,
            OutputFormat::Toml => {
                toml::to_string(outputs).map_err(|e| FileWriteError::Serialize(e.to_string()))?
            }
        };
        Ok(rendered)
    }
}

/// Output file target
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    format: OutputFormat,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = OutputFormat::from_path(&path)?;
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write the outputs, replacing any existing file
    ///
    /// The parent directory must already exist.
    pub async fn save(&self, outputs: &NormalizedOutputMap) -> Result<()> {
        let content = self.format.render(outputs)?;

        fs::write(&self.path, content)
            .await
            .map_err(|source| FileWriteError::Io {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %self.path.display(),
            count = outputs.len(),
            "Saved stack outputs"
        );
        Ok(())
    }
}

/// Write `outputs` to `path` in the format its extension names
pub async fn save(path: impl Into<PathBuf>, outputs: &NormalizedOutputMap) -> Result<()> {
    FileSink::new(path)?.save(outputs).await
}
