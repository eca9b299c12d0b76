use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ProfileError, Result};
use crate::parser::DEFAULT_EXTRACTION_DIR;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub captioner: CaptionerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Scratch directory archives are extracted into. Wiped on every archive import.
    #[serde(default = "default_extraction_dir")]
    pub extraction_dir: PathBuf,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            extraction_dir: default_extraction_dir(),
        }
    }
}

fn default_extraction_dir() -> PathBuf {
    PathBuf::from(DEFAULT_EXTRACTION_DIR)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceChoice {
    Cpu,
    Cuda,
    #[default]
    Auto,
}

impl fmt::Display for DeviceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceChoice::Cpu => "cpu",
            DeviceChoice::Cuda => "cuda",
            DeviceChoice::Auto => "auto",
        })
    }
}

/// Text generation and sentiment model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub device: DeviceChoice,
    pub max_length: i64,
    pub do_sample: bool,
    pub temperature: f64,
    pub top_p: f64,
    pub repetition_penalty: f64,
    pub no_repeat_ngram_size: i64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            device: DeviceChoice::Auto,
            max_length: 200,
            do_sample: true,
            temperature: 0.8,
            top_p: 0.9,
            repetition_penalty: 1.2,
            no_repeat_ngram_size: 3,
        }
    }
}

/// External captioning command. The image path is appended as the last argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionerConfig {
    pub program: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// When set, a plain-text log file is written here as well.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub analysis_log: PathBuf,
    pub export_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            analysis_log: PathBuf::from("photo_analyses.csv"),
            export_dir: PathBuf::from("exports"),
        }
    }
}

impl Config {
    /// Reads `path`. A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| ProfileError::Config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ProfileError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.import.extraction_dir, PathBuf::from("temp_facebook_data"));
        assert_eq!(config.models.device, DeviceChoice::Auto);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config = Config::from_toml_str(
            r#"
            [models]
            device = "cpu"
            temperature = 0.5

            [captioner]
            program = "blip-caption"
            args = ["--max-tokens", "30"]

            [logging]
            directory = "logs"
            "#,
        )
        .unwrap();
        assert_eq!(config.models.device, DeviceChoice::Cpu);
        assert_eq!(config.models.temperature, 0.5);
        assert_eq!(config.models.max_length, 200);
        assert_eq!(config.captioner.program.as_deref(), Some("blip-caption"));
        assert_eq!(config.captioner.args.len(), 2);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.directory, Some(PathBuf::from("logs")));
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[models\ndevice = ").unwrap();
        assert!(matches!(Config::load(&path), Err(ProfileError::Config(_))));

        let bad_device = Config::from_toml_str("[models]\ndevice = \"tpu\"");
        assert!(matches!(bad_device, Err(ProfileError::Config(_))));
    }
}
