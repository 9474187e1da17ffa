use crate::error::{ConvertError, Result};
use crate::exporter::ExportFormat;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SHEET_NAME_MAX_LEN: usize = 31;
const SHEET_NAME_FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub extensions: Vec<String>,
    pub max_file_size: u64,
    pub max_depth: usize,
    pub exclude_patterns: Vec<String>,
    pub lossy_utf8: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for converted files. Unset means next to each input file.
    pub base_directory: Option<PathBuf>,
    pub format: ExportFormat,
    pub sheet_name: String,
    pub file_suffix: String,
    pub write_report: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub jobs: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["txt".to_string()],
            max_file_size: 50 * 1024 * 1024, // 50MB
            max_depth: 4,
            exclude_patterns: vec![r".*_converted\..*".to_string()],
            lossy_utf8: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_directory: None,
            format: ExportFormat::Xlsx,
            sheet_name: "Concur Data".to_string(),
            file_suffix: "_converted".to_string(),
            write_report: false,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            jobs: num_cpus::get(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConvertError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConvertError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConvertError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = [
                    "concur-convert.toml",
                    "concur-convert.config.toml",
                    ".concur-convert.toml",
                ];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.base_directory = Some(output_dir.clone());
        }

        if let Some(format) = cli_args.format {
            self.output.format = format;
        }

        if let Some(ref sheet_name) = cli_args.sheet_name {
            self.output.sheet_name = sheet_name.clone();
        }

        if let Some(write_report) = cli_args.write_report {
            self.output.write_report = write_report;
        }

        if let Some(jobs) = cli_args.jobs {
            self.processing.jobs = jobs;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ConvertError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| ConvertError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.input.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ConvertError::Config {
                message: "At least one input file extension must be specified".to_string(),
            });
        }

        if self.input.max_file_size == 0 {
            return Err(ConvertError::Config {
                message: "Maximum file size must be greater than 0".to_string(),
            });
        }

        if self.input.max_depth == 0 {
            return Err(ConvertError::Config {
                message: "Maximum directory depth must be greater than 0".to_string(),
            });
        }

        for pattern in &self.input.exclude_patterns {
            Regex::new(pattern).map_err(|e| ConvertError::Config {
                message: format!("Invalid exclude pattern '{}': {}", pattern, e),
            })?;
        }

        if self.processing.jobs == 0 {
            return Err(ConvertError::Config {
                message: "Number of jobs must be greater than 0".to_string(),
            });
        }

        validate_sheet_name(&self.output.sheet_name)?;

        if let Some(ref dir) = self.output.base_directory {
            if let Some(parent) = dir.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(ConvertError::Config {
                        message: format!("Parent directory does not exist: {}", parent.display()),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

/// Excel rejects sheet names that are empty, longer than 31 characters, or
/// contain any of `[]:*?/\`.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ConvertError::Config {
            message: "Sheet name cannot be empty".to_string(),
        });
    }

    if name.chars().count() > SHEET_NAME_MAX_LEN {
        return Err(ConvertError::Config {
            message: format!(
                "Sheet name '{}' exceeds {} characters",
                name, SHEET_NAME_MAX_LEN
            ),
        });
    }

    if let Some(c) = name.chars().find(|c| SHEET_NAME_FORBIDDEN.contains(c)) {
        return Err(ConvertError::Config {
            message: format!("Sheet name '{}' contains invalid character '{}'", name, c),
        });
    }

    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(ConvertError::Config {
            message: format!("Sheet name '{}' cannot start or end with an apostrophe", name),
        });
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub format: Option<ExportFormat>,
    pub sheet_name: Option<String>,
    pub write_report: Option<bool>,
    pub jobs: Option<usize>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_format(mut self, format: Option<ExportFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn with_sheet_name(mut self, sheet_name: Option<String>) -> Self {
        self.sheet_name = sheet_name;
        self
    }

    pub fn with_write_report(mut self, write_report: Option<bool>) -> Self {
        self.write_report = write_report;
        self
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }
}
