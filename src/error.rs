use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {path}")]
    InvalidInput { path: String, reason: String },

    #[error("No report files found in {path}")]
    NoInputFiles {
        path: String,
        searched_extensions: Vec<String>,
    },

    #[error("No valid data found in {source_name}")]
    NoValidData {
        source_name: String,
        lines_scanned: usize,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Export failed: {message}")]
    Export { message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,

    #[error("File too large: {size} bytes (max: {max_size} bytes)")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Output file already exists: {path}")]
    OutputExists { path: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ConvertError {
    fn user_message(&self) -> String {
        match self {
            ConvertError::InvalidInput { path, reason } => {
                format!("Invalid input {}: {}", path, reason)
            }
            ConvertError::NoInputFiles {
                path,
                searched_extensions,
            } => {
                format!(
                    "No report files with extensions {} found in {}",
                    searched_extensions.join(", "),
                    path
                )
            }
            ConvertError::NoValidData {
                source_name,
                lines_scanned,
            } => {
                format!(
                    "No valid data found in {} ({} lines scanned, none starting with DETAIL)",
                    source_name, lines_scanned
                )
            }
            ConvertError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            ConvertError::Export { message } => {
                format!("Failed to write output: {}", message)
            }
            ConvertError::Cancelled => "Operation was cancelled by user".to_string(),
            ConvertError::FileTooLarge { size, max_size } => {
                format!(
                    "File too large: {} (maximum allowed: {})",
                    format_bytes(*size),
                    format_bytes(*max_size)
                )
            }
            ConvertError::OutputExists { path } => {
                format!("Output file already exists: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ConvertError::InvalidInput { .. } => Some(
                "Pass a Concur export saved as a .txt file, or a directory containing such files.".to_string()
            ),
            ConvertError::NoInputFiles { .. } => Some(
                "Check the directory path, or widen the search with `extensions` and `max_depth` in the [input] configuration section.".to_string()
            ),
            ConvertError::NoValidData { .. } => Some(
                "Make sure the file is a Concur detail export: data lines must begin with DETAIL and use | as the separator.".to_string()
            ),
            ConvertError::Config { .. } => Some(
                "Check your configuration file syntax, or regenerate one with --generate-config.".to_string()
            ),
            ConvertError::Export { .. } => Some(
                "Ensure the output directory is writable and the file is not open in another program.".to_string()
            ),
            ConvertError::FileTooLarge { .. } => Some(
                "Increase `max_file_size` in the [input] configuration section.".to_string()
            ),
            ConvertError::OutputExists { .. } => Some(
                "Remove the existing file, choose a different directory with --output, or use --force to overwrite.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConvertError {
    fn from(error: toml::de::Error) -> Self {
        ConvertError::Config {
            message: error.to_string(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for ConvertError {
    fn from(error: rust_xlsxwriter::XlsxError) -> Self {
        ConvertError::Export {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for ConvertError {
    fn from(error: csv::Error) -> Self {
        ConvertError::Export {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(error: serde_json::Error) -> Self {
        ConvertError::Export {
            message: error.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for ConvertError {
    fn from(error: tokio::task::JoinError) -> Self {
        ConvertError::Internal {
            message: format!("conversion task failed: {}", error),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
