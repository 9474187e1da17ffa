use crate::config::InputConfig;
use crate::error::{format_bytes, ConvertError, Result};
use crate::scanner::file_filter::FileFilter;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// One report file queued for conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    pub source_path: PathBuf,
    pub relative_path: PathBuf,
    pub filename: String,
    pub size: u64,
}

impl ReportFile {
    pub fn new(source_path: PathBuf, relative_path: PathBuf, size: u64) -> Self {
        let filename = source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        Self {
            source_path,
            relative_path,
            filename,
            size,
        }
    }

    pub fn display_path(&self) -> String {
        self.relative_path.display().to_string()
    }

    pub fn format_size(&self) -> String {
        format_bytes(self.size)
    }
}

/// Resolves a command-line input (a single file or a directory) into the
/// report files to convert.
pub struct InputScanner {
    filter: FileFilter,
    max_depth: usize,
}

impl InputScanner {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            filter: FileFilter::new(config),
            max_depth: config.max_depth,
        }
    }

    pub fn scan<P: AsRef<Path>>(&self, input: P) -> Result<Vec<ReportFile>> {
        let input = input.as_ref();

        if input.is_dir() {
            self.scan_directory(input)
        } else {
            Ok(vec![self.check_file(input)?])
        }
    }

    /// Validate a path given explicitly. Unlike directory scanning, a wrong
    /// extension here is an error rather than a silent skip.
    pub fn check_file(&self, path: &Path) -> Result<ReportFile> {
        if !path.exists() {
            return Err(ConvertError::InvalidInput {
                path: path.display().to_string(),
                reason: "file does not exist".to_string(),
            });
        }

        if !path.is_file() {
            return Err(ConvertError::InvalidInput {
                path: path.display().to_string(),
                reason: "not a regular file".to_string(),
            });
        }

        if !self.filter.has_report_extension(path) {
            return Err(ConvertError::InvalidInput {
                path: path.display().to_string(),
                reason: format!(
                    "file must have one of the extensions: {}",
                    self.filter.extensions().join(", ")
                ),
            });
        }

        let size = path.metadata()?.len();
        if !self.filter.is_size_allowed(size) {
            return Err(ConvertError::FileTooLarge {
                size,
                max_size: self.filter.max_file_size(),
            });
        }

        let relative_path = path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf());

        Ok(ReportFile::new(path.to_path_buf(), relative_path, size))
    }

    pub fn scan_directory(&self, root: &Path) -> Result<Vec<ReportFile>> {
        let mut reports = Vec::new();

        let walker = WalkDir::new(root)
            .max_depth(self.max_depth)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| self.should_traverse(e, root));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative_path = match entry.path().strip_prefix(root) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => continue,
            };

            if !self.filter.is_report_file(&relative_path) {
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(err) => {
                    warn!(path = %entry.path().display(), error = %err, "cannot read metadata");
                    continue;
                }
            };

            if !self.filter.is_size_allowed(size) {
                warn!(
                    path = %relative_path.display(),
                    size,
                    "skipping report larger than max_file_size"
                );
                continue;
            }

            reports.push(ReportFile::new(entry.path().to_path_buf(), relative_path, size));
        }

        if reports.is_empty() {
            return Err(ConvertError::NoInputFiles {
                path: root.display().to_string(),
                searched_extensions: self.filter.extensions().to_vec(),
            });
        }

        // stable output order regardless of filesystem iteration order
        reports.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        Ok(reports)
    }

    fn should_traverse(&self, entry: &DirEntry, root: &Path) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }

        match entry.path().strip_prefix(root) {
            Ok(relative) => self.filter.should_traverse_directory(relative),
            Err(_) => false,
        }
    }
}
