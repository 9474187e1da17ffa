pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod exporter;
pub mod extractor;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, InputConfig, OutputConfig, ProcessingConfig};
pub use error::{ConvertError, Result, UserFriendlyError};

// Core functionality re-exports
pub use converter::{
    BatchConverter, BatchOutcome, ConversionProgress, ConversionReport, DocumentConverter,
    DocumentResult,
};
pub use exporter::{ExportFormat, Exporter};
pub use extractor::{extract, FieldMap, FieldSource, Record, RecordExtractor, RecordSet};
pub use scanner::{InputScanner, ReportFile};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::task;

/// Main library interface: scan an input path, convert every report found
/// and summarise the run.
pub struct Converter {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
    force: bool,
}

impl Converter {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let mut converter = Self::build(config, output_mode, verbose, quiet);
        converter.shutdown = GracefulShutdown::new()?;
        Ok(converter)
    }

    /// A converter without a Ctrl+C handler, for tests and embedding.
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self::build(config, output_mode, verbose, quiet)
    }

    fn build(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        // progress bars would interleave with machine-readable output
        let show_progress = !quiet && output_mode == OutputMode::Human;

        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(show_progress),
            shutdown: GracefulShutdown::new_for_test(),
            force: false,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let converter = Self::new(
            config,
            cli_args.output_format.into(),
            cli_args.verbose,
            cli_args.quiet,
        )?;
        Ok(converter.with_force(cli_args.force))
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Convert a report file, or every report file under a directory.
    ///
    /// Documents fail independently and are listed in the report. When no
    /// document converts at all, the first failure is returned instead.
    pub async fn convert<P: AsRef<Path>>(&self, input: P) -> Result<ConversionReport> {
        let started_at = Utc::now();
        let input = input.as_ref();

        self.shutdown.check_shutdown()?;

        let reports = self.scan_inputs(input)?;
        self.shutdown.check_shutdown()?;

        let batch = self.batch_converter();
        let format = batch.converter().format();
        let outcome = self.run_batch(batch, reports).await?;

        for (report, error) in &outcome.failures {
            self.output_formatter
                .warning(&format!("Skipped {}: {}", report.display_path(), error));
        }

        if outcome.documents.is_empty() && !outcome.failures.is_empty() {
            let mut failures = outcome.failures;
            let (_, error) = failures.swap_remove(0);
            return Err(error);
        }

        let report = ConversionReport::from_outcome(&outcome, format, started_at);

        if self.config.output.write_report {
            let path = report.save_to_dir(&self.report_directory(input))?;
            self.output_formatter
                .info(&format!("Wrote conversion report: {}", path.display()));
        }

        self.output_formatter.print_conversion_summary(&report);

        Ok(report)
    }

    /// Convert report bytes held in memory into the configured output format.
    pub fn convert_document_bytes(&self, bytes: &[u8], source_name: &str) -> Result<Vec<u8>> {
        DocumentConverter::from_config(&self.config).convert_bytes(bytes, source_name)
    }

    /// Inputs that would be converted and where each output would land.
    pub fn plan<P: AsRef<Path>>(&self, input: P) -> Result<Vec<(ReportFile, PathBuf)>> {
        let converter = DocumentConverter::from_config(&self.config);
        let reports = InputScanner::new(&self.config.input).scan(input)?;

        Ok(reports
            .into_iter()
            .map(|report| {
                let output = converter.output_path(&report);
                (report, output)
            })
            .collect())
    }

    fn scan_inputs(&self, input: &Path) -> Result<Vec<ReportFile>> {
        self.output_formatter
            .start_operation(&format!("Scanning {}", input.display()));

        let spinner = self.progress_manager.create_spinner("Looking for report files...");
        let scanned = InputScanner::new(&self.config.input).scan(input);
        spinner.finish_and_clear();
        let reports = scanned?;

        let total: u64 = reports.iter().map(|r| r.size).sum();
        self.output_formatter.info(&format!(
            "Found {} report file(s), {}",
            reports.len(),
            error::format_bytes(total)
        ));
        for report in &reports {
            self.output_formatter
                .debug(&format!("{} ({})", report.display_path(), report.format_size()));
        }

        Ok(reports)
    }

    fn batch_converter(&self) -> BatchConverter {
        let converter = DocumentConverter::from_config(&self.config).with_overwrite(self.force);
        BatchConverter::new(converter).with_jobs(self.config.processing.jobs)
    }

    async fn run_batch(
        &self,
        batch: BatchConverter,
        reports: Vec<ReportFile>,
    ) -> Result<BatchOutcome> {
        self.output_formatter.start_operation(&format!(
            "Converting to {}",
            batch.converter().format()
        ));

        let file_progress = self.progress_manager.create_file_progress(reports.len() as u64);
        let pb = file_progress.clone();
        let shutdown = self.shutdown.clone();

        let outcome = task::spawn_blocking(move || {
            let progress_callback = move |progress: &ConversionProgress| {
                ui::progress::update_file_progress(&pb, progress);
            };
            batch.convert_all(&reports, &shutdown, Some(&progress_callback))
        })
        .await?;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                file_progress.abandon();
                return Err(e);
            }
        };

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!(
                "Converted {} of {} reports",
                outcome.documents.len(),
                outcome.progress.total_files
            ),
            outcome.progress.elapsed(),
        );

        Ok(outcome)
    }

    fn report_directory(&self, input: &Path) -> PathBuf {
        if let Some(ref dir) = self.config.output.base_directory {
            return dir.clone();
        }
        if input.is_dir() {
            return input.to_path_buf();
        }
        match input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        std::fs::write(output_path.as_ref(), Config::create_sample_config())?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &ConvertError) {
        self.progress_manager.clear();
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get build information
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
    pub target: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "concur-convert {} ({}) built on {} for {}",
            self.version, self.git_hash, self.build_date, self.target
        )
    }
}
