use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::exporter::ExportFormat;
use crate::ui::OutputMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "concur-convert")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert Concur DETAIL exports into spreadsheets")]
#[command(
    long_about = "concur-convert reads pipe-delimited Concur expense exports, keeps the \
                  DETAIL lines and writes the Date, PartnerId, Quantity, UserName, \
                  Department, Purpose and Value columns to an xlsx, csv or json file."
)]
#[command(after_help = "EXAMPLES:\n  \
    concur-convert march.txt\n  \
    concur-convert exports/ --output converted --format csv\n  \
    concur-convert march.txt --sheet-name \"March 2024\" --force\n  \
    concur-convert exports/ --dry-run\n  \
    concur-convert --generate-config --config concur-convert.toml")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Report file or directory of report files
    #[arg(required_unless_present = "generate_config")]
    pub input: Option<PathBuf>,

    /// Directory for converted files (defaults to next to each input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output file format
    #[arg(short, long, value_enum)]
    pub format: Option<ExportFormat>,

    /// Worksheet name for xlsx output
    #[arg(long)]
    pub sheet_name: Option<String>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Number of reports converted concurrently
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Write conversion_report.json to the output directory
    #[arg(long)]
    pub report: bool,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Overwrite existing output files
    #[arg(long)]
    pub force: bool,

    /// List the conversions that would run without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl From<OutputFormat> for OutputMode {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        config.merge_with_cli_args(&self.create_cli_overrides());
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_output_dir(self.output.clone())
            .with_format(self.format)
            .with_sheet_name(self.sheet_name.clone())
            .with_write_report(self.report.then_some(true))
            .with_jobs(self.jobs)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
