use clap::Parser;
use concur_convert::{Cli, ConvertError, Converter, OutputFormatter, OutputMode, UserFriendlyError};
use std::path::{Path, PathBuf};
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    setup_logging(&cli);

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let converter = match Converter::from_cli(&cli) {
        Ok(converter) => converter,
        Err(e) => {
            print_startup_error(&cli, &e);
            return exit_code_for(&e);
        }
    };

    let Some(input) = cli.input.as_ref() else {
        converter.output_formatter().error("No input path given");
        return 2;
    };

    if cli.dry_run {
        return handle_dry_run(&cli, &converter, input);
    }

    match converter.convert(input).await {
        Ok(report) => {
            if report.failures.is_empty() {
                0
            } else {
                2 // some documents failed
            }
        }
        Err(e) => {
            converter.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &ConvertError) -> i32 {
    match error {
        ConvertError::Cancelled => 130,
        ConvertError::InvalidInput { .. }
        | ConvertError::NoInputFiles { .. }
        | ConvertError::FileTooLarge { .. } => 2,
        ConvertError::Config { .. } => 3,
        ConvertError::Export { .. } => 4,
        ConvertError::NoValidData { .. } => 6,
        ConvertError::OutputExists { .. } => 8,
        ConvertError::Io(_) | ConvertError::Internal { .. } => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("concur-convert.toml"));

    match Converter::generate_sample_config(&config_path) {
        Ok(()) => {
            if !cli.quiet {
                println!("Generated sample configuration file: {}", config_path.display());
                println!("\nTo use this configuration:");
                println!("  concur-convert <input> --config {}", config_path.display());
            }
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(cli: &Cli, converter: &Converter, input: &Path) -> i32 {
    let formatter = converter.output_formatter();
    let config = converter.config();

    formatter.print_header("Dry run: no files will be written");

    let plan = match converter.plan(input) {
        Ok(plan) => plan,
        Err(e) => {
            converter.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    if formatter.mode() == OutputMode::Json {
        let entries: Vec<_> = plan
            .iter()
            .map(|(report, output)| {
                serde_json::json!({
                    "input": report.source_path,
                    "output": output,
                    "size": report.size,
                    "output_exists": output.exists(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
        );
        return 0;
    }

    if !cli.quiet {
        println!("  Format: {}", config.output.format);
        println!("  Sheet name: {}", config.output.sheet_name);
        println!("  Jobs: {}", config.processing.jobs);
        formatter.print_separator();

        for (report, output) in &plan {
            println!(
                "  {} ({}) -> {}",
                report.source_path.display(),
                report.format_size(),
                output.display()
            );
        }
        formatter.print_separator();
    }

    let existing = plan.iter().filter(|(_, output)| output.exists()).count();
    if existing > 0 && !cli.force {
        formatter.warning(&format!(
            "{} output file(s) already exist; use --force to overwrite",
            existing
        ));
    }

    formatter.success(&format!("{} report file(s) would be converted", plan.len()));
    0
}

fn print_startup_error(cli: &Cli, error: &ConvertError) {
    let formatter = OutputFormatter::new(cli.output_format.into(), 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(cli: &Cli) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("concur_convert={}", cli.log_filter()))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
