//! ISOMORPH CLI
//!
//! Structural comparison of JSON documents from the command line.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod compare;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use compare::{compare_files, load_settings, CompareError, Overrides};
use isomorph_core::JsonObjectMode;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "isomorph")]
#[command(about = "ISOMORPH - Structural equivalency of object graphs", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a subject document against an expectation
    Compare {
        /// Subject document
        #[arg(short, long)]
        subject: PathBuf,
        /// Expected document
        #[arg(short, long)]
        expectation: PathBuf,
        /// Settings file
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Member to include (repeatable)
        #[arg(long)]
        include: Vec<String>,
        /// Member to exclude (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
        /// Compare collections index-for-index
        #[arg(long)]
        strict_ordering: bool,
        /// Skip members the subject lacks
        #[arg(long)]
        shared_only: bool,
        /// Stop at the first difference
        #[arg(long)]
        stop_on_first: bool,
        /// Maximum recursion depth
        #[arg(long, allow_hyphen_values = true)]
        max_depth: Option<i64>,
        /// Absolute tolerance for floating point values
        #[arg(long)]
        tolerance: Option<f64>,
        /// Name of the root in messages
        #[arg(long)]
        root_name: Option<String>,
        /// How JSON objects are represented
        #[arg(long, value_enum, default_value_t = ObjectMode::Structured)]
        objects: ObjectMode,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print effective settings
    Settings {
        /// Settings file
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ObjectMode {
    /// Objects with members
    Structured,
    /// Dictionaries keyed by string
    Dictionary,
}

impl From<ObjectMode> for JsonObjectMode {
    fn from(mode: ObjectMode) -> Self {
        match mode {
            ObjectMode::Structured => JsonObjectMode::Structured,
            ObjectMode::Dictionary => JsonObjectMode::Dictionary,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Rendered failure messages
    Text,
    /// JSON report
    Json,
}

/// Exit code when the documents differ
const EXIT_DIFFERENT: u8 = 1;
/// Exit code for unusable input or settings
const EXIT_INVALID: u8 = 2;

fn init_tracing(verbose: bool) {
    let default = if verbose { "isomorph=debug" } else { "isomorph=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compare {
            subject,
            expectation,
            settings,
            include,
            exclude,
            strict_ordering,
            shared_only,
            stop_on_first,
            max_depth,
            tolerance,
            root_name,
            objects,
            format,
        } => {
            let overrides = Overrides {
                include,
                exclude,
                strict_ordering,
                shared_only,
                stop_on_first_failure: stop_on_first,
                max_depth,
                float_tolerance: tolerance,
                root_name,
            };

            let outcome = load_settings(settings.as_deref()).and_then(|mut settings| {
                overrides.apply(&mut settings);
                compare_files(&subject, &expectation, settings, objects.into())
            });
            let report = match outcome {
                Ok(report) => report,
                Err(err) => return Ok(invalid(&err)),
            };

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => match report.render() {
                    Some(rendered) => println!("{}", rendered),
                    None => println!("{}", report.summary()),
                },
            }

            if report.is_equivalent() {
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("{}", report.summary());
                Ok(ExitCode::from(EXIT_DIFFERENT))
            }
        }
        Commands::Settings { file } => {
            let settings = match load_settings(file.as_deref()) {
                Ok(settings) => settings,
                Err(err) => return Ok(invalid(&err)),
            };
            let options = match settings.clone().build() {
                Ok(options) => options,
                Err(err) => return Ok(invalid(&CompareError::from(err))),
            };

            println!("{}", settings.to_json()?);
            for line in options.describe() {
                eprintln!("- {}", line);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn invalid(err: &CompareError) -> ExitCode {
    eprintln!("error: {}", err);
    ExitCode::from(EXIT_INVALID)
}
