use clap::Parser;
use dwf_laterals::pipeline::{self, DwfRequest, RunOverrides};
use dwf_laterals::settings::{
    make_settings, make_settings_file_path, map_from_environment_variables, OutputFormat,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Calculate dry weather flow on connection nodes and export it as 1D laterals.
#[derive(Parser)]
#[command(name = "dwf-laterals", version)]
struct Cli {
    /// Model schematisation (.sqlite)
    schema: PathBuf,

    /// Simulation duration in seconds, fractions are truncated
    #[arg(short, long)]
    duration: String,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Start time of day (HH:MM:SS)
    #[arg(short, long)]
    start_time: Option<String>,

    /// Hourly DWF pattern as `hour,fraction` rows; defaults to the built-in pattern
    #[arg(long)]
    dwf_factors: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Reject DWF patterns that do not cover all 24 hours
    #[arg(long)]
    strict_factors: bool,

    /// Settings file, defaults to settings.toml in the user preference directory
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn run(cli: Cli) -> Result<usize, Box<dyn Error>> {
    let settings_file_path = cli
        .settings
        .or_else(make_settings_file_path)
        .unwrap_or_default();
    let settings = make_settings(&map_from_environment_variables(), &settings_file_path)?;
    let overrides = RunOverrides {
        start_time: cli.start_time,
        dwf_factors_file: cli.dwf_factors,
        strict_factors: cli.strict_factors,
        output_format: cli.format,
    };
    let request =
        DwfRequest::from_settings(cli.schema, &cli.duration, cli.output, &settings, overrides)?;
    Ok(pipeline::run(&request)?)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(..) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
