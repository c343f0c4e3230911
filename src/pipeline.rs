use crate::dwf_factors::DwfFactors;
use crate::errors::DwfError;
use crate::factor_steps::make_factor_steps;
use crate::lateral::{synthesize, NodeTimeSeries};
use crate::lateral_csv::{write_laterals_json_to_file, write_laterals_to_file};
use crate::population::{read_dwf_per_node, PopulationSource};
use crate::settings::{OutputFormat, Settings};
use crate::spatialite::SpatialiteSchema;
use crate::time_window::TimeWindow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything one DWF calculation needs.
#[derive(Clone, Debug)]
pub struct DwfRequest {
    pub schema_path: PathBuf,
    pub window: TimeWindow,
    pub factors: DwfFactors,
    pub dwf_per_person: f64,
    pub output_path: PathBuf,
    pub output_format: OutputFormat,
}

/// Values given on the command line, each taking precedence over [`Settings`].
#[derive(Clone, Debug, Default)]
pub struct RunOverrides {
    pub start_time: Option<String>,
    pub dwf_factors_file: Option<PathBuf>,
    pub strict_factors: bool,
    pub output_format: Option<OutputFormat>,
}

impl DwfRequest {
    /// Combines layered settings with command-line overrides and loads the
    /// DWF pattern they point at.
    pub fn from_settings(
        schema_path: PathBuf,
        duration: &str,
        output_path: PathBuf,
        settings: &Settings,
        overrides: RunOverrides,
    ) -> Result<Self, DwfError> {
        let start_time = overrides
            .start_time
            .unwrap_or_else(|| settings.start_time.clone());
        let window = TimeWindow::try_new(&start_time, duration)?;
        info!(
            "simulation starts at {} and lasts {} s",
            window.start(),
            window.duration()
        );
        let factors_file = overrides
            .dwf_factors_file
            .or_else(|| settings.dwf_factors_file.clone());
        let factors = load_factors(
            factors_file.as_deref(),
            overrides.strict_factors || settings.strict_factors,
        )?;
        Ok(DwfRequest {
            schema_path,
            window,
            factors,
            dwf_per_person: settings.dwf_per_person,
            output_path,
            output_format: overrides.output_format.unwrap_or(settings.output_format),
        })
    }
}

/// Built-in pattern when `path` is `None`.
///
/// With `strict` set, a table missing any hour is rejected here instead of
/// at the first lookup of that hour.
pub fn load_factors(path: Option<&Path>, strict: bool) -> Result<DwfFactors, DwfError> {
    let factors = match path {
        Some(path) => DwfFactors::load_from_file(path)?,
        None => DwfFactors::load_default(),
    };
    if strict {
        factors.ensure_complete()?;
    }
    Ok(factors)
}

pub fn generate_laterals<S: PopulationSource>(
    source: &mut S,
    window: &TimeWindow,
    factors: &DwfFactors,
    dwf_per_person: f64,
) -> Result<Vec<NodeTimeSeries>, DwfError> {
    let steps = make_factor_steps(window, factors)?;
    info!("{} DWF factor steps over {} s", steps.len(), window.duration());
    let baselines = read_dwf_per_node(source, dwf_per_person)?;
    info!("{} connection nodes with inhabitants", baselines.len());
    Ok(synthesize(&baselines, &steps))
}

/// Runs the calculation and writes the lateral table, returning the number of laterals.
pub fn run(request: &DwfRequest) -> Result<usize, DwfError> {
    let laterals = {
        let mut schema = SpatialiteSchema::open(&request.schema_path)?;
        info!("opened schema {}", request.schema_path.display());
        generate_laterals(
            &mut schema,
            &request.window,
            &request.factors,
            request.dwf_per_person,
        )?
    };
    match request.output_format {
        OutputFormat::Csv => write_laterals_to_file(&request.output_path, &laterals)?,
        OutputFormat::Json => write_laterals_json_to_file(&request.output_path, &laterals)?,
    }
    info!(
        "wrote {} laterals to {}",
        laterals.len(),
        request.output_path.display()
    );
    Ok(laterals.len())
}
