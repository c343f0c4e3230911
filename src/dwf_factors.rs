use crate::errors::{FactorLookupError, MalformedInputError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

pub const HOURS_PER_DAY: usize = 24;

/// Fraction of the daily dry weather flow discharged in each hour of the day.
const DEFAULT_DWF_FACTORS: [f64; HOURS_PER_DAY] = [
    0.03, 0.015, 0.01, 0.01, 0.005, 0.005, 0.025, 0.080, 0.075, 0.06, 0.055, 0.05, 0.045, 0.04,
    0.04, 0.035, 0.035, 0.04, 0.055, 0.08, 0.07, 0.055, 0.045, 0.04,
];

/// Diurnal DWF pattern indexed by hour of day.
///
/// Hours that an external factor file did not mention are empty; looking one
/// of them up fails with [`FactorLookupError`].
#[derive(Clone, Debug, PartialEq)]
pub struct DwfFactors {
    factors: [Option<f64>; HOURS_PER_DAY],
}

impl Default for DwfFactors {
    fn default() -> Self {
        DwfFactors {
            factors: DEFAULT_DWF_FACTORS.map(Some),
        }
    }
}

impl DwfFactors {
    /// Built-in pattern, one entry per hour.
    pub fn load_default() -> Self {
        Self::default()
    }

    /// Parses `hour,fraction` records.
    ///
    /// Whitespace around fields is ignored, as are columns after the second and
    /// lines holding nothing but whitespace.
    /// Later records for an hour replace earlier ones. Nothing is returned
    /// unless every record parses.
    pub fn load_from_source<R: Read>(source: R) -> Result<Self, MalformedInputError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(source);
        let mut factors = [None; HOURS_PER_DAY];
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |position| position.line());
            if record.iter().all(str::is_empty) {
                continue;
            }
            if record.len() < 2 {
                return Err(MalformedInputError::row(
                    line,
                    format!("expected hour and fraction, found {} field(s)", record.len()),
                ));
            }
            let hour = record[0].parse::<i64>().map_err(|_| {
                MalformedInputError::row(line, format!("hour '{}' is not an integer", &record[0]))
            })?;
            let fraction = record[1].parse::<f64>().map_err(|_| {
                MalformedInputError::row(
                    line,
                    format!("fraction '{}' is not a number", &record[1]),
                )
            })?;
            let slot = usize::try_from(hour)
                .ok()
                .and_then(|hour| factors.get_mut(hour))
                .ok_or_else(|| {
                    MalformedInputError::row(line, format!("hour {} is outside 0-23", hour))
                })?;
            if slot.is_some() {
                warn!("line {}: hour {} given more than once, using the later value", line, hour);
            }
            *slot = Some(fraction);
        }
        Ok(DwfFactors { factors })
    }

    pub fn load_from_file(path: &Path) -> Result<Self, MalformedInputError> {
        debug!("reading DWF factors from {}", path.display());
        let file = File::open(path).map_err(|source| MalformedInputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from_source(file)
    }

    /// Factor for a wall-clock hour; hours past 23 wrap around the clock.
    pub fn factor(&self, hour: u32) -> Result<f64, FactorLookupError> {
        let hour = hour % HOURS_PER_DAY as u32;
        self.factors[hour as usize].ok_or(FactorLookupError { hour })
    }

    pub fn missing_hours(&self) -> Vec<u32> {
        (0..HOURS_PER_DAY as u32)
            .filter(|hour| self.factors[*hour as usize].is_none())
            .collect()
    }

    /// Fails on the first hour without a factor.
    pub fn ensure_complete(&self) -> Result<(), FactorLookupError> {
        match self.missing_hours().first() {
            Some(hour) => Err(FactorLookupError { hour: *hour }),
            None => Ok(()),
        }
    }
}
