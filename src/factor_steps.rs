use crate::dwf_factors::{DwfFactors, HOURS_PER_DAY};
use crate::errors::FactorLookupError;
use crate::time_window::TimeWindow;

pub const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_DAY: u64 = SECONDS_PER_HOUR * HOURS_PER_DAY as u64;

/// The DWF factor holding from `offset` until the next step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FactorStep {
    pub offset: u64,
    pub factor: f64,
}

impl FactorStep {
    pub fn new(offset: u64, factor: f64) -> Self {
        FactorStep { offset, factor }
    }
}

/// Wall-clock hour `offset` seconds after a start given in seconds since midnight.
fn hour_at(start_seconds: u64, offset: u64) -> u32 {
    let seconds_of_day =
        (start_seconds % SECONDS_PER_DAY + offset % SECONDS_PER_DAY) % SECONDS_PER_DAY;
    (seconds_of_day / SECONDS_PER_HOUR) as u32
}

/// Expands the hourly pattern into a step function over the simulation window.
///
/// There is a step at offset 0, one at every second where the wall-clock hour
/// changes, and a closing step at the window's duration. Offsets are strictly
/// increasing. A zero duration gives a single step.
pub fn make_factor_steps(
    window: &TimeWindow,
    factors: &DwfFactors,
) -> Result<Vec<FactorStep>, FactorLookupError> {
    let start = window.start_seconds();
    let duration = window.duration();
    let step_at = |offset: u64| -> Result<FactorStep, FactorLookupError> {
        Ok(FactorStep::new(offset, factors.factor(hour_at(start, offset))?))
    };
    let mut steps = vec![step_at(0)?];
    let mut next_hour = Some(SECONDS_PER_HOUR - start % SECONDS_PER_HOUR);
    while let Some(offset) = next_hour.filter(|offset| *offset <= duration) {
        steps.push(step_at(offset)?);
        next_hour = offset.checked_add(SECONDS_PER_HOUR);
    }
    if steps.last().map_or(true, |step| step.offset != duration) {
        steps.push(step_at(duration)?);
    }
    Ok(steps)
}
