use crate::errors::TimeWindowError;
use chrono::{NaiveTime, Timelike};

const START_TIME_FORMAT: &str = "%H:%M:%S";

/// Simulation window: wall-clock start and length in whole seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveTime,
    duration: u64,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, duration: u64) -> Self {
        TimeWindow { start, duration }
    }

    /// Parses a `HH:MM:SS` start time and a duration in seconds.
    ///
    /// Fractional durations are truncated toward zero.
    pub fn try_new(start_time: &str, duration: &str) -> Result<Self, TimeWindowError> {
        Ok(TimeWindow {
            start: parse_start_time(start_time)?,
            duration: parse_duration(duration)?,
        })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Start as seconds since midnight.
    pub fn start_seconds(&self) -> u64 {
        self.start.num_seconds_from_midnight() as u64
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }
}

pub fn parse_start_time(start_time: &str) -> Result<NaiveTime, TimeWindowError> {
    NaiveTime::parse_from_str(start_time.trim(), START_TIME_FORMAT).map_err(|_| {
        TimeWindowError::new(&format!(
            "start time '{}' should be formatted as HH:MM:SS",
            start_time
        ))
    })
}

pub fn parse_duration(duration: &str) -> Result<u64, TimeWindowError> {
    let seconds: f64 = duration.trim().parse().map_err(|_| {
        TimeWindowError::new(&format!("duration '{}' is not a number", duration))
    })?;
    if !seconds.is_finite() {
        return Err(TimeWindowError::new("duration should be finite"));
    }
    let seconds = seconds.trunc();
    if seconds < 0.0 {
        return Err(TimeWindowError::new("duration should be non-negative"));
    }
    Ok(seconds as u64)
}
