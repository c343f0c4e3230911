pub mod dwf_factors;
pub mod errors;
pub mod factor_steps;
pub mod lateral;
pub mod lateral_csv;
pub mod pipeline;
pub mod population;
pub mod settings;
pub mod spatialite;
pub mod time_window;

/// Connection node identifier in the model schematisation.
pub type NodeId = i64;
