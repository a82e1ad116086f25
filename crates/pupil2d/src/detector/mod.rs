//! Detector configuration and per-instance state.

mod config;
mod state;

pub use config::{DetectionParameters, DetectorOptions, ParamsError, SearchConfig};
pub use state::{DetectorState, DEFAULT_PUPIL_SIZE};
