//! Reading classification against a checkpoint's temperature band.

use crate::database::models::Checkpoint;

/// Inclusive acceptable range for a checkpoint. Either bound may be unset,
/// in which case that side never triggers abnormality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureBand {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl TemperatureBand {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }
}

impl From<&Checkpoint> for TemperatureBand {
    fn from(checkpoint: &Checkpoint) -> Self {
        Self::new(checkpoint.min_temp, checkpoint.max_temp)
    }
}

/// Returns true when the reading falls outside the band. Pure function; the
/// single and bulk submission paths both go through here so a reading can
/// never be classified differently depending on how it was submitted.
pub fn classify(temperature: f64, band: &TemperatureBand) -> bool {
    if let Some(min) = band.min {
        if temperature < min {
            return true;
        }
    }
    if let Some(max) = band.max {
        if temperature > max {
            return true;
        }
    }
    false
}
