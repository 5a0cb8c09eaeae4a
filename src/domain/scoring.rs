// Sensor normalization and happiness scoring
use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

use super::reading::Reading;

/// Raw-count calibration for the soil and light sensors, plus the ideal
/// soil-moisture band. Bounds must be strictly ordered; a zero-width range
/// is a configuration error, not a runtime data error.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Raw soil counts at full saturation (lower counts = wetter).
    pub soil_wet: i64,
    /// Raw soil counts when fully dry.
    pub soil_dry: i64,
    pub light_low: i64,
    pub light_high: i64,
    pub ideal_soil_min: f64,
    pub ideal_soil_max: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            soil_wet: 700,
            soil_dry: 2300,
            light_low: 450,
            light_high: 3000,
            ideal_soil_min: 35.0,
            ideal_soil_max: 75.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("soil calibration range is empty: wet bound {wet} must be below dry bound {dry}")]
    EmptySoilRange { wet: i64, dry: i64 },

    #[error("light calibration range is empty: low bound {low} must be below high bound {high}")]
    EmptyLightRange { low: i64, high: i64 },

    #[error("ideal soil band is empty: min {min}% must be below max {max}%")]
    EmptyIdealBand { min: f64, max: f64 },
}

impl Calibration {
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.soil_wet >= self.soil_dry {
            return Err(CalibrationError::EmptySoilRange {
                wet: self.soil_wet,
                dry: self.soil_dry,
            });
        }
        if self.light_low >= self.light_high {
            return Err(CalibrationError::EmptyLightRange {
                low: self.light_low,
                high: self.light_high,
            });
        }
        if self.ideal_soil_min >= self.ideal_soil_max {
            return Err(CalibrationError::EmptyIdealBand {
                min: self.ideal_soil_min,
                max: self.ideal_soil_max,
            });
        }
        Ok(())
    }

    fn band_midpoint(&self) -> f64 {
        (self.ideal_soil_min + self.ideal_soil_max) / 2.0
    }

    fn band_half_width(&self) -> f64 {
        (self.ideal_soil_max - self.ideal_soil_min) / 2.0
    }
}

/// Weights for combining the soil and light sub-scores.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub soil: f64,
    pub light: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            soil: 0.6,
            light: 0.4,
        }
    }
}

/// Converts raw sensor counts into bounded percentages and a weighted
/// happiness score. Consumes raw values only; feeding already-normalized
/// percentages back through the engine is unsupported.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    calibration: Calibration,
    weights: ScoreWeights,
}

impl ScoringEngine {
    /// Validates the calibration up front so the percentage maps can never
    /// divide by zero.
    pub fn new(calibration: Calibration, weights: ScoreWeights) -> Result<Self, CalibrationError> {
        calibration.validate()?;
        Ok(Self {
            calibration,
            weights,
        })
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Linear inverse map: raw at the wet bound reads 100%, raw at the dry
    /// bound reads 0%.
    pub fn soil_pct(&self, raw: f64) -> f64 {
        let cal = &self.calibration;
        let pct = (cal.soil_dry as f64 - raw) / (cal.soil_dry - cal.soil_wet) as f64 * 100.0;
        pct.clamp(0.0, 100.0)
    }

    /// Linear direct map: raw at the low bound reads 0%, raw at the high
    /// bound reads 100%.
    pub fn light_pct(&self, raw: f64) -> f64 {
        let cal = &self.calibration;
        let pct = (raw - cal.light_low as f64) / (cal.light_high - cal.light_low) as f64 * 100.0;
        pct.clamp(0.0, 100.0)
    }

    /// 100 anywhere inside the ideal band (edges inclusive); outside, decays
    /// linearly with distance from the band midpoint, scaled by the half
    /// width, flooring at 0.
    pub fn soil_score(&self, soil_pct: f64) -> f64 {
        let cal = &self.calibration;
        if soil_pct >= cal.ideal_soil_min && soil_pct <= cal.ideal_soil_max {
            return 100.0;
        }
        let distance = (soil_pct - cal.band_midpoint()).abs();
        let score = (1.0 - distance / cal.band_half_width()) * 100.0;
        score.clamp(0.0, 100.0)
    }

    /// Brightness is its own score: more light is better, with no
    /// excess-light penalty.
    pub fn light_score(&self, light_pct: f64) -> f64 {
        light_pct
    }

    pub fn happiness(&self, soil_pct: f64, light_pct: f64) -> f64 {
        let score = self.weights.soil * self.soil_score(soil_pct)
            + self.weights.light * self.light_score(light_pct);
        score.clamp(0.0, 100.0)
    }

    /// Score one raw sample into a full reading.
    pub fn score(&self, timestamp: NaiveDateTime, soil_raw: i64, light_raw: i64) -> Reading {
        let soil_pct = self.soil_pct(soil_raw as f64);
        let light_pct = self.light_pct(light_raw as f64);
        Reading {
            timestamp,
            soil_raw: Some(soil_raw),
            light_raw: Some(light_raw),
            soil_pct,
            light_pct,
            happiness: self.happiness(soil_pct, light_pct),
        }
    }
}
