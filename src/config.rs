//! Configuration management for analysis parameter tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling fast iteration on detection thresholds without recompilation.
//! Every field has a default, so a config file only needs the keys it
//! wants to override.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::AnalysisError;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub onset_detection: OnsetDetectionConfig,
    pub session: SessionConfig,
}

/// Onset detection algorithm parameters
///
/// Immutable for the duration of an analysis call; the analyzer never keeps
/// tuning state of its own between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnsetDetectionConfig {
    /// Floor on the flux threshold
    pub minimum_threshold: f32,
    /// Scales the measured noise floor into a flux threshold
    pub noise_floor_multiplier: f32,
    /// Debounce window between accepted onsets
    pub min_peak_separation_ms: f64,
    /// Margin a peak must clear above the threshold
    pub peak_strength_multiplier: f32,
    /// Cutoff of the first-order high-pass pre-filter
    pub high_pass_cutoff_hz: f32,
    /// FFT window size in samples
    pub fft_window_size: usize,
    /// Hop size for overlapping windows
    pub hop_size: usize,
    /// Lowest bin centre frequency contributing to flux
    pub flux_band_low_hz: f32,
    /// Highest bin centre frequency contributing to flux
    pub flux_band_high_hz: f32,
}

impl Default for OnsetDetectionConfig {
    fn default() -> Self {
        Self {
            minimum_threshold: 0.15,
            noise_floor_multiplier: 3.0,
            min_peak_separation_ms: 50.0,
            peak_strength_multiplier: 1.5,
            high_pass_cutoff_hz: 60.0,
            fft_window_size: 2048,
            hop_size: 512,
            flux_band_low_hz: 200.0,
            flux_band_high_hz: 8000.0,
        }
    }
}

impl OnsetDetectionConfig {
    /// Check the parameters are usable before any processing starts
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.fft_window_size < 2 {
            return Err(AnalysisError::invalid(format!(
                "fft_window_size must be at least 2 (got {})",
                self.fft_window_size
            )));
        }
        if self.hop_size == 0 || self.hop_size > self.fft_window_size {
            return Err(AnalysisError::invalid(format!(
                "hop_size must be in 1..={} (got {})",
                self.fft_window_size, self.hop_size
            )));
        }
        if !(self.high_pass_cutoff_hz.is_finite() && self.high_pass_cutoff_hz > 0.0) {
            return Err(AnalysisError::invalid(format!(
                "high_pass_cutoff_hz must be positive (got {})",
                self.high_pass_cutoff_hz
            )));
        }
        if !(self.flux_band_low_hz.is_finite()
            && self.flux_band_high_hz.is_finite()
            && self.flux_band_low_hz >= 0.0
            && self.flux_band_low_hz < self.flux_band_high_hz)
        {
            return Err(AnalysisError::invalid(format!(
                "flux band {}-{} Hz is empty or malformed",
                self.flux_band_low_hz, self.flux_band_high_hz
            )));
        }

        let non_negative = [
            ("minimum_threshold", self.minimum_threshold),
            ("noise_floor_multiplier", self.noise_floor_multiplier),
            ("peak_strength_multiplier", self.peak_strength_multiplier),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AnalysisError::invalid(format!(
                    "{} must be a non-negative number (got {})",
                    name, value
                )));
            }
        }
        if !(self.min_peak_separation_ms.is_finite() && self.min_peak_separation_ms >= 0.0) {
            return Err(AnalysisError::invalid(format!(
                "min_peak_separation_ms must be a non-negative number (got {})",
                self.min_peak_separation_ms
            )));
        }

        Ok(())
    }
}

/// Practice session parameters used by the CLI and host layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tempo_bpm: u32,
    pub duration_seconds: f64,
    /// Round-trip latency measured by the external calibration routine
    pub latency_offset_ms: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: 120,
            duration_seconds: 60.0,
            latency_offset_ms: 0.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/analyzer_config.json")
    }
}
