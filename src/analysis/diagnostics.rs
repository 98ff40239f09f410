// Diagnostics - per-frame view of one analysis run for offline tuning
//
// Collecting diagnostics never changes the returned result: `DiagnosticRun`
// carries exactly what `analyze` would have returned, plus the intermediate
// values that produced it.

use serde::{Deserialize, Serialize};

use crate::analysis::peak_picker::Onset;
use crate::analysis::spectral_flux::FluxFrame;
use crate::analysis::AnalysisReport;
use crate::error::AnalysisError;

/// Raw flux and the threshold in effect for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameDiagnostic {
    pub time_s: f64,
    pub flux: f32,
    pub threshold: f32,
}

/// Intermediate values of the detection pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDiagnostics {
    /// RMS of the first second of the pre-filtered signal
    pub noise_floor: f32,
    pub threshold: f32,
    /// Threshold a local maximum must exceed to become an onset
    pub peak_threshold: f32,
    pub frames: Vec<FrameDiagnostic>,
    /// Frames above `threshold` before peak picking
    pub candidate_count: usize,
    pub onsets: Vec<Onset>,
    pub beat_times_s: Vec<f64>,
}

pub(crate) fn frame_diagnostics(frames: &[FluxFrame], threshold: f32) -> Vec<FrameDiagnostic> {
    frames
        .iter()
        .map(|f| FrameDiagnostic {
            time_s: f.time_s,
            flux: f.flux,
            threshold,
        })
        .collect()
}

impl AnalysisDiagnostics {
    /// Largest flux value seen, 0.0 when no frames were produced
    pub fn max_flux(&self) -> f32 {
        self.frames.iter().fold(0.0f32, |acc, f| acc.max(f.flux))
    }

    /// Frames whose flux crossed the threshold
    pub fn frames_above_threshold(&self) -> impl Iterator<Item = &FrameDiagnostic> {
        self.frames.iter().filter(|f| f.flux > f.threshold)
    }
}

/// Result of an instrumented run
///
/// `diagnostics` is `None` only when input validation failed before any
/// processing happened.
#[derive(Debug, Clone)]
pub struct DiagnosticRun {
    pub result: Result<AnalysisReport, AnalysisError>,
    pub diagnostics: Option<AnalysisDiagnostics>,
}
