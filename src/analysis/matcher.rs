//! Matcher - pairs detected onsets with expected beats
//!
//! Timing analysis against the beat grid:
//! - Latency compensation applied once to every onset
//! - Greedy nearest-neighbour matching within ±300ms, in ascending beat order
//! - ON_TIME/EARLY/LATE classification with a 10ms on-time window
//!
//! An onset claimed by an earlier beat is never reused, so a later beat can go
//! unmatched even when that onset was closer to it. Beats without a qualifying
//! onset produce no event at all.

use serde::{Deserialize, Serialize};

use crate::analysis::peak_picker::Onset;

/// Maximum distance between a corrected onset and its beat (inclusive)
pub const MATCH_TOLERANCE_MS: f64 = 300.0;

/// Errors strictly inside this window count as on time
pub const ON_TIME_TOLERANCE_MS: f64 = 10.0;

/// Timing classification for a matched tap relative to its beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingClassification {
    /// |error| < 10ms
    OnTime,
    /// Before the beat, outside the on-time window
    Early,
    /// After the beat, outside the on-time window
    Late,
}

impl TimingClassification {
    pub fn from_error_ms(error_ms: f64) -> Self {
        if error_ms.abs() < ON_TIME_TOLERANCE_MS {
            TimingClassification::OnTime
        } else if error_ms < 0.0 {
            TimingClassification::Early
        } else {
            TimingClassification::Late
        }
    }
}

/// One matched beat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapEvent {
    /// Index of the beat in the grid
    pub beat_index: usize,
    /// Latency-corrected onset time in seconds
    pub actual_time_s: f64,
    /// Beat time in seconds
    pub expected_time_s: f64,
    /// Signed timing error in milliseconds
    /// - Positive values indicate late (after beat)
    /// - Negative values indicate early (before beat)
    pub error_ms: f64,
}

impl TapEvent {
    pub fn is_early(&self) -> bool {
        self.error_ms < 0.0
    }

    pub fn is_late(&self) -> bool {
        self.error_ms > 0.0
    }

    pub fn is_on_time(&self) -> bool {
        self.error_ms.abs() < ON_TIME_TOLERANCE_MS
    }

    pub fn classification(&self) -> TimingClassification {
        TimingClassification::from_error_ms(self.error_ms)
    }
}

/// Match onsets to the beat grid and compute per-beat timing errors.
///
/// # Arguments
/// * `onsets` - Detected onsets, timestamps relative to the buffer start
/// * `beat_times_s` - Expected beat timestamps in ascending order
/// * `latency_offset_ms` - Round-trip latency subtracted from every onset
///
/// # Returns
/// One `TapEvent` per beat that found an unclaimed onset within
/// `MATCH_TOLERANCE_MS`, in beat order. Equidistant onsets resolve to the
/// earlier one.
pub fn match_onsets(onsets: &[Onset], beat_times_s: &[f64], latency_offset_ms: f64) -> Vec<TapEvent> {
    let latency_s = latency_offset_ms / 1000.0;
    let corrected: Vec<f64> = onsets.iter().map(|o| o.time_s - latency_s).collect();
    let mut claimed = vec![false; corrected.len()];
    let mut taps = Vec::with_capacity(beat_times_s.len().min(corrected.len()));

    for (beat_index, &expected) in beat_times_s.iter().enumerate() {
        let mut best: Option<(usize, f64)> = None;

        for (onset_index, &actual) in corrected.iter().enumerate() {
            if claimed[onset_index] {
                continue;
            }
            let distance_ms = (actual - expected).abs() * 1000.0;
            if distance_ms > MATCH_TOLERANCE_MS {
                continue;
            }
            // Strict comparison keeps the earliest index on ties
            if best.map_or(true, |(_, best_distance)| distance_ms < best_distance) {
                best = Some((onset_index, distance_ms));
            }
        }

        if let Some((onset_index, _)) = best {
            claimed[onset_index] = true;
            let actual = corrected[onset_index];
            taps.push(TapEvent {
                beat_index,
                actual_time_s: actual,
                expected_time_s: expected,
                error_ms: (actual - expected) * 1000.0,
            });
        }
    }

    taps
}
