//! Session metrics and metronome-bleed detection
//!
//! - `average_error_ms`: mean absolute error over all taps
//! - `consistency_ms`: population standard deviation of the signed errors
//!
//! A non-empty take whose consistency falls below `BLEED_CONSISTENCY_FLOOR_MS`
//! is rejected as a captured metronome click, not scored as a human
//! performance.

use serde::{Deserialize, Serialize};

use crate::analysis::matcher::{TapEvent, TimingClassification};
use crate::error::AnalysisError;

/// Consistency below this on a non-empty take means suspected bleed
pub const BLEED_CONSISTENCY_FLOOR_MS: f64 = 3.0;

/// Mean signed error beyond which a player is rushing or dragging
pub const TENDENCY_THRESHOLD_MS: f64 = 20.0;

/// Accuracy statistics over one take. All zeros for an empty take.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub average_error_ms: f64,
    pub consistency_ms: f64,
}

impl SessionMetrics {
    pub fn from_taps(taps: &[TapEvent]) -> Self {
        if taps.is_empty() {
            return Self::default();
        }

        let n = taps.len() as f64;
        let average_error_ms = taps.iter().map(|t| t.error_ms.abs()).sum::<f64>() / n;

        let consistency_ms = if taps.len() < 2 {
            0.0
        } else {
            let mean = mean_signed_error_ms(taps);
            let variance = taps
                .iter()
                .map(|t| {
                    let d = t.error_ms - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
            variance.sqrt()
        };

        Self {
            average_error_ms,
            consistency_ms,
        }
    }
}

/// Reject takes that look machine-perfect.
///
/// Applies to every non-empty take, a single tap included: one tap has zero
/// spread and cannot be told apart from a leaked click.
pub fn check_bleed(taps: &[TapEvent], metrics: &SessionMetrics) -> Result<(), AnalysisError> {
    if !taps.is_empty() && metrics.consistency_ms < BLEED_CONSISTENCY_FLOOR_MS {
        return Err(AnalysisError::SuspectedBleed {
            consistency_ms: metrics.consistency_ms,
            tap_count: taps.len(),
        });
    }
    Ok(())
}

fn mean_signed_error_ms(taps: &[TapEvent]) -> f64 {
    if taps.is_empty() {
        return 0.0;
    }
    taps.iter().map(|t| t.error_ms).sum::<f64>() / taps.len() as f64
}

/// Overall drift of a take relative to the click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingTendency {
    /// Mean signed error below -20ms
    Rushing,
    Steady,
    /// Mean signed error above +20ms
    Dragging,
}

impl TimingTendency {
    pub fn from_mean_error_ms(mean_error_ms: f64) -> Self {
        if mean_error_ms < -TENDENCY_THRESHOLD_MS {
            TimingTendency::Rushing
        } else if mean_error_ms > TENDENCY_THRESHOLD_MS {
            TimingTendency::Dragging
        } else {
            TimingTendency::Steady
        }
    }
}

/// Hit/miss accounting over the whole beat grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_beats: usize,
    pub hits: usize,
    pub missed_beats: usize,
    /// hits / total_beats * 100 (0 when the grid is empty)
    pub accuracy_percent: f64,
    pub on_time_hits: usize,
    pub early_hits: usize,
    pub late_hits: usize,
    pub mean_signed_error_ms: f64,
    pub tendency: TimingTendency,
}

impl SessionSummary {
    pub fn new(taps: &[TapEvent], total_beats: usize) -> Self {
        let hits = taps.len();
        let count = |class: TimingClassification| {
            taps.iter().filter(|t| t.classification() == class).count()
        };
        let accuracy_percent = if total_beats == 0 {
            0.0
        } else {
            hits as f64 / total_beats as f64 * 100.0
        };
        let mean_signed_error_ms = mean_signed_error_ms(taps);

        Self {
            total_beats,
            hits,
            missed_beats: total_beats.saturating_sub(hits),
            accuracy_percent,
            on_time_hits: count(TimingClassification::OnTime),
            early_hits: count(TimingClassification::Early),
            late_hits: count(TimingClassification::Late),
            mean_signed_error_ms,
            tendency: TimingTendency::from_mean_error_ms(mean_signed_error_ms),
        }
    }
}
