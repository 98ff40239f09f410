//! Adaptive threshold and peak picking
//!
//! Converts the flux curve into a sparse, time-ordered onset list:
//! - Threshold: `T = max(minimum_threshold, noise_floor * noise_floor_multiplier + 0.1)`
//! - Candidates: frames whose flux exceeds `T`
//! - Local-maximum filter: a candidate must not be smaller than either neighbour
//! - Strength filter: the peak must exceed `T * peak_strength_multiplier`
//! - Temporal debounce: strongest peaks claim their neighbourhood first; any
//!   weaker peak within `min_peak_separation_ms` of an accepted one is dropped
//!
//! An empty result is a valid outcome (silence, or playing below sensitivity).

use serde::{Deserialize, Serialize};

use crate::analysis::spectral_flux::FluxFrame;
use crate::config::OnsetDetectionConfig;

/// Fixed offset added to the scaled noise floor
pub const THRESHOLD_OFFSET: f32 = 0.1;

/// Flux threshold for a measured noise floor
pub fn compute_threshold(noise_floor: f32, config: &OnsetDetectionConfig) -> f32 {
    config
        .minimum_threshold
        .max(noise_floor * config.noise_floor_multiplier + THRESHOLD_OFFSET)
}

/// A flux frame above threshold, before peak picking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnsetCandidate {
    pub frame_index: usize,
    pub time_s: f64,
    pub flux: f32,
}

/// A detected onset, relative to the start of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Onset {
    pub time_s: f64,
    /// Flux of the peak that produced this onset
    pub strength: f32,
}

/// Peak picker bound to one threshold
#[derive(Debug, Clone)]
pub struct PeakPicker {
    threshold: f32,
    peak_threshold: f32,
    min_separation_ms: f64,
}

impl PeakPicker {
    pub fn new(threshold: f32, config: &OnsetDetectionConfig) -> Self {
        Self {
            threshold,
            peak_threshold: threshold * config.peak_strength_multiplier,
            min_separation_ms: config.min_peak_separation_ms,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Flux a peak must exceed to survive the strength filter
    pub fn peak_threshold(&self) -> f32 {
        self.peak_threshold
    }

    /// All frames whose flux exceeds the threshold
    pub fn candidates(&self, frames: &[FluxFrame]) -> Vec<OnsetCandidate> {
        frames
            .iter()
            .enumerate()
            .filter(|(_, frame)| frame.flux > self.threshold)
            .map(|(frame_index, frame)| OnsetCandidate {
                frame_index,
                time_s: frame.time_s,
                flux: frame.flux,
            })
            .collect()
    }

    /// Run the three peak-picking rules over the candidates
    pub fn pick(&self, frames: &[FluxFrame], candidates: &[OnsetCandidate]) -> Vec<Onset> {
        let peaks: Vec<OnsetCandidate> = candidates
            .iter()
            .filter(|c| is_local_maximum(frames, c.frame_index))
            .filter(|c| c.flux > self.peak_threshold)
            .copied()
            .collect();

        self.debounce(peaks)
            .into_iter()
            .map(|c| Onset {
                time_s: c.time_s,
                strength: c.flux,
            })
            .collect()
    }

    /// Strength-ordered non-maximum suppression; ties go to the earlier frame
    fn debounce(&self, mut peaks: Vec<OnsetCandidate>) -> Vec<OnsetCandidate> {
        peaks.sort_by(|a, b| {
            b.flux
                .total_cmp(&a.flux)
                .then(a.frame_index.cmp(&b.frame_index))
        });

        let mut accepted: Vec<OnsetCandidate> = Vec::with_capacity(peaks.len());
        for peak in peaks {
            let clear = accepted
                .iter()
                .all(|kept| (peak.time_s - kept.time_s).abs() * 1000.0 >= self.min_separation_ms);
            if clear {
                accepted.push(peak);
            }
        }

        accepted.sort_by_key(|c| c.frame_index);
        accepted
    }
}

/// Not smaller than either existing neighbour
fn is_local_maximum(frames: &[FluxFrame], index: usize) -> bool {
    let current = frames[index].flux;
    let rises = index == 0 || current >= frames[index - 1].flux;
    let falls = index + 1 >= frames.len() || current >= frames[index + 1].flux;
    rises && falls
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const HOP_S: f64 = 512.0 / 44_100.0;

    fn frames(values: &[f32]) -> Vec<FluxFrame> {
        values
            .iter()
            .enumerate()
            .map(|(i, &flux)| FluxFrame {
                time_s: (i + 1) as f64 * HOP_S,
                flux,
            })
            .collect()
    }

    fn pick(values: &[f32], threshold: f32) -> Vec<Onset> {
        let picker = PeakPicker::new(threshold, &OnsetDetectionConfig::default());
        let frames = frames(values);
        let candidates = picker.candidates(&frames);
        picker.pick(&frames, &candidates)
    }

    #[test]
    fn test_threshold_formula() {
        let config = OnsetDetectionConfig::default();
        assert_eq!(compute_threshold(0.0, &config), 0.15);
        assert!((compute_threshold(0.1, &config) - 0.4).abs() < 1e-6);

        let strict = OnsetDetectionConfig {
            minimum_threshold: 0.5,
            ..Default::default()
        };
        assert_eq!(compute_threshold(0.1, &strict), 0.5);
    }

    #[test]
    fn test_slope_frames_are_not_onsets() {
        let onsets = pick(&[0.0, 0.5, 1.0, 2.0, 1.0, 0.5, 0.0], 0.15);
        assert_eq!(onsets.len(), 1);
        assert_eq!(onsets[0].strength, 2.0);
        assert!((onsets[0].time_s - 4.0 * HOP_S).abs() < 1e-12);
    }

    #[test]
    fn test_marginal_crossing_fails_strength_filter() {
        let picker = PeakPicker::new(0.15, &OnsetDetectionConfig::default());
        assert!((picker.peak_threshold() - 0.225).abs() < 1e-6);

        let frames = frames(&[0.0, 0.2, 0.0]);
        let candidates = picker.candidates(&frames);
        assert_eq!(candidates.len(), 1, "0.2 clears the base threshold");
        assert!(picker.pick(&frames, &candidates).is_empty());
    }

    #[test]
    fn test_debounce_keeps_stronger_peak() {
        // Peaks three hops apart (~35ms) collapse to the stronger one
        let mut values = vec![0.0; 20];
        values[2] = 1.0;
        values[5] = 2.0;
        values[15] = 1.5;
        let onsets = pick(&values, 0.15);

        let strengths: Vec<f32> = onsets.iter().map(|o| o.strength).collect();
        assert_eq!(strengths, vec![2.0, 1.5]);
        assert!(onsets[0].time_s < onsets[1].time_s);
    }

    #[test]
    fn test_plateau_yields_single_onset() {
        let onsets = pick(&[0.0, 1.0, 1.0, 0.0], 0.15);
        assert_eq!(onsets.len(), 1);
        assert!((onsets[0].time_s - 2.0 * HOP_S).abs() < 1e-12);
    }

    #[test]
    fn test_edge_frames_can_be_peaks() {
        let onsets = pick(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.8], 0.15);
        assert_eq!(onsets.len(), 2);
    }

    #[test]
    fn test_no_candidates_in_silence() {
        assert!(pick(&[0.0; 64], 0.15).is_empty());
    }

    #[test]
    fn test_random_flux_respects_min_separation() {
        let mut rng = StdRng::seed_from_u64(0xF1A5);
        let values: Vec<f32> = (0..2_000).map(|_| rng.gen_range(0.0..3.0)).collect();
        let onsets = pick(&values, 0.15);

        assert!(!onsets.is_empty());
        for pair in onsets.windows(2) {
            let gap_ms = (pair[1].time_s - pair[0].time_s) * 1000.0;
            assert!(gap_ms >= 50.0, "onsets only {:.2}ms apart", gap_ms);
        }
    }
}
