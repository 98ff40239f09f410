// Pre-filter - first-order high-pass ahead of spectral analysis
//
// Removes DC bias and sub-bass rumble that would otherwise inflate spectral
// flux. Single pole RC form:
//   alpha = RC / (RC + dt),  RC = 1 / (2π fc),  dt = 1 / fs
//   y[n]  = alpha * (y[n-1] + x[n] - x[n-1])

use std::f64::consts::PI;

/// Single-pole high-pass filter
#[derive(Debug, Clone)]
pub struct HighPassFilter {
    alpha: f32,
}

impl HighPassFilter {
    /// # Arguments
    /// * `cutoff_hz` - -3 dB corner (60 Hz by default)
    /// * `sample_rate` - Sample rate of the signal to filter
    pub fn new(cutoff_hz: f32, sample_rate: u32) -> Self {
        let rc = 1.0 / (2.0 * PI * cutoff_hz as f64);
        let dt = 1.0 / sample_rate as f64;
        Self {
            alpha: (rc / (rc + dt)) as f32,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Filter the whole signal in one linear pass.
    ///
    /// The filter state starts at the first sample, so a constant input maps
    /// to exact silence instead of a decaying step.
    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        let mut output = Vec::with_capacity(input.len());
        let Some(&first) = input.first() else {
            return output;
        };

        let mut prev_input = first;
        let mut prev_output = 0.0f32;
        for &x in input {
            let y = self.alpha * (prev_output + x - prev_input);
            output.push(y);
            prev_input = x;
            prev_output = y;
        }

        output
    }
}
