//! Noise floor estimation from the leading segment of a take.
//!
//! Measured on the pre-filtered signal so DC offset and rumble removed by the
//! high-pass stage do not inflate the threshold.

/// Length of the leading segment treated as ambient noise
pub const NOISE_FLOOR_WINDOW_SECONDS: f64 = 1.0;

/// RMS of the first second of `samples` (or all of them when shorter).
///
/// Never fails: an empty or silent slice yields 0.0.
pub fn estimate_noise_floor(samples: &[f32], sample_rate: u32) -> f32 {
    let window = (NOISE_FLOOR_WINDOW_SECONDS * sample_rate as f64) as usize;
    let lead = &samples[..window.min(samples.len())];
    rms(lead)
}

/// Root mean square, accumulated in f64 to keep long segments stable
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}
