// Spectral flux extractor - per-frame onset strength
//
// Algorithm:
// 1. Slide a Hann-windowed frame of `fft_window_size` samples with stride `hop_size`
// 2. Calculate magnitude spectrum: |FFT[k]|, normalized by the window sum
// 3. Positive difference from previous frame: SF[k] = max(0, |FFT_t[k]| - |FFT_(t-1)[k]|)
// 4. Sum only bins whose centre frequency lies inside the flux band (200-8000 Hz)
// 5. Timestamp each value at the window centre
//
// The first frame has no predecessor and produces no flux value.

use std::ops::Range;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::config::OnsetDetectionConfig;

/// One onset-strength value, stamped at its window centre
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxFrame {
    pub time_s: f64,
    pub flux: f32,
}

/// Computes band-limited, half-wave rectified spectral flux over a whole take
pub struct SpectralFluxExtractor {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    window_size: usize,
    hop_size: usize,
    sample_rate: u32,
    band: Range<usize>,
    // 1 / Σw, so a full-scale sinusoid peaks near 0.5 regardless of window size
    normalization: f32,
}

impl SpectralFluxExtractor {
    /// Plan the FFT and pre-compute the Hann window for this sample rate.
    ///
    /// Expects a validated config (window >= 2, 0 < hop <= window).
    pub fn new(config: &OnsetDetectionConfig, sample_rate: u32) -> Self {
        let window_size = config.fft_window_size.max(2);
        let hop_size = config.hop_size.max(1);

        // Pre-compute Hann window to reduce spectral leakage
        let window: Vec<f32> = (0..window_size)
            .map(|i| {
                0.5 * (1.0
                    - ((2.0 * std::f32::consts::PI * i as f32) / (window_size as f32 - 1.0)).cos())
            })
            .collect();
        let window_sum: f32 = window.iter().sum();

        let fft = FftPlanner::new().plan_fft_forward(window_size);
        let band = band_bins(
            config.flux_band_low_hz,
            config.flux_band_high_hz,
            window_size,
            sample_rate,
        );

        Self {
            fft,
            window,
            window_size,
            hop_size,
            sample_rate,
            band,
            normalization: 1.0 / window_sum,
        }
    }

    /// Bin indices contributing to flux
    pub fn band(&self) -> Range<usize> {
        self.band.clone()
    }

    /// Number of full analysis windows that fit in `len` samples
    pub fn window_count(&self, len: usize) -> usize {
        if len < self.window_size {
            0
        } else {
            (len - self.window_size) / self.hop_size + 1
        }
    }

    /// Flux curve for the whole signal: one value per window after the first
    pub fn extract(&self, samples: &[f32]) -> Vec<FluxFrame> {
        let windows = self.window_count(samples.len());
        let mut frames = Vec::with_capacity(windows.saturating_sub(1));
        if windows == 0 {
            return frames;
        }

        let mut fft_buffer = vec![Complex::new(0.0f32, 0.0); self.window_size];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];
        let mut prev_spectrum = vec![0.0f32; self.window_size / 2 + 1];
        let mut spectrum = vec![0.0f32; self.window_size / 2 + 1];

        for index in 0..windows {
            let start = index * self.hop_size;
            let frame = &samples[start..start + self.window_size];
            self.magnitude_spectrum(frame, &mut fft_buffer, &mut scratch, &mut spectrum);

            if index > 0 {
                frames.push(FluxFrame {
                    time_s: (start + self.window_size / 2) as f64 / self.sample_rate as f64,
                    flux: self.band_flux(&prev_spectrum, &spectrum),
                });
            }

            std::mem::swap(&mut prev_spectrum, &mut spectrum);
        }

        frames
    }

    /// Windowed, normalized magnitude spectrum (positive frequencies only)
    fn magnitude_spectrum(
        &self,
        frame: &[f32],
        fft_buffer: &mut [Complex<f32>],
        scratch: &mut [Complex<f32>],
        out: &mut [f32],
    ) {
        for ((slot, &sample), &w) in fft_buffer.iter_mut().zip(frame).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }

        self.fft.process_with_scratch(fft_buffer, scratch);

        for (mag, c) in out.iter_mut().zip(fft_buffer.iter()) {
            *mag = c.norm() * self.normalization;
        }
    }

    /// SF(t) = Σ_{k in band} max(0, |X_t[k]| - |X_(t-1)[k]|)
    pub fn band_flux(&self, prev: &[f32], curr: &[f32]) -> f32 {
        let end = self.band.end.min(prev.len()).min(curr.len());
        let start = self.band.start.min(end);
        curr[start..end]
            .iter()
            .zip(&prev[start..end])
            .map(|(c, p)| (c - p).max(0.0))
            .sum()
    }
}

/// Bins whose centre frequency `k * fs / N` falls inside `[low_hz, high_hz]`,
/// clamped to the positive half of the spectrum.
fn band_bins(low_hz: f32, high_hz: f32, window_size: usize, sample_rate: u32) -> Range<usize> {
    let bin_hz = sample_rate as f64 / window_size as f64;
    let nyquist_bin = window_size / 2;

    let low = (low_hz as f64 / bin_hz).ceil().max(0.0) as usize;
    let high = ((high_hz as f64 / bin_hz).floor().max(0.0) as usize).min(nyquist_bin);

    if low > high {
        low..low
    } else {
        low..high + 1
    }
}
