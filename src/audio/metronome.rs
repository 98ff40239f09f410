//! Metronome - Sample-accurate click rendering
//!
//! The analyzer never plays a metronome, but it has to recognise one that
//! leaked into the microphone. This module renders the electronically exact
//! click track such a leak would contain:
//! - 20ms white noise burst click samples
//! - Sample-accurate beat positions derived from the tempo
//! - Pure functions (no side effects, deterministic output)

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Duration of metronome click in milliseconds
const CLICK_DURATION_MS: f32 = 20.0;

/// Generates a metronome click sample (20ms white noise burst).
///
/// The noise is generated using a fixed seed to ensure identical output across calls.
///
/// # Arguments
/// * `sample_rate` - Sample rate in Hz (typically 44100)
///
/// # Returns
/// A `Vec<f32>` containing exactly 20ms worth of white noise samples in range [-1.0, 1.0]
pub fn generate_click_sample(sample_rate: u32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * CLICK_DURATION_MS / 1000.0) as usize;

    let mut rng = StdRng::seed_from_u64(42);

    (0..num_samples).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// Sample index of a beat, computed from the beat index rather than
/// accumulated so long takes do not drift.
#[inline]
pub fn beat_sample_position(beat_index: usize, bpm: u32, sample_rate: u32) -> usize {
    (beat_index as f64 * 60.0 * sample_rate as f64 / bpm as f64).round() as usize
}

/// Render a click track of `duration_seconds`, with one click on every beat
/// from `first_beat` onwards, scaled by `level`.
pub fn render_click_track(
    bpm: u32,
    duration_seconds: f64,
    sample_rate: u32,
    level: f32,
    first_beat: usize,
) -> Vec<f32> {
    let total_samples = (duration_seconds * sample_rate as f64).round() as usize;
    let mut track = vec![0.0f32; total_samples];
    if bpm == 0 {
        return track;
    }

    let click = generate_click_sample(sample_rate);
    let mut beat = first_beat;
    loop {
        let start = beat_sample_position(beat, bpm, sample_rate);
        if start >= total_samples {
            break;
        }
        for (dst, &src) in track[start..].iter_mut().zip(click.iter()) {
            *dst += src * level;
        }
        beat += 1;
    }

    track
}
