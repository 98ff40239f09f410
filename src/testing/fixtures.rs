//! Deterministic synthetic practice takes for tests and the `synth` command.
//!
//! Every signal is generated from a seeded `StdRng`, so a given
//! [`PerformanceSpec`] always renders the same samples. A take is either a
//! human performance (decaying noise bursts with optional lag and jitter) or
//! metronome bleed (the electronically exact click track).

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::audio::metronome::render_click_track;
use crate::audio::AudioBuffer;

/// Sample rate of the reference deployment
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Repeating timing offsets of a steady but human player, in milliseconds
pub const JITTER_PATTERN_MS: [f64; 8] = [-10.0, 10.0, -9.0, 9.0, -10.0, 10.0, -8.0, 8.0];

/// Envelope of one synthetic percussive hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitShape {
    /// Peak amplitude of the noise burst
    pub amplitude: f32,
    /// Exponential decay time constant
    pub decay_ms: f32,
}

impl Default for HitShape {
    fn default() -> Self {
        Self {
            amplitude: 0.9,
            decay_ms: 5.0,
        }
    }
}

impl HitShape {
    /// Samples rendered per hit; the envelope is below -60 dB past this point
    fn length_samples(&self, sample_rate: u32) -> usize {
        (8.0 * self.decay_ms as f64 / 1000.0 * sample_rate as f64).ceil() as usize
    }
}

/// Render decaying noise bursts starting at each of `hit_times_s`.
///
/// Hits that start outside the buffer are skipped; overlapping hits add.
pub fn render_hits(
    sample_rate: u32,
    total_samples: usize,
    hit_times_s: &[f64],
    shape: &HitShape,
    seed: u64,
) -> Vec<f32> {
    let mut samples = vec![0.0f32; total_samples];
    let mut rng = StdRng::seed_from_u64(seed);
    let length = shape.length_samples(sample_rate);
    let decay_samples = shape.decay_ms as f64 / 1000.0 * sample_rate as f64;

    for &time_s in hit_times_s {
        if !time_s.is_finite() || time_s < 0.0 {
            continue;
        }
        let start = (time_s * sample_rate as f64).round() as usize;
        if start >= total_samples {
            continue;
        }

        for (n, dst) in samples[start..].iter_mut().take(length).enumerate() {
            let envelope = shape.amplitude * (-(n as f64) / decay_samples).exp() as f32;
            *dst += envelope * rng.gen_range(-1.0f32..1.0);
        }
    }

    samples
}

/// Uniform white noise with the requested RMS level
pub fn white_noise(total_samples: usize, rms: f32, seed: u64) -> Vec<f32> {
    if rms <= 0.0 {
        return vec![0.0; total_samples];
    }
    // Uniform on [-a, a] has RMS a / sqrt(3)
    let amplitude = rms * 3.0f32.sqrt();
    let mut rng = StdRng::seed_from_u64(seed);
    (0..total_samples)
        .map(|_| rng.gen_range(-amplitude..amplitude))
        .collect()
}

/// Declarative description of a synthetic practice take.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSpec {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_tempo_bpm")]
    pub tempo_bpm: u32,
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: f64,
    /// First beat that receives a hit (beat 0 sits on the very first frame)
    #[serde(default = "default_first_beat")]
    pub first_beat: usize,
    /// Number of hits; `None` plays every remaining beat of the take
    #[serde(default)]
    pub beat_count: Option<usize>,
    /// Constant delay added to every hit
    #[serde(default)]
    pub lag_ms: f64,
    /// Per-hit offsets, cycled when shorter than the number of hits
    #[serde(default)]
    pub jitter_ms: Vec<f64>,
    /// Background white noise level
    #[serde(default)]
    pub noise_rms: f32,
    /// Render the metronome click instead of human hits. Lag, jitter and
    /// beat count do not apply: the click lands on every beat from
    /// `first_beat` onwards.
    #[serde(default)]
    pub bleed: bool,
    #[serde(default = "default_bleed_level")]
    pub bleed_level: f32,
    #[serde(default)]
    pub hit_shape: HitShape,
    #[serde(default)]
    pub seed: u64,
}

impl Default for PerformanceSpec {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            tempo_bpm: default_tempo_bpm(),
            duration_seconds: default_duration_seconds(),
            first_beat: default_first_beat(),
            beat_count: None,
            lag_ms: 0.0,
            jitter_ms: Vec::new(),
            noise_rms: 0.0,
            bleed: false,
            bleed_level: default_bleed_level(),
            hit_shape: HitShape::default(),
            seed: 0,
        }
    }
}

impl PerformanceSpec {
    /// Eight hits at 0.5s..4.0s over 5s at 120 BPM, with human jitter
    pub fn human_take(seed: u64) -> Self {
        Self {
            beat_count: Some(8),
            jitter_ms: JITTER_PATTERN_MS.to_vec(),
            seed,
            ..Default::default()
        }
    }

    /// Metronome clicks leaking into the microphone, 5s at 120 BPM
    pub fn metronome_bleed() -> Self {
        Self {
            bleed: true,
            ..Default::default()
        }
    }

    pub fn total_samples(&self) -> usize {
        (self.duration_seconds * self.sample_rate as f64).round() as usize
    }

    /// Nominal grid time of a beat
    fn beat_time_s(&self, beat: usize) -> f64 {
        beat as f64 * 60.0 / self.tempo_bpm as f64
    }

    /// Onset times actually rendered, in seconds
    pub fn hit_times_s(&self) -> Vec<f64> {
        if self.tempo_bpm == 0 {
            return Vec::new();
        }

        let mut times = Vec::new();
        let mut beat = self.first_beat;
        let mut index = 0usize;
        loop {
            let nominal = self.beat_time_s(beat);
            if nominal >= self.duration_seconds {
                break;
            }
            if !self.bleed && self.beat_count.is_some_and(|count| index >= count) {
                break;
            }

            let time = if self.bleed {
                nominal
            } else {
                let jitter = if self.jitter_ms.is_empty() {
                    0.0
                } else {
                    self.jitter_ms[index % self.jitter_ms.len()]
                };
                nominal + (self.lag_ms + jitter) / 1000.0
            };
            if time < self.duration_seconds {
                times.push(time);
            }

            beat += 1;
            index += 1;
        }

        times
    }

    /// Render the take as mono samples
    pub fn render(&self) -> Vec<f32> {
        let total = self.total_samples();
        let mut samples = if self.bleed {
            let mut track = render_click_track(
                self.tempo_bpm,
                self.duration_seconds,
                self.sample_rate,
                self.bleed_level,
                self.first_beat,
            );
            track.resize(total, 0.0);
            track
        } else {
            render_hits(
                self.sample_rate,
                total,
                &self.hit_times_s(),
                &self.hit_shape,
                self.seed,
            )
        };

        if self.noise_rms > 0.0 {
            let noise = white_noise(total, self.noise_rms, self.seed.wrapping_add(1));
            for (dst, n) in samples.iter_mut().zip(noise) {
                *dst += n;
            }
        }

        samples
    }

    pub fn render_buffer(&self) -> AudioBuffer {
        AudioBuffer::mono(self.render(), self.sample_rate)
    }
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_tempo_bpm() -> u32 {
    120
}

fn default_duration_seconds() -> f64 {
    5.0
}

fn default_first_beat() -> usize {
    1
}

fn default_bleed_level() -> f32 {
    0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::noise_floor::rms;

    #[test]
    fn test_render_hits_is_deterministic() {
        let a = render_hits(44_100, 44_100, &[0.25, 0.5], &HitShape::default(), 1);
        let b = render_hits(44_100, 44_100, &[0.25, 0.5], &HitShape::default(), 1);
        assert_eq!(a, b);

        let c = render_hits(44_100, 44_100, &[0.25, 0.5], &HitShape::default(), 2);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hits_start_at_requested_sample() {
        let samples = render_hits(44_100, 44_100, &[0.5], &HitShape::default(), 4);
        assert!(samples[..22_050].iter().all(|&s| s == 0.0));
        assert!(samples[22_050..22_100].iter().any(|&s| s != 0.0));

        let length = HitShape::default().length_samples(44_100);
        assert!(samples[22_050 + length..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_out_of_range_hits_are_skipped() {
        let samples = render_hits(8_000, 8_000, &[-0.1, 1.0, 2.0, f64::NAN], &HitShape::default(), 0);
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_white_noise_level() {
        let noise = white_noise(100_000, 0.04, 8);
        assert!((rms(&noise) - 0.04).abs() < 0.002);
        assert!(white_noise(16, 0.0, 8).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_human_take_hit_times() {
        let times = PerformanceSpec::human_take(0).hit_times_s();
        assert_eq!(times.len(), 8);
        assert!((times[0] - 0.49).abs() < 1e-12);
        assert!((times[1] - 1.01).abs() < 1e-12);
        assert!((times[7] - 4.008).abs() < 1e-12);
    }

    #[test]
    fn test_lag_shifts_every_hit() {
        let spec = PerformanceSpec {
            lag_ms: 46.0,
            beat_count: Some(3),
            ..Default::default()
        };
        let times = spec.hit_times_s();
        assert_eq!(times.len(), 3);
        for (i, t) in times.iter().enumerate() {
            assert!((t - ((i + 1) as f64 * 0.5 + 0.046)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_unbounded_take_fills_duration() {
        let spec = PerformanceSpec::default();
        // Beats 1..=9 of a 5s take at 120 BPM
        assert_eq!(spec.hit_times_s().len(), 9);
    }

    #[test]
    fn test_bleed_renders_click_track() {
        let spec = PerformanceSpec::metronome_bleed();
        let samples = spec.render();
        assert_eq!(samples.len(), spec.total_samples());
        assert_eq!(spec.hit_times_s().len(), 9);

        let expected = render_click_track(120, 5.0, 44_100, 0.5, 1);
        assert_eq!(samples, expected);
    }

    #[test]
    fn test_spec_json_defaults() {
        let spec: PerformanceSpec = serde_json::from_str(r#"{"tempo_bpm": 90, "lag_ms": 20.0}"#).unwrap();
        assert_eq!(spec.tempo_bpm, 90);
        assert_eq!(spec.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(spec.first_beat, 1);
        assert_eq!(spec.hit_shape, HitShape::default());
    }
}
