// Beat grid - expected beat timestamps for a fixed tempo
//
// Beat i sits at i * 60 / bpm seconds. The grid holds
// floor(duration * bpm / 60) beats, so every beat lies in [0, duration).
// Each timestamp is computed directly from its index, never accumulated.

/// Seconds between consecutive beats
pub fn beat_period_seconds(tempo_bpm: u32) -> f64 {
    60.0 / tempo_bpm as f64
}

/// Expected beat timestamps in seconds, ascending from 0.0
///
/// Returns an empty grid for a zero tempo or a non-positive duration.
pub fn generate_beat_grid(tempo_bpm: u32, duration_seconds: f64) -> Vec<f64> {
    if tempo_bpm == 0 || !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Vec::new();
    }

    let period = beat_period_seconds(tempo_bpm);
    let count = (duration_seconds * tempo_bpm as f64 / 60.0).floor() as usize;

    (0..count).map(|i| i as f64 * period).collect()
}
