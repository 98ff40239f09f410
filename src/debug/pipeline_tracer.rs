// Pipeline Tracer - Diagnostic logging for the offline analysis pipeline
//
// Provides structured trace points at every stage of one analysis run to help
// debug why hits are missed or doubled. Tracing only logs; it never changes
// the result of a run.
//
// Usage:
//   - Enable with RHYTHM_TRACE=1 environment variable
//   - Traces appear in logs with [TRACE] prefix
//   - Each trace includes stage name, timestamp, and relevant metrics

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

/// Environment variable that switches tracing on
pub const TRACE_ENV_VAR: &str = "RHYTHM_TRACE";

/// Global flag to enable/disable pipeline tracing
static TRACING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Counter for trace events (helps correlate related traces)
static TRACE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Initialize pipeline tracing based on environment variable
pub fn init() {
    let enabled = std::env::var(TRACE_ENV_VAR)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false);
    TRACING_ENABLED.store(enabled, Ordering::SeqCst);
    if enabled {
        log::info!("[TRACE] Pipeline tracing ENABLED - set RHYTHM_TRACE=0 to disable");
    }
}

/// Check if tracing is enabled
#[inline]
pub fn is_enabled() -> bool {
    TRACING_ENABLED.load(Ordering::Relaxed)
}

/// Enable tracing at runtime
pub fn enable() {
    TRACING_ENABLED.store(true, Ordering::SeqCst);
    log::info!("[TRACE] Pipeline tracing enabled at runtime");
}

/// Disable tracing at runtime
pub fn disable() {
    TRACING_ENABLED.store(false, Ordering::SeqCst);
    log::info!("[TRACE] Pipeline tracing disabled at runtime");
}

/// Pipeline stages for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Input buffer and parameters accepted
    Validate,
    /// High-pass filter applied
    PreFilter,
    /// Noise floor measured
    NoiseFloor,
    /// Flux curve computed
    SpectralFlux,
    /// Adaptive threshold derived
    Threshold,
    /// Candidates reduced to onsets
    PeakPick,
    /// Onsets paired with beats
    Match,
    /// Session metrics computed
    Score,
    /// Consistency checked against the bleed floor
    BleedCheck,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validate => "VALIDATE",
            PipelineStage::PreFilter => "PREFILTER",
            PipelineStage::NoiseFloor => "NOISE",
            PipelineStage::SpectralFlux => "FLUX",
            PipelineStage::Threshold => "THRESHOLD",
            PipelineStage::PeakPick => "PEAKS",
            PipelineStage::Match => "MATCH",
            PipelineStage::Score => "SCORE",
            PipelineStage::BleedCheck => "BLEED",
        }
    }
}

/// Global start time for relative timestamps
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

fn get_timestamp_us() -> u64 {
    let start = START_TIME.get_or_init(Instant::now);
    start.elapsed().as_micros() as u64
}

/// Log a trace event at a pipeline stage
///
/// Only logs if RHYTHM_TRACE=1 is set (or `enable()` was called).
///
/// # Arguments
/// * `stage` - The pipeline stage
/// * `message` - Descriptive message with metrics
#[inline]
pub fn trace(stage: PipelineStage, message: &str) {
    if !is_enabled() {
        return;
    }

    let id = TRACE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let ts = get_timestamp_us();

    log::info!(
        "[TRACE] {:>10} #{:06} @{:>10}us | {}",
        stage.as_str(),
        id,
        ts,
        message
    );
}

/// Log a trace event with formatted arguments
#[macro_export]
macro_rules! trace_pipeline {
    ($stage:expr, $($arg:tt)*) => {
        if $crate::debug::pipeline_tracer::is_enabled() {
            $crate::debug::pipeline_tracer::trace($stage, &format!($($arg)*));
        }
    };
}

/// Trace accepted input
pub fn trace_validate(samples: usize, sample_rate: u32, tempo_bpm: u32, duration_seconds: f64) {
    trace(
        PipelineStage::Validate,
        &format!(
            "samples={} rate={}Hz bpm={} duration={:.2}s",
            samples, sample_rate, tempo_bpm, duration_seconds
        ),
    );
}

/// Trace high-pass filtering
pub fn trace_prefilter(cutoff_hz: f32, alpha: f32) {
    trace(
        PipelineStage::PreFilter,
        &format!("cutoff={:.1}Hz alpha={:.5}", cutoff_hz, alpha),
    );
}

/// Trace noise floor measurement
pub fn trace_noise_floor(noise_floor: f32) {
    trace(
        PipelineStage::NoiseFloor,
        &format!("rms={:.5}", noise_floor),
    );
}

/// Trace flux curve statistics
pub fn trace_spectral_flux(frames: usize, max_flux: f32) {
    trace(
        PipelineStage::SpectralFlux,
        &format!("frames={} max_flux={:.4}", frames, max_flux),
    );
}

/// Trace threshold derivation
pub fn trace_threshold(threshold: f32, peak_threshold: f32) {
    trace(
        PipelineStage::Threshold,
        &format!("threshold={:.4} peak_threshold={:.4}", threshold, peak_threshold),
    );
}

/// Trace peak picking
pub fn trace_peak_pick(candidates: usize, onsets: usize) {
    trace(
        PipelineStage::PeakPick,
        &format!("candidates={} onsets={}", candidates, onsets),
    );
}

/// Trace onset-to-beat matching
pub fn trace_match(beats: usize, taps: usize, latency_ms: f64) {
    trace(
        PipelineStage::Match,
        &format!("beats={} taps={} latency={:+.1}ms", beats, taps, latency_ms),
    );
}

/// Trace session metrics
pub fn trace_score(average_error_ms: f64, consistency_ms: f64) {
    trace(
        PipelineStage::Score,
        &format!(
            "avg_error={:.2}ms consistency={:.2}ms",
            average_error_ms, consistency_ms
        ),
    );
}

/// Trace bleed decision
pub fn trace_bleed_check(consistency_ms: f64, flagged: bool) {
    trace(
        PipelineStage::BleedCheck,
        &format!(
            "consistency={:.2}ms {}",
            consistency_ms,
            if flagged { "SUSPECTED_BLEED" } else { "OK" }
        ),
    );
}
