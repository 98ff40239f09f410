// Analysis module - offline onset detection and timing scoring
//
// This module orchestrates the complete analysis pipeline over one fully
// materialized recording and produces a single terminal result.
//
// Architecture:
// - Detection: PreFilter → NoiseFloor → SpectralFlux → Threshold → PeakPicker
// - Scoring: BeatGrid → Matcher → Metrics → Bleed check
// - Output: AnalysisReport, or AnalysisError for invalid input / suspected bleed
//
// Every stage allocates its own buffers; nothing is shared between calls, so
// independent analyses may run concurrently.

use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::config::OnsetDetectionConfig;
use crate::debug::pipeline_tracer::{self, PipelineStage};
use crate::error::AnalysisError;

pub mod beat_grid;
pub mod diagnostics;
pub mod matcher;
pub mod metrics;
pub mod noise_floor;
pub mod peak_picker;
pub mod prefilter;
pub mod spectral_flux;
pub mod worker;

use beat_grid::generate_beat_grid;
use diagnostics::{frame_diagnostics, AnalysisDiagnostics, DiagnosticRun};
use matcher::{match_onsets, TapEvent};
use metrics::{check_bleed, SessionMetrics, SessionSummary};
use noise_floor::estimate_noise_floor;
use peak_picker::{compute_threshold, Onset, PeakPicker};
use prefilter::HighPassFilter;
use spectral_flux::{FluxFrame, SpectralFluxExtractor};

/// Slowest supported tempo
pub const MIN_TEMPO_BPM: u32 = 40;
/// Fastest supported tempo
pub const MAX_TEMPO_BPM: u32 = 200;
/// Largest beat grid a single analysis will build (a week at 200 BPM)
pub const MAX_GRID_BEATS: f64 = 2_016_000.0;

/// Outcome of a successful analysis
///
/// An empty `tap_events` list with zero metrics is a valid result: the player
/// was silent or below the detection threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// One event per matched beat, in beat order
    pub tap_events: Vec<TapEvent>,
    pub metrics: SessionMetrics,
    pub summary: SessionSummary,
    /// Onsets detected before matching
    pub onset_count: usize,
}

/// Intermediate detection state shared by the plain and instrumented runs
struct Detection {
    noise_floor: f32,
    threshold: f32,
    peak_threshold: f32,
    frames: Vec<FluxFrame>,
    candidate_count: usize,
    onsets: Vec<Onset>,
}

/// Analyze one recorded take against a metronome grid.
///
/// # Arguments
/// * `buffer` - Mono PCM recording; the sample rate is read from the buffer
/// * `tempo_bpm` - Metronome tempo, 40-200 BPM
/// * `duration_seconds` - Length of the beat grid, any positive value
/// * `latency_offset_ms` - Round-trip latency subtracted from every onset
/// * `config` - Detection parameters
///
/// # Returns
/// * `Ok(AnalysisReport)` - Possibly empty set of tap events plus metrics
/// * `Err(AnalysisError::InvalidInput)` - Input violated an invariant
/// * `Err(AnalysisError::SuspectedBleed)` - Taps were too consistent to be human
pub fn analyze(
    buffer: &AudioBuffer,
    tempo_bpm: u32,
    duration_seconds: f64,
    latency_offset_ms: f64,
    config: &OnsetDetectionConfig,
) -> Result<AnalysisReport, AnalysisError> {
    validate_request(buffer, tempo_bpm, duration_seconds, latency_offset_ms, config)?;
    let detection = detect(buffer, config);
    let beat_times_s = generate_beat_grid(tempo_bpm, duration_seconds);
    score(&detection.onsets, &beat_times_s, latency_offset_ms)
}

/// Same as [`analyze`], additionally returning per-frame flux, the threshold
/// in effect and the measured noise floor.
///
/// The `result` field is identical to what `analyze` returns for the same
/// input.
pub fn analyze_with_diagnostics(
    buffer: &AudioBuffer,
    tempo_bpm: u32,
    duration_seconds: f64,
    latency_offset_ms: f64,
    config: &OnsetDetectionConfig,
) -> DiagnosticRun {
    if let Err(err) = validate_request(buffer, tempo_bpm, duration_seconds, latency_offset_ms, config)
    {
        return DiagnosticRun {
            result: Err(err),
            diagnostics: None,
        };
    }

    let detection = detect(buffer, config);
    let beat_times_s = generate_beat_grid(tempo_bpm, duration_seconds);
    let result = score(&detection.onsets, &beat_times_s, latency_offset_ms);

    let diagnostics = AnalysisDiagnostics {
        noise_floor: detection.noise_floor,
        threshold: detection.threshold,
        peak_threshold: detection.peak_threshold,
        frames: frame_diagnostics(&detection.frames, detection.threshold),
        candidate_count: detection.candidate_count,
        onsets: detection.onsets,
        beat_times_s,
    };

    DiagnosticRun {
        result,
        diagnostics: Some(diagnostics),
    }
}

/// Run only the detection half of the pipeline.
///
/// Returns the time-ordered onsets found in `buffer`, timestamps relative to
/// the start of the buffer and not latency-corrected.
pub fn detect_onsets(
    buffer: &AudioBuffer,
    config: &OnsetDetectionConfig,
) -> Result<Vec<Onset>, AnalysisError> {
    buffer.validate()?;
    config.validate()?;
    Ok(detect(buffer, config).onsets)
}

/// Reject malformed input before any processing happens
pub fn validate_request(
    buffer: &AudioBuffer,
    tempo_bpm: u32,
    duration_seconds: f64,
    latency_offset_ms: f64,
    config: &OnsetDetectionConfig,
) -> Result<(), AnalysisError> {
    buffer.validate()?;

    if !(MIN_TEMPO_BPM..=MAX_TEMPO_BPM).contains(&tempo_bpm) {
        return Err(AnalysisError::invalid(format!(
            "tempo {} BPM outside supported range {}-{}",
            tempo_bpm, MIN_TEMPO_BPM, MAX_TEMPO_BPM
        )));
    }
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(AnalysisError::invalid(format!(
            "duration must be a positive number of seconds, got {}",
            duration_seconds
        )));
    }
    let grid_beats = (duration_seconds * tempo_bpm as f64 / 60.0).floor();
    if grid_beats > MAX_GRID_BEATS {
        return Err(AnalysisError::invalid(format!(
            "duration of {}s at {} BPM needs {} beats, limit is {}",
            duration_seconds, tempo_bpm, grid_beats, MAX_GRID_BEATS
        )));
    }
    if !latency_offset_ms.is_finite() {
        return Err(AnalysisError::invalid(format!(
            "latency offset must be finite, got {}",
            latency_offset_ms
        )));
    }

    config.validate()?;

    pipeline_tracer::trace_validate(
        buffer.len(),
        buffer.sample_rate(),
        tempo_bpm,
        duration_seconds,
    );
    Ok(())
}

/// Detection stages over a validated buffer
fn detect(buffer: &AudioBuffer, config: &OnsetDetectionConfig) -> Detection {
    let sample_rate = buffer.sample_rate();

    let filter = HighPassFilter::new(config.high_pass_cutoff_hz, sample_rate);
    let filtered = filter.apply(buffer.samples());
    pipeline_tracer::trace_prefilter(config.high_pass_cutoff_hz, filter.alpha());

    let noise_floor = estimate_noise_floor(&filtered, sample_rate);
    pipeline_tracer::trace_noise_floor(noise_floor);

    let extractor = SpectralFluxExtractor::new(config, sample_rate);
    crate::trace_pipeline!(
        PipelineStage::SpectralFlux,
        "bins={:?} window={} hop={}",
        extractor.band(),
        config.fft_window_size,
        config.hop_size
    );
    let frames = extractor.extract(&filtered);
    let max_flux = frames.iter().fold(0.0f32, |acc, f| acc.max(f.flux));
    pipeline_tracer::trace_spectral_flux(frames.len(), max_flux);

    let threshold = compute_threshold(noise_floor, config);
    let picker = PeakPicker::new(threshold, config);
    pipeline_tracer::trace_threshold(picker.threshold(), picker.peak_threshold());

    let candidates = picker.candidates(&frames);
    let onsets = picker.pick(&frames, &candidates);
    pipeline_tracer::trace_peak_pick(candidates.len(), onsets.len());

    tracing::debug!(
        "[Analyzer] noise_floor={:.5} threshold={:.4} frames={} candidates={} onsets={}",
        noise_floor,
        threshold,
        frames.len(),
        candidates.len(),
        onsets.len()
    );

    Detection {
        noise_floor,
        threshold,
        peak_threshold: picker.peak_threshold(),
        frames,
        candidate_count: candidates.len(),
        onsets,
    }
}

/// Scoring stages: match, measure, reject bleed
fn score(
    onsets: &[Onset],
    beat_times_s: &[f64],
    latency_offset_ms: f64,
) -> Result<AnalysisReport, AnalysisError> {
    let tap_events = match_onsets(onsets, beat_times_s, latency_offset_ms);
    pipeline_tracer::trace_match(beat_times_s.len(), tap_events.len(), latency_offset_ms);

    let metrics = SessionMetrics::from_taps(&tap_events);
    pipeline_tracer::trace_score(metrics.average_error_ms, metrics.consistency_ms);

    let bleed = check_bleed(&tap_events, &metrics);
    pipeline_tracer::trace_bleed_check(metrics.consistency_ms, bleed.is_err());
    if let Err(err) = bleed {
        tracing::warn!(
            "[Analyzer] Rejecting take: consistency {:.2}ms over {} taps looks like metronome bleed",
            metrics.consistency_ms,
            tap_events.len()
        );
        return Err(err);
    }

    let summary = SessionSummary::new(&tap_events, beat_times_s.len());
    tracing::info!(
        "[Analyzer] {} of {} beats matched, avg_error={:.2}ms consistency={:.2}ms",
        summary.hits,
        summary.total_beats,
        metrics.average_error_ms,
        metrics.consistency_ms
    );

    Ok(AnalysisReport {
        tap_events,
        metrics,
        summary,
        onset_count: onsets.len(),
    })
}
