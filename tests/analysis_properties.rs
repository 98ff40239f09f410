use rhythm_analyzer::analysis::metrics::SessionMetrics;
use rhythm_analyzer::testing::fixtures::{
    render_hits, white_noise, HitShape, PerformanceSpec, JITTER_PATTERN_MS,
};
use rhythm_analyzer::{analyze, detect_onsets, AnalysisError, AudioBuffer, OnsetDetectionConfig};

const SAMPLE_RATE: u32 = 44_100;

fn default_config() -> OnsetDetectionConfig {
    OnsetDetectionConfig::default()
}

/// Hop that divides one beat at 120 BPM / 44.1 kHz exactly, so every click
/// lands on the same frame phase
fn phase_locked_config() -> OnsetDetectionConfig {
    OnsetDetectionConfig {
        hop_size: 441,
        ..Default::default()
    }
}

fn jittered_take(tempo_bpm: u32, duration_seconds: f64, seed: u64) -> PerformanceSpec {
    PerformanceSpec {
        tempo_bpm,
        duration_seconds,
        jitter_ms: JITTER_PATTERN_MS.to_vec(),
        seed,
        ..Default::default()
    }
}

#[test]
fn silence_yields_empty_report() {
    for (seconds, bpm) in [(0.01, 120), (1.0, 60), (5.0, 120), (5.0, 200)] {
        let samples = vec![0.0; (seconds * SAMPLE_RATE as f64) as usize];
        let buffer = AudioBuffer::mono(samples, SAMPLE_RATE);

        let report = analyze(&buffer, bpm, 5.0, 0.0, &default_config())
            .unwrap_or_else(|e| panic!("silence of {}s failed: {}", seconds, e));
        assert!(report.tap_events.is_empty());
        assert_eq!(report.metrics, SessionMetrics::default());
        assert_eq!(report.onset_count, 0);
    }
}

#[test]
fn low_level_noise_yields_no_onsets() {
    for (rms, seed) in [(0.03, 1), (0.04, 2), (0.05, 3)] {
        let buffer = AudioBuffer::mono(white_noise(5 * SAMPLE_RATE as usize, rms, seed), SAMPLE_RATE);

        let onsets = detect_onsets(&buffer, &default_config()).unwrap();
        assert!(onsets.is_empty(), "noise at rms {} produced {} onsets", rms, onsets.len());

        for bpm in [60, 120, 180] {
            let report = analyze(&buffer, bpm, 5.0, 0.0, &default_config()).unwrap();
            assert!(report.tap_events.is_empty());
        }
    }
}

#[test]
fn known_impulses_are_recalled() {
    for bpm in [60, 90, 120, 140] {
        let mut spec = jittered_take(bpm, 5.0, bpm as u64);
        spec.noise_rms = 0.01;
        let expected = spec.hit_times_s().len();

        let report = analyze(&spec.render_buffer(), bpm, 5.0, 0.0, &default_config()).unwrap();
        let taps = report.tap_events.len();
        assert!(
            taps + 1 >= expected && taps <= expected + 1,
            "{} BPM: {} taps for {} hits",
            bpm,
            taps,
            expected
        );
        for tap in &report.tap_events {
            assert!(tap.error_ms.abs() < 50.0, "{} BPM: error {:.1}ms", bpm, tap.error_ms);
        }
    }
}

#[test]
fn fast_tempo_detects_every_hit() {
    // At 200 BPM the beat period equals the match window, so only detection
    // is checked here
    let spec = jittered_take(200, 5.0, 200);
    let onsets = detect_onsets(&spec.render_buffer(), &default_config()).unwrap();
    assert_eq!(onsets.len(), spec.hit_times_s().len());
}

#[test]
fn onsets_respect_min_separation() {
    // Each hit is followed 25ms later by a weaker echo
    let hits = [1.0, 1.5, 2.0, 2.5];
    let echoes: Vec<f64> = hits.iter().map(|t| t + 0.025).collect();
    let total = 3 * SAMPLE_RATE as usize;

    let main = render_hits(SAMPLE_RATE, total, &hits, &HitShape::default(), 5);
    let echo_shape = HitShape {
        amplitude: 0.6,
        ..Default::default()
    };
    let echo = render_hits(SAMPLE_RATE, total, &echoes, &echo_shape, 6);
    let samples: Vec<f32> = main.iter().zip(&echo).map(|(a, b)| a + b).collect();
    let buffer = AudioBuffer::mono(samples, SAMPLE_RATE);

    let config = default_config();
    let onsets = detect_onsets(&buffer, &config).unwrap();
    assert_eq!(onsets.len(), hits.len());
    for pair in onsets.windows(2) {
        let gap_ms = (pair[1].time_s - pair[0].time_s) * 1000.0;
        assert!(gap_ms >= config.min_peak_separation_ms);
    }
}

#[test]
fn latency_offset_shifts_every_error() {
    let buffer = PerformanceSpec::human_take(21).render_buffer();
    let config = default_config();

    let raw = analyze(&buffer, 120, 5.0, 0.0, &config).unwrap();
    let compensated = analyze(&buffer, 120, 5.0, 80.0, &config).unwrap();

    assert_eq!(raw.tap_events.len(), compensated.tap_events.len());
    for (a, b) in raw.tap_events.iter().zip(&compensated.tap_events) {
        assert_eq!(a.beat_index, b.beat_index);
        assert!((a.error_ms - b.error_ms - 80.0).abs() < 1e-6);
    }

    let mean: f64 = compensated.tap_events.iter().map(|t| t.error_ms).sum::<f64>()
        / compensated.tap_events.len() as f64;
    assert!((mean + 80.0).abs() < 10.0, "mean error {:.2}ms", mean);
}

#[test]
fn metronome_bleed_is_rejected() {
    let buffer = PerformanceSpec::metronome_bleed().render_buffer();

    let err = analyze(&buffer, 120, 5.0, 0.0, &phase_locked_config()).unwrap_err();
    match err {
        AnalysisError::SuspectedBleed {
            consistency_ms,
            tap_count,
        } => {
            assert!(consistency_ms < 3.0);
            assert_eq!(tap_count, 9);
        }
        other => panic!("expected SuspectedBleed, got {:?}", other),
    }
}

#[test]
fn exact_hits_are_rejected_but_jitter_passes() {
    let exact = PerformanceSpec {
        beat_count: Some(8),
        seed: 4,
        ..Default::default()
    };
    let err = analyze(&exact.render_buffer(), 120, 5.0, 0.0, &phase_locked_config()).unwrap_err();
    assert!(err.is_suspected_bleed());

    let jittered = PerformanceSpec {
        jitter_ms: JITTER_PATTERN_MS.to_vec(),
        ..exact
    };
    let report = analyze(&jittered.render_buffer(), 120, 5.0, 0.0, &phase_locked_config()).unwrap();
    assert_eq!(report.tap_events.len(), 8);
    assert!(report.metrics.consistency_ms >= 3.0);
}

#[test]
fn default_hop_quantisation_hides_click_track_bleed() {
    // 512 samples does not divide a 120 BPM beat at 44.1kHz, so a perfectly
    // regular click track picks up about 4ms of frame-phase spread and
    // slips over the 3ms floor
    let report = analyze(
        &PerformanceSpec::metronome_bleed().render_buffer(),
        120,
        5.0,
        0.0,
        &default_config(),
    )
    .unwrap();
    assert_eq!(report.tap_events.len(), 9);
    assert!(
        report.metrics.consistency_ms >= 3.0 && report.metrics.consistency_ms < 5.0,
        "consistency {:.2}ms",
        report.metrics.consistency_ms
    );

    // Exact hits still land close enough to the frame grid to be flagged
    let exact = PerformanceSpec {
        beat_count: Some(8),
        seed: 4,
        ..Default::default()
    };
    let err = analyze(&exact.render_buffer(), 120, 5.0, 0.0, &default_config()).unwrap_err();
    assert!(err.is_suspected_bleed());
}

#[test]
fn analysis_is_idempotent() {
    let buffer = PerformanceSpec::human_take(13).render_buffer();
    let config = default_config();

    let first = analyze(&buffer, 120, 5.0, 12.0, &config).unwrap();
    let second = analyze(&buffer, 120, 5.0, 12.0, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn lagged_take_at_120_bpm() {
    // Eight hits at 0.5s..4.0s, 46ms behind the click, with human jitter
    let spec = PerformanceSpec {
        lag_ms: 46.0,
        ..PerformanceSpec::human_take(1)
    };

    let report = analyze(&spec.render_buffer(), 120, 5.0, 0.0, &default_config()).unwrap();

    assert_eq!(report.tap_events.len(), 8);
    let metrics = report.metrics;
    assert!(
        metrics.average_error_ms > 30.0 && metrics.average_error_ms < 45.0,
        "average error {:.2}ms",
        metrics.average_error_ms
    );
    assert!(
        metrics.consistency_ms > 3.0 && metrics.consistency_ms < 15.0,
        "consistency {:.2}ms",
        metrics.consistency_ms
    );
    assert_eq!(report.summary.total_beats, 10);
    assert_eq!(report.summary.missed_beats, 2);
    assert!(report.tap_events.iter().all(|t| t.is_late()));
}

#[test]
fn invalid_input_fails_fast() {
    let config = default_config();
    let good = AudioBuffer::mono(vec![0.0; 4096], SAMPLE_RATE);

    let cases = [
        analyze(&AudioBuffer::mono(Vec::new(), SAMPLE_RATE), 120, 5.0, 0.0, &config),
        analyze(&AudioBuffer::mono(vec![f32::INFINITY; 4096], SAMPLE_RATE), 120, 5.0, 0.0, &config),
        analyze(&AudioBuffer::mono(vec![0.0; 4096], 0), 120, 5.0, 0.0, &config),
        analyze(&good, 30, 5.0, 0.0, &config),
        analyze(&good, 120, -5.0, 0.0, &config),
        analyze(
            &good,
            120,
            5.0,
            0.0,
            &OnsetDetectionConfig {
                hop_size: 0,
                ..Default::default()
            },
        ),
    ];

    for (i, result) in cases.into_iter().enumerate() {
        assert!(
            matches!(result, Err(AnalysisError::InvalidInput { .. })),
            "case {} returned {:?}",
            i,
            result
        );
    }
}
