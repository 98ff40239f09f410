// Worker - runs a whole analysis away from the caller's thread
//
// The FFT loop dominates cost (thousands of frames for a one-minute take), so
// interactive callers hand the request to a worker and collect one terminal
// result. There is no cancellation: a caller that no longer wants the result
// simply drops the handle.

use std::thread::{self, JoinHandle};

use crate::analysis::{analyze, AnalysisReport};
use crate::audio::AudioBuffer;
use crate::config::{OnsetDetectionConfig, SessionConfig};
use crate::error::{log_analysis_error, AnalysisError};

/// Thread name used for spawned analysis workers
pub const WORKER_THREAD_NAME: &str = "rhythm-analysis";

/// Everything one analysis needs, owned so it can move to another thread
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub buffer: AudioBuffer,
    pub tempo_bpm: u32,
    pub duration_seconds: f64,
    pub latency_offset_ms: f64,
    pub config: OnsetDetectionConfig,
}

impl AnalysisRequest {
    /// Build a request from session settings
    pub fn from_session(
        buffer: AudioBuffer,
        session: &SessionConfig,
        config: OnsetDetectionConfig,
    ) -> Self {
        Self {
            buffer,
            tempo_bpm: session.tempo_bpm,
            duration_seconds: session.duration_seconds,
            latency_offset_ms: session.latency_offset_ms,
            config,
        }
    }

    /// Run synchronously on the current thread
    pub fn run(&self) -> Result<AnalysisReport, AnalysisError> {
        analyze(
            &self.buffer,
            self.tempo_bpm,
            self.duration_seconds,
            self.latency_offset_ms,
            &self.config,
        )
    }
}

/// Spawn the analysis on a dedicated named OS thread
///
/// Fails only if the OS refuses to create the thread.
pub fn spawn_analysis(
    request: AnalysisRequest,
) -> std::io::Result<JoinHandle<Result<AnalysisReport, AnalysisError>>> {
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            tracing::debug!(
                "[AnalysisWorker] Analyzing {} samples at {} BPM",
                request.buffer.len(),
                request.tempo_bpm
            );
            request.run()
        })
}

/// Join a spawned worker, mapping a panicked thread to `WorkerFailed`
pub fn join_analysis(
    handle: JoinHandle<Result<AnalysisReport, AnalysisError>>,
) -> Result<AnalysisReport, AnalysisError> {
    handle.join().map_err(|_| {
        let err = AnalysisError::WorkerFailed {
            reason: "analysis thread panicked".to_string(),
        };
        log_analysis_error(&err, "join_analysis");
        err
    })?
}

/// Run the analysis on tokio's blocking pool
pub async fn analyze_async(request: AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
    tokio::task::spawn_blocking(move || request.run())
        .await
        .map_err(|e| {
            let err = AnalysisError::WorkerFailed {
                reason: format!("blocking analysis task failed: {}", e),
            };
            log_analysis_error(&err, "analyze_async");
            err
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::PerformanceSpec;

    fn request(spec: &PerformanceSpec) -> AnalysisRequest {
        AnalysisRequest {
            buffer: spec.render_buffer(),
            tempo_bpm: spec.tempo_bpm,
            duration_seconds: spec.duration_seconds,
            latency_offset_ms: 0.0,
            config: OnsetDetectionConfig::default(),
        }
    }

    #[test]
    fn test_thread_result_matches_direct_call() {
        let request = request(&PerformanceSpec::human_take(11));
        let direct = request.run();

        let handle = spawn_analysis(request).unwrap();
        assert_eq!(handle.thread().name(), Some(WORKER_THREAD_NAME));
        assert_eq!(join_analysis(handle), direct);
    }

    #[test]
    fn test_concurrent_workers_are_independent() {
        let spec = PerformanceSpec::human_take(5);
        let handles: Vec<_> = (0..4)
            .map(|_| spawn_analysis(request(&spec)).unwrap())
            .collect();

        let results: Vec<_> = handles.into_iter().map(join_analysis).collect();
        assert!(results.iter().all(|r| r == &results[0]));
        assert!(results[0].is_ok());
    }

    #[tokio::test]
    async fn test_async_analysis() {
        let report = analyze_async(request(&PerformanceSpec::human_take(3)))
            .await
            .unwrap();
        assert!(!report.tap_events.is_empty());
    }

    #[tokio::test]
    async fn test_async_propagates_invalid_input() {
        let mut bad = request(&PerformanceSpec::human_take(3));
        bad.tempo_bpm = 500;

        let err = analyze_async(bad).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));
    }

    #[test]
    fn test_request_from_session() {
        let session = SessionConfig {
            tempo_bpm: 90,
            duration_seconds: 4.0,
            latency_offset_ms: 12.5,
        };
        let buffer = AudioBuffer::mono(vec![0.0; 4096], 44_100);
        let request = AnalysisRequest::from_session(buffer, &session, OnsetDetectionConfig::default());

        assert_eq!(request.tempo_bpm, 90);
        assert_eq!(request.latency_offset_ms, 12.5);
        assert!(request.run().unwrap().tap_events.is_empty());
    }
}
