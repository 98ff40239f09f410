// Analysis error types and constants

use crate::error::ErrorCode;
use std::fmt;
use tracing::error;

/// Analysis error code constants
///
/// Single source of truth for the numeric codes surfaced to the host
/// application (practice controller, CLI exit payloads).
///
/// Error code range: 3001-3003
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Buffer, tempo, duration, latency or configuration violated an invariant
    pub const INVALID_INPUT: i32 = 3001;

    /// Timing variance is too low to be a human performance
    pub const SUSPECTED_BLEED: i32 = 3002;

    /// Worker thread or blocking task terminated without a result
    pub const WORKER_FAILED: i32 = 3003;
}

/// Log an analysis error with structured context
///
/// Bleed rejections are expected outcomes and are logged by the analyzer at
/// warn level; callers typically only route unexpected errors through here.
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=Analyzer, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Analysis-related errors
///
/// An empty onset list is not an error: silence produces an empty report.
///
/// Error code range: 3001-3003
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Malformed buffer, out-of-range tempo/duration or invalid configuration
    InvalidInput { reason: String },

    /// Timing consistency fell below the bleed floor on a non-empty result.
    /// The recording most likely captured the metronome itself.
    SuspectedBleed { consistency_ms: f64, tap_count: usize },

    /// Worker thread panicked or the blocking task was cancelled
    WorkerFailed { reason: String },
}

impl AnalysisError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        AnalysisError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// True when the result was rejected as metronome bleed
    pub fn is_suspected_bleed(&self) -> bool {
        matches!(self, AnalysisError::SuspectedBleed { .. })
    }
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InvalidInput { .. } => AnalysisErrorCodes::INVALID_INPUT,
            AnalysisError::SuspectedBleed { .. } => AnalysisErrorCodes::SUSPECTED_BLEED,
            AnalysisError::WorkerFailed { .. } => AnalysisErrorCodes::WORKER_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::InvalidInput { reason } => format!("Invalid input: {}", reason),
            AnalysisError::SuspectedBleed {
                consistency_ms,
                tap_count,
            } => format!(
                "Suspected metronome bleed: consistency {:.2}ms across {} taps. \
                 Please use headphones or check your setup.",
                consistency_ms, tap_count
            ),
            AnalysisError::WorkerFailed { reason } => {
                format!("Analysis worker failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}
