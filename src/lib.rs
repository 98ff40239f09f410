// Rhythm Analyzer Core - offline onset detection and timing scoring
// Turns one recorded practice take plus a tempo into per-beat timing errors

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod debug;
pub mod error;
pub mod testing;

// Re-exports for convenience
pub use analysis::worker::{analyze_async, spawn_analysis, AnalysisRequest};
pub use analysis::{analyze, analyze_with_diagnostics, detect_onsets, AnalysisReport};
pub use audio::AudioBuffer;
pub use config::{AppConfig, OnsetDetectionConfig, SessionConfig};
pub use error::{AnalysisError, AudioError, ErrorCode};

/// Install a stderr fmt subscriber and read the pipeline trace switch.
///
/// Safe to call more than once; only the first subscriber is kept.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    debug::pipeline_tracer::init();
}
