use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rhythm_analyzer::analysis::diagnostics::AnalysisDiagnostics;
use rhythm_analyzer::audio::{read_wav, write_wav};
use rhythm_analyzer::error::{log_analysis_error, log_audio_error};
use rhythm_analyzer::testing::fixtures::{PerformanceSpec, JITTER_PATTERN_MS};
use rhythm_analyzer::{
    analyze, analyze_with_diagnostics, init_logging, AnalysisError, AnalysisReport, AppConfig,
    ErrorCode,
};
use serde::Serialize;

/// Exit code for a take rejected as metronome bleed
const EXIT_SUSPECTED_BLEED: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "rhythm_cli",
    about = "Offline timing analysis for recorded rhythm practice takes"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a WAV recording against a metronome grid
    Analyze {
        #[arg(long)]
        input: PathBuf,
        /// Tempo in BPM (defaults to the config's session tempo)
        #[arg(long)]
        bpm: Option<u32>,
        /// Grid length in seconds (defaults to the recording length)
        #[arg(long)]
        duration: Option<f64>,
        /// Measured round-trip latency (defaults to the config's session value)
        #[arg(long, allow_hyphen_values = true)]
        latency_ms: Option<f64>,
        /// JSON config overriding detection parameters
        #[arg(long)]
        config: Option<PathBuf>,
        /// Include per-frame flux and threshold in the report
        #[arg(long)]
        diagnostics: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Render a synthetic practice take to a 16-bit WAV file
    Synth {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 120)]
        bpm: u32,
        #[arg(long, default_value_t = 5.0)]
        duration: f64,
        /// Number of hits (defaults to every beat after the first)
        #[arg(long)]
        beats: Option<usize>,
        /// Constant delay added to every hit
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        lag_ms: f64,
        /// Peak timing deviation of the player
        #[arg(long, default_value_t = 10.0)]
        jitter_ms: f64,
        /// Background noise RMS level
        #[arg(long, default_value_t = 0.0)]
        noise_rms: f32,
        /// Render the metronome click instead of a human performance
        #[arg(long)]
        bleed: bool,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Print the default configuration as JSON
    Config,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            input,
            bpm,
            duration,
            latency_ms,
            config,
            diagnostics,
            output,
        } => run_analyze(AnalyzeArgs {
            input,
            bpm,
            duration,
            latency_ms,
            config,
            diagnostics,
            output,
        }),
        Commands::Synth {
            output,
            bpm,
            duration,
            beats,
            lag_ms,
            jitter_ms,
            noise_rms,
            bleed,
            seed,
        } => {
            let spec = PerformanceSpec {
                tempo_bpm: bpm,
                duration_seconds: duration,
                beat_count: beats,
                lag_ms,
                jitter_ms: JITTER_PATTERN_MS
                    .iter()
                    .map(|offset| offset * jitter_ms / 10.0)
                    .collect(),
                noise_rms,
                bleed,
                seed,
                ..Default::default()
            };
            run_synth(&spec, &output)
        }
        Commands::Config => run_config(),
    }
}

struct AnalyzeArgs {
    input: PathBuf,
    bpm: Option<u32>,
    duration: Option<f64>,
    latency_ms: Option<f64>,
    config: Option<PathBuf>,
    diagnostics: bool,
    output: Option<PathBuf>,
}

fn run_analyze(args: AnalyzeArgs) -> Result<ExitCode> {
    let app_config = match &args.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            AppConfig::load_from_file(path)
        }
        None => AppConfig::default(),
    };

    let buffer = read_wav(&args.input)
        .inspect_err(|err| log_audio_error(err, "rhythm_cli analyze"))
        .with_context(|| format!("loading recording {}", args.input.display()))?;

    let tempo_bpm = args.bpm.unwrap_or(app_config.session.tempo_bpm);
    let duration_seconds = args.duration.unwrap_or_else(|| buffer.duration_seconds());
    let latency_offset_ms = args
        .latency_ms
        .unwrap_or(app_config.session.latency_offset_ms);
    let detection = &app_config.onset_detection;

    let (result, diagnostics) = if args.diagnostics {
        let run = analyze_with_diagnostics(
            &buffer,
            tempo_bpm,
            duration_seconds,
            latency_offset_ms,
            detection,
        );
        (run.result, run.diagnostics)
    } else {
        (
            analyze(&buffer, tempo_bpm, duration_seconds, latency_offset_ms, detection),
            None,
        )
    };

    match result {
        Ok(report) => {
            let payload = AnalyzeReportPayload {
                input: args.input.display().to_string(),
                sample_rate: buffer.sample_rate(),
                tempo_bpm,
                duration_seconds,
                latency_offset_ms,
                report: &report,
                diagnostics: diagnostics.as_ref(),
            };
            emit_json(&payload, args.output)?;
            Ok(ExitCode::from(0))
        }
        Err(err @ AnalysisError::SuspectedBleed { .. }) => {
            emit_error(&err)?;
            Ok(ExitCode::from(EXIT_SUSPECTED_BLEED))
        }
        Err(err) => {
            log_analysis_error(&err, "rhythm_cli analyze");
            Err(err).with_context(|| format!("analyzing {}", args.input.display()))
        }
    }
}

fn run_synth(spec: &PerformanceSpec, output: &Path) -> Result<ExitCode> {
    let buffer = spec.render_buffer();
    write_wav(output, &buffer).with_context(|| format!("writing {}", output.display()))?;

    let summary = SynthSummaryPayload {
        output: output.display().to_string(),
        sample_rate: spec.sample_rate,
        duration_seconds: spec.duration_seconds,
        bleed: spec.bleed,
        hit_times_s: spec.hit_times_s(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::from(0))
}

fn run_config() -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(&AppConfig::default())?);
    Ok(ExitCode::from(0))
}

fn emit_json<T: Serialize>(payload: &T, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_error(err: &AnalysisError) -> Result<()> {
    let (consistency_ms, tap_count) = match err {
        AnalysisError::SuspectedBleed {
            consistency_ms,
            tap_count,
        } => (Some(*consistency_ms), Some(*tap_count)),
        _ => (None, None),
    };
    let payload = ErrorPayload {
        error: if err.is_suspected_bleed() {
            "suspected_bleed"
        } else {
            "analysis_failed"
        },
        code: err.code(),
        message: err.message(),
        consistency_ms,
        tap_count,
    };
    eprintln!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

#[derive(Serialize)]
struct AnalyzeReportPayload<'a> {
    input: String,
    sample_rate: u32,
    tempo_bpm: u32,
    duration_seconds: f64,
    latency_offset_ms: f64,
    report: &'a AnalysisReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<&'a AnalysisDiagnostics>,
}

#[derive(Serialize)]
struct SynthSummaryPayload {
    output: String,
    sample_rate: u32,
    duration_seconds: f64,
    bleed: bool,
    hit_times_s: Vec<f64>,
}

#[derive(Serialize)]
struct ErrorPayload {
    error: &'static str,
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    consistency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tap_count: Option<usize>,
}
