// Debug module - diagnostic tooling for offline tuning

pub mod pipeline_tracer;

pub use pipeline_tracer::{PipelineStage, TRACE_ENV_VAR};
