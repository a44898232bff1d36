//! The processing pipeline.
//!
//! Sequences per-file text extraction, AI-driven analysis, and multi-file
//! combination into a single named, observable, cancelable run with
//! per-step progress and error isolation.

pub mod combine;
pub mod process;
pub mod prompts;
pub mod relationships;
pub mod run;

pub use combine::{combine_files, finalize_ai_compiled};
pub use process::{Pipeline, PipelineConfig};
pub use prompts::{
    format_analyze_prompt, format_relationships_prompt, ANALYZE_PROMPT, RELATIONSHIPS_PROMPT,
};
pub use relationships::{analyze_relationships, parse_relationships_response};
pub use run::{PipelineRun, PipelineStep, RunState, RunStatus, StepStatus};
