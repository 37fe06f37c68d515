//! Core pipeline orchestration for lineagebook.
//!
//! This crate ties together ingestion, lineage aggregation, LaTeX
//! rendering, and the external compiler into the end-to-end `build`
//! workflow ([`pipeline::run_pipeline`]).

pub mod assembler;
pub mod compiler;
pub mod lineage;
pub mod pipeline;

pub use assembler::{ArtifactMeta, BuildCounts, BuildManifest, CompileOutcome, MANIFEST_FILE};
pub use compiler::{CompileError, DocumentCompiler, LatexCompiler, NoopCompiler};
pub use lineage::{BioCoverage, attach_bios, build_lineage};
pub use pipeline::{
    DIAGNOSTIC_LOG_FILE, PipelineResult, ProgressReporter, SilentProgress, run_pipeline,
};
