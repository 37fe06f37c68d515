//! End-to-end `build` pipeline: raw data + bios → lineage tree → document → artifact.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, instrument, warn};

use lineagebook_ingest::{BioMap, IssueLog, load_bios, normalize_name, read_raw_data};
use lineagebook_latex::{RenderOptions, RenderStats, render};
use lineagebook_shared::{AppConfig, DiagnosticSink, LineageTree, Result};

use crate::assembler::{
    ArtifactMeta, BuildCounts, BuildManifest, CompileOutcome, write_document, write_manifest,
};
use crate::compiler::DocumentCompiler;
use crate::lineage::{attach_bios, build_lineage};

/// File name of the diagnostic log inside the output directory.
pub const DIAGNOSTIC_LOG_FILE: &str = "lineage.log";

/// Result of a pipeline run.
#[derive(Debug)]
pub struct PipelineResult {
    /// Path of the rendered markup file.
    pub document_path: PathBuf,
    pub document: ArtifactMeta,
    /// Compiled artifact, when compilation ran and succeeded.
    pub artifact: Option<PathBuf>,
    pub compile: CompileOutcome,
    pub counts: BuildCounts,
    pub issues: IssueLog,
    pub render: RenderStats,
    /// The aggregated tree that was rendered.
    pub tree: LineageTree,
    pub elapsed: Duration,
}

impl PipelineResult {
    /// Error text from a failed compile step.
    pub fn compile_error(&self) -> Option<&str> {
        match &self.compile {
            CompileOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &PipelineResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &PipelineResult) {}
}

/// Run the full `build` pipeline.
///
/// 1. Load bios (unless disabled)
/// 2. Read and validate raw data
/// 3. Aggregate the lineage tree and attach bios
/// 4. Render and write the document
/// 5. Compile (unless disabled)
/// 6. Write `build.json`
///
/// Only a failure to write the document or the manifest is returned as an
/// error. Everything else is reported through `diagnostics`.
#[instrument(skip_all, fields(raw_data = %config.paths.raw_data_dir.display()))]
pub fn run_pipeline(
    config: &AppConfig,
    compiler: &dyn DocumentCompiler,
    diagnostics: &mut dyn DiagnosticSink,
    progress: &dyn ProgressReporter,
) -> Result<PipelineResult> {
    let start = Instant::now();
    let features = config.features;

    info!(?features, "starting build pipeline");

    // --- Phase 1: Bios ---
    let bios = if features.include_bios {
        progress.phase("Loading bios");
        load_bios(&config.paths.bios_dir, diagnostics)
    } else {
        diagnostics.info("Bio loading disabled; every teacher uses the unavailable narrative.");
        BioMap::new()
    };

    // --- Phase 2: Raw data ---
    progress.phase("Reading raw data");
    let raw = read_raw_data(&config.paths.raw_data_dir, diagnostics);
    let file_count = raw.issues.files.len();
    let record_count = raw.records.len();

    // --- Phase 3: Aggregate ---
    progress.phase("Building lineage");
    let mut tree = build_lineage(raw.records);
    if tree.is_empty() {
        diagnostics.warning("No valid records found; the document will have no teacher chapters.");
    }

    let coverage = attach_bios(&mut tree, &bios);
    if features.include_bios {
        for teacher in &coverage.missing {
            diagnostics.warning(&format!("No bio found for teacher: {teacher}"));
        }
    }
    for key in &coverage.unused {
        diagnostics.info(&format!("Bio for {key} matches no teacher in the raw data."));
    }

    // --- Phase 4: Render ---
    progress.phase("Rendering document");
    let founder = config.document.founder.as_deref().map(normalize_name);
    if let Some(name) = &founder {
        if tree.get(name).is_none() {
            diagnostics.warning(&format!("Founder {name} does not appear in the raw data."));
        }
    }

    let opts = RenderOptions {
        title: config.document.title.clone(),
        author: config.document.author.clone(),
        founder,
        founder_narrative: config.document.founder_narrative.clone(),
        license: read_optional_text(config.paths.license_file.as_deref(), "License", diagnostics),
        introduction: read_optional_text(
            config.paths.introduction_file.as_deref(),
            "Introduction",
            diagnostics,
        ),
        generate_index: features.generate_index,
    };
    let rendered = render(&tree, &opts);

    let document_path = config.document_path();
    let document = write_document(&document_path, &rendered.source)?;
    diagnostics.info(&format!(
        "Document written to {} ({} chapters, {} rows).",
        document_path.display(),
        rendered.stats.chapters,
        rendered.stats.rows
    ));

    // --- Phase 5: Compile ---
    let (artifact, compile) = if features.compile_output {
        progress.phase("Compiling document");
        match compiler.compile(&document_path) {
            Ok(artifact) => {
                diagnostics.info(&format!("Compilation succeeded: {}", artifact.display()));
                let outcome = CompileOutcome::Succeeded {
                    artifact: artifact.display().to_string(),
                };
                (Some(artifact), outcome)
            }
            Err(e) => {
                diagnostics.error(&format!("Compilation failed: {e}"));
                if let Some((stdout, stderr)) = e.captured_output() {
                    if !stdout.trim().is_empty() {
                        diagnostics.error(&format!("Compiler output:\n{}", stdout.trim_end()));
                    }
                    if !stderr.trim().is_empty() {
                        diagnostics.error(&format!("Compiler errors:\n{}", stderr.trim_end()));
                    }
                }
                warn!(error = %e, "compilation failed, keeping rendered source");
                (None, CompileOutcome::Failed { error: e.to_string() })
            }
        }
    } else {
        diagnostics.info("Compilation disabled; only the source document was written.");
        (None, CompileOutcome::Skipped)
    };

    // --- Phase 6: Manifest ---
    progress.phase("Writing build manifest");
    let counts = BuildCounts {
        files: file_count,
        records: record_count,
        teachers: tree.teacher_count(),
        addresses: tree.address_count(),
        students: tree.student_count(),
        warnings: raw.issues.total_warnings(),
        errors: raw.issues.total_errors(),
    };

    let manifest = BuildManifest {
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: Utc::now(),
        document: document.clone(),
        counts: counts.clone(),
        bios_loaded: bios.len(),
        unused_bios: coverage.unused,
        features,
        render: rendered.stats.clone(),
        compile: compile.clone(),
        issues: raw.issues.clone(),
    };
    write_manifest(&config.paths.output_dir, &manifest)?;

    if let Err(e) = diagnostics.flush() {
        warn!(error = %e, "failed to flush diagnostic log");
    }

    let result = PipelineResult {
        document_path,
        document,
        artifact,
        compile,
        counts,
        issues: raw.issues,
        render: rendered.stats,
        tree,
        elapsed: start.elapsed(),
    };

    info!(
        teachers = result.counts.teachers,
        students = result.counts.students,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "build pipeline complete"
    );

    progress.done(&result);
    Ok(result)
}

/// Read an optional front-matter file. A configured but unreadable file is
/// a warning and falls back to the renderer's placeholder.
fn read_optional_text(
    path: Option<&Path>,
    label: &str,
    diagnostics: &mut dyn DiagnosticSink,
) -> Option<String> {
    let path = path?;
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            diagnostics.warning(&format!(
                "{label} file {} could not be read ({e}); using placeholder text.",
                path.display()
            ));
            None
        }
    }
}
