//! Output writer.
//!
//! Writes the rendered document and the `build.json` manifest into the
//! output directory. Both files are written to a temporary sibling first
//! and renamed into place, so a crashed run never leaves a half-written
//! document behind.

use std::path::Path;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use lineagebook_ingest::IssueLog;
use lineagebook_latex::RenderStats;
use lineagebook_shared::{FeatureFlags, LineageError, Result};

/// File name of the build manifest inside the output directory.
pub const MANIFEST_FILE: &str = "build.json";

/// Metadata for a written file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ArtifactMeta {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// What happened to the compile step.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompileOutcome {
    Skipped,
    Succeeded { artifact: String },
    Failed { error: String },
}

/// Record counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BuildCounts {
    pub files: usize,
    pub records: usize,
    pub teachers: usize,
    pub addresses: usize,
    pub students: usize,
    pub warnings: usize,
    pub errors: usize,
}

/// Summary of a build, written next to the document.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BuildManifest {
    pub tool_version: String,
    pub generated_at: DateTime<Utc>,
    pub document: ArtifactMeta,
    pub counts: BuildCounts,
    pub bios_loaded: usize,
    pub unused_bios: Vec<String>,
    pub features: FeatureFlags,
    pub render: RenderStats,
    pub compile: CompileOutcome,
    pub issues: IssueLog,
}

/// Write the document source to `path`, creating parent directories.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_document(path: &Path, source: &str) -> Result<ArtifactMeta> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LineageError::io(parent, e))?;
    }

    write_atomic(path, source.as_bytes())?;

    let meta = ArtifactMeta {
        filename: file_name(path),
        sha256: sha256_hex(source.as_bytes()),
        size_bytes: source.len(),
    };

    info!(file = %meta.filename, size = meta.size_bytes, "document written");
    Ok(meta)
}

/// Write `build.json` into `output_dir`.
pub fn write_manifest(output_dir: &Path, manifest: &BuildManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest).map_err(|e| {
        LineageError::validation(format!("JSON serialization failed: {e}"))
    })?;

    let path = output_dir.join(MANIFEST_FILE);
    write_atomic(&path, json.as_bytes())?;
    debug!(path = %path.display(), "wrote build manifest");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write to a hidden temp file next to `target`, then rename over it.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let temp = target.with_file_name(format!(".{}.tmp", file_name(target)));

    std::fs::write(&temp, bytes).map_err(|e| LineageError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| LineageError::io(target, e))?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
