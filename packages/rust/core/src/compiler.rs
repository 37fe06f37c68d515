//! External typesetting toolchain adapter.
//!
//! The pipeline only knows the [`DocumentCompiler`] capability. The LaTeX
//! implementation runs the engine, the indexer, then the engine again: the
//! first pass writes the `.idx`/`.toc` files, the second resolves page
//! numbers for the index and table of contents.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, info, instrument};

use lineagebook_shared::CompilerConfig;

/// Bytes of captured stdout/stderr kept in a [`CompileError::Failed`].
const OUTPUT_TAIL_BYTES: usize = 4000;

/// Why compilation did not produce an artifact.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The executable is not on `PATH`.
    #[error("executable `{program}` not found")]
    MissingExecutable { program: String },

    /// The process could not be started or waited on.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The process exited unsuccessfully.
    #[error("`{program}` exited with status {status}")]
    Failed {
        program: String,
        status: i32,
        stdout: String,
        stderr: String,
    },

    /// Every step succeeded but the expected output is missing.
    #[error("expected output {path:?} was not produced")]
    MissingArtifact { path: PathBuf },

    /// The source path has no usable file name.
    #[error("invalid source path {path:?}")]
    InvalidSource { path: PathBuf },
}

impl CompileError {
    /// Captured process output, for diagnostics.
    pub fn captured_output(&self) -> Option<(&str, &str)> {
        match self {
            Self::Failed { stdout, stderr, .. } => Some((stdout, stderr)),
            _ => None,
        }
    }
}

/// Turns a rendered source file into a final artifact.
pub trait DocumentCompiler {
    fn compile(&self, source: &Path) -> Result<PathBuf, CompileError>;
}

// ---------------------------------------------------------------------------
// LaTeX
// ---------------------------------------------------------------------------

/// Runs `engine`, `indexer`, `engine` in the source file's directory.
#[derive(Debug, Clone)]
pub struct LatexCompiler {
    pub engine: String,
    pub indexer: String,
    pub extra_args: Vec<String>,
    /// Run the indexer between the two engine passes.
    pub run_indexer: bool,
}

impl LatexCompiler {
    pub fn from_config(config: &CompilerConfig, run_indexer: bool) -> Self {
        Self {
            engine: config.engine.clone(),
            indexer: config.indexer.clone(),
            extra_args: config.extra_args.clone(),
            run_indexer,
        }
    }

    fn run_engine(&self, dir: &Path, file_name: &str, pass: u8) -> Result<(), CompileError> {
        debug!(engine = %self.engine, pass, "running typesetting pass");
        let mut cmd = Command::new(&self.engine);
        cmd.args(&self.extra_args).arg(file_name).current_dir(dir);
        run(&self.engine, &mut cmd)
    }
}

impl DocumentCompiler for LatexCompiler {
    #[instrument(skip_all, fields(source = %source.display()))]
    fn compile(&self, source: &Path) -> Result<PathBuf, CompileError> {
        let invalid = || CompileError::InvalidSource {
            path: source.to_path_buf(),
        };
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(invalid)?;
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(invalid)?;
        let dir = match source.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        self.run_engine(&dir, &file_name, 1)?;

        let idx = format!("{stem}.idx");
        if self.run_indexer && dir.join(&idx).exists() {
            debug!(indexer = %self.indexer, "building index");
            let mut cmd = Command::new(&self.indexer);
            cmd.arg(&idx).current_dir(&dir);
            run(&self.indexer, &mut cmd)?;
        }

        self.run_engine(&dir, &file_name, 2)?;

        let artifact = dir.join(format!("{stem}.pdf"));
        if !artifact.exists() {
            return Err(CompileError::MissingArtifact { path: artifact });
        }

        info!(artifact = %artifact.display(), "document compiled");
        Ok(artifact)
    }
}

/// Run a command to completion, capturing its output.
fn run(program: &str, cmd: &mut Command) -> Result<(), CompileError> {
    let output: Output = cmd.output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => CompileError::MissingExecutable {
            program: program.to_string(),
        },
        _ => CompileError::Spawn {
            program: program.to_string(),
            source: e,
        },
    })?;

    if output.status.success() {
        return Ok(());
    }

    Err(CompileError::Failed {
        program: program.to_string(),
        status: output.status.code().unwrap_or(-1),
        stdout: tail(&String::from_utf8_lossy(&output.stdout)),
        stderr: tail(&String::from_utf8_lossy(&output.stderr)),
    })
}

/// Last [`OUTPUT_TAIL_BYTES`] of `text`, on a char boundary.
fn tail(text: &str) -> String {
    if text.len() <= OUTPUT_TAIL_BYTES {
        return text.to_string();
    }
    let mut start = text.len() - OUTPUT_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

// ---------------------------------------------------------------------------
// No-op
// ---------------------------------------------------------------------------

/// Runs nothing; reports the path a real compiler would have produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCompiler;

impl DocumentCompiler for NoopCompiler {
    fn compile(&self, source: &Path) -> Result<PathBuf, CompileError> {
        Ok(source.with_extension("pdf"))
    }
}
