//! Shared types, error model, configuration and diagnostics for lineagebook.
//!
//! This crate is the foundation depended on by all other lineagebook crates.
//! It provides:
//! - [`LineageError`], the unified error type
//! - Domain types ([`StudentEntry`], [`Bio`], [`LineageTree`])
//! - Configuration ([`AppConfig`], config loading)
//! - The diagnostic log sink ([`DiagnosticSink`])

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CompilerConfig, DocumentConfig, FeatureFlags, PathsConfig, config_dir,
    config_file_path, init_config, init_config_at, load_config, load_config_from,
};
pub use diagnostics::{
    DiagnosticEntry, DiagnosticLevel, DiagnosticSink, FileDiagnostics, MemoryDiagnostics,
};
pub use error::{LineageError, Result};
pub use types::{
    Bio, INVALID_DATE, LineageTree, Location, MISSING_NUMBER, NO_DATE, StudentEntry,
    TeacherEntry, UNKNOWN_ADDRESS, UNKNOWN_STUDENT,
};
