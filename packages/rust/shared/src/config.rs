//! Application configuration for lineagebook.
//!
//! User config lives at `~/.lineagebook/lineagebook.toml`. An explicit
//! `--config` path may point at either a TOML or a JSON file.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LineageError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "lineagebook.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".lineagebook";

// ---------------------------------------------------------------------------
// Config structs (matching lineagebook.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML or JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Document metadata and founder settings.
    #[serde(default)]
    pub document: DocumentConfig,

    /// Pipeline feature flags.
    #[serde(default)]
    pub features: FeatureFlags,

    /// External typesetting toolchain.
    #[serde(default)]
    pub compiler: CompilerConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory of delimited student record files.
    #[serde(default = "default_raw_data_dir")]
    pub raw_data_dir: PathBuf,

    /// Directory of one biography file per teacher.
    #[serde(default = "default_bios_dir")]
    pub bios_dir: PathBuf,

    /// Directory the rendered document, build manifest and log go to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Document file stem (without `.tex`).
    #[serde(default = "default_document_name")]
    pub document_name: String,

    /// Optional introduction text file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction_file: Option<PathBuf>,

    /// Optional license text file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_data_dir: default_raw_data_dir(),
            bios_dir: default_bios_dir(),
            output_dir: default_output_dir(),
            document_name: default_document_name(),
            introduction_file: None,
            license_file: None,
        }
    }
}

fn default_raw_data_dir() -> PathBuf {
    PathBuf::from("RAW Data")
}
fn default_bios_dir() -> PathBuf {
    PathBuf::from("Bios")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_document_name() -> String {
    "lineage_document".into()
}

/// `[document]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Document title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Document author line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Founder teacher, rendered first. Matched after name normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founder: Option<String>,

    /// Narrative used for the founder chapter instead of the bio template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founder_narrative: Option<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            author: None,
            founder: None,
            founder_narrative: None,
        }
    }
}

fn default_title() -> String {
    "Lineage".into()
}

/// `[features]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Load the bios directory and render bio paragraphs.
    #[serde(default = "default_true")]
    pub include_bios: bool,

    /// Emit index entries and the printed index.
    #[serde(default = "default_true")]
    pub generate_index: bool,

    /// Run the external compiler after rendering.
    #[serde(default = "default_true")]
    pub compile_output: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            include_bios: true,
            generate_index: true,
            compile_output: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[compiler]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Typesetting executable.
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Index-building executable.
    #[serde(default = "default_indexer")]
    pub indexer: String,

    /// Extra arguments passed to every engine pass.
    #[serde(default = "default_extra_args")]
    pub extra_args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            indexer: default_indexer(),
            extra_args: default_extra_args(),
        }
    }
}

fn default_engine() -> String {
    "pdflatex".into()
}
fn default_indexer() -> String {
    "makeindex".into()
}
fn default_extra_args() -> Vec<String> {
    vec!["-interaction=nonstopmode".into()]
}

impl AppConfig {
    /// Full path of the rendered markup file.
    pub fn document_path(&self) -> PathBuf {
        self.paths
            .output_dir
            .join(format!("{}.tex", self.paths.document_name))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.lineagebook/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LineageError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.lineagebook/lineagebook.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
///
/// `.json` files are read as JSON overrides; anything else is TOML.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LineageError::io(path, e))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|e| {
            LineageError::config(format!("failed to parse {}: {e}", path.display()))
        })
    } else {
        toml::from_str(&content).map_err(|e| {
            LineageError::config(format!("failed to parse {}: {e}", path.display()))
        })
    }
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file to `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| LineageError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LineageError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| LineageError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("raw_data_dir"));
        assert!(toml_str.contains("pdflatex"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.paths.bios_dir, PathBuf::from("Bios"));
        assert!(parsed.features.generate_index);
        assert_eq!(parsed.compiler.indexer, "makeindex");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml_str = r#"
[document]
founder = "Grand Master Kim"

[features]
compile_output = false
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.document.founder.as_deref(), Some("Grand Master Kim"));
        assert!(!config.features.compile_output);
        assert!(config.features.include_bios);
        assert_eq!(config.paths.document_name, "lineage_document");
    }

    #[test]
    fn json_override_file_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overrides.json");
        std::fs::write(
            &path,
            r#"{"paths": {"raw_data_dir": "/data/raw", "output_dir": "/data/out"}}"#,
        )
        .unwrap();

        let config = load_config_from(&path).expect("load json");
        assert_eq!(config.paths.raw_data_dir, PathBuf::from("/data/raw"));
        assert_eq!(
            config.document_path(),
            PathBuf::from("/data/out/lineage_document.tex")
        );
        assert_eq!(config.paths.bios_dir, PathBuf::from("Bios"));
    }

    #[test]
    fn malformed_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[paths\nraw_data_dir = 1").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, LineageError::Config { .. }));
    }

    #[test]
    fn init_at_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("lineagebook.toml");

        init_config_at(&path).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.paths.document_name, "lineage_document");
        assert_eq!(config.compiler.engine, "pdflatex");
    }
}
