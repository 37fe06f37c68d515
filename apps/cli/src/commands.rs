//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use lineagebook_core::pipeline::{
    DIAGNOSTIC_LOG_FILE, PipelineResult, ProgressReporter, run_pipeline,
};
use lineagebook_core::{CompileOutcome, DocumentCompiler, LatexCompiler, NoopCompiler};
use lineagebook_ingest::{check_file, merge_directory};
use lineagebook_shared::{
    AppConfig, FileDiagnostics, config_file_path, init_config_at, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// lineagebook: typeset a lineage book from raw attendance records.
#[derive(Parser)]
#[command(
    name = "lineagebook",
    version,
    about = "Turn raw teacher/student records into a typeset lineage book.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (TOML, or JSON overrides with a .json extension).
    #[arg(long, global = true, env = "LINEAGEBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build the lineage document from the raw-data and bios directories.
    Build(BuildArgs),

    /// Validate a single raw-data file and print its issues.
    Check {
        /// File to validate.
        file: PathBuf,
    },

    /// Merge raw-data files into one deduplicated file.
    Merge {
        /// Raw-data directory (defaults to the configured one).
        #[arg(long)]
        raw_data: Option<PathBuf>,

        /// Keep the source files next to the merged file.
        ///
        /// A later `build` then reads every record twice.
        #[arg(long)]
        keep_originals: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Overrides for `build`. Unset flags keep the configured value.
#[derive(Args, Debug, Default)]
pub(crate) struct BuildArgs {
    /// Directory of raw record files.
    #[arg(long)]
    pub raw_data: Option<PathBuf>,

    /// Directory of teacher bio files.
    #[arg(long)]
    pub bios: Option<PathBuf>,

    /// Output directory for the document, manifest and diagnostic log.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Founder teacher, rendered first.
    #[arg(long)]
    pub founder: Option<String>,

    /// Skip bio loading.
    #[arg(long)]
    pub no_bios: bool,

    /// Omit index entries and the printed index.
    #[arg(long)]
    pub no_index: bool,

    /// Write the LaTeX source only.
    #[arg(long)]
    pub no_compile: bool,
}

impl BuildArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(dir) = self.raw_data {
            config.paths.raw_data_dir = dir;
        }
        if let Some(dir) = self.bios {
            config.paths.bios_dir = dir;
        }
        if let Some(dir) = self.out {
            config.paths.output_dir = dir;
        }
        if let Some(founder) = self.founder {
            config.document.founder = Some(founder);
        }
        if self.no_bios {
            config.features.include_bios = false;
        }
        if self.no_index {
            config.features.generate_index = false;
        }
        if self.no_compile {
            config.features.compile_output = false;
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "lineagebook=info",
        1 => "lineagebook=debug",
        _ => "lineagebook=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Build(args) => cmd_build(config_path.as_deref(), args),
        Command::Check { file } => cmd_check(&file),
        Command::Merge {
            raw_data,
            keep_originals,
        } => cmd_merge(config_path.as_deref(), raw_data, keep_originals),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path.as_deref()),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

/// Explicit `--config` path, or the default file (defaults if absent).
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_build(config_path: Option<&Path>, args: BuildArgs) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    args.apply(&mut config);

    info!(
        raw_data = %config.paths.raw_data_dir.display(),
        bios = %config.paths.bios_dir.display(),
        out = %config.paths.output_dir.display(),
        "building lineage document"
    );

    let mut diagnostics = FileDiagnostics::open(&config.paths.output_dir.join(DIAGNOSTIC_LOG_FILE))?;

    let compiler: Box<dyn DocumentCompiler> = if config.features.compile_output {
        Box::new(LatexCompiler::from_config(
            &config.compiler,
            config.features.generate_index,
        ))
    } else {
        Box::new(NoopCompiler)
    };

    let reporter = CliProgress::new();
    let result = run_pipeline(&config, compiler.as_ref(), &mut diagnostics, &reporter)?;

    print_build_summary(&result, diagnostics.path());
    Ok(())
}

fn print_build_summary(result: &PipelineResult, log_path: &Path) {
    println!();
    println!("  Lineage document built.");
    println!("  Teachers:  {}", result.counts.teachers);
    println!("  Addresses: {}", result.counts.addresses);
    println!("  Students:  {}", result.counts.students);
    println!("  Document:  {}", result.document_path.display());
    match &result.compile {
        CompileOutcome::Succeeded { artifact } => println!("  Artifact:  {artifact}"),
        CompileOutcome::Failed { error } => println!("  Compile:   failed ({error})"),
        CompileOutcome::Skipped => println!("  Compile:   skipped"),
    }
    println!("  Log:       {}", log_path.display());
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());

    if !result.issues.files.is_empty() {
        println!();
        println!("  Issues by file:");
        for file in &result.issues.files {
            println!(
                "    {}: {} warning(s), {} error(s)",
                file.file, file.warnings, file.errors
            );
        }
    }
    println!();
}

fn cmd_check(file: &Path) -> Result<()> {
    info!(file = %file.display(), "checking raw-data file");
    let (records, issues) = check_file(file)?;

    print!("{}", issues.report());
    println!(
        "\n{} record(s) accepted, {} rejected.",
        records.len(),
        issues.rejected
    );
    Ok(())
}

fn cmd_merge(config_path: Option<&Path>, raw_data: Option<PathBuf>, keep: bool) -> Result<()> {
    let dir = match raw_data {
        Some(dir) => dir,
        None => resolve_config(config_path)?.paths.raw_data_dir,
    };

    let now = chrono::Local::now().naive_local();
    let Some(outcome) = merge_directory(&dir, now)? else {
        tracing::warn!(dir = %dir.display(), "no records found to merge");
        println!("No records found to merge in {}.", dir.display());
        return Ok(());
    };

    println!(
        "Merged {} file(s): {} line(s) read, {} duplicate(s) removed.",
        outcome.sources.len(),
        outcome.lines_read,
        outcome.duplicates()
    );
    println!("Merged file saved as: {}", outcome.output.display());

    if keep {
        tracing::warn!("original files kept; the next build will read their records twice");
        println!("Original files kept.");
        return Ok(());
    }

    let bar = ProgressBar::new(outcome.sources.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:30.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message("Deleting files");
    outcome.remove_sources(|_| bar.inc(1))?;
    bar.finish_and_clear();
    println!("Original files deleted.");

    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };
    init_config_at(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &PipelineResult) {
        self.spinner.finish_and_clear();
    }
}
