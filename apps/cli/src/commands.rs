//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use mdmerge_core::loader::load_document;
use mdmerge_core::{CancellationFlag, ProgressReporter, merge_files, preview_sources};
use mdmerge_shared::{
    MergeConfiguration, MergeError, MergeOutcome, MergeResult, PRESET_NAMES, TextEncoding,
    config_file_path, init_config, load_config, load_config_from,
};

use crate::discover::{DiscoverOptions, discover_inputs};
use crate::output::{backup_existing, write_atomic};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// mdmerge: merge markdown documents into one AI-ready file.
#[derive(Parser)]
#[command(
    name = "mdmerge",
    version,
    about = "Merge many markdown documents into one document with a TOC, metadata and chunk markers.",
    long_about = None,
)]
pub(crate) struct Cli {
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
    /// Merge markdown files into one output file.
    Merge {
        #[command(flatten)]
        inputs: InputArgs,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Output file.
        #[arg(short, long)]
        out: PathBuf,

        /// Run the merge and report, but write nothing.
        #[arg(long)]
        dry_run: bool,

        /// Overwrite an existing output file without backing it up.
        #[arg(long)]
        no_backup: bool,
    },

    /// Print a preview of the merged output for the first few documents.
    Preview {
        #[command(flatten)]
        inputs: InputArgs,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Maximum number of lines to print.
        #[arg(long, default_value_t = 50)]
        lines: usize,
    },

    /// List the built-in configuration presets.
    Presets,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Paths to merge and how directories among them are scanned.
#[derive(Args, Debug)]
pub(crate) struct InputArgs {
    /// Files and/or directories to merge, in order.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Scan directories recursively.
    #[arg(short, long)]
    pub recursive: bool,

    /// Maximum depth for recursive scans.
    #[arg(long, requires = "recursive")]
    pub max_depth: Option<usize>,

    /// File patterns to include when scanning directories (repeatable).
    #[arg(long)]
    pub include: Vec<String>,

    /// File patterns to exclude when scanning directories (repeatable).
    #[arg(long)]
    pub exclude: Vec<String>,
}

impl InputArgs {
    fn discover_options(&self) -> DiscoverOptions {
        DiscoverOptions {
            recursive: self.recursive,
            max_depth: self.max_depth,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        }
    }
}

/// Where the merge configuration comes from.
#[derive(Args, Debug)]
pub(crate) struct SettingsArgs {
    /// Configuration JSON file (defaults to ~/.mdmerge/config.json if present).
    #[arg(short, long, env = "MDMERGE_CONFIG", conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Use a built-in preset instead of a configuration file.
    #[arg(short, long)]
    pub preset: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults (or a preset).
    Init {
        /// Start from a built-in preset.
        #[arg(short, long)]
        preset: Option<String>,

        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
    /// Show resolved configuration.
    Show {
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "mdmerge=info",
        1 => "mdmerge=debug",
        _ => "mdmerge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

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
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Merge {
            inputs,
            settings,
            out,
            dry_run,
            no_backup,
        } => cmd_merge(&inputs, &settings, &out, dry_run, no_backup).await,
        Command::Preview {
            inputs,
            settings,
            lines,
        } => cmd_preview(&inputs, &settings, lines).await,
        Command::Presets => cmd_presets(),
        Command::Config { action } => match action {
            ConfigAction::Init { preset, force } => cmd_config_init(preset.as_deref(), force),
            ConfigAction::Show { settings } => cmd_config_show(&settings),
        },
    }
}

/// Resolve the configuration: preset, explicit file, or the default file.
fn resolve_config(settings: &SettingsArgs) -> Result<MergeConfiguration> {
    let config = match (&settings.preset, &settings.config) {
        (Some(name), _) => MergeConfiguration::preset(name)?,
        (None, Some(path)) => load_config_from(path)?,
        (None, None) => load_config()?,
    };
    Ok(config)
}

fn discover(inputs: &InputArgs) -> Result<Vec<PathBuf>> {
    let files = discover_inputs(&inputs.paths, &inputs.discover_options())?;
    if files.is_empty() {
        return Err(eyre!("no markdown files found in the given paths"));
    }
    Ok(files)
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

async fn cmd_merge(
    inputs: &InputArgs,
    settings: &SettingsArgs,
    out: &Path,
    dry_run: bool,
    no_backup: bool,
) -> Result<()> {
    let config = resolve_config(settings)?;
    config.validate()?;
    let files = discover(inputs)?;

    info!(files = files.len(), out = %out.display(), dry_run, "merging documents");

    // Ctrl-C flips the flag; the pipeline stops at the next document boundary.
    let cancel = CancellationFlag::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling merge");
                cancel.cancel();
            }
        })
    };

    let reporter = CliProgress::new();
    let outcome = merge_files(&files, &config, &reporter, &cancel).await;
    watcher.abort();
    reporter.finish();

    let result = match outcome? {
        MergeOutcome::Completed(result) => result,
        MergeOutcome::Cancelled => {
            return Err(eyre!("merge cancelled; nothing was written"));
        }
    };

    print_warnings(&result);

    if dry_run {
        print_summary(&result, None, None);
        println!("  (dry run: nothing written)");
        println!();
        return Ok(());
    }

    let backup = if no_backup {
        None
    } else {
        match backup_existing(out) {
            Ok(backup) => backup,
            Err(e) => {
                warn!(error = %e, "could not back up existing output, continuing");
                None
            }
        }
    };
    write_atomic(out, &result.output)?;

    print_summary(&result, Some(out), backup.as_deref());
    Ok(())
}

fn print_warnings(result: &MergeResult) {
    if result.warnings.is_empty() {
        return;
    }
    eprintln!();
    for warning in &result.warnings {
        eprintln!("  warning [{}] {}: {}", warning.kind, warning.document_path, warning.message);
    }
}

fn print_summary(result: &MergeResult, out: Option<&Path>, backup: Option<&Path>) {
    println!();
    println!("  Merge complete!");
    println!("  Documents: {}", result.document_count);
    println!(
        "  Input:     {} bytes (avg {} per document)",
        result.input.total_bytes, result.input.average_bytes
    );
    if let (Some(oldest), Some(newest)) = (result.input.oldest_modified, result.input.newest_modified) {
        println!(
            "  Modified:  {} .. {}",
            oldest.format("%Y-%m-%d"),
            newest.format("%Y-%m-%d")
        );
    }
    println!("  Output:    {} bytes", result.output.len());
    println!("  TOC:       {} entries", result.toc.len());
    println!("  Warnings:  {}", result.warnings.len());
    if let Some(out) = out {
        println!("  Path:      {}", out.display());
    }
    if let Some(backup) = backup {
        println!("  Backup:    {}", backup.display());
    }
    println!("  Time:      {:.1}s", result.duration_ms as f64 / 1000.0);
    println!();
}

// ---------------------------------------------------------------------------
// preview
// ---------------------------------------------------------------------------

async fn cmd_preview(inputs: &InputArgs, settings: &SettingsArgs, lines: usize) -> Result<()> {
    let config = resolve_config(settings)?;
    config.validate()?;
    let files = discover(inputs)?;
    let encoding = TextEncoding::for_label(&config.input_encoding)?;

    let mut sources = Vec::with_capacity(files.len());
    for path in &files {
        match load_document(path, encoding).await {
            Ok(loaded) => sources.push(loaded.document),
            Err(MergeError::Decode { path, encoding }) => {
                warn!(path = %path.display(), %encoding, "skipping file that does not decode");
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("{}", preview_sources(sources, &config, lines)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// presets and config
// ---------------------------------------------------------------------------

fn preset_description(name: &str) -> &'static str {
    match name {
        "basic" => "plain concatenation: headers and separators only",
        "ai_knowledge_base" => "metadata, semantic markers, chunk hints, keywords, source paths",
        "documentation" => "deeper TOC, front matter preserved, no machine markers",
        "archive" => "front matter and whitespace kept as-is, no TOC or markers",
        _ => "",
    }
}

fn cmd_presets() -> Result<()> {
    println!();
    for name in PRESET_NAMES {
        println!("  {name:<18} {}", preset_description(name));
    }
    println!();
    Ok(())
}

fn cmd_config_init(preset: Option<&str>, force: bool) -> Result<()> {
    let path = config_file_path()?;
    if path.exists() && !force {
        return Err(eyre!(
            "config already exists at '{}' (use --force to overwrite)",
            path.display()
        ));
    }
    let config = match preset {
        Some(name) => MergeConfiguration::preset(name)?,
        None => MergeConfiguration::default(),
    };
    let path = init_config(&config)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(settings: &SettingsArgs) -> Result<()> {
    let config = resolve_config(settings)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
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
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_loaded(&self, path: &str, current: usize, total: usize) {
        self.spinner.set_message(format!("Loading [{current}/{total}] {path}"));
    }

    fn document_formatted(&self, path: &str, current: usize, total: usize) {
        let (rate, eta) = throughput(current, total, self.spinner.elapsed());
        self.spinner.set_message(format!(
            "Formatting [{current}/{total}] {path} ({rate:.1} files/s, ETA {eta:.1}s)"
        ));
    }

    fn done(&self, _result: &MergeResult) {
        self.spinner.finish_and_clear();
    }
}

/// Documents per second so far and the estimated seconds remaining.
fn throughput(current: usize, total: usize, elapsed: std::time::Duration) -> (f64, f64) {
    let secs = elapsed.as_secs_f64();
    if current == 0 || secs <= 0.0 {
        return (0.0, 0.0);
    }
    let rate = current as f64 / secs;
    let remaining = total.saturating_sub(current) as f64;
    (rate, remaining / rate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
