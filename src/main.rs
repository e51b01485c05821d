//! zhopkit CLI - Z-hop post-processor for sliced G-code

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zhopkit::{analyze_text, init_logging, process_text, Config, HopMode, LogFormat, ProfileModel};

#[derive(Parser)]
#[command(name = "zhopkit", version = zhopkit::VERSION)]
#[command(about = "Insert travel and layer change Z-hops into G-code", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post-process a G-code file
    Process {
        /// Input file, `-` for stdin
        input: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Config file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Hop mode: traditional or slingshot
        #[arg(long)]
        mode: Option<String>,
        /// Profile model: linear, percentage, angle or arc
        #[arg(long)]
        model: Option<String>,
        /// Pass the file through unchanged
        #[arg(long)]
        disable: bool,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Report what processing would do, as JSON
    Analyze {
        /// Input file, `-` for stdin
        input: PathBuf,
        /// Config file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a config file with every default
    Init {
        /// Destination (default: the user config path)
        path: Option<PathBuf>,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config as TOML
    Show {
        /// Config file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format, cli.verbose)?;
    debug!("zhopkit {} (built {})", zhopkit::VERSION, zhopkit::BUILD_DATE);

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            mode,
            model,
            disable,
        } => {
            let mut config = load_config(config.as_deref())?;
            apply_overrides(&mut config, mode, model, disable)?;
            process_file(&input, output.as_deref(), config)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => init_config(path, force)?,
            ConfigAction::Show { config } => {
                let config = load_config(config.as_deref())?;
                print!("{}", config.to_toml()?);
            }
        },
        Commands::Analyze { input, config } => {
            let config = load_config(config.as_deref())?;
            let text = read_input(&input)?;
            let analysis = analyze_text(&text, config);
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(Config::load_or_default()?),
    }
}

fn apply_overrides(
    config: &mut Config,
    mode: Option<String>,
    model: Option<String>,
    disable: bool,
) -> Result<()> {
    if let Some(mode) = mode {
        let parsed = HopMode::from(mode.clone());
        if let HopMode::Unrecognized(_) = parsed {
            anyhow::bail!("Unknown hop mode: {}", mode);
        }
        config.general.mode = parsed;
    }
    if let Some(model) = model {
        let parsed = ProfileModel::from(model.clone());
        if let ProfileModel::Unrecognized(_) = parsed {
            anyhow::bail!("Unknown profile model: {}", model);
        }
        config.general.model = parsed;
    }
    if disable {
        config.general.enabled = false;
    }
    Ok(())
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn process_file(input: &Path, output: Option<&Path>, config: Config) -> Result<()> {
    debug!(mode = %config.general.mode, model = %config.general.model, "Processing {}", input.display());
    let text = read_input(input)?;
    let (processed, report) = process_text(&text, config);

    match output {
        Some(path) => fs::write(path, &processed)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => io::stdout().write_all(processed.as_bytes())?,
    }

    info!(
        sequences = report.sequences,
        hopped = report.hopped,
        skipped_short = report.skipped_short,
        skipped_degenerate = report.skipped_degenerate,
        layer_hops = report.layer_hops,
        fallbacks = report.fallbacks,
        block_fallbacks = report.block_fallbacks,
        "Z-hop processing complete"
    );
    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path.or_else(Config::default_path) {
        Some(path) => path,
        None => anyhow::bail!("No config directory on this system; pass a path"),
    };
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to replace it)", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Config::default()
        .save_to_file(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}
