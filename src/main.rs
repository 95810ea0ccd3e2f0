//! highland-syringe - Fountain in and out of Highland projects

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use highland_syringe::archive::cleanup_stale_workspaces;
use highland_syringe::{Compression, Syringe, SyringeConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "highland-syringe")]
#[command(version)]
#[command(about = "Extract Fountain screenplays from Highland projects and inject them back")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// JSON config file (flags below override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for output files (default: next to the project)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Directory for scratch workspaces (default: next to the project)
    #[arg(long, global = true)]
    scratch_dir: Option<PathBuf>,

    /// Store entries uncompressed in the injected archive
    #[arg(long, global = true)]
    store: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the screenplay as <name>_extraction.fountain
    Extract {
        /// Path to the .highland file
        highland_file: PathBuf,
    },

    /// Inject a Fountain file into a copy named <name>_injected.highland
    Inject {
        /// Path to the .fountain file
        fountain_file: PathBuf,

        /// Path to the .highland project to inject into
        highland_file: PathBuf,
    },

    /// Show what is inside a .highland project
    Info {
        /// Path to the .highland file
        highland_file: PathBuf,
    },

    /// Remove workspaces and temp files left behind by interrupted runs
    Clean {
        /// Directory to clean (usually where the projects live)
        dir: PathBuf,
    },
}

fn init_logging(cli: &Cli) -> Result<()> {
    // Only initialize logging if verbose or RUST_LOG is set
    if !cli.verbose && std::env::var("RUST_LOG").is_err() {
        return Ok(());
    }

    let filter = EnvFilter::from_default_env().add_directive(if cli.verbose {
        "highland_syringe=debug".parse()?
    } else {
        "highland_syringe=warn".parse()?
    });

    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<SyringeConfig> {
    let mut config = match &cli.config {
        Some(path) => SyringeConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SyringeConfig::default(),
    };

    if let Some(dir) = &cli.output_dir {
        config.output_dir = Some(dir.clone());
    }
    if let Some(dir) = &cli.scratch_dir {
        config.scratch_dir = Some(dir.clone());
    }
    if cli.store {
        config.compression = Compression::Stored;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = load_config(&cli)?;
    let syringe = Syringe::new(config)?;

    match &cli.command {
        Commands::Extract { highland_file } => {
            let output = syringe.extract(highland_file)?;
            println!("Extracted Fountain file:\n{}", output.display());
        }

        Commands::Inject {
            fountain_file,
            highland_file,
        } => {
            let output = syringe.inject(fountain_file, highland_file)?;
            println!("Injected Highland file:\n{}", output.display());
        }

        Commands::Info { highland_file } => {
            let info = syringe.inspect(highland_file)?;

            println!("=== Project Information ===");
            println!("Bundle:     {}", info.bundle_name);
            println!("Text file:  {}", info.text_file.display());
            println!("Text size:  {} bytes", info.text_bytes);
            match &info.revision {
                Some(revision) => {
                    let strategy = match revision.strategy {
                        Some(s) => format!("{:?}", s),
                        None => "none".to_string(),
                    };
                    println!("Revision:   current.json present");
                    println!("  Payload:  {}", strategy);
                    if let Some(chars) = revision.text_chars {
                        println!("  Length:   {} characters", chars);
                    }
                }
                None => println!("Revision:   none"),
            }
        }

        Commands::Clean { dir } => {
            let cleaned = cleanup_stale_workspaces(dir);
            println!("Removed {} leftover workspaces and temp files", cleaned);
        }
    }

    Ok(())
}
