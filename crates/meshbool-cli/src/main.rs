//! meshbool CLI - run boolean modifier scripts against a scene.
//!
//! Scripts are TOML files declaring entities and the commands to run on
//! them; the final scene is printed as text or JSON.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use meshbool::{BoolConfig, BoolContext, HistoryKernel};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod report;
mod script;

use report::Report;
use script::Script;

#[derive(Parser)]
#[command(name = "meshbool")]
#[command(about = "Non-destructive boolean modifier manager", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scene script and print the resulting scene
    Run {
        /// Path to the .toml script
        script: PathBuf,
        /// Config file overriding the script's [config] table
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a config file
    CheckConfig {
        /// Path to the config file
        path: PathBuf,
    },
    /// Print the default config as TOML
    DefaultConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            script,
            config,
            json,
        } => {
            run_script(&script, config, json)?;
        }
        Commands::CheckConfig { path } => {
            check_config(&path)?;
        }
        Commands::DefaultConfig => {
            print!("{}", toml::to_string_pretty(&BoolConfig::default())?);
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_script(path: &PathBuf, config: Option<PathBuf>, json: bool) -> Result<()> {
    let script = Script::load(path)?;

    let config = match config {
        Some(path) => BoolConfig::load(&path)?,
        None => script.config.clone().unwrap_or_default(),
    };
    config.validate()?;

    let scene = script.build_scene()?;
    let mut ctx = BoolContext::new(scene, HistoryKernel, config);
    let results = script.run(&mut ctx)?;

    let report = Report::new(&ctx.scene, &results);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("meshbool script: {}", path.display());
        println!("  Steps: {}", results.len());
        println!();
        report.print();
    }

    Ok(())
}

fn check_config(path: &PathBuf) -> Result<()> {
    let config = BoolConfig::load(path)?;
    if let Err(err) = config.validate() {
        bail!("{}: {}", path.display(), err);
    }
    println!("{}: ok", path.display());
    println!("  Cutter name: {}", config.cutter_name);
    println!("  Inset name: {}", config.inset_name);
    println!("  Boolean group: {}", config.boolean_group);
    println!("  Helpers group: {}", config.helpers_group);
    Ok(())
}
