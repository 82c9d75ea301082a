use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

mod commands;
mod config;

use config::AppConfig;

/// Workflow designer - validate, simulate and normalise HR workflow files
#[derive(Parser)]
#[command(name = "workflow-designer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "workflow-designer.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run structural validation and print the report
    Validate {
        /// Path to the exported workflow file
        workflow_file: PathBuf,
    },

    /// Simulate a run and print each step
    Simulate {
        /// Path to the exported workflow file
        workflow_file: PathBuf,

        /// Wait as long as the designer does before resolving
        #[arg(long)]
        paced: bool,
    },

    /// Re-export a workflow file without stale validation tags
    Normalize {
        /// Path to the exported workflow file
        workflow_file: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the available automations
    Catalog,

    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the --config path
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Some(Commands::Config { init }) = cli.command {
        let config = commands::show_config(&cli.config, init).await?;
        return print_json(&config);
    }

    let config = AppConfig::load(&cli.config)
        .await
        .with_context(|| format!("failed to load config: {}", cli.config.display()))?;

    match cli.command {
        Some(Commands::Validate { workflow_file }) => {
            let report = commands::validate_file(&workflow_file, &config).await?;
            print_json(&report)?;
            if !report.is_clean() {
                anyhow::bail!("workflow has validation errors");
            }
        }
        Some(Commands::Simulate {
            workflow_file,
            paced,
        }) => {
            let result = commands::simulate_file(&workflow_file, &config, paced).await?;
            print_json(&result)?;
        }
        Some(Commands::Normalize {
            workflow_file,
            output,
        }) => {
            let json = commands::normalize_file(&workflow_file, output.as_deref(), &config).await?;
            if output.is_none() {
                println!("{}", json);
            }
        }
        Some(Commands::Catalog) => {
            let catalog = commands::load_automations(&config).await?;
            print_json(catalog.actions())?;
        }
        Some(Commands::Config { .. }) | None => {
            println!("workflow-designer - use --help to see available commands");
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
