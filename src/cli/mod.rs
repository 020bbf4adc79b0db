//! Command-line interface.

mod commands;
pub mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::analyzer::AnalyzeOptions;
use crate::config::{load_settings_with_options, LoadOptions};
use commands::AnalyzeArgs;

#[derive(Parser, Debug)]
#[command(name = "fixo", version, about = "Diagnose household repair issues")]
pub struct Cli {
    /// Config file (JSON). Defaults to auto-discovery.
    #[arg(long, global = true, env = "FIXO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Reference catalog (repairs.json).
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a photo and/or a description of the problem
    Analyze {
        /// Image file, data URL or http(s) URL
        #[arg(short, long)]
        image: Option<String>,

        /// Text description of the problem
        #[arg(short, long)]
        description: Option<String>,

        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,

        /// Override the completion token limit
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Override the sampling temperature
        #[arg(long)]
        temperature: Option<f32>,
    },

    /// Show which analysis provider is active
    Provider,

    /// List repairs in the reference catalog
    Catalog {
        /// Only show repairs in this category
        #[arg(short, long)]
        category: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "fixo_analyzer=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = load_settings_with_options(LoadOptions {
        config_path: cli.config,
        catalog_path: cli.catalog,
    })
    .await?;

    match cli.command {
        Commands::Analyze {
            image,
            description,
            json,
            model,
            max_tokens,
            temperature,
        } => {
            let args = AnalyzeArgs {
                image,
                description,
                json,
                options: AnalyzeOptions {
                    model,
                    max_tokens,
                    temperature,
                },
            };
            commands::cmd_analyze(&settings, args).await
        }
        Commands::Provider => commands::cmd_provider(&settings),
        Commands::Catalog { category } => {
            commands::cmd_catalog_list(&settings, category.as_deref()).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "fixo",
            "analyze",
            "--image",
            "sink.jpg",
            "-d",
            "water under the sink",
            "--temperature",
            "0.2",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze {
                image,
                description,
                temperature,
                json,
                ..
            } => {
                assert_eq!(image.as_deref(), Some("sink.jpg"));
                assert_eq!(description.as_deref(), Some("water under the sink"));
                assert_eq!(temperature, Some(0.2));
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_catalog_flag() {
        let cli = Cli::try_parse_from(["fixo", "catalog", "--catalog", "/tmp/repairs.json"])
            .unwrap();
        assert_eq!(cli.catalog, Some(PathBuf::from("/tmp/repairs.json")));
        assert!(matches!(cli.command, Commands::Catalog { category: None }));
    }
}
