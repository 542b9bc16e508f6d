//! Tabset CLI
//!
//! Developer tool for validating dataset projects and inspecting URIs,
//! connectors and error codes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Tabset - versioned table datasets
#[derive(Parser)]
#[command(name = "tabset")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "tabset.yaml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new Tabset project
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Project name (defaults to directory name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Validate configuration and every dataset definition
    Validate,

    /// Show project status
    Status,

    /// Inspect URIs and version qualifiers
    Uri {
        #[command(subcommand)]
        command: UriCommands,
    },

    /// Manage dataset definitions
    Dataset {
        #[command(subcommand)]
        command: DatasetCommands,
    },

    /// Inspect connector configurations
    Connector {
        #[command(subcommand)]
        command: ConnectorCommands,
    },

    /// Explain an error code
    Explain {
        /// Error code, e.g. UCE-009
        code: String,
    },
}

#[derive(Subcommand)]
enum UriCommands {
    /// Parse a td:// URI and print its components
    Parse {
        /// URI to parse
        uri: String,
    },

    /// Parse a version qualifier
    Version {
        /// Version, list or range, e.g. HEAD^ or HEAD~2..HEAD
        token: String,
    },
}

#[derive(Subcommand)]
enum DatasetCommands {
    /// List all dataset definitions
    List,

    /// Show a dataset definition in its wire form
    Show {
        /// Dataset name
        name: String,
    },
}

#[derive(Subcommand)]
enum ConnectorCommands {
    /// Validate a connector file and print its canonical form
    Show {
        /// YAML or JSON file holding a single tagged connector
        file: String,
    },

    /// List supported connector identifiers
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init { path, name } => {
            commands::init::run(&path, name.as_deref()).await?;
        }
        Commands::Validate => {
            commands::validate::run(&cli.config).await?;
        }
        Commands::Status => {
            commands::status::run(&cli.config).await?;
        }
        Commands::Uri { command } => match command {
            UriCommands::Parse { uri } => {
                commands::uri::parse(&uri).await?;
            }
            UriCommands::Version { token } => {
                commands::uri::version(&token).await?;
            }
        },
        Commands::Dataset { command } => match command {
            DatasetCommands::List => {
                commands::dataset::list(&cli.config).await?;
            }
            DatasetCommands::Show { name } => {
                commands::dataset::show(&cli.config, &name).await?;
            }
        },
        Commands::Connector { command } => match command {
            ConnectorCommands::Show { file } => {
                commands::connector::show(&file).await?;
            }
            ConnectorCommands::List => {
                commands::connector::list().await?;
            }
        },
        Commands::Explain { code } => {
            commands::explain::run(&code).await?;
        }
    }

    Ok(())
}
