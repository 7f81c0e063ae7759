use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::OutputFormat;
use symdex::config::{Config, CONFIG_FILE};

#[derive(Parser)]
#[command(name = "symdex")]
#[command(version)]
#[command(about = "Incremental symbol index for Python and Rust workspaces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or update the index
    Index {
        /// Project directory to index
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Re-extract every file, ignoring fingerprints
        #[arg(short, long)]
        force: bool,

        /// Keep watching for changes after the build
        #[arg(short, long)]
        watch: bool,
    },

    /// Search symbols by name substring
    Search {
        /// Case-insensitive name substring
        query: String,

        /// Only symbols of this kind (function, class, variable, import, method, ...)
        #[arg(short, long)]
        kind: Option<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the symbols declared in a file
    File {
        /// Workspace-relative path
        path: String,

        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List recorded references to a symbol
    Refs {
        /// Exact symbol name
        name: String,

        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Find a symbol, falling back to text search
    Find {
        /// Symbol name
        name: String,

        /// Source language
        #[arg(short, long, default_value = "python")]
        language: String,

        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show index statistics
    Stats {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,
    },

    /// List supported languages
    Languages,

    /// Start the MCP server on stdio
    Serve {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Re-index when files change
        #[arg(short, long)]
        watch: bool,
    },
}

impl Commands {
    fn project(&self) -> Option<&str> {
        match self {
            Commands::Index { project, .. }
            | Commands::Search { project, .. }
            | Commands::File { project, .. }
            | Commands::Refs { project, .. }
            | Commands::Find { project, .. }
            | Commands::Stats { project }
            | Commands::Serve { project, .. } => Some(project.as_str()),
            Commands::Languages => None,
        }
    }
}

/// Logs go to stderr; stdout belongs to command output and the MCP protocol.
/// `RUST_LOG` wins over the flags, the flags over `logging.level`.
fn init_logging(debug: bool, verbose: bool, project: Option<&str>) {
    let level = if debug {
        "debug".to_string()
    } else if verbose {
        "info".to_string()
    } else {
        project
            .filter(|dir| std::path::Path::new(dir).join(CONFIG_FILE).exists())
            .and_then(|dir| Config::from_file(std::path::Path::new(dir).join(CONFIG_FILE)).ok())
            .map(|config| config.logging.level)
            .unwrap_or_else(|| "warn".to_string())
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug, cli.verbose, cli.command.project());

    info!("symdex v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Index { project, force, watch } => {
            cli::index::index_project(project, force, watch).await?;
        }

        Commands::Search {
            query,
            kind,
            limit,
            project,
            format,
        } => {
            cli::query::search(project, query, kind, limit, format)?;
        }

        Commands::File { path, project, format } => {
            cli::query::file(project, path, format)?;
        }

        Commands::Refs { name, project, format } => {
            cli::query::references(project, name, format)?;
        }

        Commands::Find {
            name,
            language,
            project,
            format,
        } => {
            cli::query::find(project, name, language, format)?;
        }

        Commands::Stats { project } => {
            cli::stats::show_stats(project, cli.verbose)?;
        }

        Commands::Languages => {
            cli::languages::list_languages();
        }

        Commands::Serve { project, watch } => {
            info!("Starting MCP server for project: {}", project);
            cli::serve::serve_stdio(project, watch).await?;
        }
    }

    Ok(())
}
