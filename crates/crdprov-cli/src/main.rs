//! crdprov CLI - manage Prometheus Operator custom resources with Server-Side Apply

use clap::{Parser, Subcommand, ValueEnum};
use crdprov_core::TypeRole;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;
mod util;

use error::CliError;

#[derive(Parser)]
#[command(name = "crdprov")]
#[command(author = "crdprov Contributors")]
#[command(version)]
#[command(about = "Manage Prometheus Operator custom resources with Server-Side Apply", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Provider configuration file
    #[arg(long, global = true, env = "CRDPROV_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

/// Which schema of a type to use
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Role {
    Resource,
    DataSource,
    Manifest,
}

impl From<Role> for TypeRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Resource => TypeRole::Resource,
            Role::DataSource => TypeRole::DataSource,
            Role::Manifest => TypeRole::Manifest,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the available types
    Types {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the schema of a type
    Schema {
        /// Type name, kind or plural
        #[arg(value_name = "TYPE")]
        type_name: String,

        #[arg(long, value_enum, default_value = "resource")]
        role: Role,

        /// Print the compiled JSON Schema
        #[arg(long, conflicts_with = "json")]
        json_schema: bool,

        /// Print the attribute schema as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration document
    Validate {
        #[arg(value_name = "TYPE")]
        type_name: String,

        /// Configuration file (YAML)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        #[arg(long, value_enum, default_value = "resource")]
        role: Role,

        /// Output validation results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a manifest without contacting the cluster
    Manifest {
        #[arg(value_name = "TYPE")]
        type_name: String,

        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Print the full data source state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what an apply would change
    Plan {
        #[arg(value_name = "TYPE")]
        type_name: String,

        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Prior state file (JSON)
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Create or update a resource
    Apply {
        #[arg(value_name = "TYPE")]
        type_name: String,

        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// State file; read as prior state and rewritten afterwards
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Refresh a state file from the cluster
    Read {
        #[arg(value_name = "TYPE")]
        type_name: String,

        #[arg(long)]
        state: PathBuf,
    },

    /// Delete the object recorded in a state file
    Delete {
        #[arg(value_name = "TYPE")]
        type_name: String,

        #[arg(long)]
        state: PathBuf,
    },

    /// Adopt an existing object
    Import {
        #[arg(value_name = "TYPE")]
        type_name: String,

        /// Import identifier (namespace/name)
        id: String,

        /// State file to write
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Read a live object through its data source
    Get {
        #[arg(value_name = "TYPE")]
        type_name: String,

        /// Object identifier (namespace/name)
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Setup logging based on debug flag
fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    setup_logging(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Types { json } => commands::types::run(json),

        Commands::Schema {
            type_name,
            role,
            json_schema,
            json,
        } => commands::schema::run(&type_name, role.into(), json_schema, json),

        Commands::Validate {
            type_name,
            file,
            role,
            json,
        } => commands::validate::run(&type_name, role.into(), &file, json),

        Commands::Manifest {
            type_name,
            file,
            json,
        } => commands::manifest::run(&type_name, &file, json),

        Commands::Plan {
            type_name,
            file,
            state,
        } => commands::plan::run(&type_name, &file, state.as_deref()),

        Commands::Apply {
            type_name,
            file,
            state,
        } => commands::apply::run(config, &type_name, &file, state.as_deref()).await,

        Commands::Read { type_name, state } => {
            commands::read::run(config, &type_name, &state).await
        }

        Commands::Delete { type_name, state } => {
            commands::delete::run(config, &type_name, &state).await
        }

        Commands::Import {
            type_name,
            id,
            state,
        } => commands::import::run(config, &type_name, &id, state.as_deref()).await,

        Commands::Get {
            type_name,
            id,
            json,
        } => commands::get::run(config, &type_name, &id, json).await,
    }
}
