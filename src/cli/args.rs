//! CLI argument definitions using clap
//!
//! Commands:
//! - modelhub validate --config <path> --entity <name|id> [--payload <json>]
//! - modelhub parse <query>
//! - modelhub explain --config <path> --entity <name|id> [query]
//! - modelhub query --config <path> --entity <name|id> [query]
//! - modelhub count --config <path> --entity <name|id> [query]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// modelhub - virtual entities with schema validation and a SQL-like query language
#[derive(Parser, Debug)]
#[command(name = "modelhub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Entity selection shared by the data commands
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Path to configuration file
    #[arg(long, default_value = "./modelhub.json")]
    pub config: PathBuf,

    /// Entity name or id
    #[arg(long, short)]
    pub entity: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a record payload against an entity's fields
    Validate {
        #[command(flatten)]
        target: Target,

        /// Payload as JSON; read from stdin when omitted
        #[arg(long)]
        payload: Option<String>,
    },

    /// Parse a query string and print the condition tree
    Parse {
        /// Query text, e.g. "WHERE age > 18 ORDER BY name DESC"
        query: String,
    },

    /// Print the compiled predicate for a query
    Explain {
        #[command(flatten)]
        target: Target,

        /// Query text
        #[arg(default_value = "")]
        query: String,
    },

    /// Run a query against the entity's records
    Query {
        #[command(flatten)]
        target: Target,

        /// Query text
        #[arg(default_value = "")]
        query: String,

        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Page size; the configured default when omitted
        #[arg(long)]
        size: Option<usize>,
    },

    /// Count records matching a query
    Count {
        #[command(flatten)]
        target: Target,

        /// Query text
        #[arg(default_value = "")]
        query: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
