//! CLI module for modelhub
//!
//! Provides command-line interface for:
//! - validate: Check a payload against an entity's fields
//! - parse: Show the condition tree for a query string
//! - explain: Show the compiled predicate
//! - query: Run a query over the entity's record file
//! - count: Count matching records

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, Target};
pub use commands::{count, explain, init_logging, parse, query, run, run_command, validate, Config};
pub use errors::{CliError, CliResult};
pub use io::{load_records, read_request, write_response};
