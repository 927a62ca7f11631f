//! CLI command implementations
//!
//! Every data command follows the same sequence:
//! 1. Configuration load
//! 2. Logging init
//! 3. Entity definitions load
//! 4. Entity resolution (name or id)
//! 5. One API call, one JSON response on stdout

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::api::{ApiError, RecordApi, Response};
use crate::query::{Query, SqlQueryParser, DEFAULT_PAGE_SIZE};
use crate::schema::{RecordValidator, SchemaLoader, SchemaLookup};
use crate::storage::MemoryRecordStore;

use super::args::{Command, Target};
use super::errors::{CliError, CliResult};
use super::io::{load_records, read_request, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Page size when a command does not give one (default 20)
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Upper bound on page size (default 1000)
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Log filter used when RUST_LOG is unset (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_max_page_size() -> usize {
    crate::api::DEFAULT_MAX_PAGE_SIZE
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::Config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.default_page_size == 0 {
            return Err(CliError::Config("default_page_size must be > 0".into()));
        }

        if self.max_page_size == 0 {
            return Err(CliError::Config("max_page_size must be > 0".into()));
        }

        if self.default_page_size > self.max_page_size {
            return Err(CliError::Config(format!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }

        EnvFilter::try_new(&self.log_level).map_err(|e| {
            CliError::Config(format!("Invalid log_level '{}': {}", self.log_level, e))
        })?;

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Validate { target, payload } => validate(&target, payload.as_deref()),
        Command::Parse { query } => parse(&query),
        Command::Explain { target, query } => explain(&target, &query),
        Command::Query {
            target,
            query: text,
            page,
            size,
        } => query(&target, &text, page, size),
        Command::Count { target, query } => count(&target, &query),
    }
}

/// Install the stderr log subscriber. RUST_LOG wins over the configured level.
///
/// Later calls are no-ops.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Validate one payload and report every violation
pub fn validate(target: &Target, payload: Option<&str>) -> CliResult<()> {
    let (_, loader, entity_id) = open(target)?;

    let document: Value = match payload {
        Some(text) => serde_json::from_str(text)
            .map_err(|e| CliError::InvalidArgument(format!("Invalid payload JSON: {}", e)))?,
        None => read_request()?,
    };

    let result = loader
        .field_definitions(entity_id)
        .and_then(|fields| RecordValidator::validate_document(&document, &fields))
        .map(|violations| json!({"valid": violations.is_empty(), "violations": violations}))
        .map_err(ApiError::from);

    write_response(&Response::from(result))
}

/// Parse a query string; needs no configuration
pub fn parse(query_string: &str) -> CliResult<()> {
    init_logging(&default_log_level());
    let parsed = SqlQueryParser::parse(query_string);
    write_response(&Response::from(Ok::<_, ApiError>(parsed)))
}

/// Print the compiled predicate without touching records
pub fn explain(target: &Target, query_string: &str) -> CliResult<()> {
    let (config, loader, entity_id) = open(target)?;
    let api = RecordApi::new(loader, MemoryRecordStore::new())
        .with_max_page_size(config.max_page_size);

    let request = Query::new(entity_id)
        .with_query_string(query_string)
        .with_page(0, config.default_page_size);
    let result = api.prepare_query(&request).map(|compiled| {
        json!({
            "entityId": entity_id,
            "sql": compiled.to_string(),
        })
    });

    write_response(&Response::from(result))
}

/// Run a query against the entity's record file
pub fn query(target: &Target, query_string: &str, page: usize, size: Option<usize>) -> CliResult<()> {
    let (config, loader, entity_id) = open(target)?;
    let api = open_api(&config, loader, entity_id)?;

    let request = Query::new(entity_id)
        .with_query_string(query_string)
        .with_page(page, size.unwrap_or(config.default_page_size));

    write_response(&Response::from(api.execute_query(&request)))
}

/// Count matching records
pub fn count(target: &Target, query_string: &str) -> CliResult<()> {
    let (config, loader, entity_id) = open(target)?;
    let api = open_api(&config, loader, entity_id)?;

    let request = Query::new(entity_id).with_query_string(query_string);
    let result = api
        .count_query(&request)
        .map(|total| json!({"count": total}));

    write_response(&Response::from(result))
}

/// Load config and entity definitions, then resolve the target entity
fn open(target: &Target) -> CliResult<(Config, SchemaLoader, Uuid)> {
    let config = Config::load(&target.config)?;
    init_logging(&config.log_level);

    let mut loader = SchemaLoader::new(config.data_path());
    loader.load_all()?;

    let entity_id = resolve_entity(&loader, &target.entity)?;
    Ok((config, loader, entity_id))
}

fn open_api(
    config: &Config,
    loader: SchemaLoader,
    entity_id: Uuid,
) -> CliResult<RecordApi<SchemaLoader, MemoryRecordStore>> {
    let records = load_records(config.data_path(), entity_id)?;
    info!(entity_id = %entity_id, records = records.len(), "Loaded records");

    Ok(RecordApi::new(loader, MemoryRecordStore::from_records(records))
        .with_max_page_size(config.max_page_size))
}

/// Accepts an entity id or an exact entity name
fn resolve_entity(loader: &SchemaLoader, entity: &str) -> CliResult<Uuid> {
    if let Ok(id) = Uuid::parse_str(entity) {
        if loader.exists(id) {
            return Ok(id);
        }
    }

    loader
        .entity_by_name(entity)
        .map(|definition| definition.id)
        .ok_or_else(|| CliError::InvalidArgument(format!("Unknown entity '{}'", entity)))
}
