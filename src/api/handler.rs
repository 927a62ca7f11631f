//! Record API service
//!
//! The thin layer a web or CLI front end calls. Owns no state of its own
//! beyond its collaborators: a schema lookup and a record store.
//!
//! Request flow for writes:
//! 1. Resolve the entity (404 if unknown)
//! 2. Validate the payload against the entity's ordered fields
//! 3. Store the record
//!
//! Request flow for reads:
//! 1. Resolve the entity (404 if unknown)
//! 2. Parse the query string into the condition tree
//! 3. Compile with schema-driven literal coercion
//! 4. Hand the compiled query to the store

use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::executor::RecordPage;
use crate::query::{
    CompiledQuery, ConditionGroup, Criteria, PageRequest, ParsedQuery, Query, QueryCompiler,
    QueryError, SqlQueryParser,
};
use crate::schema::{
    FieldDefinition, RecordValidator, SchemaError, SchemaLookup, ValidationFailure,
};
use crate::storage::{Record, RecordStore};

use super::errors::{ApiError, ApiResult};

/// Default upper bound on page size
pub const DEFAULT_MAX_PAGE_SIZE: usize = 1000;

/// Record service over a schema lookup and a record store
pub struct RecordApi<S, R> {
    schemas: S,
    store: R,
    max_page_size: usize,
}

impl<S: SchemaLookup, R: RecordStore> RecordApi<S, R> {
    pub fn new(schemas: S, store: R) -> Self {
        Self {
            schemas,
            store,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Larger requested page sizes are clamped to this
    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub fn schemas(&self) -> &S {
        &self.schemas
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    // ==================
    // Stateless operations
    // ==================

    /// Validates a payload against field definitions. Empty = valid.
    pub fn validate_record(payload: &Map<String, Value>, fields: &[FieldDefinition]) -> Vec<String> {
        RecordValidator::validate(payload, fields)
    }

    /// Parses a SQL-like query string
    pub fn parse_query_string(raw: &str) -> ParsedQuery {
        SqlQueryParser::parse(raw)
    }

    /// Compiles a condition tree for one entity, coercing literals by field type.
    pub fn compile_query(&self, group: &ConditionGroup, entity_id: Uuid) -> ApiResult<Criteria> {
        let fields = self.schemas.field_definitions(entity_id)?;
        Ok(QueryCompiler::with_fields(&fields).compile(group, entity_id)?)
    }

    /// Parses, clamps and compiles a query request.
    pub fn prepare_query(&self, query: &Query) -> ApiResult<CompiledQuery> {
        let fields = self.schemas.field_definitions(query.entity_id)?;

        let mut query = query.clone();
        SqlQueryParser::apply(&mut query);
        query.size = query.size.min(self.max_page_size);

        let compiled = QueryCompiler::with_fields(&fields).compile_query(&query)?;
        debug!(entity_id = %query.entity_id, query = %compiled, "Prepared query");
        Ok(compiled)
    }

    // ==================
    // Record lifecycle
    // ==================

    /// Validates and stores a new record
    pub fn create_record(&self, entity_id: Uuid, payload: &Value) -> ApiResult<Record> {
        let payload = self.validated_payload(entity_id, payload)?;
        let record = self.store.insert(Record::new(entity_id, payload))?;
        info!(record_id = %record.id, entity_id = %entity_id, "Created record");
        Ok(record)
    }

    /// Replaces a record's payload. Id, entity and creation time are kept.
    pub fn update_record(&self, id: Uuid, payload: &Value) -> ApiResult<Record> {
        let mut record = self.get_record(id)?;
        let payload = self.validated_payload(record.entity_id, payload)?;
        record.replace_payload(payload);

        let record = self.store.update(record)?;
        info!(record_id = %id, "Updated record");
        Ok(record)
    }

    pub fn get_record(&self, id: Uuid) -> ApiResult<Record> {
        self.store
            .get(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Record with ID {} not found", id)))
    }

    pub fn delete_record(&self, id: Uuid) -> ApiResult<()> {
        if !self.store.delete(id)? {
            return Err(ApiError::NotFound(format!("Record with ID {} not found", id)));
        }
        info!(record_id = %id, "Deleted record");
        Ok(())
    }

    /// Removes every record of an entity; returns how many went
    pub fn delete_records_by_entity(&self, entity_id: Uuid) -> ApiResult<usize> {
        Ok(self.store.delete_by_entity(entity_id)?)
    }

    /// Records of one entity in creation order
    pub fn records_by_entity(&self, entity_id: Uuid, page: usize, size: usize) -> ApiResult<RecordPage> {
        let page = self.page_request(page, size)?;
        Ok(self.store.list_by_entity(entity_id, page)?)
    }

    // ==================
    // Queries
    // ==================

    pub fn execute_query(&self, query: &Query) -> ApiResult<RecordPage> {
        let compiled = self.prepare_query(query)?;
        Ok(self.store.execute(&compiled)?)
    }

    /// Counts matching records. Page and size play no part.
    pub fn count_query(&self, query: &Query) -> ApiResult<usize> {
        let fields = self.schemas.field_definitions(query.entity_id)?;

        let mut query = query.clone();
        SqlQueryParser::apply(&mut query);

        let criteria = QueryCompiler::with_fields(&fields).compile_criteria(&query)?;
        Ok(self.store.count(&criteria)?)
    }

    /// Runs a query string against the entity with the given name
    pub fn query_by_entity_name(
        &self,
        name: &str,
        query_string: &str,
        page: usize,
        size: usize,
    ) -> ApiResult<RecordPage> {
        let entity = self
            .schemas
            .entity_by_name(name)
            .ok_or_else(|| SchemaError::unknown_entity_name(name))?;

        let query = Query::new(entity.id)
            .with_query_string(query_string)
            .with_page(page, size);
        self.execute_query(&query)
    }

    fn validated_payload(&self, entity_id: Uuid, payload: &Value) -> ApiResult<Map<String, Value>> {
        let fields = self.schemas.field_definitions(entity_id)?;
        let violations = RecordValidator::validate_document(payload, &fields)?;

        if let Some(failure) = ValidationFailure::from_violations(violations) {
            debug!(entity_id = %entity_id, violations = failure.violations().len(), "Rejected record");
            return Err(failure.into());
        }

        Ok(payload.as_object().cloned().unwrap_or_default())
    }

    fn page_request(&self, page: usize, size: usize) -> ApiResult<PageRequest> {
        if size == 0 {
            return Err(QueryError::InvalidPageSize.into());
        }
        Ok(PageRequest {
            page,
            size: size.min(self.max_page_size),
        })
    }
}
