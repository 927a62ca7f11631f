//! Condition tree compiler
//!
//! Lowers a `ConditionGroup` into `Criteria`:
//! - The result is always `EntityIs(id) AND <group>`, even for an empty group
//! - Empty groups lower to `All`
//! - `eq`/`neq` against null become null checks
//! - `contains` on text becomes `LIKE '%v%'`, otherwise element containment
//! - `startsWith`/`endsWith` become prefix/suffix LIKE patterns
//! - Unknown operators and empty field names fail at build time
//!
//! Nothing is executed here. Sorting and paging are carried next to the
//! predicate, never folded into it.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::schema::{FieldDefinition, FieldType};

use super::condition::{
    ConditionGroup, ConditionLeaf, LogicalOperator, Operator, Query, QueryNode, SortDirection,
};
use super::criteria::{Comparison, Criteria, FieldPath};
use super::errors::{QueryError, QueryResult};

/// Sort specification
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub path: FieldPath,
    pub direction: SortDirection,
}

/// Page window over the sorted result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page number
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    pub fn limit(&self) -> usize {
        self.size
    }
}

/// A predicate plus the sort and page to apply after it
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub criteria: Criteria,
    pub sort: Option<SortSpec>,
    pub page: PageRequest,
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WHERE {}", self.criteria)?;
        if let Some(sort) = &self.sort {
            write!(f, " ORDER BY {} {}", sort.path, sort.direction.as_str())?;
        }
        write!(f, " LIMIT {} OFFSET {}", self.page.limit(), self.page.offset())
    }
}

/// Builds store predicates from condition trees.
///
/// Without field definitions literals pass through untouched. With them,
/// literals compared against typed fields are canonicalized first, so `'18'`
/// against an integer field compares as `18`.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    field_types: HashMap<String, FieldType>,
}

impl QueryCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiler that coerces literals using the entity's declared field types
    pub fn with_fields(fields: &[FieldDefinition]) -> Self {
        let field_types = fields
            .iter()
            .filter_map(|f| f.kind().map(|t| (f.field_key.clone(), t)))
            .collect();
        Self { field_types }
    }

    /// Compiles a condition group scoped to one entity.
    pub fn compile(&self, group: &ConditionGroup, entity_id: Uuid) -> QueryResult<Criteria> {
        let criteria = Criteria::And(vec![Criteria::EntityIs(entity_id), self.lower_group(group)?]);
        debug!(entity_id = %entity_id, criteria = %criteria, "Compiled condition tree");
        Ok(criteria)
    }

    /// Compiles a full query request.
    ///
    /// The query string must already have been parsed into `root_group`.
    pub fn compile_query(&self, query: &Query) -> QueryResult<CompiledQuery> {
        if query.size == 0 {
            return Err(QueryError::InvalidPageSize);
        }

        let criteria = self.compile_criteria(query)?;

        let sort = query
            .sort_field
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .map(|f| SortSpec {
                path: FieldPath::parse(f),
                direction: query.sort_direction,
            });

        Ok(CompiledQuery {
            criteria,
            sort,
            page: PageRequest {
                page: query.page,
                size: query.size,
            },
        })
    }

    /// Compiles only the predicate of a query request; paging is ignored.
    ///
    /// Legacy flat conditions are used only when the root group is empty.
    pub fn compile_criteria(&self, query: &Query) -> QueryResult<Criteria> {
        if query.root_group.is_empty() && !query.conditions.is_empty() {
            let legacy = ConditionGroup {
                logical_operator: LogicalOperator::And,
                conditions: query.conditions.clone(),
                groups: Vec::new(),
            };
            self.compile(&legacy, query.entity_id)
        } else {
            self.compile(&query.root_group, query.entity_id)
        }
    }

    fn lower_group(&self, group: &ConditionGroup) -> QueryResult<Criteria> {
        if group.is_empty() {
            return Ok(Criteria::All);
        }

        let parts = group
            .nodes()
            .map(|node| match node {
                QueryNode::Leaf(leaf) => self.lower_leaf(leaf),
                QueryNode::Group(nested) => self.lower_group(nested),
            })
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(match group.logical_operator {
            LogicalOperator::And => Criteria::And(parts),
            LogicalOperator::Or => Criteria::Or(parts),
        })
    }

    fn lower_leaf(&self, leaf: &ConditionLeaf) -> QueryResult<Criteria> {
        if leaf.field.trim().is_empty() {
            return Err(QueryError::EmptyField);
        }

        let operator = leaf
            .kind()
            .ok_or_else(|| QueryError::UnknownOperator(leaf.operator.clone()))?;

        let comparison = match operator {
            Operator::Eq => match self.typed_literal(leaf)? {
                Value::Null => Comparison::IsNull,
                value => Comparison::Eq(value),
            },
            Operator::Neq => match self.typed_literal(leaf)? {
                Value::Null => Comparison::IsNotNull,
                value => Comparison::Neq(value),
            },
            Operator::Gt => Comparison::Gt(self.required_literal(leaf, operator)?),
            Operator::Gte => Comparison::Gte(self.required_literal(leaf, operator)?),
            Operator::Lt => Comparison::Lt(self.required_literal(leaf, operator)?),
            Operator::Lte => Comparison::Lte(self.required_literal(leaf, operator)?),
            Operator::Contains => match &leaf.value {
                Value::Null => return Err(missing_value(leaf, operator)),
                Value::String(s) => Comparison::Like(format!("%{}%", s)),
                other => Comparison::Contains(other.clone()),
            },
            Operator::StartsWith => {
                Comparison::Like(format!("{}%", pattern_text(leaf, operator)?))
            }
            Operator::EndsWith => Comparison::Like(format!("%{}", pattern_text(leaf, operator)?)),
            Operator::In => Comparison::In(self.list_literal(leaf, operator)?),
            Operator::NotIn => Comparison::NotIn(self.list_literal(leaf, operator)?),
            Operator::IsNull => Comparison::IsNull,
            Operator::IsNotNull => Comparison::IsNotNull,
        };

        Ok(Criteria::field(&leaf.field, comparison))
    }

    fn required_literal(&self, leaf: &ConditionLeaf, operator: Operator) -> QueryResult<Value> {
        match self.typed_literal(leaf)? {
            Value::Null => Err(missing_value(leaf, operator)),
            value => Ok(value),
        }
    }

    fn typed_literal(&self, leaf: &ConditionLeaf) -> QueryResult<Value> {
        self.coerce(&leaf.field, &leaf.value)
    }

    /// Accepts a JSON list, or text like `a,b` / `('a', 'b')`.
    fn list_literal(&self, leaf: &ConditionLeaf, operator: Operator) -> QueryResult<Vec<Value>> {
        let items = match &leaf.value {
            Value::Array(items) => items.clone(),
            Value::String(text) => split_list_text(text),
            _ => {
                return Err(QueryError::InvalidList {
                    field: leaf.field.clone(),
                    operator: operator.as_str().to_string(),
                })
            }
        };

        items
            .iter()
            .map(|item| self.coerce(&leaf.field, item))
            .collect()
    }

    /// Canonicalizes a literal for a typed field.
    ///
    /// Types with a strict textual shape (numbers, booleans, dates) reject
    /// literals that cannot take it; other types keep the literal as given.
    fn coerce(&self, field: &str, value: &Value) -> QueryResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let Some(field_type) = self.field_types.get(field) else {
            return Ok(value.clone());
        };

        match field_type.coerce(value) {
            Some(coerced) => Ok(coerced),
            None if is_strict(*field_type) => Err(QueryError::InvalidLiteral {
                field: field.to_string(),
                expected: field_type.as_str().to_string(),
                value: value.to_string(),
            }),
            None => Ok(value.clone()),
        }
    }
}

fn is_strict(field_type: FieldType) -> bool {
    matches!(
        field_type,
        FieldType::Number
            | FieldType::Integer
            | FieldType::Boolean
            | FieldType::Date
            | FieldType::Datetime
    )
}

fn missing_value(leaf: &ConditionLeaf, operator: Operator) -> QueryError {
    QueryError::MissingValue {
        field: leaf.field.clone(),
        operator: operator.as_str().to_string(),
    }
}

/// Text used inside a prefix/suffix pattern
fn pattern_text(leaf: &ConditionLeaf, operator: Operator) -> QueryResult<String> {
    match &leaf.value {
        Value::Null => Err(missing_value(leaf, operator)),
        Value::String(s) => Ok(s.clone()),
        other => Ok(other.to_string()),
    }
}

fn split_list_text(text: &str) -> Vec<Value> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(trimmed);

    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let unquoted = item
                .strip_prefix('\'')
                .and_then(|i| i.strip_suffix('\''))
                .unwrap_or(item);
            Value::String(unquoted.to_string())
        })
        .collect()
}
