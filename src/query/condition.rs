//! Condition tree structures
//!
//! A query filter is a tree of AND/OR groups over leaf comparisons. Trees are
//! built fresh per request (by the string parser or deserialized from JSON)
//! and are never mutated after compilation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Default page size when a query does not specify one
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Comparison operators understood by the compiler.
///
/// Leaves carry the operator as a raw string so unknown operators survive
/// deserialization and are rejected at build time instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring for strings, element membership otherwise
    Contains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::In,
        Operator::NotIn,
        Operator::IsNull,
        Operator::IsNotNull,
    ];

    /// Get the boundary string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::IsNull => "isNull",
            Operator::IsNotNull => "isNotNull",
        }
    }

    /// Resolves a boundary string, ignoring case.
    pub fn parse(name: &str) -> Option<Operator> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the members of a group combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A single comparison: field, operator, literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionLeaf {
    /// Payload key; dots descend into nested objects
    pub field: String,
    /// Operator boundary string, see [`Operator`]
    pub operator: String,
    /// Literal to compare against; null for null checks
    #[serde(default)]
    pub value: Value,
}

impl ConditionLeaf {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self::with_operator_name(field, operator.as_str(), value)
    }

    /// Create a leaf from a raw operator name, recognised or not
    pub fn with_operator_name(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value,
        }
    }

    /// Create an equality leaf
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// Create an "in list" leaf
    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, Operator::In, Value::Array(values))
    }

    /// Create a null-check leaf
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsNull, Value::Null)
    }

    /// Returns the operator if it is part of the vocabulary
    pub fn kind(&self) -> Option<Operator> {
        Operator::parse(&self.operator)
    }
}

/// An AND/OR group of leaves and nested groups.
///
/// An empty group matches everything.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    #[serde(default)]
    pub logical_operator: LogicalOperator,
    #[serde(default)]
    pub conditions: Vec<ConditionLeaf>,
    #[serde(default)]
    pub groups: Vec<ConditionGroup>,
}

impl ConditionGroup {
    pub fn new(logical_operator: LogicalOperator) -> Self {
        Self {
            logical_operator,
            conditions: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn and() -> Self {
        Self::new(LogicalOperator::And)
    }

    pub fn or() -> Self {
        Self::new(LogicalOperator::Or)
    }

    pub fn with_condition(mut self, leaf: ConditionLeaf) -> Self {
        self.conditions.push(leaf);
        self
    }

    pub fn with_group(mut self, group: ConditionGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn add_condition(&mut self, field: impl Into<String>, operator: Operator, value: Value) {
        self.conditions.push(ConditionLeaf::new(field, operator, value));
    }

    /// True when the group has neither leaves nor nested groups
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.groups.is_empty()
    }

    /// Members in evaluation order: leaves first, then nested groups.
    pub fn nodes(&self) -> impl Iterator<Item = QueryNode<'_>> {
        self.conditions
            .iter()
            .map(QueryNode::Leaf)
            .chain(self.groups.iter().map(QueryNode::Group))
    }

    /// Number of leaves in this group and every nested group
    pub fn leaf_count(&self) -> usize {
        self.conditions.len() + self.groups.iter().map(ConditionGroup::leaf_count).sum::<usize>()
    }
}

/// One member of a condition group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryNode<'a> {
    Leaf(&'a ConditionLeaf),
    Group(&'a ConditionGroup),
}

/// A query request against one entity's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub entity_id: Uuid,
    /// SQL-like text; parsed into `root_group` before compilation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(default)]
    pub root_group: ConditionGroup,
    /// Flat leaves kept for older clients; used only when `root_group` is empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionLeaf>,
    /// Accepted for older clients; flat leaves are always AND-combined
    #[serde(default)]
    pub logical_operator: LogicalOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    #[serde(default)]
    pub sort_direction: SortDirection,
    /// Zero-based page number
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Query {
    pub fn new(entity_id: Uuid) -> Self {
        Self {
            entity_id,
            query_string: None,
            root_group: ConditionGroup::default(),
            conditions: Vec::new(),
            logical_operator: LogicalOperator::And,
            sort_field: None,
            sort_direction: SortDirection::Asc,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_query_string(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = Some(query_string.into());
        self
    }

    pub fn with_root_group(mut self, group: ConditionGroup) -> Self {
        self.root_group = group;
        self
    }

    /// Adds a legacy flat condition
    pub fn with_condition(mut self, leaf: ConditionLeaf) -> Self {
        self.conditions.push(leaf);
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_field = Some(field.into());
        self.sort_direction = direction;
        self
    }

    pub fn with_page(mut self, page: usize, size: usize) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    /// True if a non-blank query string is present
    pub fn has_query_string(&self) -> bool {
        self.query_string
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}
