//! SQL-like query string parser
//!
//! Accepted shape (keywords case-insensitive):
//!
//! ```text
//! [WHERE cond {AND|OR cond}] [ORDER BY field [ASC|DESC]]
//! cond := field (= | != | <> | > | >= | < | <= | LIKE | IN | IS) value | "(" ... ")"
//! ```
//!
//! The parser is pattern-driven, not recursive descent:
//!
//! - Parenthesized text is pulled out one innermost match at a time. The first
//!   extracted group becomes the root if the root is still empty; later ones
//!   are nested under the root.
//! - A group is OR only if every connective at its level is OR; anything
//!   mixed resolves to AND.
//! - `IS NOT NULL` yields operator `isNull` with value `"NOT"`.
//! - Literals stay strings; typing happens at compile time.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::condition::{ConditionGroup, LogicalOperator, Operator, Query, SortDirection};

static WHERE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*WHERE\s+(.+?)(?:\s+ORDER\s+BY\s+|$)").expect("Invalid WHERE regex")
});

static ORDER_BY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*ORDER\s+BY\s+([^\s]+)(?:\s+(ASC|DESC))?").expect("Invalid ORDER BY regex")
});

static CONDITION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\s]+)\s*([=<>!]+|\b(?i:LIKE|IN|IS)\b)\s*('[^']*'|[^\s]+|\([^)]*\))")
        .expect("Invalid condition regex")
});

static LOGICAL_OP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(AND|OR)\s+").expect("Invalid logical operator regex"));

static PARENTHESIS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]+)\)").expect("Invalid parenthesis regex"));

/// Stands in for an extracted parenthesized group in the remaining text
const GROUP_PLACEHOLDER: &str = "__group__";

/// Result of parsing a query string
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQuery {
    pub root_group: ConditionGroup,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    /// Set whenever `sort_field` is; ASC when no direction was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
}

/// Parses SQL-like filter strings into condition trees.
pub struct SqlQueryParser;

impl SqlQueryParser {
    /// Parses a query string into a fresh condition tree.
    ///
    /// Text without a WHERE clause yields an empty (match-all) root.
    pub fn parse(query_string: &str) -> ParsedQuery {
        let mut parsed = ParsedQuery::default();

        if let Some((field, direction)) = Self::parse_into(query_string, &mut parsed.root_group) {
            parsed.sort_field = Some(field);
            parsed.sort_direction = Some(direction.unwrap_or_default());
        }

        parsed
    }

    /// Parses `query.query_string` into the query's existing root group.
    ///
    /// Conditions are merged into whatever the root already holds. The sort
    /// direction is only overwritten when the text names one. A blank or
    /// missing query string leaves the query untouched.
    pub fn apply(query: &mut Query) {
        if !query.has_query_string() {
            return;
        }
        let Some(query_string) = query.query_string.clone() else {
            return;
        };

        if let Some((field, direction)) = Self::parse_into(&query_string, &mut query.root_group) {
            query.sort_field = Some(field);
            if let Some(direction) = direction {
                query.sort_direction = direction;
            }
        }
    }

    /// Parses into `root`, returning the ORDER BY field and explicit direction.
    fn parse_into(
        query_string: &str,
        root: &mut ConditionGroup,
    ) -> Option<(String, Option<SortDirection>)> {
        let query_string = query_string.trim();

        let sort = ORDER_BY_PATTERN.captures(query_string).map(|caps| {
            let direction = caps.get(2).map(|d| {
                if d.as_str().eq_ignore_ascii_case("DESC") {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                }
            });
            (caps[1].to_string(), direction)
        });

        if let Some(caps) = WHERE_PATTERN.captures(query_string) {
            Self::parse_where_clause(&caps[1], root);
        }

        debug!(
            query = query_string,
            conditions = root.leaf_count(),
            groups = root.groups.len(),
            sort_field = sort.as_ref().map(|(f, _)| f.as_str()),
            "Parsed query string"
        );

        sort
    }

    fn parse_where_clause(where_clause: &str, root: &mut ConditionGroup) {
        let mut remaining = where_clause.to_string();

        loop {
            let inner = match PARENTHESIS_PATTERN.captures(&remaining) {
                Some(caps) => caps[1].to_string(),
                None => break,
            };

            remaining = remaining.replace(&format!("({})", inner), GROUP_PLACEHOLDER);

            let mut group = ConditionGroup::default();
            Self::parse_conditions(&inner, &mut group);

            if root.is_empty() {
                *root = group;
            } else {
                root.groups.push(group);
            }
        }

        Self::parse_conditions(&remaining, root);
    }

    /// Adds the leaves found in `text` to `group` and sets its connective.
    fn parse_conditions(text: &str, group: &mut ConditionGroup) {
        let mut connectives = LOGICAL_OP_PATTERN
            .captures_iter(text)
            .map(|caps| caps[1].eq_ignore_ascii_case("OR"))
            .peekable();

        let all_or = connectives.peek().is_some() && connectives.all(|is_or| is_or);
        group.logical_operator = if all_or {
            LogicalOperator::Or
        } else {
            LogicalOperator::And
        };

        for part in LOGICAL_OP_PATTERN.split(text) {
            if part.trim().eq_ignore_ascii_case(GROUP_PLACEHOLDER) {
                continue;
            }

            if let Some(caps) = CONDITION_PATTERN.captures(part) {
                group.add_condition(
                    &caps[1],
                    map_operator(&caps[2]),
                    parse_value(&caps[3]),
                );
            }
        }
    }
}

fn map_operator(token: &str) -> Operator {
    match token.to_ascii_uppercase().as_str() {
        "=" => Operator::Eq,
        "!=" | "<>" => Operator::Neq,
        ">" => Operator::Gt,
        ">=" => Operator::Gte,
        "<" => Operator::Lt,
        "<=" => Operator::Lte,
        "LIKE" => Operator::Contains,
        "IN" => Operator::In,
        "IS" => Operator::IsNull,
        _ => Operator::Eq,
    }
}

fn parse_value(token: &str) -> Value {
    if token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'') {
        return Value::String(token[1..token.len() - 1].to_string());
    }
    if token.eq_ignore_ascii_case("NULL") {
        return Value::Null;
    }
    Value::String(token.to_string())
}
