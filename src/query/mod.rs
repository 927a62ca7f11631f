//! Query subsystem
//!
//! SQL-like text or a structured condition tree goes in; an entity-scoped
//! `Criteria` predicate with sort and page parameters comes out.
//!
//! Pipeline: `SqlQueryParser` -> `ConditionGroup` -> `QueryCompiler` -> `CompiledQuery`

mod compiler;
mod condition;
mod criteria;
mod errors;
mod parser;

pub use compiler::{CompiledQuery, PageRequest, QueryCompiler, SortSpec};
pub use condition::{
    ConditionGroup, ConditionLeaf, LogicalOperator, Operator, Query, QueryNode, SortDirection,
    DEFAULT_PAGE_SIZE,
};
pub use criteria::{Comparison, Criteria, FieldPath};
pub use errors::{QueryError, QueryErrorKind, QueryResult};
pub use parser::{ParsedQuery, SqlQueryParser};
