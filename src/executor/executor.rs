//! In-memory query executor
//!
//! Execution flow (strict order):
//! 1. Filter records by the compiled criteria
//! 2. Order by creation time, then apply the requested sort (stable)
//! 3. Count matches
//! 4. Cut the requested page

use tracing::trace;

use crate::query::{CompiledQuery, Criteria};
use crate::storage::Record;

use super::filters::CriteriaFilter;
use super::result::RecordPage;
use super::sorter::RecordSorter;

/// Runs compiled queries over a set of records
pub struct QueryExecutor;

impl QueryExecutor {
    /// Executes a compiled query and returns the requested page.
    ///
    /// Same query + same records = same page.
    pub fn execute<'a, I>(records: I, query: &CompiledQuery) -> RecordPage
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut matches: Vec<Record> = records
            .into_iter()
            .filter(|r| CriteriaFilter::matches(&query.criteria, r))
            .cloned()
            .collect();

        RecordSorter::sort_by_creation(&mut matches);
        if let Some(sort) = &query.sort {
            RecordSorter::sort(&mut matches, sort);
        }

        let total = matches.len();
        let records: Vec<Record> = matches
            .into_iter()
            .skip(query.page.offset())
            .take(query.page.limit())
            .collect();

        trace!(total, returned = records.len(), "Executed query");

        RecordPage {
            records,
            total,
            page: query.page.page,
            size: query.page.size,
        }
    }

    /// Counts records matching the criteria
    pub fn count<'a, I>(records: I, criteria: &Criteria) -> usize
    where
        I: IntoIterator<Item = &'a Record>,
    {
        records
            .into_iter()
            .filter(|r| CriteriaFilter::matches(criteria, r))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{
        ConditionGroup, ConditionLeaf, Query, QueryCompiler, SortDirection,
    };
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn records(entity_id: Uuid) -> Vec<Record> {
        (0..5)
            .map(|i| {
                let payload = json!({"n": i, "even": i % 2 == 0});
                Record::new(entity_id, payload.as_object().cloned().unwrap())
            })
            .chain(std::iter::once(Record::new(
                Uuid::new_v4(),
                json!({"n": 99}).as_object().cloned().unwrap(),
            )))
            .collect()
    }

    #[test]
    fn test_execute_filters_sorts_and_pages() {
        let entity_id = Uuid::new_v4();
        let data = records(entity_id);

        let query = Query::new(entity_id)
            .with_root_group(ConditionGroup::and().with_condition(ConditionLeaf::eq("even", json!(true))))
            .with_sort("n", SortDirection::Desc)
            .with_page(0, 2);
        let compiled = QueryCompiler::new().compile_query(&query).unwrap();

        let page = QueryExecutor::execute(&data, &compiled);
        assert_eq!(page.total, 3);
        let ns: Vec<_> = page.iter().map(|r| r.get("n").cloned().unwrap_or(Value::Null)).collect();
        assert_eq!(ns, vec![json!(4), json!(2)]);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let entity_id = Uuid::new_v4();
        let data = records(entity_id);

        let query = Query::new(entity_id).with_page(3, 2);
        let compiled = QueryCompiler::new().compile_query(&query).unwrap();

        let page = QueryExecutor::execute(&data, &compiled);
        assert_eq!(page.total, 5);
        assert!(page.is_empty());
    }

    #[test]
    fn test_count_is_entity_scoped() {
        let entity_id = Uuid::new_v4();
        let data = records(entity_id);
        let criteria = QueryCompiler::new()
            .compile(&ConditionGroup::default(), entity_id)
            .unwrap();
        assert_eq!(QueryExecutor::count(&data, &criteria), 5);
    }
}
