//! Record API Tests
//!
//! End-to-end behaviour of the service layer over entity files on disk and
//! the in-memory record store:
//! - Writes are validated against the record's entity
//! - Updates keep identity and creation time
//! - Queries never leak records across entities
//! - Errors map to HTTP-equivalent statuses

use modelhub::api::{ApiError, RecordApi, Response};
use modelhub::query::{ConditionGroup, ConditionLeaf, Criteria, Query, SortDirection};
use modelhub::schema::{EntityDefinition, FieldDefinition, FieldType, SchemaLoader};
use modelhub::storage::{MemoryRecordStore, RecordStore};
use serde_json::{json, Value};
use tempfile::TempDir;
use uuid::Uuid;

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    _tmp: TempDir,
    api: RecordApi<SchemaLoader, MemoryRecordStore>,
    contact: Uuid,
    company: Uuid,
}

fn setup() -> Fixture {
    let tmp = TempDir::new().unwrap();

    let contact = EntityDefinition::new("contact")
        .with_field(FieldDefinition::required("name", FieldType::String).with_order(1))
        .with_field(FieldDefinition::optional("age", FieldType::Integer).with_order(2))
        .with_field(FieldDefinition::enumeration("status", ["ACTIVE", "PENDING", "CLOSED"]))
        .with_field(FieldDefinition::optional("seenAt", FieldType::Datetime))
        .with_field(FieldDefinition::optional("owner", FieldType::Reference));
    let company = EntityDefinition::new("company")
        .with_field(FieldDefinition::required("name", FieldType::String));

    let writer = SchemaLoader::new(tmp.path());
    writer.save_entity(&contact).unwrap();
    writer.save_entity(&company).unwrap();

    let mut loader = SchemaLoader::new(tmp.path());
    loader.load_all().unwrap();

    Fixture {
        _tmp: tmp,
        api: RecordApi::new(loader, MemoryRecordStore::new()),
        contact: contact.id,
        company: company.id,
    }
}

fn names(records: impl IntoIterator<Item = Value>) -> Vec<String> {
    records
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn seed_contacts(fx: &Fixture) {
    for (name, age, status) in [
        ("Ann", 31, "ACTIVE"),
        ("Bob", 17, "ACTIVE"),
        ("Cid", 45, "PENDING"),
        ("Dee", 52, "CLOSED"),
    ] {
        fx.api
            .create_record(fx.contact, &json!({"name": name, "age": age, "status": status}))
            .unwrap();
    }
    fx.api
        .create_record(fx.company, &json!({"name": "Acme"}))
        .unwrap();
}

// =============================================================================
// Record Lifecycle Tests
// =============================================================================

#[test]
fn test_create_assigns_identity_and_timestamps() {
    let fx = setup();
    let record = fx
        .api
        .create_record(fx.contact, &json!({"name": "Ann", "age": 31}))
        .unwrap();

    assert_eq!(record.entity_id, fx.contact);
    assert_eq!(record.created_at, record.updated_at);
    assert_eq!(fx.api.get_record(record.id).unwrap(), record);
}

#[test]
fn test_create_rejects_with_every_violation() {
    let fx = setup();
    let err = fx
        .api
        .create_record(fx.contact, &json!({"age": "old", "status": "GONE"}))
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(
        err.violations().unwrap(),
        [
            "Required field 'name' is missing",
            "Field 'age' must be an integer",
            "Field 'status' must be one of: ACTIVE, PENDING, CLOSED",
        ]
    );
    assert!(fx.api.store().is_empty().unwrap());
}

#[test]
fn test_create_rejects_non_object_payload() {
    let fx = setup();
    let err = fx.api.create_record(fx.contact, &json!("Ann")).unwrap_err();
    assert!(matches!(err, ApiError::MalformedPayload(_)));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_update_keeps_identity_and_creation_time() {
    let fx = setup();
    let created = fx
        .api
        .create_record(fx.contact, &json!({"name": "Ann"}))
        .unwrap();

    let updated = fx
        .api
        .update_record(created.id, &json!({"name": "Anna", "age": 32}))
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.entity_id, created.entity_id);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.get("name"), Some(&json!("Anna")));
}

#[test]
fn test_update_validates_against_the_records_entity() {
    let fx = setup();
    let created = fx
        .api
        .create_record(fx.company, &json!({"name": "Acme"}))
        .unwrap();

    let err = fx.api.update_record(created.id, &json!({"age": 3})).unwrap_err();
    assert_eq!(err.violations().unwrap(), ["Required field 'name' is missing"]);
}

#[test]
fn test_missing_records_are_not_found() {
    let fx = setup();
    let id = Uuid::new_v4();

    assert_eq!(fx.api.get_record(id).unwrap_err().status_code(), 404);
    assert_eq!(fx.api.delete_record(id).unwrap_err().status_code(), 404);
    assert_eq!(
        fx.api
            .update_record(id, &json!({"name": "x"}))
            .unwrap_err()
            .status_code(),
        404
    );
}

#[test]
fn test_delete_and_delete_by_entity() {
    let fx = setup();
    seed_contacts(&fx);

    let first = fx.api.records_by_entity(fx.contact, 0, 1).unwrap();
    fx.api.delete_record(first.records[0].id).unwrap();
    assert_eq!(fx.api.records_by_entity(fx.contact, 0, 20).unwrap().total, 3);

    assert_eq!(fx.api.delete_records_by_entity(fx.contact).unwrap(), 3);
    assert_eq!(fx.api.records_by_entity(fx.contact, 0, 20).unwrap().total, 0);
    assert_eq!(fx.api.records_by_entity(fx.company, 0, 20).unwrap().total, 1);
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_query_string_with_sort() {
    let fx = setup();
    seed_contacts(&fx);

    let query = Query::new(fx.contact)
        .with_query_string("WHERE status != 'CLOSED' AND age >= 18 ORDER BY age DESC");
    let page = fx.api.execute_query(&query).unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(
        names(page.iter().map(|r| r.payload["name"].clone())),
        vec!["Cid", "Ann"]
    );
}

#[test]
fn test_queries_never_cross_entities() {
    let fx = setup();
    seed_contacts(&fx);

    let everything = fx.api.execute_query(&Query::new(fx.company)).unwrap();
    assert_eq!(everything.total, 1);
    assert!(everything.iter().all(|r| r.entity_id == fx.company));

    assert_eq!(fx.api.count_query(&Query::new(fx.contact)).unwrap(), 4);
}

#[test]
fn test_paging() {
    let fx = setup();
    seed_contacts(&fx);

    let query = Query::new(fx.contact)
        .with_sort("name", SortDirection::Asc)
        .with_page(1, 3);
    let page = fx.api.execute_query(&query).unwrap();

    assert_eq!(page.total, 4);
    assert_eq!(page.len(), 1);
    assert_eq!(page.total_pages(), 2);
    assert!(!page.has_next());
    assert_eq!(page.records[0].get("name"), Some(&json!("Dee")));
}

#[test]
fn test_structured_tree_and_query_string_combine() {
    let fx = setup();
    seed_contacts(&fx);

    let tree = ConditionGroup::and().with_condition(ConditionLeaf::eq("status", json!("ACTIVE")));
    let query = Query::new(fx.contact)
        .with_root_group(tree)
        .with_query_string("WHERE age > 18");

    assert_eq!(fx.api.count_query(&query).unwrap(), 1);
}

#[test]
fn test_query_by_entity_name() {
    let fx = setup();
    seed_contacts(&fx);

    let page = fx
        .api
        .query_by_entity_name("contact", "WHERE name LIKE 'A'", 0, 20)
        .unwrap();
    assert_eq!(page.total, 1);

    let err = fx
        .api
        .query_by_entity_name("nobody", "", 0, 20)
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

/// Datetime and reference values match exactly as they were stored.
#[test]
fn test_stored_datetime_and_reference_text_matches_exactly() {
    let fx = setup();
    fx.api
        .create_record(
            fx.contact,
            &json!({
                "name": "Ann",
                "seenAt": "2024-01-15T10:30:00Z",
                "owner": "123E4567-E89B-12D3-A456-426614174000"
            }),
        )
        .unwrap();
    fx.api
        .create_record(fx.contact, &json!({"name": "Bob", "seenAt": "2024-01-15T10:30:00.000"}))
        .unwrap();

    let count = |text: &str| {
        fx.api
            .count_query(&Query::new(fx.contact).with_query_string(text))
            .unwrap()
    };

    assert_eq!(count("WHERE seenAt = '2024-01-15T10:30:00Z'"), 1);
    assert_eq!(count("WHERE seenAt = '2024-01-15T10:30:00.000'"), 1);
    assert_eq!(count("WHERE owner = '123E4567-E89B-12D3-A456-426614174000'"), 1);
    assert_eq!(count("WHERE seenAt IS NULL"), 0);
}

#[test]
fn test_bad_literal_is_a_client_error() {
    let fx = setup();
    let err = fx
        .api
        .execute_query(&Query::new(fx.contact).with_query_string("WHERE age > 'old'"))
        .unwrap_err();

    assert!(matches!(err, ApiError::QueryBuild(_)));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_unknown_entity_query_is_not_found() {
    let fx = setup();
    let err = fx.api.count_query(&Query::new(Uuid::new_v4())).unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn test_compile_query_is_entity_scoped() {
    let fx = setup();
    let criteria = fx
        .api
        .compile_query(&ConditionGroup::default(), fx.contact)
        .unwrap();
    assert_eq!(criteria.entity_scope(), Some(fx.contact));
    assert!(matches!(criteria, Criteria::And(_)));
}

// =============================================================================
// Store and Response Tests
// =============================================================================

#[test]
fn test_store_is_usable_directly() {
    let fx = setup();
    seed_contacts(&fx);

    let criteria = fx
        .api
        .compile_query(
            &ConditionGroup::and().with_condition(ConditionLeaf::is_null("status")),
            fx.contact,
        )
        .unwrap();
    assert_eq!(fx.api.store().count(&criteria).unwrap(), 0);
}

#[test]
fn test_response_envelopes() {
    let fx = setup();

    let ok = Response::from(fx.api.create_record(fx.contact, &json!({"name": "Ann"})));
    assert!(ok.is_success());

    let failed = Response::from(fx.api.create_record(fx.contact, &json!({})));
    let rendered: Value = serde_json::from_str(&failed.to_json()).unwrap();
    assert_eq!(rendered["status"], "error");
    assert_eq!(rendered["code"], "VALIDATION_FAILED");
    assert_eq!(rendered["http_status"], 400);
    assert_eq!(rendered["violations"][0], "Required field 'name' is missing");
}
