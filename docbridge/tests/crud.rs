//! End-to-end CRUD tests running the data layer against the in-memory store.

use bson::{Bson, doc};
use docbridge::memory::InMemoryStore;
use docbridge::prelude::*;

fn people_schema() -> Schema {
    Schema::builder()
        .required("name", FieldType::String)
        .required("age", FieldType::Integer)
        .build()
}

fn layer() -> DataLayer<InMemoryStore> {
    DataLayer::new(InMemoryStore::new())
}

fn target() -> CollectionRef {
    CollectionRef::new("appdb", "people")
}

#[tokio::test]
async fn insert_then_fetch_by_returned_id() {
    let layer = layer();
    let target = target();

    let ids = layer
        .insert(&people_schema(), doc! { "name": "John", "age": 20 }, &target)
        .await
        .unwrap();
    assert_eq!(ids.len(), 1);

    let fetched = layer.fetch(ids[0].as_str(), &target).await.unwrap();
    let Fetched::One(Some(found)) = fetched else {
        panic!("expected a single document, got {fetched:?}");
    };
    assert_eq!(found.get_str("name").unwrap(), "John");
    assert_eq!(found.get_i32("age").unwrap(), 20);
    assert_eq!(found.get_str("_id").unwrap(), ids[0]);
}

#[tokio::test]
async fn textual_age_is_coerced_to_integer() {
    let layer = layer();
    let target = target();

    let ids = layer
        .insert(&people_schema(), doc! { "name": "John", "age": "20" }, &target)
        .await
        .unwrap();

    let Fetched::One(Some(found)) = layer.fetch(ids[0].as_str(), &target).await.unwrap() else {
        panic!("document not found");
    };
    assert_eq!(found.get_i64("age").unwrap(), 20);
}

#[tokio::test]
async fn missing_required_field_is_named_in_the_error() {
    let layer = layer();

    let err = layer
        .insert(&people_schema(), doc! { "name": "John" }, &target())
        .await
        .unwrap_err();

    let DataError::Validation(failure) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(failure.fields().contains(&"age"));
}

#[tokio::test]
async fn validation_failure_reports_every_bad_document() {
    let layer = layer();

    let err = layer
        .insert(
            &people_schema(),
            vec![
                doc! { "name": "ok", "age": 1 },
                doc! { "age": 2 },
                doc! { "name": "x" },
            ],
            &target(),
        )
        .await
        .unwrap_err();

    let DataError::Validation(failure) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    let indexes: Vec<_> = failure.errors().iter().map(|e| e.index).collect();
    assert_eq!(indexes, vec![Some(1), Some(2)]);
}

#[tokio::test]
async fn empty_payload_is_rejected() {
    let layer = layer();

    let err = layer
        .insert(&people_schema(), Vec::<bson::Document>::new(), &target())
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Input(_)));
}

#[tokio::test]
async fn update_by_string_id_replaces_fields() {
    let layer = layer();
    let target = target();
    let schema = Schema::builder().required("name", FieldType::String).build();

    layer
        .insert(&schema, doc! { "_id": "u1", "name": "A" }, &target)
        .await
        .unwrap();

    let outcome = layer
        .update(&schema, doc! { "_id": "u1" }, doc! { "name": "B" }, &target, UpdateMode::Set)
        .await
        .unwrap();
    assert_eq!(outcome.matched, 1);
    assert_eq!(outcome.modified, 1);
    assert_eq!(outcome.upserted_id, None);

    let Fetched::Documents(found) = layer
        .fetch(doc! { "_id": "u1" }, &target)
        .await
        .unwrap()
    else {
        panic!("expected a filter fetch");
    };
    assert_eq!(found, vec![doc! { "_id": "u1", "name": "B" }]);
}

#[tokio::test]
async fn update_by_uuid_match_key() {
    let layer = layer();
    let target = target();

    let ids = layer
        .insert(&people_schema(), doc! { "name": "John", "age": 20 }, &target)
        .await
        .unwrap();

    let outcome = layer
        .update(
            &people_schema(),
            ids[0].as_str(),
            doc! { "age": 21 },
            &target,
            UpdateMode::Set,
        )
        .await
        .unwrap();
    assert_eq!(outcome.modified, 1);

    let Fetched::One(Some(found)) = layer.fetch(ids[0].as_str(), &target).await.unwrap() else {
        panic!("document not found");
    };
    assert_eq!(found.get_i32("age").unwrap(), 21);
    assert_eq!(found.get_str("name").unwrap(), "John");
}

#[tokio::test]
async fn append_mode_adds_to_arrays_without_duplicating() {
    let layer = layer();
    let target = target();
    let schema = Schema::builder()
        .required("name", FieldType::String)
        .optional("tags", FieldType::Array)
        .build();

    layer
        .insert(&schema, doc! { "_id": "u1", "name": "A", "tags": ["x"] }, &target)
        .await
        .unwrap();

    layer
        .update(
            &schema,
            doc! { "_id": "u1" },
            doc! { "tags": ["x", "y"] },
            &target,
            UpdateMode::Append,
        )
        .await
        .unwrap();

    let Fetched::Documents(found) = layer.fetch(doc! { "_id": "u1" }, &target).await.unwrap()
    else {
        panic!("expected a filter fetch");
    };
    let tags = found[0].get_array("tags").unwrap();
    assert_eq!(
        tags,
        &vec![Bson::String("x".into()), Bson::String("y".into())]
    );
}

#[tokio::test]
async fn set_mode_replaces_arrays_wholesale() {
    let layer = layer();
    let target = target();
    let schema = Schema::builder().optional("tags", FieldType::Array).build();

    layer
        .insert(&schema, doc! { "_id": "u1", "tags": ["x"] }, &target)
        .await
        .unwrap();
    layer
        .update(
            &schema,
            doc! { "_id": "u1" },
            doc! { "tags": ["y"] },
            &target,
            UpdateMode::Set,
        )
        .await
        .unwrap();

    let Fetched::Documents(found) = layer.fetch(doc! { "_id": "u1" }, &target).await.unwrap()
    else {
        panic!("expected a filter fetch");
    };
    assert_eq!(found[0].get_array("tags").unwrap(), &vec![Bson::String("y".into())]);
}

#[tokio::test]
async fn upsert_reports_inserted_id_with_zero_modified() {
    let layer = layer();
    let target = target();

    let outcome = layer
        .update(
            &people_schema(),
            doc! { "name": "nobody" },
            doc! { "name": "nobody", "age": 1 },
            &target,
            UpdateMode::Set,
        )
        .await
        .unwrap();
    assert_eq!(outcome.matched, 0);
    assert_eq!(outcome.modified, 0);
    assert!(outcome.upserted_id.is_some());

    let Fetched::Documents(found) = layer
        .fetch(doc! { "name": "nobody" }, &target)
        .await
        .unwrap()
    else {
        panic!("expected a filter fetch");
    };
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get_i32("age").unwrap(), 1);
}

#[tokio::test]
async fn fetch_by_field_name_returns_distinct_values() {
    let layer = layer();
    let target = target();

    layer
        .insert(
            &people_schema(),
            vec![
                doc! { "name": "John", "age": 20 },
                doc! { "name": "Jane", "age": 30 },
                doc! { "name": "John", "age": 40 },
            ],
            &target,
        )
        .await
        .unwrap();

    let Fetched::Values(values) = layer.fetch("name", &target).await.unwrap() else {
        panic!("expected distinct values");
    };
    assert_eq!(
        values,
        vec![Bson::String("John".into()), Bson::String("Jane".into())]
    );
}

#[tokio::test]
async fn delete_by_filter_removes_only_matching_documents() {
    let layer = layer();
    let target = target();

    layer
        .insert(
            &people_schema(),
            vec![
                doc! { "name": "John", "age": 20 },
                doc! { "name": "Jane", "age": 30 },
            ],
            &target,
        )
        .await
        .unwrap();

    let deleted = layer.delete(doc! { "name": "John" }, &target).await.unwrap();
    assert_eq!(deleted, Deleted::Documents(1));

    let Fetched::Documents(remaining) = layer.fetch(bson::Document::new(), &target).await.unwrap()
    else {
        panic!("expected a filter fetch");
    };
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].get_str("name").unwrap(), "Jane");
}

#[tokio::test]
async fn delete_match_naming_the_collection_drops_it() {
    let layer = layer();
    let target = target();

    layer
        .insert(&people_schema(), doc! { "name": "John", "age": 20 }, &target)
        .await
        .unwrap();

    let deleted = layer.delete("people", &target).await.unwrap();
    assert_eq!(deleted, Deleted::DroppedCollection);

    let Fetched::Documents(remaining) = layer.fetch(bson::Document::new(), &target).await.unwrap()
    else {
        panic!("expected a filter fetch");
    };
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn delete_with_unrelated_field_name_is_rejected() {
    let layer = layer();

    let err = layer.delete("name", &target()).await.unwrap_err();
    assert!(matches!(err, DataError::Input(_)));
}

#[tokio::test]
async fn aggregate_match_stage_returns_matching_documents() {
    let layer = layer();
    let target = target();

    layer
        .insert(
            &people_schema(),
            vec![
                doc! { "name": "John", "age": 20 },
                doc! { "name": "Jane", "age": 30 },
            ],
            &target,
        )
        .await
        .unwrap();

    let results = layer
        .aggregate(vec![doc! { "$match": { "name": "John" } }], &target)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get_str("name").unwrap(), "John");
}

#[tokio::test]
async fn fetch_of_unknown_identifier_returns_none() {
    let layer = layer();

    let id = uuid::Uuid::new_v4().to_string();
    let fetched = layer.fetch(id.as_str(), &target()).await.unwrap();
    assert_eq!(fetched, Fetched::One(None));
}

#[tokio::test]
async fn defaults_fill_in_optional_fields() {
    let layer = layer();
    let target = target();
    let schema = Schema::builder()
        .required("name", FieldType::String)
        .with_default("active", FieldType::Boolean, Bson::Boolean(true))
        .build();

    let ids = layer
        .insert(&schema, doc! { "name": "John" }, &target)
        .await
        .unwrap();

    let Fetched::One(Some(found)) = layer.fetch(ids[0].as_str(), &target).await.unwrap() else {
        panic!("document not found");
    };
    assert!(found.get_bool("active").unwrap());
}
