use std::sync::Arc;

use serde_json::{json, Map};
use vecsink::{InMemorySink, SinkConnector, VectorRecord};

fn record(id: &str, vector: Vec<f32>, file_entry_id: &str) -> VectorRecord {
    VectorRecord::new(id, vector).with_file_entry_id(file_entry_id)
}

#[tokio::test]
async fn first_store_into_empty_collection_creates_it() {
    let sink = InMemorySink::new();
    assert_eq!(sink.dimensions().await, None);

    sink.store(&[record("a", vec![0.1, 0.2], "f1")])
        .await
        .expect("store");

    assert_eq!(sink.dimensions().await, Some(2));
    assert_eq!(sink.info().await.unwrap().number_vectors_stored, 1);
}

#[tokio::test]
async fn store_then_info_grows_by_batch_size() {
    let sink = InMemorySink::new();
    sink.store(&[record("a", vec![0.1, 0.2], "f1")]).await.unwrap();

    let batch = vec![
        record("b", vec![0.3, 0.4], "f2"),
        record("c", vec![0.5, 0.6], "f2"),
        record("d", vec![0.7, 0.8], "f3"),
    ];
    let counts = sink.store(&batch).await.unwrap();

    assert_eq!(counts, vec![3]);
    assert_eq!(sink.info().await.unwrap().number_vectors_stored, 4);
}

#[tokio::test]
async fn different_dimension_after_creation_fails_without_partial_insert() {
    let sink = InMemorySink::new();
    sink.store(&[record("a", vec![0.1, 0.2], "f1")]).await.unwrap();

    let err = sink
        .store(&[
            record("b", vec![0.3, 0.4], "f1"),
            record("c", vec![0.3, 0.4, 0.5], "f1"),
        ])
        .await
        .unwrap_err();

    assert!(err.is_insertion());
    assert_eq!(sink.info().await.unwrap().number_vectors_stored, 1);
    assert_eq!(sink.dimensions().await, Some(2));
}

#[tokio::test]
async fn delete_by_file_id_removes_only_that_file() {
    let sink = InMemorySink::new();
    sink.store(&[
        record("a", vec![0.0, 1.0], "f1"),
        record("b", vec![1.0, 0.0], "f1"),
        record("c", vec![1.0, 1.0], "f2"),
    ])
    .await
    .unwrap();
    assert_eq!(sink.info().await.unwrap().number_vectors_stored, 3);

    assert!(sink.delete_vectors_with_file_id("f1").await.unwrap());

    assert_eq!(sink.info().await.unwrap().number_vectors_stored, 1);
    let results = sink.search(&[0.0, 1.0], 10, None).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.id()).collect();
    assert_eq!(ids, ["c"]);
}

#[tokio::test]
async fn deleting_an_unknown_file_id_succeeds() {
    let sink = InMemorySink::new();
    sink.store(&[record("a", vec![0.0, 1.0], "f1")]).await.unwrap();

    assert!(sink.delete_vectors_with_file_id("missing").await.unwrap());
    assert_eq!(sink.info().await.unwrap().number_vectors_stored, 1);
}

#[tokio::test]
async fn search_is_bounded_by_limit_and_collection_size() {
    let sink = InMemorySink::new();
    sink.store(&[
        record("near", vec![1.0, 0.0], "f1"),
        record("mid", vec![0.5, 0.5], "f1"),
        record("far", vec![-1.0, 0.0], "f1"),
    ])
    .await
    .unwrap();

    let two = sink.search(&[1.0, 0.0], 2, None).await.unwrap();
    let ids: Vec<&str> = two.iter().map(|r| r.id()).collect();
    assert_eq!(ids, ["near", "mid"]);
    assert!(two[0].score() <= two[1].score());

    let all = sink.search(&[1.0, 0.0], 10, None).await.unwrap();
    assert_eq!(all.len(), 3);

    assert!(sink.search(&[1.0, 0.0], 0, None).await.unwrap_err().is_invalid_input());
}

#[tokio::test]
async fn search_applies_metadata_filter() {
    let sink = InMemorySink::new();
    sink.store(&[
        record("a", vec![1.0, 0.0], "f1").with_field("lang", "rust"),
        record("b", vec![0.9, 0.0], "f1").with_field("lang", "go"),
    ])
    .await
    .unwrap();

    let mut filter = Map::new();
    filter.insert("lang".to_string(), json!("go"));
    let results = sink.search(&[1.0, 0.0], 5, Some(&filter)).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id(), "b");
}

#[tokio::test]
async fn storing_an_existing_id_replaces_it() {
    let sink = InMemorySink::new();
    sink.store(&[record("a", vec![0.0, 1.0], "f1")]).await.unwrap();
    sink.store(&[record("a", vec![1.0, 0.0], "f2")]).await.unwrap();

    assert_eq!(sink.info().await.unwrap().number_vectors_stored, 1);
    let results = sink.search(&[1.0, 0.0], 1, None).await.unwrap();
    assert_eq!(results[0].metadata()["_file_entry_id"], "f2");
}

#[tokio::test]
async fn concurrent_stores_through_trait_object() {
    let sink: Arc<dyn SinkConnector> = Arc::new(InMemorySink::new());
    assert!(sink.validation().await.unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let sink = sink.clone();
            tokio::spawn(async move {
                sink.store(&[record(&format!("r{i}"), vec![i as f32, 1.0], "f1")])
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("join").expect("store");
    }
    assert_eq!(sink.info().await.unwrap().number_vectors_stored, 8);
}
