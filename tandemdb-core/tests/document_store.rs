//! End-to-end behavior of the document store over both metadata backends.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::json;
use tandemdb_core::{
    ConsistencyWarning, Document, DocumentStore, Error, Filter, IndexParams, Meta,
    MemoryMetadataStore, MetadataStore, Similarity, StoreConfig,
};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir(name: &str) -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir()
        .join("tandemdb_test_document_store")
        .join(format!("{}_{}_{}", name, std::process::id(), id));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn memory_store(config: StoreConfig) -> DocumentStore {
    DocumentStore::new(config, Arc::new(MemoryMetadataStore::new())).unwrap()
}

fn unit_docs() -> Vec<Document> {
    vec![
        Document::with_id("a", "first").with_embedding(vec![1.0f32, 0.0, 0.0, 0.0]),
        Document::with_id("b", "second").with_embedding(vec![0.0f32, 1.0, 0.0, 0.0]),
    ]
}

#[test]
fn test_flat_query_scores_and_probability() {
    let mut store = memory_store(StoreConfig::new(4));
    store.write(unit_docs(), None, None).unwrap();

    let hits = store
        .query_by_embedding(&[1.0, 0.0, 0.0, 0.0], None, 1, None, None)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "a");
    assert_eq!(hits[0].score, Some(1.0));
    assert!((hits[0].probability.unwrap() - 0.5025).abs() < 1e-4);
    assert_eq!(hits[0].vector_id(), Some(0));
}

#[test]
fn test_fewer_results_than_top_k() {
    let mut store = memory_store(StoreConfig::new(4));
    store.write(unit_docs(), None, None).unwrap();

    let hits = store
        .query_by_embedding(&[0.5, 0.5, 0.0, 0.0], None, 10, None, None)
        .unwrap();
    assert_eq!(hits.len(), 2);
}

#[test]
fn test_query_wrong_dimension() {
    let mut store = memory_store(StoreConfig::new(4));
    store.write(unit_docs(), None, None).unwrap();
    assert!(matches!(
        store.query_by_embedding(&[1.0, 0.0], None, 1, None, None),
        Err(Error::DimensionMismatch { expected: 4, got: 2 })
    ));
}

#[test]
fn test_update_embeddings_on_empty_store_warns() {
    let mut store = memory_store(StoreConfig::new(4));
    let embedder = |docs: &[Document]| -> tandemdb_core::Result<Vec<Vec<f32>>> {
        Ok(docs.iter().map(|_| vec![0.0; 4]).collect())
    };
    let report = store
        .update_embeddings(&embedder, None, false, None, None)
        .unwrap();
    assert_eq!(report.documents_embedded, 0);
    assert_eq!(
        report.warnings,
        vec![ConsistencyWarning::NothingToEmbed {
            namespace: "document".to_string()
        }]
    );
}

#[test]
fn test_update_existing_reembeds_everything() {
    let mut store = memory_store(StoreConfig::new(4));
    store.write(unit_docs(), None, None).unwrap();

    let embedder = |docs: &[Document]| -> tandemdb_core::Result<Vec<Vec<f32>>> {
        Ok(docs.iter().map(|_| vec![0.0, 0.0, 1.0, 0.0]).collect())
    };
    let report = store
        .update_embeddings(&embedder, None, true, None, None)
        .unwrap();
    assert_eq!(report.documents_embedded, 2);
    assert_eq!(store.get_embedding_count(None), 4);

    let hits = store
        .query_by_embedding(&[0.0, 0.0, 1.0, 0.0], None, 4, None, None)
        .unwrap();
    let ids: Vec<_> = hits.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(hits.iter().all(|d| d.score == Some(1.0)));
}

#[test]
fn test_cosine_rejected() {
    let config = StoreConfig::new(4).with_similarity(Similarity::Cosine);
    let result = DocumentStore::new(config, Arc::new(MemoryMetadataStore::new()));
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[test]
fn test_delete_then_write_restarts_vector_ids() {
    let mut store = memory_store(StoreConfig::new(4));
    store.write(unit_docs(), None, None).unwrap();
    assert_eq!(store.delete_all_documents(None, None).unwrap(), 2);
    assert_eq!(store.get_document_count(None, None).unwrap(), 0);

    store
        .write(
            vec![Document::with_id("c", "third").with_embedding(vec![0.0f32, 0.0, 0.0, 1.0])],
            None,
            None,
        )
        .unwrap();
    let c = store.get_document_by_id("c", None).unwrap().unwrap();
    assert_eq!(c.vector_id(), Some(0));
}

#[test]
fn test_namespaces_are_independent() {
    let mut store = memory_store(StoreConfig::new(4));
    store.write(unit_docs(), None, None).unwrap();
    store.write(unit_docs(), Some("other"), None).unwrap();

    assert_eq!(store.get_embedding_count(None), 2);
    assert_eq!(store.get_embedding_count(Some("other")), 2);
    assert_eq!(store.get_embedding_count(Some("missing")), 0);
    assert!(matches!(
        store.query_by_embedding(&[1.0, 0.0, 0.0, 0.0], Some("missing"), 1, None, None),
        Err(Error::IndexNotFound(_))
    ));

    store.delete_all_documents(Some("other"), None).unwrap();
    assert_eq!(store.get_document_count(None, None).unwrap(), 2);
}

#[test]
fn test_filtered_count_and_listing() {
    let mut store = memory_store(StoreConfig::new(4));
    let docs = vec![
        Document::with_id("a", "x").with_meta(Meta::new().with_field("year", 2020)),
        Document::with_id("b", "y").with_meta(Meta::new().with_field("year", 2021)),
        Document::with_id("c", "z").with_meta(Meta::new().with_field("year", 2022)),
    ];
    store.write(docs, None, None).unwrap();

    let recent = Filter::field("year").gte(2021);
    assert_eq!(store.get_document_count(Some(&recent), None).unwrap(), 2);
    let listed = store
        .get_all_documents(None, Some(recent), None, Some(1))
        .unwrap();
    let ids: Vec<_> = listed.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);
}

#[test]
fn test_write_values() {
    let mut store = memory_store(StoreConfig::new(2));
    let report = store
        .write_values(
            vec![
                json!({"id": "a", "text": "alpha", "embedding": [1.0, 0.0], "source": "wiki"}),
                json!({"id": "b", "text": "beta", "embedding": [0.0, 1.0]}),
            ],
            None,
            None,
        )
        .unwrap();
    assert_eq!(report.documents_written, 2);
    assert_eq!(report.vectors_added, 2);

    let a = store.get_document_by_id("a", None).unwrap().unwrap();
    assert_eq!(a.meta.get_str("source"), Some("wiki"));
    assert!(a.embedding.is_none());
}

#[test]
fn test_ivf_train_then_write() {
    let config = StoreConfig::new(2)
        .with_factory("IVF2,Flat")
        .with_index_params(IndexParams::default().with_nprobe(2));
    let mut store = memory_store(config);

    let docs = vec![
        Document::with_id("a", "a").with_embedding(vec![1.0f32, 0.0]),
        Document::with_id("b", "b").with_embedding(vec![0.9f32, 0.1]),
        Document::with_id("c", "c").with_embedding(vec![0.0f32, 1.0]),
        Document::with_id("d", "d").with_embedding(vec![0.1f32, 0.9]),
    ];
    assert!(matches!(
        store.write(docs.clone(), None, None),
        Err(Error::Configuration(_))
    ));
    assert_eq!(store.get_document_count(None, None).unwrap(), 0);

    store.train_index(Some(&docs), None, None).unwrap();
    store.write(docs, None, None).unwrap();

    let hits = store
        .query_by_embedding(&[0.0, 1.0], None, 4, None, None)
        .unwrap();
    assert_eq!(hits.len(), 4);
    assert_eq!(hits[0].id, "c");
}

#[test]
fn test_hnsw_descriptor_roundtrip() {
    let config = StoreConfig::new(3).with_factory("HNSW");
    let mut store = memory_store(config);
    let docs: Vec<Document> = (0..20)
        .map(|i| {
            let x = i as f32 / 20.0;
            Document::with_id(format!("d{i}"), "t").with_embedding(vec![x, 1.0 - x, 0.5])
        })
        .collect();
    store.write(docs, None, Some(7)).unwrap();

    let hits = store
        .query_by_embedding(&[1.0, 0.0, 0.0], None, 3, None, Some(true))
        .unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].id, "d19");
    assert!(hits.iter().all(|d| d.embedding.is_some()));
}

#[test]
fn test_save_load_reproduces_scores() {
    let dir = temp_dir("save_load");
    let connection = format!("file://{}", dir.join("metadata").display());
    let index_path = dir.join("index.tdbx");
    let query = [0.3, 0.9, -0.2, 0.1];

    let before = {
        let mut store = DocumentStore::open(StoreConfig::new(4), &connection).unwrap();
        let docs: Vec<Document> = (0..10)
            .map(|i| {
                let x = i as f32 * 0.1;
                Document::with_id(format!("d{i}"), format!("doc {i}"))
                    .with_embedding(vec![x, 1.0 - x, x * x, -x])
            })
            .collect();
        store.write(docs, None, Some(3)).unwrap();
        let hits = store.query_by_embedding(&query, None, 5, None, None).unwrap();
        store.save(&index_path, None).unwrap();
        hits
    };

    let store = DocumentStore::load(&index_path, &connection, None).unwrap();
    assert_eq!(store.config().vector_dim, 4);
    let after = store.query_by_embedding(&query, None, 5, None, None).unwrap();

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.id, a.id);
        assert_eq!(b.score.unwrap().to_bits(), a.score.unwrap().to_bits());
    }

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_overwrite_mode_keeps_single_document() {
    let config = StoreConfig::new(4).with_update_existing_documents(true);
    let metadata: Arc<dyn MetadataStore> = Arc::new(MemoryMetadataStore::new());
    let mut store = DocumentStore::new(config, Arc::clone(&metadata)).unwrap();
    store.write(unit_docs(), None, None).unwrap();
    let report = store.write(unit_docs(), None, None).unwrap();

    assert!(report
        .warnings
        .contains(&ConsistencyWarning::OverwriteWithVectors));
    assert_eq!(metadata.count("document", None, false).unwrap(), 2);
    assert_eq!(store.get_embedding_count(None), 4);
}
