//! Persistence demonstration for TandemDB.
//!
//! This example shows how to:
//! 1. Open a store over a durable metadata log
//! 2. Write documents with embeddings
//! 3. Save the index, drop the store (simulating restart) and load it back
//! 4. Verify queries return the same scores

use std::fs;

use tandemdb::prelude::*;

fn main() -> Result<()> {
    let root = std::env::temp_dir().join("tandemdb_persistence_demo");
    let _ = fs::remove_dir_all(&root);
    let connection = format!("file://{}", root.join("metadata").display());
    let index_path = root.join("document.tdbx");
    let query = [0.88, 0.85, 0.12, 0.03];

    println!("TandemDB Persistence Demo\n");

    println!("Phase 1: writing documents...");
    let before = {
        let mut store = DocumentStore::open(StoreConfig::new(4).with_factory("HNSW16"), &connection)?;
        let docs = vec![
            Document::with_id("rust-basics", "Rust programming basics")
                .with_embedding(vec![0.9f32, 0.8, 0.1, 0.0]),
            Document::with_id("rust-advanced", "Advanced Rust patterns")
                .with_embedding(vec![0.85f32, 0.9, 0.15, 0.05]),
            Document::with_id("python-ds", "Python data science")
                .with_embedding(vec![0.1f32, 0.2, 0.9, 0.85]),
        ];
        store.write(docs, None, None)?;
        store.save(&index_path, None)?;
        println!("   [OK] saved {} vectors to {}", store.get_embedding_count(None), index_path.display());
        store.query_by_embedding(&query, None, 3, None, None)?
    };

    println!("\nPhase 2: loading after restart...");
    let store = DocumentStore::load(&index_path, &connection, None)?;
    println!(
        "   [OK] {} documents, {} vectors, factory {}",
        store.get_document_count(None, None)?,
        store.get_embedding_count(None),
        store.config().factory
    );

    let after = store.query_by_embedding(&query, None, 3, None, None)?;
    for (b, a) in before.iter().zip(&after) {
        let same = b.id == a.id && b.score == a.score;
        println!(
            "   {} {:<14} {:.4} {}",
            if same { "[OK]" } else { "[!!]" },
            a.id,
            a.score.unwrap_or_default(),
            a.text
        );
    }

    fs::remove_dir_all(&root).map_err(|e| Error::Io(e.to_string()))?;
    println!("\nDone.");
    Ok(())
}
