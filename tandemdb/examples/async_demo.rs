//! Async API demo using AsyncDocumentStore.
//!
//! Run with: cargo run --example async_demo --features async

#[cfg(feature = "async")]
use tandemdb::prelude::*;
#[cfg(feature = "async")]
use tandemdb::AsyncDocumentStore;

#[cfg(feature = "async")]
#[tokio::main]
async fn main() {
    println!("Async TandemDB Demo\n");

    let store = AsyncDocumentStore::open(StoreConfig::new(64), "memory://".to_string())
        .await
        .expect("Failed to open store");

    // Writers are serialized by the store lock; batches from many tasks interleave safely.
    println!("Writing 20 batches of 50 documents concurrently...");
    let start = std::time::Instant::now();
    let mut handles = vec![];
    for batch in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let docs: Vec<Document> = (0..50)
                .map(|i| {
                    let n = batch * 50 + i;
                    let embedding: Vec<f32> =
                        (0..64).map(|j| ((n * 64 + j) as f32).sin()).collect();
                    Document::with_id(format!("doc-{n}"), format!("document {n}"))
                        .with_embedding(embedding)
                })
                .collect();
            store.write(docs, None, None).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    println!("   [OK] wrote in {:?}", start.elapsed());
    println!(
        "   {} vectors\n",
        store.get_embedding_count(None).await.unwrap()
    );

    println!("Searching...");
    let query: Vec<f32> = (0..64).map(|i| (i as f32 * 0.1).cos()).collect();
    let hits = store.query_by_embedding(query, None, 5).await.unwrap();
    for (i, doc) in hits.iter().enumerate() {
        println!(
            "     {}. {} (score: {:.4})",
            i + 1,
            doc.id,
            doc.score.unwrap_or_default()
        );
    }

    println!("\nDone!");
}

#[cfg(not(feature = "async"))]
fn main() {
    println!("This example requires the 'async' feature.");
    println!("Run with: cargo run --example async_demo --features async");
}
