//! Quick start example for TandemDB.
//!
//! Writes a handful of documents, queries them, then embeds a few more later.

use serde_json::json;
use tandemdb::prelude::*;

// Stand-in for a real embedding model: counts a few topic words.
fn toy_embedding(text: &str) -> Vec<f32> {
    let text = text.to_lowercase();
    ["rust", "python", "data", "bread"]
        .iter()
        .map(|word| text.matches(word).count() as f32)
        .collect()
}

fn main() -> Result<()> {
    println!("TandemDB Quick Start Example\n");

    let mut store = DocumentStore::open(StoreConfig::new(4), "memory://")?;

    let documents = vec![
        "Introduction to Rust programming",
        "Advanced Rust patterns and idioms",
        "Python for data science",
        "Data pipelines in Rust",
    ];
    let docs: Vec<Document> = documents
        .iter()
        .map(|text| {
            Document::new(*text)
                .with_meta(Meta::new().with_field("kind", "article"))
                .with_embedding(toy_embedding(text))
        })
        .collect();

    println!("Writing {} documents...", docs.len());
    let report = store.write(docs, None, None)?;
    println!(
        "   [OK] {} documents, {} vectors\n",
        report.documents_written, report.vectors_added
    );

    let query = toy_embedding("rust data");
    println!("Top 3 results for 'rust data':");
    println!("{:-<60}", "");
    for (rank, doc) in store
        .query_by_embedding(&query, None, 3, None, None)?
        .iter()
        .enumerate()
    {
        println!(
            "  {}. {} (score: {:.2}, probability: {:.4})",
            rank + 1,
            doc.text,
            doc.score.unwrap_or_default(),
            doc.probability.unwrap_or_default()
        );
    }
    println!("{:-<60}\n", "");

    // Raw JSON documents without embeddings, embedded afterwards.
    store.write_values(
        vec![
            json!({"text": "Sourdough bread at home", "kind": "recipe"}),
            json!({"text": "Rye bread basics", "kind": "recipe"}),
        ],
        None,
        None,
    )?;
    let embedder = |docs: &[Document]| -> Result<Vec<Vec<f32>>> {
        Ok(docs.iter().map(|d| toy_embedding(&d.text)).collect())
    };
    let recipes = Filter::field("kind").eq("recipe");
    let update = store.update_embeddings(&embedder, None, false, Some(recipes), None)?;
    println!("Embedded {} recipes later", update.documents_embedded);

    let hits = store.query_by_embedding(&toy_embedding("bread"), None, 1, None, None)?;
    if let Some(best) = hits.first() {
        println!("Best match for 'bread': {}", best.text);
    }

    println!(
        "\nStore holds {} documents and {} vectors.",
        store.get_document_count(None, None)?,
        store.get_embedding_count(None)
    );
    Ok(())
}
