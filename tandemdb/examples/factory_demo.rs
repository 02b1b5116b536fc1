//! Compares the index topologies a factory descriptor can build.
//!
//! Every descriptor indexes the same vectors; recall is measured against the
//! exact `Flat` scan.

use std::collections::HashSet;
use std::time::Instant;

use rand::Rng;
use tandemdb::prelude::*;

const DIM: usize = 32;
const COUNT: usize = 2000;
const QUERIES: usize = 50;
const K: usize = 10;

fn main() -> Result<()> {
    println!("TandemDB Index Factory Demo\n");

    let mut rng = rand::thread_rng();
    let rows: Vec<Vec<f32>> = (0..COUNT)
        .map(|_| (0..DIM).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();
    let queries: Vec<Vec<f32>> = (0..QUERIES)
        .map(|_| (0..DIM).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();

    let exact = top_ids("Flat", &rows, &queries)?;

    println!("{:<22} {:>10} {:>8}", "descriptor", "search", "recall");
    println!("{:-<42}", "");
    for descriptor in ["Flat", "HNSW", "HNSW16", "IVF16,Flat", "IVF16_HNSW8,Flat"] {
        let start = Instant::now();
        let found = top_ids(descriptor, &rows, &queries)?;
        let elapsed = start.elapsed();

        let hits: usize = exact
            .iter()
            .zip(&found)
            .map(|(truth, got)| truth.intersection(got).count())
            .sum();
        println!(
            "{:<22} {:>10.2?} {:>7.1}%",
            descriptor,
            elapsed / QUERIES as u32,
            100.0 * hits as f64 / (QUERIES * K) as f64
        );
    }
    Ok(())
}

fn top_ids(descriptor: &str, rows: &[Vec<f32>], queries: &[Vec<f32>]) -> Result<Vec<HashSet<String>>> {
    let config = StoreConfig::new(DIM)
        .with_factory(descriptor)
        .with_index_params(IndexParams::default().with_nprobe(4));
    let mut store = DocumentStore::open(config, "memory://")?;

    // Training is a no-op for topologies that do not need it.
    store.train_index(None, Some(rows), None)?;
    let docs: Vec<Document> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| Document::with_id(format!("v{i}"), "").with_embedding(row.clone()))
        .collect();
    store.write(docs, None, Some(500))?;

    queries
        .iter()
        .map(|query| -> Result<HashSet<String>> {
            let hits = store.query_by_embedding(query, None, K, None, None)?;
            Ok(hits.into_iter().map(|doc| doc.id).collect())
        })
        .collect()
}
