//! Benchmarks for index search and store queries.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use tandemdb_core::similarity::inner_product;
use tandemdb_core::{
    Document, DocumentStore, IndexParams, Similarity, StoreConfig, VectorBatch, VectorIndexHandle,
};

fn generate_random_vector(dim: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn filled_index(descriptor: &str, dim: usize, count: usize) -> VectorIndexHandle {
    let mut index =
        VectorIndexHandle::create(dim, descriptor, Similarity::DotProduct, &IndexParams::default())
            .unwrap();
    let rows: Vec<Vec<f32>> = (0..count).map(|_| generate_random_vector(dim)).collect();
    index.add(&VectorBatch::from_rows(dim, &rows).unwrap()).unwrap();
    index
}

fn bench_inner_product(c: &mut Criterion) {
    let mut group = c.benchmark_group("inner_product");

    for dim in [128, 384, 768, 1536].iter() {
        let a = generate_random_vector(*dim);
        let b = generate_random_vector(*dim);

        group.throughput(Throughput::Elements(*dim as u64));
        group.bench_with_input(BenchmarkId::from_parameter(dim), dim, |bench, _| {
            bench.iter(|| inner_product(black_box(&a), black_box(&b)))
        });
    }

    group.finish();
}

fn bench_flat_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_search");

    for num_vectors in [1000, 10000].iter() {
        let dim = 384;
        let index = filled_index("Flat", dim, *num_vectors);
        let query = generate_random_vector(dim);

        group.throughput(Throughput::Elements(*num_vectors as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_vectors),
            num_vectors,
            |bench, _| bench.iter(|| index.search(black_box(&query), 10).unwrap()),
        );
    }

    group.finish();
}

fn bench_hnsw_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_search");
    group.sample_size(20);

    for num_vectors in [1000, 10000].iter() {
        let dim = 128;
        let index = filled_index("HNSW", dim, *num_vectors);
        let query = generate_random_vector(dim);

        group.bench_with_input(
            BenchmarkId::from_parameter(num_vectors),
            num_vectors,
            |bench, _| bench.iter(|| index.search(black_box(&query), 10).unwrap()),
        );
    }

    group.finish();
}

fn bench_store_query(c: &mut Criterion) {
    let dim = 128;
    let mut store = DocumentStore::open(StoreConfig::new(dim), "memory://").unwrap();
    let docs: Vec<Document> = (0..5000)
        .map(|i| {
            Document::with_id(format!("doc-{i}"), "benchmark text")
                .with_embedding(generate_random_vector(dim))
        })
        .collect();
    store.write(docs, None, None).unwrap();
    let query = generate_random_vector(dim);

    c.bench_function("store_query_top10", |bench| {
        bench.iter(|| {
            store
                .query_by_embedding(black_box(&query), None, 10, None, None)
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_inner_product,
    bench_flat_search,
    bench_hnsw_search,
    bench_store_query
);
criterion_main!(benches);
