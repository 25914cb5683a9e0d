//! Benchmarks for anti-recommendation resolution.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use antirec::graph::index::RelationIndex;
use antirec::graph::RelationGraph;
use antirec::record::RecordKey;
use antirec::resolve::graph::GraphResolver;
use antirec::resolve::path::PathGraph;
use antirec::resolve::{KeyUniverse, Resolver};

const RECORDS: usize = 10_000;

fn record(i: usize) -> RecordKey {
    RecordKey::new(format!("Record {i:05}")).unwrap()
}

/// Every record links to the next three, wrapping around.
fn ring() -> (Arc<RelationIndex>, KeyUniverse) {
    let index = RelationIndex::new();
    for i in 0..RECORDS {
        index.insert_edges(&record(i), (1..=3).map(|d| record((i + d) % RECORDS)));
    }
    (Arc::new(index), KeyUniverse::new((0..RECORDS).map(record)))
}

fn bench_direct_edges(c: &mut Criterion) {
    let (index, universe) = ring();
    let resolver = GraphResolver::new(index, universe);
    let key = record(42);
    let seen: Vec<_> = (0..64).map(record).collect();

    c.bench_function("resolve_direct_10k", |bench| {
        bench.iter(|| black_box(resolver.resolve(&key, &seen).unwrap()))
    });
}

fn bench_global_scan(c: &mut Criterion) {
    let (_, universe) = ring();
    // No edges at all: every call falls through to the scan.
    let resolver = GraphResolver::new(Arc::new(RelationIndex::new()), universe);
    let key = record(0);
    let seen: Vec<_> = (0..RECORDS / 2).map(record).collect();

    c.bench_function("resolve_global_scan_10k", |bench| {
        bench.iter(|| black_box(resolver.resolve(&key, &seen).unwrap()))
    });
}

fn bench_path_build(c: &mut Criterion) {
    let (index, universe) = ring();
    let graph: &dyn RelationGraph = index.as_ref();

    c.bench_function("path_graph_build_10k", |bench| {
        bench.iter(|| black_box(PathGraph::build(graph, &universe, None).unwrap()))
    });
}

criterion_group!(benches, bench_direct_edges, bench_global_scan, bench_path_build);
criterion_main!(benches);
