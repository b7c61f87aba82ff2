use criterion::{black_box, criterion_group, criterion_main, Criterion};
use schemnet::{extract, SchematicDoc};
use std::path::PathBuf;

fn fixture_source(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(path).expect("fixture should be readable")
}

fn bench_parse_document(c: &mut Criterion) {
    let source = fixture_source("quad_gate.kicad_sch");
    c.bench_function("parse_document", |b| {
        b.iter(|| SchematicDoc::parse(black_box(&source)));
    });
}

fn bench_extract(c: &mut Criterion) {
    let source = fixture_source("quad_gate.kicad_sch");
    let doc = SchematicDoc::parse(&source).expect("fixture should parse");
    c.bench_function("extract", |b| {
        b.iter(|| extract(black_box(&doc)));
    });
}

criterion_group!(benches, bench_parse_document, bench_extract);
criterion_main!(benches);
