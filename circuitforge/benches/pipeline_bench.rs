use criterion::{black_box, criterion_group, criterion_main, Criterion};
use circuitforge::prelude::*;
use circuitforge::{clean_model_output, export, parse, render};
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

fn bench_clean_and_parse(c: &mut Criterion) {
    let raw = fixture("model_output.txt");

    c.bench_function("clean_and_parse", |b| {
        b.iter(|| parse(&clean_model_output(black_box(&raw))));
    });
}

fn bench_render(c: &mut Criterion) {
    let netlist = parse(&fixture("transistor.cir"));

    c.bench_function("render", |b| {
        b.iter(|| render(black_box(&netlist)));
    });
}

fn bench_export(c: &mut Criterion) {
    let drawing = render(&parse(&fixture("transistor.cir")));

    c.bench_function("export_svg", |b| {
        b.iter(|| export(black_box(&drawing)));
    });
}

fn bench_from_netlist(c: &mut Criterion) {
    let text = fixture("divider.cir");
    let options = GenerationOptions::default();

    c.bench_function("from_netlist", |b| {
        b.iter(|| CircuitForgeCore::from_netlist(black_box(&text), black_box(&options)));
    });
}

criterion_group!(
    benches,
    bench_clean_and_parse,
    bench_render,
    bench_export,
    bench_from_netlist
);
criterion_main!(benches);
