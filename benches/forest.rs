use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use family_forest::config::{LayoutConfig, RankEngine};
use family_forest::layout::{build_flat_graph, build_forest, compute_family_layout, compute_generations};
use family_forest::parser::parse_people;
use std::hint::black_box;

/// Couples with `fanout` children each, `generations` deep. Every child of
/// generation >= 1 marries into a second line so cross-tree duplicates occur.
fn family_source(generations: usize, fanout: usize) -> String {
    let mut records: Vec<String> = Vec::new();
    let mut couples: Vec<(String, String)> = Vec::new();
    records.push(r#"{"id": "f0", "name": "Root", "birthDate": "1800", "spouseId": "m0"}"#.into());
    records.push(r#"{"id": "m0", "name": "Root Spouse", "birthDate": "1802"}"#.into());
    couples.push(("f0".into(), "m0".into()));

    let mut next = 1usize;
    for level in 1..=generations {
        let year = 1800 + level * 25;
        let mut next_couples = Vec::new();
        for (father, mother) in &couples {
            for _ in 0..fanout {
                let child = format!("p{next}");
                let partner = format!("s{next}");
                next += 1;
                records.push(format!(
                    r#"{{"id": "{child}", "birthDate": "{year}", "fatherId": "{father}", "motherId": "{mother}", "spouseId": "{partner}"}}"#
                ));
                records.push(format!(r#"{{"id": "{partner}", "birthDate": "{}"}}"#, year + 1));
                next_couples.push((child, partner));
            }
        }
        couples = next_couples;
    }
    format!("[{}]", records.join(",\n"))
}

fn fixture(name: &str) -> &'static str {
    match name {
        "cross_tree" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/cross_tree.json"
        )),
        "larger_family" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/larger_family.json"
        )),
        _ => panic!("unknown fixture: {name}"),
    }
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (generations, fanout) in [(3usize, 2usize), (4, 3)] {
        let name = format!("family_{generations}x{fanout}");
        let input = family_source(generations, fanout);
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, data| {
            b.iter(|| {
                let people = parse_people(black_box(data)).expect("parse failed");
                black_box(people.len());
            });
        });
    }
    group.finish();
}

fn bench_generations(c: &mut Criterion) {
    let mut group = c.benchmark_group("generations");
    for (generations, fanout) in [(4usize, 3usize), (5, 3)] {
        let name = format!("family_{generations}x{fanout}");
        let people = parse_people(&family_source(generations, fanout)).expect("parse failed");
        group.bench_with_input(BenchmarkId::from_parameter(name), &people, |b, people| {
            b.iter(|| black_box(compute_generations(black_box(people)).len()));
        });
    }
    group.finish();
}

fn bench_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest");
    let config = LayoutConfig::default();
    for name in ["cross_tree", "larger_family"] {
        let people = parse_people(fixture(name)).expect("parse failed");
        group.bench_with_input(BenchmarkId::from_parameter(name), &people, |b, people| {
            b.iter(|| {
                let graph = build_forest(black_box(people), &config);
                black_box(graph.nodes.len());
            });
        });
    }
    for (generations, fanout) in [(3usize, 3usize), (4, 3)] {
        let name = format!("family_{generations}x{fanout}");
        let people = parse_people(&family_source(generations, fanout)).expect("parse failed");
        group.bench_with_input(BenchmarkId::from_parameter(name), &people, |b, people| {
            b.iter(|| {
                let graph = build_forest(black_box(people), &config);
                black_box(graph.edges.len());
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let dagre = LayoutConfig::default();
    let mut placed = LayoutConfig::default();
    placed.rank.engine = RankEngine::Placed;
    let people = parse_people(&family_source(3, 3)).expect("parse failed");
    group.bench_function("normalized_dagre", |b| {
        b.iter(|| black_box(compute_family_layout(black_box(&people), &dagre).width));
    });
    group.bench_function("normalized_placed", |b| {
        b.iter(|| black_box(compute_family_layout(black_box(&people), &placed).width));
    });
    group.bench_function("flat_dagre", |b| {
        b.iter(|| black_box(build_flat_graph(black_box(&people), &dagre).width));
    });
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_parse, bench_generations, bench_forest, bench_end_to_end
);
criterion_main!(benches);
