use criterion::{black_box, criterion_group, criterion_main, Criterion};
use proguard_retrace::{MappingModel, Template, STACK_TRACE_TEMPLATE};

static MAPPING: &[u8] = include_bytes!("../tests/res/mapping.txt");

fn mapping_model(mapping: &[u8]) -> MappingModel {
    MappingModel::from_reader(mapping).unwrap()
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("mapping model", |b| {
        b.iter(|| mapping_model(black_box(MAPPING)))
    });
    c.bench_function("stack trace template", |b| {
        b.iter(|| Template::compile(black_box(STACK_TRACE_TEMPLATE)).unwrap())
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(25);
    targets = criterion_benchmark
}
criterion_main!(benches);
