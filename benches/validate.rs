//! Benchmarks for schema compilation and document validation
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use xsd_engine::{compile_from_text, Document};

const ORDER_SCHEMA: &str = include_str!("../tests/fixtures/order.xsd");

fn order_document(items: usize) -> String {
    let body: String = (0..items)
        .map(|i| {
            format!(
                "<item><sku>ABC-{:04}</sku><quantity>{}</quantity></item>",
                i % 10_000,
                i + 1
            )
        })
        .collect();
    format!(
        r#"<order xmlns="urn:example:order" id="o1"><customer>Ada</customer>{}</order>"#,
        body
    )
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_order_schema", |b| {
        b.iter(|| compile_from_text(black_box(ORDER_SCHEMA)))
    });
}

fn bench_validate(c: &mut Criterion) {
    let grammar = match compile_from_text(ORDER_SCHEMA) {
        Ok(grammar) => grammar,
        Err(e) => panic!("benchmark schema does not compile: {}", e),
    };

    let mut group = c.benchmark_group("validate_order");
    for items in [10usize, 100, 1_000] {
        let xml = order_document(items);
        let document = match Document::from_string(&xml) {
            Ok(document) => document,
            Err(e) => panic!("benchmark document does not parse: {}", e),
        };
        group.throughput(Throughput::Elements(items as u64));
        group.bench_with_input(BenchmarkId::from_parameter(items), &document, |b, document| {
            b.iter(|| grammar.validate(black_box(document)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_validate);
criterion_main!(benches);
