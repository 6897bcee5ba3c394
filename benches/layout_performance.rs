//! Composition benchmarks
//!
//! Measures how long it takes to compose directive streams of growing size
//! into the in-memory document.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use galley::{Directive, DocumentBuilder, parse_directives};
use serde_json::{Value, json};

fn paragraphs(count: usize) -> Vec<Value> {
    (0..count)
        .flat_map(|i| {
            vec![
                json!({ "type": "text", "text": format!("Paragraph {} {}", i, "lorem ipsum ".repeat(30)) }),
                json!({ "type": "paragraph" }),
            ]
        })
        .collect()
}

fn table(rows: usize) -> Value {
    let data: Vec<Vec<String>> = (0..rows)
        .map(|r| vec![format!("Item {}", r), format!("{}", r * 3), "ok".to_string()])
        .collect();
    json!({ "type": "table", "data": data, "headerRows": 1, "colWidthFrac": [0.5, 0.3, 0.2] })
}

fn mixed_document(sections: usize) -> Vec<Directive> {
    let mut content = Vec::new();
    for s in 0..sections {
        content.extend(paragraphs(5));
        content.push(json!({ "type": "image", "attrs": format!("src=fig{}.png w=120pt h=80pt", s) }));
        content.push(json!({ "type": "paragraph" }));
        content.push(json!({
            "type": "image",
            "attrs": format!("src=logo.png posHref=page posVref=page w=40pt h=40pt offX=20 offY=20 wordPageSeq={}", s)
        }));
        content.push(table(20));
        content.push(json!({ "type": "footnote", "id": s, "content": "See appendix." }));
    }
    let source = Value::Array(content).to_string();
    parse_directives(&source).expect("Failed to parse directives")
}

fn benchmark_text_flow(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_flow");
    let builder = DocumentBuilder::new();

    for count in [10, 100, 500] {
        let source = Value::Array(paragraphs(count)).to_string();
        let directives = parse_directives(&source).expect("Failed to parse directives");

        group.bench_with_input(BenchmarkId::new("paragraphs", count), &directives, |b, directives| {
            b.iter(|| builder.build(directives).expect("Failed to compose"));
        });
    }

    group.finish();
}

fn benchmark_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("tables");
    let builder = DocumentBuilder::new();

    for rows in [10, 100, 400] {
        let source = json!([table(rows)]).to_string();
        let directives = parse_directives(&source).expect("Failed to parse directives");

        group.bench_with_input(BenchmarkId::new("rows", rows), &directives, |b, directives| {
            b.iter(|| builder.build(directives).expect("Failed to compose"));
        });
    }

    group.finish();
}

fn benchmark_mixed_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_document");
    let builder = DocumentBuilder::new();

    for sections in [1, 10, 40] {
        let directives = mixed_document(sections);
        group.bench_with_input(BenchmarkId::new("sections", sections), &directives, |b, directives| {
            b.iter(|| builder.build(directives).expect("Failed to compose"));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_text_flow, benchmark_tables, benchmark_mixed_document);
criterion_main!(benches);
