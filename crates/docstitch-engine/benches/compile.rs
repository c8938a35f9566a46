use criterion::{Criterion, criterion_group, criterion_main};
use docstitch_dom::markup::parse;
use docstitch_engine::{ScopeValue, TemplateHandler, TemplateOptions};
use serde_json::json;
use std::hint::black_box;

/// A body with `sections` paragraphs of fragmented tags plus one table loop.
fn generate_template(sections: usize) -> String {
    let mut markup = String::from("<w:body>");
    for i in 0..sections {
        markup.push_str(&format!(
            "<w:p><w:r><w:t>Section {i}: {{ti</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>tle}} by {{author}}</w:t></w:r></w:p>"
        ));
    }
    markup.push_str(
        "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>{#rows}{name}</w:t></w:r></w:p></w:tc>\
         <w:tc><w:p><w:r><w:t>{value}{/rows}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
    );
    markup.push_str("</w:body>");
    markup
}

fn generate_data(rows: usize) -> ScopeValue {
    let rows: Vec<_> = (0..rows)
        .map(|i| json!({ "name": format!("row {i}"), "value": i }))
        .collect();
    ScopeValue::from(json!({ "title": "Quarterly report", "author": "Ada", "rows": rows }))
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    group.sample_size(20);

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let handler = TemplateHandler::new(TemplateOptions::default()).unwrap();
    for (sections, rows) in [(10, 10), (100, 100)] {
        let markup = generate_template(sections);
        let data = generate_data(rows);
        group.bench_function(format!("{sections}_sections_{rows}_rows"), |b| {
            b.iter(|| {
                let mut doc = parse(black_box(&markup)).unwrap();
                rt.block_on(handler.process(&mut doc, data.clone())).unwrap();
                black_box(doc);
            });
        });
    }

    group.finish();
}

fn bench_parse_tags(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_tags");
    group.sample_size(20);

    let handler = TemplateHandler::new(TemplateOptions::default()).unwrap();
    let markup = generate_template(100);
    group.bench_function("100_sections", |b| {
        b.iter(|| {
            let mut doc = parse(black_box(&markup)).unwrap();
            let tags = handler.parse_tags(&mut doc).unwrap();
            black_box(tags);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_compile, bench_parse_tags);
criterion_main!(benches);
