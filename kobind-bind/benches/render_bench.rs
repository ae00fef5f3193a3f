use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use kobind_bind::Renderer;
use serde_json::{Value, json};

const TEMPLATE: &str = concat!(
    r#"<ul data-bind="foreach: people"><li>"#,
    r#"<span data-bind="text: name, visible: children.length > 0"></span>"#,
    r#"<ul data-bind="foreach: children"><li data-bind="text: $data + ' of ' + $parent.name"></li></ul>"#,
    "</li></ul>"
);

fn build_people(count: usize) -> Value {
    let people: Vec<Value> = (0..count)
        .map(|i| {
            let children: Vec<Value> = (0..4).map(|c| json!(format!("child {i}.{c}"))).collect();
            json!({"Name": format!("person {i}"), "Children": children})
        })
        .collect();
    json!({ "People": people })
}

fn bench_nested_foreach(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_foreach");
    group.sample_size(20);
    let renderer = Renderer::default();
    for &count in &[10usize, 100usize, 500usize] {
        let data = build_people(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, d| {
            b.iter(|| {
                let _ = renderer.render(TEMPLATE, Some(d)).expect("render");
            });
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().without_plots();
    targets = bench_nested_foreach
}
criterion_main!(benches);
