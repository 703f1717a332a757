use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hotspot::{generate_html5_parts, get_polygons, AnnotateResponse, FilterConfig};

const LABELS: [&str; 5] = ["Car", "Wheel", "Shoe", "Person", "Bag"];

fn detections(count: usize) -> AnnotateResponse {
    let objects: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            let offset = (i % 10) as f64 * 0.05;
            serde_json::json!({
                "name": LABELS[i % LABELS.len()],
                "score": 0.5 + (i % 5) as f64 * 0.1,
                "boundingPoly": {"normalizedVertices": [
                    {"x": offset, "y": offset},
                    {"x": offset + 0.4, "y": offset},
                    {"x": offset + 0.4, "y": offset + 0.4},
                    {"x": offset, "y": offset + 0.4}
                ]}
            })
        })
        .collect();
    let raw = serde_json::json!({"responses": [{"localizedObjectAnnotations": objects}]});
    serde_json::from_value(raw).expect("valid detection response")
}

fn benchmark_polygons(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_polygons");
    let filter = FilterConfig::default();

    for count in [10usize, 100, 1000] {
        let response = detections(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &response, |b, r| {
            b.iter(|| get_polygons(black_box(r.objects()), 1200, 628, 0.6, &filter));
        });
    }

    group.finish();
}

fn benchmark_markup(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_html5_parts");
    let filter = FilterConfig::default();

    for count in [10usize, 100, 1000] {
        let polygons = get_polygons(detections(count).objects(), 1200, 628, 0.0, &filter);
        group.bench_with_input(BenchmarkId::from_parameter(count), &polygons, |b, p| {
            b.iter(|| generate_html5_parts(black_box(p)).joined());
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_polygons, benchmark_markup);
criterion_main!(benches);
