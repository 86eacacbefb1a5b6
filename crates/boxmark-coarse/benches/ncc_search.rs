use boxmark_coarse::{CorrelationParams, NccTemplate};
use boxmark_core::Rect;
use boxmark_sim::{render_mark, MarkParams, MarkRenderer, Scene};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Vector2;

fn bench_ncc(c: &mut Criterion) {
    let reference = render_mark(640, 0.0, 0.0, 0.0, 0.0);
    let patch = reference
        .view()
        .crop(Rect::centered(320, 320, 240, 240))
        .expect("template patch");
    let target = MarkRenderer::new(MarkParams {
        salt_pepper: 0.002,
        ..MarkParams::default()
    })
    .render(&Scene {
        shift: Vector2::new(0.5, 0.5),
        noise: 0.1,
        ..Scene::default()
    })
    .image;

    let mut group = c.benchmark_group("ncc_search");
    for levels in [1u32, 2, 3] {
        let tpl = NccTemplate::new(&patch.view(), levels).expect("template");
        let params = CorrelationParams {
            pyramid_levels: levels,
            ..CorrelationParams::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, _| {
            b.iter(|| tpl.find(black_box(&target.view()), &params))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ncc);
criterion_main!(benches);
