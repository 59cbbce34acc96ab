use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::DVec2;
use sakura_map::braille::BrailleSurface;
use sakura_map::config::ViewportConfig;
use sakura_map::map::{
    pick_at, Basemap, BasemapFeature, MarkerGroup, ProjectedMarker, Renderer, Scene, ViewTransform,
};

const MARKERS: usize = 4000;

/// Deterministic pseudo-random scatter over a 400x300 projection space.
fn scatter(n: usize) -> Vec<ProjectedMarker> {
    let mut seed: u64 = 0x5eed_cafe;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed % 10_000) as f64 / 10_000.0
    };

    (0..n)
        .map(|i| {
            let group = match i % 7 {
                0 => MarkerGroup::Sakura100,
                1 | 2 => MarkerGroup::WeathernewsTop10,
                _ => MarkerGroup::Other,
            };
            ProjectedMarker {
                id: format!("spot-{i}"),
                x: next() * 400.0,
                y: next() * 300.0,
                r: 2.0 + (i % 3) as f64,
                group,
            }
        })
        .collect()
}

fn grid_basemap() -> Basemap {
    let features = (0..48)
        .map(|i| {
            let (lon, lat) = ((i % 8) as f64 * 50.0, (i / 8) as f64 * 50.0);
            BasemapFeature {
                key: i.to_string(),
                label: Some(format!("P{i}")),
                rings: vec![vec![
                    (lon, lat),
                    (lon + 48.0, lat),
                    (lon + 48.0, lat + 48.0),
                    (lon, lat + 48.0),
                    (lon, lat),
                ]],
            }
        })
        .collect();
    Basemap { features }
}

fn bench_pick_at(c: &mut Criterion) {
    let markers = scatter(MARKERS);
    let transform = ViewTransform::new(-120.0, -80.0, 2.5);

    c.bench_function("pick_at_4000", |b| {
        b.iter(|| pick_at(black_box(&markers), &transform, black_box(DVec2::new(200.0, 150.0)), 4.0))
    });
}

fn bench_render(c: &mut Criterion) {
    let markers = scatter(MARKERS);
    let basemap = grid_basemap();
    let projector = |lon: f64, lat: f64| Some(DVec2::new(lon, lat));

    let mut renderer = Renderer::new(BrailleSurface::new(200, 75), &ViewportConfig::default());
    renderer.set_geometry(&basemap, Some(&projector));

    let mut pan = 0.0;
    c.bench_function("render_dynamic_4000", |b| {
        b.iter(|| {
            pan = (pan + 1.0) % 50.0;
            renderer.render(&Scene {
                transform: ViewTransform::new(-pan, -pan, 1.5),
                size: (400.0, 300.0),
                markers: black_box(&markers),
                hovered: Some("spot-10"),
                selected: Some("spot-20"),
            });
        })
    });
}

criterion_group!(benches, bench_pick_at, bench_render);
criterion_main!(benches);
