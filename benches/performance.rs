//! Performance benchmarks for map-edit-lib
//!
//! Run with: cargo bench
//!
//! Deterministic synthetic maps; no RNG so runs are comparable.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use map_edit_lib::geom::{Point, Region};
use map_edit_lib::{
    IdAllocator, Line, LineTree, Marker, PointTree, RoadLayer, Street, StreetKind, simplify,
};

const MAP_SIZE: f64 = 4096.0;

/// Scatter markers over the map on a pseudo-random lattice
fn generate_markers(count: usize) -> Vec<Marker> {
    let mut ids = IdAllocator::new();
    (0..count)
        .map(|i| {
            let x = ((i * 2654435761) % 4093) as f64 + (i % 13) as f64 * 0.07;
            let y = ((i * 40503) % 4091) as f64 + (i % 11) as f64 * 0.05;
            Marker::new(ids.next_id(), format!("m{i}"), Point::new(x, y))
        })
        .collect()
}

/// A wavy polyline like a digitized street, `points` vertices long
fn generate_polyline(seed: usize, points: usize) -> Vec<Point> {
    let x0 = ((seed * 997) % 3000) as f64;
    let y0 = ((seed * 641) % 3000) as f64;
    (0..points)
        .map(|i| {
            let t = i as f64;
            Point::new(
                (x0 + t * 3.0 + (t * 0.7).sin() * 2.0).min(MAP_SIZE),
                (y0 + t * 2.0 + (t * 0.3).cos() * 4.0).min(MAP_SIZE),
            )
        })
        .collect()
}

fn generate_road_layer(streets: usize, points_per_street: usize) -> RoadLayer {
    let mut ids = IdAllocator::new();
    let mut layer = RoadLayer::new();
    for i in 0..streets {
        let kind = match i % 3 {
            0 => StreetKind::Street,
            1 => StreetKind::Avenue,
            _ => StreetKind::Boulevard,
        };
        let start = ids.next_id();
        let end = ids.next_id();
        let street = Street::new(ids.next_id(), kind, start, end)
            .with_points(generate_polyline(i, points_per_street));
        layer.add_street(street);
    }
    layer
}

fn bench_point_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_tree");

    let markers = generate_markers(10_000);
    group.throughput(Throughput::Elements(markers.len() as u64));
    group.bench_function("insert_10k", |b| {
        b.iter(|| {
            let mut tree = PointTree::new(MAP_SIZE, MAP_SIZE);
            tree.add_all(markers.iter().cloned()).unwrap();
            tree
        });
    });

    let mut tree = PointTree::new(MAP_SIZE, MAP_SIZE);
    tree.add_all(markers.iter().cloned()).unwrap();

    let viewport = Region::new(1000.0, 1000.0, 256.0, 256.0);
    group.bench_function("intersect_viewport_10k", |b| {
        let mut out = Vec::new();
        b.iter(|| {
            out.clear();
            tree.intersect(&viewport, &mut out);
            out.len()
        });
    });

    group.bench_function("nearest_10k", |b| {
        b.iter(|| tree.nearest(Point::new(2048.0, 2048.0)));
    });

    group.finish();
}

fn bench_line_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_tree");
    group.sample_size(20);

    let mut tree = LineTree::new(MAP_SIZE, MAP_SIZE, 1);
    for i in 0..500 {
        let points = generate_polyline(i, 50);
        for (j, pair) in points.windows(2).enumerate() {
            tree.add(Line::new(pair[0], pair[1], (i * 64 + j) as u32), 0)
                .unwrap();
        }
    }

    let viewport = Region::new(1500.0, 1500.0, 256.0, 256.0);
    group.bench_function("intersect_viewport_25k_segments", |b| {
        let mut out = Vec::new();
        b.iter(|| {
            out.clear();
            tree.intersect(&viewport, 0, &mut out);
            out.len()
        });
    });

    group.bench_function("nearest_25k_segments", |b| {
        b.iter(|| tree.nearest(Point::new(2048.0, 2048.0), 0));
    });

    group.finish();
}

fn bench_simplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("simplify");

    let polyline = generate_polyline(7, 10_000);
    group.throughput(Throughput::Elements(polyline.len() as u64));
    group.bench_function("10k_points_tol_4", |b| {
        b.iter(|| simplify(&polyline, 4.0).unwrap().len());
    });

    group.finish();
}

fn bench_build_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_index");
    group.sample_size(10);

    let layer = generate_road_layer(200, 100);
    let total_points = 200 * 100;

    group.throughput(Throughput::Elements(total_points as u64));
    group.bench_function("200_streets_5_zooms", |b| {
        b.iter(|| layer.build_line_index(MAP_SIZE, MAP_SIZE, 5).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_point_tree,
    bench_line_tree,
    bench_simplify,
    bench_build_index,
);

criterion_main!(benches);
