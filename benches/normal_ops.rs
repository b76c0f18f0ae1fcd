//! Benchmarks for normal adjustment.

use criterion::{criterion_group, criterion_main, Criterion};
use trim_normals::algo::{AdjacencyIndex, AdjustState};
use trim_normals::prelude::*;
use nalgebra::Point3;

/// An `n` x `n` quad grid folded like a corrugated sheet: every column line
/// is a ridge or valley, and every other one is selected as a seam.
fn create_folded_grid(n: usize) -> PolyMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut polygons = Vec::with_capacity(n * n);

    for j in 0..=n {
        for i in 0..=n {
            let z = if i % 2 == 0 { 0.0 } else { 0.75 };
            vertices.push(Point3::new(i as f64, j as f64, z));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;
            polygons.push([v00, v10, v11, v01]);
        }
    }

    let mut mesh: PolyMesh = build_from_polygons(&vertices, &polygons).unwrap();
    for j in 0..n {
        for i in (2..n).step_by(2) {
            let a = VertexId::new(j * (n + 1) + i);
            let b = VertexId::new((j + 1) * (n + 1) + i);
            let e = mesh.find_edge(a, b).unwrap();
            mesh.set_selected(e, true);
        }
    }
    mesh
}

fn bench_adjacency(c: &mut Criterion) {
    let mesh = create_folded_grid(64);

    c.bench_function("adjacency_64x64", |b| {
        b.iter(|| {
            let adjacency: AdjacencyIndex = AdjacencyIndex::build(&mesh).unwrap();
            adjacency
        });
    });

    c.bench_function("adjust_state_64x64", |b| {
        b.iter(|| {
            let state: AdjustState = AdjustState::new(&mesh, mesh.selected_edges()).unwrap();
            state
        });
    });
}

fn bench_adjust(c: &mut Criterion) {
    let mesh = create_folded_grid(64);

    c.bench_function("adjust_normals_64x64_parallel", |b| {
        let options = AdjustOptions::default();
        b.iter(|| adjust_normals(&mesh, &options).unwrap());
    });

    c.bench_function("adjust_normals_64x64_sequential", |b| {
        let options = AdjustOptions::default().sequential();
        b.iter(|| adjust_normals(&mesh, &options).unwrap());
    });

    c.bench_function("adjust_normals_64x64_no_smoothing", |b| {
        let options = AdjustOptions::default().with_smoothing(false);
        b.iter(|| adjust_normals(&mesh, &options).unwrap());
    });
}

criterion_group!(benches, bench_adjacency, bench_adjust);
criterion_main!(benches);
