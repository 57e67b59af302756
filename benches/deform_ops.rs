//! Benchmarks for mesh construction, selection and deformation.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use deformesh::algo::normals::{compute_normals, NormalWeighting};
use deformesh::prelude::*;
use nalgebra::{Point3, Vector3};

fn grid_data(n: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    (vertices, faces)
}

fn create_grid_mesh(n: usize) -> TriangleMesh {
    let (vertices, faces) = grid_data(n);
    build_from_triangles(&vertices, &faces).unwrap()
}

/// Grid with a centered region, a small handle and its one-ring anchor.
fn selected_grid(n: usize) -> TriangleMesh {
    let mut mesh = create_grid_mesh(n);
    let c = n as f64 / 2.0;
    let center = Point3::new(c, c, 0.0);
    select_sphere(&mut mesh, &center, c * 0.8, SelectionIntent::Interest).unwrap();
    select_sphere(&mut mesh, &center, 1.5, SelectionIntent::Handle).unwrap();
    compute_anchor(&mut mesh, AnchorPolicy::default()).unwrap();
    mesh
}

fn bench_mesh_construction(c: &mut Criterion) {
    let (vertices, faces) = grid_data(50);
    c.bench_function("build_grid_50x50", |b| {
        b.iter(|| {
            let mesh: TriangleMesh = build_from_triangles(&vertices, &faces).unwrap();
            mesh
        });
    });
}

fn bench_normals(c: &mut Criterion) {
    let mut mesh = create_grid_mesh(100);
    c.bench_function("vertex_normals_100x100", |b| {
        b.iter(|| compute_normals(&mut mesh, NormalWeighting::Angle));
    });
}

fn bench_selection(c: &mut Criterion) {
    let mesh = create_grid_mesh(100);
    c.bench_function("select_and_anchor_100x100", |b| {
        b.iter(|| {
            let mut m = mesh.clone();
            let center = Point3::new(50.0, 50.0, 0.0);
            select_sphere(&mut m, &center, 30.0, SelectionIntent::Interest).unwrap();
            select_sphere(&mut m, &center, 2.0, SelectionIntent::Handle).unwrap();
            compute_anchor(&mut m, AnchorPolicy::default()).unwrap()
        });
    });
}

fn bench_deform(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_deformation");
    group.sample_size(20);
    let lift = HandleTransform::translation(Vector3::new(0.0, 0.0, 2.0));

    for n in [20, 40] {
        let mesh = selected_grid(n);
        group.bench_with_input(BenchmarkId::new("parallel", n), &mesh, |b, mesh| {
            b.iter(|| solve_deformation(mesh, &lift, &DeformOptions::default()).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("sequential", n), &mesh, |b, mesh| {
            b.iter(|| solve_deformation(mesh, &lift, &DeformOptions::default().sequential()).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_mesh_construction,
    bench_normals,
    bench_selection,
    bench_deform
);
criterion_main!(benches);
