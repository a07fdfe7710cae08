use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use roigeom::mask::MaskLevel;
use roigeom::{CuboidRoi3D, EllipsoidRoi3D, Point3, Rectangle3D, Roi3D, Roi4D, Roi4DStack};

/// Rasterize a sphere of radius 40 through the generic per-cell tests
fn ellipsoid_mask(c: &mut Criterion) {
    let roi = EllipsoidRoi3D::new(Point3::new(50.0, 50.0, 50.0), [40.0, 40.0, 40.0]);
    c.bench_function("ellipsoid_mask", |b| {
        b.iter(|| black_box(&roi).boolean_mask(true).cardinality())
    });
}

fn mask_set_operations(c: &mut Criterion) {
    let a = EllipsoidRoi3D::new(Point3::new(40.0, 40.0, 40.0), [30.0, 30.0, 30.0]).boolean_mask(true);
    let b = EllipsoidRoi3D::new(Point3::new(60.0, 50.0, 40.0), [30.0, 20.0, 30.0]).boolean_mask(true);

    c.bench_function("mask_union", |bench| bench.iter(|| black_box(&a).union(&b)));
    c.bench_function("mask_contour", |bench| {
        bench.iter(|| black_box(&a).contour_cardinality())
    });
}

fn stack_mask(c: &mut Criterion) {
    let mut stack = Roi4DStack::<CuboidRoi3D>::new();
    for t in 0..20 {
        let size = 20.0 + t as f64;
        stack.set_slice(t, CuboidRoi3D::new(Rectangle3D::new([0.0; 3], [size, size, 10.0])));
    }
    c.bench_function("stack_mask", |b| b.iter(|| black_box(&stack).boolean_mask(true)));
}

criterion_group!(benches, ellipsoid_mask, mask_set_operations, stack_mask);
criterion_main!(benches);
