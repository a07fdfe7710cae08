//! Containment and intersection between two ROIs of any dimension.
//!
//! Analytic tests provided by the ROIs themselves (`Roi::exact_contains` and
//! `Roi::exact_intersects`) are tried first. Everything else goes through a total table over
//! the pair of native dimensions: ROIs of the same dimension compare their full masks, and
//! mixed pairs compare 2D masks plane by plane over the integer region in question. No entry
//! of the table calls back into the other ROI's dispatch, so every query terminates.

use crate::common::{AXIS_C, AXIS_T, AXIS_Z, AxisIndex, Rectangle5I};
use crate::mask::MaskLevel;
use crate::roi::{Roi, RoiShape};
use itertools::iproduct;

/// Returns true if `a` contains all of `b`, compared with exclusive masks unless an exact
/// test is available.
pub fn contains(a: &dyn Roi, b: &dyn Roi) -> bool {
    if let Some(result) = a.exact_contains(b) {
        return result;
    }

    match (a.shape(), b.shape()) {
        (RoiShape::Dim3(x), RoiShape::Dim3(y)) => {
            x.is_active_for(y.t(), y.c()) && x.boolean_mask(false).contains_mask(&y.boolean_mask(false))
        }
        (RoiShape::Dim4(x), RoiShape::Dim4(y)) => {
            x.c().accepts(y.c()) && x.boolean_mask(false).contains_mask(&y.boolean_mask(false))
        }
        (RoiShape::Dim5(x), RoiShape::Dim5(y)) => {
            x.boolean_mask(false).contains_mask(&y.boolean_mask(false))
        }
        (x, y) => sliced_contains(a, x, b, y),
    }
}

/// Returns true if `a` and `b` share at least one cell, compared with inclusive masks unless
/// either side has an exact test.
pub fn intersects(a: &dyn Roi, b: &dyn Roi) -> bool {
    if let Some(result) = a.exact_intersects(b).or_else(|| b.exact_intersects(a)) {
        return result;
    }

    match (a.shape(), b.shape()) {
        (RoiShape::Dim3(x), RoiShape::Dim3(y)) => {
            x.is_active_for(y.t(), y.c()) && x.boolean_mask(true).intersects_mask(&y.boolean_mask(true))
        }
        (RoiShape::Dim4(x), RoiShape::Dim4(y)) => {
            x.c().accepts(y.c()) && x.boolean_mask(true).intersects_mask(&y.boolean_mask(true))
        }
        (RoiShape::Dim5(x), RoiShape::Dim5(y)) => {
            x.boolean_mask(true).intersects_mask(&y.boolean_mask(true))
        }
        (x, y) => sliced_intersects(a, x, b, y),
    }
}

/// The queries to issue along a discrete axis of a region: every index when the region is
/// finite there, or a single `Any` when it is not.
fn axis_queries(region: &Rectangle5I, axis: usize) -> Vec<AxisIndex> {
    if region.is_infinite(axis) {
        vec![AxisIndex::Any]
    } else {
        region.axis_range(axis).map(AxisIndex::At).collect()
    }
}

fn sliced_contains(a: &dyn Roi, sa: RoiShape<'_>, b: &dyn Roi, sb: RoiShape<'_>) -> bool {
    let ab = a.bounds5().to_integer();
    let bb = b.bounds5().to_integer();
    if bb.is_empty() {
        return true;
    }
    if bb.is_infinite(AXIS_Z) {
        return false;
    }

    // `b` spans every index of an axis on which `a` is limited
    if [AXIS_T, AXIS_C]
        .iter()
        .any(|axis| bb.is_infinite(*axis) && !ab.is_infinite(*axis))
    {
        return false;
    }

    let ts = axis_queries(&bb, AXIS_T);
    let cs = axis_queries(&bb, AXIS_C);
    iproduct!(bb.axis_range(AXIS_Z), ts, cs).all(|(z, t, c)| {
        match sb.boolean_mask_2d(z, t, c, false) {
            None => true,
            Some(mb) => sa
                .boolean_mask_2d(z, t, c, false)
                .is_some_and(|ma| ma.contains_mask(&mb)),
        }
    })
}

fn sliced_intersects(a: &dyn Roi, sa: RoiShape<'_>, b: &dyn Roi, sb: RoiShape<'_>) -> bool {
    let region = a
        .bounds5()
        .to_integer()
        .intersection(&b.bounds5().to_integer());
    if region.is_empty() || region.is_infinite(AXIS_Z) {
        return false;
    }

    let ts = axis_queries(&region, AXIS_T);
    let cs = axis_queries(&region, AXIS_C);
    iproduct!(region.axis_range(AXIS_Z), ts, cs).any(|(z, t, c)| {
        match (
            sa.boolean_mask_2d(z, t, c, true),
            sb.boolean_mask_2d(z, t, c, true),
        ) {
            (Some(ma), Some(mb)) => ma.intersects_mask(&mb),
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Rectangle3D, Rectangle5D};
    use crate::roi::{Roi3D, Roi4DStack};
    use crate::shapes::{CuboidRoi3D, CuboidRoi5D, EllipsoidRoi3D};
    use crate::Point3;

    fn cuboid(pos: [f64; 3], size: [f64; 3]) -> CuboidRoi3D {
        CuboidRoi3D::new(Rectangle3D::new(pos, size))
    }

    #[test]
    fn mask_path_between_3d_shapes() {
        let outer = cuboid([0.0, 0.0, 0.0], [10.0, 10.0, 10.0]);
        let ball = EllipsoidRoi3D::new(Point3::new(5.0, 5.0, 5.0), [2.0, 2.0, 2.0]);
        let far = EllipsoidRoi3D::new(Point3::new(30.0, 5.0, 5.0), [2.0, 2.0, 2.0]);

        assert!(contains(&outer, &ball));
        assert!(!contains(&ball, &outer));
        assert!(intersects(&outer, &ball));
        assert!(intersects(&ball, &outer));
        assert!(!intersects(&ball, &far));
    }

    #[test]
    fn inactive_3d_pair_does_not_match() {
        let mut a = EllipsoidRoi3D::new(Point3::new(5.0, 5.0, 5.0), [3.0, 3.0, 3.0]);
        let mut b = EllipsoidRoi3D::new(Point3::new(5.0, 5.0, 5.0), [2.0, 2.0, 2.0]);
        a.set_t(AxisIndex::At(1));
        b.set_t(AxisIndex::At(2));
        assert!(!contains(&a, &b));
        assert!(!intersects(&a, &b));

        b.set_t(AxisIndex::At(1));
        assert!(contains(&a, &b));
    }

    #[test]
    fn exact_hook_wins_over_masks() {
        let a = cuboid([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let touching = cuboid([2.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let inner = cuboid([0.25, 0.25, 0.25], [1.0, 1.0, 1.0]);
        assert!(!intersects(&a, &touching));
        assert!(contains(&a, &inner));
        assert!(a.contains_roi(&inner));
        assert!(!inner.contains_roi(&a));
    }

    #[test]
    fn mixed_3d_and_5d() {
        let mut slab = cuboid([0.0, 0.0, 0.0], [4.0, 4.0, 4.0]);
        slab.set_t(AxisIndex::At(1));
        slab.set_c(AxisIndex::At(0));
        let hyper = CuboidRoi5D::new(Rectangle5D::new(
            [0.0, 0.0, 0.0, 1.0, 0.0],
            [2.0, 2.0, 2.0, 1.0, 1.0],
        ));

        assert!(contains(&slab, &hyper));
        assert!(!contains(&hyper, &slab));
        assert!(intersects(&slab, &hyper));
        assert!(intersects(&hyper, &slab));

        slab.set_t(AxisIndex::At(5));
        assert!(!intersects(&slab, &hyper));
        assert!(!contains(&slab, &hyper));
    }

    #[test]
    fn unattached_3d_is_not_inside_a_bounded_5d() {
        let slab = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let hyper = CuboidRoi5D::new(Rectangle5D::new(
            [0.0, 0.0, 0.0, 0.0, 0.0],
            [4.0, 4.0, 4.0, 4.0, 4.0],
        ));
        assert!(!contains(&hyper, &slab));
        assert!(intersects(&hyper, &slab));
    }

    fn unbounded(axis: usize, limited: [f64; 2]) -> CuboidRoi5D {
        let mut pos = [0.0, 0.0, 0.0, limited[0], limited[0]];
        let mut size = [4.0, 4.0, 4.0, limited[1], limited[1]];
        pos[axis] = f64::NEG_INFINITY;
        size[axis] = f64::INFINITY;
        CuboidRoi5D::new(Rectangle5D::new(pos, size))
    }

    #[test]
    fn infinite_c_against_unattached_c() {
        // T in [0, 3), every C
        let hyper = unbounded(AXIS_C, [0.0, 3.0]);
        let mut slab = cuboid([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
        slab.set_t(AxisIndex::At(1));

        assert!(intersects(&hyper, &slab));
        assert!(intersects(&slab, &hyper));
        assert!(contains(&hyper, &slab));
        assert!(!contains(&slab, &hyper));

        let ball = EllipsoidRoi3D::new(Point3::new(2.0, 2.0, 2.0), [1.0, 1.0, 1.0]);
        assert!(intersects(&hyper, &ball));
        assert!(intersects(&ball, &hyper));

        slab.set_t(AxisIndex::At(3));
        assert!(!intersects(&hyper, &slab));
        assert!(!contains(&hyper, &slab));
    }

    #[test]
    fn infinite_t_against_unattached_t() {
        // C in [2, 3), every T
        let hyper = unbounded(AXIS_T, [2.0, 1.0]);
        let mut slab = cuboid([1.0, 1.0, 1.0], [2.0, 2.0, 2.0]);
        slab.set_c(AxisIndex::At(2));

        assert!(intersects(&hyper, &slab));
        assert!(intersects(&slab, &hyper));
        assert!(contains(&hyper, &slab));
        assert!(!contains(&slab, &hyper));

        slab.set_c(AxisIndex::At(5));
        assert!(!intersects(&hyper, &slab));
        assert!(!contains(&hyper, &slab));
    }

    #[test]
    fn unattached_3d_against_fully_infinite_5d() {
        let hyper = CuboidRoi5D::new(Rectangle5D::new(
            [0.0, 0.0, 0.0, f64::NEG_INFINITY, f64::NEG_INFINITY],
            [4.0, 4.0, 4.0, f64::INFINITY, f64::INFINITY],
        ));
        let slab = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let wide = cuboid([0.0, 0.0, 0.0], [8.0, 8.0, 8.0]);

        assert!(contains(&hyper, &slab));
        assert!(contains(&wide, &hyper));
        assert!(!contains(&hyper, &wide));
        assert!(intersects(&hyper, &slab));
    }

    #[test]
    fn mixed_4d_and_3d() {
        let mut stack = Roi4DStack::<CuboidRoi3D>::new();
        stack.set_slice(2, cuboid([0.0, 0.0, 0.0], [3.0, 3.0, 1.0]));
        stack.set_slice(3, cuboid([0.0, 0.0, 0.0], [3.0, 3.0, 1.0]));

        let mut small = cuboid([1.0, 1.0, 0.0], [1.0, 1.0, 1.0]);
        small.set_t(AxisIndex::At(3));
        assert!(contains(&stack, &small));
        assert!(intersects(&small, &stack));

        small.set_t(AxisIndex::At(4));
        assert!(!contains(&stack, &small));
        assert!(!intersects(&stack, &small));
    }

    #[test]
    fn same_dimension_stacks() {
        let mut a = Roi4DStack::<CuboidRoi3D>::new();
        a.set_slice(0, cuboid([0.0, 0.0, 0.0], [4.0, 4.0, 1.0]));
        a.set_slice(1, cuboid([0.0, 0.0, 0.0], [4.0, 4.0, 1.0]));
        let mut b = Roi4DStack::<CuboidRoi3D>::new();
        b.set_slice(1, cuboid([1.0, 1.0, 0.0], [1.0, 1.0, 1.0]));

        assert!(contains(&a, &b));
        assert!(!contains(&b, &a));
        assert!(intersects(&a, &b));
    }
}
