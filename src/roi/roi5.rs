//! ROIs whose shape is defined over all five axes. T and C are native dimensions of the
//! shape, so there is no attachment and the ROI is active everywhere.
//!
//! The generic masks built here are the slowest path in the crate: a full mask visits every
//! integer cell of the 5D bounds. Axes with an infinite extent are not rasterized.

use crate::common::{AXIS_C, AXIS_T, AXIS_Z, AxisIndex, Rectangle2I, Rectangle5D, Rectangle5I};
use crate::mask::{
    BooleanMask2D, BooleanMask3D, BooleanMask4D, BooleanMask5D, MaskLevel, union_all,
};
use crate::roi::persist::Node;
use crate::roi::{Roi, UpdateGuard};
use crate::{Point5, Point5I};
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// The index sampled for an `Any` query along an infinite axis.
const UNIFORM_INDEX: i32 = 0;

/// The integer indices a query at `index` covers along `axis` of `bounds`. A ROI spanning an
/// infinite axis is the same at every index along it, so `Any` samples a single index there.
fn axis_indices(bounds: &Rectangle5I, axis: usize, index: AxisIndex) -> Vec<i32> {
    match index {
        AxisIndex::At(i) => vec![i],
        AxisIndex::Any if bounds.is_infinite(axis) => vec![UNIFORM_INDEX],
        AxisIndex::Any => bounds.axis_range(axis).collect(),
    }
}

pub trait Roi5D: Roi {
    fn contains5(&self, p: &Point5) -> bool;

    /// Returns true only if the ROI covers the whole box, see `Roi3D::contains_rect3`.
    fn contains_rect5(&self, r: &Rectangle5D) -> bool;

    fn intersects_rect5(&self, r: &Rectangle5D) -> bool;

    fn compute_bounds5(&self) -> Rectangle5D;

    fn save_shape(&self, node: &mut Node) -> bool;

    fn load_shape(&mut self, node: &Node) -> bool;

    fn is_active_for(&self, _t: AxisIndex, _c: AxisIndex) -> bool {
        true
    }

    fn bounds(&self) -> Rectangle5I {
        self.bounds5().to_integer()
    }

    fn position(&self) -> Point5I {
        Point5I::from(self.bounds().pos)
    }

    /// Rasterize a region of the plane at (z, t, c), testing each pixel as a unit hypercube.
    #[allow(clippy::too_many_arguments)]
    fn boolean_mask_2d_region(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        z: i32,
        t: i32,
        c: i32,
        inclusive: bool,
    ) -> Vec<bool> {
        if width <= 0 || height <= 0 {
            return Vec::new();
        }

        let mut result = vec![false; width as usize * height as usize];
        result
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(j, row)| {
                let py = (y + j as i32) as f64;
                for (i, cell) in row.iter_mut().enumerate() {
                    let cell_box = Rectangle5D::new(
                        [(x + i as i32) as f64, py, z as f64, t as f64, c as f64],
                        [1.0; 5],
                    );
                    *cell = if inclusive {
                        self.intersects_rect5(&cell_box)
                    } else {
                        self.contains_rect5(&cell_box)
                    };
                }
            });
        result
    }

    /// The plane at (z, t, c) over the XY bounds, tightened to its content.
    fn boolean_mask_2d_at(&self, z: i32, t: i32, c: i32, inclusive: bool) -> Option<BooleanMask2D> {
        let bounds: Rectangle2I = self.bounds().to_dim::<2>();
        if bounds.is_empty() || bounds.is_infinite(0) || bounds.is_infinite(1) {
            return None;
        }

        let buffer = self.boolean_mask_2d_region(
            bounds.x(),
            bounds.y(),
            bounds.width(),
            bounds.height(),
            z,
            t,
            c,
            inclusive,
        );
        let mut mask = BooleanMask2D::from_parts(bounds, buffer);
        mask.optimize_bounds();
        if mask.is_empty() { None } else { Some(mask) }
    }

    /// The plane at z for a (t, c) query. An `Any` index merges the planes of every index
    /// along that axis. On an infinite axis every plane is the same, and `Any` returns that
    /// plane.
    fn boolean_mask_2d(
        &self,
        z: i32,
        t: AxisIndex,
        c: AxisIndex,
        inclusive: bool,
    ) -> Option<BooleanMask2D> {
        let bounds = self.bounds();
        let ts = axis_indices(&bounds, AXIS_T, t);
        let cs = axis_indices(&bounds, AXIS_C, c);

        union_all(
            ts.into_iter()
                .cartesian_product(cs)
                .filter_map(|(t, c)| self.boolean_mask_2d_at(z, t, c, inclusive)),
        )
    }

    fn boolean_mask_3d(&self, t: i32, c: i32, inclusive: bool) -> BooleanMask3D {
        let bounds = self.bounds();
        if bounds.is_empty() || bounds.is_infinite(AXIS_Z) {
            return BooleanMask3D::empty();
        }

        let slices: BTreeMap<i32, BooleanMask2D> = bounds
            .axis_range(AXIS_Z)
            .filter_map(|z| self.boolean_mask_2d_at(z, t, c, inclusive).map(|m| (z, m)))
            .collect();
        BooleanMask3D::from_slices(slices)
    }

    fn boolean_mask_4d(&self, c: i32, inclusive: bool) -> BooleanMask4D {
        let bounds = self.bounds();
        if bounds.is_empty() || bounds.is_infinite(AXIS_T) {
            return BooleanMask4D::empty();
        }

        let slices: BTreeMap<i32, BooleanMask3D> = bounds
            .axis_range(AXIS_T)
            .into_par_iter()
            .map(|t| (t, self.boolean_mask_3d(t, c, inclusive)))
            .filter(|(_, m)| !m.is_empty())
            .collect();
        BooleanMask4D::from_slices(slices)
    }

    fn boolean_mask(&self, inclusive: bool) -> BooleanMask5D {
        let bounds = self.bounds();
        if bounds.is_empty() || bounds.is_infinite(AXIS_C) {
            return BooleanMask5D::empty();
        }

        tracing::debug!(
            "Rasterizing 5D ROI {} over {} cells (inclusive: {inclusive})",
            self.id(),
            bounds.cell_count()
        );

        let slices: BTreeMap<i32, BooleanMask4D> = bounds
            .axis_range(AXIS_C)
            .map(|c| (c, self.boolean_mask_4d(c, inclusive)))
            .filter(|(_, m)| !m.is_empty())
            .collect();
        BooleanMask5D::from_slices(slices)
    }

    fn compute_number_of_points(&self) -> f64 {
        self.boolean_mask(true).cardinality() as f64
    }

    fn compute_number_of_contour_points(&self) -> f64 {
        self.boolean_mask(true).contour_cardinality() as f64
    }

    /// Not supported unless the shape overrides it.
    fn can_set_bounds(&self) -> bool {
        false
    }

    fn set_bounds5(&mut self, _bounds: Rectangle5D) {}
}

/// Save the style and then the shape fields of a 5D ROI.
pub fn save_to_node<R: Roi5D + ?Sized>(roi: &R, node: &mut Node) -> bool {
    roi.core().save(node);
    roi.save_shape(node)
}

pub fn load_from_node<R: Roi5D + ?Sized>(roi: &mut R, node: &Node) -> bool {
    let mut roi = UpdateGuard::new(roi);

    if let Err(e) = roi.core_mut().load(node) {
        tracing::warn!("Failed to load 5D ROI: {e}");
        return false;
    }
    if !roi.load_shape(node) {
        tracing::warn!("Failed to load the shape of 5D ROI {}", roi.id());
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::CuboidRoi5D;
    use approx::assert_relative_eq;

    fn hyperbox() -> CuboidRoi5D {
        CuboidRoi5D::new(Rectangle5D::new([0.0, 0.0, 0.0, 1.0, 0.0], [2.0, 2.0, 2.0, 2.0, 2.0]))
    }

    #[test]
    fn always_active() {
        let roi = hyperbox();
        assert!(roi.is_active_for(AxisIndex::At(100), AxisIndex::At(100)));
        assert!(roi.is_active_for(AxisIndex::Any, AxisIndex::Any));
    }

    #[test]
    fn integer_bounds_and_position() {
        let roi = CuboidRoi5D::new(Rectangle5D::new([0.5, 0.0, 0.0, 1.0, 0.0], [1.0, 1.0, 1.0, 1.0, 1.0]));
        assert_eq!(roi.bounds(), Rectangle5I::new([0, 0, 0, 1, 0], [2, 1, 1, 1, 1]));
        assert_eq!(roi.position(), Point5I::new(0, 0, 0, 1, 0));
    }

    #[test]
    fn nested_masks() {
        let roi = hyperbox();
        let plane = roi.boolean_mask_2d_at(0, 1, 0, true).unwrap();
        assert_eq!(plane.cardinality(), 4);
        assert!(roi.boolean_mask_2d_at(0, 0, 0, true).is_none());

        assert_eq!(roi.boolean_mask_3d(2, 1, true).cardinality(), 8);
        assert_eq!(roi.boolean_mask_4d(1, true).cardinality(), 16);

        let full = roi.boolean_mask(true);
        assert_eq!(full.cardinality(), 32);
        assert_eq!(full.bounds(), Rectangle5I::new([0, 0, 0, 1, 0], [2, 2, 2, 2, 2]));
        assert!(full.contains_coords(&[1, 1, 1, 2, 1]));
        assert!(!full.contains_coords(&[1, 1, 1, 3, 1]));
    }

    #[test]
    fn any_index_merges_planes() {
        let roi = hyperbox();
        let merged = roi
            .boolean_mask_2d(1, AxisIndex::Any, AxisIndex::Any, true)
            .unwrap();
        assert_eq!(merged.cardinality(), 4);
        assert!(roi.boolean_mask_2d(1, AxisIndex::At(5), AxisIndex::Any, true).is_none());
    }

    #[test]
    fn generic_counts() {
        let roi = hyperbox();
        assert_relative_eq!(roi.compute_number_of_points(), 32.0);
        // Every cell of a 2x2x2x2x2 block lies on its boundary
        assert_relative_eq!(roi.compute_number_of_contour_points(), 32.0);
    }

    #[test]
    fn round_trip() {
        let mut roi = hyperbox();
        roi.set_name("hyper");
        let mut node = Node::new();
        assert!(save_to_node(&roi, &mut node));

        let mut loaded = CuboidRoi5D::default();
        assert!(load_from_node(&mut loaded, &node));
        assert_eq!(loaded.bounds5(), roi.bounds5());
        assert_eq!(loaded.core().name(), "hyper");
    }
}
