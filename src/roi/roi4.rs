//! ROIs whose native geometry is 4D (X, Y, Z, T), optionally attached to a single C index.

use crate::common::{AXIS_C, AXIS_T, AXIS_Z, AxisIndex, Rectangle4D, Rectangle5D, Rectangle5I};
use crate::mask::{BooleanMask2D, BooleanMask3D, BooleanMask4D, MaskLevel, union_all};
use crate::roi::persist::{self, Node};
use crate::roi::roi3::ID_C;
use crate::roi::Roi;
use crate::{Point4, Point5, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;

pub trait Roi4D: Roi {
    fn c(&self) -> AxisIndex;

    fn set_c(&mut self, value: AxisIndex);

    fn contains4(&self, p: &Point4) -> bool;

    fn contains_rect4(&self, r: &Rectangle4D) -> bool;

    fn intersects_rect4(&self, r: &Rectangle4D) -> bool;

    fn compute_bounds4(&self) -> Rectangle4D;

    /// The mask of plane `z` at time `t`, `None` when the ROI has no content there.
    fn boolean_mask_2d_4d(&self, z: i32, t: i32, inclusive: bool) -> Option<BooleanMask2D>;

    fn is_active_for(&self, _t: AxisIndex, c: AxisIndex) -> bool {
        self.c().accepts(c)
    }

    fn contains5(&self, p: &Point5) -> bool {
        self.c().slot_contains(p[AXIS_C]) && self.contains4(&Point4::new(p[0], p[1], p[2], p[3]))
    }

    fn contains_rect5(&self, r: &Rectangle5D) -> bool {
        self.c().slot_contains_range(r.min(AXIS_C), r.max(AXIS_C))
            && self.contains_rect4(&r.to_dim::<4>())
    }

    fn intersects_rect5(&self, r: &Rectangle5D) -> bool {
        if r.is_empty() {
            return false;
        }

        self.c().slot_overlaps(r.min(AXIS_C), r.max(AXIS_C))
            && self.intersects_rect4(&r.to_dim::<4>())
    }

    fn compute_bounds5(&self) -> Rectangle5D {
        let mut result = self.compute_bounds4().to_dim::<5>();
        let (c, size_c) = self.c().extent();
        result.pos[AXIS_C] = c;
        result.size[AXIS_C] = size_c;
        result
    }

    fn bounds4(&self) -> Rectangle4D {
        self.bounds5().to_dim::<4>()
    }

    fn bounds(&self) -> Rectangle5I {
        self.bounds5().to_integer()
    }

    /// The mask of plane `z` as seen from (t, c). When `t` is `Any` the planes of every T are
    /// merged.
    fn boolean_mask_2d(
        &self,
        z: i32,
        t: AxisIndex,
        c: AxisIndex,
        inclusive: bool,
    ) -> Option<BooleanMask2D> {
        if !self.c().accepts(c) {
            return None;
        }

        match t {
            AxisIndex::At(t) => self.boolean_mask_2d_4d(z, t, inclusive),
            AxisIndex::Any => union_all(
                self.bounds4()
                    .to_integer()
                    .axis_range(AXIS_T)
                    .filter_map(|t| self.boolean_mask_2d_4d(z, t, inclusive)),
            ),
        }
    }

    /// The 3D mask at time `t`.
    fn boolean_mask_3d(&self, t: i32, inclusive: bool) -> BooleanMask3D {
        let bounds = self.bounds4().to_integer();
        if bounds.is_empty() {
            return BooleanMask3D::empty();
        }

        let slices: BTreeMap<i32, BooleanMask2D> = bounds
            .axis_range(AXIS_Z)
            .filter_map(|z| self.boolean_mask_2d_4d(z, t, inclusive).map(|m| (z, m)))
            .collect();
        BooleanMask3D::from_slices(slices)
    }

    /// One 3D mask per integer T across the bounds.
    fn boolean_mask(&self, inclusive: bool) -> BooleanMask4D {
        let bounds = self.bounds4().to_integer();
        if bounds.is_empty() {
            return BooleanMask4D::empty();
        }

        tracing::debug!(
            "Rasterizing 4D ROI {} over {} time points (inclusive: {inclusive})",
            self.id(),
            bounds.size[AXIS_T]
        );

        let slices: BTreeMap<i32, BooleanMask3D> = bounds
            .axis_range(AXIS_T)
            .into_par_iter()
            .map(|t| (t, self.boolean_mask_3d(t, inclusive)))
            .filter(|(_, m)| !m.is_empty())
            .collect();
        BooleanMask4D::from_slices(slices)
    }

    fn compute_number_of_points(&self) -> f64 {
        self.boolean_mask(true).cardinality() as f64
    }

    fn compute_number_of_contour_points(&self) -> f64 {
        self.boolean_mask(true).contour_cardinality() as f64
    }
}

/// Save the style and the C attachment of a 4D ROI.
pub fn save_to_node<R: Roi4D + ?Sized>(roi: &R, node: &mut Node) {
    roi.core().save(node);
    persist::set_int(node, ID_C, roi.c().to_raw() as i64);
}

/// Load what `save_to_node` wrote. The caller holds the update bracket.
pub fn load_from_node<R: Roi4D + ?Sized>(roi: &mut R, node: &Node) -> Result<()> {
    roi.core_mut().load(node)?;
    let c = persist::get_i32(node, ID_C, -1)?;
    roi.set_c(AxisIndex::from_raw(c));
    Ok(())
}
