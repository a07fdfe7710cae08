//! ROIs whose native geometry is 3D (X, Y, Z), optionally attached to a single T and C index.
//!
//! A concrete 3D ROI only has to answer the 3D questions (`contains3`, `contains_rect3`,
//! `intersects_rect3`, `compute_bounds3`); the 5D queries, masks and point counts are composed
//! from those here and can be overridden where a shape knows better.

use crate::common::{AXIS_C, AXIS_T, AXIS_Z, AxisIndex, Rectangle2I, Rectangle3D, Rectangle5D, Rectangle5I};
use crate::mask::{BooleanMask2D, BooleanMask3D, MaskLevel};
use crate::roi::persist::{self, Node};
use crate::roi::{Roi, UpdateGuard};
use crate::{Point3, Point5, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ID_T: &str = "t";
pub const ID_C: &str = "c";

/// The T and C indices a 3D ROI is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attachment {
    pub t: AxisIndex,
    pub c: AxisIndex,
}

impl Attachment {
    pub fn new(t: AxisIndex, c: AxisIndex) -> Self {
        Self { t, c }
    }
}

pub trait Roi3D: Roi {
    fn attachment(&self) -> &Attachment;

    fn attachment_mut(&mut self) -> &mut Attachment;

    fn contains3(&self, p: &Point3) -> bool;

    /// Returns true only if the ROI covers the whole box. May return false when proving it is
    /// too expensive, never true when it does not hold.
    fn contains_rect3(&self, r: &Rectangle3D) -> bool;

    fn intersects_rect3(&self, r: &Rectangle3D) -> bool;

    /// The tight (or conservatively tight) 3D bounds of the shape. Use `bounds3` for the cached
    /// value.
    fn compute_bounds3(&self) -> Rectangle3D;

    /// Write the shape specific fields
    fn save_shape(&self, node: &mut Node) -> bool;

    /// Read the shape specific fields
    fn load_shape(&mut self, node: &Node) -> bool;

    fn t(&self) -> AxisIndex {
        self.attachment().t
    }

    fn c(&self) -> AxisIndex {
        self.attachment().c
    }

    fn set_t(&mut self, value: AxisIndex) {
        if self.attachment().t != value {
            self.attachment_mut().t = value;
            self.roi_changed();
        }
    }

    fn set_c(&mut self, value: AxisIndex) {
        if self.attachment().c != value {
            self.attachment_mut().c = value;
            self.roi_changed();
        }
    }

    /// Returns true if the ROI is present at the (t, c) position, where `Any` on either side
    /// matches every index.
    fn is_active_for(&self, t: AxisIndex, c: AxisIndex) -> bool {
        self.t().accepts(t) && self.c().accepts(c)
    }

    /// Containment of a 5D point: T and C are discrete slots, so an attached ROI only contains
    /// points whose t (and c) fall in `[index, index + 1)`.
    fn contains5(&self, p: &Point5) -> bool {
        self.t().slot_contains(p[AXIS_T])
            && self.c().slot_contains(p[AXIS_C])
            && self.contains3(&Point3::new(p[0], p[1], p[2]))
    }

    /// Containment of a 5D box: the T and C ranges must lie entirely inside the attached slots.
    fn contains_rect5(&self, r: &Rectangle5D) -> bool {
        self.t().slot_contains_range(r.min(AXIS_T), r.max(AXIS_T))
            && self.c().slot_contains_range(r.min(AXIS_C), r.max(AXIS_C))
            && self.contains_rect3(&r.to_dim::<3>())
    }

    /// Intersection with a 5D box: the T and C ranges only need to overlap the attached slots.
    /// A box with a zero size on any axis never intersects.
    fn intersects_rect5(&self, r: &Rectangle5D) -> bool {
        if r.is_empty() {
            return false;
        }

        self.t().slot_overlaps(r.min(AXIS_T), r.max(AXIS_T))
            && self.c().slot_overlaps(r.min(AXIS_C), r.max(AXIS_C))
            && self.intersects_rect3(&r.to_dim::<3>())
    }

    fn compute_bounds5(&self) -> Rectangle5D {
        let mut result = self.compute_bounds3().to_dim::<5>();
        let (t, size_t) = self.t().extent();
        let (c, size_c) = self.c().extent();
        result.pos[AXIS_T] = t;
        result.size[AXIS_T] = size_t;
        result.pos[AXIS_C] = c;
        result.size[AXIS_C] = size_c;
        result
    }

    fn bounds3(&self) -> Rectangle3D {
        self.bounds5().to_dim::<3>()
    }

    /// Integer bounds which cover the ROI, with infinite T / C axes when unattached.
    fn bounds(&self) -> Rectangle5I {
        self.bounds5().to_integer()
    }

    fn position(&self) -> Point5 {
        Point5::from(self.bounds5().pos)
    }

    fn position3(&self) -> Point3 {
        Point3::from(self.bounds3().pos)
    }

    fn can_set_bounds(&self) -> bool {
        false
    }

    fn can_set_position(&self) -> bool {
        false
    }

    /// Not supported unless `can_set_bounds` is true.
    fn set_bounds3(&mut self, _bounds: Rectangle3D) {}

    /// Not supported unless `can_set_position` is true.
    fn set_position3(&mut self, _position: Point3) {}

    /// Set the attachment from the T and C extent of the box (an infinite extent detaches the
    /// axis) and the shape from its XYZ part.
    fn set_bounds5(&mut self, bounds: Rectangle5D) {
        let mut roi = UpdateGuard::new(self);
        roi.set_t(AxisIndex::from_extent(bounds.pos[AXIS_T], bounds.size[AXIS_T]));
        roi.set_c(AxisIndex::from_extent(bounds.pos[AXIS_C], bounds.size[AXIS_C]));
        roi.set_bounds3(bounds.to_dim::<3>());
    }

    fn set_position5(&mut self, position: Point5) {
        let mut roi = UpdateGuard::new(self);
        roi.set_t(AxisIndex::from_extent(position[AXIS_T], 1.0));
        roi.set_c(AxisIndex::from_extent(position[AXIS_C], 1.0));
        roi.set_position3(Point3::new(position[0], position[1], position[2]));
    }

    /// Rasterize a `width` x `height` region at plane `z` into a row-major buffer. Each pixel is
    /// tested as a unit cube, with `intersects_rect3` when `inclusive` and `contains_rect3`
    /// otherwise. Shapes with a cheaper rasterization should override this.
    fn boolean_mask_2d_region(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        z: i32,
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
                    let cube = Rectangle3D::new([(x + i as i32) as f64, py, z as f64], [1.0; 3]);
                    *cell = if inclusive {
                        self.intersects_rect3(&cube)
                    } else {
                        self.contains_rect3(&cube)
                    };
                }
            });
        result
    }

    /// The mask of plane `z` over the XY bounds of the ROI, tightened to its content. `None`
    /// if the plane is empty.
    fn boolean_mask_2d_at(&self, z: i32, inclusive: bool) -> Option<BooleanMask2D> {
        let bounds: Rectangle2I = self.bounds3().to_integer().to_dim::<2>();
        if bounds.is_empty() {
            return None;
        }

        let buffer = self.boolean_mask_2d_region(
            bounds.x(),
            bounds.y(),
            bounds.width(),
            bounds.height(),
            z,
            inclusive,
        );
        let mut mask = BooleanMask2D::from_parts(bounds, buffer);
        mask.optimize_bounds();
        if mask.is_empty() { None } else { Some(mask) }
    }

    /// The mask of plane `z` as seen from the (t, c) position, `None` if the ROI is not active
    /// there.
    fn boolean_mask_2d(
        &self,
        z: i32,
        t: AxisIndex,
        c: AxisIndex,
        inclusive: bool,
    ) -> Option<BooleanMask2D> {
        if !self.is_active_for(t, c) {
            return None;
        }
        self.boolean_mask_2d_at(z, inclusive)
    }

    /// One 2D mask per integer Z across the bounds, built in parallel.
    fn boolean_mask(&self, inclusive: bool) -> BooleanMask3D {
        let bounds = self.bounds3().to_integer();
        if bounds.is_empty() {
            return BooleanMask3D::empty();
        }

        tracing::debug!(
            "Rasterizing 3D ROI {} over {} planes (inclusive: {inclusive})",
            self.id(),
            bounds.size[AXIS_Z]
        );

        let slices: BTreeMap<i32, BooleanMask2D> = bounds
            .axis_range(AXIS_Z)
            .into_par_iter()
            .filter_map(|z| self.boolean_mask_2d_at(z, inclusive).map(|m| (z, m)))
            .collect();
        BooleanMask3D::from_slices(slices)
    }

    /// Approximated from the inclusive mask unless the shape knows better.
    fn compute_number_of_points(&self) -> f64 {
        mask_number_of_points(self)
    }

    /// Approximated from the inclusive mask unless the shape knows better.
    fn compute_number_of_contour_points(&self) -> f64 {
        mask_number_of_contour_points(self)
    }

    /// Surface area in pixels, the number of contour points.
    fn surface_area(&self) -> f64 {
        self.number_of_contour_points()
    }

    /// Volume in pixels, the number of points.
    fn volume(&self) -> f64 {
        self.number_of_points()
    }
}

/// The number of cells of the inclusive mask of a 3D ROI.
pub fn mask_number_of_points<R: Roi3D + ?Sized>(roi: &R) -> f64 {
    roi.boolean_mask(true).cardinality() as f64
}

/// The number of contour cells of the inclusive mask of a 3D ROI.
pub fn mask_number_of_contour_points<R: Roi3D + ?Sized>(roi: &R) -> f64 {
    roi.boolean_mask(true).contour_cardinality() as f64
}

/// Save the style, the attachment and then the shape fields of a 3D ROI.
pub fn save_to_node<R: Roi3D + ?Sized>(roi: &R, node: &mut Node) -> bool {
    roi.core().save(node);
    persist::set_int(node, ID_T, roi.t().to_raw() as i64);
    persist::set_int(node, ID_C, roi.c().to_raw() as i64);
    roi.save_shape(node)
}

/// Load what `save_to_node` wrote, inside a single update bracket.
pub fn load_from_node<R: Roi3D + ?Sized>(roi: &mut R, node: &Node) -> bool {
    let mut roi = UpdateGuard::new(roi);

    if let Err(e) = load_attachment(&mut *roi, node) {
        tracing::warn!("Failed to load 3D ROI: {e}");
        return false;
    }
    if !roi.load_shape(node) {
        tracing::warn!("Failed to load the shape of 3D ROI {}", roi.id());
        return false;
    }
    true
}

fn load_attachment<R: Roi3D + ?Sized>(roi: &mut R, node: &Node) -> Result<()> {
    roi.core_mut().load(node)?;
    let t = persist::get_i32(node, ID_T, -1)?;
    let c = persist::get_i32(node, ID_C, -1)?;
    roi.set_t(AxisIndex::from_raw(t));
    roi.set_c(AxisIndex::from_raw(c));
    Ok(())
}
