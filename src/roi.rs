//! This module contains the ROI traits. Every ROI implements `Roi`, which carries the shared
//! state (`RoiCore`) and the persistence contract, plus exactly one of the native-dimension
//! traits `Roi3D`, `Roi4D` or `Roi5D`. The native trait is reached through `Roi::shape`, a
//! closed tag over the three dimensions, which is what the pairwise `dispatch` table matches on.

mod base;
pub mod dispatch;
pub mod event;
pub mod overlay;
pub mod persist;
pub mod roi3;
pub mod roi4;
pub mod roi5;
mod stack4;

pub use base::{Listener, ListenerId, RoiCore, UpdateGuard};
pub use event::{RoiChange, RoiEvent, RoiId};
pub use persist::Node;
pub use roi3::{Attachment, Roi3D};
pub use roi4::Roi4D;
pub use roi5::Roi5D;
pub use stack4::{Roi4DStack, Slices};

use crate::common::{AxisIndex, Color, Rectangle5D};
use crate::mask::BooleanMask2D;
use crate::Point5;
use std::any::Any;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoiDimension {
    Dim3,
    Dim4,
    Dim5,
}

impl RoiDimension {
    pub fn count(self) -> usize {
        match self {
            RoiDimension::Dim3 => 3,
            RoiDimension::Dim4 => 4,
            RoiDimension::Dim5 => 5,
        }
    }
}

/// A ROI viewed through its native dimension. Every query here is expressed in the full 5D
/// frame so that callers can ask any ROI the same questions.
#[derive(Clone, Copy)]
pub enum RoiShape<'a> {
    Dim3(&'a dyn Roi3D),
    Dim4(&'a dyn Roi4D),
    Dim5(&'a dyn Roi5D),
}

impl RoiShape<'_> {
    pub fn dimension(&self) -> RoiDimension {
        match self {
            RoiShape::Dim3(_) => RoiDimension::Dim3,
            RoiShape::Dim4(_) => RoiDimension::Dim4,
            RoiShape::Dim5(_) => RoiDimension::Dim5,
        }
    }

    /// The T attachment, `Any` for ROIs with a native T axis
    pub fn t(&self) -> AxisIndex {
        match self {
            RoiShape::Dim3(r) => r.t(),
            _ => AxisIndex::Any,
        }
    }

    /// The C attachment, `Any` for ROIs with a native C axis
    pub fn c(&self) -> AxisIndex {
        match self {
            RoiShape::Dim3(r) => r.c(),
            RoiShape::Dim4(r) => r.c(),
            RoiShape::Dim5(_) => AxisIndex::Any,
        }
    }

    pub fn contains5(&self, p: &Point5) -> bool {
        match self {
            RoiShape::Dim3(r) => r.contains5(p),
            RoiShape::Dim4(r) => r.contains5(p),
            RoiShape::Dim5(r) => r.contains5(p),
        }
    }

    pub fn contains_rect5(&self, rect: &Rectangle5D) -> bool {
        match self {
            RoiShape::Dim3(r) => r.contains_rect5(rect),
            RoiShape::Dim4(r) => r.contains_rect5(rect),
            RoiShape::Dim5(r) => r.contains_rect5(rect),
        }
    }

    pub fn intersects_rect5(&self, rect: &Rectangle5D) -> bool {
        match self {
            RoiShape::Dim3(r) => r.intersects_rect5(rect),
            RoiShape::Dim4(r) => r.intersects_rect5(rect),
            RoiShape::Dim5(r) => r.intersects_rect5(rect),
        }
    }

    pub fn compute_bounds5(&self) -> Rectangle5D {
        match self {
            RoiShape::Dim3(r) => r.compute_bounds5(),
            RoiShape::Dim4(r) => r.compute_bounds5(),
            RoiShape::Dim5(r) => r.compute_bounds5(),
        }
    }

    pub fn is_active_for(&self, t: AxisIndex, c: AxisIndex) -> bool {
        match self {
            RoiShape::Dim3(r) => r.is_active_for(t, c),
            RoiShape::Dim4(r) => r.is_active_for(t, c),
            RoiShape::Dim5(r) => r.is_active_for(t, c),
        }
    }

    /// The 2D mask of the ROI in the plane at (z, t, c), `None` when the ROI has no content
    /// there.
    pub fn boolean_mask_2d(
        &self,
        z: i32,
        t: AxisIndex,
        c: AxisIndex,
        inclusive: bool,
    ) -> Option<BooleanMask2D> {
        match self {
            RoiShape::Dim3(r) => r.boolean_mask_2d(z, t, c, inclusive),
            RoiShape::Dim4(r) => r.boolean_mask_2d(z, t, c, inclusive),
            RoiShape::Dim5(r) => r.boolean_mask_2d(z, t, c, inclusive),
        }
    }

    pub fn compute_number_of_points(&self) -> f64 {
        match self {
            RoiShape::Dim3(r) => r.compute_number_of_points(),
            RoiShape::Dim4(r) => r.compute_number_of_points(),
            RoiShape::Dim5(r) => r.compute_number_of_points(),
        }
    }

    pub fn compute_number_of_contour_points(&self) -> f64 {
        match self {
            RoiShape::Dim3(r) => r.compute_number_of_contour_points(),
            RoiShape::Dim4(r) => r.compute_number_of_contour_points(),
            RoiShape::Dim5(r) => r.compute_number_of_contour_points(),
        }
    }
}

/// The base trait of every ROI.
pub trait Roi: Send + Sync {
    fn core(&self) -> &RoiCore;

    fn core_mut(&mut self) -> &mut RoiCore;

    fn shape(&self) -> RoiShape<'_>;

    fn as_any(&self) -> &dyn Any;

    /// Write the ROI into `node`. Returns false if the ROI could not be saved.
    fn save_to_node(&self, node: &mut Node) -> bool;

    /// Read the ROI back from `node`. Returns false on malformed content, in which case the ROI
    /// should be discarded.
    fn load_from_node(&mut self, node: &Node) -> bool;

    fn id(&self) -> RoiId {
        self.core().id()
    }

    fn dimension(&self) -> RoiDimension {
        self.shape().dimension()
    }

    /// An analytic containment test against `other`, if this ROI knows one for that kind of
    /// ROI. `None` falls through to the mask based comparison.
    fn exact_contains(&self, _other: &dyn Roi) -> Option<bool> {
        None
    }

    /// An analytic intersection test against `other`, see `exact_contains`.
    fn exact_intersects(&self, _other: &dyn Roi) -> Option<bool> {
        None
    }

    fn begin_update(&mut self) -> UpdateGuard<'_, Self>
    where
        Self: Sized,
    {
        UpdateGuard::new(self)
    }

    fn roi_changed(&mut self) {
        self.core_mut().roi_changed();
    }

    fn set_name(&mut self, value: &str) {
        self.core_mut().set_name(value);
    }

    fn set_color(&mut self, value: Color) {
        self.core_mut().set_color(value);
    }

    fn set_opacity(&mut self, value: f64) {
        self.core_mut().set_opacity(value);
    }

    fn set_stroke(&mut self, value: f64) {
        self.core_mut().set_stroke(value);
    }

    fn set_creating(&mut self, value: bool) {
        self.core_mut().set_creating(value);
    }

    fn set_read_only(&mut self, value: bool) {
        self.core_mut().set_read_only(value);
    }

    fn set_focused(&mut self, value: bool) {
        self.core_mut().set_focused(value);
    }

    fn set_selected(&mut self, value: bool) {
        self.core_mut().set_selected(value);
    }

    /// The 5D bounds, computed on first use and kept until the shape changes.
    fn bounds5(&self) -> Rectangle5D {
        *self
            .core()
            .cache()
            .bounds
            .get_or_init(|| self.shape().compute_bounds5())
    }

    /// The number of points (cells) inside the ROI, cached like `bounds5`.
    fn number_of_points(&self) -> f64 {
        *self
            .core()
            .cache()
            .points
            .get_or_init(|| self.shape().compute_number_of_points())
    }

    /// The number of points on the ROI contour, cached like `bounds5`.
    fn number_of_contour_points(&self) -> f64 {
        *self
            .core()
            .cache()
            .contour_points
            .get_or_init(|| self.shape().compute_number_of_contour_points())
    }

    fn contains_roi(&self, other: &dyn Roi) -> bool
    where
        Self: Sized,
    {
        dispatch::contains(self, other)
    }

    fn intersects_roi(&self, other: &dyn Roi) -> bool
    where
        Self: Sized,
    {
        dispatch::intersects(self, other)
    }
}
