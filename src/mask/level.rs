use crate::common::RectI;
use std::fmt::Debug;

/// The integer bounds of a mask level.
pub trait MaskBounds: Copy + PartialEq + Debug + Send + Sync {
    fn empty_bounds() -> Self;
    fn is_empty_bounds(&self) -> bool;
    fn union_bounds(&self, other: &Self) -> Self;
}

/// Bounds which can gain one more (outer) axis, which is how a `SliceMask` derives its own
/// bounds from the bounds of its slices.
pub trait LiftBounds: MaskBounds {
    type Lifted: MaskBounds;

    fn lift(&self, outer_pos: i32, outer_size: i32) -> Self::Lifted;

    /// Split lifted bounds back into the inner bounds and the outer axis position and size.
    fn split(lifted: &Self::Lifted) -> (Self, i32, i32);
}

impl<const D: usize> MaskBounds for RectI<D> {
    fn empty_bounds() -> Self {
        RectI::empty()
    }

    fn is_empty_bounds(&self) -> bool {
        self.is_empty()
    }

    fn union_bounds(&self, other: &Self) -> Self {
        self.union(other)
    }
}

macro_rules! impl_lift_bounds {
    ($inner:literal, $outer:literal) => {
        impl LiftBounds for RectI<$inner> {
            type Lifted = RectI<$outer>;

            fn lift(&self, outer_pos: i32, outer_size: i32) -> RectI<$outer> {
                let mut result = self.to_dim::<$outer>();
                result.pos[$inner] = outer_pos;
                result.size[$inner] = outer_size;
                result
            }

            fn split(lifted: &RectI<$outer>) -> (Self, i32, i32) {
                (lifted.to_dim::<$inner>(), lifted.pos[$inner], lifted.size[$inner])
            }
        }
    };
}

impl_lift_bounds!(2, 3);
impl_lift_bounds!(3, 4);
impl_lift_bounds!(4, 5);

/// One level of the mask hierarchy. Every level answers the same questions with the same
/// semantics, so the 2D leaf and the generic `SliceMask` stay consistent at every depth.
///
/// Coordinates passed in and out of a level are ordered innermost axis first (x, y, z, t, c)
/// and have exactly `DIM` entries.
pub trait MaskLevel: Clone + Debug + Send + Sync + Sized {
    type Bounds: MaskBounds;

    const DIM: usize;

    fn empty() -> Self;

    fn bounds(&self) -> Self::Bounds;

    /// Number of true cells
    fn cardinality(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.cardinality() == 0
    }

    fn contains_coords(&self, coords: &[i32]) -> bool;

    /// Returns true if every true cell of `other` is also true in this mask.
    fn contains_mask(&self, other: &Self) -> bool;

    /// Returns true if at least one cell is true in both masks.
    fn intersects_mask(&self, other: &Self) -> bool;

    /// Shrink the bounds to the tight region spanning only true cells.
    fn optimize_bounds(&mut self);

    /// Call `f` with the coordinates of every true cell.
    fn visit_points(&self, f: &mut dyn FnMut(&[i32]));

    fn union(&self, other: &Self) -> Self;

    fn intersection(&self, other: &Self) -> Self;

    /// Cells true in this mask and false in `other`.
    fn subtraction(&self, other: &Self) -> Self;

    /// A contour point is a true cell with at least one face neighbour (along any axis of the
    /// level) which is false or outside the mask.
    fn is_contour_point(&self, coords: &[i32]) -> bool {
        let n = coords.len();
        let mut neighbour = [0i32; 5];
        neighbour[..n].copy_from_slice(coords);
        for axis in 0..n {
            for delta in [-1, 1] {
                neighbour[axis] = coords[axis] + delta;
                if !self.contains_coords(&neighbour[..n]) {
                    return true;
                }
            }
            neighbour[axis] = coords[axis];
        }
        false
    }

    fn visit_contour_points(&self, f: &mut dyn FnMut(&[i32])) {
        self.visit_points(&mut |p| {
            if self.is_contour_point(p) {
                f(p)
            }
        });
    }

    fn contour_cardinality(&self) -> usize {
        let mut count = 0;
        self.visit_contour_points(&mut |_| count += 1);
        count
    }

    /// All true cells as a flat array of `DIM` coordinates per point.
    fn points_flat(&self) -> Vec<i32> {
        let mut result = Vec::with_capacity(self.cardinality() * Self::DIM);
        self.visit_points(&mut |p| result.extend_from_slice(p));
        result
    }

    /// All contour cells as a flat array of `DIM` coordinates per point.
    fn contour_points_flat(&self) -> Vec<i32> {
        let mut result = Vec::new();
        self.visit_contour_points(&mut |p| result.extend_from_slice(p));
        result
    }
}

/// Union of all the masks produced by an iterator, or `None` if it produced nothing.
pub fn union_all<M: MaskLevel>(masks: impl IntoIterator<Item = M>) -> Option<M> {
    masks.into_iter().reduce(|acc, m| acc.union(&m))
}
