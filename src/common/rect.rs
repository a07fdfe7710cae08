//! Axis-aligned boxes in D dimensions, in floating point (`Rect`) and integer (`RectI`) form.
//!
//! Axes are ordered X, Y, Z, T, C, so a `Rect<3>` is an XYZ box and a `Rect<5>` covers the full
//! frame. A box spans the half-open range `[pos, pos + size)` on every axis. An axis with an
//! infinite size stands for "every index along this axis" and always has a position of negative
//! infinity; the integer form uses the `INT_INFINITE_POS` / `INT_INFINITE_SIZE` pair for it.

use crate::na::{Point, SVector};
use serde::{Deserialize, Serialize};

/// Integer position of an axis with infinite extent
pub const INT_INFINITE_POS: i32 = i32::MIN / 2;

/// Integer size of an axis with infinite extent
pub const INT_INFINITE_SIZE: i32 = i32::MAX;

pub type Rectangle2D = Rect<2>;
pub type Rectangle3D = Rect<3>;
pub type Rectangle4D = Rect<4>;
pub type Rectangle5D = Rect<5>;

pub type Rectangle2I = RectI<2>;
pub type Rectangle3I = RectI<3>;
pub type Rectangle4I = RectI<4>;
pub type Rectangle5I = RectI<5>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect<const D: usize> {
    pub pos: SVector<f64, D>,
    pub size: SVector<f64, D>,
}

impl<const D: usize> Rect<D> {
    pub fn new(pos: [f64; D], size: [f64; D]) -> Self {
        Self {
            pos: SVector::from(pos),
            size: SVector::from(size),
        }
    }

    pub fn from_min_max(min: [f64; D], max: [f64; D]) -> Self {
        let mut size = [0.0; D];
        for (a, s) in size.iter_mut().enumerate() {
            *s = max[a] - min[a];
        }
        Self::new(min, size)
    }

    /// A box with zero size at the origin. It is the identity for `add`.
    pub fn empty() -> Self {
        Self {
            pos: SVector::zeros(),
            size: SVector::zeros(),
        }
    }

    /// A box which is infinite along every axis.
    pub fn infinite() -> Self {
        Self {
            pos: SVector::from_element(f64::NEG_INFINITY),
            size: SVector::from_element(f64::INFINITY),
        }
    }

    pub fn min(&self, axis: usize) -> f64 {
        self.pos[axis]
    }

    /// The exclusive upper limit on an axis. An infinite axis reports positive infinity rather
    /// than the `NaN` that `-inf + inf` would produce.
    pub fn max(&self, axis: usize) -> f64 {
        if self.is_infinite(axis) {
            f64::INFINITY
        } else {
            self.pos[axis] + self.size[axis]
        }
    }

    pub fn is_infinite(&self, axis: usize) -> bool {
        self.size[axis] == f64::INFINITY
    }

    /// A box is empty when any of its sizes is zero, negative or NaN.
    pub fn is_empty(&self) -> bool {
        self.size.iter().any(|s| !(*s > 0.0))
    }

    pub fn center(&self, axis: usize) -> f64 {
        if self.is_infinite(axis) {
            0.0
        } else {
            self.pos[axis] + self.size[axis] * 0.5
        }
    }

    pub fn contains_point(&self, p: &Point<f64, D>) -> bool {
        (0..D).all(|a| p[a] >= self.min(a) && p[a] < self.max(a))
    }

    /// Returns true if `other` lies entirely inside this box. Empty boxes are never contained.
    pub fn contains_rect(&self, other: &Rect<D>) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }

        (0..D).all(|a| other.min(a) >= self.min(a) && other.max(a) <= self.max(a))
    }

    /// Returns true if the interiors of the two boxes overlap. Boxes which only touch along a
    /// face do not intersect.
    pub fn intersects(&self, other: &Rect<D>) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }

        (0..D).all(|a| other.max(a) > self.min(a) && other.min(a) < self.max(a))
    }

    /// Grow this box so that it also covers `other`.
    pub fn add(&mut self, other: &Rect<D>) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
            return;
        }

        for a in 0..D {
            let lo = self.min(a).min(other.min(a));
            let hi = self.max(a).max(other.max(a));
            self.pos[a] = lo;
            self.size[a] = if hi == f64::INFINITY {
                f64::INFINITY
            } else {
                hi - lo
            };
        }
    }

    pub fn union(&self, other: &Rect<D>) -> Rect<D> {
        let mut result = *self;
        result.add(other);
        result
    }

    /// Convert to a box of another dimensionality. Trailing axes are dropped when `E < D`, and
    /// injected with infinite extent when `E > D`.
    pub fn to_dim<const E: usize>(&self) -> Rect<E> {
        let mut result = Rect::<E>::infinite();
        for a in 0..D.min(E) {
            result.pos[a] = self.pos[a];
            result.size[a] = self.size[a];
        }
        result
    }

    /// Round the box outward onto the integer grid (floor of the minimum, ceiling of the
    /// maximum) so that the integer box always covers this one.
    pub fn to_integer(&self) -> RectI<D> {
        let mut result = RectI::<D>::empty();
        for a in 0..D {
            if self.is_infinite(a) || !self.pos[a].is_finite() {
                result.pos[a] = INT_INFINITE_POS;
                result.size[a] = INT_INFINITE_SIZE;
            } else if !(self.size[a] > 0.0) {
                result.pos[a] = self.pos[a].floor() as i32;
                result.size[a] = 0;
            } else {
                let lo = self.pos[a].floor();
                let hi = self.max(a).ceil();
                result.pos[a] = lo as i32;
                result.size[a] = (hi - lo) as i32;
            }
        }
        result
    }
}

impl<const D: usize> Default for Rect<D> {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RectI<const D: usize> {
    pub pos: SVector<i32, D>,
    pub size: SVector<i32, D>,
}

impl<const D: usize> RectI<D> {
    pub fn new(pos: [i32; D], size: [i32; D]) -> Self {
        Self {
            pos: SVector::from(pos),
            size: SVector::from(size),
        }
    }

    pub fn empty() -> Self {
        Self {
            pos: SVector::zeros(),
            size: SVector::zeros(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size.iter().any(|s| *s <= 0)
    }

    pub fn is_infinite(&self, axis: usize) -> bool {
        self.size[axis] == INT_INFINITE_SIZE
    }

    pub fn min(&self, axis: usize) -> i32 {
        self.pos[axis]
    }

    /// Exclusive upper limit on an axis, `i32::MAX` for an infinite axis.
    pub fn max(&self, axis: usize) -> i32 {
        if self.is_infinite(axis) {
            i32::MAX
        } else {
            self.pos[axis].saturating_add(self.size[axis])
        }
    }

    /// The range of integer indices covered on an axis.
    pub fn axis_range(&self, axis: usize) -> std::ops::Range<i32> {
        self.min(axis)..self.max(axis)
    }

    pub fn contains_coords(&self, coords: &[i32]) -> bool {
        (0..D).all(|a| coords[a] >= self.min(a) && coords[a] < self.max(a))
    }

    pub fn contains_rect(&self, other: &RectI<D>) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }

        (0..D).all(|a| other.min(a) >= self.min(a) && other.max(a) <= self.max(a))
    }

    pub fn intersects(&self, other: &RectI<D>) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }

        (0..D).all(|a| other.max(a) > self.min(a) && other.min(a) < self.max(a))
    }

    /// The overlapping region of the two boxes, or an empty box if they do not intersect. An
    /// axis stays infinite only if it is infinite in both boxes.
    pub fn intersection(&self, other: &RectI<D>) -> RectI<D> {
        if !self.intersects(other) {
            return RectI::empty();
        }

        let mut result = RectI::<D>::empty();
        for a in 0..D {
            if self.is_infinite(a) && other.is_infinite(a) {
                result.pos[a] = INT_INFINITE_POS;
                result.size[a] = INT_INFINITE_SIZE;
            } else {
                let lo = self.min(a).max(other.min(a));
                let hi = self.max(a).min(other.max(a));
                result.pos[a] = lo;
                result.size[a] = hi - lo;
            }
        }
        result
    }

    pub fn add(&mut self, other: &RectI<D>) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
            return;
        }

        for a in 0..D {
            if self.is_infinite(a) || other.is_infinite(a) {
                self.pos[a] = INT_INFINITE_POS;
                self.size[a] = INT_INFINITE_SIZE;
            } else {
                let lo = self.min(a).min(other.min(a));
                let hi = self.max(a).max(other.max(a));
                self.pos[a] = lo;
                self.size[a] = hi - lo;
            }
        }
    }

    pub fn union(&self, other: &RectI<D>) -> RectI<D> {
        let mut result = *self;
        result.add(other);
        result
    }

    /// Number of integer cells covered by the box, zero when it is empty or infinite.
    pub fn cell_count(&self) -> usize {
        if self.is_empty() || (0..D).any(|a| self.is_infinite(a)) {
            return 0;
        }
        self.size.iter().map(|s| *s as usize).product()
    }

    /// Same as `Rect::to_dim`, using the integer infinite sentinel for injected axes.
    pub fn to_dim<const E: usize>(&self) -> RectI<E> {
        let mut result = RectI::<E>::empty();
        for a in 0..E {
            if a < D {
                result.pos[a] = self.pos[a];
                result.size[a] = self.size[a];
            } else {
                result.pos[a] = INT_INFINITE_POS;
                result.size[a] = INT_INFINITE_SIZE;
            }
        }
        result
    }

    pub fn to_float(&self) -> Rect<D> {
        let mut result = Rect::<D>::empty();
        for a in 0..D {
            if self.is_infinite(a) {
                result.pos[a] = f64::NEG_INFINITY;
                result.size[a] = f64::INFINITY;
            } else {
                result.pos[a] = self.pos[a] as f64;
                result.size[a] = self.size[a] as f64;
            }
        }
        result
    }
}

impl RectI<2> {
    pub fn x(&self) -> i32 {
        self.pos[0]
    }

    pub fn y(&self) -> i32 {
        self.pos[1]
    }

    pub fn width(&self) -> i32 {
        self.size[0]
    }

    pub fn height(&self) -> i32 {
        self.size[1]
    }
}

impl<const D: usize> Default for RectI<D> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point3, Point5};
    use approx::assert_relative_eq;
    use test_case::test_case;

    #[test]
    fn point_containment_is_half_open() {
        let r = Rectangle3D::new([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        assert!(r.contains_point(&Point3::new(0.0, 0.0, 0.0)));
        assert!(r.contains_point(&Point3::new(1.99, 1.0, 1.0)));
        assert!(!r.contains_point(&Point3::new(2.0, 1.0, 1.0)));
    }

    #[test_case([1.0, 1.0, 1.0], [1.0, 1.0, 1.0], true)]
    #[test_case([2.0, 0.0, 0.0], [1.0, 1.0, 1.0], false)]
    #[test_case([1.9, 0.0, 0.0], [1.0, 1.0, 1.0], true)]
    #[test_case([-1.0, 0.0, 0.0], [1.0, 1.0, 1.0], false)]
    #[test_case([1.0, 1.0, 1.0], [0.0, 1.0, 1.0], false)]
    fn intersection_is_open(pos: [f64; 3], size: [f64; 3], expected: bool) {
        let r = Rectangle3D::new([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let q = Rectangle3D::new(pos, size);
        assert_eq!(r.intersects(&q), expected);
        assert_eq!(q.intersects(&r), expected);
    }

    #[test]
    fn rect_containment() {
        let r = Rectangle3D::new([0.0, 0.0, 0.0], [4.0, 4.0, 4.0]);
        assert!(r.contains_rect(&Rectangle3D::new([0.0, 0.0, 0.0], [4.0, 4.0, 4.0])));
        assert!(r.contains_rect(&Rectangle3D::new([1.0, 1.0, 1.0], [1.0, 1.0, 1.0])));
        assert!(!r.contains_rect(&Rectangle3D::new([3.5, 1.0, 1.0], [1.0, 1.0, 1.0])));
        assert!(!r.contains_rect(&Rectangle3D::empty()));
    }

    #[test]
    fn infinite_axis_max_is_not_nan() {
        let r = Rectangle3D::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).to_dim::<5>();
        assert!(r.is_infinite(3));
        assert_eq!(r.min(3), f64::NEG_INFINITY);
        assert_eq!(r.max(3), f64::INFINITY);
        assert!(r.contains_point(&Point5::new(0.5, 0.5, 0.5, 1000.0, -3.0)));
    }

    #[test]
    fn infinite_box_intersects_finite_slot() {
        let r = Rectangle3D::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).to_dim::<5>();
        let q = Rectangle5D::new([0.0, 0.0, 0.0, 4.0, 2.0], [1.0, 1.0, 1.0, 1.0, 1.0]);
        assert!(r.intersects(&q));
        assert!(r.contains_rect(&q));
        assert!(!q.contains_rect(&r));
    }

    #[test]
    fn add_with_empty_is_identity() {
        let mut r = Rectangle3D::empty();
        let b = Rectangle3D::new([1.0, 2.0, 3.0], [1.0, 1.0, 1.0]);
        r.add(&b);
        assert_eq!(r, b);
        r.add(&Rectangle3D::empty());
        assert_eq!(r, b);
    }

    #[test]
    fn add_accumulates_union() {
        let mut r = Rectangle3D::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        r.add(&Rectangle3D::new([2.0, -1.0, 0.5], [1.0, 1.0, 1.0]));
        assert_relative_eq!(r.min(0), 0.0);
        assert_relative_eq!(r.max(0), 3.0);
        assert_relative_eq!(r.min(1), -1.0);
        assert_relative_eq!(r.max(1), 1.0);
        assert_relative_eq!(r.max(2), 1.5);
    }

    #[test]
    fn add_keeps_infinite_axes() {
        let mut r = Rectangle3D::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).to_dim::<4>();
        r.add(&Rectangle4D::new([1.0, 1.0, 1.0, 2.0], [1.0, 1.0, 1.0, 1.0]));
        assert!(r.is_infinite(3));
        assert_eq!(r.min(3), f64::NEG_INFINITY);
    }

    #[test]
    fn to_dim_projects_and_injects() {
        let r = Rectangle5D::new([1.0, 2.0, 3.0, 4.0, 5.0], [1.0, 1.0, 1.0, 1.0, 1.0]);
        let r3 = r.to_dim::<3>();
        assert_eq!(r3, Rectangle3D::new([1.0, 2.0, 3.0], [1.0, 1.0, 1.0]));
        let r4 = r3.to_dim::<4>();
        assert!(r4.is_infinite(3));
        assert_eq!(r4.to_dim::<3>(), r3);
    }

    #[test]
    fn to_integer_rounds_outward() {
        let r = Rectangle3D::new([0.5, -0.5, 2.0], [1.0, 1.0, 2.0]);
        let i = r.to_integer();
        assert_eq!(i, Rectangle3I::new([0, -1, 2], [2, 2, 2]));
    }

    #[test]
    fn to_integer_maps_infinite_axes() {
        let r = Rectangle3D::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]).to_dim::<5>();
        let i = r.to_integer();
        assert!(i.is_infinite(3));
        assert!(i.is_infinite(4));
        assert_eq!(i.pos[3], INT_INFINITE_POS);
        assert!(i.to_float().is_infinite(4));
    }

    #[test]
    fn integer_intersection() {
        let a = Rectangle2I::new([0, 0], [4, 4]);
        let b = Rectangle2I::new([2, 3], [4, 4]);
        assert_eq!(a.intersection(&b), Rectangle2I::new([2, 3], [2, 1]));
        assert!(a.intersection(&Rectangle2I::new([4, 0], [1, 1])).is_empty());
    }

    #[test]
    fn integer_intersection_with_infinite_axis() {
        let a = Rectangle3I::new([0, 0, 0], [2, 2, 2]).to_dim::<4>();
        let b = Rectangle4I::new([0, 0, 0, 3], [2, 2, 2, 2]);
        let both = a.intersection(&b);
        assert_eq!(both.axis_range(3), 3..5);
        assert!(a.intersection(&a).is_infinite(3));
    }

    #[test]
    fn integer_cell_count() {
        assert_eq!(Rectangle3I::new([0, 0, 0], [2, 3, 4]).cell_count(), 24);
        assert_eq!(Rectangle3I::new([0, 0, 0], [2, 0, 4]).cell_count(), 0);
    }
}
