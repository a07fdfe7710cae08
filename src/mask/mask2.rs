use crate::Result;
use crate::common::Rectangle2I;
use crate::errors::RoiError;
use crate::mask::MaskLevel;
use rayon::prelude::*;

/// A rasterized 2D containment mask: integer bounds plus a row-major boolean buffer with one cell
/// per pixel of the bounds. The cell at `mask[y * width + x]` is the pixel `(bounds.x + x,
/// bounds.y + y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanMask2D {
    bounds: Rectangle2I,
    mask: Vec<bool>,
}

impl BooleanMask2D {
    /// Create a mask from bounds and a buffer, which must have exactly one cell per pixel of the
    /// bounds.
    pub fn new(bounds: Rectangle2I, mask: Vec<bool>) -> Result<Self> {
        let expected = bounds.cell_count();
        if mask.len() != expected {
            return Err(RoiError::MaskSizeMismatch {
                expected,
                actual: mask.len(),
            }
            .into());
        }
        Ok(Self { bounds, mask })
    }

    /// Used where the buffer is produced for the bounds and cannot mismatch.
    pub(crate) fn from_parts(bounds: Rectangle2I, mask: Vec<bool>) -> Self {
        debug_assert_eq!(mask.len(), bounds.cell_count());
        Self { bounds, mask }
    }

    /// Build a mask over the bounds by evaluating `f(x, y)` in world coordinates for each pixel.
    pub fn from_fn(bounds: Rectangle2I, f: impl Fn(i32, i32) -> bool) -> Self {
        if bounds.is_empty() {
            return Self::empty();
        }

        let mut mask = Vec::with_capacity(bounds.cell_count());
        for y in bounds.axis_range(1) {
            for x in bounds.axis_range(0) {
                mask.push(f(x, y));
            }
        }
        Self { bounds, mask }
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn width(&self) -> i32 {
        self.bounds.width()
    }

    pub fn height(&self) -> i32 {
        self.bounds.height()
    }

    /// Value of the pixel at world coordinates, false outside the bounds.
    pub fn get(&self, x: i32, y: i32) -> bool {
        if !self.bounds.contains_coords(&[x, y]) {
            return false;
        }
        let i = (y - self.bounds.y()) as usize * self.width() as usize + (x - self.bounds.x()) as usize;
        self.mask[i]
    }

    fn rows(&self) -> impl Iterator<Item = (i32, &[bool])> {
        let y0 = self.bounds.y();
        self.mask
            .chunks(self.width().max(1) as usize)
            .enumerate()
            .map(move |(j, row)| (y0 + j as i32, row))
    }
}

impl MaskLevel for BooleanMask2D {
    type Bounds = Rectangle2I;

    const DIM: usize = 2;

    fn empty() -> Self {
        Self {
            bounds: Rectangle2I::empty(),
            mask: Vec::new(),
        }
    }

    fn bounds(&self) -> Rectangle2I {
        self.bounds
    }

    fn cardinality(&self) -> usize {
        self.mask.iter().filter(|v| **v).count()
    }

    fn is_empty(&self) -> bool {
        !self.mask.iter().any(|v| *v)
    }

    fn contains_coords(&self, coords: &[i32]) -> bool {
        self.get(coords[0], coords[1])
    }

    fn contains_mask(&self, other: &Self) -> bool {
        if other.is_empty() {
            return true;
        }
        if self.is_empty() {
            return false;
        }

        let x0 = other.bounds.x();
        other.rows().all(|(y, row)| {
            row.iter()
                .enumerate()
                .all(|(i, v)| !*v || self.get(x0 + i as i32, y))
        })
    }

    fn intersects_mask(&self, other: &Self) -> bool {
        let overlap = self.bounds.intersection(&other.bounds);
        if overlap.is_empty() {
            return false;
        }

        overlap
            .axis_range(1)
            .any(|y| overlap.axis_range(0).any(|x| self.get(x, y) && other.get(x, y)))
    }

    fn optimize_bounds(&mut self) {
        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;

        let x0 = self.bounds.x();
        for (y, row) in self.rows() {
            for (i, v) in row.iter().enumerate() {
                if *v {
                    let x = x0 + i as i32;
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                    min_y = min_y.min(y);
                    max_y = max_y.max(y);
                }
            }
        }

        if min_x > max_x {
            *self = Self::empty();
            return;
        }

        let tight = Rectangle2I::new([min_x, min_y], [max_x - min_x + 1, max_y - min_y + 1]);
        if tight != self.bounds {
            *self = Self::from_fn(tight, |x, y| self.get(x, y));
        }
    }

    fn visit_points(&self, f: &mut dyn FnMut(&[i32])) {
        let x0 = self.bounds.x();
        for (y, row) in self.rows() {
            for (i, v) in row.iter().enumerate() {
                if *v {
                    f(&[x0 + i as i32, y]);
                }
            }
        }
    }

    fn union(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }

        let bounds = self.bounds.union(&other.bounds);
        Self::from_fn(bounds, |x, y| self.get(x, y) || other.get(x, y))
    }

    fn intersection(&self, other: &Self) -> Self {
        let bounds = self.bounds.intersection(&other.bounds);
        let mut result = Self::from_fn(bounds, |x, y| self.get(x, y) && other.get(x, y));
        result.optimize_bounds();
        result
    }

    fn subtraction(&self, other: &Self) -> Self {
        let mut result = Self::from_fn(self.bounds, |x, y| self.get(x, y) && !other.get(x, y));
        result.optimize_bounds();
        result
    }

    fn contour_cardinality(&self) -> usize {
        let width = self.width().max(1) as usize;
        let x0 = self.bounds.x();
        let y0 = self.bounds.y();
        self.mask
            .par_chunks(width)
            .enumerate()
            .map(|(j, row)| {
                let y = y0 + j as i32;
                row.iter()
                    .enumerate()
                    .filter(|(i, v)| **v && self.is_contour_point(&[x0 + *i as i32, y]))
                    .count()
            })
            .sum()
    }
}
