//! This module contains the boolean masks used as the universal (if slow) representation of ROI
//! shapes. A `BooleanMask2D` is a dense grid of cells inside an integer rectangle, and every
//! higher dimension is a `SliceMask` of masks one dimension lower, stacked along its outermost
//! axis (Z for 3D, T for 4D, C for 5D).

mod level;
mod mask2;
mod slices;

pub use level::{LiftBounds, MaskBounds, MaskLevel, union_all};
pub use mask2::BooleanMask2D;
pub use slices::SliceMask;

pub type BooleanMask3D = SliceMask<BooleanMask2D>;
pub type BooleanMask4D = SliceMask<BooleanMask3D>;
pub type BooleanMask5D = SliceMask<BooleanMask4D>;
