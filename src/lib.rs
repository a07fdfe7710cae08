//! Multi-dimensional region-of-interest (ROI) geometry and boolean-mask engine. ROIs are defined
//! over up to five axes (X, Y, Z, T, C) and answer containment, intersection, bounds and
//! rasterized mask queries. See the `roi` module for the ROI traits and the `mask` module for
//! the boolean masks they build.

use std::error::Error;

pub mod common;
pub mod config;
pub mod errors;
pub mod mask;
pub mod roi;
pub mod shapes;

pub use parry3d_f64::na;

pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

pub type Point2 = na::Point2<f64>;
pub type Point3 = na::Point3<f64>;
pub type Point4 = na::Point4<f64>;
pub type Point5 = na::Point5<f64>;
pub type Vector3 = na::Vector3<f64>;

pub type Point3I = na::Point3<i32>;
pub type Point4I = na::Point4<i32>;
pub type Point5I = na::Point5<i32>;

pub use common::{
    AxisIndex, Color, Rect, RectI, Rectangle2D, Rectangle2I, Rectangle3D, Rectangle3I,
    Rectangle4D, Rectangle4I, Rectangle5D, Rectangle5I,
};
pub use config::RoiDefaults;
pub use errors::RoiError;
pub use mask::{BooleanMask2D, BooleanMask3D, BooleanMask4D, BooleanMask5D, MaskLevel, SliceMask};
pub use roi::{Roi, Roi3D, Roi4D, Roi4DStack, Roi5D, RoiCore, RoiEvent, RoiShape};
pub use shapes::{CuboidRoi3D, CuboidRoi5D, EllipsoidRoi3D};
