//! Shared primitives: discrete axis indices, axis-aligned rectangles over 2 to 5 dimensions, and
//! display colors.

mod axis;
mod color;
mod rect;

pub use axis::AxisIndex;
pub use color::Color;
pub use rect::{
    INT_INFINITE_POS, INT_INFINITE_SIZE, Rect, RectI, Rectangle2D, Rectangle2I, Rectangle3D,
    Rectangle3I, Rectangle4D, Rectangle4I, Rectangle5D, Rectangle5I,
};

/// Axis numbers in the 5D coordinate frame
pub const AXIS_X: usize = 0;
pub const AXIS_Y: usize = 1;
pub const AXIS_Z: usize = 2;
pub const AXIS_T: usize = 3;
pub const AXIS_C: usize = 4;
