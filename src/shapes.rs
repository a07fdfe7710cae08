//! Concrete ROI shapes: axis-aligned boxes in 3D and 5D, and the 3D ellipsoid.

mod cuboid3;
mod cuboid5;
mod ellipsoid3;

pub use cuboid3::CuboidRoi3D;
pub use cuboid5::CuboidRoi5D;
pub use ellipsoid3::EllipsoidRoi3D;

use crate::Result;
use crate::roi::persist::{self, Node};

/// Read a group of float fields, using 0.0 for absent ones.
fn read_floats<const N: usize>(node: &Node, keys: [&str; N]) -> Result<[f64; N]> {
    let mut values = [0.0; N];
    for (value, key) in values.iter_mut().zip(keys) {
        *value = persist::get_float(node, key, 0.0)?;
    }
    Ok(values)
}

fn write_floats<const N: usize>(node: &mut Node, keys: [&str; N], values: [f64; N]) {
    for (key, value) in keys.into_iter().zip(values) {
        persist::set_float(node, key, value);
    }
}
