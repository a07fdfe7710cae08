use super::{read_floats, write_floats};
use crate::common::Rectangle5D;
use crate::config::RoiDefaults;
use crate::roi::persist::Node;
use crate::roi::{Roi, Roi5D, RoiCore, RoiShape, roi5};
use crate::Point5;
use std::any::Any;

const KEYS: [&str; 10] = [
    "x", "y", "z", "t", "c", "sizeX", "sizeY", "sizeZ", "sizeT", "sizeC",
];

/// An axis-aligned box over all five axes. An axis may be infinite, in which case the box
/// spans every index along it.
#[derive(Debug, Default)]
pub struct CuboidRoi5D {
    core: RoiCore,
    rect: Rectangle5D,
}

impl CuboidRoi5D {
    pub fn new(rect: Rectangle5D) -> Self {
        Self {
            core: RoiCore::new(),
            rect,
        }
    }

    pub fn with_defaults(rect: Rectangle5D, defaults: &RoiDefaults) -> Self {
        Self {
            core: RoiCore::with_defaults(defaults),
            rect,
        }
    }

    pub fn rect(&self) -> &Rectangle5D {
        &self.rect
    }
}

impl Roi for CuboidRoi5D {
    fn core(&self) -> &RoiCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut RoiCore {
        &mut self.core
    }

    fn shape(&self) -> RoiShape<'_> {
        RoiShape::Dim5(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save_to_node(&self, node: &mut Node) -> bool {
        roi5::save_to_node(self, node)
    }

    fn load_from_node(&mut self, node: &Node) -> bool {
        roi5::load_from_node(self, node)
    }

    fn exact_contains(&self, other: &dyn Roi) -> Option<bool> {
        let other = other.as_any().downcast_ref::<CuboidRoi5D>()?;
        Some(self.rect.contains_rect(&other.rect))
    }

    fn exact_intersects(&self, other: &dyn Roi) -> Option<bool> {
        let other = other.as_any().downcast_ref::<CuboidRoi5D>()?;
        Some(self.rect.intersects(&other.rect))
    }
}

impl Roi5D for CuboidRoi5D {
    fn contains5(&self, p: &Point5) -> bool {
        self.rect.contains_point(p)
    }

    fn contains_rect5(&self, r: &Rectangle5D) -> bool {
        self.rect.contains_rect(r)
    }

    fn intersects_rect5(&self, r: &Rectangle5D) -> bool {
        self.rect.intersects(r)
    }

    fn compute_bounds5(&self) -> Rectangle5D {
        self.rect
    }

    /// Infinite axes are written with a negative size.
    fn save_shape(&self, node: &mut Node) -> bool {
        let mut values = [0.0; 10];
        for a in 0..5 {
            if self.rect.is_infinite(a) {
                values[5 + a] = -1.0;
            } else {
                values[a] = self.rect.pos[a];
                values[5 + a] = self.rect.size[a];
            }
        }
        write_floats(node, KEYS, values);
        true
    }

    fn load_shape(&mut self, node: &Node) -> bool {
        let values = match read_floats(node, KEYS) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("Failed to read 5D cuboid: {e}");
                return false;
            }
        };

        let mut rect = Rectangle5D::empty();
        for a in 0..5 {
            if values[5 + a] < 0.0 {
                rect.pos[a] = f64::NEG_INFINITY;
                rect.size[a] = f64::INFINITY;
            } else {
                rect.pos[a] = values[a];
                rect.size[a] = values[5 + a];
            }
        }
        self.set_bounds5(rect);
        true
    }

    fn can_set_bounds(&self) -> bool {
        true
    }

    fn set_bounds5(&mut self, bounds: Rectangle5D) {
        if self.rect != bounds {
            self.rect = bounds;
            self.roi_changed();
        }
    }
}
