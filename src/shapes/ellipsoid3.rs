use super::{read_floats, write_floats};
use crate::common::Rectangle3D;
use crate::config::RoiDefaults;
use crate::roi::overlay::{CanvasPosition, Overlay, OverlayEvent, select_on_press};
use crate::roi::persist::Node;
use crate::roi::{Attachment, Roi, Roi3D, RoiCore, RoiShape, roi3};
use crate::{Point3, Vector3};
use std::any::Any;

const KEYS: [&str; 6] = ["centerX", "centerY", "centerZ", "radiusX", "radiusY", "radiusZ"];

/// An axis-aligned ellipsoid. A radius which is not strictly positive makes the shape empty.
#[derive(Debug)]
pub struct EllipsoidRoi3D {
    core: RoiCore,
    attachment: Attachment,
    center: Point3,
    radii: Vector3,
}

impl EllipsoidRoi3D {
    pub fn new(center: Point3, radii: [f64; 3]) -> Self {
        Self {
            core: RoiCore::new(),
            attachment: Attachment::default(),
            center,
            radii: Vector3::from(radii),
        }
    }

    pub fn with_defaults(center: Point3, radii: [f64; 3], defaults: &RoiDefaults) -> Self {
        Self {
            core: RoiCore::with_defaults(defaults),
            ..Self::new(center, radii)
        }
    }

    pub fn center(&self) -> &Point3 {
        &self.center
    }

    pub fn radii(&self) -> &Vector3 {
        &self.radii
    }

    fn is_degenerate(&self) -> bool {
        self.radii.iter().any(|r| *r <= 0.0 || !r.is_finite())
    }

    /// The squared distance of `p` from the center in the frame where the ellipsoid is the
    /// unit sphere.
    fn unit_distance_sq(&self, p: &Point3) -> f64 {
        (p - self.center).component_div(&self.radii).norm_squared()
    }

    fn set_shape(&mut self, center: Point3, radii: Vector3) {
        if self.center != center || self.radii != radii {
            self.center = center;
            self.radii = radii;
            self.roi_changed();
        }
    }
}

impl Default for EllipsoidRoi3D {
    fn default() -> Self {
        Self::new(Point3::origin(), [0.0; 3])
    }
}

impl Roi for EllipsoidRoi3D {
    fn core(&self) -> &RoiCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut RoiCore {
        &mut self.core
    }

    fn shape(&self) -> RoiShape<'_> {
        RoiShape::Dim3(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save_to_node(&self, node: &mut Node) -> bool {
        roi3::save_to_node(self, node)
    }

    fn load_from_node(&mut self, node: &Node) -> bool {
        roi3::load_from_node(self, node)
    }
}

impl Roi3D for EllipsoidRoi3D {
    fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    fn attachment_mut(&mut self) -> &mut Attachment {
        &mut self.attachment
    }

    fn contains3(&self, p: &Point3) -> bool {
        !self.is_degenerate() && self.unit_distance_sq(p) <= 1.0
    }

    /// The ellipsoid is convex, so it contains the box when it contains all eight corners.
    fn contains_rect3(&self, r: &Rectangle3D) -> bool {
        if self.is_degenerate() || r.is_empty() {
            return false;
        }

        (0..8).all(|corner| {
            let p = Point3::new(
                if corner & 1 == 0 { r.min(0) } else { r.max(0) },
                if corner & 2 == 0 { r.min(1) } else { r.max(1) },
                if corner & 4 == 0 { r.min(2) } else { r.max(2) },
            );
            self.contains3(&p)
        })
    }

    /// The point of the box closest to the center must lie strictly inside.
    fn intersects_rect3(&self, r: &Rectangle3D) -> bool {
        if self.is_degenerate() || r.is_empty() {
            return false;
        }

        let closest = Point3::new(
            self.center.x.clamp(r.min(0), r.max(0)),
            self.center.y.clamp(r.min(1), r.max(1)),
            self.center.z.clamp(r.min(2), r.max(2)),
        );
        self.unit_distance_sq(&closest) < 1.0
    }

    fn compute_bounds3(&self) -> Rectangle3D {
        if self.is_degenerate() {
            return Rectangle3D::empty();
        }

        let min = self.center - self.radii;
        let size = self.radii * 2.0;
        Rectangle3D::new([min.x, min.y, min.z], [size.x, size.y, size.z])
    }

    fn save_shape(&self, node: &mut Node) -> bool {
        let (c, r) = (self.center, self.radii);
        write_floats(node, KEYS, [c.x, c.y, c.z, r.x, r.y, r.z]);
        true
    }

    fn load_shape(&mut self, node: &Node) -> bool {
        match read_floats(node, KEYS) {
            Ok([cx, cy, cz, rx, ry, rz]) => {
                self.set_shape(Point3::new(cx, cy, cz), Vector3::new(rx, ry, rz));
                true
            }
            Err(e) => {
                tracing::warn!("Failed to read ellipsoid: {e}");
                false
            }
        }
    }

    fn can_set_bounds(&self) -> bool {
        true
    }

    fn can_set_position(&self) -> bool {
        true
    }

    /// Fit the ellipsoid to the box.
    fn set_bounds3(&mut self, bounds: Rectangle3D) {
        let radii = bounds.size / 2.0;
        let center = Point3::from(bounds.pos + radii);
        self.set_shape(center, radii);
    }

    /// Move the ellipsoid so that its bounds start at `position`.
    fn set_position3(&mut self, position: Point3) {
        self.set_shape(position + self.radii, self.radii);
    }
}

impl Overlay for EllipsoidRoi3D {
    fn handle(&mut self, event: &OverlayEvent, canvas: &CanvasPosition) -> bool {
        select_on_press(self, event, canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::MaskLevel;
    use approx::assert_relative_eq;
    use rand::Rng;
    use test_case::test_case;

    fn ball() -> EllipsoidRoi3D {
        EllipsoidRoi3D::new(Point3::new(5.0, 5.0, 5.0), [3.0, 2.0, 1.0])
    }

    #[test_case([8.0, 5.0, 5.0], true)]
    #[test_case([5.0, 7.0, 5.0], true)]
    #[test_case([5.0, 5.0, 6.01], false)]
    #[test_case([7.0, 6.5, 5.0], false)]
    fn point_test(p: [f64; 3], expected: bool) {
        assert_eq!(ball().contains3(&Point3::from(p)), expected);
    }

    #[test]
    fn degenerate_radius_is_empty() {
        let roi = EllipsoidRoi3D::new(Point3::new(0.0, 0.0, 0.0), [1.0, 0.0, 1.0]);
        assert!(!roi.contains3(&Point3::origin()));
        assert!(roi.bounds3().is_empty());
        assert!(roi.boolean_mask(true).is_empty());
        assert_relative_eq!(roi.number_of_points(), 0.0);
        assert!(EllipsoidRoi3D::default().bounds5().is_empty());
    }

    #[test]
    fn bounds_enclose_the_shape() {
        let b = ball().bounds3();
        assert_eq!(b, Rectangle3D::new([2.0, 3.0, 4.0], [6.0, 4.0, 2.0]));
    }

    #[test]
    fn box_tests_agree_with_points() {
        let roi = ball();
        let mut rng = rand::rng();
        for _ in 0..500 {
            let pos = [
                rng.random_range(0.0..10.0),
                rng.random_range(0.0..10.0),
                rng.random_range(0.0..10.0),
            ];
            let size = [
                rng.random_range(0.1..3.0),
                rng.random_range(0.1..3.0),
                rng.random_range(0.1..3.0),
            ];
            let r = Rectangle3D::new(pos, size);
            let center = Point3::new(
                pos[0] + size[0] / 2.0,
                pos[1] + size[1] / 2.0,
                pos[2] + size[2] / 2.0,
            );

            if roi.contains_rect3(&r) {
                assert!(roi.intersects_rect3(&r));
                assert!(roi.contains3(&center));
            }
            if roi.contains3(&center) {
                assert!(roi.intersects_rect3(&r));
            }
        }
    }

    #[test]
    fn sphere_mask_has_expected_cells() {
        let roi = EllipsoidRoi3D::new(Point3::new(5.0, 5.0, 5.0), [3.0, 3.0, 3.0]);
        let mask = roi.boolean_mask(true);
        assert_eq!(mask.cardinality(), 184);
        assert!(mask.contains_coords(&[5, 5, 5]));
        assert!(!mask.contains_coords(&[2, 2, 2]));

        let exclusive = roi.boolean_mask(false);
        assert!(mask.contains_mask(&exclusive));
        assert!(exclusive.cardinality() < mask.cardinality());
    }

    #[test]
    fn fit_to_bounds() {
        let mut roi = ball();
        roi.set_bounds3(Rectangle3D::new([0.0, 0.0, 0.0], [4.0, 2.0, 2.0]));
        assert_eq!(roi.center(), &Point3::new(2.0, 1.0, 1.0));
        assert_eq!(roi.radii(), &Vector3::new(2.0, 1.0, 1.0));

        roi.set_position3(Point3::new(10.0, 10.0, 10.0));
        assert_eq!(roi.bounds3(), Rectangle3D::new([10.0, 10.0, 10.0], [4.0, 2.0, 2.0]));
    }

    #[test]
    fn shape_round_trip() {
        let roi = ball();
        let mut node = Node::new();
        assert!(roi.save_shape(&mut node));

        let mut loaded = EllipsoidRoi3D::default();
        assert!(loaded.load_shape(&node));
        assert_eq!(loaded.center(), roi.center());
        assert_eq!(loaded.radii(), roi.radii());
    }
}
