use super::{read_floats, write_floats};
use crate::common::{AXIS_X, AXIS_Y, AXIS_Z, Rectangle3D};
use crate::config::RoiDefaults;
use crate::roi::overlay::{CanvasPosition, Overlay, OverlayEvent, select_on_press};
use crate::roi::persist::Node;
use crate::roi::{Attachment, Roi, Roi3D, RoiCore, RoiShape, roi3};
use crate::Point3;
use std::any::Any;

const KEYS: [&str; 6] = ["x", "y", "z", "sizeX", "sizeY", "sizeZ"];

/// An axis-aligned box in XYZ, spanning `[pos, pos + size)` on each axis.
#[derive(Debug, Default)]
pub struct CuboidRoi3D {
    core: RoiCore,
    attachment: Attachment,
    rect: Rectangle3D,
}

impl CuboidRoi3D {
    pub fn new(rect: Rectangle3D) -> Self {
        Self {
            core: RoiCore::new(),
            attachment: Attachment::default(),
            rect,
        }
    }

    pub fn with_defaults(rect: Rectangle3D, defaults: &RoiDefaults) -> Self {
        Self {
            core: RoiCore::with_defaults(defaults),
            attachment: Attachment::default(),
            rect,
        }
    }

    pub fn rect(&self) -> &Rectangle3D {
        &self.rect
    }

    fn interior_cells(&self) -> f64 {
        (0..3).map(|a| (self.rect.size[a] - 2.0).max(0.0)).product()
    }
}

impl Roi for CuboidRoi3D {
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

    /// Box against box, with the same T and C activity rule as the mask path.
    fn exact_contains(&self, other: &dyn Roi) -> Option<bool> {
        let other = other.as_any().downcast_ref::<CuboidRoi3D>()?;
        Some(self.is_active_for(other.t(), other.c()) && self.rect.contains_rect(&other.rect))
    }

    fn exact_intersects(&self, other: &dyn Roi) -> Option<bool> {
        let other = other.as_any().downcast_ref::<CuboidRoi3D>()?;
        Some(self.is_active_for(other.t(), other.c()) && self.rect.intersects(&other.rect))
    }
}

impl Roi3D for CuboidRoi3D {
    fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    fn attachment_mut(&mut self) -> &mut Attachment {
        &mut self.attachment
    }

    fn contains3(&self, p: &Point3) -> bool {
        self.rect.contains_point(p)
    }

    fn contains_rect3(&self, r: &Rectangle3D) -> bool {
        self.rect.contains_rect(r)
    }

    fn intersects_rect3(&self, r: &Rectangle3D) -> bool {
        self.rect.intersects(r)
    }

    fn compute_bounds3(&self) -> Rectangle3D {
        self.rect
    }

    fn save_shape(&self, node: &mut Node) -> bool {
        let (p, s) = (self.rect.pos, self.rect.size);
        write_floats(node, KEYS, [p[0], p[1], p[2], s[0], s[1], s[2]]);
        true
    }

    fn load_shape(&mut self, node: &Node) -> bool {
        match read_floats(node, KEYS) {
            Ok([x, y, z, sx, sy, sz]) => {
                self.set_bounds3(Rectangle3D::new([x, y, z], [sx, sy, sz]));
                true
            }
            Err(e) => {
                tracing::warn!("Failed to read cuboid: {e}");
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

    fn set_bounds3(&mut self, bounds: Rectangle3D) {
        if self.rect != bounds {
            self.rect = bounds;
            self.roi_changed();
        }
    }

    fn set_position3(&mut self, position: Point3) {
        let mut moved = self.rect;
        moved.pos = position.coords;
        self.set_bounds3(moved);
    }

    /// The volume of the box in cells.
    fn compute_number_of_points(&self) -> f64 {
        if self.rect.is_empty() {
            return 0.0;
        }
        self.rect.size[AXIS_X] * self.rect.size[AXIS_Y] * self.rect.size[AXIS_Z]
    }

    /// The cells of the box minus those one cell away from every face.
    fn compute_number_of_contour_points(&self) -> f64 {
        self.compute_number_of_points() - self.interior_cells()
    }
}

impl Overlay for CuboidRoi3D {
    fn handle(&mut self, event: &OverlayEvent, canvas: &CanvasPosition) -> bool {
        select_on_press(self, event, canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::AxisIndex;
    use crate::roi::dispatch;
    use crate::Point5;
    use approx::assert_relative_eq;
    use test_case::test_case;

    fn cuboid(pos: [f64; 3], size: [f64; 3]) -> CuboidRoi3D {
        CuboidRoi3D::new(Rectangle3D::new(pos, size))
    }

    #[test_case([0.0, 0.0, 0.0], true)]
    #[test_case([1.999, 1.0, 1.0], true)]
    #[test_case([2.0, 1.0, 1.0], false)]
    #[test_case([-0.001, 1.0, 1.0], false)]
    fn half_open_point_test(p: [f64; 3], expected: bool) {
        let roi = cuboid([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        assert_eq!(roi.contains3(&Point3::from(p)), expected);
    }

    #[test]
    fn closed_form_counts_match_the_mask() {
        let roi = cuboid([1.0, 2.0, 3.0], [5.0, 4.0, 3.0]);
        assert_relative_eq!(roi.compute_number_of_points(), roi3::mask_number_of_points(&roi));
        assert_relative_eq!(
            roi.compute_number_of_contour_points(),
            roi3::mask_number_of_contour_points(&roi)
        );
        assert_relative_eq!(roi.compute_number_of_contour_points(), 60.0 - 6.0);
    }

    #[test]
    fn bounds_follow_edits() {
        let mut roi = cuboid([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        assert!(roi.can_set_bounds());
        roi.set_position3(Point3::new(4.0, 5.0, 6.0));
        assert_eq!(roi.bounds3(), Rectangle3D::new([4.0, 5.0, 6.0], [2.0, 2.0, 2.0]));
        assert_relative_eq!(roi.number_of_points(), 8.0);

        roi.set_bounds3(Rectangle3D::new([0.0, 0.0, 0.0], [3.0, 1.0, 1.0]));
        assert_relative_eq!(roi.number_of_points(), 3.0);
    }

    #[test]
    fn set_bounds5_moves_the_attachment() {
        let mut roi = cuboid([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        roi.set_bounds5(crate::Rectangle5D::new(
            [1.0, 1.0, 1.0, 3.0, f64::NEG_INFINITY],
            [1.0, 1.0, 1.0, 1.0, f64::INFINITY],
        ));
        assert_eq!(roi.t(), AxisIndex::At(3));
        assert_eq!(roi.c(), AxisIndex::Any);
        assert_eq!(roi.rect(), &Rectangle3D::new([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]));
    }

    #[test]
    fn exact_hook_respects_attachment() {
        let mut a = cuboid([0.0, 0.0, 0.0], [4.0, 4.0, 4.0]);
        let mut b = cuboid([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
        assert_eq!(a.exact_contains(&b), Some(true));

        a.set_t(AxisIndex::At(1));
        assert_eq!(a.exact_contains(&b), Some(true));
        assert_eq!(a.exact_intersects(&b), Some(true));

        b.set_t(AxisIndex::At(2));
        assert_eq!(a.exact_contains(&b), Some(false));
        assert_eq!(a.exact_intersects(&b), Some(false));
        assert!(!dispatch::intersects(&a, &b));

        let ball = crate::EllipsoidRoi3D::new(Point3::new(1.0, 1.0, 1.0), [1.0, 1.0, 1.0]);
        assert_eq!(a.exact_contains(&ball), None);
    }

    #[test_case(AxisIndex::At(1), AxisIndex::Any)]
    #[test_case(AxisIndex::At(1), AxisIndex::At(1))]
    #[test_case(AxisIndex::At(1), AxisIndex::At(2))]
    #[test_case(AxisIndex::Any, AxisIndex::At(2))]
    fn attachment_rule_matches_the_mask_path(outer_t: AxisIndex, inner_t: AxisIndex) {
        let mut outer = cuboid([0.0, 0.0, 0.0], [10.0, 10.0, 10.0]);
        let mut inner = cuboid([4.0, 4.0, 4.0], [2.0, 2.0, 2.0]);
        outer.set_t(outer_t);
        inner.set_t(inner_t);

        let mut outer_ball =
            crate::EllipsoidRoi3D::new(Point3::new(5.0, 5.0, 5.0), [5.0, 5.0, 5.0]);
        let mut inner_ball = crate::EllipsoidRoi3D::new(Point3::new(5.0, 5.0, 5.0), [2.0, 2.0, 2.0]);
        outer_ball.set_t(outer_t);
        inner_ball.set_t(inner_t);

        assert_eq!(
            dispatch::contains(&outer, &inner),
            dispatch::contains(&outer_ball, &inner_ball)
        );
        assert_eq!(
            dispatch::intersects(&outer, &inner),
            dispatch::intersects(&outer_ball, &inner_ball)
        );
    }

    #[test]
    fn press_inside_selects() {
        let mut roi = cuboid([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        roi.set_t(AxisIndex::At(1));
        let canvas = CanvasPosition::new(AxisIndex::At(1), AxisIndex::At(0));

        let outside = OverlayEvent::MousePressed(Point5::new(3.0, 1.0, 1.0, 1.0, 0.0));
        assert!(!roi.handle(&outside, &canvas));
        assert!(!roi.core().is_selected());

        let inside = OverlayEvent::MousePressed(Point5::new(1.0, 1.0, 1.0, 1.0, 0.0));
        let elsewhere = CanvasPosition::new(AxisIndex::At(2), AxisIndex::At(0));
        assert!(!roi.handle(&inside, &elsewhere));
        assert!(roi.handle(&inside, &canvas));
        assert!(roi.core().is_selected());
        assert!(!roi.handle(&OverlayEvent::Paint, &canvas));
    }

    #[test]
    fn shape_round_trip() {
        let roi = cuboid([1.5, 2.0, -3.0], [2.0, 0.5, 7.0]);
        let mut node = Node::new();
        assert!(roi.save_shape(&mut node));

        let mut loaded = CuboidRoi3D::default();
        assert!(loaded.load_shape(&node));
        assert_eq!(loaded.rect(), roi.rect());
    }
}
