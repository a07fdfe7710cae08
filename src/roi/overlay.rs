//! The contract between ROIs and the canvas layer which draws them and feeds them input.
//! Rendering itself happens outside of this crate; a ROI only decides whether it consumes an
//! event and updates its own state.

use crate::common::AxisIndex;
use crate::roi::Roi3D;
use crate::Point5;

/// The (t, c) position a canvas is showing. `Any` means the canvas is not pinned on that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasPosition {
    pub t: AxisIndex,
    pub c: AxisIndex,
}

impl CanvasPosition {
    pub fn new(t: AxisIndex, c: AxisIndex) -> Self {
        Self { t, c }
    }
}

/// Input and paint requests from a canvas. Mouse events carry the image point under the
/// cursor in the 5D frame.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    Paint,
    KeyPressed(u32),
    KeyReleased(u32),
    MouseEntered(Point5),
    MouseExited(Point5),
    MouseMove(Point5),
    MouseDrag(Point5),
    MousePressed(Point5),
    MouseReleased(Point5),
    MouseClick(Point5),
    MouseWheel { point: Point5, rotation: i32 },
}

impl OverlayEvent {
    pub fn is_paint(&self) -> bool {
        matches!(self, OverlayEvent::Paint)
    }
}

pub trait Overlay {
    /// Handle an event coming from a canvas at `canvas`. Returns true if the event was consumed.
    fn handle(&mut self, event: &OverlayEvent, canvas: &CanvasPosition) -> bool;
}

/// Default input handling for a 3D ROI: a press inside the ROI selects it and consumes the
/// event.
pub fn select_on_press<R: Roi3D + ?Sized>(roi: &mut R, event: &OverlayEvent, canvas: &CanvasPosition) -> bool {
    match event {
        OverlayEvent::MousePressed(p) if roi.is_active_for(canvas.t, canvas.c) && roi.contains5(p) => {
            roi.set_selected(true);
            true
        }
        _ => false,
    }
}
