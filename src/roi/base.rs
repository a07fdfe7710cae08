//! State shared by every ROI: identity, display style, state flags, change listeners and the
//! reentrant update bracket which coalesces notifications.

use crate::Result;
use crate::common::{Color, Rectangle5D};
use crate::config::RoiDefaults;
use crate::roi::Roi;
use crate::roi::event::*;
use crate::roi::persist::{self, Node};
use std::fmt::{Debug, Formatter};
use std::ops::{Deref, DerefMut};
use std::sync::OnceLock;

pub type Listener = Box<dyn Fn(&RoiEvent) + Send + Sync>;

/// Handle returned by `RoiCore::add_listener`, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Lazily computed values which depend on the shape. Cleared on every shape change.
#[derive(Debug, Default)]
pub(crate) struct RoiCache {
    pub bounds: OnceLock<Rectangle5D>,
    pub points: OnceLock<f64>,
    pub contour_points: OnceLock<f64>,
}

pub struct RoiCore {
    id: RoiId,
    name: String,
    color: Color,
    opacity: f64,
    stroke: f64,
    selected: bool,
    focused: bool,
    read_only: bool,
    creating: bool,

    update_depth: usize,
    pending: Vec<RoiChange>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    cache: RoiCache,
}

impl RoiCore {
    pub fn new() -> Self {
        Self::with_defaults(&RoiDefaults::default())
    }

    pub fn with_defaults(defaults: &RoiDefaults) -> Self {
        Self {
            id: RoiId::new(),
            name: defaults.name.clone(),
            color: defaults.color,
            opacity: defaults.opacity,
            stroke: defaults.stroke,
            selected: false,
            focused: false,
            read_only: false,
            creating: false,
            update_depth: 0,
            pending: Vec::new(),
            listeners: Vec::new(),
            next_listener: 0,
            cache: RoiCache::default(),
        }
    }

    pub fn id(&self) -> RoiId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn stroke(&self) -> f64 {
        self.stroke
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn set_name(&mut self, value: &str) {
        if self.name != value {
            self.name = value.to_string();
            self.property_changed(PROPERTY_NAME);
        }
    }

    pub fn set_color(&mut self, value: Color) {
        if self.color != value {
            self.color = value;
            self.property_changed(PROPERTY_COLOR);
        }
    }

    pub fn set_opacity(&mut self, value: f64) {
        let value = value.clamp(0.0, 1.0);
        if self.opacity != value {
            self.opacity = value;
            self.property_changed(PROPERTY_OPACITY);
        }
    }

    pub fn set_stroke(&mut self, value: f64) {
        if self.stroke != value {
            self.stroke = value;
            self.property_changed(PROPERTY_STROKE);
        }
    }

    pub fn set_selected(&mut self, value: bool) {
        if self.selected != value {
            self.selected = value;
            self.notify(RoiChange::Selection);
        }
    }

    pub fn set_focused(&mut self, value: bool) {
        if self.focused != value {
            self.focused = value;
            self.notify(RoiChange::Focus);
        }
    }

    pub fn set_read_only(&mut self, value: bool) {
        if self.read_only != value {
            self.read_only = value;
            self.property_changed(PROPERTY_READONLY);
        }
    }

    pub fn set_creating(&mut self, value: bool) {
        if self.creating != value {
            self.creating = value;
            self.property_changed(PROPERTY_CREATING);
        }
    }

    pub fn add_listener(&mut self, listener: impl Fn(&RoiEvent) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if no listener with this id was registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(i, _)| *i != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Open an update bracket. Brackets nest, and notifications raised while any bracket is
    /// open are held until the outermost one closes. Prefer `UpdateGuard`, which cannot leave
    /// a bracket open.
    pub fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    /// Close an update bracket, emitting a single event with all pending changes if this was
    /// the outermost one.
    pub fn end_update(&mut self) {
        self.update_depth = self.update_depth.saturating_sub(1);
        if self.update_depth == 0 && !self.pending.is_empty() {
            let changes = std::mem::take(&mut self.pending);
            self.emit(changes);
        }
    }

    pub fn is_updating(&self) -> bool {
        self.update_depth > 0
    }

    /// Signal a change of the shape.
    pub fn roi_changed(&mut self) {
        self.notify(RoiChange::Shape);
    }

    pub fn property_changed(&mut self, name: &'static str) {
        self.notify(RoiChange::Property(name));
    }

    pub fn notify(&mut self, change: RoiChange) {
        if change == RoiChange::Shape {
            self.cache = RoiCache::default();
        }

        if self.update_depth > 0 {
            if !self.pending.contains(&change) {
                self.pending.push(change);
            }
        } else {
            self.emit(vec![change]);
        }
    }

    fn emit(&self, changes: Vec<RoiChange>) {
        let event = RoiEvent::new(self.id, changes);
        for (_, listener) in self.listeners.iter() {
            listener(&event);
        }
    }

    pub(crate) fn cache(&self) -> &RoiCache {
        &self.cache
    }

    pub(crate) fn save(&self, node: &mut Node) {
        persist::set_str(node, "name", &self.name);
        persist::set_int(node, "color", self.color.to_argb() as i64);
        persist::set_float(node, "stroke", self.stroke);
        persist::set_float(node, "opacity", self.opacity);
        persist::set_bool(node, PROPERTY_READONLY, self.read_only);
    }

    /// Read the style fields, each one through its setter so that changes are notified.
    pub(crate) fn load(&mut self, node: &Node) -> Result<()> {
        let name = persist::get_str(node, "name", &self.name)?;
        let color = persist::get_int(node, "color", self.color.to_argb() as i64)?;
        let stroke = persist::get_float(node, "stroke", self.stroke)?;
        let opacity = persist::get_float(node, "opacity", self.opacity)?;
        let read_only = persist::get_bool(node, PROPERTY_READONLY, self.read_only)?;

        self.set_name(&name);
        self.set_color(Color::from_argb(color as u32));
        self.set_stroke(stroke);
        self.set_opacity(opacity);
        self.set_read_only(read_only);
        Ok(())
    }
}

impl Default for RoiCore {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for RoiCore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoiCore")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("color", &self.color)
            .field("opacity", &self.opacity)
            .field("stroke", &self.stroke)
            .field("selected", &self.selected)
            .field("focused", &self.focused)
            .field("read_only", &self.read_only)
            .field("creating", &self.creating)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// An open update bracket on a ROI. Dereferences to the ROI so that several setters can be
/// called through it, and closes the bracket when dropped, which emits at most one event.
pub struct UpdateGuard<'a, R: Roi + ?Sized> {
    roi: &'a mut R,
}

impl<'a, R: Roi + ?Sized> UpdateGuard<'a, R> {
    pub fn new(roi: &'a mut R) -> Self {
        roi.core_mut().begin_update();
        Self { roi }
    }
}

impl<R: Roi + ?Sized> Deref for UpdateGuard<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.roi
    }
}

impl<R: Roi + ?Sized> DerefMut for UpdateGuard<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.roi
    }
}

impl<R: Roi + ?Sized> Drop for UpdateGuard<'_, R> {
    fn drop(&mut self) {
        self.roi.core_mut().end_update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recorded(core: &mut RoiCore) -> Arc<Mutex<Vec<RoiEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        core.add_listener(move |e| sink.lock().push(e.clone()));
        events
    }

    #[test]
    fn setter_outside_bracket_emits_immediately() {
        let mut core = RoiCore::new();
        let events = recorded(&mut core);
        core.set_selected(true);

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].changes, vec![RoiChange::Selection]);
        assert_eq!(events[0].source, core.id());
    }

    #[test]
    fn unchanged_values_are_silent() {
        let mut core = RoiCore::new();
        core.set_name("a");
        let events = recorded(&mut core);
        core.set_name("a");
        core.set_selected(false);
        core.set_color(core.color());
        assert!(events.lock().is_empty());
    }

    #[test]
    fn bracket_coalesces_into_one_event() {
        let mut core = RoiCore::new();
        let events = recorded(&mut core);

        core.begin_update();
        core.set_color(Color::RED);
        core.roi_changed();
        core.set_color(Color::BLUE);
        core.roi_changed();
        assert!(events.lock().is_empty());
        core.end_update();

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].changes,
            vec![RoiChange::Property(PROPERTY_COLOR), RoiChange::Shape]
        );
    }

    #[test]
    fn nested_brackets_flush_on_outermost_exit() {
        let mut core = RoiCore::new();
        let events = recorded(&mut core);

        core.begin_update();
        core.begin_update();
        core.set_focused(true);
        core.end_update();
        assert!(events.lock().is_empty());
        core.set_read_only(true);
        core.end_update();

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert!(events[0].has(RoiChange::Focus));
        assert!(events[0].has_property(PROPERTY_READONLY));
    }

    #[test]
    fn empty_bracket_emits_nothing() {
        let mut core = RoiCore::new();
        let events = recorded(&mut core);
        core.begin_update();
        core.end_update();
        core.end_update();
        assert!(events.lock().is_empty());
        assert!(!core.is_updating());
    }

    #[test]
    fn removed_listener_is_not_called() {
        let mut core = RoiCore::new();
        let events = Arc::new(Mutex::new(0));
        let sink = events.clone();
        let id = core.add_listener(move |_| *sink.lock() += 1);

        core.roi_changed();
        assert!(core.remove_listener(id));
        assert!(!core.remove_listener(id));
        core.roi_changed();

        assert_eq!(*events.lock(), 1);
        assert_eq!(core.listener_count(), 0);
    }

    #[test]
    fn opacity_is_clamped() {
        let mut core = RoiCore::new();
        core.set_opacity(3.0);
        assert_eq!(core.opacity(), 1.0);
    }

    #[test]
    fn style_round_trip() {
        let mut core = RoiCore::new();
        core.set_name("nucleus");
        core.set_color(Color::rgba(1, 2, 3, 4));
        core.set_stroke(5.5);
        core.set_read_only(true);

        let mut node = Node::new();
        core.save(&mut node);

        let mut loaded = RoiCore::new();
        loaded.load(&node).unwrap();
        assert_eq!(loaded.name(), "nucleus");
        assert_eq!(loaded.color(), Color::rgba(1, 2, 3, 4));
        assert_eq!(loaded.stroke(), 5.5);
        assert!(loaded.is_read_only());
    }
}
