//! A 4D ROI composed of 3D ROI slices, one per populated T index.
//!
//! The stack owns its slices and listens to each of them. Registration is tied to insertion:
//! a slice only enters the map through `SliceEntry::attach` and only leaves it through
//! `SliceEntry::detach`, so a removed slice never calls back into the stack. Slice events
//! land in an inbox and are translated into stack changes once the mutable access to the slice
//! has ended (see `edit_slice`).

use crate::common::{AXIS_T, AxisIndex, Color, Rectangle3D, Rectangle4D};
use crate::config::RoiDefaults;
use crate::errors::RoiError;
use crate::mask::{BooleanMask2D, BooleanMask3D, BooleanMask4D, MaskLevel};
use crate::roi::event::{PROPERTY_CREATING, PROPERTY_READONLY, PROPERTY_USE_CHILD_COLOR};
use crate::roi::overlay::{CanvasPosition, Overlay, OverlayEvent};
use crate::roi::persist::{self, Node};
use crate::roi::{
    ListenerId, Roi, Roi3D, Roi4D, RoiChange, RoiCore, RoiEvent, RoiShape, UpdateGuard, roi3,
    roi4,
};
use crate::{Point3, Point4, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::any::Any;
use std::collections::{BTreeMap, btree_map};
use std::sync::Arc;

const ID_SLICE: &str = "slice";

type Inbox = Arc<Mutex<Vec<RoiEvent>>>;
type SliceFactory<R> = Box<dyn Fn() -> Option<R> + Send + Sync>;

/// A slice together with the listener the stack registered on it.
struct SliceEntry<R: Roi3D> {
    roi: R,
    listener: ListenerId,
}

impl<R: Roi3D> SliceEntry<R> {
    fn attach(mut roi: R, inbox: &Inbox) -> Self {
        let sink = inbox.clone();
        let listener = roi
            .core_mut()
            .add_listener(move |event| sink.lock().push(event.clone()));
        Self { roi, listener }
    }

    fn detach(mut self) -> R {
        self.roi.core_mut().remove_listener(self.listener);
        self.roi
    }
}

pub struct Roi4DStack<R: Roi3D + 'static> {
    core: RoiCore,
    c: AxisIndex,
    slices: BTreeMap<i32, SliceEntry<R>>,
    factory: SliceFactory<R>,
    use_child_color: bool,
    inbox: Inbox,
    overlay: Option<Box<dyn Overlay + Send + Sync>>,
}

impl<R: Roi3D + Default + 'static> Roi4DStack<R> {
    /// An empty stack which creates new slices with `R::default()`.
    pub fn new() -> Self {
        Self::with_factory(|| Some(R::default()))
    }
}

impl<R: Roi3D + Default + 'static> Default for Roi4DStack<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Roi3D + 'static> Roi4DStack<R> {
    /// An empty stack which creates new slices with `factory`. A factory returning `None`
    /// stands for a slice type which could not be instantiated.
    pub fn with_factory(factory: impl Fn() -> Option<R> + Send + Sync + 'static) -> Self {
        Self {
            core: RoiCore::new(),
            c: AxisIndex::Any,
            slices: BTreeMap::new(),
            factory: Box::new(factory),
            use_child_color: false,
            inbox: Arc::new(Mutex::new(Vec::new())),
            overlay: None,
        }
    }

    pub fn with_defaults(mut self, defaults: &RoiDefaults) -> Self {
        self.core = RoiCore::with_defaults(defaults);
        self
    }

    /// Set the overlay which gets the first chance at canvas input, before the active slice.
    pub fn set_overlay(&mut self, overlay: Box<dyn Overlay + Send + Sync>) {
        self.overlay = Some(overlay);
    }

    fn create_slice(&self) -> std::result::Result<R, RoiError> {
        (self.factory)().ok_or(RoiError::SliceUnavailable)
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// The extent of the stack along T: the distance between the first and last populated
    /// indices plus one, gaps included. Zero for an empty stack.
    pub fn size_t(&self) -> i32 {
        match (self.slices.keys().next(), self.slices.keys().next_back()) {
            (Some(first), Some(last)) => last - first + 1,
            _ => 0,
        }
    }

    pub fn slice(&self, t: i32) -> Option<&R> {
        self.slices.get(&t).map(|e| &e.roi)
    }

    /// The slice at `t`, creating an empty one with the factory if there is none. Returns
    /// `None` only if the factory fails.
    pub fn slice_or_create(&mut self, t: i32) -> Option<&R> {
        if let Err(e) = self.try_slice_or_create(t) {
            tracing::error!("ROI stack {}: {e}", self.core.id());
            return None;
        }
        self.slice(t)
    }

    /// As `slice_or_create`, but a factory failure is returned to the caller instead of being
    /// logged.
    pub fn try_slice_or_create(&mut self, t: i32) -> Result<&R> {
        if !self.slices.contains_key(&t) {
            let slice = self.create_slice()?;
            self.set_slice(t, slice);
        }
        self.slice(t).ok_or_else(|| RoiError::SliceUnavailable.into())
    }

    /// Put `roi` at index `t`, forcing its T to `t` and its C to the C of the stack. A slice
    /// previously at `t` is detached and returned.
    pub fn set_slice(&mut self, t: i32, mut roi: R) -> Option<R> {
        roi.set_t(AxisIndex::At(t));
        roi.set_c(self.c);

        let entry = SliceEntry::attach(roi, &self.inbox);
        let previous = self.slices.insert(t, entry).map(SliceEntry::detach);
        self.roi_changed();
        previous
    }

    /// Detach and return the slice at `t`.
    pub fn remove_slice(&mut self, t: i32) -> Option<R> {
        let removed = self.slices.remove(&t).map(SliceEntry::detach);
        if removed.is_some() {
            self.roi_changed();
        }
        removed
    }

    /// Detach and drop every slice.
    pub fn clear(&mut self) {
        if self.slices.is_empty() {
            return;
        }
        for (_, entry) in std::mem::take(&mut self.slices) {
            entry.detach();
        }
        self.roi_changed();
    }

    /// Mutable access to the slice at `t`. When `f` returns, the slice T and C are forced back
    /// to the stack position and the events the slice raised are translated into stack changes.
    pub fn edit_slice<T>(&mut self, t: i32, f: impl FnOnce(&mut R) -> T) -> Option<T> {
        let c = self.c;
        let entry = self.slices.get_mut(&t)?;
        let result = f(&mut entry.roi);
        entry.roi.set_t(AxisIndex::At(t));
        entry.roi.set_c(c);

        self.process_slice_events();
        Some(result)
    }

    /// Same as `edit_slice`, creating the slice first if needed.
    pub fn edit_slice_or_create<T>(&mut self, t: i32, f: impl FnOnce(&mut R) -> T) -> Option<T> {
        self.slice_or_create(t)?;
        self.edit_slice(t, f)
    }

    /// Translate the pending slice events, all inside a single update bracket.
    fn process_slice_events(&mut self) {
        let events = std::mem::take(&mut *self.inbox.lock());
        if events.is_empty() {
            return;
        }

        let mut stack = UpdateGuard::new(self);
        for event in events.iter() {
            stack.slice_changed(event);
        }
    }

    /// React to an event raised by one of the slices. Shape changes become a stack shape
    /// change, and the focus, selection, read-only and creating flags of the slice are copied
    /// onto the stack (and from there to every slice).
    pub fn slice_changed(&mut self, event: &RoiEvent) {
        let source = self
            .slices
            .values()
            .find(|e| e.roi.id() == event.source)
            .map(|e| {
                let core = e.roi.core();
                (
                    core.is_focused(),
                    core.is_selected(),
                    core.is_read_only(),
                    core.is_creating(),
                )
            });

        let mut stack = UpdateGuard::new(self);
        for change in event.changes.iter() {
            match (change, source) {
                (RoiChange::Shape, _) => stack.roi_changed(),
                (RoiChange::Focus, Some((focused, _, _, _))) => stack.set_focused(focused),
                (RoiChange::Selection, Some((_, selected, _, _))) => stack.set_selected(selected),
                (RoiChange::Property(PROPERTY_READONLY), Some((_, _, read_only, _))) => {
                    stack.set_read_only(read_only)
                }
                (RoiChange::Property(PROPERTY_CREATING), Some((_, _, _, creating))) => {
                    stack.set_creating(creating)
                }
                _ => {}
            }
        }
    }

    /// Apply a style change to the stack and to every slice, emitting one stack event. The
    /// events the slices raise are consumed here rather than bounced back to the stack.
    fn propagate(&mut self, own: impl FnOnce(&mut RoiCore), each: impl Fn(&mut R)) {
        let mut stack = UpdateGuard::new(self);
        own(stack.core_mut());
        for entry in stack.slices.values_mut() {
            each(&mut entry.roi);
        }
        stack.inbox.lock().clear();
    }

    /// When true, slices keep their own color and `set_color` only changes the stack color.
    pub fn use_child_color(&self) -> bool {
        self.use_child_color
    }

    pub fn set_use_child_color(&mut self, value: bool) {
        if self.use_child_color != value {
            self.use_child_color = value;
            self.core.property_changed(PROPERTY_USE_CHILD_COLOR);
        }
    }

    /// Set the color of the slice at `t` only, see `set_use_child_color`.
    pub fn set_slice_color(&mut self, t: i32, color: Color) {
        self.edit_slice(t, |s| s.set_color(color));
    }

    /// The populated slices in ascending T order.
    pub fn iter(&self) -> Slices<'_, R> {
        Slices {
            inner: self.slices.iter(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.slices.keys().copied()
    }

    /// The slice shown by a canvas: the one at the canvas T, if the canvas is pinned on T.
    pub fn slice_for_canvas(&self, canvas: &CanvasPosition) -> Option<&R> {
        canvas.t.index().and_then(|t| self.slice(t))
    }
}

/// Iterator over the slices of a `Roi4DStack` and their T index, in ascending T order.
pub struct Slices<'a, R: Roi3D + 'static> {
    inner: btree_map::Iter<'a, i32, SliceEntry<R>>,
}

impl<'a, R: Roi3D + 'static> Iterator for Slices<'a, R> {
    type Item = (i32, &'a R);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(t, e)| (*t, &e.roi))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<R: Roi3D + 'static> DoubleEndedIterator for Slices<'_, R> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(t, e)| (*t, &e.roi))
    }
}

impl<'a, R: Roi3D + 'static> IntoIterator for &'a Roi4DStack<R> {
    type Item = (i32, &'a R);
    type IntoIter = Slices<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<R: Roi3D + 'static> Roi for Roi4DStack<R> {
    fn core(&self) -> &RoiCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut RoiCore {
        &mut self.core
    }

    fn shape(&self) -> RoiShape<'_> {
        RoiShape::Dim4(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn save_to_node(&self, node: &mut Node) -> bool {
        roi4::save_to_node(self, node);
        persist::set_bool(node, PROPERTY_USE_CHILD_COLOR, self.use_child_color);

        for (_, slice) in self.iter() {
            let mut child = Node::new();
            if !roi3::save_to_node(slice, &mut child) {
                return false;
            }
            persist::push_element(node, ID_SLICE, child);
        }
        true
    }

    fn load_from_node(&mut self, node: &Node) -> bool {
        let mut stack = UpdateGuard::new(self);

        if let Err(e) = roi4::load_from_node(&mut *stack, node) {
            tracing::warn!("Failed to load ROI stack: {e}");
            return false;
        }
        match persist::get_bool(node, PROPERTY_USE_CHILD_COLOR, false) {
            Ok(value) => stack.set_use_child_color(value),
            Err(e) => {
                tracing::warn!("Failed to load ROI stack: {e}");
                return false;
            }
        }
        let children = match persist::elements(node, ID_SLICE) {
            Ok(children) => children,
            Err(e) => {
                tracing::warn!("Failed to load ROI stack slices: {e}");
                return false;
            }
        };

        stack.clear();
        for child in children {
            let mut slice = match stack.create_slice() {
                Ok(slice) => slice,
                Err(e) => {
                    tracing::error!("ROI stack {}: {e}", stack.core().id());
                    return false;
                }
            };
            if !roi3::load_from_node(&mut slice, child) {
                return false;
            }
            let AxisIndex::At(t) = slice.t() else {
                tracing::warn!("ROI stack slice has no T index");
                return false;
            };
            stack.set_slice(t, slice);
        }
        true
    }

    fn set_color(&mut self, value: Color) {
        let to_slices = !self.use_child_color;
        self.propagate(
            |core| core.set_color(value),
            |s| {
                if to_slices {
                    s.set_color(value)
                }
            },
        );
    }

    fn set_opacity(&mut self, value: f64) {
        self.propagate(|core| core.set_opacity(value), |s| s.set_opacity(value));
    }

    fn set_stroke(&mut self, value: f64) {
        self.propagate(|core| core.set_stroke(value), |s| s.set_stroke(value));
    }

    fn set_creating(&mut self, value: bool) {
        self.propagate(|core| core.set_creating(value), |s| s.set_creating(value));
    }

    fn set_read_only(&mut self, value: bool) {
        self.propagate(|core| core.set_read_only(value), |s| s.set_read_only(value));
    }

    fn set_focused(&mut self, value: bool) {
        self.propagate(|core| core.set_focused(value), |s| s.set_focused(value));
    }

    fn set_selected(&mut self, value: bool) {
        self.propagate(|core| core.set_selected(value), |s| s.set_selected(value));
    }
}

impl<R: Roi3D + 'static> Roi4D for Roi4DStack<R> {
    fn c(&self) -> AxisIndex {
        self.c
    }

    fn set_c(&mut self, value: AxisIndex) {
        let mut stack = UpdateGuard::new(self);
        if stack.c != value {
            stack.c = value;
            stack.roi_changed();
        }
        for entry in stack.slices.values_mut() {
            entry.roi.set_c(value);
        }
        stack.inbox.lock().clear();
    }

    fn contains4(&self, p: &Point4) -> bool {
        let t = p[AXIS_T].floor() as i32;
        self.slice(t)
            .is_some_and(|s| s.contains3(&Point3::new(p[0], p[1], p[2])))
    }

    /// Every T index touched by the box must hold a slice which contains the XYZ part, so a
    /// gap anywhere in the range fails.
    fn contains_rect4(&self, r: &Rectangle4D) -> bool {
        if !self.bounds4().contains_rect(r) {
            return false;
        }

        let r3 = r.to_dim::<3>();
        let start = r.min(AXIS_T).floor() as i32;
        let end = r.max(AXIS_T).ceil() as i32;
        (start..end).all(|t| self.slice(t).is_some_and(|s| s.contains_rect3(&r3)))
    }

    /// At least one populated T index in the range must hold a slice which intersects the XYZ
    /// part. Gaps are skipped.
    fn intersects_rect4(&self, r: &Rectangle4D) -> bool {
        if !self.bounds4().intersects(r) {
            return false;
        }

        let r3 = r.to_dim::<3>();
        let start = r.min(AXIS_T).floor() as i32;
        let end = r.max(AXIS_T).ceil() as i32;
        if start >= end {
            return false;
        }
        self.slices
            .range(start..end)
            .any(|(_, e)| e.roi.intersects_rect3(&r3))
    }

    fn compute_bounds4(&self) -> Rectangle4D {
        let mut xyz = Rectangle3D::empty();
        for (_, slice) in self.iter() {
            xyz.add(&slice.bounds3());
        }

        let mut result = xyz.to_dim::<4>();
        match self.slices.keys().next() {
            Some(first) => {
                result.pos[AXIS_T] = *first as f64;
                result.size[AXIS_T] = self.size_t() as f64;
            }
            None => {
                result.pos[AXIS_T] = 0.0;
                result.size[AXIS_T] = 0.0;
            }
        }
        result
    }

    fn boolean_mask_2d_4d(&self, z: i32, t: i32, inclusive: bool) -> Option<BooleanMask2D> {
        self.slice(t)?.boolean_mask_2d_at(z, inclusive)
    }

    fn boolean_mask_3d(&self, t: i32, inclusive: bool) -> BooleanMask3D {
        self.slice(t)
            .map(|s| s.boolean_mask(inclusive))
            .unwrap_or_else(BooleanMask3D::empty)
    }

    fn boolean_mask(&self, inclusive: bool) -> BooleanMask4D {
        let slices: BTreeMap<i32, BooleanMask3D> = self
            .slices
            .par_iter()
            .map(|(t, e)| (*t, e.roi.boolean_mask(inclusive)))
            .filter(|(_, m)| !m.is_empty())
            .collect();
        BooleanMask4D::from_slices(slices)
    }

    fn compute_number_of_points(&self) -> f64 {
        self.iter().map(|(_, s)| s.number_of_points()).sum()
    }

    /// Approximates the 4D contour as the first slice (all its points), the contour points of
    /// the slices in between, and the last slice (all its points). With two slices or fewer
    /// this is the sum of their points.
    fn compute_number_of_contour_points(&self) -> f64 {
        if self.slices.len() <= 2 {
            return self.compute_number_of_points();
        }

        let mut slices = self.iter();
        let first = slices.next().map_or(0.0, |(_, s)| s.number_of_points());
        let last = slices.next_back().map_or(0.0, |(_, s)| s.number_of_points());
        let inner: f64 = slices.map(|(_, s)| s.number_of_contour_points()).sum();
        first + inner + last
    }
}

impl<R: Roi3D + Overlay + 'static> Overlay for Roi4DStack<R> {
    /// Input goes to the stack overlay first, then (if not consumed) to the slice shown by the
    /// canvas. Paint requests only go to the slice.
    fn handle(&mut self, event: &OverlayEvent, canvas: &CanvasPosition) -> bool {
        if !event.is_paint() {
            if let Some(own) = self.overlay.as_mut() {
                if own.handle(event, canvas) {
                    return true;
                }
            }
        }

        if !self.is_active_for(canvas.t, canvas.c) {
            return false;
        }
        let AxisIndex::At(t) = canvas.t else {
            return false;
        };
        self.edit_slice(t, |s| s.handle(event, canvas))
            .unwrap_or(false)
    }
}
