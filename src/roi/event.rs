//! Change notifications emitted by ROIs.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const PROPERTY_NAME: &str = "name";
pub const PROPERTY_COLOR: &str = "color";
pub const PROPERTY_OPACITY: &str = "opacity";
pub const PROPERTY_STROKE: &str = "stroke";
pub const PROPERTY_READONLY: &str = "readOnly";
pub const PROPERTY_CREATING: &str = "creating";
pub const PROPERTY_USE_CHILD_COLOR: &str = "useChildColor";

/// Identity of a ROI instance, used as the source of its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoiId(Uuid);

impl RoiId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoiId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoiId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoiChange {
    /// The geometry (or the T/C attachment) changed
    Shape,
    Focus,
    Selection,
    /// A named property changed, see the `PROPERTY_*` constants
    Property(&'static str),
}

/// One notification as seen by a listener. Everything that changed inside a single update
/// bracket arrives together, each change listed once in the order it first happened.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiEvent {
    pub source: RoiId,
    pub changes: Vec<RoiChange>,
}

impl RoiEvent {
    pub fn new(source: RoiId, changes: Vec<RoiChange>) -> Self {
        Self { source, changes }
    }

    pub fn has(&self, change: RoiChange) -> bool {
        self.changes.contains(&change)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.changes
            .iter()
            .any(|c| matches!(c, RoiChange::Property(p) if *p == name))
    }
}
