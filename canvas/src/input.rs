//! Input model: modifier keys, mouse buttons, and the gesture state machine.
//!
//! `InputState` is the single source of truth for what the pointer is doing
//! between events. Each variant carries the context needed to interpret the
//! next move or release. Relation placement lives here too: it is a mode of
//! the same state machine rather than a separate flag, so "placing a
//! relationship while dragging a node" cannot be represented.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::{PersonId, RelationshipId};

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS: the relation chord.
    #[must_use]
    pub fn relation_chord(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger touch).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button.
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` value.
    #[must_use]
    pub fn from_dom(button: i16) -> Self {
        match button {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// A keyboard key as reported by the browser (e.g. `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape" || self.0 == "Esc"
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Gesture state between pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging empty canvas to pan.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// Moving a person.
    DraggingNode {
        id: PersonId,
        /// Model-space offset from the pointer to the node center, so the
        /// node does not jump to the pointer on the first move.
        grab_dx: f64,
        grab_dy: f64,
        /// At least one move changed the model.
        moved: bool,
    },
    /// Moving a relationship label.
    DraggingLabel {
        id: RelationshipId,
        grab_dx: f64,
        grab_dy: f64,
        moved: bool,
    },
    /// Two-finger pinch zoom.
    Pinching {
        /// Finger distance at the previous touch event, in screen pixels.
        last_distance: f64,
    },
    /// Relation mode: waiting for the source node.
    PlacingRelationFrom,
    /// Relation mode: source chosen, waiting for the target node.
    PlacingRelationTo { from: PersonId },
    /// Both ends chosen; the host is collecting the label.
    AwaitingLabel { from: PersonId, to: PersonId },
}

impl InputState {
    /// Whether relation placement (including the label prompt) is active.
    #[must_use]
    pub fn is_placing_relation(&self) -> bool {
        matches!(
            self,
            Self::PlacingRelationFrom | Self::PlacingRelationTo { .. } | Self::AwaitingLabel { .. }
        )
    }

    /// Whether a pointer drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Panning { .. } | Self::DraggingNode { .. } | Self::DraggingLabel { .. })
    }

    /// Source and target to highlight while placing a relationship.
    #[must_use]
    pub fn relation_highlight(&self) -> (Option<PersonId>, Option<PersonId>) {
        match *self {
            Self::PlacingRelationTo { from } => (Some(from), None),
            Self::AwaitingLabel { from, to } => (Some(from), Some(to)),
            _ => (None, None),
        }
    }
}
