//! Shared numeric constants for the canvas crate.
//!
//! All lengths are in logical units of the 800×500 model canvas. Renderers
//! targeting a different size scale them through [`crate::layout::layout`].

// ── Logical canvas ──────────────────────────────────────────────

/// Width of the logical model canvas.
pub const LOGICAL_WIDTH: f64 = 800.0;

/// Height of the logical model canvas.
pub const LOGICAL_HEIGHT: f64 = 500.0;

/// Horizontal margin a dragged node is clamped to.
pub const DRAG_MARGIN_X: f64 = 40.0;

/// Vertical margin a dragged node is clamped to (leaves room for the name).
pub const DRAG_MARGIN_Y: f64 = 60.0;

/// Margin used by auto-arrange on every side.
pub const ARRANGE_MARGIN: f64 = 80.0;

// ── Nodes ───────────────────────────────────────────────────────

/// The one drawn avatar radius, shared by every renderer.
pub const NODE_RADIUS: f64 = 35.0;

/// Height reserved under the avatar for the person's name.
pub const NAME_LABEL_HEIGHT: f64 = 20.0;

/// Extra clearance between the name stack and an edge endpoint.
pub const AVOIDANCE_BUFFER: f64 = 10.0;

/// Radial clearance subtracted from both ends of an edge.
pub const AVOIDANCE_DISTANCE: f64 = NODE_RADIUS + NAME_LABEL_HEIGHT + AVOIDANCE_BUFFER;

/// Distance from the node center to the top of the name text.
pub const NAME_OFFSET_Y: f64 = 45.0;

pub const NAME_FONT_SIZE: f64 = 16.0;
pub const INITIAL_FONT_SIZE: f64 = 20.0;

/// Width of the white ring around each avatar.
pub const NODE_RING_WIDTH: f64 = 3.0;

// ── Edges ───────────────────────────────────────────────────────

/// Arrowhead length.
pub const ARROW_SIZE: f64 = 10.0;

/// Arrowhead half-angle in radians (30°).
pub const ARROW_ANGLE: f64 = std::f64::consts::PI / 6.0;

/// Lateral displacement of each line of a bidirectional pair.
pub const PAIR_LINE_OFFSET: f64 = 8.0;

pub const EDGE_WIDTH: f64 = 2.0;

// ── Labels ──────────────────────────────────────────────────────

/// Position of the default label anchor along the segment, from the start.
pub const LABEL_RATIO: f64 = 0.4;

/// Perpendicular label offset for a single edge.
pub const LABEL_OFFSET: f64 = 25.0;

/// Perpendicular label offset for each edge of a bidirectional pair.
pub const PAIR_LABEL_OFFSET: f64 = PAIR_LINE_OFFSET + 20.0;

pub const LABEL_FONT_SIZE: f64 = 14.0;
pub const LABEL_PADDING: f64 = 6.0;
pub const LABEL_HEIGHT: f64 = 20.0;

/// Estimated advance of one display column of bold label text.
pub const LABEL_COLUMN_WIDTH: f64 = 7.0;

// ── Colors ──────────────────────────────────────────────────────

/// Node palette offered by the editor, in order.
pub const PALETTE: [&str; 10] = [
    "#3b82f6", "#ec4899", "#10b981", "#f59e0b", "#8b5cf6", "#ef4444", "#06b6d4", "#84cc16", "#f97316",
    "#a855f7",
];

/// Fill used when a stored person carries no color.
pub const DEFAULT_NODE_COLOR: &str = "#3b82f6";

pub const EDGE_COLOR: &str = "#666";
pub const TEXT_COLOR: &str = "#333";
pub const LABEL_FILL: &str = "rgba(255, 255, 255, 0.95)";
pub const LABEL_BORDER: &str = "#e0e0e0";

/// Relation-mode highlight for the source node.
pub const SOURCE_HIGHLIGHT: &str = "#4CAF50";

/// Relation-mode highlight for the target node.
pub const TARGET_HIGHLIGHT: &str = "#2196F3";

pub const FONT_FAMILY: &str = "'Noto Sans JP', sans-serif";

// ── Camera ──────────────────────────────────────────────────────

pub const ZOOM_MIN: f64 = 0.5;
pub const ZOOM_MAX: f64 = 3.0;

/// Factor applied by the zoom-in / zoom-out buttons.
pub const ZOOM_BUTTON_STEP: f64 = 1.2;

pub const WHEEL_ZOOM_IN: f64 = 1.1;
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Zoom change per pixel of pinch distance change.
pub const PINCH_SENSITIVITY: f64 = 0.01;

// ── Persistence ─────────────────────────────────────────────────

/// Single local storage slot holding the whole diagram.
pub const STORAGE_KEY: &str = "relationshipDiagram";

/// Quiet period before a burst of edits is written.
pub const SAVE_DEBOUNCE_MS: f64 = 500.0;

// ── Images ──────────────────────────────────────────────────────

/// Size of the social-card image.
pub const SHARE_WIDTH: f64 = 1200.0;
pub const SHARE_HEIGHT: f64 = 630.0;

/// Resolution multiplier for export-to-file.
pub const EXPORT_SCALE: f64 = 3.0;

pub const WATERMARK_TEXT: &str = "soukanzu.jp";
pub const WATERMARK_INSET: f64 = 20.0;
pub const WATERMARK_FONT_SIZE: f64 = 18.0;
pub const WATERMARK_COLOR: &str = "#999";

/// Largest accepted avatar upload.
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

/// Largest accepted share payload (encoded).
pub const MAX_SHARE_BYTES: usize = 64 * 1024;
