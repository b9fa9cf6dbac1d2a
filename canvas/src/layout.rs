//! Geometry engine: turns a [`Diagram`] into a backend-agnostic [`RenderPlan`].
//!
//! The plan is resolved in target pixel space. Every painter (the interactive
//! canvas, the export canvas, the SVG used for share images) draws the same
//! plan, so they cannot drift apart visually.
//!
//! Scaling: positions map from the 800×500 logical canvas by `sx = W/800` and
//! `sy = H/500` independently; lengths (radius, offsets, fonts, boxes) scale
//! by `k = min(sx, sy)` so circles stay circles.
//!
//! Edges are shortened at both ends by the avoidance distance so lines stop
//! outside the avatar and name. When both directions exist between two
//! people, each line is displaced along its own normal, which puts the two
//! lines (and their labels) on opposite sides of the axis.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::camera::Point;
use crate::consts::*;
use crate::doc::{Diagram, LabelPosition, PersonId, Relationship, RelationshipId};

/// Axis-aligned rectangle in target space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// A resolved person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePlan {
    pub id: PersonId,
    pub center: Point,
    pub radius: f64,
    pub ring_width: f64,
    pub color: String,
    pub name: String,
    pub initial: String,
    /// Top-center of the name text.
    pub name_anchor: Point,
    pub name_font_size: f64,
    pub initial_font_size: f64,
    pub image: Option<String>,
}

/// Whether an edge is alone between its two people or half of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Single,
    Paired,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A resolved relationship label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelPlan {
    pub text: String,
    /// Center of the label box.
    pub anchor: Point,
    pub bounds: Rect,
    pub font_size: f64,
    /// The anchor came from a user-dragged position.
    pub pinned: bool,
}

/// A resolved relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePlan {
    pub id: RelationshipId,
    pub from: PersonId,
    pub to: PersonId,
    pub kind: EdgeKind,
    pub segment: Segment,
    /// `[tip, left base, right base]`.
    pub arrow: [Point; 3],
    pub label: Option<LabelPlan>,
}

/// Everything a painter needs, in target pixel space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub width: f64,
    pub height: f64,
    /// Uniform length scale `k`.
    pub scale: f64,
    pub nodes: Vec<NodePlan>,
    pub edges: Vec<EdgePlan>,
}

impl RenderPlan {
    #[must_use]
    pub fn node(&self, id: PersonId) -> Option<&NodePlan> {
        self.nodes.iter().find(|n| n.id == id)
    }

    #[must_use]
    pub fn edge(&self, id: RelationshipId) -> Option<&EdgePlan> {
        self.edges.iter().find(|e| e.id == id)
    }
}

/// Maps logical coordinates and lengths onto a render target.
#[derive(Debug, Clone, Copy)]
struct Target {
    sx: f64,
    sy: f64,
    k: f64,
}

impl Target {
    fn new(width: f64, height: f64) -> Self {
        let sx = width / LOGICAL_WIDTH;
        let sy = height / LOGICAL_HEIGHT;
        Self { sx, sy, k: sx.min(sy) }
    }

    fn point(self, x: f64, y: f64) -> Point {
        Point::new(x * self.sx, y * self.sy)
    }

    fn length(self, logical: f64) -> f64 {
        logical * self.k
    }
}

/// Width of a label box in logical units, padding included.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn label_width(text: &str) -> f64 {
    text.width() as f64 * LABEL_COLUMN_WIDTH + LABEL_PADDING * 2.0
}

/// Lay the diagram out on a `width × height` target.
///
/// Pure: equal inputs give equal plans. Relationships whose endpoints are
/// missing are skipped, as are self-loops and repeats of an already drawn
/// direction (first one wins).
#[must_use]
pub fn layout(diagram: &Diagram, width: f64, height: f64) -> RenderPlan {
    let target = Target::new(width, height);

    let nodes: Vec<NodePlan> = diagram
        .people
        .iter()
        .map(|p| {
            let center = target.point(p.x, p.y);
            NodePlan {
                id: p.id,
                center,
                radius: target.length(NODE_RADIUS),
                ring_width: target.length(NODE_RING_WIDTH),
                color: p.color.clone(),
                name: p.name.clone(),
                initial: p.initial(),
                name_anchor: Point::new(center.x, center.y + target.length(NAME_OFFSET_Y)),
                name_font_size: target.length(NAME_FONT_SIZE),
                initial_font_size: target.length(INITIAL_FONT_SIZE),
                image: p.image.clone(),
            }
        })
        .collect();

    let centers: HashMap<PersonId, Point> = nodes.iter().map(|n| (n.id, n.center)).collect();

    let mut edges = Vec::with_capacity(diagram.relationships.len());
    let mut drawn: HashSet<(PersonId, PersonId)> = HashSet::new();
    let mut processed_pairs: HashSet<(PersonId, PersonId)> = HashSet::new();

    for rel in &diagram.relationships {
        if rel.from == rel.to || drawn.contains(&(rel.from, rel.to)) {
            continue;
        }
        let (Some(&from), Some(&to)) = (centers.get(&rel.from), centers.get(&rel.to)) else {
            continue;
        };

        let reverse = diagram
            .relationships
            .iter()
            .find(|r| r.from == rel.to && r.to == rel.from);

        match reverse {
            Some(rev) => {
                if !processed_pairs.insert(pair_key(rel.from, rel.to)) {
                    continue;
                }
                edges.push(edge_plan(rel, from, to, EdgeKind::Paired, target));
                edges.push(edge_plan(rev, to, from, EdgeKind::Paired, target));
                drawn.insert((rel.from, rel.to));
                drawn.insert((rev.from, rev.to));
            }
            None => {
                edges.push(edge_plan(rel, from, to, EdgeKind::Single, target));
                drawn.insert((rel.from, rel.to));
            }
        }
    }

    RenderPlan { width, height, scale: target.k, nodes, edges }
}

fn pair_key(a: PersonId, b: PersonId) -> (PersonId, PersonId) {
    (a.min(b), a.max(b))
}

/// Direction from `from` to `to`. Coincident centers point along +x.
fn direction(from: Point, to: Point) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.hypot(dy) < f64::EPSILON { 0.0 } else { dy.atan2(dx) }
}

fn edge_plan(rel: &Relationship, from: Point, to: Point, kind: EdgeKind, target: Target) -> EdgePlan {
    let angle = direction(from, to);
    let (sin, cos) = angle.sin_cos();
    // angle - 90°: "up" for a rightward edge in y-down space.
    let normal = Point::new(sin, -cos);

    let avoid = target.length(AVOIDANCE_DISTANCE);
    let lateral = match kind {
        EdgeKind::Single => 0.0,
        EdgeKind::Paired => target.length(PAIR_LINE_OFFSET),
    };

    let start = Point::new(
        from.x + cos * avoid + normal.x * lateral,
        from.y + sin * avoid + normal.y * lateral,
    );
    let end = Point::new(to.x - cos * avoid + normal.x * lateral, to.y - sin * avoid + normal.y * lateral);

    let arrow_len = target.length(ARROW_SIZE);
    let arrow = [
        end,
        Point::new(
            end.x - arrow_len * (angle - ARROW_ANGLE).cos(),
            end.y - arrow_len * (angle - ARROW_ANGLE).sin(),
        ),
        Point::new(
            end.x - arrow_len * (angle + ARROW_ANGLE).cos(),
            end.y - arrow_len * (angle + ARROW_ANGLE).sin(),
        ),
    ];

    let label = label_plan(rel, start, end, normal, kind, target);

    EdgePlan { id: rel.id, from: rel.from, to: rel.to, kind, segment: Segment { start, end }, arrow, label }
}

fn label_plan(
    rel: &Relationship,
    start: Point,
    end: Point,
    normal: Point,
    kind: EdgeKind,
    target: Target,
) -> Option<LabelPlan> {
    let text = rel.label.trim();
    if text.is_empty() {
        return None;
    }

    let (anchor, pinned) = match rel.label_position {
        LabelPosition::Overridden { x, y } => (target.point(x, y), true),
        LabelPosition::Default => {
            let offset = target.length(match kind {
                EdgeKind::Single => LABEL_OFFSET,
                EdgeKind::Paired => PAIR_LABEL_OFFSET,
            });
            let along = Point::new(
                start.x + (end.x - start.x) * LABEL_RATIO,
                start.y + (end.y - start.y) * LABEL_RATIO,
            );
            (Point::new(along.x + normal.x * offset, along.y + normal.y * offset), false)
        }
    };

    let width = target.length(label_width(text));
    let height = target.length(LABEL_HEIGHT);
    Some(LabelPlan {
        text: text.to_string(),
        anchor,
        bounds: Rect { x: anchor.x - width / 2.0, y: anchor.y - height / 2.0, width, height },
        font_size: target.length(LABEL_FONT_SIZE),
        pinned,
    })
}
