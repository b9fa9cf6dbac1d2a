#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Point;
use crate::doc::{PersonId, RelationshipId};
use crate::layout::RenderPlan;

/// What is under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Label(RelationshipId),
    Node(PersonId),
}

/// Test what is under `p`, labels before nodes.
///
/// `p` must be in the plan's coordinate space; the engine keeps its plan in
/// model units, so callers convert from screen space with
/// [`crate::camera::Camera::screen_to_model`] first. Within each layer the
/// last painted item is on top and wins.
#[must_use]
pub fn hit_test(plan: &RenderPlan, p: Point) -> Option<Hit> {
    hit_label(plan, p).map(Hit::Label).or_else(|| hit_node(plan, p).map(Hit::Node))
}

/// The topmost label whose box contains `p`.
#[must_use]
pub fn hit_label(plan: &RenderPlan, p: Point) -> Option<RelationshipId> {
    plan.edges
        .iter()
        .rev()
        .find(|e| e.label.as_ref().is_some_and(|l| l.bounds.contains(p)))
        .map(|e| e.id)
}

/// The topmost node whose circle strictly contains `p`.
#[must_use]
pub fn hit_node(plan: &RenderPlan, p: Point) -> Option<PersonId> {
    plan.nodes
        .iter()
        .rev()
        .find(|n| n.center.distance(p) < n.radius)
        .map(|n| n.id)
}
