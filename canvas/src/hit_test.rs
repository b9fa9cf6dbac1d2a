use super::*;
use crate::camera::Camera;
use crate::doc::{Diagram, LabelPosition, Person, Relationship};
use crate::layout::layout;

// =============================================================
// Helpers
// =============================================================

fn person(id: u64, x: f64, y: f64) -> Person {
    Person { id: PersonId(id), name: format!("P{id}"), x, y, color: "#000".into(), image: None }
}

fn diagram() -> Diagram {
    Diagram {
        people: vec![person(1, 100.0, 100.0), person(2, 300.0, 100.0), person(3, 200.0, 300.0)],
        relationships: vec![Relationship {
            id: RelationshipId(1),
            from: PersonId(1),
            to: PersonId(2),
            label: "friend".into(),
            label_position: LabelPosition::Default,
        }],
    }
}

fn plan() -> RenderPlan {
    layout(&diagram(), 800.0, 500.0)
}

// =============================================================
// Nodes
// =============================================================

#[test]
fn center_of_node_hits_it() {
    assert_eq!(hit_test(&plan(), Point::new(200.0, 300.0)), Some(Hit::Node(PersonId(3))));
}

#[test]
fn node_radius_is_exclusive() {
    let p = plan();
    assert_eq!(hit_node(&p, Point::new(200.0 + 34.9, 300.0)), Some(PersonId(3)));
    assert_eq!(hit_node(&p, Point::new(200.0 + 35.0, 300.0)), None);
}

#[test]
fn empty_space_hits_nothing() {
    assert_eq!(hit_test(&plan(), Point::new(600.0, 400.0)), None);
}

#[test]
fn topmost_node_wins_when_overlapping() {
    let mut d = diagram();
    d.people.push(person(4, 110.0, 100.0));
    let p = layout(&d, 800.0, 500.0);
    assert_eq!(hit_node(&p, Point::new(105.0, 100.0)), Some(PersonId(4)));
}

// =============================================================
// Labels
// =============================================================

#[test]
fn label_anchor_hits_label() {
    // Default anchor for this edge is (193, 75).
    assert_eq!(hit_test(&plan(), Point::new(193.0, 75.0)), Some(Hit::Label(RelationshipId(1))));
}

#[test]
fn label_beats_node_underneath() {
    let mut d = diagram();
    d.relationships[0].label_position = LabelPosition::Overridden { x: 100.0, y: 100.0 };
    let p = layout(&d, 800.0, 500.0);
    assert_eq!(hit_test(&p, Point::new(100.0, 100.0)), Some(Hit::Label(RelationshipId(1))));
    // Just outside the label box but still inside the node.
    assert_eq!(hit_test(&p, Point::new(100.0, 120.0)), Some(Hit::Node(PersonId(1))));
}

// =============================================================
// Transform inversion
// =============================================================

#[test]
fn hit_under_zoom_offset_and_device_scale() {
    let camera = Camera { zoom: 2.0, offset_x: -50.0, offset_y: 20.0, device_scale: 0.75 };
    let target = Point::new(200.0, 300.0);
    let screen = camera.model_to_screen(target);
    // The raw screen point lands somewhere else entirely.
    assert_ne!(hit_test(&plan(), screen), Some(Hit::Node(PersonId(3))));
    let model = camera.screen_to_model(screen);
    assert_eq!(hit_test(&plan(), model), Some(Hit::Node(PersonId(3))));
}

#[test]
fn hit_near_edge_of_node_under_zoom() {
    let camera = Camera { zoom: 3.0, offset_x: 10.0, offset_y: 10.0, device_scale: 1.0 };
    // 30 model units right of node 3 is inside; 40 is outside.
    let inside = camera.model_to_screen(Point::new(230.0, 300.0));
    let outside = camera.model_to_screen(Point::new(240.0, 300.0));
    assert_eq!(hit_node(&plan(), camera.screen_to_model(inside)), Some(PersonId(3)));
    assert_eq!(hit_node(&plan(), camera.screen_to_model(outside)), None);
}
