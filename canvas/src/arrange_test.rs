#![allow(clippy::float_cmp)]

use super::*;

fn near(p: Point, x: f64, y: f64) -> bool {
    (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9
}

#[test]
fn zero_people_yields_nothing() {
    assert!(arrange_positions(0, 800.0, 500.0).is_empty());
}

#[test]
fn single_person_is_centered() {
    let ps = arrange_positions(1, 800.0, 500.0);
    assert_eq!(ps.len(), 1);
    assert!(near(ps[0], 400.0, 250.0));
}

#[test]
fn two_people_sit_on_midline_thirds() {
    let ps = arrange_positions(2, 900.0, 500.0);
    assert!(near(ps[0], 300.0, 250.0));
    assert!(near(ps[1], 600.0, 250.0));
}

#[test]
fn three_people_form_triangle() {
    let ps = arrange_positions(3, 800.0, 500.0);
    let r = 500.0 / 3.0;
    // Top vertex first, then lower-right, then lower-left.
    assert!(near(ps[0], 400.0, 250.0 - r));
    assert!(ps[1].x > 400.0 && ps[1].y > 250.0);
    assert!(ps[2].x < 400.0 && ps[2].y > 250.0);
    assert!((ps[1].y - ps[2].y).abs() < 1e-9);
}

#[test]
fn four_people_on_circle_clockwise_from_top() {
    // Radius 200 around (400, 250); top and bottom clamp to the 80 margin.
    let ps = arrange_positions(4, 800.0, 500.0);
    assert_eq!(ps.len(), 4);
    assert!(near(ps[0], 400.0, 80.0));
    assert!(near(ps[1], 600.0, 250.0));
    assert!(near(ps[2], 400.0, 420.0));
    assert!(near(ps[3], 200.0, 250.0));
}

#[test]
fn many_people_stay_inside_margins() {
    for p in arrange_positions(17, 800.0, 500.0) {
        assert!(p.x >= ARRANGE_MARGIN && p.x <= 800.0 - ARRANGE_MARGIN);
        assert!(p.y >= ARRANGE_MARGIN && p.y <= 500.0 - ARRANGE_MARGIN);
    }
}

#[test]
fn placement_is_deterministic() {
    assert_eq!(arrange_positions(6, 800.0, 500.0), arrange_positions(6, 800.0, 500.0));
}
