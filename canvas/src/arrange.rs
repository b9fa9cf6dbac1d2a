//! Count-templated automatic placement.
//!
//! Not a force simulation: the positions depend only on how many people there
//! are and the canvas size, and index `i` always receives slot `i`.

#[cfg(test)]
#[path = "arrange_test.rs"]
mod arrange_test;

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::camera::Point;
use crate::consts::ARRANGE_MARGIN;

/// Compute `count` positions on a `width × height` canvas.
///
/// - 1: the center
/// - 2: the horizontal midline at one and two thirds of the width
/// - 3: a triangle at −90°, 30°, 150° on a circle of radius `min(w, h) / 3`
/// - more: evenly spaced clockwise from the top on radius `min(w, h) / 2.5`
///
/// Every position is clamped to [`ARRANGE_MARGIN`] from each edge.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn arrange_positions(count: usize, width: f64, height: f64) -> Vec<Point> {
    let cx = width / 2.0;
    let cy = height / 2.0;
    let short = width.min(height);

    let raw: Vec<Point> = match count {
        0 => Vec::new(),
        1 => vec![Point::new(cx, cy)],
        2 => vec![Point::new(width / 3.0, cy), Point::new(width * 2.0 / 3.0, cy)],
        3 => [-90.0_f64, 30.0, 150.0]
            .iter()
            .map(|deg| on_circle(cx, cy, short / 3.0, deg.to_radians()))
            .collect(),
        n => (0..n)
            .map(|i| on_circle(cx, cy, short / 2.5, (i as f64 / n as f64) * TAU - FRAC_PI_2))
            .collect(),
    };

    raw.into_iter().map(|p| clamp_to_margin(p, width, height)).collect()
}

fn on_circle(cx: f64, cy: f64, radius: f64, angle: f64) -> Point {
    Point::new(cx + radius * angle.cos(), cy + radius * angle.sin())
}

fn clamp_to_margin(p: Point, width: f64, height: f64) -> Point {
    let max_x = (width - ARRANGE_MARGIN).max(ARRANGE_MARGIN);
    let max_y = (height - ARRANGE_MARGIN).max(ARRANGE_MARGIN);
    Point::new(p.x.clamp(ARRANGE_MARGIN, max_x), p.y.clamp(ARRANGE_MARGIN, max_y))
}
