#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{ZOOM_MAX, ZOOM_MIN};

/// A point in screen, model, or render-target space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Midpoint between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

/// Pan/zoom state of the interactive view.
///
/// `offset_x` / `offset_y` are in model units and applied after `zoom`.
/// `device_scale` is CSS pixels per logical unit (the viewport fit); device
/// pixel ratio is handled by the painter, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub zoom: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub device_scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { zoom: 1.0, offset_x: 0.0, offset_y: 0.0, device_scale: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point (CSS pixels) to model coordinates.
    #[must_use]
    pub fn screen_to_model(&self, screen: Point) -> Point {
        Point {
            x: (screen.x / self.device_scale - self.offset_x * self.zoom) / self.zoom,
            y: (screen.y / self.device_scale - self.offset_y * self.zoom) / self.zoom,
        }
    }

    /// Convert a model-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn model_to_screen(&self, model: Point) -> Point {
        Point {
            x: (model.x + self.offset_x) * self.zoom * self.device_scale,
            y: (model.y + self.offset_y) * self.zoom * self.device_scale,
        }
    }

    /// Multiply the zoom by `factor`, keeping the model point under `anchor`
    /// (screen space) fixed. Returns whether the zoom actually changed.
    pub fn zoom_at(&mut self, factor: f64, anchor: Point) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let next = (self.zoom * factor).clamp(ZOOM_MIN, ZOOM_MAX);
        if (next - self.zoom).abs() < f64::EPSILON {
            return false;
        }
        let pinned = self.screen_to_model(anchor);
        let screen_x = anchor.x / self.device_scale;
        let screen_y = anchor.y / self.device_scale;
        self.zoom = next;
        self.offset_x = screen_x / next - pinned.x;
        self.offset_y = screen_y / next - pinned.y;
        true
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, dx_screen: f64, dy_screen: f64) {
        let per_unit = self.zoom * self.device_scale;
        self.offset_x += dx_screen / per_unit;
        self.offset_y += dy_screen / per_unit;
    }

    /// Back to zoom 1 with no offset. The device scale is left alone.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.offset_x = 0.0;
        self.offset_y = 0.0;
    }
}
