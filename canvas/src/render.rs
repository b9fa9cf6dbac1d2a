//! Rendering: paints a [`RenderPlan`] onto a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It reads the plan, the camera, and the relation highlight and produces
//! pixels. It does not mutate any application state apart from the avatar
//! image cache.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level callers ([`crate::engine::Engine::render`] and the PNG export)
//! handle the result.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::camera::{Camera, Point};
use crate::consts::*;
use crate::doc::PersonId;
use crate::layout::{EdgePlan, LabelPlan, NodePlan, Rect, RenderPlan};

/// Corner radius of label boxes, in plan units at scale 1.
const LABEL_CORNER_RADIUS: f64 = 4.0;

/// Extra width of the relation highlight ring over the white ring.
const HIGHLIGHT_EXTRA_WIDTH: f64 = 2.0;

/// Everything one paint needs besides the camera.
pub struct Scene<'a> {
    pub plan: &'a RenderPlan,
    /// Relation source to highlight.
    pub source: Option<PersonId>,
    /// Relation target to highlight.
    pub target: Option<PersonId>,
    /// Fill the whole surface first; `None` leaves it transparent.
    pub background: Option<&'a str>,
}

/// Avatar images keyed by data URL.
///
/// The browser decodes asynchronously. Until an image reports `complete`
/// the node is painted with its initial instead; [`ImageCache::take_loaded`]
/// tells the frame loop when a repaint would show something new.
#[derive(Default)]
pub struct ImageCache {
    images: HashMap<String, HtmlImageElement>,
    pending: HashSet<String>,
}

impl ImageCache {
    /// The decoded image for `src`, starting a load on first sight.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the image element cannot be created.
    pub fn ready(&mut self, src: &str) -> Result<Option<&HtmlImageElement>, JsValue> {
        if !self.images.contains_key(src) {
            let img = HtmlImageElement::new()?;
            img.set_src(src);
            self.images.insert(src.to_string(), img);
            self.pending.insert(src.to_string());
        }
        Ok(self.images.get(src).filter(|img| img.complete() && img.natural_width() > 0))
    }

    /// Whether any pending image has finished since the last call.
    pub fn take_loaded(&mut self) -> bool {
        let before = self.pending.len();
        let images = &self.images;
        self.pending
            .retain(|src| images.get(src).is_some_and(|img| !img.complete()));
        self.pending.len() != before
    }

    /// Forget images no longer referenced by any node.
    pub fn retain_used(&mut self, plan: &RenderPlan) {
        let used: HashSet<&str> = plan.nodes.iter().filter_map(|n| n.image.as_deref()).collect();
        self.images.retain(|src, _| used.contains(src.as_str()));
        self.pending.retain(|src| used.contains(src.as_str()));
    }
}

/// Draw the full scene.
///
/// `scale` maps plan units to backing-store pixels before the camera is
/// applied: device pixel ratio times the viewport fit for the interactive
/// view, 1 for exports.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    scene: &Scene<'_>,
    camera: &Camera,
    scale: f64,
    images: &mut ImageCache,
) -> Result<(), JsValue> {
    // Layer 1: clear in pixel space.
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    if let Some(canvas) = ctx.canvas() {
        let (w, h) = (f64::from(canvas.width()), f64::from(canvas.height()));
        ctx.clear_rect(0.0, 0.0, w, h);
        if let Some(fill) = scene.background {
            ctx.set_fill_style_str(fill);
            ctx.fill_rect(0.0, 0.0, w, h);
        }
    }

    // Layer 2: plan space.
    ctx.set_transform(scale, 0.0, 0.0, scale, 0.0, 0.0)?;
    ctx.scale(camera.zoom, camera.zoom)?;
    ctx.translate(camera.offset_x, camera.offset_y)?;

    let plan = scene.plan;
    images.retain_used(plan);

    for edge in &plan.edges {
        draw_edge(ctx, edge, plan.scale);
    }
    for node in &plan.nodes {
        let ring = if scene.source == Some(node.id) {
            Some(SOURCE_HIGHLIGHT)
        } else if scene.target == Some(node.id) {
            Some(TARGET_HIGHLIGHT)
        } else {
            None
        };
        draw_node(ctx, node, ring, images)?;
    }
    // Labels last so they stay readable over nodes.
    for label in plan.edges.iter().filter_map(|e| e.label.as_ref()) {
        draw_label(ctx, label, plan.scale)?;
    }

    Ok(())
}

// =============================================================
// Edges
// =============================================================

fn draw_edge(ctx: &CanvasRenderingContext2d, edge: &EdgePlan, k: f64) {
    let s = edge.segment;
    ctx.set_stroke_style_str(EDGE_COLOR);
    ctx.set_line_width(EDGE_WIDTH * k);
    ctx.set_line_cap("round");
    ctx.begin_path();
    ctx.move_to(s.start.x, s.start.y);
    ctx.line_to(s.end.x, s.end.y);
    ctx.stroke();

    let [tip, left, right] = edge.arrow;
    ctx.set_fill_style_str(EDGE_COLOR);
    ctx.begin_path();
    ctx.move_to(tip.x, tip.y);
    ctx.line_to(left.x, left.y);
    ctx.line_to(right.x, right.y);
    ctx.close_path();
    ctx.fill();
}

// =============================================================
// Nodes
// =============================================================

fn draw_node(
    ctx: &CanvasRenderingContext2d,
    node: &NodePlan,
    highlight: Option<&str>,
    images: &mut ImageCache,
) -> Result<(), JsValue> {
    let Point { x: cx, y: cy } = node.center;
    let r = node.radius;

    circle_path(ctx, node.center, r)?;
    ctx.set_fill_style_str(&node.color);
    ctx.fill();

    let avatar = match &node.image {
        Some(src) => images.ready(src)?,
        None => None,
    };
    if let Some(img) = avatar {
        ctx.save();
        circle_path(ctx, node.center, r)?;
        ctx.clip();
        ctx.draw_image_with_html_image_element_and_dw_and_dh(img, cx - r, cy - r, r * 2.0, r * 2.0)?;
        ctx.restore();
    } else {
        ctx.set_fill_style_str("#fff");
        ctx.set_font(&font(node.initial_font_size));
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        ctx.fill_text(&node.initial, cx, cy)?;
    }

    circle_path(ctx, node.center, r)?;
    ctx.set_stroke_style_str("#fff");
    ctx.set_line_width(node.ring_width);
    ctx.stroke();

    if let Some(color) = highlight {
        circle_path(ctx, node.center, r + node.ring_width)?;
        ctx.set_stroke_style_str(color);
        ctx.set_line_width(node.ring_width + HIGHLIGHT_EXTRA_WIDTH);
        ctx.stroke();
    }

    ctx.set_fill_style_str(TEXT_COLOR);
    ctx.set_font(&font(node.name_font_size));
    ctx.set_text_align("center");
    ctx.set_text_baseline("top");
    ctx.fill_text(&node.name, node.name_anchor.x, node.name_anchor.y)?;
    Ok(())
}

fn circle_path(ctx: &CanvasRenderingContext2d, center: Point, r: f64) -> Result<(), JsValue> {
    ctx.begin_path();
    ctx.arc(center.x, center.y, r, 0.0, 2.0 * PI)
}

// =============================================================
// Labels
// =============================================================

fn draw_label(ctx: &CanvasRenderingContext2d, label: &LabelPlan, k: f64) -> Result<(), JsValue> {
    rounded_rect_path(ctx, label.bounds, LABEL_CORNER_RADIUS * k)?;
    ctx.set_fill_style_str(LABEL_FILL);
    ctx.fill();
    ctx.set_stroke_style_str(LABEL_BORDER);
    ctx.set_line_width(k);
    ctx.stroke();

    ctx.set_fill_style_str(TEXT_COLOR);
    ctx.set_font(&font(label.font_size));
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.fill_text(&label.text, label.anchor.x, label.anchor.y)
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, b: Rect, r: f64) -> Result<(), JsValue> {
    let r = r.min(b.width * 0.5).min(b.height * 0.5);
    let (right, bottom) = (b.x + b.width, b.y + b.height);
    ctx.begin_path();
    ctx.move_to(b.x + r, b.y);
    ctx.arc_to(right, b.y, right, bottom, r)?;
    ctx.arc_to(right, bottom, b.x, bottom, r)?;
    ctx.arc_to(b.x, bottom, b.x, b.y, r)?;
    ctx.arc_to(b.x, b.y, right, b.y, r)?;
    ctx.close_path();
    Ok(())
}

fn font(size: f64) -> String {
    format!("bold {size:.1}px {FONT_FAMILY}")
}
