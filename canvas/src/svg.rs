//! Retained-markup painter: a [`RenderPlan`] as a standalone SVG document.
//!
//! This is the static renderer behind share images. It has no state and no
//! clock, and numbers are printed with fixed precision, so the same plan
//! always yields the same bytes. The watermark is part of every document.

#[cfg(test)]
#[path = "svg_test.rs"]
mod svg_test;

use crate::consts::*;
use crate::doc::Diagram;
use crate::layout::{EdgePlan, LabelPlan, NodePlan, RenderPlan, layout};

const GRADIENT_STOPS: [(&str, &str); 3] = [("0", "#fce4ec"), ("0.5", "#f3e5f5"), ("1", "#e3f2fd")];

/// Lay out `diagram` at the share-card size and paint it.
#[must_use]
pub fn render_share_svg(diagram: &Diagram) -> String {
    render_svg(&layout(diagram, SHARE_WIDTH, SHARE_HEIGHT))
}

/// Paint a plan. Edges first, then nodes, then labels on top, then the watermark.
#[must_use]
pub fn render_svg(plan: &RenderPlan) -> String {
    let w = num(plan.width);
    let h = num(plan.height);
    let mut out = String::with_capacity(4096);

    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    ));
    out.push_str("<defs>");
    out.push_str(r#"<linearGradient id="bg" x1="0" y1="0" x2="1" y2="1">"#);
    for (offset, color) in GRADIENT_STOPS {
        out.push_str(&format!(r#"<stop offset="{offset}" stop-color="{color}"/>"#));
    }
    out.push_str("</linearGradient>");
    for node in plan.nodes.iter().filter(|n| n.image.is_some()) {
        out.push_str(&format!(
            r#"<clipPath id="avatar-{}"><circle cx="{}" cy="{}" r="{}"/></clipPath>"#,
            node.id.0,
            num(node.center.x),
            num(node.center.y),
            num(node.radius)
        ));
    }
    out.push_str("</defs>");
    out.push_str(&format!(r#"<rect width="{w}" height="{h}" fill="url(#bg)"/>"#));
    out.push_str(&format!(r#"<g font-family="{}">"#, escape_xml(FONT_FAMILY)));

    for edge in &plan.edges {
        paint_edge(&mut out, edge, plan.scale);
    }
    for node in &plan.nodes {
        paint_node(&mut out, node);
    }
    for label in plan.edges.iter().filter_map(|e| e.label.as_ref()) {
        paint_label(&mut out, label, plan.scale);
    }
    paint_watermark(&mut out, plan);

    out.push_str("</g></svg>");
    out
}

fn paint_edge(out: &mut String, edge: &EdgePlan, k: f64) {
    let s = edge.segment;
    out.push_str(&format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{EDGE_COLOR}" stroke-width="{}" stroke-linecap="round"/>"#,
        num(s.start.x),
        num(s.start.y),
        num(s.end.x),
        num(s.end.y),
        num(EDGE_WIDTH * k)
    ));
    let points: Vec<String> = edge.arrow.iter().map(|p| format!("{},{}", num(p.x), num(p.y))).collect();
    out.push_str(&format!(r#"<polygon points="{}" fill="{EDGE_COLOR}"/>"#, points.join(" ")));
}

fn paint_node(out: &mut String, node: &NodePlan) {
    let (cx, cy, r) = (num(node.center.x), num(node.center.y), num(node.radius));
    out.push_str(&format!(
        r##"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{}" stroke="#fff" stroke-width="{}"/>"##,
        escape_xml(&node.color),
        num(node.ring_width)
    ));

    match &node.image {
        Some(href) => {
            let size = num(node.radius * 2.0);
            out.push_str(&format!(
                r#"<image x="{}" y="{}" width="{size}" height="{size}" preserveAspectRatio="xMidYMid slice" clip-path="url(#avatar-{})" xlink:href="{}"/>"#,
                num(node.center.x - node.radius),
                num(node.center.y - node.radius),
                node.id.0,
                escape_xml(href)
            ));
        }
        None => {
            out.push_str(&format!(
                r##"<text x="{cx}" y="{cy}" font-size="{}" font-weight="bold" fill="#fff" text-anchor="middle" dominant-baseline="central">{}</text>"##,
                num(node.initial_font_size),
                escape_xml(&node.initial)
            ));
        }
    }

    out.push_str(&format!(
        r#"<text x="{}" y="{}" font-size="{}" font-weight="bold" fill="{TEXT_COLOR}" text-anchor="middle" dominant-baseline="central">{}</text>"#,
        num(node.name_anchor.x),
        num(node.name_anchor.y + node.name_font_size / 2.0),
        num(node.name_font_size),
        escape_xml(&node.name)
    ));
}

fn paint_label(out: &mut String, label: &LabelPlan, k: f64) {
    let b = label.bounds;
    out.push_str(&format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{LABEL_FILL}" stroke="{LABEL_BORDER}" stroke-width="{}"/>"#,
        num(b.x),
        num(b.y),
        num(b.width),
        num(b.height),
        num(4.0 * k),
        num(k)
    ));
    out.push_str(&format!(
        r#"<text x="{}" y="{}" font-size="{}" font-weight="bold" fill="{TEXT_COLOR}" text-anchor="middle" dominant-baseline="central">{}</text>"#,
        num(label.anchor.x),
        num(label.anchor.y),
        num(label.font_size),
        escape_xml(&label.text)
    ));
}

fn paint_watermark(out: &mut String, plan: &RenderPlan) {
    let inset = WATERMARK_INSET * plan.scale;
    out.push_str(&format!(
        r#"<text x="{}" y="{}" font-size="{}" fill="{WATERMARK_COLOR}" text-anchor="end">{WATERMARK_TEXT}</text>"#,
        num(plan.width - inset),
        num(plan.height - inset),
        num(WATERMARK_FONT_SIZE * plan.scale)
    ));
}

/// Fixed two-decimal formatting; negative zero prints as zero.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    if s == "-0.00" { "0.00".to_string() } else { s }
}

/// Escape text for element content and double-quoted attributes, dropping
/// characters XML 1.0 does not allow.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(c),
            c if c < '\u{20}' || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}
