//! Relationship diagram editor: model, geometry, and rendering.
//!
//! This crate is compiled to WebAssembly for the editor page and linked
//! natively by the image server. The browser side owns the full lifecycle of
//! the canvas: translating raw DOM input events into diagram edits,
//! maintaining camera state for pan/zoom, hit-testing nodes and labels,
//! painting, and saving to `localStorage`. The page script only wires DOM
//! events to [`bridge::DiagramCanvas`] and acts on the returned
//! [`engine::Action`]s. The server uses [`share`], [`layout`], and [`svg`]
//! to turn a share link into an image.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`doc`] | People, relationships, and the validated edit operations |
//! | [`layout`] | Geometry engine: a diagram to a resolution-independent render plan |
//! | [`arrange`] | Count-templated automatic placement |
//! | [`engine`] | Editing session and testable [`engine::EngineCore`] |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing labels and nodes in a render plan |
//! | [`render`] | Canvas2D painter |
//! | [`svg`] | SVG painter for share images |
//! | [`share`] | Share-link encoding and legacy decoding |
//! | [`persistence`] | Key-value storage slot and save debouncing |
//! | [`avatar`] | Avatar upload validation |
//! | [`bridge`] | `wasm-bindgen` surface for the page script |
//! | [`consts`] | Shared constants (canvas size, colors, zoom limits, etc.) |

pub mod arrange;
pub mod avatar;
pub mod bridge;
pub mod camera;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod layout;
pub mod persistence;
pub mod render;
pub mod share;
pub mod svg;
