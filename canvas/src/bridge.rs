//! WASM bridge: the `#[wasm_bindgen]` surface the page script talks to.
//!
//! Event handlers return the engine's [`Action`]s as a JSON array string; the
//! script applies cursors, prompts for labels, and shows warnings. Model
//! operations return `Err(message)` when the edit is refused.

use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, Storage};

use crate::camera::Point;
use crate::doc::{Diagram, Endpoint, PersonId, RelationshipId};
use crate::engine::{Action, Engine};
use crate::input::{Button, Key, Modifiers, WheelDelta};
use crate::persistence::{DiagramStore, KeyValueStore, PersistError};
use crate::share::{self, SharePayload};

// =============================================================
// localStorage
// =============================================================

/// `window.localStorage`, when the browser allows it.
pub struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    #[must_use]
    pub fn open() -> Self {
        let storage = match web_sys::window().map(|w| w.local_storage()) {
            Some(Ok(storage)) => storage,
            Some(Err(e)) => {
                log::warn!("localStorage refused: {}", js_message(&e));
                None
            }
            None => None,
        };
        Self { storage }
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| PersistError::Unavailable("localStorage".into()))?;
        storage
            .get_item(key)
            .map_err(|e| PersistError::Unavailable(js_message(&e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| PersistError::Unavailable("localStorage".into()))?;
        storage
            .set_item(key, value)
            .map_err(|e| PersistError::Write(js_message(&e)))
    }
}

// =============================================================
// Canvas controller
// =============================================================

/// One editing session bound to a `<canvas>`.
#[wasm_bindgen]
pub struct DiagramCanvas {
    engine: Engine<LocalStorage>,
}

#[wasm_bindgen]
impl DiagramCanvas {
    /// Bind to `canvas` and restore the saved diagram.
    ///
    /// # Errors
    ///
    /// Fails if the canvas has no 2D context.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement) -> Result<DiagramCanvas, JsValue> {
        init_logging();
        let store = DiagramStore::new(LocalStorage::open());
        Ok(Self { engine: Engine::new(canvas, store)? })
    }

    // --- Frame loop ---

    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> String {
        actions_json(&self.engine.set_viewport(width_css, height_css, dpr))
    }

    /// Call from `requestAnimationFrame`.
    ///
    /// # Errors
    ///
    /// Propagates `Canvas2D` failures.
    pub fn frame(&mut self, now_ms: f64) -> Result<String, JsValue> {
        self.engine.frame(now_ms).map(|actions| actions_json(&actions))
    }

    /// Write pending changes immediately (`pagehide`, `beforeunload`).
    pub fn flush(&mut self) -> String {
        actions_json(&self.engine.flush_now())
    }

    // --- Pointer, touch, wheel, keys ---

    #[allow(clippy::fn_params_excessive_bools, clippy::too_many_arguments)]
    pub fn pointer_down(&mut self, x: f64, y: f64, button: i16, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let modifiers = Modifiers { shift, ctrl, alt, meta };
        actions_json(&self.engine.core.on_pointer_down(Point::new(x, y), Button::from_dom(button), modifiers))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> String {
        actions_json(&self.engine.core.on_pointer_move(Point::new(x, y), Modifiers::default()))
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, button: i16) -> String {
        actions_json(&self.engine.core.on_pointer_up(Point::new(x, y), Button::from_dom(button), Modifiers::default()))
    }

    pub fn pointer_leave(&mut self) -> String {
        actions_json(&self.engine.core.on_pointer_leave())
    }

    /// `coords` is the active touches flattened as `[x0, y0, x1, y1, ...]`.
    pub fn touch_start(&mut self, coords: &[f64]) -> String {
        actions_json(&self.engine.core.on_touch_start(&touch_points(coords)))
    }

    pub fn touch_move(&mut self, coords: &[f64]) -> String {
        actions_json(&self.engine.core.on_touch_move(&touch_points(coords)))
    }

    pub fn touch_end(&mut self, coords: &[f64]) -> String {
        actions_json(&self.engine.core.on_touch_end(&touch_points(coords)))
    }

    pub fn wheel(&mut self, x: f64, y: f64, dx: f64, dy: f64) -> String {
        actions_json(&self.engine.core.on_wheel(Point::new(x, y), WheelDelta { dx, dy }, Modifiers::default()))
    }

    pub fn key_down(&mut self, key: String) -> String {
        actions_json(&self.engine.core.on_key_down(Key(key), Modifiers::default()))
    }

    // --- View buttons ---

    pub fn zoom_in(&mut self) -> String {
        actions_json(&self.engine.core.zoom_in())
    }

    pub fn zoom_out(&mut self) -> String {
        actions_json(&self.engine.core.zoom_out())
    }

    pub fn reset_view(&mut self) -> String {
        actions_json(&self.engine.core.reset_view())
    }

    // --- Relation placement ---

    pub fn begin_relation_mode(&mut self) -> String {
        actions_json(&self.engine.core.begin_relation_mode())
    }

    pub fn cancel_relation_mode(&mut self) -> String {
        actions_json(&self.engine.core.cancel_relation_mode())
    }

    pub fn submit_label(&mut self, text: &str) -> String {
        actions_json(&self.engine.core.submit_label(text))
    }

    pub fn cancel_label(&mut self) -> String {
        actions_json(&self.engine.core.cancel_label())
    }

    // --- People ---

    /// # Errors
    ///
    /// Fails on a blank name.
    pub fn add_person(&mut self, name: &str, color: &str) -> Result<u32, JsValue> {
        let id = self.engine.core.add_person(name, color).map_err(js_error)?;
        u32::try_from(id.0).map_err(js_error)
    }

    /// # Errors
    ///
    /// Fails if the person does not exist.
    pub fn delete_person(&mut self, id: u32) -> Result<(), JsValue> {
        self.engine.core.delete_person(person(id)).map_err(js_error)
    }

    /// # Errors
    ///
    /// Fails on a blank name or unknown person.
    pub fn rename_person(&mut self, id: u32, name: &str) -> Result<(), JsValue> {
        self.engine.core.rename_person(person(id), name).map_err(js_error)
    }

    /// # Errors
    ///
    /// Fails if the person does not exist.
    pub fn set_person_color(&mut self, id: u32, color: &str) -> Result<(), JsValue> {
        self.engine.core.set_person_color(person(id), color).map_err(js_error)
    }

    /// Attach an uploaded image file's bytes as the person's avatar.
    ///
    /// # Errors
    ///
    /// Fails on unsupported or oversized images, or if the person is gone.
    pub fn upload_avatar(&mut self, id: u32, bytes: &[u8]) -> Result<(), JsValue> {
        self.engine.core.apply_avatar(person(id), bytes).map_err(js_error)
    }

    /// # Errors
    ///
    /// Fails if the person does not exist.
    pub fn clear_avatar(&mut self, id: u32) -> Result<(), JsValue> {
        self.engine.core.clear_avatar(person(id)).map_err(js_error)
    }

    pub fn auto_arrange(&mut self) -> String {
        actions_json(&self.engine.core.auto_arrange())
    }

    // --- Relationships ---

    /// # Errors
    ///
    /// Fails on self-loops, unknown people, blank labels, or duplicates.
    pub fn add_relationship(&mut self, from: u32, to: u32, label: &str) -> Result<u32, JsValue> {
        let id = self
            .engine
            .core
            .add_relationship(person(from), person(to), label)
            .map_err(js_error)?;
        u32::try_from(id.0).map_err(js_error)
    }

    /// # Errors
    ///
    /// Fails if the relationship does not exist.
    pub fn delete_relationship(&mut self, id: u32) -> Result<(), JsValue> {
        self.engine.core.delete_relationship(relationship(id)).map_err(js_error)
    }

    /// # Errors
    ///
    /// Fails on a blank label or unknown relationship.
    pub fn relabel_relationship(&mut self, id: u32, label: &str) -> Result<(), JsValue> {
        self.engine.core.relabel_relationship(relationship(id), label).map_err(js_error)
    }

    /// # Errors
    ///
    /// Fails if the reversed direction already exists.
    pub fn reverse_relationship(&mut self, id: u32) -> Result<(), JsValue> {
        self.engine.core.reverse_relationship(relationship(id)).map_err(js_error)
    }

    /// `endpoint` is `"from"` or `"to"`.
    ///
    /// # Errors
    ///
    /// Fails on an unknown endpoint name or a refused edit.
    pub fn set_relationship_target(&mut self, id: u32, endpoint: &str, person_id: u32) -> Result<(), JsValue> {
        let endpoint = match endpoint {
            "from" => Endpoint::From,
            "to" => Endpoint::To,
            other => return Err(JsValue::from_str(&format!("unknown endpoint {other:?}"))),
        };
        self.engine
            .core
            .set_relationship_target(relationship(id), endpoint, person(person_id))
            .map_err(js_error)
    }

    /// # Errors
    ///
    /// Fails if the relationship does not exist.
    pub fn reset_label(&mut self, id: u32) -> Result<(), JsValue> {
        self.engine.core.reset_label(relationship(id)).map_err(js_error)
    }

    // --- Import / export ---

    /// The diagram as JSON.
    ///
    /// # Errors
    ///
    /// Fails if serialization fails.
    pub fn diagram_json(&self) -> Result<String, JsValue> {
        self.engine.core.diagram.to_json().map_err(js_error)
    }

    /// Replace the diagram with `json` (sanitized). The result is saved.
    ///
    /// # Errors
    ///
    /// Fails if `json` is not a diagram.
    pub fn import_json(&mut self, json: &str) -> Result<String, JsValue> {
        let diagram = Diagram::from_json(json).map_err(js_error)?;
        Ok(self.replace(diagram))
    }

    /// Replace the diagram with the one carried by a share link's query.
    ///
    /// # Errors
    ///
    /// Fails if the query has no share payload or it does not decode.
    pub fn import_share(&mut self, query: &str) -> Result<String, JsValue> {
        let diagram = SharePayload::from_query(query)
            .and_then(|p| p.decode())
            .map_err(js_error)?;
        Ok(self.replace(diagram))
    }

    /// `d=<encoded>` for building share and image links.
    ///
    /// # Errors
    ///
    /// Fails if serialization fails.
    pub fn share_query(&self) -> Result<String, JsValue> {
        share::share_query(&self.engine.core.diagram).map_err(js_error)
    }

    /// PNG data URL of the diagram at export resolution.
    ///
    /// # Errors
    ///
    /// Propagates `Canvas2D` failures.
    pub fn export_png(&mut self) -> Result<String, JsValue> {
        self.engine.export_png_data_url()
    }
}

impl DiagramCanvas {
    fn replace(&mut self, diagram: Diagram) -> String {
        let actions = self.engine.core.load_diagram(diagram);
        self.engine.core.saver.mark_dirty();
        self.engine.core.saver.request_flush();
        actions_json(&actions)
    }
}

// =============================================================
// Helpers
// =============================================================

fn init_logging() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        // Already installed by an earlier instance.
        log::debug!("console_log: {e}");
    }
}

fn actions_json(actions: &[Action]) -> String {
    match serde_json::to_string(actions) {
        Ok(json) => json,
        Err(e) => {
            log::error!("could not encode actions: {e}");
            "[]".to_string()
        }
    }
}

fn touch_points(coords: &[f64]) -> Vec<Point> {
    coords.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect()
}

fn person(id: u32) -> PersonId {
    PersonId(u64::from(id))
}

fn relationship(id: u32) -> RelationshipId {
    RelationshipId(u64::from(id))
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
