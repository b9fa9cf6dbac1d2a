//! Editing session: pointer/touch/keyboard gestures, model edits, redraw and
//! save scheduling.
//!
//! [`EngineCore`] holds all of it as plain data so it can be tested without a
//! browser. [`Engine`] adds the canvas element, its 2D context, the avatar
//! image cache, and the storage slot.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::avatar::{AvatarError, decode_avatar};
use crate::camera::{Camera, Point};
use crate::consts::*;
use crate::doc::{Diagram, DiagramError, Endpoint, PersonId, RelationshipId};
use crate::hit::{Hit, hit_test};
use crate::input::{Button, InputState, Key, Modifiers, WheelDelta};
use crate::layout::{RenderPlan, layout};
use crate::persistence::{DiagramStore, KeyValueStore, PersistError, SaveScheduler};
use crate::render::{self, ImageCache, Scene};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Action {
    /// Something visible changed; the next frame should draw.
    RenderNeeded,
    /// Set the canvas CSS cursor.
    SetCursor(String),
    /// Both ends of a new relationship are chosen; ask the user for a label
    /// and answer with [`EngineCore::submit_label`] or
    /// [`EngineCore::cancel_label`].
    PromptLabel { from: PersonId, to: PersonId },
    /// Show a non-fatal message.
    Warn(Warning),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    /// The relationship target was the source itself.
    SameEndpoint,
    /// An edit was refused by the model.
    Rejected(String),
    /// Storage refused the write; it stays pending and is retried.
    SaveFailed(String),
}

/// Anything that can go wrong applying an edit from the host.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Diagram(#[from] DiagramError),
    #[error(transparent)]
    Avatar(#[from] AvatarError),
}

/// What [`EngineCore::tick`] asks the frame loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick {
    pub draw: bool,
    pub save: bool,
}

/// Core engine state: all logic that doesn't depend on the canvas element.
pub struct EngineCore {
    pub diagram: Diagram,
    pub camera: Camera,
    pub input: InputState,
    /// Layout at the logical canvas size, in model units.
    pub plan: RenderPlan,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
    pub saver: SaveScheduler,
    needs_redraw: bool,
    save_failing: bool,
    cursor: &'static str,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_diagram(Diagram::starter())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_diagram(diagram: Diagram) -> Self {
        let plan = layout(&diagram, LOGICAL_WIDTH, LOGICAL_HEIGHT);
        Self {
            diagram,
            camera: Camera::default(),
            input: InputState::default(),
            plan,
            viewport_width: LOGICAL_WIDTH,
            viewport_height: LOGICAL_HEIGHT,
            dpr: 1.0,
            saver: SaveScheduler::default(),
            needs_redraw: true,
            save_failing: false,
            cursor: "default",
        }
    }

    // --- Session ---

    /// Replace the whole diagram (load, import). Not a user edit, so nothing
    /// is scheduled for saving.
    pub fn load_diagram(&mut self, diagram: Diagram) -> Vec<Action> {
        self.diagram = diagram;
        self.input = InputState::Idle;
        self.relayout();
        vec![Action::RenderNeeded]
    }

    /// Update viewport dimensions (CSS pixels) and device pixel ratio. The
    /// logical canvas is fitted into the viewport.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        let fit = (width_css / LOGICAL_WIDTH).min(height_css / LOGICAL_HEIGHT);
        self.camera.device_scale = if fit.is_finite() && fit > 0.0 { fit } else { 1.0 };
        self.redraw()
    }

    /// Advance the frame clock: whether to draw and whether to persist.
    pub fn tick(&mut self, now_ms: f64) -> Tick {
        let draw = std::mem::take(&mut self.needs_redraw);
        Tick { draw, save: self.saver.poll(now_ms) }
    }

    /// Write the diagram to `store`. Call when [`Tick::save`] is set or on
    /// teardown.
    pub fn save_to<S: KeyValueStore>(&mut self, store: &mut DiagramStore<S>) -> Vec<Action> {
        let result = store.save(&self.diagram);
        self.save_finished(result)
    }

    /// Record the outcome of a write. A failed write stays pending and is
    /// tried again after another debounce window. Only the first failure of
    /// a streak is reported, so a full quota does not warn every window.
    pub fn save_finished(&mut self, result: Result<(), PersistError>) -> Vec<Action> {
        match result {
            Ok(()) => {
                if std::mem::take(&mut self.save_failing) {
                    log::info!("saving diagram succeeded after earlier failures");
                }
                Vec::new()
            }
            Err(e) => {
                log::warn!("saving diagram failed, will retry: {e}");
                self.saver.mark_dirty();
                if std::mem::replace(&mut self.save_failing, true) {
                    Vec::new()
                } else {
                    vec![Action::Warn(Warning::SaveFailed(e.to_string()))]
                }
            }
        }
    }

    /// Whether the last write attempt failed.
    #[must_use]
    pub fn save_failing(&self) -> bool {
        self.save_failing
    }

    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    #[must_use]
    pub fn cursor(&self) -> &'static str {
        self.cursor
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button == Button::Secondary {
            return Vec::new();
        }
        let model = self.camera.screen_to_model(screen);
        let hit = hit_test(&self.plan, model);

        match self.input {
            InputState::PlacingRelationFrom => match hit {
                Some(Hit::Node(id)) => {
                    self.input = InputState::PlacingRelationTo { from: id };
                    self.redraw()
                }
                _ => Vec::new(),
            },
            InputState::PlacingRelationTo { from } => match hit {
                Some(Hit::Node(id)) if id == from => vec![Action::Warn(Warning::SameEndpoint)],
                Some(Hit::Node(to)) => {
                    self.input = InputState::AwaitingLabel { from, to };
                    let mut actions = self.redraw();
                    actions.push(Action::PromptLabel { from, to });
                    actions
                }
                _ => Vec::new(),
            },
            InputState::AwaitingLabel { .. } => Vec::new(),
            _ if button == Button::Middle => {
                self.input = InputState::Panning { last_screen: screen };
                self.set_cursor("grabbing").into_iter().collect()
            }
            _ => self.begin_gesture(screen, model, hit, modifiers),
        }
    }

    fn begin_gesture(&mut self, screen: Point, model: Point, hit: Option<Hit>, modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        match hit {
            Some(Hit::Node(id)) if modifiers.relation_chord() => {
                self.input = InputState::PlacingRelationTo { from: id };
                actions.extend(self.set_cursor("crosshair"));
                actions.extend(self.redraw());
                return actions;
            }
            Some(Hit::Label(id)) => {
                let Some(anchor) = self.plan.edge(id).and_then(|e| e.label.as_ref()).map(|l| l.anchor) else {
                    return actions;
                };
                self.input = InputState::DraggingLabel {
                    id,
                    grab_dx: anchor.x - model.x,
                    grab_dy: anchor.y - model.y,
                    moved: false,
                };
            }
            Some(Hit::Node(id)) => {
                let Some(center) = self.plan.node(id).map(|n| n.center) else {
                    return actions;
                };
                self.input = InputState::DraggingNode {
                    id,
                    grab_dx: center.x - model.x,
                    grab_dy: center.y - model.y,
                    moved: false,
                };
            }
            None => self.input = InputState::Panning { last_screen: screen },
        }
        actions.extend(self.set_cursor("grabbing"));
        actions
    }

    pub fn on_pointer_move(&mut self, screen: Point, _modifiers: Modifiers) -> Vec<Action> {
        let model = self.camera.screen_to_model(screen);
        match self.input {
            InputState::DraggingNode { id, grab_dx, grab_dy, .. } => {
                match self.diagram.move_person(id, model.x + grab_dx, model.y + grab_dy) {
                    Ok(_) => {
                        self.input = InputState::DraggingNode { id, grab_dx, grab_dy, moved: true };
                        self.changed()
                    }
                    Err(e) => self.abandon_drag(&e),
                }
            }
            InputState::DraggingLabel { id, grab_dx, grab_dy, .. } => {
                match self.diagram.move_label(id, model.x + grab_dx, model.y + grab_dy) {
                    Ok(()) => {
                        self.input = InputState::DraggingLabel { id, grab_dx, grab_dy, moved: true };
                        self.changed()
                    }
                    Err(e) => self.abandon_drag(&e),
                }
            }
            InputState::Panning { last_screen } => {
                self.camera.pan_by(screen.x - last_screen.x, screen.y - last_screen.y);
                self.input = InputState::Panning { last_screen: screen };
                self.redraw()
            }
            InputState::Idle => {
                let cursor = if hit_test(&self.plan, model).is_some() { "grab" } else { "default" };
                self.set_cursor(cursor).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, screen: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if !self.input.is_dragging() {
            return Vec::new();
        }
        self.end_drag();
        let model = self.camera.screen_to_model(screen);
        let cursor = if hit_test(&self.plan, model).is_some() { "grab" } else { "default" };
        self.set_cursor(cursor).into_iter().collect()
    }

    /// The pointer left the canvas: treat as release.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        if !self.input.is_dragging() {
            return Vec::new();
        }
        self.end_drag();
        self.set_cursor("default").into_iter().collect()
    }

    fn end_drag(&mut self) {
        if let InputState::DraggingNode { moved: true, .. } | InputState::DraggingLabel { moved: true, .. } =
            self.input
        {
            self.saver.request_flush();
        }
        self.input = InputState::Idle;
    }

    fn abandon_drag(&mut self, err: &DiagramError) -> Vec<Action> {
        log::warn!("drag target vanished: {err}");
        self.end_drag();
        self.set_cursor("default").into_iter().collect()
    }

    // --- Touch input ---

    /// `touches` are the active touch points in screen space.
    pub fn on_touch_start(&mut self, touches: &[Point]) -> Vec<Action> {
        match touches {
            [] => Vec::new(),
            [one] => self.on_pointer_down(*one, Button::Primary, Modifiers::default()),
            [a, b, ..] => {
                if self.input.is_dragging() {
                    self.end_drag();
                }
                if !self.input.is_placing_relation() {
                    self.input = InputState::Pinching { last_distance: a.distance(*b) };
                }
                Vec::new()
            }
        }
    }

    pub fn on_touch_move(&mut self, touches: &[Point]) -> Vec<Action> {
        match (self.input, touches) {
            (InputState::Pinching { last_distance }, [a, b, ..]) => {
                let distance = a.distance(*b);
                let factor = 1.0 + (distance - last_distance) * PINCH_SENSITIVITY;
                self.input = InputState::Pinching { last_distance: distance };
                if self.camera.zoom_at(factor, a.midpoint(*b)) { self.redraw() } else { Vec::new() }
            }
            (_, [one]) => self.on_pointer_move(*one, Modifiers::default()),
            _ => Vec::new(),
        }
    }

    /// `remaining` are the touches still down. Any pending write is flushed.
    pub fn on_touch_end(&mut self, remaining: &[Point]) -> Vec<Action> {
        let mut actions = Vec::new();
        if remaining.is_empty() || matches!(self.input, InputState::Pinching { .. }) {
            if self.input.is_dragging() {
                self.end_drag();
                actions.extend(self.set_cursor("default"));
            } else if matches!(self.input, InputState::Pinching { .. }) {
                self.input = InputState::Idle;
            }
        }
        self.saver.request_flush();
        actions
    }

    // --- Wheel / keyboard ---

    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        let factor = if delta.dy < 0.0 {
            WHEEL_ZOOM_IN
        } else if delta.dy > 0.0 {
            WHEEL_ZOOM_OUT
        } else {
            return Vec::new();
        };
        if self.camera.zoom_at(factor, screen) { self.redraw() } else { Vec::new() }
    }

    pub fn on_key_down(&mut self, key: Key, _modifiers: Modifiers) -> Vec<Action> {
        if key.is_escape() && self.input.is_placing_relation() {
            return self.cancel_relation_mode();
        }
        Vec::new()
    }

    // --- View buttons ---

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.zoom_about_center(ZOOM_BUTTON_STEP)
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.zoom_about_center(1.0 / ZOOM_BUTTON_STEP)
    }

    pub fn reset_view(&mut self) -> Vec<Action> {
        self.camera.reset();
        self.redraw()
    }

    fn zoom_about_center(&mut self, factor: f64) -> Vec<Action> {
        let center = Point::new(self.viewport_width * 0.5, self.viewport_height * 0.5);
        if self.camera.zoom_at(factor, center) { self.redraw() } else { Vec::new() }
    }

    // --- Relation placement ---

    pub fn begin_relation_mode(&mut self) -> Vec<Action> {
        self.input = InputState::PlacingRelationFrom;
        let mut actions: Vec<Action> = self.set_cursor("crosshair").into_iter().collect();
        actions.extend(self.redraw());
        actions
    }

    /// Leave relation placement from any of its states.
    pub fn cancel_relation_mode(&mut self) -> Vec<Action> {
        if !self.input.is_placing_relation() {
            return Vec::new();
        }
        self.input = InputState::Idle;
        let mut actions: Vec<Action> = self.set_cursor("default").into_iter().collect();
        actions.extend(self.redraw());
        actions
    }

    /// Answer to [`Action::PromptLabel`]. A blank label cancels.
    pub fn submit_label(&mut self, text: &str) -> Vec<Action> {
        let InputState::AwaitingLabel { from, to } = self.input else {
            return Vec::new();
        };
        let mut actions = self.cancel_relation_mode();
        if text.trim().is_empty() {
            return actions;
        }
        match self.diagram.add_relationship(from, to, text) {
            Ok(_) => actions.extend(self.changed()),
            Err(e) => {
                log::warn!("relationship {from} -> {to} refused: {e}");
                actions.push(Action::Warn(Warning::Rejected(e.to_string())));
            }
        }
        actions
    }

    pub fn cancel_label(&mut self) -> Vec<Action> {
        self.cancel_relation_mode()
    }

    // --- Model edits ---

    /// Add a person at the center of the visible area.
    ///
    /// # Errors
    ///
    /// [`DiagramError::EmptyName`].
    pub fn add_person(&mut self, name: &str, color: &str) -> Result<PersonId, DiagramError> {
        let center = self
            .camera
            .screen_to_model(Point::new(self.viewport_width * 0.5, self.viewport_height * 0.5));
        self.edit(|d| d.add_person(name, color, center).map(|p| p.id))
    }

    /// # Errors
    ///
    /// [`DiagramError::UnknownPerson`].
    pub fn delete_person(&mut self, id: PersonId) -> Result<(), DiagramError> {
        self.edit(|d| d.delete_person(id).map(drop))?;
        let (source, target) = self.input.relation_highlight();
        let dragging = matches!(self.input, InputState::DraggingNode { id: dragged, .. } if dragged == id);
        if dragging || source == Some(id) || target == Some(id) {
            self.input = InputState::Idle;
            self.cursor = "default";
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`DiagramError::EmptyName`] or [`DiagramError::UnknownPerson`].
    pub fn rename_person(&mut self, id: PersonId, name: &str) -> Result<(), DiagramError> {
        self.edit(|d| d.rename_person(id, name))
    }

    /// # Errors
    ///
    /// [`DiagramError::UnknownPerson`].
    pub fn set_person_color(&mut self, id: PersonId, color: &str) -> Result<(), DiagramError> {
        self.edit(|d| d.set_person_color(id, color))
    }

    /// Decode uploaded image bytes and attach them as the person's avatar.
    /// The person is looked up after decoding, so a deletion in between is
    /// reported rather than resurrected.
    ///
    /// # Errors
    ///
    /// [`EditError::Avatar`] for a bad image, [`EditError::Diagram`] if the
    /// person is gone.
    pub fn apply_avatar(&mut self, id: PersonId, bytes: &[u8]) -> Result<(), EditError> {
        let avatar = decode_avatar(bytes)?;
        log::info!("avatar for {id}: {} {}x{}", avatar.mime, avatar.width, avatar.height);
        self.edit(|d| d.set_person_image(id, avatar.data_url))?;
        Ok(())
    }

    /// # Errors
    ///
    /// [`DiagramError::UnknownPerson`].
    pub fn clear_avatar(&mut self, id: PersonId) -> Result<(), DiagramError> {
        self.edit(|d| d.clear_person_image(id))
    }

    pub fn auto_arrange(&mut self) -> Vec<Action> {
        self.diagram.auto_arrange();
        self.changed()
    }

    /// # Errors
    ///
    /// See [`Diagram::add_relationship`].
    pub fn add_relationship(&mut self, from: PersonId, to: PersonId, label: &str) -> Result<RelationshipId, DiagramError> {
        self.edit(|d| d.add_relationship(from, to, label).map(|r| r.id))
    }

    /// # Errors
    ///
    /// [`DiagramError::UnknownRelationship`].
    pub fn delete_relationship(&mut self, id: RelationshipId) -> Result<(), DiagramError> {
        self.edit(|d| d.delete_relationship(id).map(drop))?;
        if matches!(self.input, InputState::DraggingLabel { id: dragged, .. } if dragged == id) {
            self.input = InputState::Idle;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`DiagramError::EmptyLabel`] or [`DiagramError::UnknownRelationship`].
    pub fn relabel_relationship(&mut self, id: RelationshipId, label: &str) -> Result<(), DiagramError> {
        self.edit(|d| d.relabel_relationship(id, label))
    }

    /// # Errors
    ///
    /// See [`Diagram::reverse_relationship`].
    pub fn reverse_relationship(&mut self, id: RelationshipId) -> Result<(), DiagramError> {
        self.edit(|d| d.reverse_relationship(id))
    }

    /// # Errors
    ///
    /// See [`Diagram::set_relationship_target`].
    pub fn set_relationship_target(
        &mut self,
        id: RelationshipId,
        endpoint: Endpoint,
        person: PersonId,
    ) -> Result<(), DiagramError> {
        self.edit(|d| d.set_relationship_target(id, endpoint, person))
    }

    /// # Errors
    ///
    /// [`DiagramError::UnknownRelationship`].
    pub fn reset_label(&mut self, id: RelationshipId) -> Result<(), DiagramError> {
        self.edit(|d| d.reset_label(id))
    }

    // --- Queries ---

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Persons to highlight as relation source and target.
    #[must_use]
    pub fn highlight(&self) -> (Option<PersonId>, Option<PersonId>) {
        self.input.relation_highlight()
    }

    // --- Internals ---

    /// Run a fallible model edit; on success the plan is rebuilt and a save
    /// is scheduled. Failed edits leave the model untouched.
    fn edit<T>(&mut self, f: impl FnOnce(&mut Diagram) -> Result<T, DiagramError>) -> Result<T, DiagramError> {
        let out = f(&mut self.diagram)?;
        self.changed();
        Ok(out)
    }

    fn changed(&mut self) -> Vec<Action> {
        self.relayout();
        self.saver.mark_dirty();
        vec![Action::RenderNeeded]
    }

    fn relayout(&mut self) {
        self.plan = layout(&self.diagram, LOGICAL_WIDTH, LOGICAL_HEIGHT);
        self.needs_redraw = true;
    }

    fn redraw(&mut self) -> Vec<Action> {
        self.needs_redraw = true;
        vec![Action::RenderNeeded]
    }

    fn set_cursor(&mut self, cursor: &'static str) -> Option<Action> {
        if self.cursor == cursor {
            return None;
        }
        self.cursor = cursor;
        Some(Action::SetCursor(cursor.to_string()))
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas
/// element, its context, and the storage slot.
pub struct Engine<S> {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: ImageCache,
    store: DiagramStore<S>,
    pub core: EngineCore,
}

impl<S: KeyValueStore> Engine<S> {
    /// Bind to a canvas element and load the saved diagram (or the starter).
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement, store: DiagramStore<S>) -> Result<Self, JsValue> {
        let ctx = context_2d(&canvas)?;
        let core = EngineCore::with_diagram(store.load_or_default());
        Ok(Self { canvas, ctx, images: ImageCache::default(), store, core })
    }

    /// Resize the backing store to the viewport and refit the camera.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        let actions = self.core.set_viewport(width_css, height_css, dpr);
        let dpr = self.core.dpr;
        self.canvas.set_width(to_pixels(width_css * dpr));
        self.canvas.set_height(to_pixels(height_css * dpr));
        actions
    }

    /// One animation frame: draw if anything changed, write if a save is due.
    /// Returns the warnings a failed write produced.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a `Canvas2D` call fails.
    pub fn frame(&mut self, now_ms: f64) -> Result<Vec<Action>, JsValue> {
        let tick = self.core.tick(now_ms);
        let actions = if tick.save { self.core.save_to(&mut self.store) } else { Vec::new() };
        if tick.draw || self.images.take_loaded() {
            self.render()?;
        }
        Ok(actions)
    }

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a `Canvas2D` call fails.
    pub fn render(&mut self) -> Result<(), JsValue> {
        let (source, target) = self.core.highlight();
        let scene = Scene {
            plan: &self.core.plan,
            source,
            target,
            background: None,
        };
        let scale = self.core.dpr * self.core.camera.device_scale;
        render::draw(&self.ctx, &scene, &self.core.camera, scale, &mut self.images)
    }

    /// Paint the diagram at 3x onto an offscreen white canvas and return it
    /// as a PNG data URL.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the offscreen canvas cannot be created or painted.
    pub fn export_png_data_url(&mut self) -> Result<String, JsValue> {
        let width = LOGICAL_WIDTH * EXPORT_SCALE;
        let height = LOGICAL_HEIGHT * EXPORT_SCALE;
        let plan = layout(&self.core.diagram, width, height);

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let offscreen: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        offscreen.set_width(to_pixels(width));
        offscreen.set_height(to_pixels(height));
        let ctx = context_2d(&offscreen)?;

        let scene = Scene {
            plan: &plan,
            source: None,
            target: None,
            background: Some("#ffffff"),
        };
        render::draw(&ctx, &scene, &Camera::default(), 1.0, &mut self.images)?;
        offscreen.to_data_url_with_type("image/png")
    }

    /// Write any outstanding change now (page hide, teardown).
    pub fn flush_now(&mut self) -> Vec<Action> {
        if self.core.saver.take() {
            self.core.save_to(&mut self.store)
        } else {
            Vec::new()
        }
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_pixels(css: f64) -> u32 {
    css.round().max(0.0) as u32
}
