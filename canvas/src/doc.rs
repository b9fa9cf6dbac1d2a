//! Diagram model: people, relationships, and their mutation operations.
//!
//! A [`Diagram`] is the whole document. It is what gets persisted, what gets
//! encoded into share links, and the only input of the geometry engine.
//!
//! Every mutating method validates first and either applies completely or
//! returns a [`DiagramError`] with the diagram untouched. Callers (the engine)
//! are responsible for scheduling persistence and redraws after a success.
//!
//! On the wire a relationship's label position is a pair of nullable
//! `labelOffsetX` / `labelOffsetY` numbers. In memory it is the explicit
//! [`LabelPosition`] enum so the "no override" case can never leak into math.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::arrange::arrange_positions;
use crate::avatar::is_avatar_data_url;
use crate::camera::Point;
use crate::consts::{DEFAULT_NODE_COLOR, DRAG_MARGIN_X, DRAG_MARGIN_Y, LOGICAL_HEIGHT, LOGICAL_WIDTH, PALETTE};

/// Largest id either id space hands out. Ids stay exact as JavaScript numbers.
pub const MAX_ID: u64 = (1 << 53) - 1;

/// Identifier of a person. Separate id space from relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

/// Identifier of a relationship. Separate id space from people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub u64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "person#{}", self.0)
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relationship#{}", self.0)
    }
}

/// A node of the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    /// Center x in logical canvas units.
    pub x: f64,
    /// Center y in logical canvas units.
    pub y: f64,
    #[serde(default = "default_color")]
    pub color: String,
    /// Avatar as a data URL. Never required for rendering.
    #[serde(default)]
    pub image: Option<String>,
}

impl Person {
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// First character of the name, drawn when there is no avatar.
    #[must_use]
    pub fn initial(&self) -> String {
        self.name.chars().next().map(String::from).unwrap_or_default()
    }
}

fn default_color() -> String {
    DEFAULT_NODE_COLOR.to_string()
}

/// Where a relationship's label is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LabelPosition {
    /// Computed by the geometry engine from the edge.
    #[default]
    Default,
    /// Dragged by the user; an absolute logical position.
    Overridden { x: f64, y: f64 },
}

/// A directed, labeled edge between two people.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RelationshipWire", into = "RelationshipWire")]
pub struct Relationship {
    pub id: RelationshipId,
    pub from: PersonId,
    pub to: PersonId,
    pub label: String,
    pub label_position: LabelPosition,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelationshipWire {
    id: RelationshipId,
    from: PersonId,
    to: PersonId,
    #[serde(default)]
    label: String,
    #[serde(default)]
    label_offset_x: Option<f64>,
    #[serde(default)]
    label_offset_y: Option<f64>,
}

impl From<RelationshipWire> for Relationship {
    fn from(w: RelationshipWire) -> Self {
        let label_position = match (w.label_offset_x, w.label_offset_y) {
            (Some(x), Some(y)) => LabelPosition::Overridden { x, y },
            _ => LabelPosition::Default,
        };
        Self { id: w.id, from: w.from, to: w.to, label: w.label, label_position }
    }
}

impl From<Relationship> for RelationshipWire {
    fn from(r: Relationship) -> Self {
        let (label_offset_x, label_offset_y) = match r.label_position {
            LabelPosition::Default => (None, None),
            LabelPosition::Overridden { x, y } => (Some(x), Some(y)),
        };
        Self { id: r.id, from: r.from, to: r.to, label: r.label, label_offset_x, label_offset_y }
    }
}

/// Which end of a relationship to repoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    From,
    To,
}

/// Rejected mutation. The diagram is unchanged whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagramError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("label must not be empty")]
    EmptyLabel,
    #[error("{0} cannot be related to itself")]
    SelfLoop(PersonId),
    #[error("{0} not found")]
    UnknownPerson(PersonId),
    #[error("{0} not found")]
    UnknownRelationship(RelationshipId),
    #[error("a relationship from {from} to {to} already exists")]
    DuplicateRelationship { from: PersonId, to: PersonId },
    #[error("avatar must be an inline png, jpeg, gif or webp image")]
    UnsupportedImage,
    #[error("no ids left above the current maximum")]
    IdsExhausted,
}

/// The whole document: people and the relationships between them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Diagram {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The diagram shown to a first-time visitor.
    #[must_use]
    pub fn starter() -> Self {
        let cx = LOGICAL_WIDTH / 2.0;
        let cy = LOGICAL_HEIGHT / 2.0;
        let person = |id, name: &str, x, y, color: &str| Person {
            id: PersonId(id),
            name: name.to_string(),
            x,
            y,
            color: color.to_string(),
            image: None,
        };
        let rel = |id, from, to, label: &str| Relationship {
            id: RelationshipId(id),
            from: PersonId(from),
            to: PersonId(to),
            label: label.to_string(),
            label_position: LabelPosition::Default,
        };
        Self {
            people: vec![
                person(1, "太郎", cx - 150.0, cy - 75.0, PALETTE[0]),
                person(2, "花子", cx + 150.0, cy - 75.0, PALETTE[1]),
                person(3, "次郎", cx, cy + 100.0, PALETTE[2]),
            ],
            relationships: vec![rel(1, 1, 2, "憧れている"), rel(2, 2, 3, "親友"), rel(3, 3, 1, "ライバル視")],
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    /// Whether a relationship `from → to` exists, ignoring `except`.
    #[must_use]
    pub fn has_direction(&self, from: PersonId, to: PersonId, except: Option<RelationshipId>) -> bool {
        self.relationships
            .iter()
            .any(|r| r.from == from && r.to == to && Some(r.id) != except)
    }

    /// Next free person id: one past the current maximum.
    ///
    /// # Errors
    ///
    /// [`DiagramError::IdsExhausted`] once the maximum is [`MAX_ID`].
    pub fn next_person_id(&self) -> Result<PersonId, DiagramError> {
        next_id(self.people.iter().map(|p| p.id.0)).map(PersonId)
    }

    /// Next free relationship id: one past the current maximum.
    ///
    /// # Errors
    ///
    /// [`DiagramError::IdsExhausted`] once the maximum is [`MAX_ID`].
    pub fn next_relationship_id(&self) -> Result<RelationshipId, DiagramError> {
        next_id(self.relationships.iter().map(|r| r.id.0)).map(RelationshipId)
    }

    // --- People ---

    /// Add a person at `at`, clamped to the draggable area.
    ///
    /// # Errors
    ///
    /// [`DiagramError::EmptyName`] if `name` is blank,
    /// [`DiagramError::IdsExhausted`] if no id is left.
    pub fn add_person(&mut self, name: &str, color: &str, at: Point) -> Result<&Person, DiagramError> {
        let name = non_empty(name, DiagramError::EmptyName)?;
        let id = self.next_person_id()?;
        let (x, y) = clamp_to_canvas(at.x, at.y);
        let person = Person {
            id,
            name,
            x,
            y,
            color: color.to_string(),
            image: None,
        };
        self.people.push(person);
        Ok(&self.people[self.people.len() - 1])
    }

    /// Remove a person and every relationship touching them.
    ///
    /// # Errors
    ///
    /// [`DiagramError::UnknownPerson`] if no such person exists.
    pub fn delete_person(&mut self, id: PersonId) -> Result<Person, DiagramError> {
        let index = self
            .people
            .iter()
            .position(|p| p.id == id)
            .ok_or(DiagramError::UnknownPerson(id))?;
        self.relationships.retain(|r| r.from != id && r.to != id);
        Ok(self.people.remove(index))
    }

    /// # Errors
    ///
    /// [`DiagramError::EmptyName`] or [`DiagramError::UnknownPerson`].
    pub fn rename_person(&mut self, id: PersonId, name: &str) -> Result<(), DiagramError> {
        let name = non_empty(name, DiagramError::EmptyName)?;
        self.person_mut(id)?.name = name;
        Ok(())
    }

    /// # Errors
    ///
    /// [`DiagramError::UnknownPerson`].
    pub fn set_person_color(&mut self, id: PersonId, color: &str) -> Result<(), DiagramError> {
        self.person_mut(id)?.color = color.to_string();
        Ok(())
    }

    /// Attach a decoded avatar. Fails if the person was deleted meanwhile.
    ///
    /// # Errors
    ///
    /// [`DiagramError::UnknownPerson`], or [`DiagramError::UnsupportedImage`]
    /// if `data_url` is not an inline image.
    pub fn set_person_image(&mut self, id: PersonId, data_url: String) -> Result<(), DiagramError> {
        let person = self.person_mut(id)?;
        if !is_avatar_data_url(&data_url) {
            return Err(DiagramError::UnsupportedImage);
        }
        person.image = Some(data_url);
        Ok(())
    }

    /// # Errors
    ///
    /// [`DiagramError::UnknownPerson`].
    pub fn clear_person_image(&mut self, id: PersonId) -> Result<(), DiagramError> {
        self.person_mut(id)?.image = None;
        Ok(())
    }

    /// Move a person, clamped to `[40, 760] × [60, 440]`.
    ///
    /// # Errors
    ///
    /// [`DiagramError::UnknownPerson`].
    pub fn move_person(&mut self, id: PersonId, x: f64, y: f64) -> Result<Point, DiagramError> {
        let (x, y) = clamp_to_canvas(x, y);
        let person = self.person_mut(id)?;
        person.x = x;
        person.y = y;
        Ok(Point::new(x, y))
    }

    /// Redistribute everyone by count. Person order decides slot order.
    pub fn auto_arrange(&mut self) {
        let slots = arrange_positions(self.people.len(), LOGICAL_WIDTH, LOGICAL_HEIGHT);
        for (person, slot) in self.people.iter_mut().zip(slots) {
            person.x = slot.x;
            person.y = slot.y;
        }
    }

    // --- Relationships ---

    /// # Errors
    ///
    /// [`DiagramError::SelfLoop`], [`DiagramError::UnknownPerson`],
    /// [`DiagramError::EmptyLabel`], or [`DiagramError::DuplicateRelationship`].
    pub fn add_relationship(
        &mut self,
        from: PersonId,
        to: PersonId,
        label: &str,
    ) -> Result<&Relationship, DiagramError> {
        if from == to {
            return Err(DiagramError::SelfLoop(from));
        }
        self.require_person(from)?;
        self.require_person(to)?;
        let label = non_empty(label, DiagramError::EmptyLabel)?;
        if self.has_direction(from, to, None) {
            return Err(DiagramError::DuplicateRelationship { from, to });
        }
        let rel = Relationship {
            id: self.next_relationship_id()?,
            from,
            to,
            label,
            label_position: LabelPosition::Default,
        };
        self.relationships.push(rel);
        Ok(&self.relationships[self.relationships.len() - 1])
    }

    /// # Errors
    ///
    /// [`DiagramError::UnknownRelationship`].
    pub fn delete_relationship(&mut self, id: RelationshipId) -> Result<Relationship, DiagramError> {
        let index = self
            .relationships
            .iter()
            .position(|r| r.id == id)
            .ok_or(DiagramError::UnknownRelationship(id))?;
        Ok(self.relationships.remove(index))
    }

    /// # Errors
    ///
    /// [`DiagramError::EmptyLabel`] or [`DiagramError::UnknownRelationship`].
    pub fn relabel_relationship(&mut self, id: RelationshipId, label: &str) -> Result<(), DiagramError> {
        let label = non_empty(label, DiagramError::EmptyLabel)?;
        self.relationship_mut(id)?.label = label;
        Ok(())
    }

    /// Swap direction in place; id, label and label position are kept.
    ///
    /// # Errors
    ///
    /// [`DiagramError::UnknownRelationship`], or
    /// [`DiagramError::DuplicateRelationship`] when the reversed direction is
    /// already taken by another relationship.
    pub fn reverse_relationship(&mut self, id: RelationshipId) -> Result<(), DiagramError> {
        let (from, to) = {
            let rel = self.relationship(id).ok_or(DiagramError::UnknownRelationship(id))?;
            (rel.from, rel.to)
        };
        if self.has_direction(to, from, Some(id)) {
            return Err(DiagramError::DuplicateRelationship { from: to, to: from });
        }
        let rel = self.relationship_mut(id)?;
        rel.from = to;
        rel.to = from;
        Ok(())
    }

    /// Repoint one end of a relationship.
    ///
    /// # Errors
    ///
    /// [`DiagramError::UnknownRelationship`], [`DiagramError::UnknownPerson`],
    /// [`DiagramError::SelfLoop`], or [`DiagramError::DuplicateRelationship`].
    pub fn set_relationship_target(
        &mut self,
        id: RelationshipId,
        endpoint: Endpoint,
        person: PersonId,
    ) -> Result<(), DiagramError> {
        let (from, to) = {
            let rel = self.relationship(id).ok_or(DiagramError::UnknownRelationship(id))?;
            match endpoint {
                Endpoint::From => (person, rel.to),
                Endpoint::To => (rel.from, person),
            }
        };
        self.require_person(person)?;
        if from == to {
            return Err(DiagramError::SelfLoop(person));
        }
        if self.has_direction(from, to, Some(id)) {
            return Err(DiagramError::DuplicateRelationship { from, to });
        }
        let rel = self.relationship_mut(id)?;
        rel.from = from;
        rel.to = to;
        Ok(())
    }

    /// Pin the label at an absolute logical position. Supersedes any earlier pin.
    ///
    /// # Errors
    ///
    /// [`DiagramError::UnknownRelationship`].
    pub fn move_label(&mut self, id: RelationshipId, x: f64, y: f64) -> Result<(), DiagramError> {
        self.relationship_mut(id)?.label_position = LabelPosition::Overridden { x, y };
        Ok(())
    }

    /// Return the label to its computed position.
    ///
    /// # Errors
    ///
    /// [`DiagramError::UnknownRelationship`].
    pub fn reset_label(&mut self, id: RelationshipId) -> Result<(), DiagramError> {
        self.relationship_mut(id)?.label_position = LabelPosition::Default;
        Ok(())
    }

    // --- Loading ---

    /// Restore the invariants on data that did not come from these operations.
    ///
    /// Drops ids outside `1..=MAX_ID`, duplicate ids (first wins), self-loops,
    /// relationships whose endpoints are missing, and repeated directions.
    /// Avatars that are not inline images are cleared. Returns how many
    /// records were dropped.
    pub fn sanitize(&mut self) -> usize {
        let before = self.people.len() + self.relationships.len();

        let mut seen_people = HashSet::new();
        self.people.retain(|p| valid_id(p.id.0) && seen_people.insert(p.id));

        let mut cleared = 0;
        for person in &mut self.people {
            if person.image.as_deref().is_some_and(|src| !is_avatar_data_url(src)) {
                person.image = None;
                cleared += 1;
            }
        }
        if cleared > 0 {
            log::warn!("diagram: cleared {cleared} avatars that were not inline images");
        }

        let mut seen_rels = HashSet::new();
        let mut seen_directions = HashSet::new();
        self.relationships.retain(|r| {
            valid_id(r.id.0)
                && r.from != r.to
                && seen_people.contains(&r.from)
                && seen_people.contains(&r.to)
                && seen_rels.insert(r.id)
                && seen_directions.insert((r.from, r.to))
        });

        let dropped = before - (self.people.len() + self.relationships.len());
        if dropped > 0 {
            log::warn!("diagram: dropped {dropped} inconsistent records while loading");
        }
        dropped
    }

    /// Parse a stored or shared document and sanitize it.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut diagram: Self = serde_json::from_str(raw)?;
        diagram.sanitize();
        Ok(diagram)
    }

    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Copy without avatar images, for compact share links.
    #[must_use]
    pub fn without_images(&self) -> Self {
        let mut copy = self.clone();
        for person in &mut copy.people {
            person.image = None;
        }
        copy
    }

    // --- Internal ---

    fn person_mut(&mut self, id: PersonId) -> Result<&mut Person, DiagramError> {
        self.people
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DiagramError::UnknownPerson(id))
    }

    fn relationship_mut(&mut self, id: RelationshipId) -> Result<&mut Relationship, DiagramError> {
        self.relationships
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(DiagramError::UnknownRelationship(id))
    }

    fn require_person(&self, id: PersonId) -> Result<(), DiagramError> {
        self.person(id).map(|_| ()).ok_or(DiagramError::UnknownPerson(id))
    }
}

fn non_empty(raw: &str, err: DiagramError) -> Result<String, DiagramError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { Err(err) } else { Ok(trimmed.to_string()) }
}

fn clamp_to_canvas(x: f64, y: f64) -> (f64, f64) {
    (
        x.clamp(DRAG_MARGIN_X, LOGICAL_WIDTH - DRAG_MARGIN_X),
        y.clamp(DRAG_MARGIN_Y, LOGICAL_HEIGHT - DRAG_MARGIN_Y),
    )
}

fn valid_id(id: u64) -> bool {
    (1..=MAX_ID).contains(&id)
}

fn next_id(ids: impl Iterator<Item = u64>) -> Result<u64, DiagramError> {
    ids.max()
        .unwrap_or(0)
        .checked_add(1)
        .filter(|id| *id <= MAX_ID)
        .ok_or(DiagramError::IdsExhausted)
}
