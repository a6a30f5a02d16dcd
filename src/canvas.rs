//! The drawing surface connectors are published to.
//!
//! The engine only ever adds, replaces and removes primitives; painting is
//! up to whoever owns the surface. [`Scene`] is the in-memory surface used by
//! the desktop host and by tests.

use std::collections::BTreeMap;

use eframe::egui;

pub type PrimitiveId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fill {
    /// Painted with the canvas background, so it hides what is underneath.
    Background,
    /// Painted with the stroke colour.
    Foreground,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Line {
        a: egui::Pos2,
        b: egui::Pos2,
    },
    Polygon {
        points: Vec<egui::Pos2>,
        fill: Fill,
    },
    /// Text centred on `pos`.
    Text {
        pos: egui::Pos2,
        text: String,
    },
}

pub trait Canvas {
    fn add_primitive(&mut self, primitive: Primitive) -> PrimitiveId;

    fn update_primitive(&mut self, id: PrimitiveId, primitive: Primitive);

    fn remove_primitive(&mut self, id: PrimitiveId);
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    primitives: BTreeMap<PrimitiveId, Primitive>,
    next_id: PrimitiveId,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(&id)
    }

    /// Primitives in the order they were first added.
    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveId, &Primitive)> {
        self.primitives.iter().map(|(id, p)| (*id, p))
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.primitives.values().filter_map(|p| match p {
            Primitive::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Canvas for Scene {
    fn add_primitive(&mut self, primitive: Primitive) -> PrimitiveId {
        let id = self.next_id;
        self.next_id += 1;
        self.primitives.insert(id, primitive);
        id
    }

    fn update_primitive(&mut self, id: PrimitiveId, primitive: Primitive) {
        if let Some(slot) = self.primitives.get_mut(&id) {
            *slot = primitive;
        } else {
            log::warn!(id = id; "Update for a primitive that is not on the scene");
        }
    }

    fn remove_primitive(&mut self, id: PrimitiveId) {
        self.primitives.remove(&id);
    }
}
