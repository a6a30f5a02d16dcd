use std::fmt;
use std::str::FromStr;

use eframe::egui;

use crate::error::DiagramError;

pub type NodeId = u64;
pub type RelationshipId = u64;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_pos2(p: egui::Pos2) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn to_pos2(self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Class,
    Interface,
}

impl ElementKind {
    pub fn label(self) -> &'static str {
        match self {
            ElementKind::Class => "Class",
            ElementKind::Interface => "Interface",
        }
    }
}

/// Which member list of an element an edit targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Member {
    Attribute,
    Method,
}

/// A class or interface box. Interfaces keep `attributes` empty.
///
/// The record carries no reference to anything drawn; the registry keeps
/// rendered sizes and connector primitives alongside it, keyed by `id`.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementNode {
    pub id: NodeId,
    pub kind: ElementKind,
    pub name: String,
    pub position: Point,
    pub attributes: Vec<String>,
    pub methods: Vec<String>,
}

impl ElementNode {
    pub fn new(id: NodeId, kind: ElementKind, name: impl Into<String>, position: Point) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            position,
            attributes: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn members(&self, member: Member) -> &[String] {
        match member {
            Member::Attribute => &self.attributes,
            Member::Method => &self.methods,
        }
    }

    pub(crate) fn members_mut(&mut self, member: Member) -> &mut Vec<String> {
        match member {
            Member::Attribute => &mut self.attributes,
            Member::Method => &mut self.methods,
        }
    }

    pub fn rect(&self, size: egui::Vec2) -> egui::Rect {
        egui::Rect::from_min_size(self.position.to_pos2(), size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    Association,
    Aggregation,
    Composition,
    Inheritance,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 4] = [
        RelationshipKind::Association,
        RelationshipKind::Aggregation,
        RelationshipKind::Composition,
        RelationshipKind::Inheritance,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RelationshipKind::Association => "Association",
            RelationshipKind::Aggregation => "Aggregation",
            RelationshipKind::Composition => "Composition",
            RelationshipKind::Inheritance => "Inheritance",
        }
    }

    /// Multiplicity used when the caller leaves one empty.
    pub fn default_multiplicity(self) -> &'static str {
        match self {
            RelationshipKind::Inheritance => "",
            _ => "1",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RelationshipKind {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        RelationshipKind::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| DiagramError::UnknownKind(s.to_string()))
    }
}

/// Text collected from the editor when a relationship is created or edited.
/// `None` or empty fields fall back to the per-kind defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelationshipDetails {
    pub name: Option<String>,
    pub start_multiplicity: Option<String>,
    pub end_multiplicity: Option<String>,
}

impl RelationshipDetails {
    pub fn new(
        name: impl Into<String>,
        start_multiplicity: impl Into<String>,
        end_multiplicity: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            start_multiplicity: Some(start_multiplicity.into()),
            end_multiplicity: Some(end_multiplicity.into()),
        }
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// A typed connection between two elements, referenced by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    pub id: RelationshipId,
    pub kind: RelationshipKind,
    pub start_name: String,
    pub end_name: String,
    pub label: String,
    pub start_multiplicity: String,
    pub end_multiplicity: String,
}

impl Relationship {
    pub fn new(
        id: RelationshipId,
        kind: RelationshipKind,
        start_name: impl Into<String>,
        end_name: impl Into<String>,
        details: RelationshipDetails,
    ) -> Self {
        let mut relationship = Self {
            id,
            kind,
            start_name: start_name.into(),
            end_name: end_name.into(),
            label: String::new(),
            start_multiplicity: String::new(),
            end_multiplicity: String::new(),
        };
        relationship.apply_details(details);
        relationship
    }

    pub fn apply_details(&mut self, details: RelationshipDetails) {
        let multiplicity = self.kind.default_multiplicity();
        self.label = non_empty_or(details.name, self.kind.label());
        self.start_multiplicity = non_empty_or(details.start_multiplicity, multiplicity);
        self.end_multiplicity = non_empty_or(details.end_multiplicity, multiplicity);
    }

    pub fn references(&self, name: &str) -> bool {
        self.start_name == name || self.end_name == name
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiagramDocument {
    pub classes: Vec<ElementNode>,
    pub interfaces: Vec<ElementNode>,
    pub relationships: Vec<Relationship>,
}

impl DiagramDocument {
    pub fn nodes(&self) -> impl Iterator<Item = &ElementNode> {
        self.classes.iter().chain(self.interfaces.iter())
    }

    pub fn node(&self, id: NodeId) -> Option<&ElementNode> {
        self.nodes().find(|n| n.id == id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut ElementNode> {
        self.classes
            .iter_mut()
            .chain(self.interfaces.iter_mut())
            .find(|n| n.id == id)
    }

    pub(crate) fn collection_mut(&mut self, kind: ElementKind) -> &mut Vec<ElementNode> {
        match kind {
            ElementKind::Class => &mut self.classes,
            ElementKind::Interface => &mut self.interfaces,
        }
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.interfaces.is_empty() && self.relationships.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(
            "aggregation".parse::<RelationshipKind>().unwrap(),
            RelationshipKind::Aggregation
        );
        assert_eq!(
            " INHERITANCE ".parse::<RelationshipKind>().unwrap(),
            RelationshipKind::Inheritance
        );
        assert!(matches!(
            "dependency".parse::<RelationshipKind>(),
            Err(DiagramError::UnknownKind(s)) if s == "dependency"
        ));
    }

    #[test]
    fn association_defaults() {
        let r = Relationship::new(
            1,
            RelationshipKind::Association,
            "A",
            "B",
            RelationshipDetails::default(),
        );
        assert_eq!(r.label, "Association");
        assert_eq!(r.start_multiplicity, "1");
        assert_eq!(r.end_multiplicity, "1");
    }

    #[test]
    fn inheritance_defaults_suppress_multiplicities() {
        let r = Relationship::new(
            1,
            RelationshipKind::Inheritance,
            "A",
            "B",
            RelationshipDetails::new("", "", ""),
        );
        assert_eq!(r.label, "Inheritance");
        assert!(r.start_multiplicity.is_empty());
        assert!(r.end_multiplicity.is_empty());
    }

    #[test]
    fn explicit_details_win_over_defaults() {
        let r = Relationship::new(
            7,
            RelationshipKind::Composition,
            "Car",
            "Wheel",
            RelationshipDetails::new("has", "1", "4"),
        );
        assert_eq!(r.label, "has");
        assert_eq!(r.end_multiplicity, "4");
        assert!(r.references("Car"));
        assert!(r.references("Wheel"));
        assert!(!r.references("Engine"));
    }
}
