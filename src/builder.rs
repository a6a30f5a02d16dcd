//! One builder per relationship kind.
//!
//! Builders share the attach-and-connect algorithm through the provided
//! methods of [`RelationshipBuilder`]; each kind only decides how the end of
//! the connector is decorated. A builder is armed when its tool is selected
//! and handles a single live relationship per activation.

use eframe::egui;
use log::{debug, warn};

use crate::canvas::{Canvas, Fill};
use crate::connector::{ConnectorLayout, Decoration, DecorationShape, RelationshipVisual};
use crate::error::{DiagramError, Result};
use crate::geometry;
use crate::model::{Relationship, RelationshipDetails, RelationshipId, RelationshipKind};

/// A node's name and current box, as seen by a builder.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeBox {
    pub name: String,
    pub rect: egui::Rect,
}

impl NodeBox {
    pub fn new(name: impl Into<String>, rect: egui::Rect) -> Self {
        Self {
            name: name.into(),
            rect,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BuiltRelationship {
    pub relationship: Relationship,
    pub visual: RelationshipVisual,
}

pub trait RelationshipBuilder {
    fn kind(&self) -> RelationshipKind;

    fn is_enabled(&self) -> bool;

    /// Clears the enabled flag and reports whether it was set.
    fn disarm(&mut self) -> bool;

    /// Decoration for a connector between the two boundary points, and the
    /// point where the line itself stops.
    fn decorate(
        &self,
        start_point: egui::Pos2,
        end_point: egui::Pos2,
    ) -> (Option<Decoration>, egui::Pos2);

    /// Full connector geometry for the given node boxes.
    fn layout(&self, start: egui::Rect, end: egui::Rect) -> ConnectorLayout {
        let start_point = geometry::closest_boundary_point(start, end);
        let end_point = geometry::closest_boundary_point(end, start);
        let (decoration, line_end) = self.decorate(start_point, end_point);
        ConnectorLayout::new(start_point, end_point, line_end, decoration)
    }

    /// Builds a relationship between two live nodes.
    ///
    /// The builder disarms itself before anything else, so a second call in
    /// the same activation fails with [`DiagramError::BuilderSpent`] and
    /// touches nothing.
    fn create_relationship(
        &mut self,
        canvas: &mut dyn Canvas,
        id: RelationshipId,
        start: &NodeBox,
        end: &NodeBox,
        details: RelationshipDetails,
    ) -> Result<BuiltRelationship> {
        if !self.disarm() {
            return Err(DiagramError::BuilderSpent(self.kind()));
        }
        let relationship = Relationship::new(id, self.kind(), &start.name, &end.name, details);
        Ok(self.connect(canvas, relationship, start.rect, end.rect))
    }

    /// Rebuilds the visual for a stored record, resolving both endpoints by
    /// name. Nothing reaches the canvas unless both names resolve.
    fn create_relationship_from_model(
        &mut self,
        canvas: &mut dyn Canvas,
        record: &Relationship,
        resolve: &dyn Fn(&str) -> Option<NodeBox>,
    ) -> Result<BuiltRelationship> {
        let Some(start) = resolve(&record.start_name) else {
            warn!(kind:% = self.kind(), name = record.start_name.as_str(); "Start element not found");
            return Err(DiagramError::MissingEndpoint(record.start_name.clone()));
        };
        let Some(end) = resolve(&record.end_name) else {
            warn!(kind:% = self.kind(), name = record.end_name.as_str(); "End element not found");
            return Err(DiagramError::MissingEndpoint(record.end_name.clone()));
        };
        let mut relationship = record.clone();
        relationship.kind = self.kind();
        Ok(self.connect(canvas, relationship, start.rect, end.rect))
    }

    fn connect(
        &self,
        canvas: &mut dyn Canvas,
        relationship: Relationship,
        start: egui::Rect,
        end: egui::Rect,
    ) -> BuiltRelationship {
        let layout = self.layout(start, end);
        debug!(
            kind:% = relationship.kind,
            start = relationship.start_name.as_str(),
            end = relationship.end_name.as_str();
            "Connecting relationship"
        );
        let visual = RelationshipVisual::attach(canvas, &relationship, layout);
        BuiltRelationship {
            relationship,
            visual,
        }
    }
}

fn diamond(start_point: egui::Pos2, end_point: egui::Pos2, fill: Fill) -> (Option<Decoration>, egui::Pos2) {
    let points = geometry::diamond_points(end_point, start_point);
    let line_end = geometry::closest_vertex_on_shape(&points, start_point).unwrap_or(end_point);
    let decoration = Decoration {
        shape: DecorationShape::Diamond,
        points: points.to_vec(),
        fill,
    };
    (Some(decoration), line_end)
}

#[derive(Debug)]
pub struct AssociationBuilder {
    enabled: bool,
}

impl AssociationBuilder {
    pub fn armed() -> Self {
        Self { enabled: true }
    }
}

impl RelationshipBuilder for AssociationBuilder {
    fn kind(&self) -> RelationshipKind {
        RelationshipKind::Association
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn disarm(&mut self) -> bool {
        std::mem::replace(&mut self.enabled, false)
    }

    fn decorate(
        &self,
        _start_point: egui::Pos2,
        end_point: egui::Pos2,
    ) -> (Option<Decoration>, egui::Pos2) {
        (None, end_point)
    }
}

/// Hollow diamond at the whole's end.
#[derive(Debug)]
pub struct AggregationBuilder {
    enabled: bool,
}

impl AggregationBuilder {
    pub fn armed() -> Self {
        Self { enabled: true }
    }
}

impl RelationshipBuilder for AggregationBuilder {
    fn kind(&self) -> RelationshipKind {
        RelationshipKind::Aggregation
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn disarm(&mut self) -> bool {
        std::mem::replace(&mut self.enabled, false)
    }

    fn decorate(
        &self,
        start_point: egui::Pos2,
        end_point: egui::Pos2,
    ) -> (Option<Decoration>, egui::Pos2) {
        diamond(start_point, end_point, Fill::Background)
    }
}

/// Same as aggregation with a solid diamond.
#[derive(Debug)]
pub struct CompositionBuilder {
    enabled: bool,
}

impl CompositionBuilder {
    pub fn armed() -> Self {
        Self { enabled: true }
    }
}

impl RelationshipBuilder for CompositionBuilder {
    fn kind(&self) -> RelationshipKind {
        RelationshipKind::Composition
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn disarm(&mut self) -> bool {
        std::mem::replace(&mut self.enabled, false)
    }

    fn decorate(
        &self,
        start_point: egui::Pos2,
        end_point: egui::Pos2,
    ) -> (Option<Decoration>, egui::Pos2) {
        diamond(start_point, end_point, Fill::Foreground)
    }
}

/// Hollow triangle pointing at the parent; the line stops at its base.
#[derive(Debug)]
pub struct InheritanceBuilder {
    enabled: bool,
}

impl InheritanceBuilder {
    pub fn armed() -> Self {
        Self { enabled: true }
    }
}

impl RelationshipBuilder for InheritanceBuilder {
    fn kind(&self) -> RelationshipKind {
        RelationshipKind::Inheritance
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn disarm(&mut self) -> bool {
        std::mem::replace(&mut self.enabled, false)
    }

    fn decorate(
        &self,
        start_point: egui::Pos2,
        end_point: egui::Pos2,
    ) -> (Option<Decoration>, egui::Pos2) {
        let rotation = geometry::triangle_rotation(start_point, end_point);
        let decoration = Decoration {
            shape: DecorationShape::Triangle,
            points: geometry::triangle_points(end_point, rotation).to_vec(),
            fill: Fill::Background,
        };
        let base = geometry::triangle_base_midpoint(end_point, rotation);
        (Some(decoration), base)
    }
}

/// An armed builder for `kind`.
pub fn builder_for(kind: RelationshipKind) -> Box<dyn RelationshipBuilder> {
    match kind {
        RelationshipKind::Association => Box::new(AssociationBuilder::armed()),
        RelationshipKind::Aggregation => Box::new(AggregationBuilder::armed()),
        RelationshipKind::Composition => Box::new(CompositionBuilder::armed()),
        RelationshipKind::Inheritance => Box::new(InheritanceBuilder::armed()),
    }
}
