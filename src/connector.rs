use eframe::egui;

use crate::canvas::{Canvas, Fill, Primitive, PrimitiveId};
use crate::model::{Relationship, RelationshipId};

/// Vertical lift of the relationship name above the connector midpoint.
pub const NAME_LABEL_LIFT: f32 = 10.0;
/// Offset of the start multiplicity from the connector's start point. The end
/// multiplicity mirrors it horizontally.
pub const MULTIPLICITY_OFFSET: egui::Vec2 = egui::vec2(15.0, -5.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecorationShape {
    Diamond,
    Triangle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Decoration {
    pub shape: DecorationShape,
    pub points: Vec<egui::Pos2>,
    pub fill: Fill,
}

impl Decoration {
    fn primitive(&self) -> Primitive {
        Primitive::Polygon {
            points: self.points.clone(),
            fill: self.fill,
        }
    }
}

/// Where every part of a connector goes for one pair of node positions.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectorLayout {
    /// Boundary point chosen on the start node.
    pub start_point: egui::Pos2,
    /// Boundary point chosen on the end node; the decoration tip sits here.
    pub end_point: egui::Pos2,
    /// The drawn line. Its end differs from `end_point` when a decoration
    /// sits between the line and the node.
    pub line: [egui::Pos2; 2],
    pub decoration: Option<Decoration>,
    pub name_pos: egui::Pos2,
    pub start_label_pos: egui::Pos2,
    pub end_label_pos: egui::Pos2,
}

impl ConnectorLayout {
    pub fn new(
        start_point: egui::Pos2,
        end_point: egui::Pos2,
        line_end: egui::Pos2,
        decoration: Option<Decoration>,
    ) -> Self {
        let line = [start_point, line_end];
        let mid = egui::pos2(
            (line[0].x + line[1].x) * 0.5,
            (line[0].y + line[1].y) * 0.5,
        );
        Self {
            start_point,
            end_point,
            line,
            decoration,
            name_pos: mid - egui::vec2(0.0, NAME_LABEL_LIFT),
            start_label_pos: line[0] + MULTIPLICITY_OFFSET,
            end_label_pos: line[1] + egui::vec2(-MULTIPLICITY_OFFSET.x, MULTIPLICITY_OFFSET.y),
        }
    }
}

/// Canvas primitives owned by one live relationship.
///
/// Labels with empty text are not placed on the canvas at all; they appear
/// or disappear as the text is edited.
#[derive(Clone, Debug)]
pub struct RelationshipVisual {
    relationship: RelationshipId,
    line: PrimitiveId,
    decoration: Option<PrimitiveId>,
    name_label: Option<PrimitiveId>,
    start_label: Option<PrimitiveId>,
    end_label: Option<PrimitiveId>,
    layout: ConnectorLayout,
}

impl RelationshipVisual {
    pub fn attach(
        canvas: &mut dyn Canvas,
        relationship: &Relationship,
        layout: ConnectorLayout,
    ) -> Self {
        let line = canvas.add_primitive(Primitive::Line {
            a: layout.line[0],
            b: layout.line[1],
        });
        let decoration = layout
            .decoration
            .as_ref()
            .map(|d| canvas.add_primitive(d.primitive()));
        let mut visual = Self {
            relationship: relationship.id,
            line,
            decoration,
            name_label: None,
            start_label: None,
            end_label: None,
            layout,
        };
        visual.sync_labels(canvas, relationship);
        visual
    }

    pub fn relationship_id(&self) -> RelationshipId {
        self.relationship
    }

    pub fn layout(&self) -> &ConnectorLayout {
        &self.layout
    }

    pub fn line_id(&self) -> PrimitiveId {
        self.line
    }

    pub fn primitive_ids(&self) -> Vec<PrimitiveId> {
        std::iter::once(self.line)
            .chain(self.decoration)
            .chain(self.name_label)
            .chain(self.start_label)
            .chain(self.end_label)
            .collect()
    }

    /// Moves every primitive to `layout` and refreshes label text.
    pub fn reposition(
        &mut self,
        canvas: &mut dyn Canvas,
        relationship: &Relationship,
        layout: ConnectorLayout,
    ) {
        canvas.update_primitive(
            self.line,
            Primitive::Line {
                a: layout.line[0],
                b: layout.line[1],
            },
        );
        match (&layout.decoration, self.decoration) {
            (Some(d), Some(id)) => canvas.update_primitive(id, d.primitive()),
            (Some(d), None) => self.decoration = Some(canvas.add_primitive(d.primitive())),
            (None, Some(id)) => {
                canvas.remove_primitive(id);
                self.decoration = None;
            }
            (None, None) => {}
        }
        self.layout = layout;
        self.sync_labels(canvas, relationship);
    }

    pub fn sync_labels(&mut self, canvas: &mut dyn Canvas, relationship: &Relationship) {
        sync_label(
            canvas,
            &mut self.name_label,
            &relationship.label,
            self.layout.name_pos,
        );
        sync_label(
            canvas,
            &mut self.start_label,
            &relationship.start_multiplicity,
            self.layout.start_label_pos,
        );
        sync_label(
            canvas,
            &mut self.end_label,
            &relationship.end_multiplicity,
            self.layout.end_label_pos,
        );
    }

    pub fn detach(&self, canvas: &mut dyn Canvas) {
        for id in self.primitive_ids() {
            canvas.remove_primitive(id);
        }
    }
}

fn sync_label(
    canvas: &mut dyn Canvas,
    slot: &mut Option<PrimitiveId>,
    text: &str,
    pos: egui::Pos2,
) {
    if text.is_empty() {
        if let Some(id) = slot.take() {
            canvas.remove_primitive(id);
        }
        return;
    }
    let primitive = Primitive::Text {
        pos,
        text: text.to_string(),
    };
    match *slot {
        Some(id) => canvas.update_primitive(id, primitive),
        None => *slot = Some(canvas.add_primitive(primitive)),
    }
}
