//! The diagram registry.
//!
//! [`Diagram`] owns the document, the name index used to resolve
//! relationship endpoints, the live connector visuals, and the current tool
//! mode. Every mutation of nodes or relationships goes through it so the
//! index never drifts from the document.

use std::collections::HashMap;

use eframe::egui;
use log::{debug, trace, warn};

use crate::builder::{BuiltRelationship, NodeBox, RelationshipBuilder, builder_for};
use crate::canvas::Canvas;
use crate::connector::RelationshipVisual;
use crate::error::{DiagramError, Result};
use crate::model::{
    DiagramDocument, ElementKind, ElementNode, Member, NodeId, Point, Relationship,
    RelationshipDetails, RelationshipId, RelationshipKind,
};

pub const DEFAULT_NODE_SIZE: egui::Vec2 = egui::vec2(100.0, 50.0);

/// Origin and horizontal step used to place new boxes created from a tool.
const CASCADE_ORIGIN: egui::Pos2 = egui::pos2(100.0, 100.0);
const CASCADE_STEP: f32 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Class,
    Interface,
    Association,
    Aggregation,
    Composition,
    Inheritance,
    Drag,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::Class,
        Tool::Interface,
        Tool::Association,
        Tool::Aggregation,
        Tool::Composition,
        Tool::Inheritance,
        Tool::Drag,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tool::Class => "Class",
            Tool::Interface => "Interface",
            Tool::Association => "Association",
            Tool::Aggregation => "Aggregation",
            Tool::Composition => "Composition",
            Tool::Inheritance => "Inheritance",
            Tool::Drag => "Drag",
        }
    }

    pub fn relationship_kind(self) -> Option<RelationshipKind> {
        match self {
            Tool::Association => Some(RelationshipKind::Association),
            Tool::Aggregation => Some(RelationshipKind::Aggregation),
            Tool::Composition => Some(RelationshipKind::Composition),
            Tool::Inheritance => Some(RelationshipKind::Inheritance),
            Tool::Class | Tool::Interface | Tool::Drag => None,
        }
    }
}

enum ToolMode {
    Idle,
    Drag,
    Connect {
        builder: Box<dyn RelationshipBuilder>,
        pending: Option<NodeId>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Not in a relationship tool, unknown node, or the pending node again.
    Ignored,
    /// First node of the pair recorded.
    PendingStart(NodeId),
    /// Detail collection was cancelled; the tool stays armed.
    Cancelled,
    Created(RelationshipId),
}

#[derive(Clone, Copy, Debug)]
struct DragGrab {
    node: NodeId,
    offset: egui::Vec2,
}

#[derive(Clone, Debug)]
struct NodeSizes {
    default: egui::Vec2,
    rendered: HashMap<NodeId, egui::Vec2>,
}

impl NodeSizes {
    fn get(&self, id: NodeId) -> egui::Vec2 {
        self.rendered.get(&id).copied().unwrap_or(self.default)
    }
}

fn lookup_box(
    index: &HashMap<String, NodeId>,
    doc: &DiagramDocument,
    sizes: &NodeSizes,
    name: &str,
) -> Option<NodeBox> {
    let id = *index.get(name)?;
    let node = doc.node(id)?;
    Some(NodeBox::new(&node.name, node.rect(sizes.get(id))))
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DiagramError::EmptyName);
    }
    Ok(())
}

pub struct Diagram<C: Canvas> {
    doc: DiagramDocument,
    index: HashMap<String, NodeId>,
    sizes: NodeSizes,
    visuals: HashMap<RelationshipId, RelationshipVisual>,
    subscriptions: HashMap<NodeId, Vec<RelationshipId>>,
    mode: ToolMode,
    grab: Option<DragGrab>,
    canvas: C,
    next_node_id: NodeId,
    next_relationship_id: RelationshipId,
}

impl<C: Canvas> Diagram<C> {
    pub fn new(canvas: C) -> Self {
        Self::with_node_size(canvas, DEFAULT_NODE_SIZE)
    }

    pub fn with_node_size(canvas: C, default_node_size: egui::Vec2) -> Self {
        Self {
            doc: DiagramDocument::default(),
            index: HashMap::new(),
            sizes: NodeSizes {
                default: default_node_size,
                rendered: HashMap::new(),
            },
            visuals: HashMap::new(),
            subscriptions: HashMap::new(),
            mode: ToolMode::Idle,
            grab: None,
            canvas,
            next_node_id: 1,
            next_relationship_id: 1,
        }
    }

    pub fn document(&self) -> &DiagramDocument {
        &self.doc
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn node(&self, id: NodeId) -> Option<&ElementNode> {
        self.doc.node(id)
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn node_by_name(&self, name: &str) -> Option<&ElementNode> {
        self.node_id(name).and_then(|id| self.doc.node(id))
    }

    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    pub fn node_size(&self, id: NodeId) -> egui::Vec2 {
        self.sizes.get(id)
    }

    pub fn node_rect(&self, id: NodeId) -> Option<egui::Rect> {
        self.doc.node(id).map(|n| n.rect(self.sizes.get(id)))
    }

    pub fn visual(&self, id: RelationshipId) -> Option<&RelationshipVisual> {
        self.visuals.get(&id)
    }

    pub fn relationships_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.doc.relationships.iter().filter(move |r| r.references(name))
    }

    /// The tool whose mode is active, if any.
    pub fn active_tool(&self) -> Option<Tool> {
        match &self.mode {
            ToolMode::Idle => None,
            ToolMode::Drag => Some(Tool::Drag),
            ToolMode::Connect { builder, .. } => Some(match builder.kind() {
                RelationshipKind::Association => Tool::Association,
                RelationshipKind::Aggregation => Tool::Aggregation,
                RelationshipKind::Composition => Tool::Composition,
                RelationshipKind::Inheritance => Tool::Inheritance,
            }),
        }
    }

    pub fn pending_start(&self) -> Option<NodeId> {
        match &self.mode {
            ToolMode::Connect { pending, .. } => *pending,
            _ => None,
        }
    }

    pub fn cancel_pending(&mut self) {
        if let ToolMode::Connect { pending, .. } = &mut self.mode {
            *pending = None;
        }
    }

    /// Switches tool mode. Class and Interface create a box right away and
    /// return its id.
    pub fn handle_tool_selection(&mut self, tool: Tool) -> Result<Option<NodeId>> {
        self.grab = None;
        debug!(tool = tool.label(); "Tool selected");
        match tool {
            Tool::Class | Tool::Interface => {
                self.mode = ToolMode::Idle;
                let kind = if tool == Tool::Class {
                    ElementKind::Class
                } else {
                    ElementKind::Interface
                };
                let count = match kind {
                    ElementKind::Class => self.doc.classes.len(),
                    ElementKind::Interface => self.doc.interfaces.len(),
                };
                let position = Point::new(
                    CASCADE_ORIGIN.x + count as f32 * CASCADE_STEP,
                    CASCADE_ORIGIN.y,
                );
                let name = self.unique_name(kind);
                self.create_node(kind, name, position).map(Some)
            }
            Tool::Drag => {
                self.mode = ToolMode::Drag;
                Ok(None)
            }
            Tool::Association | Tool::Aggregation | Tool::Composition | Tool::Inheritance => {
                let Some(kind) = tool.relationship_kind() else {
                    return Ok(None);
                };
                self.mode = ToolMode::Connect {
                    builder: builder_for(kind),
                    pending: None,
                };
                Ok(None)
            }
        }
    }

    fn unique_name(&self, kind: ElementKind) -> String {
        let mut n = self.doc.nodes().filter(|node| node.kind == kind).count() + 1;
        loop {
            let name = format!("{}{}", kind.label(), n);
            if !self.index.contains_key(&name) {
                return name;
            }
            n += 1;
        }
    }

    pub fn create_class_box(&mut self, name: impl Into<String>, position: Point) -> Result<NodeId> {
        self.create_node(ElementKind::Class, name.into(), position)
    }

    pub fn create_interface_box(
        &mut self,
        name: impl Into<String>,
        position: Point,
    ) -> Result<NodeId> {
        self.create_node(ElementKind::Interface, name.into(), position)
    }

    fn create_node(&mut self, kind: ElementKind, name: String, position: Point) -> Result<NodeId> {
        validate_name(&name)?;
        if self.index.contains_key(&name) {
            return Err(DiagramError::DuplicateName(name));
        }
        let id = self.next_node_id;
        self.next_node_id += 1;
        debug!(id = id, name = name.as_str(), kind = kind.label(); "Created element box");
        self.index.insert(name.clone(), id);
        self.doc
            .collection_mut(kind)
            .push(ElementNode::new(id, kind, name, position));
        Ok(id)
    }

    /// Records the rendered size of a node and re-attaches its connectors.
    pub fn set_node_size(&mut self, id: NodeId, size: egui::Vec2) -> Result<()> {
        if self.doc.node(id).is_none() {
            return Err(DiagramError::UnknownNode(id));
        }
        if self.sizes.rendered.get(&id) == Some(&size) {
            return Ok(());
        }
        self.sizes.rendered.insert(id, size);
        self.node_moved(id);
        Ok(())
    }

    /// Routes a click on a node through the two-click relationship protocol.
    ///
    /// The second click on a different node clears the pending start, asks
    /// `collect` for the relationship text and, unless that is cancelled,
    /// runs the armed builder and returns to idle mode.
    pub fn click_node<F>(&mut self, id: NodeId, collect: F) -> Result<ClickOutcome>
    where
        F: FnOnce(RelationshipKind, &ElementNode, &ElementNode) -> Option<RelationshipDetails>,
    {
        let ToolMode::Connect { builder, pending } = &mut self.mode else {
            return Ok(ClickOutcome::Ignored);
        };
        if self.doc.node(id).is_none() {
            return Ok(ClickOutcome::Ignored);
        }
        let start = match pending.take() {
            None => {
                *pending = Some(id);
                return Ok(ClickOutcome::PendingStart(id));
            }
            Some(start) if start == id => {
                *pending = Some(start);
                return Ok(ClickOutcome::Ignored);
            }
            Some(start) => start,
        };
        let (Some(start_node), Some(end_node)) = (self.doc.node(start), self.doc.node(id)) else {
            return Err(DiagramError::UnknownNode(start));
        };
        let Some(details) = collect(builder.kind(), start_node, end_node) else {
            debug!("Relationship details cancelled");
            return Ok(ClickOutcome::Cancelled);
        };
        let start_name = start_node.name.clone();
        let end_name = end_node.name.clone();
        let (Some(start_box), Some(end_box)) = (
            lookup_box(&self.index, &self.doc, &self.sizes, &start_name),
            lookup_box(&self.index, &self.doc, &self.sizes, &end_name),
        ) else {
            return Err(DiagramError::MissingEndpoint(start_name));
        };
        let rid = self.next_relationship_id;
        let built = builder.create_relationship(&mut self.canvas, rid, &start_box, &end_box, details);
        self.mode = ToolMode::Idle;
        let built = built?;
        self.next_relationship_id += 1;
        Ok(ClickOutcome::Created(self.add_relationship_box(built)))
    }

    /// Appends a freshly built relationship and subscribes its visual to
    /// moves of both endpoints. Endpoints are not re-validated here.
    pub fn add_relationship_box(&mut self, built: BuiltRelationship) -> RelationshipId {
        let BuiltRelationship {
            relationship,
            visual,
        } = built;
        let rid = relationship.id;
        self.next_relationship_id = self.next_relationship_id.max(rid + 1);
        for name in [&relationship.start_name, &relationship.end_name] {
            if let Some(&node) = self.index.get(name.as_str()) {
                let subs = self.subscriptions.entry(node).or_default();
                if !subs.contains(&rid) {
                    subs.push(rid);
                }
            }
        }
        debug!(
            id = rid,
            kind:% = relationship.kind,
            start = relationship.start_name.as_str(),
            end = relationship.end_name.as_str();
            "Added relationship"
        );
        self.doc.relationships.push(relationship);
        self.visuals.insert(rid, visual);
        rid
    }

    /// Rebuilds a stored relationship, resolving endpoints through the name
    /// index. On a missing endpoint nothing is added.
    pub fn restore_relationship(&mut self, record: &Relationship) -> Result<RelationshipId> {
        let mut record = record.clone();
        record.id = self.next_relationship_id;
        let index = &self.index;
        let doc = &self.doc;
        let sizes = &self.sizes;
        let resolve = |name: &str| lookup_box(index, doc, sizes, name);
        let built = builder_for(record.kind).create_relationship_from_model(
            &mut self.canvas,
            &record,
            &resolve,
        )?;
        Ok(self.add_relationship_box(built))
    }

    pub fn move_node(&mut self, id: NodeId, position: Point) -> Result<()> {
        let node = self.doc.node_mut(id).ok_or(DiagramError::UnknownNode(id))?;
        if node.position == position {
            return Ok(());
        }
        node.position = position;
        self.node_moved(id);
        Ok(())
    }

    /// Starts a drag if the drag tool is active. Returns whether it did.
    pub fn press_node(&mut self, id: NodeId, pointer: egui::Pos2) -> bool {
        if !matches!(self.mode, ToolMode::Drag) {
            return false;
        }
        let Some(node) = self.doc.node(id) else {
            return false;
        };
        self.grab = Some(DragGrab {
            node: id,
            offset: pointer - node.position.to_pos2(),
        });
        true
    }

    pub fn drag_to(&mut self, pointer: egui::Pos2) -> Result<bool> {
        let Some(grab) = self.grab else {
            return Ok(false);
        };
        self.move_node(grab.node, Point::from_pos2(pointer - grab.offset))?;
        Ok(true)
    }

    pub fn release(&mut self) {
        self.grab = None;
    }

    pub fn dragged_node(&self) -> Option<NodeId> {
        self.grab.map(|g| g.node)
    }

    /// Re-attaches every relationship subscribed to `id`, once per
    /// relationship regardless of which coordinates changed.
    fn node_moved(&mut self, id: NodeId) {
        let Some(subs) = self.subscriptions.get(&id) else {
            return;
        };
        for rid in subs.clone() {
            self.reposition_relationship(rid);
        }
    }

    pub fn reposition_relationship(&mut self, rid: RelationshipId) {
        let Some(record) = self.doc.relationship(rid) else {
            return;
        };
        let (Some(start), Some(end)) = (
            lookup_box(&self.index, &self.doc, &self.sizes, &record.start_name),
            lookup_box(&self.index, &self.doc, &self.sizes, &record.end_name),
        ) else {
            warn!(id = rid; "Relationship endpoint vanished, leaving connector in place");
            return;
        };
        let Some(visual) = self.visuals.get_mut(&rid) else {
            return;
        };
        let layout = builder_for(record.kind).layout(start.rect, end.rect);
        trace!(id = rid; "Repositioning relationship");
        visual.reposition(&mut self.canvas, record, layout);
    }

    pub fn rename_element(&mut self, old: &str, new: &str) -> Result<()> {
        validate_name(new)?;
        let id = self
            .node_id(old)
            .ok_or_else(|| DiagramError::UnknownElement(old.to_string()))?;
        if old == new {
            return Ok(());
        }
        if self.index.contains_key(new) {
            return Err(DiagramError::DuplicateName(new.to_string()));
        }
        let node = self.doc.node_mut(id).ok_or(DiagramError::UnknownNode(id))?;
        node.name = new.to_string();
        self.index.remove(old);
        self.index.insert(new.to_string(), id);
        let updated = self.update_relationships_for_renamed_class(old, new);
        debug!(old = old, new = new, relationships = updated; "Renamed element");
        Ok(())
    }

    /// Points every relationship naming `old` at `new`. Returns how many
    /// records changed.
    pub fn update_relationships_for_renamed_class(&mut self, old: &str, new: &str) -> usize {
        let mut updated = 0;
        for r in &mut self.doc.relationships {
            let mut touched = false;
            if r.start_name == old {
                r.start_name = new.to_string();
                touched = true;
            }
            if r.end_name == old {
                r.end_name = new.to_string();
                touched = true;
            }
            if touched {
                updated += 1;
            }
        }
        updated
    }

    /// Deletes an element and every relationship naming it. Returns the
    /// number of relationships removed with it.
    pub fn delete_selected_element(&mut self, name: &str) -> Result<usize> {
        let id = self
            .node_id(name)
            .ok_or_else(|| DiagramError::UnknownElement(name.to_string()))?;
        let doomed: Vec<RelationshipId> = self
            .relationships_of(name)
            .map(|r| r.id)
            .collect();
        for rid in &doomed {
            if let Some(visual) = self.visuals.remove(rid) {
                visual.detach(&mut self.canvas);
            }
        }
        self.doc.relationships.retain(|r| !r.references(name));
        for subs in self.subscriptions.values_mut() {
            subs.retain(|rid| !doomed.contains(rid));
        }
        self.subscriptions.remove(&id);
        self.sizes.rendered.remove(&id);
        self.index.remove(name);
        self.doc.classes.retain(|n| n.id != id);
        self.doc.interfaces.retain(|n| n.id != id);
        if self.grab.is_some_and(|g| g.node == id) {
            self.grab = None;
        }
        if self.pending_start() == Some(id) {
            self.cancel_pending();
        }
        debug!(name = name, relationships = doomed.len(); "Deleted element");
        Ok(doomed.len())
    }

    pub fn delete_relationship(&mut self, rid: RelationshipId) -> Result<()> {
        let pos = self
            .doc
            .relationships
            .iter()
            .position(|r| r.id == rid)
            .ok_or(DiagramError::UnknownRelationship(rid))?;
        if let Some(visual) = self.visuals.remove(&rid) {
            visual.detach(&mut self.canvas);
        }
        self.doc.relationships.remove(pos);
        for subs in self.subscriptions.values_mut() {
            subs.retain(|r| *r != rid);
        }
        debug!(id = rid; "Deleted relationship");
        Ok(())
    }

    /// Rewrites label and multiplicities in place, with per-kind defaults
    /// for empty fields.
    pub fn edit_relationship(&mut self, rid: RelationshipId, details: RelationshipDetails) -> Result<()> {
        let record = self
            .doc
            .relationships
            .iter_mut()
            .find(|r| r.id == rid)
            .ok_or(DiagramError::UnknownRelationship(rid))?;
        record.apply_details(details);
        if let Some(visual) = self.visuals.get_mut(&rid) {
            visual.sync_labels(&mut self.canvas, record);
        }
        Ok(())
    }

    fn member_target(&mut self, name: &str, member: Member) -> Result<&mut ElementNode> {
        let id = self
            .node_id(name)
            .ok_or_else(|| DiagramError::UnknownElement(name.to_string()))?;
        let node = self.doc.node_mut(id).ok_or(DiagramError::UnknownNode(id))?;
        if member == Member::Attribute && node.kind == ElementKind::Interface {
            return Err(DiagramError::AttributeOnInterface(name.to_string()));
        }
        Ok(node)
    }

    pub fn add_member(&mut self, name: &str, member: Member, text: impl Into<String>) -> Result<()> {
        self.member_target(name, member)?
            .members_mut(member)
            .push(text.into());
        Ok(())
    }

    pub fn update_member(
        &mut self,
        name: &str,
        member: Member,
        index: usize,
        text: impl Into<String>,
    ) -> Result<()> {
        let slot = self
            .member_target(name, member)?
            .members_mut(member)
            .get_mut(index)
            .ok_or_else(|| DiagramError::MemberOutOfRange {
                name: name.to_string(),
                index,
            })?;
        *slot = text.into();
        Ok(())
    }

    pub fn remove_member(&mut self, name: &str, member: Member, index: usize) -> Result<String> {
        let members = self.member_target(name, member)?.members_mut(member);
        if index >= members.len() {
            return Err(DiagramError::MemberOutOfRange {
                name: name.to_string(),
                index,
            });
        }
        Ok(members.remove(index))
    }

    /// Top-most node containing `point`. Interfaces sit above classes and
    /// later boxes above earlier ones.
    pub fn node_at(&self, point: egui::Pos2) -> Option<NodeId> {
        self.doc
            .interfaces
            .iter()
            .rev()
            .chain(self.doc.classes.iter().rev())
            .find(|n| n.rect(self.sizes.get(n.id)).contains(point))
            .map(|n| n.id)
    }

    /// Removes every node, relationship and primitive and resets the tool.
    pub fn clear(&mut self) {
        for visual in self.visuals.values() {
            visual.detach(&mut self.canvas);
        }
        self.visuals.clear();
        self.subscriptions.clear();
        self.index.clear();
        self.sizes.rendered.clear();
        self.doc = DiagramDocument::default();
        self.mode = ToolMode::Idle;
        self.grab = None;
        debug!("Cleared diagram");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Primitive, Scene};
    use proptest::prelude::*;

    fn defaults(
        _: RelationshipKind,
        _: &ElementNode,
        _: &ElementNode,
    ) -> Option<RelationshipDetails> {
        Some(RelationshipDetails::default())
    }

    fn connect(diagram: &mut Diagram<Scene>, tool: Tool, a: NodeId, b: NodeId) -> RelationshipId {
        diagram.handle_tool_selection(tool).unwrap();
        assert_eq!(
            diagram.click_node(a, defaults).unwrap(),
            ClickOutcome::PendingStart(a)
        );
        match diagram.click_node(b, defaults).unwrap() {
            ClickOutcome::Created(rid) => rid,
            other => panic!("expected a relationship, got {other:?}"),
        }
    }

    fn two_classes() -> (Diagram<Scene>, NodeId, NodeId) {
        let mut diagram = Diagram::new(Scene::new());
        let a = diagram.create_class_box("A", Point::new(0.0, 0.0)).unwrap();
        let b = diagram.create_class_box("B", Point::new(200.0, 0.0)).unwrap();
        (diagram, a, b)
    }

    #[test]
    fn association_between_a_and_b() {
        let (mut diagram, a, b) = two_classes();
        let rid = connect(&mut diagram, Tool::Association, a, b);

        let r = diagram.document().relationship(rid).unwrap();
        assert_eq!(r.kind, RelationshipKind::Association);
        assert_eq!((r.start_name.as_str(), r.end_name.as_str()), ("A", "B"));
        assert_eq!(r.label, "Association");
        assert_eq!((r.start_multiplicity.as_str(), r.end_multiplicity.as_str()), ("1", "1"));

        let visual = diagram.visual(rid).unwrap();
        assert_eq!(
            diagram.canvas().get(visual.line_id()),
            Some(&Primitive::Line {
                a: egui::pos2(100.0, 25.0),
                b: egui::pos2(200.0, 25.0),
            })
        );
        assert_eq!(diagram.active_tool(), None);
    }

    #[test]
    fn deleting_an_endpoint_cascades() {
        let (mut diagram, a, b) = two_classes();
        connect(&mut diagram, Tool::Association, a, b);
        assert_eq!(diagram.delete_selected_element("A").unwrap(), 1);

        let doc = diagram.document();
        assert_eq!(doc.classes.len(), 1);
        assert_eq!(doc.classes[0].name, "B");
        assert!(doc.relationships.is_empty());
        assert!(diagram.node_id("A").is_none());
        assert!(diagram.canvas().is_empty());
    }

    #[test]
    fn second_click_on_same_node_is_ignored() {
        let (mut diagram, a, b) = two_classes();
        diagram.handle_tool_selection(Tool::Inheritance).unwrap();
        diagram.click_node(a, defaults).unwrap();
        assert_eq!(diagram.click_node(a, defaults).unwrap(), ClickOutcome::Ignored);
        assert_eq!(diagram.pending_start(), Some(a));
        assert!(matches!(
            diagram.click_node(b, defaults).unwrap(),
            ClickOutcome::Created(_)
        ));
    }

    #[test]
    fn cancelled_details_clear_pending_but_keep_the_tool() {
        let (mut diagram, a, b) = two_classes();
        diagram.handle_tool_selection(Tool::Aggregation).unwrap();
        diagram.click_node(a, defaults).unwrap();
        let outcome = diagram.click_node(b, |_, _, _| None).unwrap();
        assert_eq!(outcome, ClickOutcome::Cancelled);
        assert_eq!(diagram.pending_start(), None);
        assert_eq!(diagram.active_tool(), Some(Tool::Aggregation));
        assert!(diagram.document().relationships.is_empty());
        assert!(diagram.canvas().is_empty());
    }

    #[test]
    fn one_relationship_per_activation() {
        let (mut diagram, a, b) = two_classes();
        connect(&mut diagram, Tool::Composition, a, b);
        assert_eq!(diagram.click_node(a, defaults).unwrap(), ClickOutcome::Ignored);
        assert_eq!(diagram.click_node(b, defaults).unwrap(), ClickOutcome::Ignored);
        assert_eq!(diagram.document().relationships.len(), 1);
    }

    #[test]
    fn clicks_outside_relationship_tools_are_ignored() {
        let (mut diagram, a, _) = two_classes();
        assert_eq!(diagram.click_node(a, defaults).unwrap(), ClickOutcome::Ignored);
        diagram.handle_tool_selection(Tool::Drag).unwrap();
        assert_eq!(diagram.click_node(a, defaults).unwrap(), ClickOutcome::Ignored);
    }

    #[test]
    fn cancel_pending_resets_the_pair() {
        let (mut diagram, a, b) = two_classes();
        diagram.handle_tool_selection(Tool::Association).unwrap();
        diagram.click_node(a, defaults).unwrap();
        diagram.cancel_pending();
        assert_eq!(diagram.click_node(b, defaults).unwrap(), ClickOutcome::PendingStart(b));
    }

    #[test]
    fn tool_boxes_cascade_and_get_unique_names() {
        let mut diagram = Diagram::new(Scene::new());
        let first = diagram.handle_tool_selection(Tool::Class).unwrap().unwrap();
        let second = diagram.handle_tool_selection(Tool::Class).unwrap().unwrap();
        let iface = diagram.handle_tool_selection(Tool::Interface).unwrap().unwrap();

        let first = diagram.node(first).unwrap();
        let second = diagram.node(second).unwrap();
        let iface = diagram.node(iface).unwrap();
        assert_eq!(first.position, Point::new(100.0, 100.0));
        assert_eq!(second.position, Point::new(150.0, 100.0));
        assert_eq!(iface.position, Point::new(100.0, 100.0));
        assert_eq!(first.name, "Class1");
        assert_eq!(second.name, "Class2");
        assert_eq!(iface.name, "Interface1");
        assert_eq!(diagram.index_len(), 3);
    }

    #[test]
    fn class_tool_leaves_drag_mode() {
        let mut diagram = Diagram::new(Scene::new());
        diagram.handle_tool_selection(Tool::Drag).unwrap();
        assert_eq!(diagram.active_tool(), Some(Tool::Drag));
        diagram.handle_tool_selection(Tool::Class).unwrap();
        assert_eq!(diagram.active_tool(), None);
    }

    #[test]
    fn duplicate_and_empty_names_are_rejected() {
        let (mut diagram, _, _) = two_classes();
        assert!(matches!(
            diagram.create_interface_box("A", Point::default()),
            Err(DiagramError::DuplicateName(n)) if n == "A"
        ));
        assert!(matches!(
            diagram.create_class_box("  ", Point::default()),
            Err(DiagramError::EmptyName)
        ));
        assert!(matches!(
            diagram.rename_element("A", "B"),
            Err(DiagramError::DuplicateName(_))
        ));
        assert_eq!(diagram.document().classes[0].name, "A");
        assert_eq!(diagram.index_len(), 2);
    }

    #[test]
    fn rename_moves_index_and_relationships() {
        let (mut diagram, a, b) = two_classes();
        connect(&mut diagram, Tool::Association, a, b);
        connect(&mut diagram, Tool::Inheritance, b, a);
        diagram.rename_element("A", "Account").unwrap();

        assert!(diagram.node_id("A").is_none());
        assert_eq!(diagram.node_id("Account"), Some(a));
        assert_eq!(diagram.relationships_of("A").count(), 0);
        assert_eq!(diagram.relationships_of("Account").count(), 2);

        diagram.move_node(a, Point::new(0.0, 300.0)).unwrap();
        let rid = diagram.document().relationships[0].id;
        assert_eq!(
            diagram.visual(rid).unwrap().layout().start_point,
            egui::pos2(50.0, 300.0)
        );
    }

    #[test]
    fn drag_repositions_connectors() {
        let (mut diagram, a, b) = two_classes();
        let rid = connect(&mut diagram, Tool::Association, a, b);
        diagram.handle_tool_selection(Tool::Drag).unwrap();

        assert!(diagram.press_node(b, egui::pos2(210.0, 10.0)));
        assert!(diagram.drag_to(egui::pos2(10.0, 310.0)).unwrap());
        diagram.release();

        assert_eq!(diagram.node(b).unwrap().position, Point::new(0.0, 300.0));
        let layout = diagram.visual(rid).unwrap().layout();
        assert_eq!(layout.line, [egui::pos2(50.0, 50.0), egui::pos2(50.0, 300.0)]);
        assert!(!diagram.drag_to(egui::pos2(0.0, 0.0)).unwrap());
    }

    #[test]
    fn press_outside_drag_mode_does_nothing() {
        let (mut diagram, a, _) = two_classes();
        assert!(!diagram.press_node(a, egui::pos2(5.0, 5.0)));
        assert_eq!(diagram.dragged_node(), None);
    }

    #[test]
    fn rendered_size_moves_the_attachment_point() {
        let (mut diagram, a, b) = two_classes();
        let rid = connect(&mut diagram, Tool::Association, a, b);
        diagram.set_node_size(a, egui::vec2(150.0, 80.0)).unwrap();
        assert_eq!(
            diagram.visual(rid).unwrap().layout().start_point,
            egui::pos2(150.0, 40.0)
        );
    }

    #[test]
    fn edit_relationship_updates_labels() {
        let (mut diagram, a, b) = two_classes();
        let rid = connect(&mut diagram, Tool::Association, a, b);
        diagram
            .edit_relationship(rid, RelationshipDetails::new("employs", "", "0..*"))
            .unwrap();
        let r = diagram.document().relationship(rid).unwrap();
        assert_eq!(r.label, "employs");
        assert_eq!(r.start_multiplicity, "1");
        let mut texts: Vec<_> = diagram.canvas().texts().collect();
        texts.sort_unstable();
        assert_eq!(texts, vec!["0..*", "1", "employs"]);
    }

    #[test]
    fn delete_single_relationship() {
        let (mut diagram, a, b) = two_classes();
        let keep = connect(&mut diagram, Tool::Association, a, b);
        let gone = connect(&mut diagram, Tool::Composition, a, b);
        diagram.delete_relationship(gone).unwrap();
        assert_eq!(diagram.document().relationships.len(), 1);
        assert!(diagram.visual(gone).is_none());
        assert!(matches!(
            diagram.delete_relationship(gone),
            Err(DiagramError::UnknownRelationship(_))
        ));
        diagram.move_node(a, Point::new(0.0, 400.0)).unwrap();
        assert_eq!(diagram.canvas().len(), diagram.visual(keep).unwrap().primitive_ids().len());
    }

    #[test]
    fn member_editing() {
        let mut diagram = Diagram::new(Scene::new());
        diagram.create_class_box("Order", Point::default()).unwrap();
        diagram.create_interface_box("Payable", Point::new(300.0, 0.0)).unwrap();

        diagram.add_member("Order", Member::Attribute, "- id: u64").unwrap();
        diagram.add_member("Order", Member::Method, "+ total(): f64").unwrap();
        diagram
            .update_member("Order", Member::Attribute, 0, "- id: Uuid")
            .unwrap();
        assert_eq!(diagram.node_by_name("Order").unwrap().attributes, vec!["- id: Uuid"]);
        assert!(matches!(
            diagram.add_member("Payable", Member::Attribute, "x"),
            Err(DiagramError::AttributeOnInterface(_))
        ));
        diagram.add_member("Payable", Member::Method, "+ pay()").unwrap();
        assert_eq!(
            diagram.remove_member("Order", Member::Method, 0).unwrap(),
            "+ total(): f64"
        );
        assert!(matches!(
            diagram.remove_member("Order", Member::Method, 0),
            Err(DiagramError::MemberOutOfRange { index: 0, .. })
        ));
    }

    #[test]
    fn hit_testing_prefers_interfaces_and_later_boxes() {
        let mut diagram = Diagram::new(Scene::new());
        let c1 = diagram.create_class_box("C1", Point::new(0.0, 0.0)).unwrap();
        let c2 = diagram.create_class_box("C2", Point::new(50.0, 0.0)).unwrap();
        let i1 = diagram.create_interface_box("I1", Point::new(80.0, 0.0)).unwrap();
        assert_eq!(diagram.node_at(egui::pos2(10.0, 10.0)), Some(c1));
        assert_eq!(diagram.node_at(egui::pos2(60.0, 10.0)), Some(c2));
        assert_eq!(diagram.node_at(egui::pos2(90.0, 10.0)), Some(i1));
        assert_eq!(diagram.node_at(egui::pos2(500.0, 500.0)), None);
    }

    #[test]
    fn restore_relationship_requires_indexed_endpoints() {
        let mut diagram = Diagram::new(Scene::new());
        let record = Relationship::new(
            1,
            RelationshipKind::Association,
            "A",
            "B",
            RelationshipDetails::default(),
        );
        assert!(matches!(
            diagram.restore_relationship(&record),
            Err(DiagramError::MissingEndpoint(_))
        ));
        assert!(diagram.document().relationships.is_empty());
        assert!(diagram.canvas().is_empty());
    }

    #[test]
    fn clear_empties_everything() {
        let (mut diagram, a, b) = two_classes();
        connect(&mut diagram, Tool::Association, a, b);
        diagram.clear();
        assert!(diagram.document().is_empty());
        assert_eq!(diagram.index_len(), 0);
        assert!(diagram.canvas().is_empty());
    }

    fn build(names: usize, edges: &[(usize, usize, usize)]) -> Diagram<Scene> {
        let mut diagram = Diagram::new(Scene::new());
        let ids: Vec<NodeId> = (0..names)
            .map(|i| {
                diagram
                    .create_class_box(format!("N{i}"), Point::new(i as f32 * 150.0, (i % 3) as f32 * 90.0))
                    .unwrap()
            })
            .collect();
        for &(s, e, k) in edges {
            let (s, e) = (s % names, e % names);
            if s == e {
                continue;
            }
            let tool = [Tool::Association, Tool::Aggregation, Tool::Composition, Tool::Inheritance][k % 4];
            connect(&mut diagram, tool, ids[s], ids[e]);
        }
        diagram
    }

    proptest! {
        #[test]
        fn reposition_is_idempotent(
            ax in -400.0f32..400.0, ay in -400.0f32..400.0,
            bx in -400.0f32..400.0, by in -400.0f32..400.0,
            kind in 0usize..4,
        ) {
            let mut diagram = Diagram::new(Scene::new());
            let a = diagram.create_class_box("A", Point::new(ax, ay)).unwrap();
            let b = diagram.create_class_box("B", Point::new(bx, by)).unwrap();
            let tool = [Tool::Association, Tool::Aggregation, Tool::Composition, Tool::Inheritance][kind];
            let rid = connect(&mut diagram, tool, a, b);

            let snapshot = |d: &Diagram<Scene>| {
                d.canvas().iter().map(|(id, p)| (id, p.clone())).collect::<Vec<_>>()
            };
            diagram.reposition_relationship(rid);
            let first = snapshot(&diagram);
            let layout = diagram.visual(rid).unwrap().layout().clone();
            diagram.reposition_relationship(rid);
            prop_assert_eq!(first, snapshot(&diagram));
            prop_assert_eq!(&layout, diagram.visual(rid).unwrap().layout());
        }

        #[test]
        fn rename_propagates_to_every_relationship(
            names in 2usize..6,
            edges in proptest::collection::vec((0usize..6, 0usize..6, 0usize..4), 0..12),
            target in 0usize..6,
        ) {
            let mut diagram = build(names, &edges);
            let old = format!("N{}", target % names);
            let before: Vec<RelationshipId> = diagram.relationships_of(&old).map(|r| r.id).collect();
            diagram.rename_element(&old, "Renamed").unwrap();

            prop_assert_eq!(diagram.relationships_of(&old).count(), 0);
            let after: Vec<RelationshipId> = diagram.relationships_of("Renamed").map(|r| r.id).collect();
            prop_assert_eq!(before, after);
            prop_assert!(diagram.node_id(&old).is_none());
            prop_assert!(diagram.node_id("Renamed").is_some());
            prop_assert_eq!(diagram.index_len(), names);
        }

        #[test]
        fn delete_removes_every_reference(
            names in 2usize..6,
            edges in proptest::collection::vec((0usize..6, 0usize..6, 0usize..4), 0..12),
            target in 0usize..6,
        ) {
            let mut diagram = build(names, &edges);
            let name = format!("N{}", target % names);
            diagram.delete_selected_element(&name).unwrap();

            prop_assert_eq!(diagram.relationships_of(&name).count(), 0);
            prop_assert!(diagram.node_id(&name).is_none());
            prop_assert_eq!(diagram.index_len(), names - 1);
            let live: usize = diagram
                .document()
                .relationships
                .iter()
                .map(|r| diagram.visual(r.id).unwrap().primitive_ids().len())
                .sum();
            prop_assert_eq!(diagram.canvas().len(), live);
        }
    }
}
