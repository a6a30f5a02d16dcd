//! JSON persistence and the two-phase restore.
//!
//! Relationships are stored by endpoint name, so a restore first rebuilds
//! every class and interface (filling the name index) and only then replays
//! relationships through their builders. Entries that cannot be restored
//! are logged and counted, never fatal.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::diagram::Diagram;
use crate::error::Result;
use crate::model::{
    DiagramDocument, Member, Point, Relationship, RelationshipDetails, RelationshipKind,
};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    #[serde(default)]
    pub classes: Vec<ClassRecord>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceRecord>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClassRecord {
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InterfaceRecord {
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub methods: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub start_element_name: String,
    #[serde(default)]
    pub end_element_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_multiplicity: String,
    #[serde(default)]
    pub end_multiplicity: String,
}

impl From<&DiagramDocument> for DocumentRecord {
    fn from(doc: &DiagramDocument) -> Self {
        Self {
            classes: doc
                .classes
                .iter()
                .map(|n| ClassRecord {
                    name: n.name.clone(),
                    x: n.position.x,
                    y: n.position.y,
                    attributes: n.attributes.clone(),
                    methods: n.methods.clone(),
                })
                .collect(),
            interfaces: doc
                .interfaces
                .iter()
                .map(|n| InterfaceRecord {
                    name: n.name.clone(),
                    x: n.position.x,
                    y: n.position.y,
                    methods: n.methods.clone(),
                })
                .collect(),
            relationships: doc
                .relationships
                .iter()
                .map(|r| RelationshipRecord {
                    kind: r.kind.label().to_string(),
                    start_element_name: r.start_name.clone(),
                    end_element_name: r.end_name.clone(),
                    name: r.label.clone(),
                    start_multiplicity: r.start_multiplicity.clone(),
                    end_multiplicity: r.end_multiplicity.clone(),
                })
                .collect(),
        }
    }
}

impl RelationshipRecord {
    fn to_relationship(&self) -> Result<Relationship> {
        let kind: RelationshipKind = self.kind.parse()?;
        Ok(Relationship::new(
            0,
            kind,
            &self.start_element_name,
            &self.end_element_name,
            RelationshipDetails::new(
                &self.name,
                &self.start_multiplicity,
                &self.end_multiplicity,
            ),
        ))
    }
}

/// Counts of what a restore rebuilt and what it had to drop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub classes: usize,
    pub interfaces: usize,
    pub relationships: usize,
    pub skipped: usize,
}

impl RestoreReport {
    pub fn is_complete(&self) -> bool {
        self.skipped == 0
    }
}

pub fn to_json(doc: &DiagramDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(&DocumentRecord::from(doc))?)
}

pub fn from_json(json: &str) -> Result<DocumentRecord> {
    Ok(serde_json::from_str(json)?)
}

/// Writes through a sibling temporary file so the target is either the old
/// document or the complete new one.
pub fn write(doc: &DiagramDocument, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = to_json(doc)?;
    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    if let Err(e) = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    info!(path:% = path.display(); "Saved diagram");
    Ok(())
}

pub fn read(path: impl AsRef<Path>) -> Result<DocumentRecord> {
    let json = fs::read_to_string(path)?;
    from_json(&json)
}

pub fn save<C: Canvas>(diagram: &Diagram<C>, path: impl AsRef<Path>) -> Result<()> {
    write(diagram.document(), path)
}

/// Reads `path` and, only if that succeeds, replaces the diagram's content
/// with it.
pub fn load<C: Canvas>(diagram: &mut Diagram<C>, path: impl AsRef<Path>) -> Result<RestoreReport> {
    let path = path.as_ref();
    let record = read(path)?;
    let report = restore(diagram, &record);
    info!(
        path:% = path.display(),
        classes = report.classes,
        interfaces = report.interfaces,
        relationships = report.relationships,
        skipped = report.skipped;
        "Loaded diagram"
    );
    Ok(report)
}

/// Clears the diagram and rebuilds it from `record`: all elements first,
/// then all relationships.
pub fn restore<C: Canvas>(diagram: &mut Diagram<C>, record: &DocumentRecord) -> RestoreReport {
    diagram.clear();
    let mut report = RestoreReport::default();
    restore_elements(diagram, record, &mut report);
    restore_relationships(diagram, &record.relationships, &mut report);
    report
}

/// Phase one: classes, then interfaces. No relationship is touched.
pub fn restore_elements<C: Canvas>(
    diagram: &mut Diagram<C>,
    record: &DocumentRecord,
    report: &mut RestoreReport,
) {
    for class in &record.classes {
        match diagram.create_class_box(&class.name, Point::new(class.x, class.y)) {
            Ok(_) => {
                restore_members(diagram, &class.name, Member::Attribute, &class.attributes);
                restore_members(diagram, &class.name, Member::Method, &class.methods);
                report.classes += 1;
            }
            Err(e) => {
                warn!(name = class.name.as_str(), err:% = e; "Skipping class");
                report.skipped += 1;
            }
        }
    }
    for interface in &record.interfaces {
        match diagram.create_interface_box(&interface.name, Point::new(interface.x, interface.y)) {
            Ok(_) => {
                restore_members(diagram, &interface.name, Member::Method, &interface.methods);
                report.interfaces += 1;
            }
            Err(e) => {
                warn!(name = interface.name.as_str(), err:% = e; "Skipping interface");
                report.skipped += 1;
            }
        }
    }
}

fn restore_members<C: Canvas>(
    diagram: &mut Diagram<C>,
    name: &str,
    member: Member,
    items: &[String],
) {
    for item in items {
        if let Err(e) = diagram.add_member(name, member, item.as_str()) {
            warn!(name = name, err:% = e; "Skipping member");
        }
    }
}

/// Phase two: each relationship goes through its kind's builder, which
/// resolves both endpoints in the name index.
pub fn restore_relationships<C: Canvas>(
    diagram: &mut Diagram<C>,
    records: &[RelationshipRecord],
    report: &mut RestoreReport,
) {
    for record in records {
        let restored = record
            .to_relationship()
            .and_then(|r| diagram.restore_relationship(&r));
        match restored {
            Ok(_) => report.relationships += 1,
            Err(e) => {
                warn!(
                    kind = record.kind.as_str(),
                    start = record.start_element_name.as_str(),
                    end = record.end_element_name.as_str(),
                    err:% = e;
                    "Skipping relationship"
                );
                report.skipped += 1;
            }
        }
    }
}
