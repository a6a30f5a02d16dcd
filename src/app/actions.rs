use std::path::Path;

use log::error;
use sanuml::diagram::{ClickOutcome, Tool};
use sanuml::error::DiagramError;
use sanuml::model::{Member, NodeId, RelationshipDetails};
use sanuml::persist;
use sanuml::settings;

use super::{DiagramApp, Selection};

impl DiagramApp {
    fn report(&mut self, what: &str, err: DiagramError) {
        error!(err:% = err; "{what} failed");
        self.status = Some(format!("{what} failed: {err}"));
    }

    pub(super) fn apply_tool(&mut self, tool: Tool) {
        match self.diagram.handle_tool_selection(tool) {
            Ok(Some(id)) => {
                self.select(Some(Selection::Node(id)));
                self.status = Some(format!("Added {}", self.edit.name));
            }
            Ok(None) => {
                self.status = Some(match tool.relationship_kind() {
                    Some(kind) => format!("{kind}: click the start element, then the end element"),
                    None => format!("{} mode", tool.label()),
                });
            }
            Err(e) => self.report("Adding element", e),
        }
    }

    pub(super) fn click_node(&mut self, id: NodeId) {
        match self
            .diagram
            .click_node(id, |_, _, _| Some(RelationshipDetails::default()))
        {
            Ok(ClickOutcome::Created(rid)) => {
                self.select(Some(Selection::Relationship(rid)));
                self.status = Some("Relationship created".to_string());
            }
            Ok(ClickOutcome::PendingStart(_)) => {
                self.status = Some("Now click the end element".to_string());
            }
            Ok(ClickOutcome::Cancelled) => self.status = None,
            Ok(ClickOutcome::Ignored) => self.select(Some(Selection::Node(id))),
            Err(e) => self.report("Creating relationship", e),
        }
    }

    pub(super) fn delete_selected(&mut self) {
        let result = match self.selected {
            Some(Selection::Node(id)) => match self.diagram.node(id).map(|n| n.name.clone()) {
                Some(name) => self.diagram.delete_selected_element(&name).map(|_| ()),
                None => Ok(()),
            },
            Some(Selection::Relationship(rid)) => self.diagram.delete_relationship(rid),
            None => return,
        };
        match result {
            Ok(()) => {
                self.select(None);
                self.status = Some("Deleted".to_string());
            }
            Err(e) => self.report("Delete", e),
        }
    }

    pub(super) fn rename_selected(&mut self) {
        let Some(Selection::Node(id)) = self.selected else {
            return;
        };
        let Some(old) = self.diagram.node(id).map(|n| n.name.clone()) else {
            return;
        };
        let new = self.edit.name.trim().to_string();
        match self.diagram.rename_element(&old, &new) {
            Ok(()) => self.status = Some(format!("Renamed {old} to {new}")),
            Err(e) => {
                self.edit.name = old;
                self.report("Rename", e);
            }
        }
    }

    pub(super) fn add_member(&mut self, member: Member) {
        let Some(Selection::Node(id)) = self.selected else {
            return;
        };
        let Some(name) = self.diagram.node(id).map(|n| n.name.clone()) else {
            return;
        };
        let buffer = match member {
            Member::Attribute => &mut self.edit.new_attribute,
            Member::Method => &mut self.edit.new_method,
        };
        let text = std::mem::take(buffer).trim().to_string();
        if text.is_empty() {
            return;
        }
        if let Err(e) = self.diagram.add_member(&name, member, text) {
            self.report("Adding member", e);
        }
    }

    pub(super) fn remove_member(&mut self, name: &str, member: Member, index: usize) {
        if let Err(e) = self.diagram.remove_member(name, member, index) {
            self.report("Removing member", e);
        }
    }

    pub(super) fn apply_relationship_edit(&mut self) {
        let Some(Selection::Relationship(rid)) = self.selected else {
            return;
        };
        let details = RelationshipDetails::new(
            self.edit.label.trim(),
            self.edit.start_multiplicity.trim(),
            self.edit.end_multiplicity.trim(),
        );
        match self.diagram.edit_relationship(rid, details) {
            Ok(()) => self.select(Some(Selection::Relationship(rid))),
            Err(e) => self.report("Editing relationship", e),
        }
    }

    pub(super) fn new_diagram(&mut self) {
        self.diagram.clear();
        self.select(None);
        self.status = Some("New diagram".to_string());
    }

    fn save_to(&mut self, path: &Path) {
        match persist::save(&self.diagram, path) {
            Ok(()) => {
                self.file_path = path.display().to_string();
                self.status = Some(format!("Saved {}", self.file_path));
                if self.settings.file_path != self.file_path {
                    self.settings.file_path = self.file_path.clone();
                    self.persist_settings();
                }
            }
            Err(e) => self.report("Save", e),
        }
    }

    fn persist_settings(&mut self) {
        if let Err(e) = settings::save_settings(&self.settings_path, &self.settings) {
            self.report("Settings save", e);
        }
    }

    pub(super) fn save_to_path(&mut self) {
        let path = self.file_path.clone();
        self.save_to(Path::new(&path));
    }

    pub(super) fn save_json_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&self.file_path)
            .add_filter("JSON", &["json"])
            .save_file()
        {
            self.save_to(&path);
        }
    }

    pub(super) fn open_json_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            match persist::load(&mut self.diagram, &path) {
                Ok(report) => {
                    self.file_path = path.display().to_string();
                    self.select(None);
                    self.status = Some(if report.is_complete() {
                        format!("Loaded {}", self.file_path)
                    } else {
                        format!(
                            "Loaded {} ({} entries skipped, see log)",
                            self.file_path, report.skipped
                        )
                    });
                }
                Err(e) => self.report("Open", e),
            }
        }
    }
}
