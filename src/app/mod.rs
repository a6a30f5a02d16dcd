use std::path::PathBuf;

use eframe::egui;
use sanuml::canvas::Scene;
use sanuml::diagram::Diagram;
use sanuml::model::{NodeId, RelationshipId};
use sanuml::settings::{self, EditorSettings};

mod actions;
mod render;
mod update;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Selection {
    Node(NodeId),
    Relationship(RelationshipId),
}

#[derive(Clone, Copy, Debug)]
struct View {
    pan_screen: egui::Vec2,
    zoom: f32,
}

impl Default for View {
    fn default() -> Self {
        Self {
            pan_screen: egui::Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl View {
    fn world_to_screen(&self, origin: egui::Pos2, world: egui::Pos2) -> egui::Pos2 {
        origin + self.pan_screen + world.to_vec2() * self.zoom
    }

    fn screen_to_world(&self, origin: egui::Pos2, screen: egui::Pos2) -> egui::Pos2 {
        ((screen - origin - self.pan_screen) / self.zoom).to_pos2()
    }

    fn zoom_about_screen_point(
        &mut self,
        origin: egui::Pos2,
        screen_point: egui::Pos2,
        zoom_delta: f32,
    ) {
        let before = self.screen_to_world(origin, screen_point);
        self.zoom = (self.zoom * zoom_delta).clamp(0.1, 8.0);
        let after_screen = self.world_to_screen(origin, before);
        self.pan_screen += screen_point - after_screen;
    }
}

/// Text being edited in the properties panel for the current selection.
#[derive(Clone, Debug, Default)]
struct EditBuffers {
    name: String,
    new_attribute: String,
    new_method: String,
    label: String,
    start_multiplicity: String,
    end_multiplicity: String,
}

pub struct DiagramApp {
    diagram: Diagram<Scene>,
    settings: EditorSettings,
    settings_path: PathBuf,
    file_path: String,
    view: View,
    selected: Option<Selection>,
    edit: EditBuffers,
    status: Option<String>,
}

impl DiagramApp {
    pub fn new(settings: EditorSettings) -> Self {
        Self::with_settings_path(settings, settings::settings_path())
    }

    fn with_settings_path(settings: EditorSettings, settings_path: PathBuf) -> Self {
        let diagram = Diagram::with_node_size(Scene::new(), settings.node_size());
        Self {
            diagram,
            file_path: settings.file_path.clone(),
            settings,
            settings_path,
            view: View::default(),
            selected: None,
            edit: EditBuffers::default(),
            status: None,
        }
    }

    fn select(&mut self, selection: Option<Selection>) {
        self.selected = selection;
        self.edit = EditBuffers::default();
        match selection {
            Some(Selection::Node(id)) => {
                if let Some(node) = self.diagram.node(id) {
                    self.edit.name = node.name.clone();
                }
            }
            Some(Selection::Relationship(id)) => {
                if let Some(r) = self.diagram.document().relationship(id) {
                    self.edit.label = r.label.clone();
                    self.edit.start_multiplicity = r.start_multiplicity.clone();
                    self.edit.end_multiplicity = r.end_multiplicity.clone();
                }
            }
            None => {}
        }
    }
}
