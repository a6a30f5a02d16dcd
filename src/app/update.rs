use eframe::egui;
use log::{debug, warn};
use sanuml::diagram::Tool;
use sanuml::geometry::distance_to_segment;
use sanuml::model::{ElementKind, Member};

use super::render::{
    NodeStyle, draw_background, draw_node, draw_scene, draw_selected_line, node_size_for,
    tool_button,
};
use super::{DiagramApp, Selection};

impl eframe::App for DiagramApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.diagram.cancel_pending();
            self.diagram.release();
        }
        if !ctx.wants_keyboard_input() {
            if ctx.input(|i| i.key_pressed(egui::Key::Delete)) {
                self.delete_selected();
            }
            if ctx.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::S)) {
                self.save_to_path();
            }
            if ctx.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::O)) {
                self.open_json_dialog();
            }
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        self.new_diagram();
                        ui.close();
                    }
                    if ui.button("Open... (⌘O)").clicked() {
                        self.open_json_dialog();
                        ui.close();
                    }
                    if ui.button("Save (⌘S)").clicked() {
                        self.save_to_path();
                        ui.close();
                    }
                    if ui.button("Save As...").clicked() {
                        self.save_json_dialog();
                        ui.close();
                    }
                    ui.separator();
                    ui.small("Quick save path:");
                    ui.text_edit_singleline(&mut self.file_path);
                });
                ui.separator();
                let active = self.diagram.active_tool();
                for tool in Tool::ALL {
                    if tool_button(ui, tool, active == Some(tool)) {
                        self.apply_tool(tool);
                    }
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let tool = self.diagram.active_tool().map_or("Idle", Tool::label);
                ui.label(format!("Tool: {tool}"));
                ui.separator();
                ui.label(format!("{:.0}%", self.view.zoom * 100.0));
                ui.separator();
                if let Some(status) = &self.status {
                    ui.label(status);
                }
            });
        });

        egui::SidePanel::right("right_panel")
            .resizable(true)
            .min_width(220.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Properties");
                    ui.separator();
                    self.properties_panel(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let (rect, response) =
                ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
            let origin = rect.min;

            let scroll_delta = ctx.input(|i| i.raw_scroll_delta.y);
            if scroll_delta.abs() > 0.0 {
                if let Some(hover_pos) = ctx.input(|i| i.pointer.hover_pos()) {
                    if rect.contains(hover_pos) {
                        let zoom_delta = (1.0 + scroll_delta * 0.001).clamp(0.8, 1.25);
                        self.view.zoom_about_screen_point(origin, hover_pos, zoom_delta);
                    }
                }
            }
            if response.dragged_by(egui::PointerButton::Secondary) {
                self.view.pan_screen += response.drag_delta();
            }

            let default_size = self.settings.node_size();
            let sizes: Vec<_> = self
                .diagram
                .document()
                .nodes()
                .map(|n| (n.id, node_size_for(n, default_size)))
                .collect();
            for (id, size) in sizes {
                if let Err(e) = self.diagram.set_node_size(id, size) {
                    warn!(id = id, err:% = e; "Failed to record node size");
                }
            }

            let pointer_world = response
                .interact_pointer_pos()
                .map(|p| self.view.screen_to_world(origin, p));

            if response.drag_started_by(egui::PointerButton::Primary) {
                if let Some(p) = pointer_world {
                    if let Some(id) = self.diagram.node_at(p) {
                        if self.diagram.press_node(id, p) {
                            self.select(Some(Selection::Node(id)));
                        }
                    }
                }
            }
            if response.dragged_by(egui::PointerButton::Primary) {
                if let Some(p) = pointer_world {
                    if let Err(e) = self.diagram.drag_to(p) {
                        warn!(err:% = e; "Drag failed");
                        self.diagram.release();
                    }
                }
            }
            if response.drag_stopped() {
                self.diagram.release();
            }

            if response.clicked() {
                if let Some(p) = pointer_world {
                    self.click_canvas(p);
                }
            }

            let painter = ui.painter_at(rect);
            draw_background(&painter, rect, &self.view);
            let pending = self.diagram.pending_start();
            for node in self.diagram.document().nodes() {
                let Some(world_rect) = self.diagram.node_rect(node.id) else {
                    continue;
                };
                let style = NodeStyle {
                    selected: self.selected == Some(Selection::Node(node.id)),
                    pending: pending == Some(node.id),
                };
                draw_node(&painter, origin, &self.view, node, world_rect, style);
            }
            if let Some(Selection::Relationship(rid)) = self.selected {
                if let Some(visual) = self.diagram.visual(rid) {
                    draw_selected_line(&painter, origin, &self.view, visual.layout().line);
                }
            }
            draw_scene(&painter, origin, &self.view, self.diagram.canvas());
        });
    }
}

impl DiagramApp {
    fn click_canvas(&mut self, p: egui::Pos2) {
        if let Some(id) = self.diagram.node_at(p) {
            self.click_node(id);
            return;
        }
        let threshold = 6.0 / self.view.zoom;
        let hit = self
            .diagram
            .document()
            .relationships
            .iter()
            .filter_map(|r| {
                let line = self.diagram.visual(r.id)?.layout().line;
                let d = distance_to_segment(p, line[0], line[1]);
                (d <= threshold).then_some((r.id, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(rid, _)| rid);
        debug!(hit:? = hit; "Canvas click");
        self.select(hit.map(Selection::Relationship));
    }

    fn properties_panel(&mut self, ui: &mut egui::Ui) {
        match self.selected {
            Some(Selection::Node(id)) => {
                let Some(node) = self.diagram.node(id).cloned() else {
                    ui.label("Nothing selected");
                    return;
                };
                ui.label(node.kind.label());
                ui.horizontal(|ui| {
                    let edit = ui.text_edit_singleline(&mut self.edit.name);
                    let submitted =
                        edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if ui.button("Rename").clicked() || submitted {
                        self.rename_selected();
                    }
                });
                ui.separator();

                let sections: &[Member] = match node.kind {
                    ElementKind::Class => &[Member::Attribute, Member::Method],
                    ElementKind::Interface => &[Member::Method],
                };
                let mut removal = None;
                for &member in sections {
                    ui.label(match member {
                        Member::Attribute => "Attributes",
                        Member::Method => "Methods",
                    });
                    for (index, entry) in node.members(member).iter().enumerate() {
                        ui.horizontal(|ui| {
                            if ui.small_button("✕").clicked() {
                                removal = Some((member, index));
                            }
                            ui.label(entry);
                        });
                    }
                    let mut add = false;
                    ui.horizontal(|ui| {
                        let buffer = match member {
                            Member::Attribute => &mut self.edit.new_attribute,
                            Member::Method => &mut self.edit.new_method,
                        };
                        let edit = ui.text_edit_singleline(buffer);
                        add = ui.button("Add").clicked()
                            || (edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)));
                    });
                    if add {
                        self.add_member(member);
                    }
                    ui.separator();
                }
                if let Some((member, index)) = removal {
                    self.remove_member(&node.name, member, index);
                }
                if ui.button("Delete element").clicked() {
                    self.delete_selected();
                }
            }
            Some(Selection::Relationship(rid)) => {
                let Some(record) = self.diagram.document().relationship(rid).cloned() else {
                    ui.label("Nothing selected");
                    return;
                };
                ui.label(format!(
                    "{}: {} → {}",
                    record.kind, record.start_name, record.end_name
                ));
                egui::Grid::new("relationship_fields")
                    .num_columns(2)
                    .show(ui, |ui| {
                        ui.label("Name");
                        ui.text_edit_singleline(&mut self.edit.label);
                        ui.end_row();
                        ui.label("Start multiplicity");
                        ui.text_edit_singleline(&mut self.edit.start_multiplicity);
                        ui.end_row();
                        ui.label("End multiplicity");
                        ui.text_edit_singleline(&mut self.edit.end_multiplicity);
                        ui.end_row();
                    });
                ui.horizontal(|ui| {
                    if ui.button("Apply").clicked() {
                        self.apply_relationship_edit();
                    }
                    if ui.button("Delete").clicked() {
                        self.delete_selected();
                    }
                });
            }
            None => {
                ui.label("Nothing selected");
                ui.small("Pick a tool above. Right-drag pans, scroll zooms.");
            }
        }
    }
}
