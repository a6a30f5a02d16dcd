use eframe::egui;
use sanuml::canvas::{Fill, Primitive, Scene};
use sanuml::diagram::Tool;
use sanuml::model::{ElementKind, ElementNode, Member};

use super::View;

const FONT_SIZE: f32 = 13.0;
const LINE_HEIGHT: f32 = 16.0;
const CHAR_WIDTH: f32 = 7.5;
const PADDING: f32 = 8.0;
const INTERFACE_STEREOTYPE: &str = "«interface»";

pub(super) fn tool_button(ui: &mut egui::Ui, tool: Tool, active: bool) -> bool {
    ui.selectable_label(active, tool.label()).clicked()
}

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect, view: &View) {
    let bg = painter.ctx().style().visuals.extreme_bg_color;
    painter.rect_filled(rect, 0.0, bg);
    let grid_color = egui::Color32::from_gray(60);
    let spacing_screen = 50.0 * view.zoom;
    if spacing_screen < 24.0 {
        return;
    }
    let start = rect.min + view.pan_screen;
    let mut x = ((rect.min.x - start.x) / spacing_screen).floor() * spacing_screen + start.x;
    while x < rect.max.x {
        painter.line_segment(
            [egui::pos2(x, rect.min.y), egui::pos2(x, rect.max.y)],
            egui::Stroke::new(1.0, grid_color),
        );
        x += spacing_screen;
    }
    let mut y = ((rect.min.y - start.y) / spacing_screen).floor() * spacing_screen + start.y;
    while y < rect.max.y {
        painter.line_segment(
            [egui::pos2(rect.min.x, y), egui::pos2(rect.max.x, y)],
            egui::Stroke::new(1.0, grid_color),
        );
        y += spacing_screen;
    }
}

fn header_rows(node: &ElementNode) -> usize {
    match node.kind {
        ElementKind::Class => 1,
        ElementKind::Interface => 2,
    }
}

/// World-space box size that fits the node's header and members, never
/// smaller than `default`.
pub(super) fn node_size_for(node: &ElementNode, default: egui::Vec2) -> egui::Vec2 {
    let attributes = node.members(Member::Attribute);
    let methods = node.members(Member::Method);
    let stereotype = match node.kind {
        ElementKind::Class => 0,
        ElementKind::Interface => INTERFACE_STEREOTYPE.chars().count(),
    };
    let longest = attributes
        .iter()
        .chain(methods)
        .map(|s| s.chars().count())
        .chain([node.name.chars().count(), stereotype])
        .max()
        .unwrap_or(0);
    let rows = header_rows(node) + attributes.len() + methods.len();
    let width = longest as f32 * CHAR_WIDTH + 2.0 * PADDING;
    let height = rows as f32 * LINE_HEIGHT + 2.0 * PADDING;
    egui::vec2(width.max(default.x), height.max(default.y))
}

pub(super) struct NodeStyle {
    pub selected: bool,
    pub pending: bool,
}

pub(super) fn draw_node(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    node: &ElementNode,
    world_rect: egui::Rect,
    style: NodeStyle,
) {
    let visuals = painter.ctx().style().visuals.clone();
    let rect = egui::Rect::from_min_max(
        view.world_to_screen(origin, world_rect.min),
        view.world_to_screen(origin, world_rect.max),
    );
    let stroke_color = if style.pending {
        egui::Color32::from_rgb(200, 140, 40)
    } else if style.selected {
        visuals.selection.stroke.color
    } else {
        visuals.text_color()
    };
    let stroke = egui::Stroke::new(if style.selected || style.pending { 2.0 } else { 1.0 }, stroke_color);
    painter.rect_filled(rect, 0.0, visuals.panel_fill);
    painter.rect_stroke(rect, 0.0, stroke, egui::StrokeKind::Inside);

    let font = egui::FontId::proportional(FONT_SIZE * view.zoom);
    let line = LINE_HEIGHT * view.zoom;
    let pad = PADDING * view.zoom;
    let text_color = visuals.text_color();
    let mut y = rect.min.y + pad;
    if node.kind == ElementKind::Interface {
        painter.text(
            egui::pos2(rect.center().x, y),
            egui::Align2::CENTER_TOP,
            INTERFACE_STEREOTYPE,
            font.clone(),
            text_color,
        );
        y += line;
    }
    painter.text(
        egui::pos2(rect.center().x, y),
        egui::Align2::CENTER_TOP,
        &node.name,
        egui::FontId::proportional(FONT_SIZE * view.zoom * 1.1),
        text_color,
    );
    y += line;

    let sections: &[Member] = match node.kind {
        ElementKind::Class => &[Member::Attribute, Member::Method],
        ElementKind::Interface => &[Member::Method],
    };
    for &member in sections {
        let entries = node.members(member);
        if entries.is_empty() {
            continue;
        }
        painter.line_segment([egui::pos2(rect.min.x, y), egui::pos2(rect.max.x, y)], stroke);
        for entry in entries {
            painter.text(
                egui::pos2(rect.min.x + pad, y),
                egui::Align2::LEFT_TOP,
                entry,
                font.clone(),
                text_color,
            );
            y += line;
        }
    }
}

/// Paints every connector primitive in the scene.
pub(super) fn draw_scene(painter: &egui::Painter, origin: egui::Pos2, view: &View, scene: &Scene) {
    let visuals = painter.ctx().style().visuals.clone();
    let stroke = egui::Stroke::new(1.5, visuals.text_color());
    let font = egui::FontId::proportional(FONT_SIZE * view.zoom);
    for (_, primitive) in scene.iter() {
        match primitive {
            Primitive::Line { a, b } => {
                painter.line_segment(
                    [view.world_to_screen(origin, *a), view.world_to_screen(origin, *b)],
                    stroke,
                );
            }
            Primitive::Polygon { points, fill } => {
                let fill_color = match fill {
                    Fill::Background => visuals.extreme_bg_color,
                    Fill::Foreground => visuals.text_color(),
                };
                let screen = points
                    .iter()
                    .map(|p| view.world_to_screen(origin, *p))
                    .collect();
                painter.add(egui::Shape::convex_polygon(screen, fill_color, stroke));
            }
            Primitive::Text { pos, text } => {
                painter.text(
                    view.world_to_screen(origin, *pos),
                    egui::Align2::CENTER_CENTER,
                    text,
                    font.clone(),
                    visuals.text_color(),
                );
            }
        }
    }
}

pub(super) fn draw_selected_line(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    line: [egui::Pos2; 2],
) {
    let color = painter.ctx().style().visuals.selection.stroke.color;
    painter.line_segment(
        [
            view.world_to_screen(origin, line[0]),
            view.world_to_screen(origin, line[1]),
        ],
        egui::Stroke::new(4.0, color.gamma_multiply(0.6)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanuml::model::Point;

    #[test]
    fn empty_node_keeps_default_size() {
        let node = ElementNode::new(1, ElementKind::Class, "A", Point::new(0.0, 0.0));
        let size = node_size_for(&node, egui::vec2(100.0, 50.0));
        assert_eq!(size, egui::vec2(100.0, 50.0));
    }

    #[test]
    fn only_interfaces_are_sized_for_the_stereotype() {
        let default = egui::vec2(10.0, 10.0);
        let class = ElementNode::new(1, ElementKind::Class, "A", Point::new(0.0, 0.0));
        let interface = ElementNode::new(2, ElementKind::Interface, "A", Point::new(0.0, 0.0));
        assert_eq!(node_size_for(&class, default).x, CHAR_WIDTH + 2.0 * PADDING);
        assert_eq!(
            node_size_for(&interface, default).x,
            INTERFACE_STEREOTYPE.chars().count() as f32 * CHAR_WIDTH + 2.0 * PADDING
        );
    }

    #[test]
    fn members_grow_the_box() {
        let mut node = ElementNode::new(1, ElementKind::Class, "A", Point::new(0.0, 0.0));
        node.attributes = vec!["a".into(), "b".into(), "c".into()];
        node.methods = vec!["a_rather_long_method_name(arg: Type)".into()];
        let size = node_size_for(&node, egui::vec2(100.0, 50.0));
        assert!(size.x > 100.0);
        assert!(size.y > 50.0);
    }
}
