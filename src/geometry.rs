//! Pure geometry used to attach relationship connectors to node boxes.
//!
//! Every function here is side-effect free and works on the egui primitive
//! types in world coordinates (y grows downwards).

use eframe::egui;

/// Length of an aggregation/composition diamond, tip to tail.
pub const DIAMOND_LENGTH: f32 = 20.0;
/// Half of the diamond's width across its short axis.
pub const DIAMOND_HALF_WIDTH: f32 = 7.0;
/// Distance from the inheritance triangle's tip to its base.
pub const TRIANGLE_HEIGHT: f32 = 15.0;
/// Half of the inheritance triangle's base.
pub const TRIANGLE_HALF_BASE: f32 = 10.0;

pub fn rotate_vec2(v: egui::Vec2, angle: f32) -> egui::Vec2 {
    let sin = angle.sin();
    let cos = angle.cos();
    egui::vec2(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

pub fn distance(a: egui::Pos2, b: egui::Pos2) -> f32 {
    (b - a).length()
}

pub fn distance_to_segment(p: egui::Pos2, a: egui::Pos2, b: egui::Pos2) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let ab_len2 = ab.x * ab.x + ab.y * ab.y;
    if ab_len2 <= f32::EPSILON {
        return (p - a).length();
    }
    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

/// Angle of the `from -> to` direction in degrees, measured like `atan2`.
pub fn angle_degrees(from: egui::Pos2, to: egui::Pos2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x).to_degrees()
}

/// Edge midpoints of `rect` in the order top, right, bottom, left.
pub fn boundary_points(rect: egui::Rect) -> [egui::Pos2; 4] {
    let c = rect.center();
    [
        egui::pos2(c.x, rect.min.y),
        egui::pos2(rect.max.x, c.y),
        egui::pos2(c.x, rect.max.y),
        egui::pos2(rect.min.x, c.y),
    ]
}

/// The boundary point of `a` closest to any boundary point of `b`.
///
/// All sixteen pairs are visited in `boundary_points` order for `a` then
/// `b`; the first strictly smaller distance wins, so ties keep the earliest
/// pair. Callers compute each endpoint independently with swapped
/// arguments, which is not the same as a global closest pair.
pub fn closest_boundary_point(a: egui::Rect, b: egui::Rect) -> egui::Pos2 {
    let a_points = boundary_points(a);
    let b_points = boundary_points(b);
    let mut best = a_points[0];
    let mut best_distance = f32::INFINITY;
    for pa in a_points {
        for pb in b_points {
            let d = distance(pa, pb);
            if d < best_distance {
                best_distance = d;
                best = pa;
            }
        }
    }
    best
}

/// The vertex of `shape` nearest to `p`, first one on ties.
pub fn closest_vertex_on_shape(shape: &[egui::Pos2], p: egui::Pos2) -> Option<egui::Pos2> {
    let mut best: Option<(egui::Pos2, f32)> = None;
    for &v in shape {
        let d = distance(v, p);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((v, d));
        }
    }
    best.map(|(v, _)| v)
}

/// Rhombus with one tip at `tip`, extending towards `toward` along the
/// dominant axis of the offset between them.
///
/// The diamond stays axis aligned; the connector picks whichever vertex
/// ends up closest to its start point.
pub fn diamond_points(tip: egui::Pos2, toward: egui::Pos2) -> [egui::Pos2; 4] {
    let d = toward - tip;
    let half = DIAMOND_LENGTH * 0.5;
    if d.x.abs() >= d.y.abs() {
        let s = d.x.signum();
        [
            tip,
            tip + egui::vec2(s * half, -DIAMOND_HALF_WIDTH),
            tip + egui::vec2(s * DIAMOND_LENGTH, 0.0),
            tip + egui::vec2(s * half, DIAMOND_HALF_WIDTH),
        ]
    } else {
        let s = d.y.signum();
        [
            tip,
            tip + egui::vec2(DIAMOND_HALF_WIDTH, s * half),
            tip + egui::vec2(0.0, s * DIAMOND_LENGTH),
            tip + egui::vec2(-DIAMOND_HALF_WIDTH, s * half),
        ]
    }
}

/// Rotation in degrees that turns an upward-pointing triangle so its base
/// is perpendicular to the `start -> end` direction with the tip at `end`.
pub fn triangle_rotation(start: egui::Pos2, end: egui::Pos2) -> f32 {
    angle_degrees(start, end) + 90.0
}

/// Triangle with its tip at `tip`, turned by `rotation` degrees.
///
/// Unrotated, the tip points up and the base lies `TRIANGLE_HEIGHT` below.
pub fn triangle_points(tip: egui::Pos2, rotation: f32) -> [egui::Pos2; 3] {
    let angle = rotation.to_radians();
    [
        tip,
        tip + rotate_vec2(egui::vec2(-TRIANGLE_HALF_BASE, TRIANGLE_HEIGHT), angle),
        tip + rotate_vec2(egui::vec2(TRIANGLE_HALF_BASE, TRIANGLE_HEIGHT), angle),
    ]
}

pub fn triangle_base_midpoint(tip: egui::Pos2, rotation: f32) -> egui::Pos2 {
    tip + rotate_vec2(egui::vec2(0.0, TRIANGLE_HEIGHT), rotation.to_radians())
}
