//! Projected frame → Vello drawing commands.
//!
//! Paints the background grid, edges with endpoint dots, the dashed
//! connection preview, and node cards. Everything is already in screen
//! space, so all transforms are identity.

use crate::project::{Frame, NodeCard};
use kurbo::{Affine, Circle, Line, Point, Rect, RoundedRect, Size, Stroke};
use peniko::{Color, Fill};
use vello::Scene;

/// Grid pitches below this (screen px) are not drawn.
const MIN_GRID_PITCH: f64 = 8.0;
/// Card corner radius in world units.
const CARD_RADIUS: f64 = 40.0;
/// Header band height in world units.
const HEADER_HEIGHT: f64 = 76.0;

/// Canvas colors for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub grid: Color,
    pub card: Color,
    pub card_border: Color,
    pub accent: Color,
    pub error: Color,
    pub input_port: Color,
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            background: Color::from_rgba8(5, 5, 5, 255),
            grid: Color::from_rgba8(255, 255, 255, 20),
            card: Color::from_rgba8(16, 16, 16, 242),
            card_border: Color::from_rgba8(255, 255, 255, 26),
            accent: Color::from_rgba8(59, 130, 246, 255),
            error: Color::from_rgba8(239, 68, 68, 255),
            input_port: Color::from_rgba8(38, 38, 38, 255),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::from_rgba8(236, 237, 241, 255),
            grid: Color::from_rgba8(0, 0, 0, 13),
            card: Color::from_rgba8(255, 255, 255, 255),
            card_border: Color::from_rgba8(0, 0, 0, 13),
            accent: Color::from_rgba8(59, 130, 246, 255),
            error: Color::from_rgba8(220, 38, 38, 255),
            input_port: Color::from_rgba8(245, 245, 245, 255),
        }
    }
}

/// Paint a projected frame into `scene`.
///
/// Call once per frame with a freshly-cleared `Scene` sized to `size`.
/// Node labels need a font context and are left to the host.
pub fn paint_frame(scene: &mut Scene, frame: &Frame, size: Size, palette: &Palette) {
    scene.fill(
        Fill::NonZero,
        Affine::IDENTITY,
        palette.background,
        None,
        &Rect::from_origin_size(Point::ZERO, size),
    );
    paint_grid(scene, frame, size, palette);
    paint_edges(scene, frame, palette);
    for card in &frame.nodes {
        paint_card(scene, card, frame.zoom, frame.strokes.port_radius, palette);
    }
    paint_preview(scene, frame, palette);
}

fn paint_grid(scene: &mut Scene, frame: &Frame, size: Size, palette: &Palette) {
    let pitch = frame.grid.spacing;
    if pitch < MIN_GRID_PITCH {
        return;
    }
    let x0 = frame.grid.offset.x.rem_euclid(pitch);
    let y0 = frame.grid.offset.y.rem_euclid(pitch);
    let mut y = y0;
    while y < size.height {
        let mut x = x0;
        while x < size.width {
            scene.fill(
                Fill::NonZero,
                Affine::IDENTITY,
                palette.grid,
                None,
                &Circle::new((x, y), 1.5),
            );
            x += pitch;
        }
        y += pitch;
    }
}

fn paint_edges(scene: &mut Scene, frame: &Frame, palette: &Palette) {
    let stroke = Stroke::new(frame.strokes.edge_width);
    let r = frame.strokes.port_dot_radius;
    for edge in &frame.edges {
        scene.stroke(&stroke, Affine::IDENTITY, palette.accent, None, &edge.curve);
        for end in [edge.curve.p0, edge.curve.p3] {
            scene.fill(
                Fill::NonZero,
                Affine::IDENTITY,
                palette.accent,
                None,
                &Circle::new(end, r),
            );
        }
    }
}

fn paint_preview(scene: &mut Scene, frame: &Frame, palette: &Palette) {
    if let Some(preview) = &frame.preview {
        let stroke = Stroke::new(frame.strokes.preview_width).with_dashes(0.0, frame.strokes.preview_dash);
        scene.stroke(&stroke, Affine::IDENTITY, palette.accent, None, &preview.curve);
    }
}

fn paint_card(scene: &mut Scene, card: &NodeCard, zoom: f64, port_r: f64, palette: &Palette) {
    let shape = RoundedRect::from_rect(card.rect, CARD_RADIUS * zoom);
    scene.fill(Fill::NonZero, Affine::IDENTITY, palette.card, None, &shape);

    let (border, width) = if card.dragging {
        (palette.accent, 2.0)
    } else if card.failed {
        (palette.error, 1.5)
    } else {
        (palette.card_border, 1.0)
    };
    scene.stroke(&Stroke::new(width), Affine::IDENTITY, border, None, &shape);

    let header_y = card.rect.y0 + HEADER_HEIGHT * zoom;
    scene.stroke(
        &Stroke::new(1.0),
        Affine::IDENTITY,
        palette.card_border,
        None,
        &Line::new((card.rect.x0, header_y), (card.rect.x1, header_y)),
    );

    if card.loading {
        let center = Point::new(card.rect.center().x, header_y + (card.rect.y1 - header_y) * 0.35);
        scene.stroke(
            &Stroke::new(3.0 * zoom),
            Affine::IDENTITY,
            palette.accent,
            None,
            &Circle::new(center, 16.0 * zoom),
        );
    }

    let input_fill = if card.connect_target {
        palette.accent
    } else {
        palette.input_port
    };
    scene.fill(
        Fill::NonZero,
        Affine::IDENTITY,
        input_fill,
        None,
        &Circle::new(card.ports.input, port_r),
    );
    scene.fill(
        Fill::NonZero,
        Affine::IDENTITY,
        palette.accent,
        None,
        &Circle::new(card.ports.output, port_r),
    );

    log::trace!("PAINT card {} ({}) at {:?}", card.id, card.label, card.rect.origin());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{GestureOverlay, project_frame};
    use fc_core::{CanvasConfig, NodeGraph, NodeKind, Viewport};

    #[test]
    fn paints_a_connected_graph_with_preview() {
        let mut g = NodeGraph::new();
        let a = g.add_node_at(NodeKind::ImageGen, Point::new(0.0, 0.0));
        let b = g.add_node_at(NodeKind::VideoGen, Point::new(600.0, 0.0));
        g.add_edge(a, b).unwrap();
        g.set_node_loading(b, true);
        let config = CanvasConfig::default();
        let overlay = GestureOverlay {
            dragging: Some(b),
            connecting: Some((a, Point::new(50.0, 700.0))),
        };
        let frame = project_frame(&g, &Viewport::new(&config), &config, &overlay);

        let mut scene = Scene::new();
        paint_frame(&mut scene, &frame, Size::new(1280.0, 800.0), &Palette::dark());
        assert!(!scene.encoding().is_empty());
    }

    #[test]
    fn tiny_grid_pitch_is_skipped() {
        let g = NodeGraph::new();
        let config = CanvasConfig::default();
        let mut vp = Viewport::new(&config);
        vp.set_zoom(0.15);
        let frame = project_frame(&g, &vp, &config, &GestureOverlay::default());
        assert!(frame.grid.spacing < MIN_GRID_PITCH);

        let mut scene = Scene::new();
        paint_frame(&mut scene, &frame, Size::new(64.0, 64.0), &Palette::light());
        assert!(!scene.encoding().is_empty(), "background still painted");
    }
}
