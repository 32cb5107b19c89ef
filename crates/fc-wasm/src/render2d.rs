//! Canvas2D software renderer.
//!
//! Draws a projected [`Frame`] to an HTML `<canvas>` via
//! `CanvasRenderingContext2d`. Everything arrives in screen space, so no
//! transform is set on the context.

use fc_render::{Frame, NodeCard};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub card: &'static str,
    pub card_border: &'static str,
    pub label: &'static str,
    pub accent: &'static str,
    pub error: &'static str,
    pub input_port: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#F0F1F5",
            grid: "rgba(0, 0, 0, 0.05)",
            card: "#FFFFFF",
            card_border: "rgba(0, 0, 0, 0.05)",
            label: "#1C1C1E",
            accent: "#3B82F6",
            error: "#DC2626",
            input_port: "#F5F5F5",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#050505",
            grid: "rgba(255, 255, 255, 0.08)",
            card: "rgba(16, 16, 16, 0.95)",
            card_border: "rgba(255, 255, 255, 0.1)",
            label: "#FFFFFF",
            accent: "#3B82F6",
            error: "#EF4444",
            input_port: "#262626",
        }
    }
}

/// Grid pitches below this (screen px) are skipped.
const MIN_GRID_PITCH: f64 = 8.0;
/// Card corner radius and header height, world units.
const CARD_RADIUS: f64 = 40.0;
const HEADER_HEIGHT: f64 = 76.0;

/// Render one frame.
pub fn render_frame(ctx: &CanvasRenderingContext2d, frame: &Frame, width: f64, height: f64, theme: &CanvasTheme) {
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, width, height);

    draw_grid(ctx, frame, width, height, theme);
    draw_edges(ctx, frame, theme);
    for card in &frame.nodes {
        draw_card(ctx, card, frame.zoom, frame.strokes.port_radius, theme);
    }
    draw_preview(ctx, frame, theme);
}

fn draw_grid(ctx: &CanvasRenderingContext2d, frame: &Frame, width: f64, height: f64, theme: &CanvasTheme) {
    let spacing = frame.grid.spacing;
    if spacing < MIN_GRID_PITCH {
        return;
    }
    ctx.set_fill_style_str(theme.grid);
    let mut x = frame.grid.offset.x.rem_euclid(spacing);
    while x < width {
        let mut y = frame.grid.offset.y.rem_euclid(spacing);
        while y < height {
            ctx.fill_rect(x - 1.0, y - 1.0, 2.0, 2.0);
            y += spacing;
        }
        x += spacing;
    }
}

fn draw_edges(ctx: &CanvasRenderingContext2d, frame: &Frame, theme: &CanvasTheme) {
    ctx.save();
    ctx.set_stroke_style_str(theme.accent);
    ctx.set_fill_style_str(theme.accent);
    ctx.set_line_width(frame.strokes.edge_width);
    for edge in &frame.edges {
        let c = edge.curve;
        ctx.begin_path();
        ctx.move_to(c.p0.x, c.p0.y);
        ctx.bezier_curve_to(c.p1.x, c.p1.y, c.p2.x, c.p2.y, c.p3.x, c.p3.y);
        ctx.stroke();

        for end in [c.p0, c.p3] {
            ctx.begin_path();
            let _ = ctx.arc(end.x, end.y, frame.strokes.port_dot_radius, 0.0, std::f64::consts::TAU);
            ctx.fill();
        }
    }
    ctx.restore();
}

fn draw_preview(ctx: &CanvasRenderingContext2d, frame: &Frame, theme: &CanvasTheme) {
    let Some(preview) = &frame.preview else {
        return;
    };
    let c = preview.curve;
    let [dash, gap] = frame.strokes.preview_dash;
    ctx.save();
    ctx.set_stroke_style_str(theme.accent);
    ctx.set_line_width(frame.strokes.preview_width);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &JsValue::from_f64(dash),
        &JsValue::from_f64(gap),
    ));
    ctx.begin_path();
    ctx.move_to(c.p0.x, c.p0.y);
    ctx.bezier_curve_to(c.p1.x, c.p1.y, c.p2.x, c.p2.y, c.p3.x, c.p3.y);
    ctx.stroke();
    ctx.restore();
}

fn draw_card(ctx: &CanvasRenderingContext2d, card: &NodeCard, zoom: f64, port_r: f64, theme: &CanvasTheme) {
    let r = &card.rect;
    ctx.save();

    rounded_rect_path(ctx, r.x0, r.y0, r.width(), r.height(), CARD_RADIUS * zoom);
    ctx.set_fill_style_str(theme.card);
    ctx.fill();
    let (border, width) = if card.dragging {
        (theme.accent, 2.0)
    } else if card.failed {
        (theme.error, 1.5)
    } else {
        (theme.card_border, 1.0)
    };
    ctx.set_stroke_style_str(border);
    ctx.set_line_width(width);
    ctx.stroke();

    // header
    let header_y = r.y0 + HEADER_HEIGHT * zoom;
    ctx.set_stroke_style_str(theme.card_border);
    ctx.set_line_width(1.0);
    ctx.begin_path();
    ctx.move_to(r.x0, header_y);
    ctx.line_to(r.x1, header_y);
    ctx.stroke();

    ctx.set_font(&format!("900 {:.0}px Inter, system-ui, sans-serif", (13.0 * zoom).max(6.0)));
    ctx.set_fill_style_str(theme.label);
    ctx.set_text_align("left");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(
        &card.label.to_uppercase(),
        r.x0 + 32.0 * zoom,
        r.y0 + HEADER_HEIGHT * zoom / 2.0,
    );

    if card.loading {
        let cx = r.center().x;
        let cy = header_y + (r.y1 - header_y) * 0.35;
        ctx.set_stroke_style_str(theme.accent);
        ctx.set_line_width(3.0 * zoom);
        ctx.begin_path();
        let _ = ctx.arc(cx, cy, 16.0 * zoom, 0.0, std::f64::consts::PI * 1.5);
        ctx.stroke();
    }

    // ports
    ctx.set_fill_style_str(if card.connect_target {
        theme.accent
    } else {
        theme.input_port
    });
    ctx.begin_path();
    let _ = ctx.arc(card.ports.input.x, card.ports.input.y, port_r, 0.0, std::f64::consts::TAU);
    ctx.fill();

    ctx.set_fill_style_str(theme.accent);
    ctx.begin_path();
    let _ = ctx.arc(card.ports.output.x, card.ports.output.y, port_r, 0.0, std::f64::consts::TAU);
    ctx.fill();

    ctx.restore();
}

/// Trace a rounded card outline, corners clockwise from the top-left.
fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    let (x1, y1) = (x + w, y + h);
    // (corner, point where the next edge starts)
    let corners = [
        ((x1, y), (x1, y + r)),
        ((x1, y1), (x1 - r, y1)),
        ((x, y1), (x, y1 - r)),
        ((x, y), (x + r, y)),
    ];
    ctx.begin_path();
    ctx.move_to(x + r, y);
    for ((cx, cy), (nx, ny)) in corners {
        let _ = ctx.arc_to(cx, cy, nx, ny, r);
    }
    ctx.close_path();
}
