//! Scene widget - draws a viz::Scene onto a braille canvas

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Context, Line, Points},
        Paragraph, Wrap,
    },
    Frame,
};

use audviz::viz::{Hsla, Scene, Shape};

fn rgb(color: Hsla) -> Color {
    let (r, g, b) = color.to_rgb();
    Color::Rgb(r, g, b)
}

/// Render `scene` into `area`, or its message when it carries one.
pub fn render_scene(frame: &mut Frame, area: Rect, scene: &Scene) {
    if let Some(message) = &scene.message {
        let paragraph = Paragraph::new(message.as_str())
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(paragraph, area);
        return;
    }

    let width = f64::from(scene.width);
    let height = f64::from(scene.height);
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            for shape in &scene.shapes {
                draw_shape(ctx, shape, height);
            }
        });
    frame.render_widget(canvas, area);
}

/*
 * Scenes put the origin top-left with y growing down; the canvas puts it
 * bottom-left. Every y is flipped against the scene height. Rects are
 * filled one dot column at a time since canvas rectangles are outlines.
 */
fn draw_shape(ctx: &mut Context, shape: &Shape, height: f64) {
    let flip = |y: f32| height - f64::from(y);
    match *shape {
        Shape::Rect {
            x,
            y,
            width,
            height: h,
            color,
        } => {
            let color = rgb(color);
            let (top, bottom) = (flip(y), flip(y + h));
            let mut column = f64::from(x);
            let end = f64::from(x + width);
            while column < end {
                ctx.draw(&Line::new(column, bottom, column, top, color));
                column += 1.0;
            }
        }
        Shape::Pixel { x, y, color } => {
            ctx.draw(&Points {
                coords: &[(f64::from(x), flip(y))],
                color: rgb(color),
            });
        }
        Shape::Line {
            x1,
            y1,
            x2,
            y2,
            color,
        } => {
            ctx.draw(&Line::new(
                f64::from(x1),
                flip(y1),
                f64::from(x2),
                flip(y2),
                rgb(color),
            ));
        }
    }
}
