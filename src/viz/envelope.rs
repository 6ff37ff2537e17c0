use super::{Hsla, PeakTracker, Scene, Shape};

/// Initial envelope peak, in dB of gain reduction.
pub const ENVELOPE_PEAK: f32 = 1.0;

const ENVELOPE_HUE: f32 = 30.0;

/// Draw the gain-reduction history, oldest on the left.
///
/// `values` is the recorder in chronological order and `capacity` its full
/// length, so a partly filled history grows in from the right edge and a
/// full one scrolls right to left. Larger reduction draws higher.
pub fn envelope(
    values: impl IntoIterator<Item = f32>,
    capacity: usize,
    peak: &mut PeakTracker,
    width: f32,
    height: f32,
) -> Scene {
    let mut scene = Scene::new(width, height);
    let values: Vec<f32> = values.into_iter().collect();
    if values.is_empty() || capacity == 0 {
        return scene;
    }
    let count = values.len().min(capacity);
    let values = &values[values.len() - count..];

    for &v in values {
        peak.observe(v);
    }
    let peak = peak.value();

    let step = width / capacity as f32;
    let first_x = width - count as f32 * step;
    let y_of = |v: f32| {
        let v = if v.is_finite() { v.max(0.0) } else { 0.0 };
        (height - v / peak * height).clamp(0.0, height)
    };
    let color = Hsla::vivid(ENVELOPE_HUE, 1.0);

    if let [only] = values {
        scene.push(Shape::Pixel {
            x: first_x,
            y: y_of(*only),
            color,
        });
        return scene;
    }
    for (i, pair) in values.windows(2).enumerate() {
        scene.push(Shape::Line {
            x1: first_x + i as f32 * step,
            y1: y_of(pair[0]),
            x2: first_x + (i + 1) as f32 * step,
            y2: y_of(pair[1]),
            color,
        });
    }
    scene
}
