use super::{Hsla, PeakTracker, Scene, Shape};

/// Initial Lissajous peak.
pub const LISSAJOUS_PEAK: f32 = 0.001;

/// Hue for one stereo point: quiet is violet, loud swings through blue to red.
#[inline]
pub fn point_hue(left: f32, right: f32) -> f32 {
    let velocity = (left * left + right * right).sqrt().min(1.0);
    270.0 - (velocity * 360.0).round()
}

/// XY scatter of left against right, centred on the canvas.
///
/// Each sample becomes a plus: an opaque centre pixel and four neighbours
/// at 0.7 alpha. The scale keeps the loudest sample seen so far within the
/// canvas height.
pub fn lissajous(
    left: &[f32],
    right: &[f32],
    peak: &mut PeakTracker,
    width: f32,
    height: f32,
) -> Scene {
    let mut scene = Scene::new(width, height);
    for (&l, &r) in left.iter().zip(right) {
        peak.observe(l.abs().max(r.abs()));
    }

    let scaler = height / (2.0 * peak.value());
    let (xc, yc) = (width / 2.0, height / 2.0);
    scene.shapes.reserve(left.len().min(right.len()) * 5);

    for (&l, &r) in left.iter().zip(right) {
        if !(l.is_finite() && r.is_finite()) {
            continue;
        }
        let x = (l * scaler + xc).round();
        let y = (r * scaler + yc).round();
        let hue = point_hue(l, r);

        scene.push(Shape::Pixel {
            x,
            y,
            color: Hsla::vivid(hue, 1.0),
        });
        let halo = Hsla::vivid(hue, 0.7);
        for (dx, dy) in [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)] {
            scene.push(Shape::Pixel {
                x: x + dx,
                y: y + dy,
                color: halo,
            });
        }
    }
    scene
}
