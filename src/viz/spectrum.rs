use std::f32::consts::E;

use super::{Hsla, PeakTracker, Scene, Shape};

/// Initial spectrum peak.
pub const SPECTRUM_PEAK: f32 = 1.0;

/// Widest hue used across the bins (red at DC, violet at Nyquist).
const HUE_SPAN: f32 = 270.0;

/// Map one bin's dB value onto the peak-tracked scale.
///
/// The product of the offset and the display range is kept as the
/// established scaling of this display; with the peak normalisation below it
/// only affects the curvature of the exponential remap.
#[inline]
pub fn transform(magnitude_db: f32, min_decibels: f32, max_decibels: f32) -> f32 {
    let db = if magnitude_db.is_finite() {
        magnitude_db
    } else {
        min_decibels
    };
    (db - min_decibels) * (max_decibels - min_decibels)
}

/// Exponential remap of `value / peak` onto `[0, height]`.
#[inline]
pub fn bar_height(value: f32, peak: f32, height: f32) -> f32 {
    if peak <= 0.0 {
        return 0.0;
    }
    let h = height * ((value / peak).exp() - 1.0) / (E - 1.0);
    h.clamp(0.0, height.max(0.0))
}

/// Draw spectrum bars for one frame of analyser output.
///
/// With more bins than pixel columns, neighbouring bins are averaged into
/// one column; with fewer, each bin is stretched over several columns.
pub fn spectrum(
    decibels: &[f32],
    min_decibels: f32,
    max_decibels: f32,
    peak: &mut PeakTracker,
    width: f32,
    height: f32,
) -> Scene {
    let mut scene = Scene::new(width, height);
    if decibels.is_empty() || width < 1.0 || height <= 0.0 {
        return scene;
    }

    let values: Vec<f32> = decibels
        .iter()
        .map(|&db| transform(db, min_decibels, max_decibels))
        .collect();
    for &v in &values {
        peak.observe(v);
    }
    let peak = peak.value();

    let bins = values.len();
    let columns = width as usize;
    let hue_at = |bin: f32| HUE_SPAN * bin / (bins.max(2) - 1) as f32;

    if bins > columns {
        for col in 0..columns {
            let lo = col * bins / columns;
            let hi = ((col + 1) * bins / columns).max(lo + 1);
            let avg = values[lo..hi].iter().sum::<f32>() / (hi - lo) as f32;
            let h = bar_height(avg, peak, height);
            scene.push(Shape::Rect {
                x: col as f32,
                y: height - h,
                width: 1.0,
                height: h,
                color: Hsla::vivid(hue_at((lo + hi - 1) as f32 / 2.0), 1.0),
            });
        }
    } else {
        let bar_width = width / bins as f32;
        for (i, &v) in values.iter().enumerate() {
            let h = bar_height(v, peak, height);
            scene.push(Shape::Rect {
                x: i as f32 * bar_width,
                y: height - h,
                width: bar_width,
                height: h,
                color: Hsla::vivid(hue_at(i as f32), 1.0),
            });
        }
    }
    scene
}
