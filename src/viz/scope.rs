use super::{Hsla, PeakTracker, Scene, Shape};

/// Initial oscilloscope peak, shared by both traces.
pub const SCOPE_PEAK: f32 = 0.001;

/// How far past the trigger level a rising edge must swing to count.
pub const TRIGGER_HYSTERESIS: f32 = 0.05;

/// Blocks shorter than this are not drawn.
pub const MIN_SCOPE_SAMPLES: usize = 32;

const LEFT_HUE: f32 = 200.0;
const RIGHT_HUE: f32 = 100.0;
const TRACE_ALPHA: f32 = 0.8;

/// First rising crossing of `level` whose excursion clears the hysteresis.
///
/// Returns the index `i >= 1` with `buf[i - 1] <= level < buf[i]` such that
/// the run of samples above `level` starting at `i` reaches
/// `level + TRIGGER_HYSTERESIS`. Small wiggles around the level are skipped.
pub fn find_trigger_level(level: f32, buf: &[f32]) -> Option<usize> {
    let target = level + TRIGGER_HYSTERESIS;
    let mut i = 1;
    while i < buf.len() {
        if buf[i - 1] <= level && buf[i] > level {
            let mut j = i;
            while j < buf.len() && buf[j] > level {
                if buf[j] >= target {
                    return Some(i);
                }
                j += 1;
            }
            i = j;
        }
        i += 1;
    }
    None
}

/// Triggered two-trace oscilloscope: left in the top half, right in the bottom.
///
/// Both traces start at the trigger found on the left channel. Returns `None`
/// when there is no trigger or the block is too short, so the caller can keep
/// showing its previous frame.
pub fn oscilloscope(
    left: &[f32],
    right: &[f32],
    trigger_level: f32,
    peak: &mut PeakTracker,
    width: f32,
    height: f32,
) -> Option<Scene> {
    let len = left.len().min(right.len());
    if len < MIN_SCOPE_SAMPLES {
        return None;
    }
    let start = find_trigger_level(trigger_level, &left[..len])?;

    for &s in left[..len].iter().chain(&right[..len]) {
        peak.observe(s.abs());
    }

    let band = height / 2.0;
    let scaler = (band / 2.0) / peak.value();
    let mut scene = Scene::new(width, height);
    trace(&mut scene, &left[start..len], band / 2.0, scaler, LEFT_HUE);
    trace(&mut scene, &right[start..len], band + band / 2.0, scaler, RIGHT_HUE);
    Some(scene)
}

/*
Scan conversion: samples are spread evenly across the width. When two
consecutive samples round onto the same column, the segment between them
collapses to their average so dense blocks don't draw vertical smears.

  x  = round(k · step)        step = width / n
  x1 = round((k + 1) · step)
  x == x1  ⇒  y0 = y1 = (y0 + y1) / 2
*/
fn trace(scene: &mut Scene, data: &[f32], centre: f32, scaler: f32, hue: f32) {
    if data.len() < 2 {
        return;
    }
    let color = Hsla::vivid(hue, TRACE_ALPHA);
    let step = scene.width / data.len() as f32;
    let y_of = |s: f32| centre - (s * scaler).round();

    let mut pos = 0.0f32;
    let mut y0 = y_of(data[0]);
    for &s in &data[1..] {
        let mut y1 = y_of(s);
        let x = pos.round();
        pos += step;
        let x1 = pos.round();
        if x == x1 {
            let avg = (y0 + y1) / 2.0;
            y0 = avg;
            y1 = avg;
        }
        scene.push(Shape::Line {
            x1: x,
            y1: y0,
            x2: x1,
            y2: y1,
            color,
        });
        y0 = y1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_qualified_rising_edge() {
        assert_eq!(
            find_trigger_level(0.5, &[0.0, 0.2, 0.6, 0.7, 0.3, 0.8]),
            Some(2)
        );
        assert_eq!(find_trigger_level(0.5, &[0.0, 0.1, 0.2]), None);
    }

    #[test]
    fn small_crossings_are_ignored() {
        // 0.52 crosses but never clears 0.55; the next edge does.
        let buf = [0.4, 0.52, 0.4, 0.3, 0.6];
        assert_eq!(find_trigger_level(0.5, &buf), Some(4));
    }

    #[test]
    fn first_sample_cannot_trigger() {
        assert_eq!(find_trigger_level(0.0, &[0.9, 0.9, 0.9]), None);
        assert_eq!(find_trigger_level(0.0, &[]), None);
    }

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 / len as f32) * 2.0 - 1.0).collect()
    }

    #[test]
    fn untriggered_or_short_blocks_are_skipped() {
        let mut peak = PeakTracker::new(SCOPE_PEAK);
        let flat = vec![0.0; 64];
        assert!(oscilloscope(&flat, &flat, 0.0, &mut peak, 64.0, 32.0).is_none());
        let short = ramp(16);
        assert!(oscilloscope(&short, &short, 0.0, &mut peak, 64.0, 32.0).is_none());
        assert_eq!(peak.value(), SCOPE_PEAK);
    }

    #[test]
    fn traces_sit_in_their_bands() {
        let mut peak = PeakTracker::new(SCOPE_PEAK);
        let wave = ramp(64);
        let scene = oscilloscope(&wave, &wave, 0.0, &mut peak, 128.0, 40.0).unwrap();

        assert_eq!(peak.value(), 1.0);
        let (mut top, mut bottom) = (0, 0);
        for shape in &scene.shapes {
            let Shape::Line { y1, y2, color, .. } = shape else {
                panic!("unexpected shape {shape:?}");
            };
            if color.hue == LEFT_HUE {
                assert!((0.0..=20.0).contains(y1) && (0.0..=20.0).contains(y2));
                top += 1;
            } else {
                assert!((20.0..=40.0).contains(y1) && (20.0..=40.0).contains(y2));
                bottom += 1;
            }
        }
        assert_eq!(top, bottom);
        assert!(top > 0);
    }

    #[test]
    fn dense_samples_collapse_onto_columns() {
        let mut scene = Scene::new(2.0, 10.0);
        trace(&mut scene, &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0], 5.0, 2.0, 0.0);

        let collapsed = scene
            .shapes
            .iter()
            .filter(|s| matches!(s, Shape::Line { x1, x2, y1, y2, .. } if x1 == x2 && y1 == y2))
            .count();
        assert!(collapsed > 0);
    }
}
