/// Hue/saturation/lightness colour with alpha. Hue is in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub alpha: f32,
}

impl Hsla {
    pub fn new(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
            saturation: saturation.clamp(0.0, 1.0),
            lightness: lightness.clamp(0.0, 1.0),
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// Fully saturated, mid-lightness colour at `hue`.
    pub fn vivid(hue: f32, alpha: f32) -> Self {
        Self::new(hue, 1.0, 0.5, alpha)
    }

    /// 8-bit RGB, with alpha composited over black.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let c = (1.0 - (2.0 * self.lightness - 1.0).abs()) * self.saturation;
        let h = self.hue / 60.0;
        let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = self.lightness - c / 2.0;
        let to_byte = |v: f32| (((v + m) * self.alpha).clamp(0.0, 1.0) * 255.0).round() as u8;
        (to_byte(r), to_byte(g), to_byte(b))
    }
}

/// One primitive in canvas coordinates (origin top-left, y grows downward).
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Filled rectangle, used for spectrum bars.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Hsla,
    },
    Pixel { x: f32, y: f32, color: Hsla },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Hsla,
    },
}

/// Resolution-independent draw list for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub shapes: Vec<Shape>,
    /// Text shown in place of the drawing (diagnostics, prompts).
    pub message: Option<String>,
}

impl Scene {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            shapes: Vec::new(),
            message: None,
        }
    }

    pub fn with_message(width: f32, height: f32, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(width, height)
        }
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.message.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_wraps_into_range() {
        assert_eq!(Hsla::vivid(-90.0, 1.0).hue, 270.0);
        assert_eq!(Hsla::vivid(370.0, 1.0).hue, 10.0);
    }

    #[test]
    fn primary_hues_convert() {
        assert_eq!(Hsla::vivid(0.0, 1.0).to_rgb(), (255, 0, 0));
        assert_eq!(Hsla::vivid(120.0, 1.0).to_rgb(), (0, 255, 0));
        assert_eq!(Hsla::vivid(240.0, 1.0).to_rgb(), (0, 0, 255));
        assert_eq!(Hsla::vivid(0.0, 0.5).to_rgb(), (128, 0, 0));
    }
}
