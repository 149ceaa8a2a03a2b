/// RGBA color with components in `0.0..=1.0`.
pub type Rgba = [f32; 4];

/// Formats a color as a CSS `rgba()` string.
pub fn rgba_css(c: Rgba) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({},{},{},{})",
        channel(c[0]),
        channel(c[1]),
        channel(c[2]),
        c[3].clamp(0.0, 1.0)
    )
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CellStyle {
    pub visible: bool,
    pub stroke: Rgba,
    /// Stroke width in pixels.
    pub stroke_width: f32,
    pub fill: Rgba,
}

impl CellStyle {
    pub const fn new(visible: bool, stroke: Rgba, stroke_width: f32, fill: Rgba) -> Self {
        Self {
            visible,
            stroke,
            stroke_width,
            fill,
        }
    }
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            visible: true,
            stroke: [0.0, 0.0, 0.0, 0.8],
            stroke_width: 1.5,
            fill: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerStyle {
    pub color: Rgba,
    /// Radius in pixels.
    pub radius: f32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: [0.85, 0.2, 0.15, 1.0],
            radius: 4.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CellStyle, rgba_css};

    #[test]
    fn css_clamps_channels() {
        assert_eq!(rgba_css([1.0, 0.0, 0.5, 0.25]), "rgba(255,0,128,0.25)");
        assert_eq!(rgba_css([2.0, -1.0, 0.0, 3.0]), "rgba(255,0,0,1)");
    }

    #[test]
    fn default_cells_are_outlined_not_filled() {
        let s = CellStyle::default();
        assert!(s.visible);
        assert_eq!(s.fill[3], 0.0);
        assert!(s.stroke_width > 0.0);
    }
}
