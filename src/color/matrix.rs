//! Color matrices for filter-based recoloring.
//!
//! The same coefficients are emitted as an SVG `feColorMatrix` and applied
//! directly to RGBA pixels, so a filtered SVG and a matrix-transformed
//! raster agree.

use super::{ColorTag, Rgb};
use crate::svg::Element;

/// Rec. 709 luma coefficients.
const LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// A 4×5 color matrix in `feColorMatrix` row order: each output channel is
/// `m[i][0]*R + m[i][1]*G + m[i][2]*B + m[i][3]*A + m[i][4]`, with channels
/// and bias in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix(pub [[f64; 5]; 4]);

impl ColorMatrix {
    const KEEP_ALPHA: [f64; 5] = [0.0, 0.0, 0.0, 1.0, 0.0];

    /// Matrix for a color mode; identity modes have none.
    pub fn for_tag(tag: &ColorTag) -> Option<Self> {
        let m = match tag {
            ColorTag::Black => Self::flat(Rgb::BLACK),
            ColorTag::White => Self::flat(Rgb::WHITE),
            ColorTag::Custom(rgb) => Self::flat(*rgb),
            ColorTag::Grayscale => {
                let [r, g, b] = LUMA;
                let row = [r, g, b, 0.0, 0.0];
                Self([row, row, row, Self::KEEP_ALPHA])
            }
            ColorTag::Inverted => Self([
                [-1.0, 0.0, 0.0, 0.0, 1.0],
                [0.0, -1.0, 0.0, 0.0, 1.0],
                [0.0, 0.0, -1.0, 0.0, 1.0],
                Self::KEEP_ALPHA,
            ]),
            ColorTag::Original | ColorTag::Unrecognized(_) => return None,
        };
        Some(m)
    }

    /// Zero RGB coefficients with the target color as bias.
    fn flat(rgb: Rgb) -> Self {
        let (r, g, b) = rgb.to_unit();
        Self([
            [0.0, 0.0, 0.0, 0.0, r],
            [0.0, 0.0, 0.0, 0.0, g],
            [0.0, 0.0, 0.0, 0.0, b],
            Self::KEEP_ALPHA,
        ])
    }

    /// Apply to one RGBA pixel, rounding and clamping each channel.
    pub fn apply(&self, pixel: [u8; 4]) -> [u8; 4] {
        let input = pixel.map(|c| f64::from(c) / 255.0);
        let mut out = [0u8; 4];
        for (channel, row) in out.iter_mut().zip(&self.0) {
            let v = row[0] * input[0]
                + row[1] * input[1]
                + row[2] * input[2]
                + row[3] * input[3]
                + row[4];
            *channel = (v * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// The 20 coefficients as a `values` attribute.
    pub fn values_attr(&self) -> String {
        self.0
            .iter()
            .flatten()
            .map(|v| format_coefficient(*v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `<filter id=..><feColorMatrix type="matrix" values=../></filter>`.
    pub fn filter_element(&self, id: &str) -> Element {
        Element::new("filter")
            .with_attr("id", id)
            .with_attr("color-interpolation-filters", "sRGB")
            .with_child(
                Element::new("feColorMatrix")
                    .with_attr("type", "matrix")
                    .with_attr("values", self.values_attr()),
            )
    }
}

/// Shortest decimal form with at most four fractional digits.
fn format_coefficient(v: f64) -> String {
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grayscale_matrix_on_pixel() {
        let m = ColorMatrix::for_tag(&ColorTag::Grayscale).unwrap();
        assert_eq!(m.apply([200, 100, 50, 255]), [118, 118, 118, 255]);
    }

    #[test]
    fn test_matrices_preserve_alpha() {
        for tag in [
            ColorTag::Black,
            ColorTag::White,
            ColorTag::Grayscale,
            ColorTag::Inverted,
            ColorTag::Custom(Rgb::new(9, 8, 7)),
        ] {
            let m = ColorMatrix::for_tag(&tag).unwrap();
            assert_eq!(m.apply([12, 34, 56, 99])[3], 99, "{tag}");
        }
    }

    #[test]
    fn test_flat_and_inverted_matrices() {
        let white = ColorMatrix::for_tag(&ColorTag::White).unwrap();
        assert_eq!(white.apply([1, 2, 3, 4]), [255, 255, 255, 4]);

        let custom = ColorMatrix::for_tag(&ColorTag::Custom(Rgb::new(255, 136, 0))).unwrap();
        assert_eq!(custom.apply([0, 0, 0, 255]), [255, 136, 0, 255]);

        let inverted = ColorMatrix::for_tag(&ColorTag::Inverted).unwrap();
        assert_eq!(inverted.apply([255, 0, 100, 255]), [0, 255, 155, 255]);
    }

    #[test]
    fn test_identity_modes_have_no_matrix() {
        assert!(ColorMatrix::for_tag(&ColorTag::Original).is_none());
        assert!(ColorMatrix::for_tag(&ColorTag::Unrecognized("x".into())).is_none());
    }

    #[test]
    fn test_values_attr() {
        let m = ColorMatrix::for_tag(&ColorTag::Black).unwrap();
        assert_eq!(
            m.values_attr(),
            "0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 1 0"
        );
        let g = ColorMatrix::for_tag(&ColorTag::Grayscale).unwrap();
        assert!(g.values_attr().starts_with("0.2126 0.7152 0.0722 0 0"));
    }

    #[test]
    fn test_filter_element() {
        let el = ColorMatrix::for_tag(&ColorTag::Inverted)
            .unwrap()
            .filter_element("brandkit-recolor-inverted");
        assert_eq!(el.attr("id"), Some("brandkit-recolor-inverted"));
        let fe = el.child_elements().next().unwrap();
        assert_eq!(fe.name, "feColorMatrix");
        assert!(fe.attr("values").unwrap().starts_with("-1 0 0 0 1"));
    }
}
