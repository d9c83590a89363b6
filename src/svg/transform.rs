//! `transform` attribute parsing.

use super::path::{Point, parse_number_list};

/// Affine matrix `[a b c d e f]` in SVG order:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// `self × other`: apply `other` first, then `self`.
    pub fn then_inner(&self, other: &Matrix) -> Matrix {
        Matrix::new(
            self.a * other.a + self.c * other.b,
            self.b * other.a + self.d * other.b,
            self.a * other.c + self.c * other.d,
            self.b * other.c + self.d * other.d,
            self.a * other.e + self.c * other.f + self.e,
            self.b * other.e + self.d * other.f + self.f,
        )
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn det(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Parse a `transform` attribute. Functions compose left to right, so the
/// rightmost one applies to the geometry first.
///
/// Unknown functions or bad argument counts yield `None`.
pub fn parse_transform(value: &str) -> Option<Matrix> {
    let mut result = Matrix::IDENTITY;
    let mut rest = value.trim();

    while !rest.is_empty() {
        let open = rest.find('(')?;
        let close = rest[open..].find(')')? + open;
        let name = rest[..open].trim().trim_start_matches(',').trim();
        let args = parse_number_list(&rest[open + 1..close]);
        result = result.then_inner(&function(name, &args)?);
        rest = rest[close + 1..].trim_start_matches([' ', ',', '\t', '\n', '\r']);
    }

    Some(result)
}

fn function(name: &str, args: &[f64]) -> Option<Matrix> {
    let m = match (name, args) {
        ("matrix", &[a, b, c, d, e, f]) => Matrix::new(a, b, c, d, e, f),
        ("translate", &[tx]) => Matrix::translate(tx, 0.0),
        ("translate", &[tx, ty]) => Matrix::translate(tx, ty),
        ("scale", &[s]) => Matrix::scale(s, s),
        ("scale", &[sx, sy]) => Matrix::scale(sx, sy),
        ("rotate", &[angle]) => Matrix::rotate(angle),
        ("rotate", &[angle, cx, cy]) => Matrix::translate(cx, cy)
            .then_inner(&Matrix::rotate(angle))
            .then_inner(&Matrix::translate(-cx, -cy)),
        ("skewX", &[angle]) => Matrix::new(1.0, 0.0, angle.to_radians().tan(), 1.0, 0.0, 0.0),
        ("skewY", &[angle]) => Matrix::new(1.0, angle.to_radians().tan(), 0.0, 1.0, 0.0, 0.0),
        _ => return None,
    };
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_translate_and_scale() {
        let m = parse_transform("translate(10, 20)").unwrap();
        assert_eq!(m.apply(Point::new(1.0, 1.0)), Point::new(11.0, 21.0));

        let m = parse_transform("scale(2)").unwrap();
        assert_eq!(m.apply(Point::new(3.0, 4.0)), Point::new(6.0, 8.0));
    }

    #[test]
    fn test_composition_applies_rightmost_first() {
        // scale first, then translate
        let m = parse_transform("translate(10 0) scale(2)").unwrap();
        assert_eq!(m.apply(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));

        let m = parse_transform("scale(2),translate(10 0)").unwrap();
        assert_eq!(m.apply(Point::new(1.0, 1.0)), Point::new(22.0, 2.0));
    }

    #[test]
    fn test_rotate_about_center() {
        let m = parse_transform("rotate(90 10 10)").unwrap();
        assert!(close(m.apply(Point::new(20.0, 10.0)), Point::new(10.0, 20.0)));
    }

    #[test]
    fn test_matrix_and_skew() {
        let m = parse_transform("matrix(1 0 0 1 5 6)").unwrap();
        assert_eq!(m, Matrix::translate(5.0, 6.0));

        let m = parse_transform("skewX(45)").unwrap();
        assert!(close(m.apply(Point::new(0.0, 10.0)), Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_det() {
        assert_eq!(Matrix::scale(2.0, 3.0).det(), 6.0);
        assert!((Matrix::rotate(30.0).det() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_transform() {
        assert!(parse_transform("wobble(3)").is_none());
        assert!(parse_transform("translate(1 2 3)").is_none());
        assert!(parse_transform("scale(2").is_none());
        assert_eq!(parse_transform("  "), Some(Matrix::IDENTITY));
    }
}
