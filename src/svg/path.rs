//! SVG path-data parsing.
//!
//! Path data is tokenized into commands, then run through a small state
//! machine ([`PathState`]) that resolves relative coordinates and smooth
//! control points into absolute [`Segment`]s. Both vector exporters consume
//! the same segments.
//!
//! Elliptical arcs (`A`/`a`) are reduced to a straight line to the arc's
//! endpoint.

/// A 2D point in SVG user space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Reflect `other` through this point (`2*self − other`).
    fn reflect(self, other: Point) -> Point {
        Point::new(2.0 * self.x - other.x, 2.0 * self.y - other.y)
    }

    /// Point two thirds of the way from `self` towards `toward`.
    fn two_thirds_to(self, toward: Point) -> Point {
        Point::new(
            self.x + 2.0 / 3.0 * (toward.x - self.x),
            self.y + 2.0 / 3.0 * (toward.y - self.y),
        )
    }
}

/// An absolute path segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
    Close,
}

impl Segment {
    /// Map every point of the segment through `f`.
    pub fn map(self, f: impl Fn(Point) -> Point) -> Segment {
        match self {
            Segment::MoveTo(p) => Segment::MoveTo(f(p)),
            Segment::LineTo(p) => Segment::LineTo(f(p)),
            Segment::CubicTo(c1, c2, p) => Segment::CubicTo(f(c1), f(c2), f(p)),
            Segment::Close => Segment::Close,
        }
    }
}

/// Running state of the path interpreter.
#[derive(Debug, Default)]
struct PathState {
    current: Point,
    subpath_start: Point,
    /// Second control point of the previous cubic, for `S`.
    last_cubic: Option<Point>,
    /// Control point of the previous quadratic, for `T`.
    last_quad: Option<Point>,
}

impl PathState {
    fn resolve(&self, relative: bool, x: f64, y: f64) -> Point {
        if relative {
            Point::new(self.current.x + x, self.current.y + y)
        } else {
            Point::new(x, y)
        }
    }

    fn move_to(&mut self, p: Point, out: &mut Vec<Segment>) {
        self.current = p;
        self.subpath_start = p;
        self.clear_controls();
        out.push(Segment::MoveTo(p));
    }

    fn line_to(&mut self, p: Point, out: &mut Vec<Segment>) {
        self.current = p;
        self.clear_controls();
        out.push(Segment::LineTo(p));
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, p: Point, out: &mut Vec<Segment>) {
        self.current = p;
        self.last_cubic = Some(c2);
        self.last_quad = None;
        out.push(Segment::CubicTo(c1, c2, p));
    }

    fn quad_to(&mut self, q: Point, p: Point, out: &mut Vec<Segment>) {
        let start = self.current;
        let c1 = start.two_thirds_to(q);
        let c2 = p.two_thirds_to(q);
        self.current = p;
        self.last_quad = Some(q);
        self.last_cubic = None;
        out.push(Segment::CubicTo(c1, c2, p));
    }

    fn close(&mut self, out: &mut Vec<Segment>) {
        self.current = self.subpath_start;
        self.clear_controls();
        out.push(Segment::Close);
    }

    fn clear_controls(&mut self) {
        self.last_cubic = None;
        self.last_quad = None;
    }
}

/// Parse path data into absolute segments.
///
/// Parsing stops at the first malformed command; segments produced up to
/// that point are kept, which matches how renderers treat broken paths.
pub fn parse_path(data: &str) -> Vec<Segment> {
    let mut tokens = Tokenizer::new(data);
    let mut state = PathState::default();
    let mut out = Vec::new();
    let mut command: Option<char> = None;

    loop {
        tokens.skip_separators();
        let Some(next) = tokens.peek() else {
            break;
        };

        if next.is_ascii_alphabetic() {
            tokens.bump();
            command = Some(next);
            if matches!(next, 'Z' | 'z') {
                state.close(&mut out);
                continue;
            }
        } else if command.is_none() {
            break;
        }

        let Some(cmd) = command else {
            break;
        };
        if run_command(cmd, &mut tokens, &mut state, &mut out).is_none() {
            break;
        }

        // Coordinates following a moveto are implicit linetos.
        command = match cmd {
            'M' => Some('L'),
            'm' => Some('l'),
            'Z' | 'z' => None,
            other => Some(other),
        };
    }

    out
}

/// Consume the arguments of one command and emit its segment.
fn run_command(
    cmd: char,
    tokens: &mut Tokenizer<'_>,
    state: &mut PathState,
    out: &mut Vec<Segment>,
) -> Option<()> {
    let relative = cmd.is_ascii_lowercase();
    match cmd.to_ascii_uppercase() {
        'M' => {
            let (x, y) = (tokens.number()?, tokens.number()?);
            let p = state.resolve(relative, x, y);
            state.move_to(p, out);
        }
        'L' => {
            let (x, y) = (tokens.number()?, tokens.number()?);
            let p = state.resolve(relative, x, y);
            state.line_to(p, out);
        }
        'H' => {
            let x = tokens.number()?;
            let x = if relative { state.current.x + x } else { x };
            let p = Point::new(x, state.current.y);
            state.line_to(p, out);
        }
        'V' => {
            let y = tokens.number()?;
            let y = if relative { state.current.y + y } else { y };
            let p = Point::new(state.current.x, y);
            state.line_to(p, out);
        }
        'C' => {
            let c1 = state.resolve(relative, tokens.number()?, tokens.number()?);
            let c2 = state.resolve(relative, tokens.number()?, tokens.number()?);
            let p = state.resolve(relative, tokens.number()?, tokens.number()?);
            state.cubic_to(c1, c2, p, out);
        }
        'S' => {
            let c2 = state.resolve(relative, tokens.number()?, tokens.number()?);
            let p = state.resolve(relative, tokens.number()?, tokens.number()?);
            let c1 = match state.last_cubic {
                Some(last) => state.current.reflect(last),
                None => state.current,
            };
            state.cubic_to(c1, c2, p, out);
        }
        'Q' => {
            let q = state.resolve(relative, tokens.number()?, tokens.number()?);
            let p = state.resolve(relative, tokens.number()?, tokens.number()?);
            state.quad_to(q, p, out);
        }
        'T' => {
            let p = state.resolve(relative, tokens.number()?, tokens.number()?);
            let q = match state.last_quad {
                Some(last) => state.current.reflect(last),
                None => state.current,
            };
            state.quad_to(q, p, out);
        }
        'A' => {
            // rx ry x-axis-rotation large-arc-flag sweep-flag x y
            let _rx = tokens.number()?;
            let _ry = tokens.number()?;
            let _rotation = tokens.number()?;
            let _large_arc = tokens.flag()?;
            let _sweep = tokens.flag()?;
            let p = state.resolve(relative, tokens.number()?, tokens.number()?);
            state.line_to(p, out);
        }
        _ => return None,
    }
    Some(())
}

/// Parse a whitespace/comma separated list of numbers (`points`, `viewBox`).
pub fn parse_number_list(value: &str) -> Vec<f64> {
    let mut tokens = Tokenizer::new(value);
    let mut nums = Vec::new();
    loop {
        tokens.skip_separators();
        if tokens.peek().is_none() {
            break;
        }
        match tokens.number() {
            Some(n) => nums.push(n),
            None => break,
        }
    }
    nums
}

/// Parse a `points` attribute into coordinate pairs; a trailing odd
/// coordinate is dropped.
pub fn parse_points(value: &str) -> Vec<Point> {
    parse_number_list(value)
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

/// Byte tokenizer for SVG number grammar.
struct Tokenizer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).map(|&b| b as char)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_separators(&mut self) {
        while let Some(b) = self.src.get(self.pos) {
            if b.is_ascii_whitespace() || *b == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Read one number, handling compact forms like `1.5.5` and `-1-2`.
    fn number(&mut self) -> Option<f64> {
        self.skip_separators();
        let start = self.pos;
        let bytes = self.src;

        if matches!(bytes.get(self.pos), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let mut digits = self.eat_digits();
        if bytes.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            digits += self.eat_digits();
        }
        if digits == 0 {
            self.pos = start;
            return None;
        }
        if matches!(bytes.get(self.pos), Some(b'e' | b'E')) {
            let exp_start = self.pos;
            self.pos += 1;
            if matches!(bytes.get(self.pos), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.eat_digits() == 0 {
                self.pos = exp_start;
            }
        }

        std::str::from_utf8(&bytes[start..self.pos])
            .ok()?
            .parse()
            .ok()
    }

    /// Read an arc flag, which may be packed without separators (`011`).
    fn flag(&mut self) -> Option<bool> {
        self.skip_separators();
        match self.src.get(self.pos) {
            Some(b'0') => {
                self.pos += 1;
                Some(false)
            }
            Some(b'1') => {
                self.pos += 1;
                Some(true)
            }
            _ => None,
        }
    }

    fn eat_digits(&mut self) -> usize {
        let start = self.pos;
        while self.src.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        self.pos - start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_absolute_lines_and_close() {
        let segs = parse_path("M10 20 L30 20 H40 V50 Z");
        assert_eq!(
            segs,
            vec![
                Segment::MoveTo(p(10.0, 20.0)),
                Segment::LineTo(p(30.0, 20.0)),
                Segment::LineTo(p(40.0, 20.0)),
                Segment::LineTo(p(40.0, 50.0)),
                Segment::Close,
            ]
        );
    }

    #[test]
    fn test_relative_commands_and_implicit_lineto() {
        let segs = parse_path("m10 10 5 0 0 5 h-5 z");
        assert_eq!(
            segs,
            vec![
                Segment::MoveTo(p(10.0, 10.0)),
                Segment::LineTo(p(15.0, 10.0)),
                Segment::LineTo(p(15.0, 15.0)),
                Segment::LineTo(p(10.0, 15.0)),
                Segment::Close,
            ]
        );
    }

    #[test]
    fn test_close_resets_current_point() {
        let segs = parse_path("M10 10 L20 10 Z l5 5");
        assert_eq!(segs.last(), Some(&Segment::LineTo(p(15.0, 15.0))));
    }

    #[test]
    fn test_smooth_cubic_reflects_control() {
        let segs = parse_path("M0 0 C0 10 10 10 10 0 S20 -10 20 0");
        assert_eq!(
            segs[2],
            Segment::CubicTo(p(10.0, -10.0), p(20.0, -10.0), p(20.0, 0.0))
        );
    }

    #[test]
    fn test_smooth_cubic_without_previous_uses_current() {
        let segs = parse_path("M5 5 S10 10 20 5");
        assert_eq!(
            segs[1],
            Segment::CubicTo(p(5.0, 5.0), p(10.0, 10.0), p(20.0, 5.0))
        );
    }

    #[test]
    fn test_quadratic_promoted_to_cubic() {
        let segs = parse_path("M0 0 Q30 30 60 0");
        assert_eq!(
            segs[1],
            Segment::CubicTo(p(20.0, 20.0), p(40.0, 20.0), p(60.0, 0.0))
        );
    }

    #[test]
    fn test_smooth_quadratic_reflects_control() {
        let segs = parse_path("M0 0 Q30 30 60 0 T120 0");
        // reflected control point is (90, -30)
        assert_eq!(
            segs[2],
            Segment::CubicTo(p(80.0, -20.0), p(100.0, -20.0), p(120.0, 0.0))
        );
    }

    #[test]
    fn test_arc_becomes_line_to_endpoint() {
        let segs = parse_path("M10 10 A5 5 0 0 1 20 10 a5 5 0 1 0 0 10");
        assert_eq!(segs[1], Segment::LineTo(p(20.0, 10.0)));
        assert_eq!(segs[2], Segment::LineTo(p(20.0, 20.0)));
    }

    #[test]
    fn test_arc_with_packed_flags() {
        let segs = parse_path("M0 0a5 5 0 0110 0");
        assert_eq!(segs[1], Segment::LineTo(p(10.0, 0.0)));
    }

    #[test]
    fn test_compact_numbers() {
        assert_eq!(parse_number_list("1.5.5-2e1,3"), vec![1.5, 0.5, -20.0, 3.0]);
        let segs = parse_path("M0,0l1-1");
        assert_eq!(segs[1], Segment::LineTo(p(1.0, -1.0)));
    }

    #[test]
    fn test_malformed_keeps_prefix() {
        let segs = parse_path("M0 0 L10 10 L oops");
        assert_eq!(segs.len(), 2);
        assert!(parse_path("10 10").is_empty());
    }

    #[test]
    fn test_parse_points_drops_odd_tail() {
        assert_eq!(
            parse_points("0,0 10,0 10,10 5"),
            vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)]
        );
    }
}
