//! Shared geometry helpers for contour simplification and curve fitting.

/// A 2D point in grid coordinates (y grows downward, matching image space).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Point;
    fn mul(self, s: f64) -> Point {
        Point::new(self.x * s, self.y * s)
    }
}

/// Signed area of a closed polygon via the shoelace formula.
///
/// With y-down image coordinates, a negative result means the polygon is
/// traversed with its interior on the left (an outer boundary as produced
/// by the tracer); positive means a hole.
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            points[i].x * points[j].y - points[j].x * points[i].y
        })
        .sum::<f64>()
        / 2.0
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
///
/// Falls back to the point distance when `a == b`.
pub fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return p.distance(a);
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len
}

/// Even-odd ray cast: is `p` strictly inside the closed polygon?
pub fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > p.y) != (pj.y > p.y)
            && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Unsigned turning angle at `b` along the polyline `a -> b -> c`, in
/// radians `[0, pi]`. Zero means the three points are collinear.
pub fn turning_angle(a: Point, b: Point, c: Point) -> f64 {
    let v_in = b - a;
    let v_out = c - b;
    let dot = v_in.x * v_out.x + v_in.y * v_out.y;
    let cross = v_in.x * v_out.y - v_in.y * v_out.x;
    cross.atan2(dot).abs()
}
