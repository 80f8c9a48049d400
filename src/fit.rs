//! Path simplification and curve fitting: raw lattice contours are reduced
//! to a short sequence of straight and cubic Bezier segments.
//!
//! Per contour:
//! 1. Douglas-Peucker reduction at a tolerance derived from `detail_level`
//! 2. corner/smooth vertex classification by local turning angle, with the
//!    corner threshold derived from `smoothness`
//! 3. least-squares cubic fitting of each smooth run within a
//!    smoothness-derived error bound, splitting recursively when a single
//!    curve cannot stay inside the bound

use log::debug;

use crate::geom::{Point, perpendicular_distance, signed_area, turning_angle};
use crate::trace::RawContour;

/// Derived algorithm parameters for one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct FitParams {
    /// Outer contours with enclosed area below this are suppressed
    /// (speckle filter), in grid px².
    pub min_area: f64,
    /// Douglas-Peucker tolerance in grid units.
    pub simplify_tolerance: f64,
    /// Turning angle (radians) above which a vertex stays a hard corner.
    pub corner_angle: f64,
    /// Maximum allowed deviation when fitting a cubic to a smooth run.
    pub max_fit_error: f64,
}

impl FitParams {
    /// Map the two user knobs onto algorithm parameters.
    ///
    /// The speckle threshold follows the reference mapping
    /// `(100 - detail) / 5`; higher detail keeps smaller features. Higher
    /// smoothness raises the corner threshold (fewer hard corners) and
    /// loosens the fit tolerance (fewer, smoother curves).
    pub fn from_knobs(detail_level: u8, smoothness: u8) -> Self {
        let detail = detail_level.min(100) as f64;
        let smooth = smoothness.min(100) as f64;
        Self {
            min_area: ((100.0 - detail) / 5.0).round(),
            simplify_tolerance: 0.3 + (100.0 - detail) / 50.0,
            corner_angle: (25.0 + smooth * 1.1).to_radians(),
            max_fit_error: 0.5 + smooth * 0.035,
        }
    }
}

/// One drawable segment of a fitted path; the start point is the previous
/// segment's endpoint (or the path start).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Straight line to the endpoint.
    Line(Point),
    /// Cubic Bezier: two control points, then the endpoint.
    Cubic(Point, Point, Point),
}

impl PathSegment {
    pub fn end(&self) -> Point {
        match *self {
            PathSegment::Line(p) => p,
            PathSegment::Cubic(_, _, p) => p,
        }
    }
}

/// A closed fitted outline, never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedPath {
    pub start: Point,
    pub segments: Vec<PathSegment>,
    /// Inherited contour polarity.
    pub hole: bool,
    /// Index of the enclosing outer path within the same fitted sequence.
    pub parent: Option<usize>,
}

impl FittedPath {
    /// Axis-aligned bounds over all endpoints and control points.
    pub fn bounding_box(&self) -> (Point, Point) {
        let mut min = self.start;
        let mut max = self.start;
        let mut grow = |p: Point| {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        };
        for seg in &self.segments {
            match *seg {
                PathSegment::Line(p) => grow(p),
                PathSegment::Cubic(c1, c2, p) => {
                    grow(c1);
                    grow(c2);
                    grow(p);
                }
            }
        }
        (min, max)
    }

    /// Enclosed area of the flattened outline (shoelace, absolute value).
    /// Cubic segments are sampled at a fixed subdivision.
    pub fn approx_area(&self) -> f64 {
        const STEPS: usize = 16;
        let mut poly = vec![self.start];
        let mut from = self.start;
        for seg in &self.segments {
            match *seg {
                PathSegment::Line(p) => poly.push(p),
                PathSegment::Cubic(c1, c2, p) => {
                    for i in 1..=STEPS {
                        let t = i as f64 / STEPS as f64;
                        poly.push(cubic_point(from, c1, c2, p, t));
                    }
                }
            }
            from = seg.end();
        }
        signed_area(&poly).abs()
    }
}

/// Fit a whole contour sequence, applying the detail filter and keeping
/// hole/parent relations consistent across suppression.
///
/// Holes follow their parent: suppressing an outer contour suppresses its
/// holes. When the filter would suppress everything, the largest outer
/// contour is kept so non-empty foreground always produces at least one
/// path.
pub fn fit_contours(contours: &[RawContour], params: &FitParams) -> Vec<FittedPath> {
    let mut keep_outer: Vec<bool> = contours
        .iter()
        .map(|c| !c.hole && c.area >= params.min_area)
        .collect();

    if !keep_outer.iter().any(|&k| k)
        && let Some(largest) = contours
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.hole)
            .max_by(|a, b| a.1.area.total_cmp(&b.1.area))
            .map(|(i, _)| i)
    {
        keep_outer[largest] = true;
    }

    // Map surviving source indices to output indices for parent rewiring.
    let mut new_index = vec![None; contours.len()];
    let mut fitted = Vec::new();
    for (i, contour) in contours.iter().enumerate() {
        let keep = if contour.hole {
            contour.area >= params.min_area
                && contour.parent.is_some_and(|p| keep_outer[p])
        } else {
            keep_outer[i]
        };
        if !keep {
            continue;
        }
        let parent = contour.parent.and_then(|p| new_index[p]);
        if let Some(path) = fit_contour(contour, params, parent) {
            new_index[i] = Some(fitted.len());
            fitted.push(path);
        }
    }
    debug!("fitted {} of {} contours", fitted.len(), contours.len());
    fitted
}

/// Fit a single contour. Returns `None` only for contours too small to
/// form a polygon, which the tracer already filters out.
pub fn fit_contour(
    contour: &RawContour,
    params: &FitParams,
    parent: Option<usize>,
) -> Option<FittedPath> {
    let raw = contour.as_points();
    if raw.len() < 3 {
        return None;
    }
    let mut polygon = simplify_closed(&raw, params.simplify_tolerance);
    if polygon.len() < 3 {
        polygon = raw;
    }

    let corners = classify_corners(&polygon, params.corner_angle);
    let segments = fit_polygon(&polygon, &corners, params.max_fit_error);
    let start = match corners.first() {
        Some(&c) => polygon[c],
        None => polygon[0],
    };
    debug_assert!(!segments.is_empty());
    Some(FittedPath {
        start,
        segments,
        hole: contour.hole,
        parent,
    })
}

/// Douglas-Peucker reduction of a closed polygon.
///
/// The loop is cut at its start point and simplified as an open polyline
/// whose two endpoints coincide; the duplicate endpoint is dropped again
/// afterwards.
fn simplify_closed(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 3 || tolerance <= 0.0 {
        return points.to_vec();
    }
    let mut open: Vec<Point> = points.to_vec();
    open.push(points[0]);
    let mut kept = vec![open[0]];
    rdp(&open, tolerance, &mut kept);
    kept.pop();
    kept
}

/// Recursive Ramer-Douglas-Peucker core; appends every kept point after
/// the slice start.
fn rdp(points: &[Point], tolerance: f64, kept: &mut Vec<Point>) {
    let last = points.len() - 1;
    if last < 1 {
        return;
    }
    let mut max_dist = 0.0;
    let mut index = 0;
    for (i, &p) in points.iter().enumerate().take(last).skip(1) {
        let d = perpendicular_distance(p, points[0], points[last]);
        if d > max_dist {
            max_dist = d;
            index = i;
        }
    }
    if max_dist > tolerance {
        rdp(&points[..=index], tolerance, kept);
        rdp(&points[index..], tolerance, kept);
    } else {
        kept.push(points[last]);
    }
}

/// Indices of vertices whose turning angle exceeds the corner threshold,
/// in polygon order.
fn classify_corners(polygon: &[Point], corner_angle: f64) -> Vec<usize> {
    let n = polygon.len();
    (0..n)
        .filter(|&i| {
            let prev = polygon[(i + n - 1) % n];
            let next = polygon[(i + 1) % n];
            turning_angle(prev, polygon[i], next) > corner_angle
        })
        .collect()
}

/// Fit the closed polygon, splitting at hard corners.
///
/// Each maximal run of smooth vertices between two corners is fitted with
/// cubics; a fully smooth polygon (no corners) is fitted as one run that
/// wraps around to its start.
fn fit_polygon(polygon: &[Point], corners: &[usize], max_error: f64) -> Vec<PathSegment> {
    let n = polygon.len();
    let mut segments = Vec::new();

    // Zero or one corner: the whole loop is a single run wrapping back to
    // its start point.
    if corners.len() <= 1 {
        let first = corners.first().copied().unwrap_or(0);
        let mut run: Vec<Point> = Vec::with_capacity(n + 1);
        run.extend((0..n).map(|i| polygon[(first + i) % n]));
        run.push(polygon[first]);
        segments.extend(fit_run(&run, max_error));
        return segments;
    }

    for (ci, &start) in corners.iter().enumerate() {
        let end = corners[(ci + 1) % corners.len()];
        let run = cyclic_slice(polygon, start, end, n);
        if run.len() < 3 {
            segments.push(PathSegment::Line(polygon[end]));
        } else {
            segments.extend(fit_run(&run, max_error));
        }
    }
    segments
}

/// Collect polygon vertices from `start` to `end` inclusive, wrapping.
fn cyclic_slice(polygon: &[Point], start: usize, end: usize, n: usize) -> Vec<Point> {
    let mut run = Vec::new();
    let mut i = start;
    loop {
        run.push(polygon[i]);
        if i == end {
            break;
        }
        i = (i + 1) % n;
    }
    run
}

/// Newton-Raphson refinement attempts before giving up and splitting.
const MAX_REPARAM_ITERATIONS: usize = 4;

/// Fit one open run of points with cubics within `max_error`, in the
/// least-squares style of Schneider's curve fitter: chord-length
/// parameterization, tangent-constrained least squares, iterative
/// reparameterization, recursive splitting at the worst point.
fn fit_run(points: &[Point], max_error: f64) -> Vec<PathSegment> {
    debug_assert!(points.len() >= 2);
    if points.len() == 2 {
        return vec![PathSegment::Line(points[1])];
    }
    let left_tangent = normalize(points[1] - points[0]);
    let right_tangent = normalize(points[points.len() - 2] - points[points.len() - 1]);
    let mut segments = Vec::new();
    fit_cubic(points, left_tangent, right_tangent, max_error, &mut segments);
    segments
}

fn fit_cubic(
    points: &[Point],
    left_tangent: Point,
    right_tangent: Point,
    max_error: f64,
    out: &mut Vec<PathSegment>,
) {
    let n = points.len();
    if n == 2 {
        out.push(PathSegment::Line(points[1]));
        return;
    }

    let mut u = chord_length_parameterize(points);
    let mut bez = generate_bezier(points, &u, left_tangent, right_tangent);
    let (mut err, mut split) = max_fit_error(points, &bez, &u);
    if err <= max_error {
        out.push(PathSegment::Cubic(bez[1], bez[2], bez[3]));
        return;
    }

    // A moderately bad fit is often rescued by re-estimating the
    // parameter values against the current curve.
    if err <= max_error * 4.0 {
        for _ in 0..MAX_REPARAM_ITERATIONS {
            u = reparameterize(points, &u, &bez);
            bez = generate_bezier(points, &u, left_tangent, right_tangent);
            (err, split) = max_fit_error(points, &bez, &u);
            if err <= max_error {
                out.push(PathSegment::Cubic(bez[1], bez[2], bez[3]));
                return;
            }
        }
    }

    // Split at the worst point and fit both halves recursively.
    let split = split.clamp(1, n - 2);
    let center_tangent = center_tangent_at(points, split);
    fit_cubic(&points[..=split], left_tangent, center_tangent, max_error, out);
    fit_cubic(
        &points[split..],
        center_tangent * -1.0,
        right_tangent,
        max_error,
        out,
    );
}

fn center_tangent_at(points: &[Point], split: usize) -> Point {
    let v = points[split - 1] - points[split + 1];
    if v.x == 0.0 && v.y == 0.0 {
        return normalize(points[split - 1] - points[split]);
    }
    normalize(v)
}

/// Point on a cubic with explicit start point, Bernstein form.
fn cubic_point(p0: Point, c1: Point, c2: Point, p3: Point, t: f64) -> Point {
    let s = 1.0 - t;
    p0 * (s * s * s) + c1 * (3.0 * s * s * t) + c2 * (3.0 * s * t * t) + p3 * (t * t * t)
}

fn normalize(v: Point) -> Point {
    let len = v.x.hypot(v.y);
    if len == 0.0 {
        return Point::new(0.0, 0.0);
    }
    v * (1.0 / len)
}

fn dot(a: Point, b: Point) -> f64 {
    a.x * b.x + a.y * b.y
}

/// Parameter values proportional to accumulated chord length, scaled to
/// `[0, 1]`.
fn chord_length_parameterize(points: &[Point]) -> Vec<f64> {
    let mut u = Vec::with_capacity(points.len());
    u.push(0.0);
    for i in 1..points.len() {
        u.push(u[i - 1] + points[i].distance(points[i - 1]));
    }
    let total = u[points.len() - 1];
    if total > 0.0 {
        for v in u.iter_mut() {
            *v /= total;
        }
    }
    u
}

/// Least-squares cubic with endpoints pinned and inner control points
/// constrained to the unit tangents.
fn generate_bezier(
    points: &[Point],
    u: &[f64],
    left_tangent: Point,
    right_tangent: Point,
) -> [Point; 4] {
    let n = points.len();
    let first = points[0];
    let last = points[n - 1];

    let mut c = [[0.0f64; 2]; 2];
    let mut x = [0.0f64; 2];
    for (&p, &t) in points.iter().zip(u.iter()) {
        let b0 = (1.0 - t).powi(3);
        let b1 = 3.0 * t * (1.0 - t).powi(2);
        let b2 = 3.0 * t * t * (1.0 - t);
        let b3 = t.powi(3);

        let a0 = left_tangent * b1;
        let a1 = right_tangent * b2;

        c[0][0] += dot(a0, a0);
        c[0][1] += dot(a0, a1);
        c[1][1] += dot(a1, a1);

        let tmp = p - (first * (b0 + b1) + last * (b2 + b3));
        x[0] += dot(a0, tmp);
        x[1] += dot(a1, tmp);
    }
    c[1][0] = c[0][1];

    let det_c = c[0][0] * c[1][1] - c[1][0] * c[0][1];
    let (mut alpha_l, mut alpha_r) = if det_c != 0.0 {
        (
            (x[0] * c[1][1] - x[1] * c[0][1]) / det_c,
            (c[0][0] * x[1] - c[1][0] * x[0]) / det_c,
        )
    } else {
        (0.0, 0.0)
    };

    // Degenerate or inside-out alphas: fall back to a third of the chord,
    // Wu/Barsky style.
    let seg_length = first.distance(last);
    let epsilon = 1.0e-6 * seg_length;
    if alpha_l < epsilon || alpha_r < epsilon {
        alpha_l = seg_length / 3.0;
        alpha_r = alpha_l;
    }

    [
        first,
        first + left_tangent * alpha_l,
        last + right_tangent * alpha_r,
        last,
    ]
}

/// Evaluate a Bernstein polynomial of the given degree at `t` (de
/// Casteljau).
fn bezier_eval(ctrl: &[Point], t: f64) -> Point {
    let mut tmp = ctrl.to_vec();
    for r in 1..ctrl.len() {
        for i in 0..ctrl.len() - r {
            tmp[i] = tmp[i] * (1.0 - t) + tmp[i + 1] * t;
        }
    }
    tmp[0]
}

/// Maximum deviation between the points and the curve, and the index
/// where it occurs.
fn max_fit_error(points: &[Point], bez: &[Point; 4], u: &[f64]) -> (f64, usize) {
    let mut max_dist = 0.0;
    let mut split = points.len() / 2;
    for i in 1..points.len() - 1 {
        let d = bezier_eval(bez, u[i]).distance(points[i]);
        if d > max_dist {
            max_dist = d;
            split = i;
        }
    }
    (max_dist, split)
}

/// One Newton-Raphson step per point toward the parameter of the closest
/// curve location.
fn reparameterize(points: &[Point], u: &[f64], bez: &[Point; 4]) -> Vec<f64> {
    points
        .iter()
        .zip(u.iter())
        .map(|(&p, &t)| newton_raphson_root(bez, p, t))
        .collect()
}

fn newton_raphson_root(bez: &[Point; 4], p: Point, t: f64) -> f64 {
    let q = bezier_eval(bez, t);
    let d1: Vec<Point> = (0..3).map(|i| (bez[i + 1] - bez[i]) * 3.0).collect();
    let d2: Vec<Point> = (0..2).map(|i| (d1[i + 1] - d1[i]) * 2.0).collect();
    let q1 = bezier_eval(&d1, t);
    let q2 = bezier_eval(&d2, t);

    let numerator = dot(q - p, q1);
    let denominator = dot(q1, q1) + dot(q - p, q2);
    if denominator == 0.0 {
        return t;
    }
    (t - numerator / denominator).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::BilevelGrid;
    use crate::trace::trace;

    fn square_contour(side: i32) -> RawContour {
        let grid = BilevelGrid::from_fn((side + 2) as u32, (side + 2) as u32, |x, y| {
            (1..=side as u32).contains(&x) && (1..=side as u32).contains(&y)
        });
        trace(&grid).unwrap().into_iter().next().unwrap()
    }

    fn disk_grid(radius: f64) -> BilevelGrid {
        let size = (radius * 2.0 + 4.0) as u32;
        let c = size as f64 / 2.0;
        BilevelGrid::from_fn(size, size, |x, y| {
            let dx = x as f64 + 0.5 - c;
            let dy = y as f64 + 0.5 - c;
            dx.hypot(dy) <= radius
        })
    }

    mod params {
        use super::*;

        #[test]
        fn speckle_threshold_matches_reference_mapping() {
            assert_eq!(FitParams::from_knobs(100, 50).min_area, 0.0);
            assert_eq!(FitParams::from_knobs(70, 50).min_area, 6.0);
            assert_eq!(FitParams::from_knobs(0, 50).min_area, 20.0);
        }

        #[test]
        fn higher_smoothness_loosens_both_knobs() {
            let sharp = FitParams::from_knobs(70, 0);
            let smooth = FitParams::from_knobs(70, 100);
            assert!(smooth.corner_angle > sharp.corner_angle);
            assert!(smooth.max_fit_error > sharp.max_fit_error);
        }

        #[test]
        fn higher_detail_tightens_simplification() {
            assert!(
                FitParams::from_knobs(100, 50).simplify_tolerance
                    < FitParams::from_knobs(0, 50).simplify_tolerance
            );
        }
    }

    mod fitting {
        use super::*;

        #[test]
        fn square_becomes_four_lines_at_default_smoothness() {
            let contour = square_contour(6);
            let params = FitParams::from_knobs(70, 50);
            let path = fit_contour(&contour, &params, None).unwrap();
            assert_eq!(path.segments.len(), 4);
            assert!(path
                .segments
                .iter()
                .all(|s| matches!(s, PathSegment::Line(_))));
        }

        #[test]
        fn square_bounding_box_matches_pixel_extents() {
            let contour = square_contour(6);
            let params = FitParams::from_knobs(70, 50);
            let path = fit_contour(&contour, &params, None).unwrap();
            let (min, max) = path.bounding_box();
            assert!((min.x - 1.0).abs() <= 1.0 && (min.y - 1.0).abs() <= 1.0);
            assert!((max.x - 7.0).abs() <= 1.0 && (max.y - 7.0).abs() <= 1.0);
        }

        #[test]
        fn disk_produces_cubic_segments() {
            let contours = trace(&disk_grid(10.0)).unwrap();
            let params = FitParams::from_knobs(70, 80);
            let path = fit_contour(&contours[0], &params, None).unwrap();
            assert!(path
                .segments
                .iter()
                .any(|s| matches!(s, PathSegment::Cubic(..))));
        }

        #[test]
        fn fitted_area_stays_close_to_raw_area_across_smoothness() {
            let contours = trace(&disk_grid(12.0)).unwrap();
            let raw_area = contours[0].area;
            for smoothness in [0, 25, 50, 75, 100] {
                let params = FitParams::from_knobs(70, smoothness);
                let path = fit_contour(&contours[0], &params, None).unwrap();
                let err = (path.approx_area() - raw_area).abs() / raw_area;
                assert!(
                    err < 0.25,
                    "area drift {err} at smoothness {smoothness}"
                );
            }
        }

        #[test]
        fn zero_knobs_still_produce_a_path() {
            let contour = square_contour(4);
            let params = FitParams::from_knobs(0, 0);
            let path = fit_contour(&contour, &params, None).unwrap();
            assert!(!path.segments.is_empty());
        }

        #[test]
        fn fitting_is_deterministic() {
            let contours = trace(&disk_grid(9.0)).unwrap();
            let params = FitParams::from_knobs(55, 60);
            let a = fit_contour(&contours[0], &params, None).unwrap();
            let b = fit_contour(&contours[0], &params, None).unwrap();
            assert_eq!(a, b);
        }
    }

    mod filtering {
        use super::*;

        fn two_blobs() -> Vec<RawContour> {
            // A 6x6 block and a 2x2 speckle.
            let grid = BilevelGrid::from_fn(16, 10, |x, y| {
                ((1..7).contains(&x) && (1..7).contains(&y))
                    || ((10..12).contains(&x) && (2..4).contains(&y))
            });
            trace(&grid).unwrap()
        }

        #[test]
        fn speckles_below_min_area_are_suppressed() {
            let contours = two_blobs();
            assert_eq!(contours.len(), 2);
            let params = FitParams::from_knobs(70, 50); // min_area 6
            let fitted = fit_contours(&contours, &params);
            assert_eq!(fitted.len(), 1);
        }

        #[test]
        fn full_detail_keeps_small_features() {
            let contours = two_blobs();
            let params = FitParams::from_knobs(100, 50); // min_area 0
            let fitted = fit_contours(&contours, &params);
            assert_eq!(fitted.len(), 2);
        }

        #[test]
        fn largest_outer_survives_even_at_zero_detail() {
            // min_area 20 at detail 0 would suppress a lone 3x3 blob; the
            // keep-largest fallback must retain it.
            let grid = BilevelGrid::from_fn(5, 5, |x, y| {
                (1..4).contains(&x) && (1..4).contains(&y)
            });
            let contours = trace(&grid).unwrap();
            let params = FitParams::from_knobs(0, 0);
            let fitted = fit_contours(&contours, &params);
            assert_eq!(fitted.len(), 1);
        }

        #[test]
        fn hole_parent_is_reindexed_after_filtering() {
            // A speckle before a ring in discovery order shifts indices.
            let grid = BilevelGrid::from_fn(18, 10, |x, y| {
                let speckle = (1..3).contains(&x) && (1..3).contains(&y);
                let ring = (6..14).contains(&x)
                    && (2..9).contains(&y)
                    && !((8..12).contains(&x) && (4..7).contains(&y));
                speckle || ring
            });
            let contours = trace(&grid).unwrap();
            let params = FitParams::from_knobs(70, 50); // suppresses the speckle
            let fitted = fit_contours(&contours, &params);
            assert_eq!(fitted.len(), 2);
            let hole_parent = fitted
                .iter()
                .find(|p| p.hole)
                .and_then(|p| p.parent)
                .unwrap();
            assert!(!fitted[hole_parent].hole);
        }

        #[test]
        fn holes_of_suppressed_outers_are_suppressed() {
            // A small ring below the speckle threshold disappears whole.
            let grid = BilevelGrid::from_fn(20, 8, |x, y| {
                let big = (1..8).contains(&x) && (1..7).contains(&y);
                let ring = (12..16).contains(&x)
                    && (2..5).contains(&y)
                    && !((13..15).contains(&x) && (3..4).contains(&y));
                big || ring
            });
            let contours = trace(&grid).unwrap();
            let params = FitParams::from_knobs(30, 50); // min_area 14
            let fitted = fit_contours(&contours, &params);
            assert_eq!(fitted.len(), 1);
            assert!(!fitted[0].hole);
        }
    }
}
