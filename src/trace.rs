//! Contour tracing: closed boundary extraction from a bilevel grid.
//!
//! The tracer walks the cracks between foreground and background pixels on
//! the pixel-corner lattice, keeping foreground on the left of the travel
//! direction. Every boundary loop is discovered from a row-major scan over
//! vertical cracks and traversed exactly once; polarity (outer vs hole)
//! falls out of the traversal orientation via the shoelace sign.

use log::debug;

use crate::error::{VectorizerError, VectorizerResult};
use crate::geom::{Point, point_in_polygon};
use crate::preprocess::BilevelGrid;

/// One closed boundary on the pixel-corner lattice.
///
/// Points are lattice corners in grid units, ordered along the walk. The
/// sequence is closed implicitly (last point connects back to the first).
#[derive(Debug, Clone, PartialEq)]
pub struct RawContour {
    pub points: Vec<(i32, i32)>,
    /// True for a hole boundary (subtracts fill), false for an outer one.
    pub hole: bool,
    /// Index of the enclosing outer contour, for holes. Back-reference
    /// into the sequence returned by [`trace`], not an owning relation.
    pub parent: Option<usize>,
    /// Absolute enclosed area in grid units.
    pub area: f64,
}

impl RawContour {
    /// Lattice points as floating-point geometry.
    pub fn as_points(&self) -> Vec<Point> {
        self.points
            .iter()
            .map(|&(x, y)| Point::new(x as f64, y as f64))
            .collect()
    }
}

/// Walk direction along lattice cracks, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Right,
    Down,
    Left,
    Up,
}

impl Dir {
    fn delta(self) -> (i32, i32) {
        match self {
            Dir::Right => (1, 0),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Up => (0, -1),
        }
    }

    /// Rotation toward the foreground side of the walk.
    fn turn_left(self) -> Dir {
        match self {
            Dir::Down => Dir::Right,
            Dir::Right => Dir::Up,
            Dir::Up => Dir::Left,
            Dir::Left => Dir::Down,
        }
    }

    fn turn_right(self) -> Dir {
        match self {
            Dir::Right => Dir::Down,
            Dir::Down => Dir::Left,
            Dir::Left => Dir::Up,
            Dir::Up => Dir::Right,
        }
    }
}

/// The pixels ahead of lattice point `p` when continuing in direction `d`:
/// (left-of-travel, right-of-travel).
fn pixels_ahead(p: (i32, i32), d: Dir) -> ((i64, i64), (i64, i64)) {
    let (px, py) = (p.0 as i64, p.1 as i64);
    match d {
        Dir::Right => ((px, py - 1), (px, py)),
        Dir::Left => ((px - 1, py), (px - 1, py - 1)),
        Dir::Down => ((px, py), (px - 1, py)),
        Dir::Up => ((px - 1, py - 1), (px, py - 1)),
    }
}

/// Trace all boundary contours of a bilevel grid.
///
/// Contours are returned in discovery order (row-major scan of their
/// topmost-leftmost vertical crack), which makes output reproducible for
/// identical input. Degenerate one-pixel and zero-area loops are
/// discarded. An empty grid yields an empty sequence.
pub fn trace(grid: &BilevelGrid) -> VectorizerResult<Vec<RawContour>> {
    let w = grid.width() as i32;
    let h = grid.height() as i32;
    if w == 0 || h == 0 {
        return Ok(Vec::new());
    }

    // Visited markers for vertical cracks: crack (x, y) separates pixel
    // (x-1, y) from pixel (x, y), x in 0..=w, y in 0..h. The row-major
    // scan only ever starts at vertical cracks, so marking those is enough
    // to guarantee every loop is traced once.
    let crack_index = |x: i32, y: i32| (y * (w + 1) + x) as usize;
    let mut visited = vec![false; ((w + 1) * h) as usize];

    let mut contours = Vec::new();
    for y in 0..h {
        for x in 0..=w {
            let fg_right = grid.is_foreground(x as i64, y as i64);
            let fg_left = grid.is_foreground(x as i64 - 1, y as i64);
            if fg_right == fg_left || visited[crack_index(x, y)] {
                continue;
            }
            // Walk with foreground on the left: down along the crack when
            // the foreground pixel is on its right side, up otherwise.
            let (start, dir) = if fg_right {
                ((x, y), Dir::Down)
            } else {
                ((x, y + 1), Dir::Up)
            };
            let points = walk(grid, start, dir, |cx, cy| {
                visited[crack_index(cx, cy)] = true;
            })?;

            let area2 = twice_signed_area(&points);
            // Negative twice-area = interior on the left = outer boundary.
            // |area| <= 1 px loops are speckle-level noise.
            if points.len() < 4 || area2.abs() <= 2 {
                continue;
            }
            contours.push(RawContour {
                points,
                hole: area2 > 0,
                parent: None,
                area: area2.abs() as f64 / 2.0,
            });
        }
    }

    assign_parents(&mut contours);
    debug!(
        "traced {} contours ({} holes)",
        contours.len(),
        contours.iter().filter(|c| c.hole).count()
    );
    Ok(contours)
}

/// Follow one boundary loop from `start` heading `dir` until it closes.
///
/// `mark` is called with every vertical crack traversed. The step cap only
/// trips if the turn rule ever leaves the boundary, which would be an
/// internal invariant violation, not a property of any input.
fn walk(
    grid: &BilevelGrid,
    start: (i32, i32),
    mut dir: Dir,
    mut mark: impl FnMut(i32, i32),
) -> VectorizerResult<Vec<(i32, i32)>> {
    let max_steps = 4 * ((grid.width() as usize + 1) * (grid.height() as usize + 1)) + 4;
    let mut points = Vec::new();
    let mut p = start;

    for _ in 0..max_steps {
        points.push(p);
        match dir {
            Dir::Down => mark(p.0, p.1),
            Dir::Up => mark(p.0, p.1 - 1),
            _ => {}
        }
        let (dx, dy) = dir.delta();
        p = (p.0 + dx, p.1 + dy);
        if p == start {
            return Ok(points);
        }
        let (la, ra) = pixels_ahead(p, dir);
        let left_fg = grid.is_foreground(la.0, la.1);
        let right_fg = grid.is_foreground(ra.0, ra.1);
        dir = match (left_fg, right_fg) {
            // Boundary continues straight between the two pixels ahead.
            (true, false) => dir,
            // Both ahead foreground: the boundary bends away from it.
            (true, true) => dir.turn_right(),
            // Both background (includes the ambiguous diagonal crossing):
            // wrap tightly around the pixel behind-left. Diagonal contacts
            // therefore split, i.e. foreground is 4-connected.
            (false, false) | (false, true) => dir.turn_left(),
        };
    }
    Err(VectorizerError::Tracing(format!(
        "boundary walk from {start:?} did not close"
    )))
}

/// Exact twice-signed-area of an integer lattice polygon.
fn twice_signed_area(points: &[(i32, i32)]) -> i64 {
    let n = points.len();
    if n < 3 {
        return 0;
    }
    (0..n)
        .map(|i| {
            let (xi, yi) = points[i];
            let (xj, yj) = points[(i + 1) % n];
            xi as i64 * yj as i64 - xj as i64 * yi as i64
        })
        .sum()
}

/// Attach each hole to the tightest outer contour containing it.
///
/// The containment probe is the center of the hole's first interior pixel
/// (offset half a unit from the walk start), which can never sit on a
/// lattice-aligned boundary edge, so the ray cast is unambiguous.
fn assign_parents(contours: &mut [RawContour]) {
    let outers: Vec<(usize, Vec<Point>, f64)> = contours
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.hole)
        .map(|(i, c)| (i, c.as_points(), c.area))
        .collect();

    for contour in contours.iter_mut().filter(|c| c.hole) {
        let (sx, sy) = contour.points[0];
        let probe = Point::new(sx as f64 + 0.5, sy as f64 - 0.5);
        contour.parent = outers
            .iter()
            .filter(|(_, points, _)| point_in_polygon(probe, points))
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(i, _, _)| *i);
    }
}
