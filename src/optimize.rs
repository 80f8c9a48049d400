//! Best-effort output optimization.
//!
//! The single `level` knob (0-100) trades fidelity for byte size:
//! metadata elements are always dropped, coordinate precision falls as the
//! level rises, and above 70 all outlines merge into one path element.
//! Optimizing an already-optimized document at the same level is a no-op.

use log::warn;

use crate::document::VectorDocument;
use crate::fit::PathSegment;
use crate::geom::Point;

/// Default aggressiveness used by the pipeline.
pub const DEFAULT_LEVEL: u8 = 50;

/// Decimal places kept at a given level, mirroring the precision ladder
/// of the reference optimizer config.
fn precision_for_level(level: u8) -> i32 {
    match level {
        0..=40 => 3,
        41..=70 => 2,
        _ => 1,
    }
}

/// Optimize a document. Never fails: a document containing non-finite
/// coordinates is returned unchanged.
pub fn optimize(document: &VectorDocument, level: u8) -> VectorDocument {
    if !document.is_finite() {
        warn!("skipping optimization: document has non-finite coordinates");
        return document.clone();
    }
    let level = level.min(100);
    let precision = precision_for_level(level);

    let mut out = document.clone();
    out.title = None;
    out.description = None;
    out.merge_paths = level > 70;
    for path in &mut out.paths {
        path.start = round_point(path.start, precision);
        for seg in &mut path.segments {
            *seg = match *seg {
                PathSegment::Line(p) => PathSegment::Line(round_point(p, precision)),
                PathSegment::Cubic(c1, c2, p) => PathSegment::Cubic(
                    round_point(c1, precision),
                    round_point(c2, precision),
                    round_point(p, precision),
                ),
            };
        }
    }
    out
}

fn round_point(p: Point, precision: i32) -> Point {
    let factor = 10f64.powi(precision);
    Point::new((p.x * factor).round() / factor, (p.y * factor).round() / factor)
}
