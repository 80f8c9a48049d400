//! In-memory SVG document model and serializer.
//!
//! The document holds fitted paths plus pixel dimensions; serialization
//! groups every outer outline with its holes into a single `<path>` with
//! `fill-rule="evenodd"` so holes actually cut out of the fill.

use std::fmt::Write as _;

use crate::fit::{FittedPath, PathSegment};

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Assembled vector output, prior to optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
    pub width: u32,
    pub height: u32,
    pub paths: Vec<FittedPath>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Serialize every outline into one `<path>` element instead of one
    /// per outer contour. Set by the optimizer at high aggressiveness.
    pub merge_paths: bool,
}

impl VectorDocument {
    /// Number of `<path>` elements serialization will emit.
    pub fn path_count(&self) -> usize {
        let outers = self.paths.iter().filter(|p| !p.hole).count();
        if self.merge_paths && outers > 0 { 1 } else { outers }
    }

    /// True when every coordinate in every path is finite.
    pub fn is_finite(&self) -> bool {
        self.paths.iter().all(|path| {
            path.start.x.is_finite()
                && path.start.y.is_finite()
                && path.segments.iter().all(|seg| match *seg {
                    PathSegment::Line(p) => p.x.is_finite() && p.y.is_finite(),
                    PathSegment::Cubic(c1, c2, p) => {
                        [c1, c2, p].iter().all(|q| q.x.is_finite() && q.y.is_finite())
                    }
                })
        })
    }

    /// Serialize to a standalone SVG string with an `xmlns` declaration
    /// and a `viewBox` matching the pixel dimensions.
    pub fn to_svg_string(&self) -> String {
        let mut svg = String::new();
        let _ = write!(
            svg,
            "<svg xmlns=\"{}\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">",
            SVG_NAMESPACE, self.width, self.height, self.width, self.height,
        );
        if let Some(title) = &self.title {
            let _ = write!(svg, "<title>{}</title>", xml_escape(title));
        }
        if let Some(desc) = &self.description {
            let _ = write!(svg, "<desc>{}</desc>", xml_escape(desc));
        }

        let mut data = String::new();
        for (i, path) in self.paths.iter().enumerate() {
            if path.hole {
                continue;
            }
            write_subpath(&mut data, path);
            for hole in self.paths.iter().filter(|p| p.hole && p.parent == Some(i)) {
                write_subpath(&mut data, hole);
            }
            if !self.merge_paths {
                write_path_element(&mut svg, &data);
                data.clear();
            }
        }
        if self.merge_paths && !data.is_empty() {
            write_path_element(&mut svg, &data);
        }

        svg.push_str("</svg>");
        svg
    }
}

/// Build a document from fitted paths and the preprocessed grid size.
pub fn assemble(width: u32, height: u32, paths: Vec<FittedPath>) -> VectorDocument {
    VectorDocument {
        width,
        height,
        paths,
        title: None,
        description: None,
        merge_paths: false,
    }
}

fn write_path_element(svg: &mut String, data: &str) {
    let _ = write!(
        svg,
        "<path fill=\"#000000\" fill-rule=\"evenodd\" d=\"{data}\"/>"
    );
}

fn write_subpath(data: &mut String, path: &FittedPath) {
    if !data.is_empty() {
        data.push(' ');
    }
    let _ = write!(data, "M{} {}", fmt_coord(path.start.x), fmt_coord(path.start.y));
    for seg in &path.segments {
        match *seg {
            PathSegment::Line(p) => {
                let _ = write!(data, " L{} {}", fmt_coord(p.x), fmt_coord(p.y));
            }
            PathSegment::Cubic(c1, c2, p) => {
                let _ = write!(
                    data,
                    " C{} {} {} {} {} {}",
                    fmt_coord(c1.x),
                    fmt_coord(c1.y),
                    fmt_coord(c2.x),
                    fmt_coord(c2.y),
                    fmt_coord(p.x),
                    fmt_coord(p.y),
                );
            }
        }
    }
    data.push('Z');
}

/// Shortest exact decimal form, with negative zero flattened.
fn fmt_coord(v: f64) -> String {
    let v = if v == 0.0 { 0.0 } else { v };
    if v == v.trunc() && v.abs() < 1.0e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Escape text content for embedding in XML.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
