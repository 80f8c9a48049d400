//! Compatibility validation for produced SVG.
//!
//! Targets strict consumers (embroidery and cutting tools, icon
//! pipelines) that only handle plain geometry. Elements those consumers
//! reject outright are blocking; elements that merely degrade are
//! advisory.

use serde::Serialize;

use crate::document::VectorDocument;

/// Elements that make the output unusable for strict consumers.
const BLOCKING_ELEMENTS: [&str; 5] = ["text", "foreignObject", "video", "audio", "script"];

/// Elements that render but often degrade or rasterize downstream.
const ADVISORY_ELEMENTS: [&str; 3] = ["filter", "linearGradient", "radialGradient"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Blocking,
    Advisory,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompatWarning {
    pub severity: Severity,
    pub element: String,
    pub message: String,
}

/// Validation outcome; `ok` is false iff any blocking warning is present.
#[derive(Debug, Clone, Serialize)]
pub struct CompatReport {
    pub ok: bool,
    pub warnings: Vec<CompatWarning>,
}

/// Validate a document by scanning its serialized form.
pub fn validate(document: &VectorDocument) -> CompatReport {
    validate_svg_str(&document.to_svg_string())
}

/// Scan an SVG string for problematic elements.
pub fn validate_svg_str(svg: &str) -> CompatReport {
    let mut warnings = Vec::new();
    for element in BLOCKING_ELEMENTS {
        if contains_element(svg, element) {
            warnings.push(CompatWarning {
                severity: Severity::Blocking,
                element: element.to_string(),
                message: format!("<{element}> is not supported by strict SVG consumers"),
            });
        }
    }
    for element in ADVISORY_ELEMENTS {
        if contains_element(svg, element) {
            warnings.push(CompatWarning {
                severity: Severity::Advisory,
                element: element.to_string(),
                message: format!("<{element}> may render inconsistently across consumers"),
            });
        }
    }
    let ok = warnings.iter().all(|w| w.severity != Severity::Blocking);
    CompatReport { ok, warnings }
}

/// True when `<name>` occurs as an element tag, not as a prefix of a
/// longer tag name or inside attribute text.
fn contains_element(svg: &str, name: &str) -> bool {
    let mut rest = svg;
    while let Some(pos) = rest.find('<') {
        rest = &rest[pos + 1..];
        if let Some(after) = rest.strip_prefix(name)
            && !after.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '-')
        {
            return true;
        }
    }
    false
}
