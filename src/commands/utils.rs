use std::path::{Path, PathBuf};

use vectorizer::{CompatReport, Severity, Vectorizer};

use crate::cli::{GlobalOptions, TraceOptionsArgs};

/// The convenience function to build a Vectorizer with the input global and
/// trace options.
pub fn build_vectorizer(global: &GlobalOptions, args: &TraceOptionsArgs) -> Vectorizer {
    Vectorizer::new()
        .with_max_dimension(global.max_dimension)
        .with_optimize_level(args.optimize)
}

/// Derive an SVG file path by changing the extension to "svg".
pub fn derive_svg_path(input: &Path) -> PathBuf {
    let mut path = input.to_path_buf();
    path.set_extension("svg");
    path
}

/// Print warnings as one line each, prefixed with the severity.
pub fn print_warnings(report: &CompatReport) {
    for warning in &report.warnings {
        let label = match warning.severity {
            Severity::Blocking => "blocking",
            Severity::Advisory => "advisory",
        };
        eprintln!("Warning ({label}): {}", warning.message);
    }
}
