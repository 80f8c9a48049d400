pub mod document;
pub mod error;
pub mod fit;
pub mod geom;
pub mod optimize;
pub mod options;
pub mod preprocess;
pub mod threshold;
pub mod trace;
pub mod validate;

pub use document::VectorDocument;
pub use error::{VectorizerError, VectorizerResult};
pub use fit::{FitParams, FittedPath, PathSegment};
pub use options::{ColorMode, VectorizeOptions};
pub use validate::{CompatReport, CompatWarning, Severity};

use std::time::Instant;

use log::{debug, info};
use serde::Serialize;

use crate::preprocess::{BilevelGrid, DEFAULT_MAX_DIMENSION, preprocess};
use crate::threshold::otsu_threshold;

/// Entry point for configuring and running vectorization.
#[derive(Debug, Clone)]
pub struct Vectorizer {
    /// Inputs larger than this in either dimension are scaled down.
    max_dimension: u32,
    /// Output optimization aggressiveness (0-100).
    optimize_level: u8,
}

impl Default for Vectorizer {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            optimize_level: optimize::DEFAULT_LEVEL,
        }
    }
}

impl Vectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum dimension inputs are bounded to before tracing.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Set the optimization aggressiveness (0-100, clamped).
    pub fn with_optimize_level(mut self, level: u8) -> Self {
        self.optimize_level = level.min(100);
        self
    }

    /// Run the full pipeline on an encoded raster image.
    ///
    /// Options are validated before any decoding work happens.
    pub fn vectorize(
        &self,
        image_bytes: &[u8],
        options: &VectorizeOptions,
    ) -> VectorizerResult<VectorizationResult> {
        options.validate()?;
        let started = Instant::now();

        let grid = preprocess(image_bytes, options, self.max_dimension)?;
        let gray = grid.luminance();
        let threshold = match options.color_mode {
            // bw grids are already two-level, any mid split works.
            ColorMode::Bw => 128,
            ColorMode::Grayscale | ColorMode::Color => options
                .threshold
                .unwrap_or_else(|| otsu_threshold(&gray)),
        };
        let bilevel = BilevelGrid::from_gray(&gray, threshold);
        debug!(
            "binarized at {threshold}: {} foreground px",
            bilevel.count_foreground()
        );

        let contours = trace::trace(&bilevel)?;
        let params = FitParams::from_knobs(options.detail_level, options.smoothness);
        let paths = fit::fit_contours(&contours, &params);
        let document = document::assemble(grid.width(), grid.height(), paths);
        let document = optimize::optimize(&document, self.optimize_level);

        let svg = document.to_svg_string();
        let compatibility = validate::validate_svg_str(&svg);

        let metadata = VectorizationMetadata {
            original_size: image_bytes.len(),
            output_size: svg.len(),
            path_count: document.path_count(),
            color_count: options.color_count(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "vectorized {} bytes into {} paths ({} bytes of SVG) in {} ms",
            metadata.original_size,
            metadata.path_count,
            metadata.output_size,
            metadata.processing_time_ms
        );
        Ok(VectorizationResult {
            svg,
            document,
            metadata,
            compatibility,
        })
    }
}

/// Run the pipeline with default sizing and optimization settings.
pub fn vectorize(
    image_bytes: &[u8],
    options: &VectorizeOptions,
) -> VectorizerResult<VectorizationResult> {
    Vectorizer::new().vectorize(image_bytes, options)
}

/// Everything produced by one pipeline run.
#[derive(Debug, Clone)]
pub struct VectorizationResult {
    /// Serialized, optimized SVG.
    pub svg: String,
    /// The in-memory document the SVG was rendered from.
    pub document: VectorDocument,
    pub metadata: VectorizationMetadata,
    pub compatibility: CompatReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorizationMetadata {
    /// Encoded input size in bytes.
    pub original_size: usize,
    /// Serialized SVG size in bytes.
    pub output_size: usize,
    pub path_count: usize,
    /// Distinct levels the chosen color mode can represent (0 = unbounded).
    pub color_count: u32,
    pub processing_time_ms: u64,
}
