use serde::{Deserialize, Serialize};

use crate::error::{VectorizerError, VectorizerResult};

/// Color handling mode for the conversion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Binarize at a threshold and trace the two-level result.
    #[default]
    Bw,
    /// Convert to grayscale before tracing.
    Grayscale,
    /// Keep full color samples.
    ///
    /// Known limitation carried over from the reference behavior: tracing
    /// still runs on a grayscale reduction rather than per-color layers.
    Color,
}

/// User-tunable knobs for a single vectorization run.
///
/// `detail_level` and `smoothness` are percentages in `[0, 100]`.
/// A `threshold` of `None` derives one from the image histogram via
/// Otsu's method. `max_colors` is accepted for [`ColorMode::Color`] but
/// currently has no effect on traced output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VectorizeOptions {
    pub color_mode: ColorMode,
    /// 0 = least detail, 100 = most; controls the minimum feature size.
    pub detail_level: u8,
    /// 0 = sharp corners, 100 = very smooth; controls corner
    /// classification and curve fit tolerance.
    pub smoothness: u8,
    /// Black/white separation threshold, `None` = auto (Otsu).
    pub threshold: Option<u8>,
    /// Palette bound for color mode, 2-32. Currently inert.
    pub max_colors: u8,
}

impl Default for VectorizeOptions {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Bw,
            detail_level: 70,
            smoothness: 50,
            threshold: None,
            max_colors: 16,
        }
    }
}

impl VectorizeOptions {
    /// Check every knob against its accepted range.
    ///
    /// Runs before any pipeline stage; a failure here means no decoding or
    /// tracing work has been done.
    pub fn validate(&self) -> VectorizerResult<()> {
        if self.detail_level > 100 {
            return Err(VectorizerError::InvalidOptions(format!(
                "detail level must be between 0 and 100, got {}",
                self.detail_level
            )));
        }
        if self.smoothness > 100 {
            return Err(VectorizerError::InvalidOptions(format!(
                "smoothness must be between 0 and 100, got {}",
                self.smoothness
            )));
        }
        if !(2..=32).contains(&self.max_colors) {
            return Err(VectorizerError::InvalidOptions(format!(
                "max colors must be between 2 and 32, got {}",
                self.max_colors
            )));
        }
        Ok(())
    }

    /// Descriptive color count reported in result metadata.
    ///
    /// 0 means "unbounded/full color"; this is not an enforced
    /// quantization limit.
    pub fn color_count(&self) -> u32 {
        match self.color_mode {
            ColorMode::Bw => 2,
            ColorMode::Grayscale => 256,
            ColorMode::Color => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod validate {
        use super::*;

        #[test]
        fn defaults_are_valid() {
            assert!(VectorizeOptions::default().validate().is_ok());
        }

        #[test]
        fn detail_level_above_range_rejected() {
            let opts = VectorizeOptions {
                detail_level: 150,
                ..Default::default()
            };
            let err = opts.validate().unwrap_err();
            assert!(matches!(err, VectorizerError::InvalidOptions(_)));
            assert!(err.to_string().contains("detail level"));
        }

        #[test]
        fn smoothness_above_range_rejected() {
            let opts = VectorizeOptions {
                smoothness: 101,
                ..Default::default()
            };
            assert!(matches!(
                opts.validate(),
                Err(VectorizerError::InvalidOptions(_))
            ));
        }

        #[test]
        fn max_colors_bounds() {
            let low = VectorizeOptions {
                max_colors: 1,
                ..Default::default()
            };
            assert!(low.validate().is_err());

            let high = VectorizeOptions {
                max_colors: 33,
                ..Default::default()
            };
            assert!(high.validate().is_err());

            for valid in [2, 16, 32] {
                let opts = VectorizeOptions {
                    max_colors: valid,
                    ..Default::default()
                };
                assert!(opts.validate().is_ok());
            }
        }

        #[test]
        fn boundary_values_accepted() {
            let opts = VectorizeOptions {
                detail_level: 0,
                smoothness: 100,
                threshold: Some(255),
                ..Default::default()
            };
            assert!(opts.validate().is_ok());
        }
    }

    mod color_count {
        use super::*;

        #[test]
        fn per_mode_values() {
            let mut opts = VectorizeOptions::default();
            assert_eq!(opts.color_count(), 2);
            opts.color_mode = ColorMode::Grayscale;
            assert_eq!(opts.color_count(), 256);
            opts.color_mode = ColorMode::Color;
            assert_eq!(opts.color_count(), 0);
        }
    }

    mod serde_roundtrip {
        use super::*;

        #[test]
        fn camel_case_field_names() {
            let opts = VectorizeOptions::default();
            let json = serde_json::to_string(&opts).unwrap();
            assert!(json.contains("\"colorMode\":\"bw\""));
            assert!(json.contains("\"detailLevel\":70"));
            assert!(json.contains("\"maxColors\":16"));
        }

        #[test]
        fn missing_fields_take_defaults() {
            let opts: VectorizeOptions =
                serde_json::from_str("{\"colorMode\":\"grayscale\"}").unwrap();
            assert_eq!(opts.color_mode, ColorMode::Grayscale);
            assert_eq!(opts.detail_level, 70);
            assert_eq!(opts.smoothness, 50);
            assert_eq!(opts.threshold, None);
        }
    }
}
