//! Bitmap preprocessing: decode, bound the resolution, and normalize
//! channels for the requested color mode.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};
use imageproc::contrast::{ThresholdType, threshold as ip_threshold};
use log::debug;

use crate::error::VectorizerResult;
use crate::options::{ColorMode, VectorizeOptions};
use crate::threshold::otsu_threshold;

/// Largest allowed dimension after preprocessing; larger inputs are scaled
/// down proportionally, never up.
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

/// Normalized sample grid produced by preprocessing.
///
/// Owns its backing storage exclusively and is immutable once built; it is
/// created and discarded within a single pipeline run.
#[derive(Debug, Clone)]
pub enum SampleGrid {
    /// Single-byte luminance samples (`bw` and `grayscale` modes; `bw`
    /// grids only contain 0 and 255).
    Gray(GrayImage),
    /// 3-byte RGB samples (`color` mode).
    Rgb(RgbImage),
}

impl SampleGrid {
    pub fn width(&self) -> u32 {
        match self {
            SampleGrid::Gray(img) => img.width(),
            SampleGrid::Rgb(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            SampleGrid::Gray(img) => img.height(),
            SampleGrid::Rgb(img) => img.height(),
        }
    }

    /// View of the grid as luminance samples.
    ///
    /// RGB grids are reduced with the standard Rec. 601 weighting; gray
    /// grids are returned as-is.
    pub fn luminance(&self) -> GrayImage {
        match self {
            SampleGrid::Gray(img) => img.clone(),
            SampleGrid::Rgb(img) => DynamicImage::ImageRgb8(img.clone()).to_luma8(),
        }
    }
}

/// Boolean foreground/background grid consumed by the contour tracer.
///
/// Foreground is the dark side of the threshold (traced shapes are dark on
/// a light background, matching the reference behavior).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BilevelGrid {
    width: u32,
    height: u32,
    foreground: Vec<bool>,
}

impl BilevelGrid {
    /// Derive a bilevel grid from luminance samples: `value <= threshold`
    /// becomes foreground.
    pub fn from_gray(gray: &GrayImage, threshold: u8) -> Self {
        let (width, height) = gray.dimensions();
        let foreground = gray.pixels().map(|px| px.0[0] <= threshold).collect();
        Self {
            width,
            height,
            foreground,
        }
    }

    /// Build a grid directly from booleans, row-major. Used by tests and
    /// synthetic inputs.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut foreground = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                foreground.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            foreground,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Foreground test with out-of-bounds coordinates reading as
    /// background, so boundary walks never need border special cases.
    pub fn is_foreground(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.foreground[(y * self.width as i64 + x) as usize]
    }

    pub fn count_foreground(&self) -> usize {
        self.foreground.iter().filter(|&&fg| fg).count()
    }
}

/// Decode and normalize an input image per the requested color mode.
///
/// Fails with [`VectorizerError::Decode`](crate::VectorizerError::Decode)
/// on unsupported or corrupt formats. When either dimension exceeds
/// `max_dimension` the image is scaled down proportionally so the larger
/// dimension equals `max_dimension`.
pub fn preprocess(
    image_bytes: &[u8],
    options: &VectorizeOptions,
    max_dimension: u32,
) -> VectorizerResult<SampleGrid> {
    let decoded = image::load_from_memory(image_bytes)?;
    let decoded = bound_dimensions(decoded, max_dimension);
    debug!(
        "preprocessed to {}x{} ({:?})",
        decoded.width(),
        decoded.height(),
        options.color_mode
    );

    let grid = match options.color_mode {
        ColorMode::Bw => {
            let gray = decoded.to_luma8();
            let threshold = options.threshold.unwrap_or_else(|| {
                let t = otsu_threshold(&gray);
                debug!("auto-derived threshold {t}");
                t
            });
            SampleGrid::Gray(binarize(&gray, threshold))
        }
        ColorMode::Grayscale => SampleGrid::Gray(decoded.to_luma8()),
        ColorMode::Color => SampleGrid::Rgb(decoded.to_rgb8()),
    };
    Ok(grid)
}

/// Scale down so the larger dimension equals `max_dimension`; identity for
/// images already within bounds.
fn bound_dimensions(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    if image.width() <= max_dimension && image.height() <= max_dimension {
        return image;
    }
    image.resize(max_dimension, max_dimension, FilterType::Lanczos3)
}

/// Two-level reduction of a grayscale image, stored as 0/255 samples for
/// downstream reuse.
pub fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    ip_threshold(gray, threshold, ThresholdType::Binary)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder, Luma};

    pub(crate) fn encode_png(gray: &GrayImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(
                gray.as_raw(),
                gray.width(),
                gray.height(),
                ExtendedColorType::L8,
            )
            .expect("in-memory png encode");
        bytes
    }

    mod preprocess {
        use super::*;
        use crate::VectorizerError;

        #[test]
        fn corrupt_bytes_fail_with_decode_error() {
            let err = preprocess(b"not an image", &VectorizeOptions::default(), 2048)
                .unwrap_err();
            assert!(matches!(err, VectorizerError::Decode(_)));
        }

        #[test]
        fn bw_mode_produces_two_level_samples() {
            let gray = GrayImage::from_fn(8, 8, |x, _| Luma([(x * 30) as u8]));
            let bytes = encode_png(&gray);
            let opts = VectorizeOptions {
                threshold: Some(100),
                ..Default::default()
            };
            let grid = preprocess(&bytes, &opts, 2048).unwrap();
            match grid {
                SampleGrid::Gray(img) => {
                    assert!(img.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
                }
                SampleGrid::Rgb(_) => panic!("bw mode must produce a gray grid"),
            }
        }

        #[test]
        fn grayscale_mode_keeps_intermediate_values() {
            let gray = GrayImage::from_fn(4, 4, |x, y| Luma([(x * 37 + y * 11) as u8]));
            let bytes = encode_png(&gray);
            let opts = VectorizeOptions {
                color_mode: ColorMode::Grayscale,
                ..Default::default()
            };
            let grid = preprocess(&bytes, &opts, 2048).unwrap();
            match grid {
                SampleGrid::Gray(img) => {
                    assert!(img.pixels().any(|p| p.0[0] != 0 && p.0[0] != 255));
                }
                SampleGrid::Rgb(_) => panic!("grayscale mode must produce a gray grid"),
            }
        }

        #[test]
        fn color_mode_produces_rgb_grid() {
            let gray = GrayImage::from_pixel(4, 4, Luma([90]));
            let bytes = encode_png(&gray);
            let opts = VectorizeOptions {
                color_mode: ColorMode::Color,
                ..Default::default()
            };
            let grid = preprocess(&bytes, &opts, 2048).unwrap();
            assert!(matches!(grid, SampleGrid::Rgb(_)));
        }

        #[test]
        fn oversized_input_is_scaled_down_proportionally() {
            let gray = GrayImage::from_pixel(64, 16, Luma([0]));
            let bytes = encode_png(&gray);
            let grid = preprocess(&bytes, &VectorizeOptions::default(), 32).unwrap();
            assert_eq!(grid.width(), 32);
            assert_eq!(grid.height(), 8);
        }

        #[test]
        fn small_input_is_never_upscaled() {
            let gray = GrayImage::from_pixel(10, 6, Luma([0]));
            let bytes = encode_png(&gray);
            let grid = preprocess(&bytes, &VectorizeOptions::default(), 2048).unwrap();
            assert_eq!((grid.width(), grid.height()), (10, 6));
        }
    }

    mod bilevel {
        use super::*;

        #[test]
        fn dark_side_is_foreground() {
            let mut gray = GrayImage::from_pixel(2, 1, Luma([255]));
            gray.put_pixel(0, 0, Luma([10]));
            let grid = BilevelGrid::from_gray(&gray, 128);
            assert!(grid.is_foreground(0, 0));
            assert!(!grid.is_foreground(1, 0));
        }

        #[test]
        fn exact_threshold_value_is_foreground() {
            let gray = GrayImage::from_pixel(1, 1, Luma([128]));
            let grid = BilevelGrid::from_gray(&gray, 128);
            assert!(grid.is_foreground(0, 0));
        }

        #[test]
        fn out_of_bounds_reads_as_background() {
            let grid = BilevelGrid::from_fn(2, 2, |_, _| true);
            assert!(!grid.is_foreground(-1, 0));
            assert!(!grid.is_foreground(0, -1));
            assert!(!grid.is_foreground(2, 0));
            assert!(!grid.is_foreground(0, 2));
        }

        #[test]
        fn count_foreground_matches_fill() {
            let grid = BilevelGrid::from_fn(4, 4, |x, y| x == y);
            assert_eq!(grid.count_foreground(), 4);
        }
    }

    mod luminance {
        use super::*;
        use image::Rgb;

        #[test]
        fn rgb_grid_reduces_to_gray() {
            let rgb = RgbImage::from_pixel(3, 3, Rgb([255, 0, 0]));
            let grid = SampleGrid::Rgb(rgb);
            let gray = grid.luminance();
            assert_eq!(gray.dimensions(), (3, 3));
            // Red reduces to a mid-dark luminance, not 0 or 255.
            let v = gray.get_pixel(1, 1).0[0];
            assert!(v > 0 && v < 255);
        }
    }
}
