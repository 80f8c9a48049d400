//! Threshold selection via Otsu's method.
//!
//! Used as the automatic fallback when no explicit black/white threshold is
//! supplied, and exposed directly so callers can suggest one to a user.

use image::GrayImage;

/// Neutral mid-range fallback when no valid threshold exists.
const FALLBACK_THRESHOLD: u8 = 128;

/// Build a 256-bin histogram of luminance samples.
pub fn histogram(gray: &GrayImage) -> [u64; 256] {
    let mut bins = [0u64; 256];
    for px in gray.pixels() {
        bins[px.0[0] as usize] += 1;
    }
    bins
}

/// Select the threshold that maximizes between-class variance.
///
/// For every candidate `t`, samples split into a class `[0, t]` and a class
/// `(t, 255]`; the winner maximizes `w_lo * w_hi * (mean_lo - mean_hi)^2`.
/// A well-separated bimodal histogram produces a flat run of maximal
/// candidates between the two modes; the midpoint of that run is returned
/// so the split lands between the modes instead of hugging the lower one.
/// Degenerate inputs (empty image, single sample value) yield a neutral
/// 128 rather than an error: this is an advisory heuristic, never a hard
/// failure path.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    otsu_from_histogram(&histogram(gray))
}

/// The histogram-level core of [`otsu_threshold`].
pub fn otsu_from_histogram(bins: &[u64; 256]) -> u8 {
    let total: u64 = bins.iter().sum();
    if total == 0 {
        return FALLBACK_THRESHOLD;
    }
    let sum_all: f64 = bins
        .iter()
        .enumerate()
        .map(|(v, &count)| v as f64 * count as f64)
        .sum();

    let mut weight_lo = 0u64;
    let mut sum_lo = 0.0f64;
    let mut best_variance = 0.0f64;
    // First and last candidate attaining the best variance.
    let mut best: Option<(u8, u8)> = None;

    for t in 0..=255u16 {
        let count = bins[t as usize];
        weight_lo += count;
        if weight_lo == 0 {
            continue;
        }
        let weight_hi = total - weight_lo;
        if weight_hi == 0 {
            break;
        }
        sum_lo += t as f64 * count as f64;

        let mean_lo = sum_lo / weight_lo as f64;
        let mean_hi = (sum_all - sum_lo) / weight_hi as f64;
        let diff = mean_lo - mean_hi;
        let variance = weight_lo as f64 * weight_hi as f64 * diff * diff;

        if variance > best_variance {
            best_variance = variance;
            best = Some((t as u8, t as u8));
        } else if variance == best_variance
            && let Some((_, high)) = &mut best
        {
            *high = t as u8;
        }
    }

    match best {
        Some((low, high)) => ((low as u16 + high as u16) / 2) as u8,
        None => FALLBACK_THRESHOLD,
    }
}
