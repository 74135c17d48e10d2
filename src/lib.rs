#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod bucketer;
pub mod cluster;
pub mod error;
pub mod histogram;
pub mod palette;

pub use cluster::{ColorCluster, Hooks};
pub use error::QuantizeError;
pub use palette::Palette;

use alloc::vec::Vec;
use histogram::SparseColorHistogram;

/// Configuration for palette reduction.
#[derive(Debug, Clone)]
pub struct ReduceConfig {
    /// Requested palette size. Clamped to 1..=256.
    pub target_colors: u32,
    /// Edge length of the cube-bucketing sub-cubes used when the image has
    /// more distinct colors than `target_colors`. Must be a power of two in
    /// 1..=256. Larger steps bound the clustering stage more aggressively
    /// at the cost of coarser candidates.
    pub bucket_step: u32,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            target_colors: 256,
            bucket_step: 16,
        }
    }
}

impl ReduceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_colors(mut self, n: u32) -> Self {
        self.target_colors = n;
        self
    }

    pub fn bucket_step(mut self, step: u32) -> Self {
        self.bucket_step = step;
        self
    }
}

/// Outcome of a reduction run with hooks installed.
///
/// Cancellation is cooperative and not an error: the run stops at a
/// merge-step boundary and no palette is produced, so a caller holding a
/// previous palette simply keeps it.
#[derive(Debug)]
pub enum Reduction {
    Complete(Palette),
    Cancelled,
}

impl Reduction {
    pub fn into_palette(self) -> Option<Palette> {
        match self {
            Reduction::Complete(palette) => Some(palette),
            Reduction::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Reduction::Cancelled)
    }
}

/// Reduce an RGB image to a palette of at most `target_colors` entries.
///
/// Builds a sparse histogram over the exact colors of the image, bounds the
/// candidate count by cube bucketing when the image holds more distinct
/// colors than requested, then greedily merges candidates pairwise until
/// the target size is reached. If the image has at most `target_colors`
/// distinct colors the result is exact (lossless path).
pub fn reduce_to_palette(
    pixels: &[rgb::RGB<u8>],
    width: usize,
    height: usize,
    config: &ReduceConfig,
) -> Result<Palette, QuantizeError> {
    match reduce_to_palette_with(pixels, width, height, config, Hooks::none())? {
        Reduction::Complete(palette) => Ok(palette),
        // Hooks::none() never cancels
        Reduction::Cancelled => unreachable!(),
    }
}

/// Reduce an RGBA image to a palette. The alpha channel takes no part in
/// histogram construction; only RGB is quantized.
pub fn reduce_to_palette_rgba(
    pixels: &[rgb::RGBA<u8>],
    width: usize,
    height: usize,
    config: &ReduceConfig,
) -> Result<Palette, QuantizeError> {
    match reduce_to_palette_rgba_with(pixels, width, height, config, Hooks::none())? {
        Reduction::Complete(palette) => Ok(palette),
        // Hooks::none() never cancels
        Reduction::Cancelled => unreachable!(),
    }
}

/// Like [`reduce_to_palette`], with progress and cancellation hooks polled
/// once per merge step.
pub fn reduce_to_palette_with(
    pixels: &[rgb::RGB<u8>],
    width: usize,
    height: usize,
    config: &ReduceConfig,
    mut hooks: Hooks<'_>,
) -> Result<Reduction, QuantizeError> {
    validate_inputs(pixels.len(), width, height, config)?;

    let hist = accumulate(pixels.iter().map(|p| (p.r, p.g, p.b)), width * height);
    run_reduction(hist, config, &mut hooks)
}

/// Like [`reduce_to_palette_rgba`], with progress and cancellation hooks.
pub fn reduce_to_palette_rgba_with(
    pixels: &[rgb::RGBA<u8>],
    width: usize,
    height: usize,
    config: &ReduceConfig,
    mut hooks: Hooks<'_>,
) -> Result<Reduction, QuantizeError> {
    validate_inputs(pixels.len(), width, height, config)?;

    let hist = accumulate(pixels.iter().map(|p| (p.r, p.g, p.b)), width * height);
    run_reduction(hist, config, &mut hooks)
}

/// Build the frequency histogram. Each pixel contributes `1 / pixel_count`
/// so cluster frequencies are normalized fractions from the start and the
/// total mass stays at 1.0 through the merge loop.
fn accumulate(
    colors: impl Iterator<Item = (u8, u8, u8)>,
    pixel_count: usize,
) -> SparseColorHistogram {
    let inc = 1.0 / pixel_count as f32;
    let mut hist = SparseColorHistogram::new();

    for (r, g, b) in colors {
        hist.insert(r, g, b, inc);
    }

    hist
}

fn run_reduction(
    mut hist: SparseColorHistogram,
    config: &ReduceConfig,
    hooks: &mut Hooks<'_>,
) -> Result<Reduction, QuantizeError> {
    let target = config.target_colors.clamp(1, 256) as usize;

    let distinct = hist.distinct_colors();
    if distinct == 0 {
        return Err(QuantizeError::EmptyImage);
    }

    let candidates = if distinct <= target {
        // Already few enough colors: enumerate them exactly
        let mut exact = Vec::with_capacity(distinct);
        hist.for_each(|r, g, b, weight| {
            exact.push(ColorCluster::new(r as f32, g as f32, b as f32, weight));
        });
        exact
    } else {
        bucketer::limit_colors(&mut hist, config.bucket_step)
    };
    drop(hist);

    // Bucketing can collapse below the requested size
    let target = target.min(candidates.len());

    match cluster::cluster_candidates(candidates, target, hooks) {
        Some(clusters) => Ok(Reduction::Complete(Palette::from_clusters(&clusters))),
        None => Ok(Reduction::Cancelled),
    }
}

fn validate_inputs(
    pixel_count: usize,
    width: usize,
    height: usize,
    config: &ReduceConfig,
) -> Result<(), QuantizeError> {
    if width == 0 || height == 0 {
        return Err(QuantizeError::ZeroDimension);
    }
    if pixel_count != width * height {
        return Err(QuantizeError::DimensionMismatch {
            len: pixel_count,
            width,
            height,
        });
    }
    if !config.bucket_step.is_power_of_two() || config.bucket_step > 256 {
        return Err(QuantizeError::InvalidBucketStep(config.bucket_step));
    }
    Ok(())
}
