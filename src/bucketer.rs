extern crate alloc;
use alloc::vec::Vec;

use crate::cluster::ColorCluster;
use crate::histogram::SparseColorHistogram;

/// Reduce a histogram to at most `(256/step)³` candidate clusters by
/// averaging fixed-size sections of the color cube.
///
/// Partitions the 256³ cube into non-overlapping `step³` sub-cubes and
/// emits one cluster per sub-cube with positive mass, centered on the
/// weighted average of the colors it drained. Sub-cubes are visited in a
/// fixed nested order (blue outer, green middle, red inner) so the
/// candidate list — and therefore downstream tie-breaking — is
/// reproducible. Reads are destructive: every occupied leaf contributes to
/// exactly one centroid, and the histogram is empty afterwards.
///
/// Bounding the candidate count here is what keeps the O(K²)-per-step
/// clustering stage feasible on images with millions of distinct colors.
pub fn limit_colors(histogram: &mut SparseColorHistogram, step: u32) -> Vec<ColorCluster> {
    let step = step as usize;
    let mut clusters = Vec::new();

    for b in (0..=256 - step).step_by(step) {
        for g in (0..=256 - step).step_by(step) {
            for r in (0..=256 - step).step_by(step) {
                if histogram.cube_is_empty(r as u8, g as u8, b as u8, step as u32) {
                    continue;
                }

                let mut rr = 0.0f32;
                let mut gg = 0.0f32;
                let mut bb = 0.0f32;
                let mut div = 0.0f32;

                for k in 0..step {
                    let bk = b + k;
                    for j in 0..step {
                        let gj = g + j;
                        for i in 0..step {
                            let ri = r + i;
                            let d = histogram.drain(ri as u8, gj as u8, bk as u8);

                            rr += d * ri as f32;
                            gg += d * gj as f32;
                            bb += d * bk as f32;
                            div += d;
                        }
                    }
                }

                if div > 0.0 {
                    clusters.push(ColorCluster::new(rr / div, gg / div, bb / div, div));
                }
            }
        }
    }

    clusters
}
