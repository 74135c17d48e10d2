extern crate alloc;
use alloc::vec::Vec;

use crate::cluster::ColorCluster;

/// An ordered palette of at most 256 RGB entries, written once when
/// clustering completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<rgb::RGB<u8>>,
}

impl Palette {
    /// Build from surviving clusters, preserving their order. Centroid
    /// channels are truncated to integers.
    pub(crate) fn from_clusters(clusters: &[ColorCluster]) -> Self {
        Self {
            entries: clusters
                .iter()
                .map(|c| rgb::RGB {
                    r: c.r as u8,
                    g: c.g as u8,
                    b: c.b as u8,
                })
                .collect(),
        }
    }

    /// Palette entries, in emission order.
    pub fn entries(&self) -> &[rgb::RGB<u8>] {
        &self.entries
    }

    /// Number of palette entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the palette is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry nearest to (r, g, b) by squared Euclidean
    /// distance, brute force; the first of equally-near entries wins.
    /// `None` only for an empty palette.
    pub fn nearest(&self, r: u8, g: u8, b: u8) -> Option<u8> {
        let mut best: Option<u8> = None;
        let mut best_dist = i32::MAX;

        for (index, entry) in self.entries.iter().enumerate() {
            let dr = entry.r as i32 - r as i32;
            let dg = entry.g as i32 - g as i32;
            let db = entry.b as i32 - b as i32;
            let dist = dr * dr + dg * dg + db * db;

            if dist < best_dist {
                best_dist = dist;
                best = Some(index as u8);
            }
        }

        best
    }
}
