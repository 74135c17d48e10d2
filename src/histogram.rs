extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

/// Arena slot 0 holds the root, so 0 doubles as the "no child" marker.
const NO_CHILD: u32 = 0;

#[derive(Debug, Clone, Copy)]
struct Node {
    children: [u32; 8],
    /// Accumulated weight. Meaningful at depth 8 only; interior nodes stay 0.
    weight: f32,
}

impl Node {
    const EMPTY: Node = Node {
        children: [NO_CHILD; 8],
        weight: 0.0,
    };
}

/// Sparse histogram over the 24-bit RGB cube.
///
/// An 8-level tree with branching factor 8: at level `i` (7 down to 0, MSB
/// first) the child slot packs bit `i` of R into bit 0, G into bit 1 and B
/// into bit 2, so a full descent addresses one exact 8-bit-per-channel color.
/// Lookup and insert are O(8) regardless of how many colors are stored —
/// a dense 16M-entry array would be wasteful for typical images.
///
/// Nodes live in a bump-allocated arena addressed by `u32` index and are
/// freed in bulk when the histogram is dropped. Paths are created lazily on
/// first insert and never removed.
#[derive(Debug)]
pub struct SparseColorHistogram {
    nodes: Vec<Node>,
    distinct: usize,
}

impl Default for SparseColorHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseColorHistogram {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::EMPTY],
            distinct: 0,
        }
    }

    #[inline]
    fn slot(r: u8, g: u8, b: u8, level: u32) -> usize {
        (((r >> level) & 1) | (((g >> level) & 1) << 1) | (((b >> level) & 1) << 2)) as usize
    }

    /// Add `weight` to the leaf at (r, g, b), creating path nodes as needed.
    pub fn insert(&mut self, r: u8, g: u8, b: u8, weight: f32) {
        let mut node = 0usize;
        for level in (0..8).rev() {
            let slot = Self::slot(r, g, b, level);
            let child = self.nodes[node].children[slot];
            node = if child == NO_CHILD {
                let next = self.nodes.len() as u32;
                self.nodes.push(Node::EMPTY);
                self.nodes[node].children[slot] = next;
                next as usize
            } else {
                child as usize
            };
        }

        if self.nodes[node].weight == 0.0 && weight > 0.0 {
            self.distinct += 1;
        }
        self.nodes[node].weight += weight;
    }

    fn find_leaf(&self, r: u8, g: u8, b: u8) -> Option<usize> {
        let mut node = 0usize;
        for level in (0..8).rev() {
            let child = self.nodes[node].children[Self::slot(r, g, b, level)];
            if child == NO_CHILD {
                return None;
            }
            node = child as usize;
        }
        Some(node)
    }

    /// Accumulated weight at (r, g, b); 0.0 for colors never inserted.
    pub fn read(&self, r: u8, g: u8, b: u8) -> f32 {
        match self.find_leaf(r, g, b) {
            Some(leaf) => self.nodes[leaf].weight,
            None => 0.0,
        }
    }

    /// Return the weight at (r, g, b) and reset that leaf to zero.
    ///
    /// Used by the cube bucketer so each occupied color contributes to
    /// exactly one bucket centroid.
    pub fn drain(&mut self, r: u8, g: u8, b: u8) -> f32 {
        match self.find_leaf(r, g, b) {
            Some(leaf) => {
                let weight = self.nodes[leaf].weight;
                if weight > 0.0 {
                    self.distinct -= 1;
                }
                self.nodes[leaf].weight = 0.0;
                weight
            }
            None => 0.0,
        }
    }

    /// Number of leaves currently holding positive weight.
    pub fn distinct_colors(&self) -> usize {
        self.distinct
    }

    /// True if no occupied leaf exists inside the axis-aligned sub-cube of
    /// edge `step` at origin (r0, g0, b0).
    ///
    /// `step` must be a power of two and the origin `step`-aligned, so the
    /// sub-cube corresponds to a single subtree: a descent over the top
    /// `8 - log2(step)` levels decides occupancy without touching leaves.
    /// Drained leaves may still report occupancy; callers only use this to
    /// skip sweeps that would accumulate nothing either way.
    pub fn cube_is_empty(&self, r0: u8, g0: u8, b0: u8, step: u32) -> bool {
        debug_assert!(step.is_power_of_two() && step <= 256);
        let levels = 8 - step.trailing_zeros();

        let mut node = 0usize;
        for level in ((8 - levels)..8).rev() {
            let child = self.nodes[node].children[Self::slot(r0, g0, b0, level)];
            if child == NO_CHILD {
                return true;
            }
            node = child as usize;
        }
        false
    }

    /// Visit every occupied leaf as (r, g, b, weight), in a fixed order
    /// (child slots ascending at each level). Used for exact enumeration
    /// when the image has few distinct colors.
    pub fn for_each<F: FnMut(u8, u8, u8, f32)>(&self, mut f: F) {
        self.visit(0, 0, 0, 0, 0, &mut f);
    }

    fn visit<F: FnMut(u8, u8, u8, f32)>(
        &self,
        node: usize,
        depth: u32,
        r: u8,
        g: u8,
        b: u8,
        f: &mut F,
    ) {
        if depth == 8 {
            let weight = self.nodes[node].weight;
            if weight > 0.0 {
                f(r, g, b, weight);
            }
            return;
        }

        let level = 7 - depth;
        for slot in 0..8u8 {
            let child = self.nodes[node].children[slot as usize];
            if child != NO_CHILD {
                self.visit(
                    child as usize,
                    depth + 1,
                    r | ((slot & 1) << level),
                    g | (((slot >> 1) & 1) << level),
                    b | (((slot >> 2) & 1) << level),
                    f,
                );
            }
        }
    }
}
