extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

/// A provisional palette entry: a centroid color plus the fraction of image
/// mass it represents. `freq` values across active clusters sum to 1.0
/// throughout the merge loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCluster {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub freq: f32,
    pub active: bool,
}

impl ColorCluster {
    pub fn new(r: f32, g: f32, b: f32, freq: f32) -> Self {
        Self {
            r,
            g,
            b,
            freq,
            active: true,
        }
    }

    /// Fold `other` into `self`: freq-weighted centroid, summed freq.
    fn absorb(&mut self, other: &ColorCluster) {
        let mul = 1.0 / (self.freq + other.freq);
        self.r = (self.freq * self.r + other.freq * other.r) * mul;
        self.g = (self.freq * self.g + other.freq * other.g) * mul;
        self.b = (self.freq * self.b + other.freq * other.b) * mul;
        self.freq += other.freq;
    }
}

/// Ward-style pairwise merge cost: the increase in total weighted variance
/// from folding the two clusters into one.
fn merge_error(a: &ColorCluster, b: &ColorCluster) -> f32 {
    let r = a.r - b.r;
    let g = a.g - b.g;
    let b_ = a.b - b.b;

    (a.freq * b.freq / (a.freq + b.freq)) * (r * r + g * g + b_ * b_)
}

/// Lower-triangular matrix of pairwise merge costs over the initial
/// candidate count. Cells for deactivated clusters go stale and are only
/// ever overwritten, never read, because the scan checks both endpoints'
/// active flags first.
struct ErrorMatrix {
    cells: Vec<f32>,
}

impl ErrorMatrix {
    fn new(count: usize) -> Self {
        Self {
            cells: vec![0.0; count * (count + 1) / 2],
        }
    }

    /// Cell offset for the unordered pair (i, j), i < j.
    #[inline]
    fn offset(i: usize, j: usize) -> usize {
        debug_assert!(i < j);
        i + j * (j + 1) / 2
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> f32 {
        self.cells[Self::offset(i, j)]
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f32) {
        self.cells[Self::offset(i, j)] = value;
    }
}

/// Per-merge-step callbacks, injected so the core has no dependency on any
/// particular UI or input mechanism.
#[derive(Default)]
pub struct Hooks<'a> {
    progress: Option<&'a mut dyn FnMut(u32)>,
    cancel: Option<&'a dyn Fn() -> bool>,
}

impl<'a> Hooks<'a> {
    /// No observers: never cancels, reports nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Observe the remaining merge count, once per merge step.
    pub fn on_progress(mut self, f: &'a mut dyn FnMut(u32)) -> Self {
        self.progress = Some(f);
        self
    }

    /// Cooperative cancellation predicate, polled once per merge step.
    pub fn on_cancel(mut self, f: &'a dyn Fn() -> bool) -> Self {
        self.cancel = Some(f);
        self
    }

    fn report(&mut self, remaining: u32) {
        if let Some(progress) = self.progress.as_mut() {
            progress(remaining);
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.map(|f| f()).unwrap_or(false)
    }
}

/// Greedily merge `candidates` down to `target` clusters.
///
/// Each step scans the whole active region of the error matrix for the
/// globally cheapest pair (fixed scan order: outer index ascending, inner
/// index below it ascending, strict `<`, so the first minimum wins ties),
/// merges it into the lower index, and recomputes every matrix entry that
/// pairs the merged cluster with a still-active one.
///
/// Returns the surviving clusters in ascending original-index order, or
/// `None` if the cancellation hook fired. O(K²) per step is an accepted
/// tradeoff for simplicity and determinism; K is bounded by the bucketing
/// stage upstream.
pub fn cluster_candidates(
    mut candidates: Vec<ColorCluster>,
    target: usize,
    hooks: &mut Hooks<'_>,
) -> Option<Vec<ColorCluster>> {
    debug_assert!(target >= 1);

    let len = candidates.len();
    let mut count = len;
    if target >= count {
        return Some(candidates);
    }

    let mut errors = ErrorMatrix::new(len);
    for j in 0..len {
        for i in 0..j {
            errors.set(i, j, merge_error(&candidates[i], &candidates[j]));
        }
    }

    while count > target {
        if hooks.cancelled() {
            return None;
        }

        let mut lowest = f32::MAX;
        let mut ii = 0;
        let mut jj = 0;

        for j in 0..len {
            if !candidates[j].active {
                continue;
            }
            for i in 0..j {
                if candidates[i].active && errors.get(i, j) < lowest {
                    lowest = errors.get(i, j);
                    ii = i;
                    jj = j;
                }
            }
        }

        let absorbed = candidates[jj];
        candidates[ii].absorb(&absorbed);
        candidates[jj].active = false;
        count -= 1;

        // Only cluster ii changed, so only its pairings need refreshing.
        for i in 0..ii {
            if candidates[i].active {
                errors.set(i, ii, merge_error(&candidates[i], &candidates[ii]));
            }
        }
        for j in (ii + 1)..len {
            if candidates[j].active {
                errors.set(ii, j, merge_error(&candidates[ii], &candidates[j]));
            }
        }

        hooks.report((count - target) as u32);
    }

    candidates.retain(|c| c.active);
    Some(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_freq(clusters: &[ColorCluster]) -> f32 {
        clusters.iter().filter(|c| c.active).map(|c| c.freq).sum()
    }

    #[test]
    fn merge_error_matches_formula() {
        let a = ColorCluster::new(0.0, 0.0, 0.0, 0.5);
        let b = ColorCluster::new(3.0, 4.0, 0.0, 0.5);
        // (0.25 / 1.0) * 25
        assert!((merge_error(&a, &b) - 6.25).abs() < 1e-6);
    }

    #[test]
    fn target_at_or_above_count_is_identity() {
        let candidates = vec![
            ColorCluster::new(0.0, 0.0, 0.0, 0.5),
            ColorCluster::new(255.0, 255.0, 255.0, 0.5),
        ];
        let out = cluster_candidates(candidates.clone(), 2, &mut Hooks::none()).unwrap();
        assert_eq!(out, candidates);
        let out = cluster_candidates(candidates.clone(), 10, &mut Hooks::none()).unwrap();
        assert_eq!(out, candidates);
    }

    #[test]
    fn single_candidate_survives_any_target() {
        let candidates = vec![ColorCluster::new(200.0, 50.0, 10.0, 1.0)];
        let out = cluster_candidates(candidates, 8, &mut Hooks::none()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].r, 200.0);
    }

    #[test]
    fn merges_nearest_pair_into_weighted_centroid() {
        let candidates = vec![
            ColorCluster::new(0.0, 0.0, 0.0, 0.5),
            ColorCluster::new(1.0, 1.0, 1.0, 0.3),
            ColorCluster::new(250.0, 250.0, 250.0, 0.2),
        ];
        let out = cluster_candidates(candidates, 2, &mut Hooks::none()).unwrap();

        assert_eq!(out.len(), 2);
        // A and B merge; their weighted centroid is 0.3/0.8 = 0.375
        assert!((out[0].r - 0.375).abs() < 1e-6);
        assert!((out[0].g - 0.375).abs() < 1e-6);
        assert!((out[0].b - 0.375).abs() < 1e-6);
        assert!((out[0].freq - 0.8).abs() < 1e-6);
        // C untouched
        assert_eq!(out[1].r, 250.0);
        assert!((out[1].freq - 0.2).abs() < 1e-6);
    }

    #[test]
    fn mass_is_conserved_across_merges() {
        let mut candidates = Vec::new();
        for i in 0..32 {
            let v = i as f32 * 8.0;
            candidates.push(ColorCluster::new(v, 255.0 - v, v / 2.0, 1.0 / 32.0));
        }
        assert!((total_freq(&candidates) - 1.0).abs() < 1e-5);

        for target in [24, 9, 3, 1] {
            let out = cluster_candidates(candidates.clone(), target, &mut Hooks::none()).unwrap();
            assert_eq!(out.len(), target);
            assert!(
                (total_freq(&out) - 1.0).abs() < 1e-5,
                "mass drifted at target {target}: {}",
                total_freq(&out)
            );
        }
    }

    #[test]
    fn tie_breaks_on_first_pair_in_scan_order() {
        // Two pairs with identical merge cost: (0,1) and (2,3). The scan
        // runs outer j ascending, inner i ascending, strict less-than, so
        // (0,1) is found first and merged.
        let candidates = vec![
            ColorCluster::new(0.0, 0.0, 0.0, 0.25),
            ColorCluster::new(10.0, 0.0, 0.0, 0.25),
            ColorCluster::new(100.0, 0.0, 0.0, 0.25),
            ColorCluster::new(110.0, 0.0, 0.0, 0.25),
        ];
        let out = cluster_candidates(candidates, 3, &mut Hooks::none()).unwrap();
        assert_eq!(out.len(), 3);
        assert!((out[0].r - 5.0).abs() < 1e-6);
        assert_eq!(out[1].r, 100.0);
        assert_eq!(out[2].r, 110.0);
    }

    #[test]
    fn survivors_keep_ascending_original_order() {
        // C is the outlier; A and B merge, leaving index order (AB), C, D
        let candidates = vec![
            ColorCluster::new(0.0, 0.0, 0.0, 0.3),
            ColorCluster::new(2.0, 2.0, 2.0, 0.3),
            ColorCluster::new(128.0, 128.0, 128.0, 0.2),
            ColorCluster::new(255.0, 255.0, 255.0, 0.2),
        ];
        let out = cluster_candidates(candidates, 3, &mut Hooks::none()).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out[0].r < 2.0);
        assert_eq!(out[1].r, 128.0);
        assert_eq!(out[2].r, 255.0);
    }

    #[test]
    fn progress_reports_count_down_to_zero() {
        let candidates: Vec<ColorCluster> = (0..10)
            .map(|i| ColorCluster::new(i as f32 * 25.0, 0.0, 0.0, 0.1))
            .collect();

        let mut seen = Vec::new();
        let mut record = |remaining: u32| seen.push(remaining);
        let mut hooks = Hooks::none().on_progress(&mut record);
        cluster_candidates(candidates, 4, &mut hooks).unwrap();

        assert_eq!(seen, vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn cancellation_returns_none() {
        let candidates: Vec<ColorCluster> = (0..10)
            .map(|i| ColorCluster::new(i as f32 * 25.0, 0.0, 0.0, 0.1))
            .collect();

        let cancel = || true;
        let mut hooks = Hooks::none().on_cancel(&cancel);
        assert!(cluster_candidates(candidates, 4, &mut hooks).is_none());
    }

    #[test]
    fn cancellation_after_some_merges() {
        let candidates: Vec<ColorCluster> = (0..10)
            .map(|i| ColorCluster::new(i as f32 * 25.0, 0.0, 0.0, 0.1))
            .collect();

        let polls = core::cell::Cell::new(0u32);
        let cancel = || {
            polls.set(polls.get() + 1);
            polls.get() > 3
        };
        let mut hooks = Hooks::none().on_cancel(&cancel);
        assert!(cluster_candidates(candidates, 1, &mut hooks).is_none());
        assert_eq!(polls.get(), 4);
    }
}
