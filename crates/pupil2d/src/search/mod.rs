//! Segment-merge search.
//!
//! Explores unions of contour segments depth first, starting from the seed
//! segments. A union that fits one ellipse is recorded and extended by every
//! later segment; a union that fails is remembered, and every path containing
//! a remembered failure is skipped without fitting.
//!
//! Segment indices are remapped so that seeds come first (ascending), then
//! the remaining segments (ascending). Paths are strictly increasing in the
//! remapped space, so every subset is generated at most once. Because
//! children of a path are only pushed after the path passed, and a failing
//! path is evaluated before any of its extensions are popped, no recorded
//! solution ever contains a failing path.

mod path;

use imageproc::point::Point;

use crate::conic::{fit_ellipse_pixels, fit_variance};
use crate::detector::SearchConfig;

pub use path::SegmentSet;

/// Merge-quality test over a set of segments.
pub trait MergeTest {
    /// `segments` are real segment indices in path order (seeds first).
    fn passes(&mut self, segments: &[usize]) -> bool;
}

impl<F: FnMut(&[usize]) -> bool> MergeTest for F {
    fn passes(&mut self, segments: &[usize]) -> bool {
        self(segments)
    }
}

/// Accepts a union when the ellipse fitted to its concatenated points has a
/// mean squared distance of at most `threshold`.
pub struct FitVarianceTest<'a> {
    segments: &'a [Vec<Point<i32>>],
    threshold: f64,
    scratch: Vec<Point<i32>>,
}

impl<'a> FitVarianceTest<'a> {
    pub fn new(segments: &'a [Vec<Point<i32>>], threshold: f64) -> Self {
        Self {
            segments,
            threshold,
            scratch: Vec::new(),
        }
    }
}

impl MergeTest for FitVarianceTest<'_> {
    fn passes(&mut self, segments: &[usize]) -> bool {
        self.scratch.clear();
        for &i in segments {
            self.scratch.extend_from_slice(&self.segments[i]);
        }
        match fit_ellipse_pixels(&self.scratch) {
            Some(e) => fit_variance(&e, &self.scratch) <= self.threshold,
            None => false,
        }
    }
}

/// Counters of one search run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SearchStats {
    /// Paths taken from the frontier.
    pub popped: usize,
    /// Paths handed to the merge test.
    pub evaluated: usize,
    /// Paths skipped because they contain a failing path.
    pub pruned: usize,
    /// Paths dropped for exceeding the depth limit.
    pub too_deep: usize,
    /// Passing paths recorded.
    pub solutions: usize,
    /// Solutions left after the maximality filter.
    pub maximal: usize,
    /// The evaluation cap stopped the search with work left.
    pub cap_reached: bool,
}

/// Maximal passing segment sets (real indices) plus counters.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub solutions: Vec<SegmentSet>,
    pub stats: SearchStats,
}

/// Keep only sets that are not contained in another set of the list.
/// Order is preserved.
pub fn maximal_sets(sets: Vec<SegmentSet>) -> Vec<SegmentSet> {
    let keep: Vec<bool> = sets
        .iter()
        .enumerate()
        .map(|(i, s)| {
            !sets
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && s.is_subset_of(other))
        })
        .collect();
    sets.into_iter()
        .zip(keep)
        .filter_map(|(s, k)| k.then_some(s))
        .collect()
}

/// Run the merge search over `n_segments` segments starting from `seeds`.
///
/// Seeds are deduplicated; out-of-range seeds are ignored. At most
/// `config.max_evaluations` paths are popped.
pub fn merge_search<T: MergeTest + ?Sized>(
    n_segments: usize,
    seeds: &[usize],
    config: &SearchConfig,
    test: &mut T,
) -> SearchOutcome {
    let mut seed_list: Vec<usize> = seeds.iter().copied().filter(|&s| s < n_segments).collect();
    seed_list.sort_unstable();
    seed_list.dedup();

    let mut mapping = seed_list.clone();
    mapping.extend((0..n_segments).filter(|i| seed_list.binary_search(i).is_err()));

    let mut frontier: Vec<SegmentSet> = (0..seed_list.len()).map(SegmentSet::singleton).collect();
    let mut failing: Vec<SegmentSet> = Vec::new();
    let mut solutions: Vec<SegmentSet> = Vec::new();
    let mut stats = SearchStats::default();
    let mut real: Vec<usize> = Vec::with_capacity(config.max_depth + 1);

    while stats.popped < config.max_evaluations {
        let Some(path) = frontier.pop() else {
            break;
        };
        stats.popped += 1;

        if path.len() > config.max_depth {
            stats.too_deep += 1;
            continue;
        }
        if failing.iter().any(|bad| bad.is_subset_of(&path)) {
            stats.pruned += 1;
            continue;
        }

        real.clear();
        real.extend(path.iter().map(|j| mapping[j]));
        stats.evaluated += 1;
        if test.passes(&real) {
            solutions.push(SegmentSet::from_indices(real.iter().copied()));
            let next = path.max().map_or(0, |m| m + 1);
            for l in next..mapping.len() {
                frontier.push(path.extended(l));
            }
        } else {
            failing.push(path);
        }
    }
    stats.cap_reached = !frontier.is_empty();
    stats.solutions = solutions.len();

    let solutions = maximal_sets(solutions);
    stats.maximal = solutions.len();

    tracing::debug!(
        seeds = seed_list.len(),
        segments = n_segments,
        popped = stats.popped,
        evaluated = stats.evaluated,
        pruned = stats.pruned,
        solutions = stats.solutions,
        maximal = stats.maximal,
        cap_reached = stats.cap_reached,
        "merge search done"
    );

    SearchOutcome { solutions, stats }
}
