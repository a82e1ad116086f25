/// Small sorted set of segment indices.
///
/// Paths are only ever grown by appending an index larger than the current
/// maximum, so the backing vector stays strictly increasing and each subset
/// is generated at most once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(transparent)]
pub struct SegmentSet(Vec<u32>);

impl SegmentSet {
    pub fn singleton(i: usize) -> Self {
        Self(vec![i as u32])
    }

    /// Build from arbitrary indices (sorted and deduplicated).
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut v: Vec<u32> = indices.into_iter().map(|i| i as u32).collect();
        v.sort_unstable();
        v.dedup();
        Self(v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn max(&self) -> Option<usize> {
        self.0.last().map(|&i| i as usize)
    }

    pub fn contains(&self, i: usize) -> bool {
        self.0.binary_search(&(i as u32)).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|&i| i as usize)
    }

    /// Copy of `self` with `i` appended; `i` must exceed the current maximum.
    pub fn extended(&self, i: usize) -> Self {
        debug_assert!(self.max().map_or(true, |m| i > m));
        let mut v = Vec::with_capacity(self.0.len() + 1);
        v.extend_from_slice(&self.0);
        v.push(i as u32);
        Self(v)
    }

    /// Whether every element of `self` is in `other` (linear merge walk).
    pub fn is_subset_of(&self, other: &SegmentSet) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        let mut it = other.0.iter();
        'outer: for &x in &self.0 {
            for &y in it.by_ref() {
                if y == x {
                    continue 'outer;
                }
                if y > x {
                    return false;
                }
            }
            return false;
        }
        true
    }
}
