use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An immutable, strictly increasing array of indices.
///
/// Clones share the same allocation, so symmetry copies of a unit carry no per-element storage of
/// their own.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SortedSet(Arc<[usize]>);

impl SortedSet {
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Wraps indices the caller guarantees to be strictly increasing.
    pub fn from_sorted(indices: Vec<usize>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        Self(Arc::from(indices))
    }

    /// Sorts and deduplicates arbitrary input.
    pub fn from_unsorted(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self(Arc::from(indices))
    }

    /// The half-open interval `start..end`.
    pub fn from_range(start: usize, end: usize) -> Self {
        Self(Arc::from((start..end).collect::<Vec<_>>()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<usize> {
        self.0.get(i).copied()
    }

    pub fn first(&self) -> Option<usize> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Position of `value` in the set.
    pub fn index_of(&self, value: usize) -> Option<usize> {
        self.0.binary_search(&value).ok()
    }

    pub fn contains(&self, value: usize) -> bool {
        self.index_of(value).is_some()
    }

    /// Whether both sets share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn are_equal(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }

    pub fn is_subset_of(&self, other: &Self) -> bool {
        is_subset(&self.0, &other.0)
    }

    pub fn intersect(&self, other: &Self) -> Self {
        Self(Arc::from(intersect(&self.0, &other.0)))
    }

    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        Self(Arc::from(union(&self.0, &other.0)))
    }

    pub fn subtract(&self, other: &Self) -> Self {
        Self(Arc::from(subtract(&self.0, &other.0)))
    }

    pub fn are_intersecting(&self, other: &Self) -> bool {
        are_intersecting(&self.0, &other.0)
    }

    /// FNV-1a style hash of the contents, stable across runs.
    pub fn hash_code(&self) -> u64 {
        hash_indices(&self.0)
    }
}

impl fmt::Debug for SortedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl Hash for SortedSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<Vec<usize>> for SortedSet {
    fn from(value: Vec<usize>) -> Self {
        Self::from_unsorted(value)
    }
}

impl std::ops::Index<usize> for SortedSet {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

pub fn hash_indices(values: &[usize]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET ^ values.len() as u64;
    for &v in values {
        hash ^= v as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Combines two hash values in an order-dependent way.
pub fn hash_combine(seed: u64, value: u64) -> u64 {
    seed ^ (value
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2))
}

pub fn intersect(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

pub fn union(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

pub fn subtract(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len());
    let mut j = 0;
    for &v in a {
        while j < b.len() && b[j] < v {
            j += 1;
        }
        if j >= b.len() || b[j] != v {
            out.push(v);
        }
    }
    out
}

pub fn is_subset(a: &[usize], b: &[usize]) -> bool {
    if a.len() > b.len() {
        return false;
    }
    let mut j = 0;
    for &v in a {
        while j < b.len() && b[j] < v {
            j += 1;
        }
        if j >= b.len() || b[j] != v {
            return false;
        }
        j += 1;
    }
    true
}

pub fn are_intersecting(a: &[usize], b: &[usize]) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => return true,
        }
    }
    false
}
