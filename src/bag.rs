//! A multiset for expressing poll results

use std::collections::HashMap;
use std::hash::Hash;

/// A multiset of values.
///
/// The outcome of a network poll is a `Bag` of [Id](crate::zfx_id::Id)s with
/// one entry per sampled peer, so the same value may appear with a
/// multiplicity of up to `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bag<T: Eq + Hash + Clone> {
    counts: HashMap<T, usize>,
    size: usize,
}

impl<T: Eq + Hash + Clone> Default for Bag<T> {
    fn default() -> Self {
        Bag { counts: HashMap::new(), size: 0 }
    }
}

impl<T: Eq + Hash + Clone> Bag<T> {
    pub fn new() -> Self {
        Bag::default()
    }

    /// Fetches the total number of entries, counting multiplicity.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Adds a single entry to the bag.
    pub fn add(&mut self, t: T) {
        self.add_count(t, 1);
    }

    /// Adds an entry to the bag `count` times.
    pub fn add_count(&mut self, t: T, count: usize) {
        if count == 0 {
            return;
        }
        *self.counts.entry(t).or_insert(0) += count;
        self.size += count;
    }

    /// Fetches the multiplicity of `t`.
    pub fn count(&self, t: &T) -> usize {
        self.counts.get(t).copied().unwrap_or(0)
    }

    /// Returns the entries satisfying `pred`, multiplicities preserved.
    pub fn filter<P>(&self, pred: P) -> Bag<T>
    where
        P: Fn(&T) -> bool,
    {
        let mut filtered = Bag::new();
        for (t, &count) in self.counts.iter() {
            if pred(t) {
                filtered.add_count(t.clone(), count);
            }
        }
        filtered
    }

    /// Partitions the entries by `pred`: `[0]` holds those for which it is
    /// false, `[1]` those for which it is true.
    pub fn split<P>(&self, pred: P) -> [Bag<T>; 2]
    where
        P: Fn(&T) -> bool,
    {
        let mut split = [Bag::new(), Bag::new()];
        for (t, &count) in self.counts.iter() {
            let side = if pred(t) { 1 } else { 0 };
            split[side].add_count(t.clone(), count);
        }
        split
    }

    /// Iterates over the distinct entries and their multiplicities.
    pub fn iter(&self) -> impl Iterator<Item = (&T, usize)> {
        self.counts.iter().map(|(t, &count)| (t, count))
    }
}
