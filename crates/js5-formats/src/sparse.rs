//! Sparse id maps
//!
//! Reference tables list files and archive members by ascending id with
//! gaps. [`SparseMap`] keeps the present ids in a sorted vector alongside a
//! parallel vector of values, giving binary-search lookup, in-order
//! iteration and cheap "how many ids precede this one" queries.

/// Map from ascending `u32` ids to values, stored densely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseMap<T> {
    ids: Vec<u32>,
    values: Vec<T>,
}

impl<T> Default for SparseMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseMap<T> {
    /// Create an empty map
    pub const fn new() -> Self {
        Self {
            ids: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Create an empty map with room for `n` entries
    pub fn with_capacity(n: usize) -> Self {
        Self {
            ids: Vec::with_capacity(n),
            values: Vec::with_capacity(n),
        }
    }

    /// Number of present entries
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no entries are present
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Highest present id plus one, or zero when empty
    pub fn capacity(&self) -> u32 {
        self.ids.last().map_or(0, |&id| id + 1)
    }

    /// Highest present id
    pub fn last_id(&self) -> Option<u32> {
        self.ids.last().copied()
    }

    /// Whether `id` is present
    pub fn contains(&self, id: u32) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Look up the value for `id`
    pub fn get(&self, id: u32) -> Option<&T> {
        let index = self.ids.binary_search(&id).ok()?;
        self.values.get(index)
    }

    /// Look up the value for `id` mutably
    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        let index = self.ids.binary_search(&id).ok()?;
        self.values.get_mut(index)
    }

    /// Insert `value` at `id`, returning the value it replaced
    pub fn insert(&mut self, id: u32, value: T) -> Option<T> {
        match self.ids.binary_search(&id) {
            Ok(index) => Some(std::mem::replace(&mut self.values[index], value)),
            Err(index) => {
                self.ids.insert(index, id);
                self.values.insert(index, value);
                None
            }
        }
    }

    /// Get the value at `id`, inserting `f()` first when absent
    pub fn get_or_insert_with(&mut self, id: u32, f: impl FnOnce() -> T) -> &mut T {
        let index = match self.ids.binary_search(&id) {
            Ok(index) => index,
            Err(index) => {
                self.ids.insert(index, id);
                self.values.insert(index, f());
                index
            }
        };
        &mut self.values[index]
    }

    /// Remove and return the value at `id`
    pub fn remove(&mut self, id: u32) -> Option<T> {
        let index = self.ids.binary_search(&id).ok()?;
        self.ids.remove(index);
        Some(self.values.remove(index))
    }

    /// Number of present ids strictly below `id`.
    ///
    /// For a present id this is its position in the dense value vector.
    pub fn rank(&self, id: u32) -> usize {
        self.ids.partition_point(|&present| present < id)
    }

    /// Present ids in ascending order
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Values in id order
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterate `(id, value)` pairs in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.ids.iter().copied().zip(self.values.iter())
    }

    /// Iterate `(id, value)` pairs mutably in ascending id order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.ids.iter().copied().zip(self.values.iter_mut())
    }
}

impl<T> FromIterator<(u32, T)> for SparseMap<T> {
    fn from_iter<I: IntoIterator<Item = (u32, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (id, value) in iter {
            map.insert(id, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_ids_sorted() {
        let mut map = SparseMap::new();
        map.insert(7, "c");
        map.insert(2, "a");
        map.insert(5, "b");

        assert_eq!(map.ids(), &[2, 5, 7]);
        assert_eq!(map.values(), &["a", "b", "c"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.capacity(), 8);
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut map = SparseMap::new();
        assert_eq!(map.insert(1, 10), None);
        assert_eq!(map.insert(1, 20), Some(10));
        assert_eq!(map.get(1), Some(&20));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_empty_capacity() {
        let map: SparseMap<()> = SparseMap::default();
        assert_eq!(map.capacity(), 0);
        assert!(map.is_empty());
        assert_eq!(map.last_id(), None);
    }

    #[test]
    fn test_rank_counts_preceding_ids() {
        let map: SparseMap<()> = [(0, ()), (2, ()), (5, ())].into_iter().collect();
        assert_eq!(map.rank(0), 0);
        assert_eq!(map.rank(2), 1);
        assert_eq!(map.rank(3), 2);
        assert_eq!(map.rank(5), 2);
        assert_eq!(map.rank(100), 3);
    }

    #[test]
    fn test_remove_and_get_or_insert() {
        let mut map = SparseMap::new();
        *map.get_or_insert_with(4, || 1) += 1;
        *map.get_or_insert_with(4, || 100) += 1;
        assert_eq!(map.get(4), Some(&3));

        assert_eq!(map.remove(4), Some(3));
        assert_eq!(map.remove(4), None);
        assert!(!map.contains(4));
    }

    #[test]
    fn test_iter_mut() {
        let mut map: SparseMap<u32> = [(1, 1), (3, 3)].into_iter().collect();
        for (id, value) in map.iter_mut() {
            *value += id;
        }
        let pairs: Vec<_> = map.iter().map(|(id, v)| (id, *v)).collect();
        assert_eq!(pairs, vec![(1, 2), (3, 6)]);
    }
}
