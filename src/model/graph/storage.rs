//! Storage primitives for the graph: a dense id-keyed map and a hybrid edge
//! set that avoids allocating for the common low-degree nodes.

use hashbrown::HashSet;

use super::edge::Edge;

/// Map keyed by small, mostly contiguous `usize` ids, backed by a vector of
/// slots. Lookup, insertion and removal are O(1).
#[derive(Debug, Clone)]
pub(crate) struct DenseMap<T> {
    slots: Vec<Option<T>>,
    len: usize,
}

impl<T> Default for DenseMap<T> {
    fn default() -> Self {
        Self { slots: Vec::new(), len: 0 }
    }
}

impl<T> DenseMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: usize, value: T) -> Option<T> {
        if key >= self.slots.len() {
            self.slots.resize_with(key + 1, || None);
        }
        let previous = self.slots[key].replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    pub fn remove(&mut self, key: usize) -> Option<T> {
        let removed = self.slots.get_mut(key)?.take();
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    pub fn get(&self, key: usize) -> Option<&T> {
        self.slots.get(key)?.as_ref()
    }

    pub fn get_mut(&mut self, key: usize) -> Option<&mut T> {
        self.slots.get_mut(key)?.as_mut()
    }

    pub fn get_or_insert_with(&mut self, key: usize, default: impl FnOnce() -> T) -> &mut T {
        if key >= self.slots.len() {
            self.slots.resize_with(key + 1, || None);
        }
        let slot = &mut self.slots[key];
        if slot.is_none() {
            self.len += 1;
        }
        slot.get_or_insert_with(default)
    }

    pub fn contains_key(&self, key: usize) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(key, slot)| slot.as_ref().map(|value| (key, value)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(key, slot)| slot.as_mut().map(|value| (key, value)))
    }

    pub fn keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }
}

/// Edge container for one node. Most road nodes have degree one or two, so a
/// single edge is stored inline and only higher degrees spill into a hash
/// set. Duplicate edges (by [`Edge`] equality) are rejected.
#[derive(Debug, Clone, Default)]
pub(crate) enum EdgeSet {
    #[default]
    Empty,
    One(Box<Edge>),
    Many(HashSet<Edge>),
}

impl EdgeSet {
    pub fn insert(&mut self, edge: Edge) -> bool {
        match self {
            Self::Empty => {
                *self = Self::One(Box::new(edge));
                true
            }
            Self::One(existing) => {
                if **existing == edge {
                    return false;
                }
                let mut set = HashSet::with_capacity(2);
                let first = std::mem::replace(self, Self::Empty);
                if let Self::One(first) = first {
                    set.insert(*first);
                }
                set.insert(edge);
                *self = Self::Many(set);
                true
            }
            Self::Many(set) => set.insert(edge),
        }
    }

    pub fn remove(&mut self, edge: &Edge) -> bool {
        match self {
            Self::Empty => false,
            Self::One(existing) => {
                if **existing == *edge {
                    *self = Self::Empty;
                    true
                } else {
                    false
                }
            }
            Self::Many(set) => set.remove(edge),
        }
    }

    pub fn contains(&self, edge: &Edge) -> bool {
        match self {
            Self::Empty => false,
            Self::One(existing) => **existing == *edge,
            Self::Many(set) => set.contains(edge),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::Many(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> EdgeSetIter<'_> {
        match self {
            Self::Empty => EdgeSetIter::Empty,
            Self::One(edge) => EdgeSetIter::One(std::iter::once(edge.as_ref())),
            Self::Many(set) => EdgeSetIter::Many(set.iter()),
        }
    }
}

impl IntoIterator for EdgeSet {
    type Item = Edge;
    type IntoIter = std::vec::IntoIter<Edge>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            Self::Empty => Vec::new().into_iter(),
            Self::One(edge) => vec![*edge].into_iter(),
            Self::Many(set) => set.into_iter().collect::<Vec<_>>().into_iter(),
        }
    }
}

pub(crate) enum EdgeSetIter<'a> {
    Empty,
    One(std::iter::Once<&'a Edge>),
    Many(hashbrown::hash_set::Iter<'a, Edge>),
}

impl<'a> Iterator for EdgeSetIter<'a> {
    type Item = &'a Edge;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Empty => None,
            Self::One(iter) => iter.next(),
            Self::Many(iter) => iter.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_map_insert_and_remove() {
        let mut map = DenseMap::new();
        assert_eq!(map.insert(3, "a"), None);
        assert_eq!(map.insert(3, "b"), Some("a"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(3), Some(&"b"));
        assert_eq!(map.remove(3), Some("b"));
        assert!(map.is_empty());
        assert_eq!(map.remove(7), None);
    }

    #[test]
    fn edge_set_spills_and_rejects_duplicates() {
        let a = Edge::link(0, 1);
        let b = Edge::link(0, 2);
        let mut set = EdgeSet::default();
        assert!(set.insert(a.clone()));
        assert!(!set.insert(a.clone()));
        assert_eq!(set.len(), 1);
        assert!(set.insert(b.clone()));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a) && set.contains(&b));
        assert!(set.remove(&a));
        assert!(!set.remove(&a));
        assert_eq!(set.len(), 1);
    }
}
