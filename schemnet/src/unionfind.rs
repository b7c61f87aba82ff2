//! Disjoint-set structure over arbitrary hashable keys.
//!
//! Built fresh for each extraction and passed explicitly between the net
//! builder's phases. Keys register lazily on first `find`; `classes` returns
//! the partition in key registration order so downstream output is
//! deterministic.

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct UnionFind<K: Copy + Eq + Hash> {
    parent: HashMap<K, K>,
    order: Vec<K>,
}

impl<K: Copy + Eq + Hash> UnionFind<K> {
    pub fn new() -> Self {
        Self {
            parent: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Root of `key`, registering it as a singleton if unseen.
    /// Uses path halving along the walk.
    pub fn find(&mut self, key: K) -> K {
        if !self.parent.contains_key(&key) {
            self.parent.insert(key, key);
            self.order.push(key);
            return key;
        }
        let mut current = key;
        loop {
            let parent = self.parent[&current];
            if parent == current {
                return current;
            }
            let grandparent = self.parent[&parent];
            self.parent.insert(current, grandparent);
            current = grandparent;
        }
    }

    pub fn union(&mut self, a: K, b: K) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent.insert(ra, rb);
        }
    }

    /// The current partition: root -> members, both in registration order.
    pub fn classes(&mut self) -> IndexMap<K, Vec<K>> {
        let keys = self.order.clone();
        let mut classes: IndexMap<K, Vec<K>> = IndexMap::new();
        for key in keys {
            let root = self.find(key);
            classes.entry(root).or_default().push(key);
        }
        classes
    }
}
