use std::{cmp::Ordering, collections::HashSet};

use anyhow::{bail, ensure};
use parking_lot::RwLock;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    level::{random_height, MAX_LEVEL},
    options::Options,
    score::ScoredKey,
};


type NodeId = usize;

// The sentinel always occupies the first arena slot.
const HEAD: NodeId = 0;

#[derive(Debug, Default)]
struct Node {
    key: Vec<u8>,
    value: Vec<u8>,
    score: u64,
    // forward[i] is the next node on level i; its length is the node's height.
    forward: Vec<Option<NodeId>>,
}

impl Node {
    fn new(key: Vec<u8>, value: Vec<u8>, height: usize) -> Self {
        let score = crate::score::key_score(&key);
        Node {
            key,
            value,
            score,
            forward: vec![None; height],
        }
    }

    fn head() -> Self {
        Node {
            forward: vec![None; MAX_LEVEL],
            ..Node::default()
        }
    }

    fn height(&self) -> usize {
        self.forward.len()
    }

    fn scored(&self) -> ScoredKey<'_> {
        ScoredKey::with_score(self.score, &self.key)
    }
}

/// Node storage addressed by stable ids. Links between nodes are ids rather
/// than references, so any number of predecessors can point at a node without
/// owning it. Freed slots are recycled by later inserts.
#[derive(Debug)]
struct Arena {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
}

impl Arena {
    fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity + 1);
        nodes.push(Node::head());
        Arena {
            nodes,
            free: Vec::new(),
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    fn next(&self, id: NodeId, level: usize) -> Option<NodeId> {
        self.nodes[id].forward[level]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        // Drop the key and value now; the slot itself waits for reuse.
        self.nodes[id] = Node::default();
        self.free.push(id);
    }

    fn is_live(&self, id: NodeId) -> bool {
        id != HEAD && id < self.nodes.len() && !self.nodes[id].forward.is_empty()
    }
}

#[derive(Debug)]
struct Inner<R> {
    arena: Arena,
    rng: R,
    len: usize,
}

impl<R> Inner<R>
where
    R: Rng,
{
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> bool {
        // The candidate's height is drawn up front whether or not it ends up
        // being linked.
        let height = random_height(&mut self.rng);
        let target = ScoredKey::new(&key);

        let mut preds = [HEAD; MAX_LEVEL];
        let mut pred = HEAD;
        for level in (0..MAX_LEVEL).rev() {
            while let Some(next) = self.arena.next(pred, level) {
                match self.arena.node(next).scored().cmp(&target) {
                    Ordering::Less => pred = next,
                    Ordering::Equal => {
                        trace!(key_len = key.len(), "overwrote entry");
                        self.arena.node_mut(next).value = value;
                        return true;
                    }
                    Ordering::Greater => break,
                }
            }
            preds[level] = pred;
        }

        trace!(key_len = key.len(), height, "inserted entry");
        let id = self.arena.alloc(Node::new(key, value, height));
        for (level, &pred) in preds.iter().enumerate().take(height) {
            let next = self.arena.next(pred, level);
            self.arena.node_mut(id).forward[level] = next;
            self.arena.node_mut(pred).forward[level] = Some(id);
        }
        self.len += 1;
        false
    }
}

impl<R> Inner<R> {
    fn find(&self, key: &[u8]) -> Option<NodeId> {
        let target = ScoredKey::new(key);
        let mut pred = HEAD;
        for level in (0..MAX_LEVEL).rev() {
            while let Some(next) = self.arena.next(pred, level) {
                match self.arena.node(next).scored().cmp(&target) {
                    Ordering::Less => pred = next,
                    Ordering::Equal => return Some(next),
                    Ordering::Greater => break,
                }
            }
        }
        None
    }

    fn delete(&mut self, key: &[u8]) -> bool {
        let target = ScoredKey::new(key);

        // Only levels the node actually sits on get a predecessor recorded.
        let mut preds: [Option<NodeId>; MAX_LEVEL] = [None; MAX_LEVEL];
        let mut found = None;
        let mut pred = HEAD;
        for level in (0..MAX_LEVEL).rev() {
            while let Some(next) = self.arena.next(pred, level) {
                match self.arena.node(next).scored().cmp(&target) {
                    Ordering::Less => pred = next,
                    Ordering::Equal => {
                        preds[level] = Some(pred);
                        found = Some(next);
                        break;
                    }
                    Ordering::Greater => break,
                }
            }
        }

        let Some(victim) = found else {
            return false;
        };

        let forward = std::mem::take(&mut self.arena.node_mut(victim).forward);
        for (level, pred) in preds.iter().enumerate() {
            if let Some(pred) = *pred {
                self.arena.node_mut(pred).forward[level] = forward[level];
            }
        }
        trace!(key_len = key.len(), height = forward.len(), "removed entry");
        self.arena.release(victim);
        self.len -= 1;
        true
    }

    fn stats(&self) -> IndexStats {
        let mut heights = [0; MAX_LEVEL];
        let mut cur = self.arena.next(HEAD, 0);
        while let Some(id) = cur {
            let node = self.arena.node(id);
            heights[node.height() - 1] += 1;
            cur = node.forward[0];
        }
        IndexStats {
            len: self.len,
            heights,
        }
    }

    fn check_invariants(&self) -> anyhow::Result<()> {
        let mut below: Option<HashSet<NodeId>> = None;
        for level in 0..MAX_LEVEL {
            let mut seen = HashSet::new();
            let mut prev: Option<NodeId> = None;
            let mut cur = self.arena.next(HEAD, level);
            while let Some(id) = cur {
                ensure!(
                    self.arena.is_live(id),
                    "level {} links to dead slot {}",
                    level,
                    id
                );
                let node = self.arena.node(id);
                ensure!(
                    node.height() > level,
                    "node {:?} of height {} linked on level {}",
                    node.key,
                    node.height(),
                    level
                );
                if let Some(prev) = prev {
                    let prev = self.arena.node(prev);
                    if prev.scored() >= node.scored() {
                        bail!(
                            "level {} out of order: {:?} before {:?}",
                            level,
                            prev.key,
                            node.key
                        );
                    }
                }
                if let Some(below) = &below {
                    ensure!(
                        below.contains(&id),
                        "node {:?} on level {} is missing from level {}",
                        node.key,
                        level,
                        level - 1
                    );
                }
                ensure!(seen.insert(id), "cycle on level {}", level);
                prev = Some(id);
                cur = node.forward[level];
            }
            if level == 0 {
                ensure!(
                    seen.len() == self.len,
                    "level 0 holds {} nodes but len is {}",
                    seen.len(),
                    self.len
                );
            }
            below = Some(seen);
        }
        Ok(())
    }

    #[cfg(test)]
    fn level_keys(&self, level: usize) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        let mut cur = self.arena.next(HEAD, level);
        while let Some(id) = cur {
            out.push(self.arena.node(id).key.clone());
            cur = self.arena.next(id, level);
        }
        out
    }
}

/// A point-in-time summary of the index shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub len: usize,
    /// `heights[i]` counts the nodes of height `i + 1`.
    pub heights: [usize; MAX_LEVEL],
}

/// An ordered map from byte-string keys to byte-string values, backed by a
/// skip list.
///
/// Every operation takes one lock over the whole structure: lookups share it
/// and mutations hold it exclusively, so any operation observes the index in
/// a single consistent state. Keys are ordered by a score built from their
/// first 8 bytes, with ties broken by comparing the full keys, which yields
/// plain lexicographic byte order.
///
/// `R` is the source of coin flips used to pick node heights.
#[derive(Debug)]
pub struct OrderedIndex<R = StdRng> {
    inner: RwLock<Inner<R>>,
}

impl OrderedIndex<StdRng> {
    pub fn new() -> Self {
        Self::with_options(&Options::default())
    }

    pub fn with_options(options: &Options) -> Self {
        debug!(?options, "creating ordered index");
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::build(rng, options.capacity)
    }
}

impl Default for OrderedIndex<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> OrderedIndex<R>
where
    R: Rng,
{
    pub fn with_rng(rng: R) -> Self {
        Self::build(rng, 0)
    }

    fn build(rng: R, capacity: usize) -> Self {
        OrderedIndex {
            inner: RwLock::new(Inner {
                arena: Arena::with_capacity(capacity),
                rng,
                len: 0,
            }),
        }
    }

    /// Inserts `key` or overwrites its value. Returns whether the key was
    /// already present.
    pub fn set<K, V>(&self, key: K, value: V) -> bool
    where
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        let (key, value) = (key.into(), value.into());
        self.inner.write().set(key, value)
    }

    /// Returns a copy of the value stored under `key`, if any.
    pub fn get<K>(&self, key: K) -> Option<Vec<u8>>
    where
        K: AsRef<[u8]>,
    {
        let inner = self.inner.read();
        let id = inner.find(key.as_ref())?;
        Some(inner.arena.node(id).value.clone())
    }

    pub fn contains_key<K>(&self, key: K) -> bool
    where
        K: AsRef<[u8]>,
    {
        self.inner.read().find(key.as_ref()).is_some()
    }

    /// Removes `key` if present. Returns whether anything was removed; a
    /// missing key leaves the index untouched.
    pub fn delete<K>(&self, key: K) -> bool
    where
        K: AsRef<[u8]>,
    {
        self.inner.write().delete(key.as_ref())
    }

    pub fn len(&self) -> usize {
        self.inner.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> IndexStats {
        self.inner.read().stats()
    }

    /// Walks every level and verifies ordering, that each node on a level
    /// also sits on the level below it, and that the bottom level accounts
    /// for every entry.
    pub fn check_invariants(&self) -> anyhow::Result<()> {
        self.inner.read().check_invariants()
    }

    #[cfg(test)]
    fn level_keys(&self, level: usize) -> Vec<Vec<u8>> {
        self.inner.read().level_keys(level)
    }
}
