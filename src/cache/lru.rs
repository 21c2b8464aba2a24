//! LRU Tracker Module
//!
//! Implements Least Recently Used ordering for cache eviction.

// == Constants ==
/// Link value marking the absence of a neighbour.
const NIL: usize = usize::MAX;

/// Position of a key inside the tracker's arena.
///
/// Handed out by [`LruTracker::push_front`] and valid until the key is
/// removed or evicted.
pub type NodeIndex = usize;

#[derive(Debug)]
struct Node<K> {
    /// `None` while the slot sits on the free list
    key: Option<K>,
    prev: usize,
    next: usize,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys live in an arena of nodes linked into an intrusive doubly-linked list:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Touch, insert, remove and evict are O(1). Freed slots are recycled, so the
/// arena never grows beyond the peak number of tracked keys.
#[derive(Debug)]
pub struct LruTracker<K> {
    nodes: Vec<Node<K>>,
    head: usize,
    tail: usize,
    free_head: usize,
    len: usize,
}

impl<K> Default for LruTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> LruTracker<K> {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a tracker with room for `capacity` keys before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            free_head: NIL,
            len: 0,
        }
    }

    // == Push Front ==
    /// Starts tracking a new key as the most recently used one.
    pub fn push_front(&mut self, key: K) -> NodeIndex {
        let idx = if self.free_head != NIL {
            let idx = self.free_head;
            self.free_head = self.nodes[idx].next;
            self.nodes[idx] = Node {
                key: Some(key),
                prev: NIL,
                next: NIL,
            };
            idx
        } else {
            self.nodes.push(Node {
                key: Some(key),
                prev: NIL,
                next: NIL,
            });
            self.nodes.len() - 1
        };

        self.link_front(idx);
        self.len += 1;
        idx
    }

    // == Touch ==
    /// Marks a tracked key as recently used (moves to front).
    pub fn touch(&mut self, idx: NodeIndex) {
        if self.head == idx || !self.is_live(idx) {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    // == Remove ==
    /// Stops tracking the key at `idx` and returns it.
    ///
    /// Returns None if the slot is not currently in use.
    pub fn remove(&mut self, idx: NodeIndex) -> Option<K> {
        if !self.is_live(idx) {
            return None;
        }
        self.unlink(idx);
        self.release(idx)
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        if self.tail == NIL {
            return None;
        }
        self.remove(self.tail)
    }

    // == Peek ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.key_at(self.tail)
    }

    /// Returns the most recently used key.
    pub fn peek_newest(&self) -> Option<&K> {
        self.key_at(self.head)
    }

    // == Iteration ==
    /// Iterates tracked keys from least to most recently used.
    pub fn iter_oldest_first(&self) -> OldestFirst<'_, K> {
        OldestFirst {
            nodes: &self.nodes,
            current: self.tail,
            remaining: self.len,
        }
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    /// Forgets every tracked key and releases the arena slots.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = NIL;
        self.tail = NIL;
        self.free_head = NIL;
        self.len = 0;
    }

    // == Internal List Operations ==
    fn is_live(&self, idx: usize) -> bool {
        self.nodes.get(idx).is_some_and(|node| node.key.is_some())
    }

    fn key_at(&self, idx: usize) -> Option<&K> {
        self.nodes.get(idx).and_then(|node| node.key.as_ref())
    }

    fn link_front(&mut self, idx: usize) {
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = self.head;

        if self.head != NIL {
            self.nodes[self.head].prev = idx;
        }
        self.head = idx;

        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn unlink(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;

        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    /// Moves an unlinked slot onto the free list.
    fn release(&mut self, idx: usize) -> Option<K> {
        let key = self.nodes[idx].key.take();
        self.nodes[idx].next = self.free_head;
        self.free_head = idx;
        self.len -= 1;
        key
    }
}

// == Oldest-First Iterator ==
/// Iterator over tracked keys, least recently used first.
pub struct OldestFirst<'a, K> {
    nodes: &'a [Node<K>],
    current: usize,
    remaining: usize,
}

impl<'a, K> Iterator for OldestFirst<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == NIL || self.remaining == 0 {
            return None;
        }
        let node = &self.nodes[self.current];
        self.current = node.prev;
        self.remaining -= 1;
        node.key.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
