//! # skipmap
//!
//! A deterministic ordered map backed by a hash-leveled skip list.
//!
//! Node heights are derived from a hash of the key instead of a random
//! number generator, so the same key set always produces the same level
//! structure, run after run and instance after instance.
//!
//! ## Example
//!
//! ```rust
//! use skipmap::SkipMap;
//!
//! let mut map: SkipMap<u64> = SkipMap::new();
//! map.put("hello", 1);
//! map.put("world", 2);
//!
//! assert_eq!(map.get("hello"), Some(&1));
//! assert_eq!(map.get("world"), Some(&2));
//! assert_eq!(map.floor("worst"), Some("world"));
//! ```

// =============================================================================
// Height derivation
// =============================================================================

/// FNV-1a hash of the key bytes.
#[inline]
fn fnv1a(key: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &byte in key.as_bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Height of the node storing `key`: the trailing zero bits of its hash.
///
/// Each extra level is half as likely as the one below, the same shape as
/// a fair-coin skip list, but the same key always lands at the same
/// height.
#[inline]
fn node_height(key: &str) -> usize {
    fnv1a(key).trailing_zeros() as usize
}

// =============================================================================
// Node arena
// =============================================================================

/// One stored key/value pair.
///
/// `forward[i]` is the arena index of the next node at level `i`, or
/// `None` at the end of that level's chain. The vector has `height + 1`
/// entries, so a node participates in exactly the levels `0..=height`.
#[derive(Clone)]
struct Node<V> {
    key: String,
    value: V,
    forward: Vec<Option<usize>>,
}

/// Traversal position: the sentinel head or a node in the arena.
///
/// Keeping the head out of the arena means a search can never surface the
/// sentinel as a result.
#[derive(Clone, Copy)]
enum Pos {
    Head,
    Node(usize),
}

// =============================================================================
// SkipMap
// =============================================================================

/// A deterministic ordered map using a hash-leveled skip list.
///
/// Features:
/// - Arena-based node storage addressed by index, no pointers
/// - Deterministic node heights from an FNV-1a hash of the key
/// - Exact lookup, floor (predecessor-or-equal) queries, and in-order
///   iteration over the level-0 chain
/// - A per-level successor accessor for inspecting the structure's shape
#[derive(Clone)]
pub struct SkipMap<V> {
    /// Node arena: nodes are pushed at insert and never removed or moved.
    nodes: Vec<Node<V>>,
    /// The sentinel head's forward array, one entry per level. Grows when
    /// a taller node arrives; entries already set are preserved.
    head: Vec<Option<usize>>,
    /// Number of `put` calls made, overwrites included.
    puts: usize,
}

impl<V> SkipMap<V> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            head: vec![None],
            puts: 0,
        }
    }

    /// Number of `put` calls made so far.
    ///
    /// This counts calls, not distinct keys: overwriting an existing key
    /// still increments it.
    #[inline]
    pub fn size(&self) -> usize {
        self.puts
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    fn forward(&self, pos: Pos, level: usize) -> Option<usize> {
        match pos {
            Pos::Head => self.head[level],
            Pos::Node(i) => self.nodes[i].forward[level],
        }
    }

    #[inline]
    fn set_forward(&mut self, pos: Pos, level: usize, to: Option<usize>) {
        match pos {
            Pos::Head => self.head[level] = to,
            Pos::Node(i) => self.nodes[i].forward[level] = to,
        }
    }

    /// Insert `key` with `value`, overwriting the value in place if the
    /// key is already present.
    pub fn put(&mut self, key: &str, value: V) {
        self.puts += 1;

        let height = node_height(key);
        if height + 1 > self.head.len() {
            // The head must span the tallest node. resize appends None
            // entries and keeps the ones already set.
            self.head.resize(height + 1, None);
        }

        let idx = self.nodes.len();
        self.nodes.push(Node {
            key: key.to_owned(),
            value,
            forward: vec![None; height + 1],
        });

        let mut pos = Pos::Head;
        let mut level = self.head.len() - 1;
        loop {
            match self.forward(pos, level) {
                // Next key still below the new one: stay on this level.
                Some(next) if self.nodes[next].key.as_str() < key => {
                    pos = Pos::Node(next);
                }
                Some(next) if self.nodes[next].key == key => {
                    // Existing key: overwrite in place and discard the
                    // candidate. Equal keys hash to equal heights, so no
                    // splice can have happened before this point and the
                    // candidate is still unlinked.
                    debug_assert!(self.nodes[idx].forward.iter().all(Option::is_none));
                    let candidate = self.nodes.pop().expect("candidate just pushed");
                    self.nodes[next].value = candidate.value;
                    return;
                }
                // Next is absent or past the new key: splice here if the
                // new node is tall enough, then drop a level.
                _ => {
                    if height >= level {
                        self.nodes[idx].forward[level] = self.forward(pos, level);
                        self.set_forward(pos, level, Some(idx));
                    }
                    if level == 0 {
                        return;
                    }
                    level -= 1;
                }
            }
        }
    }

    /// Arena index of the node with the greatest key `<= key`, if any.
    fn floor_node(&self, key: &str) -> Option<usize> {
        let mut pos = Pos::Head;
        let mut level = self.head.len() - 1;
        loop {
            match self.forward(pos, level) {
                Some(next) if self.nodes[next].key == key => return Some(next),
                Some(next) if self.nodes[next].key.as_str() < key => {
                    pos = Pos::Node(next);
                }
                // Next is absent or past the query: the answer is at a
                // lower level, or is the position we already hold.
                _ => {
                    if level == 0 {
                        return match pos {
                            Pos::Head => None,
                            Pos::Node(i) => Some(i),
                        };
                    }
                    level -= 1;
                }
            }
        }
    }

    /// Value stored under exactly `key`, or `None`.
    pub fn get(&self, key: &str) -> Option<&V> {
        let idx = self.floor_node(key)?;
        let node = &self.nodes[idx];
        (node.key == key).then_some(&node.value)
    }

    /// Greatest stored key `<= key`, or `None` if `key` precedes every
    /// stored key.
    pub fn floor(&self, key: &str) -> Option<&str> {
        self.floor_node(key).map(|i| self.nodes[i].key.as_str())
    }

    /// The key stored immediately after `key`'s floor node at `level`.
    ///
    /// Reports `None` when there is no floor node, when the floor node
    /// does not reach `level`, or when it has no successor there. Purely
    /// diagnostic: useful for inspecting (or asserting on) the level
    /// structure, never mutates.
    pub fn level_successor(&self, key: &str, level: usize) -> Option<&str> {
        let idx = self.floor_node(key)?;
        let next = (*self.nodes[idx].forward.get(level)?)?;
        Some(self.nodes[next].key.as_str())
    }

    /// In-order iteration over all entries, by walking the level-0 chain.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            map: self,
            next: self.head[0],
        }
    }
}

impl<V> Default for SkipMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for SkipMap<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

pub struct Iter<'a, V> {
    map: &'a SkipMap<V>,
    next: Option<usize>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let node = &self.map.nodes[idx];
        self.next = node.forward[0];
        Some((node.key.as_str(), &node.value))
    }
}
