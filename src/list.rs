//! Rank-indexed skip list.
//!
//! A probabilistic ordered index over (score, member) pairs. Every node
//! keeps, per level, the number of level-0 steps its forward link jumps over
//! (the *span*, counting the target node); summing spans along a search path
//! yields a node's 1-based rank, so positional queries run in O(log n)
//! expected time without a full scan.
//!
//! # Structure
//!
//! ```text
//! Level 2: HEAD ----------(span 3)----------> C ---------------> null
//! Level 1: HEAD -(span 1)-> A ---(span 2)---> C -(span 1)-> D -> null
//! Level 0: HEAD -> A(10) -> B(15) -> C(20) -> D(25) -> null
//! ```
//!
//! Nodes live in a `Vec` arena with a free list; forward and backward links
//! are `u32` indices into it, `u32::MAX` marking null. The backward link is a
//! positional reference, not an ownership relation, so the arena sidesteps
//! any cyclic-ownership question. Heights are drawn geometrically with
//! continuation probability 1/4, capped at [`MAX_LEVEL`]; past ~4^32 entries
//! the cap slightly degrades the expected bounds rather than failing.

use std::fmt;

use rand_core::OsRng;
use rand_core::RngCore;
use smallvec::SmallVec;

use crate::entry::Entry;
use crate::error::InsertError;

/// Maximum tower height. 32 levels at P = 1/4 covers ~4^32 entries.
pub const MAX_LEVEL: usize = 32;

/// Node index type. u32 saves space vs usize on 64-bit.
type Idx = u32;

/// Null index marker.
const NULL: Idx = Idx::MAX;

/// One level of a node's tower: a forward link and the number of level-0
/// steps it covers, counting the target node. A span toward null counts the
/// steps to the position one past the tail.
#[derive(Clone, Copy)]
struct Level {
    forward: Idx,
    span: u64,
}

const EMPTY_LEVEL: Level = Level {
    forward: NULL,
    span: 0,
};

/// A node owning one entry and a tower of 1..=MAX_LEVEL levels. Height is
/// drawn at creation and never changes. Expected height is 4/3, so almost
/// every tower stays inline in the SmallVec.
struct Node {
    entry: Entry,
    /// Level-0 predecessor; NULL for the first real node and the head.
    backward: Idx,
    levels: SmallVec<[Level; 4]>,
}

impl Node {
    fn new(entry: Entry, height: usize) -> Node {
        Node {
            entry,
            backward: NULL,
            levels: smallvec::smallvec![EMPTY_LEVEL; height],
        }
    }

    fn height(&self) -> usize {
        self.levels.len()
    }
}

/// An ordered set of (score, member) pairs with O(log n) expected insert,
/// remove, and rank queries.
///
/// Single-threaded: mutation takes `&mut self` and every operation runs to
/// completion. Callers needing shared access wrap the whole list in one
/// exclusive lock or shard across independent lists.
pub struct RankedSkipList {
    /// Arena of nodes; slot 0 is the head sentinel.
    nodes: Vec<Node>,
    head: Idx,
    /// Last real node in level-0 order, NULL when empty.
    tail: Idx,
    /// Tallest level currently in use (1..=MAX_LEVEL).
    level: usize,
    /// Count of real nodes.
    len: u64,
    /// Slots of removed nodes, reused before growing the arena.
    free_list: Vec<Idx>,
    /// Xorshift state for height generation.
    rand_state: u64,
}

impl RankedSkipList {
    pub fn new() -> RankedSkipList {
        let head = Node::new(Entry::new(0.0, String::new()), MAX_LEVEL);
        let mut seed = OsRng.next_u64();
        if seed == 0 {
            // Xorshift must not start at zero.
            seed = 0x9e37_79b9_7f4a_7c15;
        }
        RankedSkipList {
            nodes: vec![head],
            head: 0,
            tail: NULL,
            level: 1,
            len: 0,
            free_list: Vec::new(),
            rand_state: seed,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // --- Node access helpers ---

    fn node(&self, idx: Idx) -> &Node {
        &self.nodes[idx as usize]
    }

    fn node_mut(&mut self, idx: Idx) -> &mut Node {
        &mut self.nodes[idx as usize]
    }

    fn alloc_node(&mut self, entry: Entry, height: usize) -> Idx {
        if let Some(idx) = self.free_list.pop() {
            let node = self.node_mut(idx);
            node.entry = entry;
            node.backward = NULL;
            node.levels.clear();
            node.levels.resize(height, EMPTY_LEVEL);
            idx
        } else {
            let idx = self.nodes.len() as Idx;
            self.nodes.push(Node::new(entry, height));
            idx
        }
    }

    /// Draw a tower height in [1, MAX_LEVEL]: a geometric distribution with
    /// continuation probability 1/4 per extra level. Two trailing zero bits
    /// of a xorshift64 draw are one P = 1/4 coin flip.
    fn random_level(&mut self) -> usize {
        self.rand_state ^= self.rand_state << 13;
        self.rand_state ^= self.rand_state >> 7;
        self.rand_state ^= self.rand_state << 17;
        ((self.rand_state.trailing_zeros() as usize) / 2 + 1).min(MAX_LEVEL)
    }

    // --- Core operations ---

    /// Insert a (score, member) pair.
    ///
    /// Rejects non-finite scores, empty members, and pairs already present
    /// ([`InsertError`]); the list is untouched on rejection. Member
    /// uniqueness across *different* scores is the caller's contract, as in
    /// the sorted-set engines this structure comes from, where a dictionary
    /// beside the list tracks current scores.
    pub fn insert(&mut self, score: f64, member: impl Into<String>) -> Result<(), InsertError> {
        let member = member.into();
        if !score.is_finite() {
            return Err(InsertError::NonFiniteScore(score));
        }
        if member.is_empty() {
            return Err(InsertError::EmptyMember);
        }

        // Descend from the top used level, advancing while the next node
        // strictly precedes the new pair. update[i] is the splice point per
        // level; rank[i] the number of level-0 steps taken to reach it.
        let mut update = [self.head; MAX_LEVEL];
        let mut rank = [0u64; MAX_LEVEL];
        let mut x = self.head;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            loop {
                let Level { forward, span } = self.node(x).levels[i];
                if forward == NULL || !self.node(forward).entry.precedes(score, &member) {
                    break;
                }
                rank[i] += span;
                x = forward;
            }
            update[i] = x;
        }

        // The descent stops on the would-be successor, so an exact match
        // there is a duplicate.
        let next = self.node(update[0]).levels[0].forward;
        if next != NULL && self.node(next).entry.matches(score, &member) {
            return Err(InsertError::Duplicate { score, member });
        }

        let height = self.random_level();
        if height > self.level {
            for i in self.level..height {
                rank[i] = 0;
                update[i] = self.head;
                // The head had no representation at this level before: its
                // span covers the whole list.
                self.node_mut(self.head).levels[i].span = self.len;
            }
            self.level = height;
        }

        let new_idx = self.alloc_node(Entry::new(score, member), height);
        for i in 0..height {
            let Level {
                forward: old_forward,
                span: old_span,
            } = self.node(update[i]).levels[i];
            let node = self.node_mut(new_idx);
            node.levels[i].forward = old_forward;
            node.levels[i].span = old_span - (rank[0] - rank[i]);
            let pred = self.node_mut(update[i]);
            pred.levels[i].forward = new_idx;
            pred.levels[i].span = (rank[0] - rank[i]) + 1;
        }

        // Levels above the new tower gain one level-0 step without
        // traversing the new node.
        for i in height..self.level {
            self.node_mut(update[i]).levels[i].span += 1;
        }

        self.node_mut(new_idx).backward = if update[0] == self.head {
            NULL
        } else {
            update[0]
        };
        let next = self.node(new_idx).levels[0].forward;
        if next != NULL {
            self.node_mut(next).backward = new_idx;
        } else {
            self.tail = new_idx;
        }
        self.len += 1;
        self.check_invariants();
        Ok(())
    }

    /// Remove the exact (score, member) pair. Returns whether a removal
    /// happened; a miss is a normal outcome and changes nothing. A
    /// close-but-unequal score never matches.
    pub fn remove(&mut self, score: f64, member: &str) -> bool {
        let mut update = [self.head; MAX_LEVEL];
        let mut x = self.head;
        for i in (0..self.level).rev() {
            loop {
                let forward = self.node(x).levels[i].forward;
                if forward == NULL || !self.node(forward).entry.precedes(score, member) {
                    break;
                }
                x = forward;
            }
            update[i] = x;
        }

        let target = self.node(update[0]).levels[0].forward;
        if target == NULL || !self.node(target).entry.matches(score, member) {
            return false;
        }

        self.unlink(target, &update);
        // Release the member's allocation now; the slot itself is recycled
        // on a later insert.
        self.node_mut(target).entry.member = String::new();
        self.free_list.push(target);
        self.check_invariants();
        true
    }

    /// Splice a node out of every level, given the per-level predecessors
    /// found by a search descent.
    fn unlink(&mut self, x: Idx, update: &[Idx; MAX_LEVEL]) {
        for i in 0..self.level {
            if self.node(update[i]).levels[i].forward == x {
                let Level { forward, span } = self.node(x).levels[i];
                let pred = self.node_mut(update[i]);
                // Add before subtracting: a tail node's span toward null is
                // 0, while a predecessor that links the target has span >= 1.
                pred.levels[i].span = pred.levels[i].span + span - 1;
                pred.levels[i].forward = forward;
            } else {
                // The removed node was one level-0 step inside this span.
                self.node_mut(update[i]).levels[i].span -= 1;
            }
        }

        let next = self.node(x).levels[0].forward;
        let backward = self.node(x).backward;
        if next != NULL {
            self.node_mut(next).backward = backward;
        } else {
            self.tail = backward;
        }

        while self.level > 1 && self.node(self.head).levels[self.level - 1].forward == NULL {
            self.level -= 1;
        }
        self.len -= 1;
    }

    // --- Rank queries ---

    /// 1-based rank of the exact (score, member) pair, or None if absent.
    /// O(log n) expected: the spans crossed by the search descent sum to the
    /// position.
    pub fn rank(&self, score: f64, member: &str) -> Option<u64> {
        let mut rank = 0u64;
        let mut x = self.head;
        for i in (0..self.level).rev() {
            loop {
                let Level { forward, span } = self.node(x).levels[i];
                if forward == NULL {
                    break;
                }
                // Non-strict on the tie so the sum lands on the target
                // itself rather than stopping one short.
                if self.node(forward).entry.key_cmp(score, member) == std::cmp::Ordering::Greater {
                    break;
                }
                rank += span;
                x = forward;
            }
            if x != self.head && self.node(x).entry.matches(score, member) {
                return Some(rank);
            }
        }
        None
    }

    /// The entry at 1-based rank `rank`, or None when outside [1, len].
    pub fn entry_at_rank(&self, rank: u64) -> Option<&Entry> {
        if rank == 0 || rank > self.len {
            return None;
        }
        let idx = self.node_at_rank(rank);
        if idx == NULL {
            return None;
        }
        Some(&self.node(idx).entry)
    }

    /// Span-consuming descent to the node at the given 1-based rank.
    fn node_at_rank(&self, rank: u64) -> Idx {
        let mut traversed = 0u64;
        let mut x = self.head;
        for i in (0..self.level).rev() {
            loop {
                let Level { forward, span } = self.node(x).levels[i];
                if forward == NULL || traversed + span > rank {
                    break;
                }
                traversed += span;
                x = forward;
            }
            if x != self.head && traversed == rank {
                return x;
            }
        }
        NULL
    }

    /// Lazy iterator over the entries whose ranks fall in `[lo, hi]`,
    /// intersected with `[1, len]`; empty when the intersection is. Locates
    /// rank `lo` in O(log n) expected, then walks level-0 links. Consumed
    /// once, cheap to re-issue.
    pub fn range_by_rank(&self, lo: u64, hi: u64) -> RangeByRank<'_> {
        let lo = lo.max(1);
        let hi = hi.min(self.len);
        if lo > hi {
            return RangeByRank {
                list: self,
                cursor: NULL,
                remaining: 0,
            };
        }
        RangeByRank {
            list: self,
            cursor: self.node_at_rank(lo),
            remaining: hi - lo + 1,
        }
    }

    // --- Traversal ---

    /// Iterate entries in ascending (score, member) order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.node(self.head).levels[0].forward,
        }
    }

    /// Iterate entries in descending order, following the backward chain
    /// from the tail.
    pub fn iter_rev(&self) -> IterRev<'_> {
        IterRev {
            list: self,
            cursor: self.tail,
        }
    }

    // --- Invariant checking ---

    #[cfg(debug_assertions)]
    fn check_invariants(&self) {
        assert!(self.level >= 1 && self.level <= MAX_LEVEL);
        if self.level > 1 {
            assert_ne!(
                self.node(self.head).levels[self.level - 1].forward,
                NULL,
                "top level in use is empty"
            );
        }

        // Level-0 chain: strictly ascending, backward links mirror it,
        // node count matches len, tail is the last node.
        let mut count = 0u64;
        let mut prev = NULL;
        let mut x = self.node(self.head).levels[0].forward;
        let mut position = vec![0u64; self.nodes.len()];
        while x != NULL {
            let node = self.node(x);
            if prev == NULL {
                assert_eq!(node.backward, NULL, "first node has a backward link");
            } else {
                let p = &self.node(prev).entry;
                assert!(
                    p.precedes(node.entry.score, &node.entry.member),
                    "level-0 chain out of order at {}",
                    node.entry.member
                );
                assert_eq!(node.backward, prev, "backward link mismatch");
            }
            assert!(node.height() <= self.level, "node taller than list level");
            count += 1;
            position[x as usize] = count;
            prev = x;
            x = node.levels[0].forward;
        }
        assert_eq!(count, self.len, "len does not match level-0 traversal");
        assert_eq!(self.tail, prev, "tail is not the last node");

        // Spans: at every level in use, a span equals the level-0 distance
        // to its forward target; spans toward null reach one past the tail.
        let mut x = self.head;
        while x != NULL {
            let node = self.node(x);
            for i in 0..node.height().min(self.level) {
                let Level { forward, span } = node.levels[i];
                let here = position[x as usize];
                if forward != NULL {
                    assert_eq!(
                        span,
                        position[forward as usize] - here,
                        "span mismatch at level {}",
                        i
                    );
                } else {
                    assert_eq!(span, self.len - here, "null span mismatch at level {}", i);
                }
            }
            x = node.levels[0].forward;
        }
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn check_invariants(&self) {}
}

impl Default for RankedSkipList {
    fn default() -> Self {
        Self::new()
    }
}

/// Diagnostic trace of the current order: `(member, score) -> ... -> null`.
/// No contract beyond reflecting the level-0 chain.
impl fmt::Display for RankedSkipList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.iter() {
            write!(f, "({}, {:.2}) -> ", entry.member, entry.score)?;
        }
        write!(f, "null")
    }
}

pub struct Iter<'a> {
    list: &'a RankedSkipList,
    cursor: Idx,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NULL {
            return None;
        }
        let node = self.list.node(self.cursor);
        self.cursor = node.levels[0].forward;
        Some(&node.entry)
    }
}

pub struct IterRev<'a> {
    list: &'a RankedSkipList,
    cursor: Idx,
}

impl<'a> Iterator for IterRev<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NULL {
            return None;
        }
        let node = self.list.node(self.cursor);
        self.cursor = node.backward;
        Some(&node.entry)
    }
}

pub struct RangeByRank<'a> {
    list: &'a RankedSkipList,
    cursor: Idx,
    remaining: u64,
}

impl<'a> Iterator for RangeByRank<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.cursor == NULL {
            return None;
        }
        let node = self.list.node(self.cursor);
        self.cursor = node.levels[0].forward;
        self.remaining -= 1;
        Some(&node.entry)
    }
}
