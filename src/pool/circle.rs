//! Many circular doubly linked lists sharing one fixed index space.
//!
//! Every node is a member of exactly one circle at all times; a node linked
//! to itself is a circle of one. Higher-level containers reserve a few
//! indices as list heads (for example a free head and a used head) and move
//! the remaining nodes between those circles in O(1).

use thiserror::Error;

/// Index of a node inside a [`CircleLinkedListPool`]
pub type PoolIndex = u16;

/// Largest node count addressable by [`PoolIndex`]
pub const MAX_POOL_SIZE: usize = PoolIndex::MAX as usize + 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool size must be between 1 and {MAX_POOL_SIZE}, got {0}")]
    InvalidSize(usize),

    #[error("Node index {index} is out of range for a pool of {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("Pool has no free nodes left")]
    Full,

    #[error("Node {0} is reserved as a list head")]
    Reserved(usize),

    #[error("Node {0} is not currently in use")]
    NotInUse(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    prev: PoolIndex,
    next: PoolIndex,
}

#[derive(Debug, Clone)]
pub struct CircleLinkedListPool {
    links: Vec<Link>,
}

impl CircleLinkedListPool {
    /// Create a pool of `size` nodes, all linked into one circle in index
    /// order (`0 -> 1 -> ... -> size - 1 -> 0`).
    pub fn new(size: usize) -> Result<Self, PoolError> {
        if size == 0 || size > MAX_POOL_SIZE {
            return Err(PoolError::InvalidSize(size));
        }

        let links = (0..size)
            .map(|i| Link {
                prev: to_index((i + size - 1) % size),
                next: to_index((i + 1) % size),
            })
            .collect();

        Ok(Self { links })
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Always false; pools hold at least one node.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, index: PoolIndex) -> bool {
        usize::from(index) < self.links.len()
    }

    fn check(&self, index: PoolIndex) -> Result<(), PoolError> {
        if self.contains(index) {
            Ok(())
        } else {
            Err(PoolError::OutOfRange {
                index: usize::from(index),
                len: self.links.len(),
            })
        }
    }

    /// Unlink `node` from its circle and relink it right after `head`.
    ///
    /// Moving a node onto itself turns it into a fresh circle of one.
    /// Returns the node that followed `node` in its original circle, so a
    /// caller can keep walking that circle while draining it.
    ///
    /// Indices are not checked; see [`Self::try_move_to`].
    pub fn move_to(&mut self, node: PoolIndex, head: PoolIndex) -> PoolIndex {
        let Link { prev, next } = self.links[usize::from(node)];

        self.links[usize::from(prev)].next = next;
        self.links[usize::from(next)].prev = prev;
        // Self-link first so that `head == node` yields a circle of one
        self.links[usize::from(node)] = Link {
            prev: node,
            next: node,
        };

        let after = self.links[usize::from(head)].next;
        self.links[usize::from(node)] = Link {
            prev: head,
            next: after,
        };
        self.links[usize::from(head)].next = node;
        self.links[usize::from(after)].prev = node;

        next
    }

    /// Swap the successors of two heads.
    ///
    /// Heads in different circles merge them into one; heads in the same
    /// circle split it in two. Applying the same cross twice restores the
    /// original circles.
    ///
    /// Indices are not checked; see [`Self::try_cross`].
    pub fn cross(&mut self, head_a: PoolIndex, head_b: PoolIndex) {
        let after_a = self.links[usize::from(head_a)].next;
        let after_b = self.links[usize::from(head_b)].next;

        self.links[usize::from(head_a)].next = after_b;
        self.links[usize::from(after_b)].prev = head_a;
        self.links[usize::from(head_b)].next = after_a;
        self.links[usize::from(after_a)].prev = head_b;
    }

    pub fn try_move_to(&mut self, node: PoolIndex, head: PoolIndex) -> Result<PoolIndex, PoolError> {
        self.check(node)?;
        self.check(head)?;
        Ok(self.move_to(node, head))
    }

    pub fn try_cross(&mut self, head_a: PoolIndex, head_b: PoolIndex) -> Result<(), PoolError> {
        self.check(head_a)?;
        self.check(head_b)?;
        self.cross(head_a, head_b);
        Ok(())
    }

    pub fn next(&self, node: PoolIndex) -> PoolIndex {
        self.links[usize::from(node)].next
    }

    pub fn prev(&self, node: PoolIndex) -> PoolIndex {
        self.links[usize::from(node)].prev
    }

    /// True if `head` is a circle of one
    pub fn is_alone(&self, head: PoolIndex) -> bool {
        self.next(head) == head
    }

    /// Walk the circle after `head`, stopping before `head` comes round again
    pub fn iter_from(&self, head: PoolIndex) -> CircleIter<'_> {
        CircleIter {
            pool: self,
            head,
            current: self.next(head),
        }
    }

    /// Number of nodes in `head`'s circle, not counting `head`
    pub fn circle_len(&self, head: PoolIndex) -> usize {
        self.iter_from(head).count()
    }
}

/// Iterator over one circle, see [`CircleLinkedListPool::iter_from`]
pub struct CircleIter<'a> {
    pool: &'a CircleLinkedListPool,
    head: PoolIndex,
    current: PoolIndex,
}

impl Iterator for CircleIter<'_> {
    type Item = PoolIndex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.head {
            return None;
        }
        let node = self.current;
        self.current = self.pool.next(node);
        Some(node)
    }
}

// Only called with values below MAX_POOL_SIZE
#[expect(
    clippy::cast_possible_truncation,
    reason = "pool sizes are capped at MAX_POOL_SIZE"
)]
fn to_index(i: usize) -> PoolIndex {
    i as PoolIndex
}
