//! Binary-heap priority queue with O(log n) removal by handle.
//!
//! Entries live in an [`Arena`] and record their own position in the heap
//! vector, so a [`Handle`] locates its entry without a scan. The ordering
//! is an injected comparator `less(a, b)`, read as "`a` has strictly higher
//! priority than `b`"; the entry at the top is never outranked by any other.

use core::fmt;
use core::slice;

use tracing::trace;

use crate::render::write_seq;
use crate::storage::{Arena, Full, Handle};
use crate::Key;

/// Comparator type used by [`PriorityQueue::min`] and [`PriorityQueue::max`].
pub type Less<T> = fn(&T, &T) -> bool;

fn lt<T: Ord>(a: &T, b: &T) -> bool {
    a < b
}

fn gt<T: Ord>(a: &T, b: &T) -> bool {
    a > b
}

struct HeapNode<T> {
    value: T,
    /// Current index into `PriorityQueue::heap`.
    pos: usize,
}

/// A priority queue ordered by a caller-supplied comparator.
///
/// `push` returns a [`Handle`] that stays valid until the entry is popped
/// or removed. Handles allow O(log n) removal and re-prioritization of
/// arbitrary entries.
///
/// The comparator must be a strict weak ordering. An inconsistent
/// comparator scrambles the pop order but never causes a panic.
///
/// # Example
///
/// ```
/// use nexus_containers::PriorityQueue;
///
/// let mut queue = PriorityQueue::max();
/// queue.push(10);
/// queue.push(5);
/// let h = queue.push(30);
/// queue.push(20);
///
/// assert_eq!(queue.remove(h), Some(30));
/// assert_eq!(queue.peek(), Some(&20));
///
/// assert_eq!(queue.into_sorted_vec(), vec![20, 10, 5]);
/// ```
///
/// With a closure comparator:
///
/// ```
/// use nexus_containers::PriorityQueue;
///
/// struct Job { deadline: u64, name: &'static str }
///
/// let mut queue = PriorityQueue::new(|a: &Job, b: &Job| a.deadline < b.deadline);
/// queue.push(Job { deadline: 30, name: "flush" });
/// queue.push(Job { deadline: 10, name: "ack" });
///
/// assert_eq!(queue.pop().map(|j| j.name), Some("ack"));
/// ```
pub struct PriorityQueue<T, F = Less<T>, K: Key = u32> {
    nodes: Arena<HeapNode<T>, K>,
    /// Slot keys in heap order. Every key refers to an occupied slot.
    heap: Vec<K>,
    less: F,
}

impl<T: Ord> PriorityQueue<T> {
    /// Creates a queue that pops the smallest value first.
    pub fn min() -> Self {
        Self::new(lt::<T>)
    }

    /// Creates a queue that pops the largest value first.
    pub fn max() -> Self {
        Self::new(gt::<T>)
    }
}

impl<T, F> PriorityQueue<T, F>
where
    F: FnMut(&T, &T) -> bool,
{
    /// Creates an empty queue ordered by `less`.
    ///
    /// `less(a, b)` returns `true` when `a` must be popped before `b`.
    pub fn new(less: F) -> Self {
        Self::keyed(0, less)
    }

    /// Creates an empty queue with room for `capacity` entries.
    pub fn with_capacity(capacity: usize, less: F) -> Self {
        Self::keyed(capacity, less)
    }
}

impl<T, F, K: Key> PriorityQueue<T, F, K> {
    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if the queue holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the number of entries the queue can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.heap.capacity()
    }

    /// Returns the highest-priority value without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        let &slot = self.heap.first()?;
        self.nodes.slot(slot).map(|node| &node.value)
    }

    /// Returns the handle of the highest-priority entry.
    #[inline]
    pub fn peek_handle(&self) -> Option<Handle<K>> {
        self.heap.first().map(|&slot| self.nodes.handle_of(slot))
    }

    /// Returns the value behind `handle`, or `None` if the handle is stale.
    #[inline]
    pub fn get(&self, handle: Handle<K>) -> Option<&T> {
        self.nodes.get(handle).map(|node| &node.value)
    }

    /// Returns a mutable reference to the value behind `handle`.
    ///
    /// If the change affects the value's priority, call
    /// [`update`](Self::update) afterwards to restore heap order.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle<K>) -> Option<&mut T> {
        self.nodes.get_mut(handle).map(|node| &mut node.value)
    }

    /// Returns `true` if `handle` refers to an entry still in the queue.
    #[inline]
    pub fn contains(&self, handle: Handle<K>) -> bool {
        self.nodes.contains(handle)
    }

    /// Returns the entry's current index in backing order.
    ///
    /// Index 0 is the top of the queue.
    #[inline]
    pub fn position(&self, handle: Handle<K>) -> Option<usize> {
        self.nodes.get(handle).map(|node| node.pos)
    }

    /// Iterates over values in backing order, which is not priority order.
    pub fn iter(&self) -> Iter<'_, T, K> {
        Iter {
            slots: self.heap.iter(),
            nodes: &self.nodes,
        }
    }

    /// Drops every entry. All outstanding handles become stale.
    pub fn clear(&mut self) {
        let dropped = self.heap.len();
        self.heap.clear();
        self.nodes.clear();
        trace!(dropped, "priority queue cleared");
    }
}

impl<T, F, K> PriorityQueue<T, F, K>
where
    F: FnMut(&T, &T) -> bool,
    K: Key,
{
    /// Creates an empty queue whose handles use the key type `K`.
    ///
    /// A narrower key shrinks handles and caps the queue at `K::NONE`
    /// entries.
    ///
    /// ```
    /// use nexus_containers::PriorityQueue;
    ///
    /// let mut queue: PriorityQueue<u8, _, u8> =
    ///     PriorityQueue::keyed(0, |a: &u8, b: &u8| a < b);
    /// queue.push(3);
    /// assert_eq!(queue.peek(), Some(&3));
    /// ```
    pub fn keyed(capacity: usize, less: F) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            heap: Vec::with_capacity(capacity),
            less,
        }
    }

    /// Inserts a value, returning a handle to its entry.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the key type has no slot index left.
    pub fn try_push(&mut self, value: T) -> Result<Handle<K>, Full<T>> {
        let pos = self.heap.len();
        let handle = self
            .nodes
            .try_insert(HeapNode { value, pos })
            .map_err(|Full(node)| Full(node.value))?;

        self.heap.push(handle.slot());
        self.sift_up(pos);
        Ok(handle)
    }

    /// Inserts a value, returning a handle to its entry.
    ///
    /// # Panics
    ///
    /// Panics if the key type has no slot index left.
    pub fn push(&mut self, value: T) -> Handle<K> {
        match self.try_push(value) {
            Ok(handle) => handle,
            Err(_) => panic!("priority queue key space exhausted"),
        }
    }

    /// Removes and returns the highest-priority value.
    pub fn pop(&mut self) -> Option<T> {
        if self.heap.is_empty() {
            return None;
        }
        self.detach(0)
    }

    /// Removes the entry behind `handle`, returning its value.
    ///
    /// Returns `None` if the handle is stale or belongs to another queue.
    pub fn remove(&mut self, handle: Handle<K>) -> Option<T> {
        let Some(pos) = self.position(handle) else {
            trace!(?handle, "priority queue rejected stale handle");
            return None;
        };
        self.detach(pos)
    }

    /// Restores heap order after the value behind `handle` was mutated.
    ///
    /// Returns `false` if the handle is stale.
    ///
    /// ```
    /// use nexus_containers::PriorityQueue;
    ///
    /// let mut queue = PriorityQueue::min();
    /// queue.push(5);
    /// let h = queue.push(9);
    ///
    /// *queue.get_mut(h).unwrap() = 1;
    /// assert!(queue.update(h));
    /// assert_eq!(queue.peek(), Some(&1));
    /// ```
    pub fn update(&mut self, handle: Handle<K>) -> bool {
        let Some(pos) = self.position(handle) else {
            trace!(?handle, "priority queue rejected stale handle");
            return false;
        };
        self.restore(pos);
        true
    }

    /// Pops values while `pred` holds for the current top.
    ///
    /// ```
    /// use nexus_containers::PriorityQueue;
    ///
    /// let mut queue = PriorityQueue::min();
    /// queue.extend([1, 5, 3, 7]);
    ///
    /// let due: Vec<_> = queue.drain_while(|&x| x < 4).collect();
    /// assert_eq!(due, vec![1, 3]);
    /// assert_eq!(queue.peek(), Some(&5));
    /// ```
    #[inline]
    pub fn drain_while<P>(&mut self, pred: P) -> DrainWhile<'_, T, F, K, P>
    where
        P: FnMut(&T) -> bool,
    {
        DrainWhile { queue: self, pred }
    }

    /// Consumes the queue, returning its values in pop order.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.heap.len());
        while let Some(value) = self.pop() {
            out.push(value);
        }
        out
    }

    /// Unlinks the entry at `pos` and repairs the heap around the entry
    /// moved into its place.
    fn detach(&mut self, pos: usize) -> Option<T> {
        let slot = self.heap.swap_remove(pos);
        if pos < self.heap.len() {
            // Safety: pos < len after the swap
            let moved = *unsafe { self.heap.get_unchecked(pos) };
            unsafe { self.nodes.get_unchecked_mut(moved) }.pos = pos;
            self.restore(pos);
        }
        self.nodes.remove_slot(slot).map(|node| node.value)
    }

    #[inline]
    fn restore(&mut self, pos: usize) {
        if !self.sift_down(pos) {
            self.sift_up(pos);
        }
    }

    /// Returns `true` if the entry in slot `a` outranks the one in slot `b`.
    #[inline]
    fn outranks(&mut self, a: K, b: K) -> bool {
        // Safety: heap only holds occupied slots
        unsafe {
            (self.less)(
                &self.nodes.get_unchecked(a).value,
                &self.nodes.get_unchecked(b).value,
            )
        }
    }

    /// Writes `slot` at `pos` and records the position in its node.
    #[inline]
    fn place(&mut self, pos: usize, slot: K) {
        // Safety: callers pass pos < len and an occupied slot
        *unsafe { self.heap.get_unchecked_mut(pos) } = slot;
        unsafe { self.nodes.get_unchecked_mut(slot) }.pos = pos;
    }

    /// Moves the entry at `pos` toward the root. Returns `true` if it moved.
    fn sift_up(&mut self, pos: usize) -> bool {
        // Safety: pos < len
        let slot = *unsafe { self.heap.get_unchecked(pos) };
        let mut hole = pos;

        while hole > 0 {
            let parent = (hole - 1) / 2;
            // Safety: parent < hole
            let parent_slot = *unsafe { self.heap.get_unchecked(parent) };
            if !self.outranks(slot, parent_slot) {
                break;
            }
            self.place(hole, parent_slot);
            hole = parent;
        }

        if hole == pos {
            return false;
        }
        self.place(hole, slot);
        true
    }

    /// Moves the entry at `pos` toward the leaves. Returns `true` if it moved.
    fn sift_down(&mut self, pos: usize) -> bool {
        let len = self.heap.len();
        // Safety: pos < len
        let slot = *unsafe { self.heap.get_unchecked(pos) };
        let mut hole = pos;

        loop {
            let left = 2 * hole + 1;
            if left >= len {
                break;
            }
            let right = left + 1;

            // Safety: left < len, right checked
            let left_slot = *unsafe { self.heap.get_unchecked(left) };
            let (child, child_slot) = if right < len {
                let right_slot = *unsafe { self.heap.get_unchecked(right) };
                if self.outranks(right_slot, left_slot) {
                    (right, right_slot)
                } else {
                    (left, left_slot)
                }
            } else {
                (left, left_slot)
            };

            if !self.outranks(child_slot, slot) {
                break;
            }
            self.place(hole, child_slot);
            hole = child;
        }

        if hole == pos {
            return false;
        }
        self.place(hole, slot);
        true
    }
}

impl<T: Ord> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::min()
    }
}

impl<T, F, K> Extend<T> for PriorityQueue<T, F, K>
where
    F: FnMut(&T, &T) -> bool,
    K: Key,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.heap.reserve(iter.size_hint().0);
        for value in iter {
            self.push(value);
        }
    }
}

impl<T: fmt::Display, F, K: Key> fmt::Display for PriorityQueue<T, F, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_seq(f, "PriorityQueue ", ", ", self.iter())
    }
}

impl<T: fmt::Debug, F, K: Key> fmt::Debug for PriorityQueue<T, F, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T, F, K: Key> IntoIterator for &'a PriorityQueue<T, F, K> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Iterator over queue values in backing order.
///
/// Created by [`PriorityQueue::iter`].
pub struct Iter<'a, T, K: Key> {
    slots: slice::Iter<'a, K>,
    nodes: &'a Arena<HeapNode<T>, K>,
}

impl<'a, T, K: Key> Iterator for Iter<'a, T, K> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        let &slot = self.slots.next()?;
        self.nodes.slot(slot).map(|node| &node.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<T, K: Key> ExactSizeIterator for Iter<'_, T, K> {}

/// Iterator that pops values while a predicate holds.
///
/// Created by [`PriorityQueue::drain_while`].
pub struct DrainWhile<'a, T, F, K, P>
where
    F: FnMut(&T, &T) -> bool,
    K: Key,
    P: FnMut(&T) -> bool,
{
    queue: &'a mut PriorityQueue<T, F, K>,
    pred: P,
}

impl<T, F, K, P> Iterator for DrainWhile<'_, T, F, K, P>
where
    F: FnMut(&T, &T) -> bool,
    K: Key,
    P: FnMut(&T) -> bool,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let top = self.queue.peek()?;
        if (self.pred)(top) {
            self.queue.pop()
        } else {
            None
        }
    }
}

#[cfg(test)]
impl<T, F, K> PriorityQueue<T, F, K>
where
    F: FnMut(&T, &T) -> bool,
    K: Key,
{
    /// Panics if stored positions or the heap property are broken.
    pub(crate) fn assert_invariants(&mut self) {
        assert_eq!(self.heap.len(), self.nodes.len());
        for pos in 0..self.heap.len() {
            let slot = self.heap[pos];
            assert_eq!(self.nodes.slot(slot).unwrap().pos, pos, "stale pos");
            if pos > 0 {
                let parent = self.heap[(pos - 1) / 2];
                assert!(!self.outranks(slot, parent), "heap order violated");
            }
        }
    }
}
