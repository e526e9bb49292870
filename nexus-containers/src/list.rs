//! Doubly-linked list with stable node handles.
//!
//! Nodes live in an [`Arena`] owned by the list and link to each other by
//! slot key, with `K::NONE` marking the ends. Every node operation is O(1)
//! given a [`Handle`]; relinking operations (`move_to_*`, [`List::reverse`],
//! [`List::sort_by`]) never move a value between slots, so handles survive
//! them.
//!
//! # Example
//!
//! ```
//! use nexus_containers::List;
//!
//! let mut lru: List<&str> = List::new();
//! let a = lru.push_front("a");
//! lru.push_front("b");
//! lru.push_front("c");
//!
//! // Touch "a": it becomes most recently used
//! lru.move_to_front(a);
//! assert_eq!(lru.to_vec(), vec!["a", "c", "b"]);
//!
//! // Evict least recently used
//! assert_eq!(lru.pop_back(), Some("b"));
//! assert_eq!(lru.get(a), Some(&"a"));
//! ```

use core::fmt;
use core::iter::FusedIterator;

use tracing::trace;

use crate::render::write_seq;
use crate::storage::{Arena, Full, Handle};
use crate::Key;

struct ListNode<T, K: Key> {
    value: T,
    prev: K,
    next: K,
}

/// A doubly-linked list that owns its nodes and hands out [`Handle`]s.
///
/// Stale handles, and handles minted by another list, are rejected: reads
/// return `None` and mutations leave the list untouched.
pub struct List<T, K: Key = u32> {
    nodes: Arena<ListNode<T, K>, K>,
    head: K,
    tail: K,
}

impl<T> List<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::keyed(0)
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::keyed(capacity)
    }
}

impl<T: Clone> List<T> {
    /// Creates a list holding clones of `values`, in order.
    ///
    /// ```
    /// use nexus_containers::List;
    ///
    /// let list = List::from_slice(&[1, 2, 3]);
    /// assert_eq!(list.to_string(), "[1 2 3]");
    /// ```
    pub fn from_slice(values: &[T]) -> Self {
        let mut list = Self::with_capacity(values.len());
        list.assign(values);
        list
    }
}

// =============================================================================
// Access and navigation
// =============================================================================

impl<T, K: Key> List<T, K> {
    /// Creates an empty list whose handles use the key type `K`.
    pub fn keyed(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            head: K::NONE,
            tail: K::NONE,
        }
    }

    /// Returns the number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the list has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns the first value.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.nodes.slot(self.head).map(|node| &node.value)
    }

    /// Returns the last value.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.nodes.slot(self.tail).map(|node| &node.value)
    }

    /// Returns the handle of the first node.
    #[inline]
    pub fn front_handle(&self) -> Option<Handle<K>> {
        self.handle_at(self.head)
    }

    /// Returns the handle of the last node.
    #[inline]
    pub fn back_handle(&self) -> Option<Handle<K>> {
        self.handle_at(self.tail)
    }

    /// Returns the value behind `handle`.
    #[inline]
    pub fn get(&self, handle: Handle<K>) -> Option<&T> {
        self.nodes.get(handle).map(|node| &node.value)
    }

    /// Returns a mutable reference to the value behind `handle`.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle<K>) -> Option<&mut T> {
        self.nodes.get_mut(handle).map(|node| &mut node.value)
    }

    /// Returns `true` if `handle` refers to a node of this list.
    #[inline]
    pub fn contains(&self, handle: Handle<K>) -> bool {
        self.nodes.contains(handle)
    }

    /// Returns the handle of the node after `handle`.
    #[inline]
    pub fn next(&self, handle: Handle<K>) -> Option<Handle<K>> {
        let node = self.nodes.get(handle)?;
        self.handle_at(node.next)
    }

    /// Returns the handle of the node before `handle`.
    #[inline]
    pub fn prev(&self, handle: Handle<K>) -> Option<Handle<K>> {
        let node = self.nodes.get(handle)?;
        self.handle_at(node.prev)
    }

    /// Returns the handle of the first node whose value satisfies `pred`.
    pub fn find<P>(&self, mut pred: P) -> Option<Handle<K>>
    where
        P: FnMut(&T) -> bool,
    {
        let mut cur = self.head;
        while cur.is_some() {
            // Safety: linked slots are occupied
            let node = unsafe { self.nodes.get_unchecked(cur) };
            if pred(&node.value) {
                return Some(self.nodes.handle_of(cur));
            }
            cur = node.next;
        }
        None
    }

    /// Iterates over values from front to back.
    pub fn iter(&self) -> Iter<'_, T, K> {
        Iter {
            nodes: &self.nodes,
            front: self.head,
            back: self.tail,
        }
    }

    /// Iterates over node handles from front to back.
    pub fn handles(&self) -> Handles<'_, T, K> {
        Handles {
            nodes: &self.nodes,
            front: self.head,
            back: self.tail,
        }
    }

    /// Collects clones of the values from front to back.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    #[inline]
    fn handle_at(&self, slot: K) -> Option<Handle<K>> {
        slot.is_some().then(|| self.nodes.handle_of(slot))
    }
}

// =============================================================================
// Insertion
// =============================================================================

impl<T, K: Key> List<T, K> {
    /// Appends a value, returning its handle.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the key type has no slot index left.
    pub fn try_push_back(&mut self, value: T) -> Result<Handle<K>, Full<T>> {
        let handle = self.alloc(value)?;
        self.link_back(handle.slot());
        Ok(handle)
    }

    /// Prepends a value, returning its handle.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the key type has no slot index left.
    pub fn try_push_front(&mut self, value: T) -> Result<Handle<K>, Full<T>> {
        let handle = self.alloc(value)?;
        self.link_front(handle.slot());
        Ok(handle)
    }

    /// Appends a value, returning its handle.
    ///
    /// # Panics
    ///
    /// Panics if the key type has no slot index left.
    pub fn push_back(&mut self, value: T) -> Handle<K> {
        match self.try_push_back(value) {
            Ok(handle) => handle,
            Err(_) => panic!("list key space exhausted"),
        }
    }

    /// Prepends a value, returning its handle.
    ///
    /// # Panics
    ///
    /// Panics if the key type has no slot index left.
    pub fn push_front(&mut self, value: T) -> Handle<K> {
        match self.try_push_front(value) {
            Ok(handle) => handle,
            Err(_) => panic!("list key space exhausted"),
        }
    }

    /// Inserts a value directly after `anchor`.
    ///
    /// With no anchor, or an anchor that no longer resolves, the value is
    /// appended at the back instead.
    ///
    /// # Panics
    ///
    /// Panics if the key type has no slot index left.
    pub fn insert_after(&mut self, anchor: Option<Handle<K>>, value: T) -> Handle<K> {
        let after = match anchor {
            Some(handle) if self.nodes.contains(handle) => handle.slot(),
            Some(handle) => {
                trace!(?handle, "list rejected stale anchor, appending");
                return self.push_back(value);
            }
            None => return self.push_back(value),
        };

        let handle = self.push_detached(value);
        self.link_after(after, handle.slot());
        handle
    }

    /// Inserts a value directly before `anchor`.
    ///
    /// With no anchor, or an anchor that no longer resolves, the value is
    /// prepended at the front instead.
    ///
    /// # Panics
    ///
    /// Panics if the key type has no slot index left.
    pub fn insert_before(&mut self, anchor: Option<Handle<K>>, value: T) -> Handle<K> {
        let before = match anchor {
            Some(handle) if self.nodes.contains(handle) => handle.slot(),
            Some(handle) => {
                trace!(?handle, "list rejected stale anchor, prepending");
                return self.push_front(value);
            }
            None => return self.push_front(value),
        };

        let handle = self.push_detached(value);
        self.link_before(before, handle.slot());
        handle
    }

    /// Clears the list, then appends clones of `values` in order.
    pub fn assign(&mut self, values: &[T])
    where
        T: Clone,
    {
        self.clear();
        self.extend(values.iter().cloned());
    }

    #[inline]
    fn alloc(&mut self, value: T) -> Result<Handle<K>, Full<T>> {
        self.nodes
            .try_insert(ListNode {
                value,
                prev: K::NONE,
                next: K::NONE,
            })
            .map_err(|Full(node)| Full(node.value))
    }

    fn push_detached(&mut self, value: T) -> Handle<K> {
        match self.alloc(value) {
            Ok(handle) => handle,
            Err(_) => panic!("list key space exhausted"),
        }
    }
}

// =============================================================================
// Removal and relinking
// =============================================================================

impl<T, K: Key> List<T, K> {
    /// Removes the node behind `handle`, returning its value.
    ///
    /// Returns `None` for stale, already removed, or foreign handles.
    pub fn remove(&mut self, handle: Handle<K>) -> Option<T> {
        if !self.nodes.contains(handle) {
            trace!(?handle, "list rejected stale handle");
            return None;
        }
        self.take(handle.slot())
    }

    /// Removes and returns the first value.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.head.is_none() {
            return None;
        }
        self.take(self.head)
    }

    /// Removes and returns the last value.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.tail.is_none() {
            return None;
        }
        self.take(self.tail)
    }

    /// Moves the node behind `handle` to the front. The handle stays valid.
    ///
    /// Does nothing if the node is already first or the handle is stale.
    pub fn move_to_front(&mut self, handle: Handle<K>) {
        if !self.nodes.contains(handle) {
            trace!(?handle, "list rejected stale handle");
            return;
        }
        let slot = handle.slot();
        if self.head == slot {
            return;
        }
        self.unlink(slot);
        self.link_front(slot);
    }

    /// Moves the node behind `handle` to the back. The handle stays valid.
    ///
    /// Does nothing if the node is already last or the handle is stale.
    pub fn move_to_back(&mut self, handle: Handle<K>) {
        if !self.nodes.contains(handle) {
            trace!(?handle, "list rejected stale handle");
            return;
        }
        let slot = handle.slot();
        if self.tail == slot {
            return;
        }
        self.unlink(slot);
        self.link_back(slot);
    }

    /// Reverses the list in place by swapping every node's links.
    pub fn reverse(&mut self) {
        let mut cur = self.head;
        while cur.is_some() {
            // Safety: linked slots are occupied
            let node = unsafe { self.nodes.get_unchecked_mut(cur) };
            core::mem::swap(&mut node.prev, &mut node.next);
            // Old next, now in prev
            cur = node.prev;
        }
        core::mem::swap(&mut self.head, &mut self.tail);
    }

    /// Stable-sorts the list so that no value is followed by one it is
    /// `less` than.
    ///
    /// Values stay in their slots and are relinked, so handles remain valid.
    /// Takes O(n log n) time and O(n) extra space. An inconsistent `less`
    /// leaves the order unspecified but never panics.
    ///
    /// ```
    /// use nexus_containers::List;
    ///
    /// let mut list = List::from_slice(&[3, 1, 2]);
    /// let one = list.find(|&v| v == 1).unwrap();
    ///
    /// list.sort_by(|a, b| a < b);
    /// assert_eq!(list.to_vec(), vec![1, 2, 3]);
    /// assert_eq!(list.front_handle(), Some(one));
    /// ```
    pub fn sort_by<F>(&mut self, mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        if self.len() < 2 {
            return;
        }

        let mut slots: Vec<K> = self.handles().map(|handle| handle.slot()).collect();
        let mut scratch = slots.clone();
        let nodes = &self.nodes;
        // Safety: both slots were collected from live links
        let mut ahead = |a: K, b: K| unsafe {
            less(&nodes.get_unchecked(a).value, &nodes.get_unchecked(b).value)
        };

        // Bottom-up merge. Each merge step consults `less` once and never
        // assumes a total order, so any comparator terminates.
        let len = slots.len();
        let mut width = 1;
        while width < len {
            let mut start = 0;
            while start < len {
                let mid = (start + width).min(len);
                let end = (start + 2 * width).min(len);
                let (mut i, mut j) = (start, mid);
                for out in &mut scratch[start..end] {
                    // Right run wins only when strictly ahead, keeping ties stable
                    if i == mid || (j < end && ahead(slots[j], slots[i])) {
                        *out = slots[j];
                        j += 1;
                    } else {
                        *out = slots[i];
                        i += 1;
                    }
                }
                start = end;
            }
            core::mem::swap(&mut slots, &mut scratch);
            width *= 2;
        }

        self.head = K::NONE;
        self.tail = K::NONE;
        for slot in slots {
            self.link_back(slot);
        }
    }

    /// Stable-sorts the list in ascending order.
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.sort_by(|a, b| a < b);
    }

    /// Drops every node. All outstanding handles become stale.
    pub fn clear(&mut self) {
        let dropped = self.nodes.len();
        self.nodes.clear();
        self.head = K::NONE;
        self.tail = K::NONE;
        trace!(dropped, "list cleared");
    }

    /// Unlinks an occupied slot and frees it.
    #[inline]
    fn take(&mut self, slot: K) -> Option<T> {
        self.unlink(slot);
        self.nodes.remove_slot(slot).map(|node| node.value)
    }

    // ========================================================================
    // Linking
    //
    // Every slot passed in is occupied. `link_*` expect a detached node;
    // `unlink` leaves one behind with both links cleared.
    // ========================================================================

    #[inline]
    fn link_back(&mut self, slot: K) {
        let tail = self.tail;
        // Safety: slot occupied
        let node = unsafe { self.nodes.get_unchecked_mut(slot) };
        node.prev = tail;
        node.next = K::NONE;

        if tail.is_some() {
            // Safety: tail is occupied when is_some()
            unsafe { self.nodes.get_unchecked_mut(tail) }.next = slot;
        } else {
            self.head = slot;
        }
        self.tail = slot;
    }

    #[inline]
    fn link_front(&mut self, slot: K) {
        let head = self.head;
        // Safety: slot occupied
        let node = unsafe { self.nodes.get_unchecked_mut(slot) };
        node.next = head;
        node.prev = K::NONE;

        if head.is_some() {
            // Safety: head is occupied when is_some()
            unsafe { self.nodes.get_unchecked_mut(head) }.prev = slot;
        } else {
            self.tail = slot;
        }
        self.head = slot;
    }

    #[inline]
    fn link_after(&mut self, after: K, slot: K) {
        // Safety: after is a linked node
        let next = unsafe { self.nodes.get_unchecked(after) }.next;
        let node = unsafe { self.nodes.get_unchecked_mut(slot) };
        node.prev = after;
        node.next = next;

        unsafe { self.nodes.get_unchecked_mut(after) }.next = slot;
        if next.is_some() {
            // Safety: next is occupied when is_some()
            unsafe { self.nodes.get_unchecked_mut(next) }.prev = slot;
        } else {
            self.tail = slot;
        }
    }

    #[inline]
    fn link_before(&mut self, before: K, slot: K) {
        // Safety: before is a linked node
        let prev = unsafe { self.nodes.get_unchecked(before) }.prev;
        let node = unsafe { self.nodes.get_unchecked_mut(slot) };
        node.next = before;
        node.prev = prev;

        unsafe { self.nodes.get_unchecked_mut(before) }.prev = slot;
        if prev.is_some() {
            // Safety: prev is occupied when is_some()
            unsafe { self.nodes.get_unchecked_mut(prev) }.next = slot;
        } else {
            self.head = slot;
        }
    }

    #[inline]
    fn unlink(&mut self, slot: K) {
        // Safety: slot is a linked node
        let node = unsafe { self.nodes.get_unchecked_mut(slot) };
        let prev = node.prev;
        let next = node.next;
        node.prev = K::NONE;
        node.next = K::NONE;

        if prev.is_some() {
            // Safety: prev is occupied when is_some()
            unsafe { self.nodes.get_unchecked_mut(prev) }.next = next;
        } else {
            self.head = next;
        }

        if next.is_some() {
            // Safety: next is occupied when is_some()
            unsafe { self.nodes.get_unchecked_mut(next) }.prev = prev;
        } else {
            self.tail = prev;
        }
    }
}

impl<T, K: Key> Default for List<T, K> {
    fn default() -> Self {
        Self::keyed(0)
    }
}

impl<T: PartialEq, K: Key> PartialEq for List<T, K> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, K: Key> Eq for List<T, K> {}

impl<T, K: Key> FromIterator<T> for List<T, K> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut list = Self::keyed(iter.size_hint().0);
        list.extend(iter);
        list
    }
}

impl<T, K: Key> Extend<T> for List<T, K> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T: fmt::Display, K: Key> fmt::Display for List<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_seq(f, "", " ", self.iter())
    }
}

impl<T: fmt::Debug, K: Key> fmt::Debug for List<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T, K: Key> IntoIterator for &'a List<T, K> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Iterator over list values, front to back.
pub struct Iter<'a, T, K: Key> {
    nodes: &'a Arena<ListNode<T, K>, K>,
    front: K,
    back: K,
}

impl<'a, T, K: Key> Iterator for Iter<'a, T, K> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.front.is_none() {
            return None;
        }

        // Safety: list invariants guarantee front is occupied
        let node = unsafe { self.nodes.get_unchecked(self.front) };

        // Check if we've met in the middle
        if self.front == self.back {
            self.front = K::NONE;
            self.back = K::NONE;
        } else {
            self.front = node.next;
        }

        Some(&node.value)
    }
}

impl<'a, T, K: Key> DoubleEndedIterator for Iter<'a, T, K> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.back.is_none() {
            return None;
        }

        // Safety: list invariants guarantee back is occupied
        let node = unsafe { self.nodes.get_unchecked(self.back) };

        if self.front == self.back {
            self.front = K::NONE;
            self.back = K::NONE;
        } else {
            self.back = node.prev;
        }

        Some(&node.value)
    }
}

impl<T, K: Key> FusedIterator for Iter<'_, T, K> {}

/// Iterator over node handles, front to back.
pub struct Handles<'a, T, K: Key> {
    nodes: &'a Arena<ListNode<T, K>, K>,
    front: K,
    back: K,
}

impl<T, K: Key> Iterator for Handles<'_, T, K> {
    type Item = Handle<K>;

    #[inline]
    fn next(&mut self) -> Option<Handle<K>> {
        if self.front.is_none() {
            return None;
        }

        let slot = self.front;
        if self.front == self.back {
            self.front = K::NONE;
            self.back = K::NONE;
        } else {
            // Safety: list invariants guarantee front is occupied
            self.front = unsafe { self.nodes.get_unchecked(slot) }.next;
        }

        Some(self.nodes.handle_of(slot))
    }
}

impl<T, K: Key> DoubleEndedIterator for Handles<'_, T, K> {
    #[inline]
    fn next_back(&mut self) -> Option<Handle<K>> {
        if self.back.is_none() {
            return None;
        }

        let slot = self.back;
        if self.front == self.back {
            self.front = K::NONE;
            self.back = K::NONE;
        } else {
            // Safety: list invariants guarantee back is occupied
            self.back = unsafe { self.nodes.get_unchecked(slot) }.prev;
        }

        Some(self.nodes.handle_of(slot))
    }
}

impl<T, K: Key> FusedIterator for Handles<'_, T, K> {}

#[cfg(test)]
impl<T, K: Key> List<T, K> {
    /// Panics if links, ends or the node count disagree.
    pub(crate) fn assert_invariants(&self) {
        let mut count = 0;
        let mut prev = K::NONE;
        let mut cur = self.head;
        while cur.is_some() {
            let node = self.nodes.slot(cur).expect("dangling link");
            assert_eq!(node.prev, prev, "broken prev link");
            prev = cur;
            cur = node.next;
            count += 1;
        }
        assert_eq!(self.tail, prev, "tail mismatch");
        assert_eq!(count, self.len(), "count mismatch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_list_is_empty() {
        let list: List<u64> = List::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(list.front().is_none());
        assert!(list.back().is_none());
        assert!(list.front_handle().is_none());
    }

    #[test]
    fn push_back_multiple() {
        let mut list = List::new();

        let a = list.push_back(1u64);
        let b = list.push_back(2);
        let c = list.push_back(3);

        assert_eq!(list.len(), 3);
        assert_eq!(list.front_handle(), Some(a));
        assert_eq!(list.back_handle(), Some(c));
        assert_eq!(list.next(a), Some(b));
        assert_eq!(list.prev(c), Some(b));
        assert_eq!(list.prev(a), None);
        assert_eq!(list.next(c), None);
        list.assert_invariants();
    }

    #[test]
    fn push_front_multiple() {
        let mut list = List::new();

        list.push_front(1u64);
        list.push_front(2);
        list.push_front(3);

        assert_eq!(list.to_vec(), vec![3, 2, 1]);
        list.assert_invariants();
    }

    #[test]
    fn pop_front_and_back() {
        let mut list: List<u64> = (1..=3).collect();

        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_front(), None);
        assert_eq!(list.pop_back(), None);
        list.assert_invariants();
    }

    #[test]
    fn remove_middle() {
        let mut list = List::new();

        let a = list.push_back(1u64);
        let b = list.push_back(2);
        let c = list.push_back(3);

        assert_eq!(list.remove(b), Some(2));
        assert_eq!(list.len(), 2);
        assert_eq!(list.next(a), Some(c));
        assert_eq!(list.prev(c), Some(a));
        list.assert_invariants();
    }

    #[test]
    fn remove_ends_fix_head_and_tail() {
        let mut list = List::new();

        let a = list.push_back(1u64);
        let b = list.push_back(2);
        let c = list.push_back(3);

        assert_eq!(list.remove(a), Some(1));
        assert_eq!(list.front_handle(), Some(b));
        assert_eq!(list.remove(c), Some(3));
        assert_eq!(list.back_handle(), Some(b));
        assert_eq!(list.remove(b), Some(2));
        assert!(list.is_empty());
        list.assert_invariants();
    }

    #[test]
    fn remove_twice_is_noop() {
        let mut list = List::new();
        let a = list.push_back(1u64);
        list.push_back(2);

        assert_eq!(list.remove(a), Some(1));
        assert_eq!(list.remove(a), None);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn stale_handle_after_slot_reuse() {
        let mut list = List::new();
        let a = list.push_back(1u64);
        list.remove(a);

        let b = list.push_back(2);
        assert_eq!(a.slot(), b.slot());

        assert_eq!(list.get(a), None);
        assert_eq!(list.remove(a), None);
        list.move_to_front(a);
        assert_eq!(list.get(b), Some(&2));
        list.assert_invariants();
    }

    #[test]
    fn foreign_handle_rejected() {
        let mut left = List::new();
        let mut right = List::new();

        let l = left.push_back(1u64);
        right.push_back(2u64);

        assert_eq!(right.get(l), None);
        assert_eq!(right.remove(l), None);
        right.move_to_back(l);
        assert_eq!(right.to_vec(), vec![2]);
        assert_eq!(left.get(l), Some(&1));
    }

    #[test]
    fn get_and_get_mut() {
        let mut list = List::new();
        let a = list.push_back(String::from("a"));

        list.get_mut(a).unwrap().push('!');
        assert_eq!(list.get(a).map(String::as_str), Some("a!"));
        assert!(list.contains(a));
    }

    #[test]
    fn insert_after_and_before() {
        let mut list = List::new();

        let a = list.push_back(1u64);
        let c = list.push_back(3);
        let b = list.insert_after(Some(a), 2);
        list.insert_before(Some(a), 0);
        list.insert_after(Some(c), 4);

        assert_eq!(list.to_vec(), vec![0, 1, 2, 3, 4]);
        assert_eq!(list.next(a), Some(b));
        list.assert_invariants();
    }

    #[test]
    fn insert_without_anchor() {
        let mut list = List::new();

        list.insert_after(None, 2u64);
        list.insert_before(None, 1);
        list.insert_after(None, 3);

        assert_eq!(list.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn insert_with_stale_anchor_falls_back() {
        let mut list = List::new();

        let gone = list.push_back(0u64);
        list.remove(gone);
        list.push_back(1);

        list.insert_after(Some(gone), 2);
        list.insert_before(Some(gone), 0);

        assert_eq!(list.to_vec(), vec![0, 1, 2]);
        list.assert_invariants();
    }

    #[test]
    fn move_to_front() {
        let mut list = List::new();

        list.push_back(1u64);
        list.push_back(2);
        let c = list.push_back(3);

        list.move_to_front(c);
        assert_eq!(list.to_vec(), vec![3, 1, 2]);
        assert_eq!(list.front_handle(), Some(c));
        assert_eq!(list.get(c), Some(&3));
        list.assert_invariants();

        // Already at front
        list.move_to_front(c);
        assert_eq!(list.to_vec(), vec![3, 1, 2]);
    }

    #[test]
    fn move_to_back() {
        let mut list = List::new();

        let a = list.push_back(1u64);
        list.push_back(2);
        list.push_back(3);

        list.move_to_back(a);
        assert_eq!(list.to_vec(), vec![2, 3, 1]);
        assert_eq!(list.back_handle(), Some(a));
        list.assert_invariants();
    }

    #[test]
    fn move_single_node() {
        let mut list = List::new();
        let a = list.push_back(1u64);

        list.move_to_back(a);
        list.move_to_front(a);

        assert_eq!(list.to_vec(), vec![1]);
        list.assert_invariants();
    }

    #[test]
    fn find_first_match() {
        let list = List::from_slice(&[4, 7, 8, 9]);

        let h = list.find(|v| v % 2 == 1).unwrap();
        assert_eq!(list.get(h), Some(&7));
        assert!(list.find(|&v| v > 100).is_none());
    }

    #[test]
    fn reverse() {
        let mut list = List::from_slice(&[1, 2, 3]);
        let first = list.front_handle().unwrap();

        list.reverse();

        assert_eq!(list.to_vec(), vec![3, 2, 1]);
        assert_eq!(list.back_handle(), Some(first));
        list.assert_invariants();

        list.reverse();
        assert_eq!(list.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn reverse_empty_and_single() {
        let mut empty: List<u8> = List::new();
        empty.reverse();
        assert!(empty.is_empty());

        let mut single = List::from_slice(&[1]);
        single.reverse();
        assert_eq!(single.to_vec(), vec![1]);
        single.assert_invariants();
    }

    #[test]
    fn sort_ascending() {
        let mut list = List::from_slice(&[3, 1, 2]);
        list.sort();

        assert_eq!(list.to_vec(), vec![1, 2, 3]);
        list.assert_invariants();
    }

    #[test]
    fn sort_is_stable() {
        let mut list = List::from_slice(&[(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')]);
        list.sort_by(|a, b| a.0 < b.0);

        assert_eq!(list.to_vec(), vec![(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
    }

    #[test]
    fn sort_keeps_handles() {
        let mut list = List::new();
        let handles: Vec<_> = [5u32, 3, 9, 1].into_iter().map(|v| list.push_back(v)).collect();

        list.sort_by(|a, b| a > b);

        assert_eq!(list.to_vec(), vec![9, 5, 3, 1]);
        for (h, v) in handles.iter().zip([5, 3, 9, 1]) {
            assert_eq!(list.get(*h), Some(&v));
        }
        assert_eq!(list.front_handle(), Some(handles[2]));
        list.assert_invariants();
    }

    #[test]
    fn inconsistent_comparator_terminates() {
        let values: Vec<u32> = (0..200).collect();
        let mut list = List::from_slice(&values);
        let handles: Vec<_> = list.handles().collect();

        let mut flip = false;
        list.sort_by(|_, _| {
            flip = !flip;
            flip
        });

        let mut sorted = list.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, values);
        for (h, v) in handles.iter().zip(&values) {
            assert_eq!(list.get(*h), Some(v));
        }
        list.assert_invariants();
    }

    #[test]
    fn assign_replaces_contents() {
        let mut list = List::from_slice(&[9, 9]);
        let old = list.front_handle().unwrap();

        list.assign(&[1, 2]);

        assert_eq!(list.to_vec(), vec![1, 2]);
        assert!(!list.contains(old));
    }

    #[test]
    fn clear() {
        let mut list = List::new();

        let a = list.push_back(1u64);
        let b = list.push_back(2);
        list.clear();

        assert!(list.is_empty());
        assert!(list.front_handle().is_none());
        assert!(!list.contains(a));
        assert_eq!(list.remove(b), None);

        list.push_back(3);
        assert_eq!(list.to_vec(), vec![3]);
        list.assert_invariants();
    }

    #[test]
    fn iter_both_ends() {
        let list: List<u64> = (1..=5).collect();

        let mut iter = list.iter();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&5));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);

        let rev: Vec<_> = list.iter().rev().copied().collect();
        assert_eq!(rev, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn handles_iterator() {
        let mut list = List::new();
        let a = list.push_back(1u64);
        let b = list.push_back(2);

        assert_eq!(list.handles().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(list.handles().rev().collect::<Vec<_>>(), vec![b, a]);
    }

    #[test]
    fn equality() {
        let a: List<u64> = (1..=3).collect();
        let mut b = List::from_slice(&[3, 2, 1]);
        assert_ne!(a, b);

        b.reverse();
        assert_eq!(a, b);
    }

    #[test]
    fn display_and_debug() {
        let list = List::from_slice(&[1, 2, 3]);
        assert_eq!(list.to_string(), "[1 2 3]");
        assert_eq!(format!("{list:?}"), "[1, 2, 3]");

        let empty: List<u8> = List::new();
        assert_eq!(empty.to_string(), "[]");
    }

    #[test]
    fn narrow_key_is_bounded() {
        let mut list: List<u32, u8> = List::keyed(0);

        for i in 0..255 {
            list.try_push_back(i).unwrap();
        }

        let err = list.try_push_front(999).unwrap_err();
        assert_eq!(err.into_inner(), 999);
        assert_eq!(list.len(), 255);
        list.assert_invariants();
    }

    #[test]
    fn drop_cleans_up() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        struct DropCounter;
        impl Drop for DropCounter {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        {
            let mut list = List::new();
            let a = list.push_back(DropCounter);
            list.push_back(DropCounter);
            list.push_back(DropCounter);
            drop(list.remove(a));
            assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 1);
        }

        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 3);
    }
}
