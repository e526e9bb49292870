//! Generational slot storage with stable, checkable handles.
//!
//! Values live in a `slab::Slab`, so slots are reused and indices stay
//! stable until removal. Alongside the slab, every slot carries a
//! generation that is bumped whenever its value is removed, and every
//! arena carries a process-unique id. A [`Handle`] captures all three, so
//! a handle outliving its value, or one minted by a different arena, never
//! resolves.
//!
//! Both [`PriorityQueue`](crate::PriorityQueue) and [`List`](crate::List)
//! keep their entries in an [`Arena`]; link fields and heap slots refer to
//! raw slot keys, while callers only ever see handles.

use core::fmt;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicU32, Ordering};

use slab::Slab;
use tracing::trace;

use crate::Key;

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(0);

/// Stable reference to a value stored in an [`Arena`].
///
/// Handles are plain `Copy` values. They do not keep the value alive;
/// resolving one after its value was removed yields `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle<K: Key = u32> {
    slot: K,
    generation: u32,
    arena: u32,
}

impl<K: Key> Handle<K> {
    /// Returns the slot index this handle points at.
    ///
    /// Slots are reused, so two handles may share a slot while only the
    /// newer one resolves.
    #[inline]
    pub fn slot(&self) -> K {
        self.slot
    }

    /// Returns the slot generation captured when the handle was created.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Error returned when an arena has no slot index left to hand out.
///
/// Carries the rejected value back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be inserted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key space exhausted")
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}

/// Growable slot storage handing out generational [`Handle`]s.
///
/// # Example
///
/// ```
/// use nexus_containers::Arena;
///
/// let mut arena: Arena<&str> = Arena::new();
/// let a = arena.insert("first");
/// assert_eq!(arena.get(a), Some(&"first"));
///
/// assert_eq!(arena.remove(a), Some("first"));
///
/// // The slot is reused, the old handle is not.
/// let b = arena.insert("second");
/// assert_eq!(a.slot(), b.slot());
/// assert_eq!(arena.get(a), None);
/// assert_eq!(arena.get(b), Some(&"second"));
/// ```
pub struct Arena<T, K: Key = u32> {
    slots: Slab<T>,
    /// Generation per slot ever handed out, indexed like `slots`.
    generations: Vec<u32>,
    id: u32,
    _key: PhantomData<K>,
}

impl<T, K: Key> Arena<T, K> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an arena with room for `capacity` values before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Slab::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            _key: PhantomData,
        }
    }

    /// Returns the number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no values are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the number of values the arena can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Inserts a value, returning its handle.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the next slot index would collide with
    /// `K::NONE`.
    pub fn try_insert(&mut self, value: T) -> Result<Handle<K>, Full<T>> {
        let entry = self.slots.vacant_entry();
        let slot = entry.key();
        if slot >= K::NONE.as_usize() {
            return Err(Full(value));
        }

        entry.insert(value);
        if slot == self.generations.len() {
            self.generations.push(0);
        }

        Ok(Handle {
            slot: K::from_usize(slot),
            generation: self.generations[slot],
            arena: self.id,
        })
    }

    /// Inserts a value, returning its handle.
    ///
    /// # Panics
    ///
    /// Panics if the key type has no slot index left.
    pub fn insert(&mut self, value: T) -> Handle<K> {
        match self.try_insert(value) {
            Ok(handle) => handle,
            Err(_) => panic!("arena key space exhausted"),
        }
    }

    /// Removes and returns the value behind `handle`.
    ///
    /// Returns `None` for stale or foreign handles.
    pub fn remove(&mut self, handle: Handle<K>) -> Option<T> {
        self.resolve(handle)?;
        self.remove_slot(handle.slot)
    }

    /// Returns a reference to the value behind `handle`.
    #[inline]
    pub fn get(&self, handle: Handle<K>) -> Option<&T> {
        let slot = self.resolve(handle)?;
        self.slots.get(slot)
    }

    /// Returns a mutable reference to the value behind `handle`.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle<K>) -> Option<&mut T> {
        let slot = self.resolve(handle)?;
        self.slots.get_mut(slot)
    }

    /// Returns `true` if `handle` still resolves in this arena.
    #[inline]
    pub fn contains(&self, handle: Handle<K>) -> bool {
        self.resolve(handle).is_some()
    }

    /// Drops every value. All outstanding handles become stale.
    pub fn clear(&mut self) {
        let dropped = self.slots.len();
        for (slot, _) in self.slots.iter() {
            self.generations[slot] = self.generations[slot].wrapping_add(1);
        }
        self.slots.clear();
        trace!(arena = self.id, dropped, "arena cleared");
    }

    // ========================================================================
    // Slot-level access for containers linking entries by raw key
    // ========================================================================

    /// Returns the handle currently valid for an occupied `slot`.
    #[inline]
    pub(crate) fn handle_of(&self, slot: K) -> Handle<K> {
        Handle {
            slot,
            generation: self.generations[slot.as_usize()],
            arena: self.id,
        }
    }

    #[inline]
    pub(crate) fn slot(&self, slot: K) -> Option<&T> {
        self.slots.get(slot.as_usize())
    }

    #[inline]
    pub(crate) fn remove_slot(&mut self, slot: K) -> Option<T> {
        let i = slot.as_usize();
        let value = self.slots.try_remove(i)?;
        self.generations[i] = self.generations[i].wrapping_add(1);
        Some(value)
    }

    /// # Safety
    ///
    /// `slot` must be occupied.
    #[inline]
    pub(crate) unsafe fn get_unchecked(&self, slot: K) -> &T {
        unsafe { self.slots.get_unchecked(slot.as_usize()) }
    }

    /// # Safety
    ///
    /// `slot` must be occupied.
    #[inline]
    pub(crate) unsafe fn get_unchecked_mut(&mut self, slot: K) -> &mut T {
        unsafe { self.slots.get_unchecked_mut(slot.as_usize()) }
    }

    #[inline]
    fn resolve(&self, handle: Handle<K>) -> Option<usize> {
        if handle.arena != self.id {
            return None;
        }
        let slot = handle.slot.as_usize();
        let live = self.generations.get(slot) == Some(&handle.generation)
            && self.slots.contains(slot);
        live.then_some(slot)
    }
}

impl<T, K: Key> Default for Arena<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, K: Key> fmt::Debug for Arena<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("len", &self.slots.len())
            .finish_non_exhaustive()
    }
}
