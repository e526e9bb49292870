//! Handle-addressed containers: a priority queue, a deque and a linked list.
//!
//! Three independent, single-threaded containers:
//!
//! | Structure | Use Case | Key Operations |
//! |-----------|----------|----------------|
//! | [`PriorityQueue`] | Schedulers, timers | O(log n) push/pop, O(log n) remove by handle |
//! | [`Deque`] | FIFO/LIFO buffers | O(1) amortized push/pop at both ends |
//! | [`List`] | LRU caches, intrusive queues | O(1) insert/remove/move by handle |
//!
//! # Handles
//!
//! The priority queue and the list keep their entries in an [`Arena`] and
//! return a [`Handle`] on insertion. A handle is a small `Copy` value that
//! names a slot, the slot's generation, and the arena that minted it:
//!
//! ```text
//! Handle { slot, generation, arena }
//!     slot        index into the arena's slab
//!     generation  bumped whenever the slot is vacated
//!     arena       process-unique id of the owning container
//! ```
//!
//! Using a handle after its entry is gone, or on the wrong container, is
//! never undefined behavior: lookups return `None` and mutations are no-ops.
//!
//! ```
//! use nexus_containers::{List, PriorityQueue};
//!
//! let mut timers = PriorityQueue::min();
//! let t = timers.push(250u64);
//! timers.push(100);
//!
//! // Cancel by handle
//! assert_eq!(timers.remove(t), Some(250));
//! assert_eq!(timers.remove(t), None);
//!
//! // A handle from another container never resolves
//! let mut list = List::new();
//! list.push_back(1u64);
//! let other: List<u64> = List::new();
//! assert_eq!(other.get(list.front_handle().unwrap()), None);
//! ```
//!
//! # Key Width
//!
//! Slot indices are stored as a [`Key`], `u32` by default. A narrower key
//! shrinks handles and node links at the cost of capacity; `K::MAX` is
//! reserved as the "no slot" sentinel. Exhausting the key space is the only
//! failure an insertion can report, via [`Full`] from the `try_*` variants.
//!
//! # Logging
//!
//! The containers emit `tracing` events at `TRACE` level when a stale
//! handle is rejected, the deque grows, or a container is cleared. Nothing
//! is recorded unless the application installs a subscriber.

#![warn(missing_docs)]

pub mod deque;
pub mod heap;
pub mod key;
pub mod list;
mod render;
pub mod storage;

pub use deque::Deque;
pub use heap::PriorityQueue;
pub use key::Key;
pub use list::List;
pub use storage::{Arena, Full, Handle};
