//! Double-ended queue over a growable power-of-two ring buffer.

use core::fmt;
use core::iter::FusedIterator;
use core::mem::MaybeUninit;

use tracing::trace;

use crate::render::write_seq;

const MIN_CAPACITY: usize = 4;

/// A double-ended queue with amortized O(1) push and pop at both ends.
///
/// Elements sit in a ring buffer whose capacity is always a power of two.
/// A full buffer doubles and re-lays its elements from the front. Exactly
/// the `len` slots starting at `head` (modulo capacity) are initialized.
///
/// # Example
///
/// ```
/// use nexus_containers::Deque;
///
/// let mut deque = Deque::new();
/// deque.push_back(10);
/// deque.push_back(20);
/// deque.push_front(5);
///
/// assert_eq!(deque.len(), 3);
/// assert_eq!(deque.pop_front(), Some(5));
/// assert_eq!(deque.pop_back(), Some(20));
/// assert_eq!(deque.to_string(), "Deque [10]");
/// ```
pub struct Deque<T> {
    buf: Box<[MaybeUninit<T>]>,
    /// Physical index of the front element.
    head: usize,
    len: usize,
    /// `buf.len() - 1`, or 0 before the first allocation.
    mask: usize,
}

impl<T> Deque<T> {
    /// Creates an empty deque without allocating.
    pub fn new() -> Self {
        Self {
            buf: Box::new([]),
            head: 0,
            len: 0,
            mask: 0,
        }
    }

    /// Creates a deque that holds at least `capacity` elements before
    /// growing.
    ///
    /// The capacity is rounded up to a power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            return Self::new();
        }
        let capacity = capacity.next_power_of_two().max(MIN_CAPACITY);
        Self {
            buf: empty_slots(capacity),
            head: 0,
            len: 0,
            mask: capacity - 1,
        }
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the deque holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of elements the deque holds before growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Appends a value at the back.
    pub fn push_back(&mut self, value: T) {
        if self.len == self.buf.len() {
            self.grow();
        }
        let idx = (self.head + self.len) & self.mask;
        self.buf[idx].write(value);
        self.len += 1;
    }

    /// Prepends a value at the front.
    pub fn push_front(&mut self, value: T) {
        if self.len == self.buf.len() {
            self.grow();
        }
        self.head = self.head.wrapping_sub(1) & self.mask;
        self.buf[self.head].write(value);
        self.len += 1;
    }

    /// Removes and returns the front element.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        // Safety: the front slot is initialized and leaves the live range
        let value = unsafe { self.buf[self.head].assume_init_read() };
        self.head = (self.head + 1) & self.mask;
        self.len -= 1;
        Some(value)
    }

    /// Removes and returns the back element.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // Safety: the back slot is initialized and leaves the live range
        Some(unsafe { self.buf[(self.head + self.len) & self.mask].assume_init_read() })
    }

    /// Returns the front element.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns the back element.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.get(self.len.checked_sub(1)?)
    }

    /// Returns a mutable reference to the front element.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Returns a mutable reference to the back element.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.get_mut(self.len.checked_sub(1)?)
    }

    /// Returns the element `index` positions from the front.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        // Safety: index < len, so the slot is initialized
        Some(unsafe { self.buf[(self.head + index) & self.mask].assume_init_ref() })
    }

    /// Returns a mutable reference to the element `index` positions from the
    /// front.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        // Safety: index < len, so the slot is initialized
        Some(unsafe { self.buf[(self.head + index) & self.mask].assume_init_mut() })
    }

    /// Drops every element, keeping the allocation.
    pub fn clear(&mut self) {
        let dropped = self.len;
        while self.pop_back().is_some() {}
        self.head = 0;
        trace!(dropped, "deque cleared");
    }

    /// Iterates from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            deque: self,
            front: 0,
            back: self.len,
        }
    }

    /// Alias for [`push_back`](Self::push_back), for stack-style use.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.push_back(value);
    }

    /// Alias for [`pop_back`](Self::pop_back), for stack-style use.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.pop_back()
    }

    /// Alias for [`back`](Self::back), for stack-style use.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.back()
    }

    #[cold]
    fn grow(&mut self) {
        let old_capacity = self.buf.len();
        let new_capacity = (old_capacity * 2).max(MIN_CAPACITY);

        let mut buf = empty_slots(new_capacity);
        for (i, slot) in buf.iter_mut().take(self.len).enumerate() {
            // Safety: i < len; the old buffer is freed without dropping slots
            slot.write(unsafe { self.buf[(self.head + i) & self.mask].assume_init_read() });
        }

        self.buf = buf;
        self.head = 0;
        self.mask = new_capacity - 1;
        trace!(old_capacity, new_capacity, "deque grew");
    }
}

fn empty_slots<T>(capacity: usize) -> Box<[MaybeUninit<T>]> {
    (0..capacity).map(|_| MaybeUninit::uninit()).collect()
}

impl<T> Drop for Deque<T> {
    fn drop(&mut self) {
        for i in 0..self.len {
            let idx = (self.head + i) & self.mask;
            // Safety: i < len, so the slot is initialized and dropped once
            unsafe { self.buf[idx].assume_init_drop() };
        }
    }
}

impl<T: Clone> Clone for Deque<T> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T> Default for Deque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> PartialEq for Deque<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Deque<T> {}

impl<T> FromIterator<T> for Deque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut deque = Self::with_capacity(iter.size_hint().0);
        deque.extend(iter);
        deque
    }
}

impl<T> Extend<T> for Deque<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T: fmt::Display> fmt::Display for Deque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_seq(f, "Deque ", ", ", self.iter())
    }
}

impl<T: fmt::Debug> fmt::Debug for Deque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a Deque<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for Deque<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { deque: self }
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Borrowing iterator over a [`Deque`], front to back.
pub struct Iter<'a, T> {
    deque: &'a Deque<T>,
    /// Logical index of the next front element.
    front: usize,
    /// One past the logical index of the next back element.
    back: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let value = self.deque.get(self.front);
        self.front += 1;
        value
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.deque.get(self.back)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Owning iterator over a [`Deque`], front to back.
pub struct IntoIter<T> {
    deque: Deque<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.deque.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.deque.len, Some(self.deque.len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.deque.pop_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}


#[cfg(test)]
mod bench_deque {
    use super::*;
    use hdrhistogram::Histogram;

    #[inline]
    fn rdtscp() -> u64 {
        #[cfg(target_arch = "x86_64")]
        unsafe {
            core::arch::x86_64::__rdtscp(&mut 0)
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            std::time::Instant::now().elapsed().as_nanos() as u64
        }
    }

    fn print_histogram(name: &str, hist: &Histogram<u64>) {
        println!(
            "{:24} p50: {:4} cycles | p99: {:4} cycles | p999: {:5} cycles | min: {:4} | max: {:5}",
            name,
            hist.value_at_quantile(0.50),
            hist.value_at_quantile(0.99),
            hist.value_at_quantile(0.999),
            hist.min(),
            hist.max(),
        );
    }

    const WARMUP: usize = 10_000;
    const ITERATIONS: usize = 100_000;

    #[test]
    #[ignore]
    fn bench_deque_push_pop() {
        let mut deque: Deque<u64> = Deque::with_capacity(1024);
        let mut push_hist = Histogram::<u64>::new(3).unwrap();
        let mut pop_hist = Histogram::<u64>::new(3).unwrap();

        for i in 0..WARMUP {
            deque.push_back(i as u64);
            let _ = deque.pop_front();
        }

        for i in 0..ITERATIONS {
            let start = rdtscp();
            deque.push_back(i as u64);
            let elapsed = rdtscp() - start;
            push_hist.record(elapsed).unwrap();

            let start = rdtscp();
            std::hint::black_box(deque.pop_front());
            let elapsed = rdtscp() - start;
            pop_hist.record(elapsed).unwrap();
        }

        println!("\nDeque<u64>");
        print_histogram("push_back", &push_hist);
        print_histogram("pop_front", &pop_hist);
    }
}
