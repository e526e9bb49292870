//! Compact slot index type with a reserved sentinel.
//!
//! Node links and handles store slot indices as a [`Key`] instead of
//! `Option<usize>`, keeping nodes small. The largest value of the type is
//! reserved as `NONE`.

use core::fmt::Debug;
use core::hash::Hash;

/// Slot index type used for handles and node links.
///
/// Provides a sentinel value (`NONE`) and conversion to/from `usize`.
/// The sentinel can never be handed out as a real slot, so a container
/// keyed by `u16` holds at most `u16::MAX` entries.
///
/// # Example
///
/// ```
/// use nexus_containers::Key;
///
/// let key: u32 = 42;
/// assert!(key.is_some());
/// assert!(u32::NONE.is_none());
/// assert_eq!(u32::from_usize(7).as_usize(), 7);
/// ```
pub trait Key: Copy + Eq + Hash + Debug {
    /// Sentinel value representing "no slot" (e.g. the link past the tail).
    const NONE: Self;

    /// Creates a key from a `usize` slot index.
    fn from_usize(val: usize) -> Self;

    /// Returns the key as a `usize` slot index.
    fn as_usize(self) -> usize;

    /// Returns `true` if this is the sentinel value.
    #[inline]
    fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Returns `true` if this is NOT the sentinel value.
    #[inline]
    fn is_some(self) -> bool {
        !self.is_none()
    }
}

macro_rules! impl_key_for_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Key for $ty {
                const NONE: Self = <$ty>::MAX;

                #[inline]
                fn from_usize(val: usize) -> Self {
                    val as Self
                }

                #[inline]
                fn as_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_key_for_unsigned!(u8, u16, u32, u64, usize);
