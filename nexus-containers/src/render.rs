//! Bracketed sequence rendering shared by the containers' `Display` impls.

use core::fmt;

/// Writes `{prefix}[a{sep}b{sep}c]`, formatting each item with `Display`.
///
/// Formatter flags (width, precision) apply to every item.
pub(crate) fn write_seq<I>(
    f: &mut fmt::Formatter<'_>,
    prefix: &str,
    sep: &str,
    items: I,
) -> fmt::Result
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    f.write_str(prefix)?;
    f.write_str("[")?;
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        fmt::Display::fmt(&item, f)?;
    }
    f.write_str("]")
}
