//! Item addressing.
//!
//! An [`ItemPath`] names one item by section and position within that
//! section. Paths are plain values: they carry no reference to the provider
//! that produced them, and are only meaningful relative to the coordinate
//! space (local or global) and the snapshot they were produced in.

use std::fmt;

/// Identifies an item by section and item position.
///
/// Ordering is section-major, then by item.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ItemPath {
    section: usize,
    item: usize,
}

impl ItemPath {
    /// Creates a path addressing `item` within `section`.
    #[inline]
    pub const fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }

    /// Returns the section component.
    #[inline]
    pub const fn section(&self) -> usize {
        self.section
    }

    /// Returns the item component.
    #[inline]
    pub const fn item(&self) -> usize {
        self.item
    }

    /// Returns a path with the same item position in another section.
    ///
    /// This is the primitive used when re-basing a path between coordinate
    /// spaces: only the section ever changes.
    #[inline]
    pub const fn with_section(&self, section: usize) -> Self {
        Self {
            section,
            item: self.item,
        }
    }

    /// Returns a path to another item in the same section.
    #[inline]
    pub const fn with_item(&self, item: usize) -> Self {
        Self {
            section: self.section,
            item,
        }
    }
}

impl From<(usize, usize)> for ItemPath {
    fn from((section, item): (usize, usize)) -> Self {
        Self::new(section, item)
    }
}

impl fmt::Debug for ItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemPath({}, {})", self.section, self.item)
    }
}

impl fmt::Display for ItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.item)
    }
}
