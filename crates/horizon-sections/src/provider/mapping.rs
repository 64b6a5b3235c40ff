//! Local/global section mapping.
//!
//! A [`SectionMapping`] translates between one child's local section numbers
//! and the slice of a container's global section space that child occupies.
//! It is owned by the container and rebuilt as a unit whenever the container
//! recomputes its layout; it is never patched incrementally.

use std::collections::HashMap;
use std::ops::Range;

use super::index::ItemPath;

/// Bidirectional mapping between a child's local sections and global sections.
///
/// Both directions are total bijections over `[0, section_count)` as of the
/// last [`rebuild`](SectionMapping::rebuild).
#[derive(Debug, Clone, Default)]
pub struct SectionMapping {
    /// Mapping from local section to global section.
    local_to_global: Vec<usize>,
    /// Mapping from global section to local section.
    global_to_local: HashMap<usize, usize>,
}

impl SectionMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of sections covered by the last rebuild.
    pub fn section_count(&self) -> usize {
        self.local_to_global.len()
    }

    /// Returns `true` if the last rebuild covered no sections.
    pub fn is_empty(&self) -> bool {
        self.local_to_global.is_empty()
    }

    /// Rebuilds the mapping for `section_count` local sections, assigning
    /// consecutive global sections starting at `starting_global`.
    ///
    /// `on_each_global` is called once per assigned global section, in order.
    /// Returns the number of sections assigned.
    ///
    /// # Panics
    ///
    /// Panics if two local sections would map to the same global section.
    pub fn rebuild<F>(&mut self, section_count: usize, starting_global: usize, mut on_each_global: F) -> usize
    where
        F: FnMut(usize),
    {
        self.local_to_global.clear();
        self.global_to_local.clear();
        self.local_to_global.reserve(section_count);

        for local in 0..section_count {
            let global = starting_global + local;
            let previous = self.global_to_local.insert(global, local);
            assert!(
                previous.is_none(),
                "global section {global} assigned to local sections {} and {local}",
                previous.unwrap_or_default()
            );
            self.local_to_global.push(global);
            on_each_global(global);
        }

        section_count
    }

    /// Returns the local section for `global`, if this mapping covers it.
    #[inline]
    pub fn local_for(&self, global: usize) -> Option<usize> {
        self.global_to_local.get(&global).copied()
    }

    /// Returns the global section for `local`.
    ///
    /// # Panics
    ///
    /// Panics if `local` is outside the last-built mapping.
    #[inline]
    pub fn global_for(&self, local: usize) -> usize {
        match self.local_to_global.get(local) {
            Some(&global) => global,
            None => panic!(
                "local section {local} is outside the mapping ({} sections)",
                self.local_to_global.len()
            ),
        }
    }

    /// Returns `true` if `global` belongs to this mapping.
    #[inline]
    pub fn contains_global(&self, global: usize) -> bool {
        self.global_to_local.contains_key(&global)
    }

    /// Returns the global range this mapping occupies.
    ///
    /// The range is empty (and starts at 0) for an empty mapping.
    pub fn global_range(&self) -> Range<usize> {
        match (self.local_to_global.first(), self.local_to_global.last()) {
            (Some(&first), Some(&last)) => first..last + 1,
            _ => 0..0,
        }
    }

    /// Returns every global section this mapping occupies, in local order.
    pub fn global_sections_all(&self) -> Vec<usize> {
        self.local_to_global.clone()
    }

    // -------------------------------------------------------------------------
    // Path translation
    // -------------------------------------------------------------------------

    /// Translates a global path to local coordinates.
    pub fn local_path(&self, global: ItemPath) -> Option<ItemPath> {
        self.local_for(global.section())
            .map(|section| global.with_section(section))
    }

    /// Translates a local path to global coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the path's section is outside the mapping.
    pub fn global_path(&self, local: ItemPath) -> ItemPath {
        local.with_section(self.global_for(local.section()))
    }

    /// Translates global paths to local ones, dropping those this mapping
    /// does not cover. Input order is preserved.
    pub fn local_paths(&self, global: &[ItemPath]) -> Vec<ItemPath> {
        global.iter().filter_map(|&path| self.local_path(path)).collect()
    }

    /// Translates local paths to global ones. Input order is preserved.
    pub fn global_paths(&self, local: &[ItemPath]) -> Vec<ItemPath> {
        local.iter().map(|&path| self.global_path(path)).collect()
    }

    /// Translates global sections to local ones, dropping those this mapping
    /// does not cover. Input order is preserved.
    pub fn local_sections(&self, global: &[usize]) -> Vec<usize> {
        global.iter().filter_map(|&section| self.local_for(section)).collect()
    }

    /// Translates local sections to global ones. Input order is preserved.
    pub fn global_sections(&self, local: &[usize]) -> Vec<usize> {
        local.iter().map(|&section| self.global_for(section)).collect()
    }
}
