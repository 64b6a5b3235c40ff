//! Leaf provider implementation.
//!
//! `LeafProvider<T>` owns its items directly, grouped into sections. Every
//! mutation updates the data first, releases the lock, and then announces the
//! change in local coordinates, so an observer that queries back during the
//! notification sees the new state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use horizon_sections_core::LoadError;
use horizon_sections_core::logging::targets;

use super::base::ProviderBase;
use super::index::ItemPath;
use super::loading::{LoadState, LoadTicket};
use super::traits::{Provider, ProviderItem, ProviderKind, panic_section_out_of_range};

/// Type alias for a content loader.
///
/// The loader receives a ticket for the load it should perform and completes
/// it, now or later, on the provider's thread.
pub type ContentLoader<T> = Arc<dyn Fn(LoadTicket<T>) + Send + Sync>;

/// A provider that owns sections of items.
///
/// # Example
///
/// ```
/// use horizon_sections::{ItemPath, LeafProvider, Provider};
///
/// let fruits = LeafProvider::new(vec![
///     vec!["apple".to_string(), "pear".to_string()],
///     vec!["plum".to_string()],
/// ]);
///
/// assert_eq!(fruits.section_count(), 2);
/// assert_eq!(fruits.item_at(ItemPath::new(1, 0)).as_deref(), Some("plum"));
///
/// fruits.push_item(1, "cherry".to_string());
/// assert_eq!(fruits.item_count(1), 2);
/// ```
pub struct LeafProvider<T: ProviderItem> {
    base: ProviderBase<T>,
    this: Weak<LeafProvider<T>>,
    sections: RwLock<Vec<Vec<T>>>,
    loader: Option<ContentLoader<T>>,
    load_generation: AtomicU64,
}

impl<T: ProviderItem> LeafProvider<T> {
    /// Creates a leaf provider with the given sections.
    pub fn new(sections: Vec<Vec<T>>) -> Arc<Self> {
        Self::builder().sections(sections).build()
    }

    /// Creates an empty leaf provider.
    pub fn empty() -> Arc<Self> {
        Self::builder().build()
    }

    /// Returns a builder for configuring a leaf provider.
    pub fn builder() -> LeafProviderBuilder<T> {
        LeafProviderBuilder::new()
    }

    fn from_builder(builder: LeafProviderBuilder<T>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<LeafProvider<T>>| {
            let this: Weak<dyn Provider<Item = T>> = weak.clone();
            Self {
                base: ProviderBase::new(ProviderKind::Leaf, this)
                    .with_title(builder.title)
                    .with_selection(builder.allows_selection),
                this: weak.clone(),
                sections: RwLock::new(builder.sections),
                loader: builder.loader,
                load_generation: AtomicU64::new(0),
            }
        })
    }

    /// Replaces the title.
    pub fn set_title(&self, title: impl Into<String>) {
        self.base.set_title(Some(title.into()));
    }

    /// Sets whether items of this provider can be selected.
    pub fn set_allows_selection(&self, allows_selection: bool) {
        self.base.set_allows_selection(allows_selection);
    }

    /// Returns a copy of all sections.
    pub fn sections(&self) -> Vec<Vec<T>> {
        self.sections.read().clone()
    }

    /// Returns `true` if the provider holds no items at all.
    pub fn is_empty(&self) -> bool {
        self.sections.read().iter().all(Vec::is_empty)
    }

    // -------------------------------------------------------------------------
    // Section mutations
    // -------------------------------------------------------------------------

    /// Replaces all content and announces a reload.
    pub fn set_sections(&self, sections: Vec<Vec<T>>) {
        self.base.check_thread("set_sections");
        *self.sections.write() = sections;
        self.base.notify_reloaded();
    }

    /// Appends a section, returning its index.
    pub fn push_section(&self, items: Vec<T>) -> usize {
        let index = self.section_count();
        self.insert_section(index, items);
        index
    }

    /// Inserts a section at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > section_count()`.
    pub fn insert_section(&self, index: usize, items: Vec<T>) {
        self.base.check_thread("insert_section");
        {
            let mut sections = self.sections.write();
            if index > sections.len() {
                panic_section_out_of_range(self.base.id(), index, sections.len());
            }
            sections.insert(index, items);
        }
        self.base.notify_sections_inserted(vec![index]);
    }

    /// Removes and returns the section at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= section_count()`.
    pub fn remove_section(&self, index: usize) -> Vec<T> {
        self.base.check_thread("remove_section");
        let removed = {
            let mut sections = self.sections.write();
            if index >= sections.len() {
                panic_section_out_of_range(self.base.id(), index, sections.len());
            }
            sections.remove(index)
        };
        self.base.notify_sections_removed(vec![index]);
        removed
    }

    /// Announces that the section at `index` changed in place.
    ///
    /// # Panics
    ///
    /// Panics if `index >= section_count()`.
    pub fn refresh_section(&self, index: usize) {
        self.base.check_thread("refresh_section");
        self.assert_section(index);
        self.base.notify_sections_refreshed(vec![index]);
    }

    /// Moves the section at `from` so that it ends up at `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn move_section(&self, from: usize, to: usize) {
        self.base.check_thread("move_section");
        {
            let mut sections = self.sections.write();
            let count = sections.len();
            for index in [from, to] {
                if index >= count {
                    panic_section_out_of_range(self.base.id(), index, count);
                }
            }
            if from == to {
                return;
            }
            let section = sections.remove(from);
            sections.insert(to, section);
        }
        self.base.notify_section_moved(from, to);
    }

    // -------------------------------------------------------------------------
    // Item mutations
    // -------------------------------------------------------------------------

    /// Appends an item to `section`, returning its path.
    ///
    /// # Panics
    ///
    /// Panics if `section >= section_count()`.
    pub fn push_item(&self, section: usize, item: T) -> ItemPath {
        self.assert_section(section);
        let path = ItemPath::new(section, self.item_count(section));
        self.insert_item(path, item);
        path
    }

    /// Inserts an item at `path`.
    ///
    /// # Panics
    ///
    /// Panics if the section does not exist or the item position is past the
    /// end of the section.
    pub fn insert_item(&self, path: ItemPath, item: T) {
        self.base.check_thread("insert_item");
        {
            let mut sections = self.sections.write();
            let section = self.section_mut(&mut sections, path.section());
            if path.item() > section.len() {
                panic_item_out_of_range(path, section.len());
            }
            section.insert(path.item(), item);
        }
        self.base.notify_items_inserted(vec![path]);
    }

    /// Removes and returns the item at `path`.
    ///
    /// # Panics
    ///
    /// Panics if `path` does not address an item.
    pub fn remove_item(&self, path: ItemPath) -> T {
        self.base.check_thread("remove_item");
        let removed = {
            let mut sections = self.sections.write();
            let section = self.section_mut(&mut sections, path.section());
            if path.item() >= section.len() {
                panic_item_out_of_range(path, section.len());
            }
            section.remove(path.item())
        };
        self.base.notify_items_removed(vec![path]);
        removed
    }

    /// Replaces the item at `path`, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `path` does not address an item.
    pub fn replace_item(&self, path: ItemPath, item: T) -> T {
        self.base.check_thread("replace_item");
        let previous = {
            let mut sections = self.sections.write();
            let section = self.section_mut(&mut sections, path.section());
            match section.get_mut(path.item()) {
                Some(slot) => std::mem::replace(slot, item),
                None => panic_item_out_of_range(path, section.len()),
            }
        };
        self.base.notify_items_refreshed(vec![path]);
        previous
    }

    /// Moves the item at `from` so that it ends up at `to`.
    ///
    /// `to` is interpreted after the item has been removed from `from`.
    ///
    /// # Panics
    ///
    /// Panics if either path is out of range.
    pub fn move_item(&self, from: ItemPath, to: ItemPath) {
        self.base.check_thread("move_item");
        {
            let mut sections = self.sections.write();
            let source = self.section_mut(&mut sections, from.section());
            if from.item() >= source.len() {
                panic_item_out_of_range(from, source.len());
            }
            let item = source.remove(from.item());
            let target = self.section_mut(&mut sections, to.section());
            if to.item() > target.len() {
                panic_item_out_of_range(to, target.len());
            }
            target.insert(to.item(), item);
        }
        self.base.notify_item_moved(from, to);
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Completes the load identified by `generation`.
    pub(crate) fn finish_load(&self, generation: u64, result: Result<Vec<Vec<T>>, LoadError>) -> bool {
        self.base.check_thread("finish_load");
        let current = self.load_generation.load(Ordering::SeqCst);
        if generation != current {
            tracing::trace!(
                target: targets::LEAF,
                provider = %self.base.id(),
                generation,
                current,
                "ignoring superseded load"
            );
            return false;
        }

        match result {
            Ok(sections) => {
                let next = if sections.iter().all(Vec::is_empty) {
                    LoadState::NoContent
                } else {
                    LoadState::Loaded
                };
                if self.base.transition_load_state(next).is_err() {
                    return false;
                }
                *self.sections.write() = sections;
                self.base.notify_reloaded();
                self.base.notify_loaded(None);
            }
            Err(error) => {
                tracing::warn!(
                    target: targets::LEAF,
                    provider = %self.base.id(),
                    %error,
                    "content load failed"
                );
                if self
                    .base
                    .transition_load_state(LoadState::Error(error.clone()))
                    .is_err()
                {
                    return false;
                }
                self.base.notify_loaded(Some(error));
            }
        }
        true
    }

    fn assert_section(&self, section: usize) {
        let count = self.sections.read().len();
        if section >= count {
            panic_section_out_of_range(self.base.id(), section, count);
        }
    }

    fn section_mut<'a>(&self, sections: &'a mut [Vec<T>], section: usize) -> &'a mut Vec<T> {
        let count = sections.len();
        match sections.get_mut(section) {
            Some(items) => items,
            None => panic_section_out_of_range(self.base.id(), section, count),
        }
    }
}

#[cold]
#[inline(never)]
fn panic_item_out_of_range(path: ItemPath, count: usize) -> ! {
    panic!("item path {path} is out of range (section holds {count} items)")
}

impl<T: ProviderItem> Provider for LeafProvider<T> {
    type Item = T;

    fn base(&self) -> &ProviderBase<T> {
        &self.base
    }

    fn section_count(&self) -> usize {
        self.sections.read().len()
    }

    fn item_count(&self, section: usize) -> usize {
        let sections = self.sections.read();
        match sections.get(section) {
            Some(items) => items.len(),
            None => panic_section_out_of_range(self.base.id(), section, sections.len()),
        }
    }

    fn item_at(&self, path: ItemPath) -> Option<T> {
        self.sections
            .read()
            .get(path.section())
            .and_then(|items| items.get(path.item()))
            .cloned()
    }

    fn paths_for(&self, item: &T) -> Vec<ItemPath> {
        self.sections
            .read()
            .iter()
            .enumerate()
            .flat_map(|(section, items)| {
                items
                    .iter()
                    .enumerate()
                    .filter(|(_, candidate)| *candidate == item)
                    .map(move |(index, _)| ItemPath::new(section, index))
            })
            .collect()
    }

    fn became_active(&self) {
        if self.loader.is_some() && matches!(self.base.load_state(), LoadState::Initial) {
            self.load_content();
        }
    }

    fn load_content(&self) {
        self.base.check_thread("load_content");
        let Some(loader) = self.loader.clone() else {
            tracing::trace!(target: targets::LEAF, provider = %self.base.id(), "no loader configured");
            return;
        };

        let next = self.base.load_state().loading_successor();
        if self.base.transition_load_state(next).is_err() {
            return;
        }
        let generation = self.load_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.base.notify_will_load();
        loader(LoadTicket::new(self.this.clone(), generation));
    }

    fn reset_content(&self) {
        self.base.check_thread("reset_content");
        self.load_generation.fetch_add(1, Ordering::SeqCst);
        self.sections.write().clear();
        let _ = self.base.transition_load_state(LoadState::Initial);
        self.base.notify_reloaded();
    }
}

impl<T: ProviderItem> fmt::Debug for LeafProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafProvider")
            .field("base", &self.base)
            .field("sections", &self.sections.read().len())
            .field("has_loader", &self.loader.is_some())
            .finish()
    }
}

/// Builder for [`LeafProvider`].
pub struct LeafProviderBuilder<T: ProviderItem> {
    title: Option<String>,
    allows_selection: bool,
    sections: Vec<Vec<T>>,
    loader: Option<ContentLoader<T>>,
}

impl<T: ProviderItem> Default for LeafProviderBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ProviderItem> LeafProviderBuilder<T> {
    /// Creates a builder for an empty, selectable, untitled provider.
    pub fn new() -> Self {
        Self {
            title: None,
            allows_selection: true,
            sections: Vec::new(),
            loader: None,
        }
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets whether items can be selected.
    pub fn selectable(mut self, allows_selection: bool) -> Self {
        self.allows_selection = allows_selection;
        self
    }

    /// Sets the initial sections.
    pub fn sections(mut self, sections: Vec<Vec<T>>) -> Self {
        self.sections = sections;
        self
    }

    /// Sets the content loader.
    pub fn loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(LoadTicket<T>) + Send + Sync + 'static,
    {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Builds the provider.
    pub fn build(self) -> Arc<LeafProvider<T>> {
        LeafProvider::from_builder(self)
    }
}

static_assertions::assert_impl_all!(LeafProvider<String>: Send, Sync);
