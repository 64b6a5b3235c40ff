//! Composite provider implementation.
//!
//! A `CompositeProvider` concatenates the sections of an ordered list of
//! children into one contiguous global section space. Each child keeps
//! addressing its own sections from zero; the composite owns one
//! [`SectionMapping`] per child and translates in both directions.
//!
//! # Recomputation
//!
//! The layout is derived state. It is recomputed at the start of every
//! query and after every structural change, by walking the children in
//! order and assigning each one the next run of global sections. Children
//! are queried with the layout lock released, so a child that calls back
//! into the composite while it reports its section count cannot deadlock.
//!
//! # Example
//!
//! ```
//! use horizon_sections::{CompositeProvider, ItemPath, LeafProvider, Provider};
//!
//! let first = LeafProvider::new(vec![vec![1u32, 2, 3], vec![4]]);
//! let second = LeafProvider::new(vec![vec![5u32, 6]]);
//!
//! let composite = CompositeProvider::<u32>::new();
//! composite.add_child(first.clone());
//! composite.add_child(second.clone());
//!
//! assert_eq!(composite.section_count(), 3);
//! assert_eq!(composite.item_at(ItemPath::new(2, 1)), Some(6));
//! assert_eq!(composite.provider_for_section(2).id(), second.id());
//! ```

use std::fmt;
use std::ops::Range;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use horizon_sections_core::logging::{span_names, targets};
use horizon_sections_core::{CompositionError, Result};

use super::base::ProviderBase;
use super::index::ItemPath;
use super::mapping::SectionMapping;
use super::traits::{
    Provider, ProviderChange, ProviderId, ProviderItem, ProviderKind, ProviderObserver,
    SharedProvider, UpdateFn, panic_section_out_of_range,
};

/// A registered child and the mapping that places it in the global space.
struct ChildRecord<T: ProviderItem> {
    provider: SharedProvider<T>,
    mapping: SectionMapping,
}

/// The composite's derived layout.
struct Layout<T: ProviderItem> {
    children: Vec<ChildRecord<T>>,
    /// Index into `children` for every global section.
    owners: Vec<usize>,
    section_count: usize,
}

impl<T: ProviderItem> Layout<T> {
    fn position(&self, id: ProviderId) -> Option<usize> {
        self.children
            .iter()
            .position(|record| record.provider.id() == id)
    }

    /// Returns the owning child and local section for `global`.
    fn locate(&self, global: usize) -> Option<(SharedProvider<T>, usize)> {
        let record = &self.children[*self.owners.get(global)?];
        let local = record.mapping.local_for(global)?;
        Some((record.provider.clone(), local))
    }
}

/// A provider presenting several children as one flat collection.
pub struct CompositeProvider<T: ProviderItem> {
    base: ProviderBase<T>,
    this: Weak<CompositeProvider<T>>,
    layout: Mutex<Layout<T>>,
}

impl<T: ProviderItem> CompositeProvider<T> {
    /// Creates an empty composite.
    pub fn new() -> Arc<Self> {
        Self::create(None)
    }

    /// Creates an empty composite with a title.
    pub fn with_title(title: impl Into<String>) -> Arc<Self> {
        Self::create(Some(title.into()))
    }

    /// Creates a composite and registers `children` in order.
    ///
    /// # Panics
    ///
    /// Panics if the same provider appears twice.
    pub fn from_children(children: impl IntoIterator<Item = SharedProvider<T>>) -> Arc<Self> {
        let composite = Self::new();
        for child in children {
            composite.add_child(child);
        }
        composite
    }

    fn create(title: Option<String>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<CompositeProvider<T>>| {
            let this: Weak<dyn Provider<Item = T>> = weak.clone();
            Self {
                base: ProviderBase::new(ProviderKind::Composite, this).with_title(title),
                this: weak.clone(),
                layout: Mutex::new(Layout {
                    children: Vec::new(),
                    owners: Vec::new(),
                    section_count: 0,
                }),
            }
        })
    }

    /// Replaces the title.
    pub fn set_title(&self, title: impl Into<String>) {
        self.base.set_title(Some(title.into()));
    }

    /// Sets whether items of this composite can be selected.
    pub fn set_allows_selection(&self, allows_selection: bool) {
        self.base.set_allows_selection(allows_selection);
    }

    // -------------------------------------------------------------------------
    // Children
    // -------------------------------------------------------------------------

    /// Registers `child` at the end of the child list.
    ///
    /// The composite becomes the child's observer, and the child's sections
    /// are announced as one insertion at the end of the global space.
    ///
    /// # Panics
    ///
    /// Panics if `child` is already registered or is this composite.
    pub fn add_child(&self, child: SharedProvider<T>) {
        if let Err(err) = self.try_add_child(child) {
            panic!("add_child failed: {err}");
        }
    }

    /// Registers `child` at the end of the child list.
    pub fn try_add_child(&self, child: SharedProvider<T>) -> Result<()> {
        self.base.check_thread("add_child");
        let child_id = child.id();
        if child_id == self.base.id() {
            return Err(CompositionError::SelfRegistration(child_id.as_u64()));
        }
        if self.contains(child_id) {
            return Err(CompositionError::already_registered(
                child_id.as_u64(),
                self.base.id().as_u64(),
            ));
        }

        let observer: Weak<dyn ProviderObserver> = self.this.clone();
        child.set_observer(Some(observer));
        self.layout.lock().children.push(ChildRecord {
            provider: child,
            mapping: SectionMapping::new(),
        });
        self.update_mappings();

        let range = self.global_section_range(child_id).unwrap_or(0..0);
        tracing::debug!(
            target: targets::COMPOSITE,
            composite = %self.base.id(),
            child = %child_id,
            sections = ?range,
            "child added"
        );
        if !range.is_empty() {
            self.base.notify_sections_inserted(range.collect());
        }
        Ok(())
    }

    /// Unregisters `child`, announcing the removal of its sections.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not registered.
    pub fn remove_child<P>(&self, child: &P)
    where
        P: Provider<Item = T> + ?Sized,
    {
        if let Err(err) = self.try_remove_child(child) {
            panic!("remove_child failed: {err}");
        }
    }

    /// Unregisters `child`, announcing the removal of its sections.
    pub fn try_remove_child<P>(&self, child: &P) -> Result<()>
    where
        P: Provider<Item = T> + ?Sized,
    {
        self.base.check_thread("remove_child");
        let child_id = child.id();
        let (record, range) = {
            let mut layout = self.layout.lock();
            let Some(index) = layout.position(child_id) else {
                return Err(CompositionError::not_registered(
                    child_id.as_u64(),
                    self.base.id().as_u64(),
                ));
            };
            let record = layout.children.remove(index);
            let range = record.mapping.global_range();
            (record, range)
        };

        record.provider.set_observer(None);
        self.update_mappings();

        tracing::debug!(
            target: targets::COMPOSITE,
            composite = %self.base.id(),
            child = %child_id,
            sections = ?range,
            "child removed"
        );
        if !range.is_empty() {
            self.base.notify_sections_removed(range.collect());
        }
        Ok(())
    }

    /// Returns the number of registered children.
    pub fn child_count(&self) -> usize {
        self.layout.lock().children.len()
    }

    /// Returns `true` if the provider with `id` is a registered child.
    pub fn contains(&self, id: ProviderId) -> bool {
        self.layout.lock().position(id).is_some()
    }

    /// Returns the global sections occupied by the child with `id`.
    pub fn global_section_range(&self, id: ProviderId) -> Option<Range<usize>> {
        self.update_mappings();
        let layout = self.layout.lock();
        let index = layout.position(id)?;
        let record = &layout.children[index];
        if record.mapping.is_empty() {
            // An empty child sits between its neighbours.
            let start = layout.children[..index]
                .iter()
                .map(|record| record.mapping.section_count())
                .sum();
            return Some(start..start);
        }
        Some(record.mapping.global_range())
    }

    // -------------------------------------------------------------------------
    // Layout
    // -------------------------------------------------------------------------

    fn providers(&self) -> Vec<SharedProvider<T>> {
        self.layout
            .lock()
            .children
            .iter()
            .map(|record| record.provider.clone())
            .collect()
    }

    fn mapping_for(&self, id: ProviderId) -> Option<SectionMapping> {
        let layout = self.layout.lock();
        let index = layout.position(id)?;
        Some(layout.children[index].mapping.clone())
    }

    /// Rebuilds every child mapping and the global section index.
    fn update_mappings(&self) {
        let _span = tracing::trace_span!(
            target: targets::COMPOSITE,
            span_names::RECOMPUTE,
            composite = %self.base.id()
        )
        .entered();

        let counts: Vec<(ProviderId, usize)> = self
            .providers()
            .iter()
            .map(|provider| (provider.id(), provider.section_count()))
            .collect();

        let mut guard = self.layout.lock();
        let layout = &mut *guard;
        layout.owners.clear();
        layout.section_count = 0;
        for (index, record) in layout.children.iter_mut().enumerate() {
            let count = counts
                .iter()
                .find(|(id, _)| *id == record.provider.id())
                .map_or(0, |(_, count)| *count);
            let owners = &mut layout.owners;
            let assigned = record
                .mapping
                .rebuild(count, layout.section_count, |_| owners.push(index));
            layout.section_count += assigned;
        }
    }

    fn locate(&self, section: usize) -> Option<(SharedProvider<T>, usize)> {
        self.update_mappings();
        self.layout.lock().locate(section)
    }

    fn locate_or_panic(&self, section: usize) -> (SharedProvider<T>, usize) {
        match self.locate(section) {
            Some(found) => found,
            None => {
                let count = self.layout.lock().section_count;
                panic_section_out_of_range(self.base.id(), section, count)
            }
        }
    }
}

impl<T: ProviderItem> Provider for CompositeProvider<T> {
    type Item = T;

    fn base(&self) -> &ProviderBase<T> {
        &self.base
    }

    fn section_count(&self) -> usize {
        self.update_mappings();
        self.layout.lock().section_count
    }

    fn item_count(&self, section: usize) -> usize {
        let (child, local) = self.locate_or_panic(section);
        child.item_count(local)
    }

    fn item_at(&self, path: ItemPath) -> Option<T> {
        let (child, local) = self.locate(path.section())?;
        child.item_at(path.with_section(local))
    }

    fn paths_for(&self, item: &T) -> Vec<ItemPath> {
        self.update_mappings();
        let records: Vec<(SharedProvider<T>, SectionMapping)> = self
            .layout
            .lock()
            .children
            .iter()
            .map(|record| (record.provider.clone(), record.mapping.clone()))
            .collect();

        records
            .iter()
            .flat_map(|(provider, mapping)| mapping.global_paths(&provider.paths_for(item)))
            .collect()
    }

    fn provider_for_section(&self, section: usize) -> SharedProvider<T> {
        let (child, local) = self.locate_or_panic(section);
        child.provider_for_section(local)
    }

    fn children(&self) -> Vec<SharedProvider<T>> {
        self.providers()
    }

    fn became_active(&self) {
        for child in self.providers() {
            child.became_active();
        }
    }

    fn will_resign_active(&self) {
        for child in self.providers() {
            child.will_resign_active();
        }
    }

    fn load_content(&self) {
        for child in self.providers() {
            child.load_content();
        }
    }

    fn reset_content(&self) {
        for child in self.providers() {
            child.reset_content();
        }
    }

    fn load_if_needed(&self) {
        if self.base.take_needs_load() {
            self.load_content();
        }
        for child in self.providers() {
            child.load_if_needed();
        }
    }
}

impl<T: ProviderItem> ProviderObserver for CompositeProvider<T> {
    fn provider_changed(&self, source: ProviderId, change: ProviderChange) {
        if change.is_load_event() {
            tracing::trace!(
                target: targets::COMPOSITE,
                composite = %self.base.id(),
                %source,
                change = change.name(),
                "absorbed load notification"
            );
            return;
        }
        let Some(mapping) = self.mapping_for(source) else {
            tracing::warn!(
                target: targets::COMPOSITE,
                composite = %self.base.id(),
                %source,
                change = change.name(),
                "ignoring change from unregistered provider"
            );
            return;
        };

        match change {
            ProviderChange::ItemsInserted(paths) => {
                self.base.notify_items_inserted(mapping.global_paths(&paths));
            }
            ProviderChange::ItemsRemoved(paths) => {
                self.base.notify_items_removed(mapping.global_paths(&paths));
            }
            ProviderChange::ItemsRefreshed(paths) => {
                self.base.notify_items_refreshed(mapping.global_paths(&paths));
            }
            ProviderChange::ItemMoved { from, to } => {
                self.base
                    .notify_item_moved(mapping.global_path(from), mapping.global_path(to));
            }
            ProviderChange::SectionsInserted(sections) => {
                self.update_mappings();
                if let Some(mapping) = self.mapping_for(source) {
                    self.base
                        .notify_sections_inserted(mapping.global_sections(&sections));
                }
            }
            ProviderChange::SectionsRemoved(sections) => {
                self.base
                    .notify_sections_removed(mapping.global_sections(&sections));
                self.update_mappings();
            }
            ProviderChange::SectionsRefreshed(sections) => {
                self.base
                    .notify_sections_refreshed(mapping.global_sections(&sections));
                self.update_mappings();
            }
            ProviderChange::SectionMoved { from, to } => {
                self.base
                    .notify_section_moved(mapping.global_for(from), mapping.global_for(to));
                self.update_mappings();
            }
            ProviderChange::Reloaded => {
                self.update_mappings();
                self.base.notify_reloaded();
            }
            // Absorbed above.
            ProviderChange::WillLoad | ProviderChange::Loaded(_) => {}
        }
    }

    fn perform_update(&self, source: ProviderId, update: UpdateFn, completion: Option<UpdateFn>) {
        if !self.contains(source) {
            tracing::warn!(
                target: targets::COMPOSITE,
                composite = %self.base.id(),
                %source,
                "batch request from unregistered provider runs unbatched"
            );
            update();
            if let Some(completion) = completion {
                completion();
            }
            return;
        }
        self.base.perform_update(update, completion);
    }
}

impl<T: ProviderItem> fmt::Debug for CompositeProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = self.layout.lock();
        f.debug_struct("CompositeProvider")
            .field("base", &self.base)
            .field("children", &layout.children.len())
            .field("section_count", &layout.section_count)
            .finish()
    }
}

static_assertions::assert_impl_all!(CompositeProvider<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::leaf::LeafProvider;
    use crate::provider::test_support::Recorder;

    fn fixture() -> (
        Arc<CompositeProvider<u32>>,
        Arc<LeafProvider<u32>>,
        Arc<LeafProvider<u32>>,
    ) {
        let l1 = LeafProvider::new(vec![vec![10, 11, 12], vec![20]]);
        let l2 = LeafProvider::new(vec![vec![30, 31]]);
        let composite = CompositeProvider::<u32>::new();
        composite.add_child(l1.clone());
        composite.add_child(l2.clone());
        (composite, l1, l2)
    }

    #[test]
    fn test_concatenates_children() {
        let (composite, _l1, l2) = fixture();

        assert_eq!(composite.section_count(), 3);
        let counts: Vec<usize> = (0..3).map(|s| composite.item_count(s)).collect();
        assert_eq!(counts, vec![3, 1, 2]);
        assert_eq!(composite.item_at(ItemPath::new(2, 1)), Some(31));
        assert_eq!(composite.provider_for_section(2).id(), l2.id());
        assert_eq!(composite.global_section_range(l2.id()), Some(2..3));
    }

    #[test]
    fn test_item_at_out_of_range_is_none() {
        let (composite, _, _) = fixture();
        assert_eq!(composite.item_at(ItemPath::new(3, 0)), None);
        assert_eq!(composite.item_at(ItemPath::new(1, 1)), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_item_count_out_of_range_panics() {
        let (composite, _, _) = fixture();
        composite.item_count(3);
    }

    #[test]
    fn test_paths_for_translates_each_child() {
        let l1 = LeafProvider::new(vec![vec![1u32], vec![7, 2]]);
        let l2 = LeafProvider::new(vec![vec![7u32]]);
        let composite = CompositeProvider::from_children([
            l1 as SharedProvider<u32>,
            l2 as SharedProvider<u32>,
        ]);

        assert_eq!(
            composite.paths_for(&7),
            vec![ItemPath::new(1, 0), ItemPath::new(2, 0)]
        );
    }

    #[test]
    fn test_add_child_announces_new_range() {
        let (composite, _, _) = fixture();
        let recorder = Recorder::attach(&*composite);

        composite.add_child(LeafProvider::new(vec![vec![1u32], vec![2]]));
        composite.add_child(LeafProvider::<u32>::empty());

        assert_eq!(
            recorder.changes(),
            vec![ProviderChange::SectionsInserted(vec![3, 4])]
        );
        assert_eq!(composite.section_count(), 5);
        assert_eq!(composite.child_count(), 4);
    }

    #[test]
    fn test_remove_child_announces_old_range() {
        let (composite, l1, l2) = fixture();
        let recorder = Recorder::attach(&*composite);

        composite.remove_child(&*l1);

        assert_eq!(
            recorder.changes(),
            vec![ProviderChange::SectionsRemoved(vec![0, 1])]
        );
        assert_eq!(composite.section_count(), 1);
        assert_eq!(composite.provider_for_section(0).id(), l2.id());
        assert!(!l1.base().has_observer());

        // A detached child no longer reaches the composite.
        recorder.clear();
        l1.push_item(0, 99);
        assert!(recorder.changes().is_empty());
    }

    #[test]
    fn test_try_variants_report_errors() {
        let (composite, l1, _) = fixture();
        let stranger = LeafProvider::new(vec![vec![0u32]]);

        assert!(matches!(
            composite.try_add_child(l1.clone()),
            Err(CompositionError::AlreadyRegistered { .. })
        ));
        assert!(matches!(
            composite.try_remove_child(&*stranger),
            Err(CompositionError::NotRegistered { .. })
        ));
        let as_child: SharedProvider<u32> = composite.clone();
        assert!(matches!(
            composite.try_add_child(as_child),
            Err(CompositionError::SelfRegistration(_))
        ));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_double_registration_panics() {
        let (composite, l1, _) = fixture();
        composite.add_child(l1);
    }

    #[test]
    fn test_item_events_are_rebased() {
        let (composite, _l1, l2) = fixture();
        let recorder = Recorder::attach(&*composite);

        l2.push_item(0, 32);
        l2.replace_item(ItemPath::new(0, 0), 33);
        l2.remove_item(ItemPath::new(0, 1));

        let events = recorder.events();
        assert!(events.iter().all(|(source, _)| *source == composite.id()));
        assert_eq!(
            recorder.changes(),
            vec![
                ProviderChange::ItemsInserted(vec![ItemPath::new(2, 2)]),
                ProviderChange::ItemsRefreshed(vec![ItemPath::new(2, 0)]),
                ProviderChange::ItemsRemoved(vec![ItemPath::new(2, 1)]),
            ]
        );
    }

    #[test]
    fn test_section_events_are_rebased() {
        let (composite, l1, l2) = fixture();
        let recorder = Recorder::attach(&*composite);

        l2.push_section(vec![40]);
        assert_eq!(composite.section_count(), 4);
        l1.remove_section(0);
        assert_eq!(composite.section_count(), 3);
        l2.refresh_section(1);
        l2.move_section(1, 0);

        assert_eq!(
            recorder.changes(),
            vec![
                ProviderChange::SectionsInserted(vec![3]),
                ProviderChange::SectionsRemoved(vec![0]),
                ProviderChange::SectionsRefreshed(vec![2]),
                ProviderChange::SectionMoved { from: 2, to: 1 },
            ]
        );
    }

    #[test]
    fn test_load_events_are_absorbed() {
        let leaf: Arc<LeafProvider<u32>> = LeafProvider::builder()
            .loader(|ticket| {
                ticket.done(vec![vec![1]]);
            })
            .build();
        let composite = CompositeProvider::<u32>::new();
        composite.add_child(leaf.clone());
        let recorder = Recorder::attach(&*composite);

        composite.load_content();

        assert_eq!(recorder.changes(), vec![ProviderChange::Reloaded]);
        assert_eq!(composite.section_count(), 1);
    }

    #[test]
    fn test_changes_from_unregistered_sources_are_ignored() {
        let (composite, _, _) = fixture();
        let recorder = Recorder::attach(&*composite);
        let stranger = LeafProvider::new(vec![vec![0u32]]);

        composite.provider_changed(stranger.id(), ProviderChange::Reloaded);
        assert!(recorder.changes().is_empty());
    }

    #[test]
    fn test_batch_requests_are_forwarded() {
        let (composite, _, l2) = fixture();
        let recorder = Recorder::attach(&*composite);

        let target = l2.clone();
        l2.perform_update(Box::new(move || {
            target.push_item(0, 1);
        }), None);

        assert_eq!(recorder.batch_sources(), vec![composite.id()]);
        assert_eq!(l2.item_count(0), 3);
    }

    #[test]
    fn test_sum_invariant_after_mutations() {
        let (composite, l1, l2) = fixture();
        let l3 = LeafProvider::new(vec![vec![], vec![1u32]]);
        composite.add_child(l3.clone());

        l1.push_section(vec![]);
        l3.remove_section(0);
        l2.insert_section(0, vec![5]);
        composite.remove_child(&*l1);

        let expected: usize = composite
            .children()
            .iter()
            .map(|child| child.section_count())
            .sum();
        assert_eq!(composite.section_count(), expected);
        assert_eq!(composite.global_section_range(l3.id()), Some(2..3));
    }

    #[test]
    fn test_empty_child_range() {
        let (composite, _, _) = fixture();
        let empty = LeafProvider::<u32>::empty();
        composite.add_child(empty.clone());
        assert_eq!(composite.global_section_range(empty.id()), Some(3..3));
    }
}
