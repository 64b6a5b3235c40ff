//! Selector provider implementation.
//!
//! A `SelectorProvider` holds several children but exposes exactly one of
//! them, the active child, whose local section space becomes the selector's
//! global space verbatim. Switching the active child is announced as the
//! removal of every visible section followed by the insertion of the new
//! child's sections, run as one coalesced batch.
//!
//! Changes from inactive children are dropped, not queued. A child that
//! becomes active is announced with its current content.

use std::fmt;
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

struct SelectorState<T: ProviderItem> {
    children: Vec<SharedProvider<T>>,
    active: Option<usize>,
    /// Identity mapping over the active child's sections.
    mapping: SectionMapping,
}

impl<T: ProviderItem> SelectorState<T> {
    fn position(&self, id: ProviderId) -> Option<usize> {
        self.children.iter().position(|child| child.id() == id)
    }

    fn active(&self) -> Option<SharedProvider<T>> {
        self.active.map(|index| self.children[index].clone())
    }

    fn is_active(&self, id: ProviderId) -> bool {
        self.active
            .is_some_and(|index| self.children[index].id() == id)
    }
}

/// A provider showing one of its children at a time.
///
/// # Example
///
/// ```
/// use horizon_sections::{LeafProvider, Provider, SelectorProvider};
///
/// let inbox = LeafProvider::new(vec![vec!["mail"]]);
/// let archive = LeafProvider::new(vec![vec!["old"], vec!["older"]]);
///
/// let tabs = SelectorProvider::<&str>::new();
/// tabs.add_child(inbox.clone());
/// tabs.add_child(archive.clone());
/// assert_eq!(tabs.section_count(), 1);
///
/// tabs.select(&*archive, None);
/// assert_eq!(tabs.section_count(), 2);
/// assert_eq!(tabs.active_index(), Some(1));
/// ```
pub struct SelectorProvider<T: ProviderItem> {
    base: ProviderBase<T>,
    this: Weak<SelectorProvider<T>>,
    state: Mutex<SelectorState<T>>,
}

impl<T: ProviderItem> SelectorProvider<T> {
    /// Creates a selector with no children.
    pub fn new() -> Arc<Self> {
        Self::create(None)
    }

    /// Creates a selector with no children and a title.
    pub fn with_title(title: impl Into<String>) -> Arc<Self> {
        Self::create(Some(title.into()))
    }

    fn create(title: Option<String>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<SelectorProvider<T>>| {
            let this: Weak<dyn Provider<Item = T>> = weak.clone();
            Self {
                base: ProviderBase::new(ProviderKind::Selector, this).with_title(title),
                this: weak.clone(),
                state: Mutex::new(SelectorState {
                    children: Vec::new(),
                    active: None,
                    mapping: SectionMapping::new(),
                }),
            }
        })
    }

    /// Replaces the title.
    pub fn set_title(&self, title: impl Into<String>) {
        self.base.set_title(Some(title.into()));
    }

    /// Registers `child`. The first child registered becomes active.
    ///
    /// # Panics
    ///
    /// Panics if `child` is already registered or is this selector.
    pub fn add_child(&self, child: SharedProvider<T>) {
        if let Err(err) = self.try_add_child(child) {
            panic!("add_child failed: {err}");
        }
    }

    /// Registers `child`. The first child registered becomes active.
    pub fn try_add_child(&self, child: SharedProvider<T>) -> Result<()> {
        self.base.check_thread("add_child");
        let child_id = child.id();
        if child_id == self.base.id() {
            return Err(CompositionError::SelfRegistration(child_id.as_u64()));
        }

        let observer: Weak<dyn ProviderObserver> = self.this.clone();
        let activated = {
            let mut state = self.state.lock();
            if state.position(child_id).is_some() {
                return Err(CompositionError::already_registered(
                    child_id.as_u64(),
                    self.base.id().as_u64(),
                ));
            }
            state.children.push(child.clone());
            if state.active.is_none() {
                state.active = Some(state.children.len() - 1);
                true
            } else {
                false
            }
        };
        child.set_observer(Some(observer));

        tracing::debug!(
            target: targets::SELECTOR,
            selector = %self.base.id(),
            child = %child_id,
            activated,
            "child added"
        );

        if activated {
            let count = self.update_mapping();
            if count > 0 {
                self.base.notify_sections_inserted((0..count).collect());
            }
        }
        Ok(())
    }

    /// Unregisters `child`.
    ///
    /// Removing the active child leaves the selector idle, reporting no
    /// sections, until another child is selected.
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

    /// Unregisters `child`.
    pub fn try_remove_child<P>(&self, child: &P) -> Result<()>
    where
        P: Provider<Item = T> + ?Sized,
    {
        self.base.check_thread("remove_child");
        let child_id = child.id();
        let (removed, was_active, previous_count) = {
            let mut state = self.state.lock();
            let Some(index) = state.position(child_id) else {
                return Err(CompositionError::not_registered(
                    child_id.as_u64(),
                    self.base.id().as_u64(),
                ));
            };
            let removed = state.children.remove(index);
            let was_active = state.active == Some(index);
            state.active = match state.active {
                Some(active) if active == index => None,
                Some(active) if active > index => Some(active - 1),
                other => other,
            };
            (removed, was_active, state.mapping.section_count())
        };

        removed.set_observer(None);
        tracing::debug!(
            target: targets::SELECTOR,
            selector = %self.base.id(),
            child = %child_id,
            was_active,
            "child removed"
        );

        if was_active {
            removed.will_resign_active();
            self.update_mapping();
            if previous_count > 0 {
                self.base
                    .notify_sections_removed((0..previous_count).collect());
            }
        }
        Ok(())
    }

    /// Makes `child` the active child.
    ///
    /// Runs `completion` immediately if `child` is already active. Otherwise
    /// the switch is requested as one coalesced batch and `completion` runs
    /// when that batch completes.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not registered.
    pub fn select<P>(&self, child: &P, completion: Option<UpdateFn>)
    where
        P: Provider<Item = T> + ?Sized,
    {
        if let Err(err) = self.try_select(child, completion) {
            panic!("select failed: {err}");
        }
    }

    /// Makes `child` the active child.
    pub fn try_select<P>(&self, child: &P, completion: Option<UpdateFn>) -> Result<()>
    where
        P: Provider<Item = T> + ?Sized,
    {
        self.base.check_thread("select");
        let child_id = child.id();
        let already_active = {
            let state = self.state.lock();
            if state.position(child_id).is_none() {
                return Err(CompositionError::not_registered(
                    child_id.as_u64(),
                    self.base.id().as_u64(),
                ));
            }
            state.is_active(child_id)
        };

        if already_active {
            if let Some(completion) = completion {
                completion();
            }
            return Ok(());
        }

        let this = self.this.clone();
        self.base.perform_update(
            Box::new(move || {
                if let Some(selector) = this.upgrade() {
                    selector.switch_to(child_id);
                }
            }),
            completion,
        );
        Ok(())
    }

    /// Makes the child at `index` the active child.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn select_index(&self, index: usize, completion: Option<UpdateFn>) {
        if let Err(err) = self.try_select_index(index, completion) {
            panic!("select_index failed: {err}");
        }
    }

    /// Makes the child at `index` the active child.
    pub fn try_select_index(&self, index: usize, completion: Option<UpdateFn>) -> Result<()> {
        let child = {
            let state = self.state.lock();
            match state.children.get(index) {
                Some(child) => child.clone(),
                None => {
                    return Err(CompositionError::ChildOutOfRange {
                        index,
                        count: state.children.len(),
                    });
                }
            }
        };
        self.try_select(&*child, completion)
    }

    /// Returns the active child, if any.
    pub fn active(&self) -> Option<SharedProvider<T>> {
        self.state.lock().active()
    }

    /// Returns the position of the active child, if any.
    pub fn active_index(&self) -> Option<usize> {
        self.state.lock().active
    }

    /// Returns the number of registered children.
    pub fn child_count(&self) -> usize {
        self.state.lock().children.len()
    }

    /// Returns `true` if the provider with `id` is a registered child.
    pub fn contains(&self, id: ProviderId) -> bool {
        self.state.lock().position(id).is_some()
    }

    /// Returns the title of every child, in order.
    pub fn child_titles(&self) -> Vec<Option<String>> {
        self.children().iter().map(|child| child.title()).collect()
    }

    fn switch_to(&self, target: ProviderId) {
        let _span = tracing::debug_span!(
            target: targets::SELECTOR,
            span_names::SELECT,
            selector = %self.base.id(),
            %target
        )
        .entered();

        let (previous, next_index, previous_count) = {
            let state = self.state.lock();
            let Some(index) = state.position(target) else {
                tracing::warn!(
                    target: targets::SELECTOR,
                    selector = %self.base.id(),
                    %target,
                    "selected provider was removed before the switch ran"
                );
                return;
            };
            if state.active == Some(index) {
                return;
            }
            (state.active(), index, state.mapping.section_count())
        };

        if let Some(previous) = &previous {
            previous.will_resign_active();
        }
        self.state.lock().active = None;
        self.update_mapping();
        if previous_count > 0 {
            self.base
                .notify_sections_removed((0..previous_count).collect());
        }

        let next = {
            let mut state = self.state.lock();
            state.active = Some(next_index);
            state.children[next_index].clone()
        };
        let count = self.update_mapping();
        if count > 0 {
            self.base.notify_sections_inserted((0..count).collect());
        }
        next.became_active();

        tracing::debug!(
            target: targets::SELECTOR,
            selector = %self.base.id(),
            active = %target,
            sections = count,
            "active child changed"
        );
    }

    /// Rebuilds the identity mapping over the active child, returning its
    /// section count.
    fn update_mapping(&self) -> usize {
        let active = self.state.lock().active();
        let count = active.map_or(0, |child| child.section_count());
        self.state.lock().mapping.rebuild(count, 0, |_| {})
    }

    fn active_mapping(&self, source: ProviderId) -> Option<SectionMapping> {
        let state = self.state.lock();
        state
            .is_active(source)
            .then(|| state.mapping.clone())
    }
}

impl<T: ProviderItem> Provider for SelectorProvider<T> {
    type Item = T;

    fn base(&self) -> &ProviderBase<T> {
        &self.base
    }

    fn section_count(&self) -> usize {
        self.active().map_or(0, |child| child.section_count())
    }

    fn item_count(&self, section: usize) -> usize {
        let count = self.section_count();
        match self.active() {
            Some(child) if section < count => child.item_count(section),
            _ => panic_section_out_of_range(self.base.id(), section, count),
        }
    }

    fn item_at(&self, path: ItemPath) -> Option<T> {
        self.active()?.item_at(path)
    }

    fn paths_for(&self, item: &T) -> Vec<ItemPath> {
        self.active()
            .map(|child| child.paths_for(item))
            .unwrap_or_default()
    }

    fn provider_for_section(&self, section: usize) -> SharedProvider<T> {
        let count = self.section_count();
        match self.active() {
            Some(child) if section < count => child.provider_for_section(section),
            _ => panic_section_out_of_range(self.base.id(), section, count),
        }
    }

    fn children(&self) -> Vec<SharedProvider<T>> {
        self.state.lock().children.clone()
    }

    fn active_child(&self) -> Option<ProviderId> {
        self.active().map(|child| child.id())
    }

    fn became_active(&self) {
        if let Some(child) = self.active() {
            child.became_active();
        }
    }

    fn will_resign_active(&self) {
        if let Some(child) = self.active() {
            child.will_resign_active();
        }
    }

    fn load_content(&self) {
        if let Some(child) = self.active() {
            child.load_content();
        }
    }

    fn reset_content(&self) {
        for child in self.children() {
            child.reset_content();
        }
    }

    fn load_if_needed(&self) {
        if self.base.take_needs_load() {
            self.load_content();
        }
        if let Some(child) = self.active() {
            child.load_if_needed();
        }
    }
}

impl<T: ProviderItem> ProviderObserver for SelectorProvider<T> {
    fn provider_changed(&self, source: ProviderId, change: ProviderChange) {
        if change.is_load_event() {
            tracing::trace!(
                target: targets::SELECTOR,
                selector = %self.base.id(),
                %source,
                change = change.name(),
                "absorbed load notification"
            );
            return;
        }
        if !self.contains(source) {
            tracing::warn!(
                target: targets::SELECTOR,
                selector = %self.base.id(),
                %source,
                change = change.name(),
                "ignoring change from unregistered provider"
            );
            return;
        }
        let Some(mapping) = self.active_mapping(source) else {
            tracing::trace!(
                target: targets::SELECTOR,
                selector = %self.base.id(),
                %source,
                change = change.name(),
                "dropped change from inactive child"
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
                self.update_mapping();
                if let Some(mapping) = self.active_mapping(source) {
                    self.base
                        .notify_sections_inserted(mapping.global_sections(&sections));
                }
            }
            ProviderChange::SectionsRemoved(sections) => {
                self.base
                    .notify_sections_removed(mapping.global_sections(&sections));
                self.update_mapping();
            }
            ProviderChange::SectionsRefreshed(sections) => {
                self.base
                    .notify_sections_refreshed(mapping.global_sections(&sections));
                self.update_mapping();
            }
            ProviderChange::SectionMoved { from, to } => {
                self.base
                    .notify_section_moved(mapping.global_for(from), mapping.global_for(to));
                self.update_mapping();
            }
            ProviderChange::Reloaded => {
                self.update_mapping();
                self.base.notify_reloaded();
            }
            // Absorbed above.
            ProviderChange::WillLoad | ProviderChange::Loaded(_) => {}
        }
    }

    fn perform_update(&self, source: ProviderId, update: UpdateFn, completion: Option<UpdateFn>) {
        if self.active_child() == Some(source) {
            self.base.perform_update(update, completion);
            return;
        }
        tracing::trace!(
            target: targets::SELECTOR,
            selector = %self.base.id(),
            %source,
            "running batch from inactive child unforwarded"
        );
        update();
        if let Some(completion) = completion {
            completion();
        }
    }
}

impl<T: ProviderItem> fmt::Debug for SelectorProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SelectorProvider")
            .field("base", &self.base)
            .field("children", &state.children.len())
            .field("active", &state.active)
            .finish()
    }
}

static_assertions::assert_impl_all!(SelectorProvider<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::leaf::LeafProvider;
    use crate::provider::test_support::Recorder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A leaf wrapper that counts lifecycle calls.
    struct Tracked {
        inner: Arc<LeafProvider<u32>>,
        log: Arc<Mutex<Vec<String>>>,
        base: ProviderBase<u32>,
    }

    impl Tracked {
        fn new(name: &'static str, sections: Vec<Vec<u32>>, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new_cyclic(|weak: &Weak<Tracked>| {
                let this: Weak<dyn Provider<Item = u32>> = weak.clone();
                Self {
                    inner: LeafProvider::new(sections),
                    log: log.clone(),
                    base: ProviderBase::new(ProviderKind::Custom, this)
                        .with_title(Some(name.to_string())),
                }
            })
        }

        fn record(&self, what: &str) {
            let title = self.base.title().unwrap_or_default();
            self.log.lock().push(format!("{what}({title})"));
        }
    }

    impl Provider for Tracked {
        type Item = u32;

        fn base(&self) -> &ProviderBase<u32> {
            &self.base
        }

        fn section_count(&self) -> usize {
            self.inner.section_count()
        }

        fn item_count(&self, section: usize) -> usize {
            self.inner.item_count(section)
        }

        fn item_at(&self, path: ItemPath) -> Option<u32> {
            self.inner.item_at(path)
        }

        fn paths_for(&self, item: &u32) -> Vec<ItemPath> {
            self.inner.paths_for(item)
        }

        fn became_active(&self) {
            self.record("activate");
        }

        fn will_resign_active(&self) {
            self.record("resign");
        }
    }

    /// Observer that appends notifications to the shared lifecycle log.
    struct LogObserver(Arc<Mutex<Vec<String>>>);

    impl ProviderObserver for LogObserver {
        fn provider_changed(&self, _source: ProviderId, change: ProviderChange) {
            let entry = match change {
                ProviderChange::SectionsInserted(s) => format!("insert{s:?}"),
                ProviderChange::SectionsRemoved(s) => format!("remove{s:?}"),
                other => other.name().to_string(),
            };
            self.0.lock().push(entry);
        }
    }

    fn pair() -> (
        Arc<SelectorProvider<u32>>,
        Arc<LeafProvider<u32>>,
        Arc<LeafProvider<u32>>,
    ) {
        let x = LeafProvider::new(vec![vec![1, 2]]);
        let y = LeafProvider::new(vec![vec![3], vec![4, 5]]);
        let selector = SelectorProvider::<u32>::new();
        selector.add_child(x.clone());
        selector.add_child(y.clone());
        (selector, x, y)
    }

    #[test]
    fn test_first_child_becomes_active() {
        let selector = SelectorProvider::<u32>::new();
        let recorder = Recorder::attach(&*selector);
        let x = LeafProvider::new(vec![vec![1u32], vec![2]]);

        assert_eq!(selector.section_count(), 0);
        selector.add_child(x.clone());
        selector.add_child(LeafProvider::new(vec![vec![3u32]]));

        assert_eq!(selector.active_child(), Some(x.id()));
        assert_eq!(selector.active_index(), Some(0));
        assert_eq!(
            recorder.changes(),
            vec![ProviderChange::SectionsInserted(vec![0, 1])]
        );
    }

    #[test]
    fn test_select_switches_visible_space() {
        let (selector, _x, y) = pair();
        let recorder = Recorder::attach(&*selector);
        assert_eq!(selector.section_count(), 1);

        selector.select(&*y, None);

        assert_eq!(
            recorder.changes(),
            vec![
                ProviderChange::SectionsRemoved(vec![0]),
                ProviderChange::SectionsInserted(vec![0, 1]),
            ]
        );
        assert_eq!(recorder.batch_sources(), vec![selector.id()]);
        assert_eq!(selector.section_count(), 2);
        assert_eq!(selector.item_count(1), 2);
        assert_eq!(selector.item_at(ItemPath::new(1, 1)), Some(5));
        assert_eq!(selector.provider_for_section(0).id(), y.id());
    }

    #[test]
    fn test_select_lifecycle_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = Tracked::new("a", vec![vec![1]], &log);
        let b = Tracked::new("b", vec![vec![2], vec![3]], &log);
        let selector = SelectorProvider::<u32>::new();
        selector.add_child(a.clone());
        selector.add_child(b.clone());

        let observer: Arc<dyn ProviderObserver> = Arc::new(LogObserver(log.clone()));
        selector.set_observer(Some(Arc::downgrade(&observer)));

        selector.select(&*b, None);
        assert_eq!(
            *log.lock(),
            vec!["resign(a)", "remove[0]", "insert[0, 1]", "activate(b)"]
        );
    }

    #[test]
    fn test_select_active_child_completes_immediately() {
        let (selector, x, _) = pair();
        let recorder = Recorder::attach(&*selector);
        let completed = Arc::new(AtomicUsize::new(0));
        let counter = completed.clone();

        selector.select(
            &*x,
            Some(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );

        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert!(recorder.changes().is_empty());
        assert!(recorder.batch_sources().is_empty());
    }

    #[test]
    fn test_select_completion_runs_after_switch() {
        let (selector, _, y) = pair();
        let observed = Arc::new(AtomicUsize::new(0));
        let slot = observed.clone();
        let weak = Arc::downgrade(&selector);

        selector.select(
            &*y,
            Some(Box::new(move || {
                if let Some(selector) = weak.upgrade() {
                    slot.store(selector.section_count(), Ordering::SeqCst);
                }
            })),
        );

        assert_eq!(observed.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn test_select_unregistered_panics() {
        let (selector, _, _) = pair();
        let stranger = LeafProvider::new(vec![vec![0u32]]);
        selector.select(&*stranger, None);
    }

    #[test]
    fn test_select_index() {
        let (selector, _, y) = pair();
        selector.select_index(1, None);
        assert_eq!(selector.active_child(), Some(y.id()));
        assert!(matches!(
            selector.try_select_index(5, None),
            Err(CompositionError::ChildOutOfRange { index: 5, count: 2 })
        ));
    }

    #[test]
    fn test_inactive_child_events_are_dropped() {
        let (selector, x, y) = pair();
        let recorder = Recorder::attach(&*selector);

        y.push_item(0, 9);
        y.push_section(vec![]);
        x.push_item(0, 3);

        assert_eq!(
            recorder.changes(),
            vec![ProviderChange::ItemsInserted(vec![ItemPath::new(0, 2)])]
        );
    }

    #[test]
    fn test_inactive_batch_runs_unforwarded() {
        let (selector, _, y) = pair();
        let recorder = Recorder::attach(&*selector);
        let target = y.clone();

        y.perform_update(Box::new(move || {
            target.push_item(0, 7);
        }), None);

        assert!(recorder.batch_sources().is_empty());
        assert_eq!(y.item_count(0), 2);
    }

    #[test]
    fn test_active_section_events_forwarded() {
        let (selector, x, _) = pair();
        let recorder = Recorder::attach(&*selector);

        x.push_section(vec![8]);
        x.move_section(1, 0);
        x.remove_section(1);

        assert_eq!(
            recorder.changes(),
            vec![
                ProviderChange::SectionsInserted(vec![1]),
                ProviderChange::SectionMoved { from: 1, to: 0 },
                ProviderChange::SectionsRemoved(vec![1]),
            ]
        );
        assert_eq!(selector.section_count(), 1);
    }

    #[test]
    fn test_remove_active_child_goes_idle() {
        let (selector, x, y) = pair();
        let recorder = Recorder::attach(&*selector);

        selector.remove_child(&*x);

        assert_eq!(
            recorder.changes(),
            vec![ProviderChange::SectionsRemoved(vec![0])]
        );
        assert!(selector.active().is_none());
        assert_eq!(selector.active_index(), None);
        assert_eq!(selector.section_count(), 0);
        assert_eq!(selector.item_at(ItemPath::new(0, 0)), None);
        assert!(selector.paths_for(&3).is_empty());

        selector.select(&*y, None);
        assert_eq!(selector.section_count(), 2);
    }

    #[test]
    fn test_remove_inactive_child_keeps_active() {
        let x = LeafProvider::new(vec![vec![1u32]]);
        let y = LeafProvider::new(vec![vec![2u32]]);
        let z = LeafProvider::new(vec![vec![3u32], vec![4]]);
        let selector = SelectorProvider::<u32>::new();
        for child in [&x, &y, &z] {
            selector.add_child(child.clone());
        }
        selector.select(&*z, None);
        let recorder = Recorder::attach(&*selector);

        selector.remove_child(&*x);

        assert!(recorder.changes().is_empty());
        assert_eq!(selector.active_index(), Some(1));
        assert_eq!(selector.active_child(), Some(z.id()));
    }

    #[test]
    fn test_child_titles() {
        let selector = SelectorProvider::<u32>::with_title("Tabs");
        selector.add_child(LeafProvider::<u32>::builder().title("One").build());
        selector.add_child(LeafProvider::<u32>::empty());

        assert_eq!(selector.title().as_deref(), Some("Tabs"));
        assert_eq!(
            selector.child_titles(),
            vec![Some("One".to_string()), None]
        );
    }

    #[test]
    fn test_load_content_targets_active_child() {
        let loads = Arc::new(Mutex::new(Vec::new()));
        let make = |name: &'static str| {
            let loads = loads.clone();
            LeafProvider::<u32>::builder()
                .loader(move |ticket| {
                    loads.lock().push(name);
                    ticket.done(vec![vec![1]]);
                })
                .build()
        };
        let a = make("a");
        let b = make("b");
        let selector = SelectorProvider::<u32>::new();
        selector.add_child(a.clone());
        selector.add_child(b.clone());

        selector.load_content();
        assert_eq!(*loads.lock(), vec!["a"]);

        // Activation loads a child that has never loaded.
        selector.select(&*b, None);
        assert_eq!(*loads.lock(), vec!["a", "b"]);

        selector.reset_content();
        assert_eq!(a.section_count(), 0);
        assert_eq!(b.section_count(), 0);
    }

    #[test]
    fn test_load_events_stop_at_selector() {
        let leaf: Arc<LeafProvider<u32>> = LeafProvider::builder()
            .loader(|ticket| {
                ticket.done(vec![vec![1], vec![2]]);
            })
            .build();
        let selector = SelectorProvider::<u32>::new();
        selector.add_child(leaf.clone());
        let recorder = Recorder::attach(&*selector);

        selector.load_content();

        assert_eq!(recorder.changes(), vec![ProviderChange::Reloaded]);
        assert_eq!(selector.section_count(), 2);
    }
}
