//! Shared per-provider state.
//!
//! Every provider embeds a [`ProviderBase`]. It owns the provider's identity,
//! its single observer slot and its thread affinity, and it is the only place
//! notifications leave a provider.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use horizon_sections_core::logging::targets;
use horizon_sections_core::{CompositionError, LoadError, ThreadAffinity};

use super::index::ItemPath;
use super::loading::LoadState;
use super::traits::{
    Provider, ProviderChange, ProviderId, ProviderItem, ProviderKind, ProviderObserver,
    SharedProvider, UpdateFn,
};

/// State common to all providers.
///
/// Construct it inside `Arc::new_cyclic` so it can hand out a shared handle
/// to its owner:
///
/// ```ignore
/// Arc::new_cyclic(|weak: &Weak<MyProvider>| {
///     let this: Weak<dyn Provider<Item = String>> = weak.clone();
///     MyProvider { base: ProviderBase::new(ProviderKind::Custom, this) }
/// })
/// ```
pub struct ProviderBase<T: ProviderItem> {
    id: ProviderId,
    kind: ProviderKind,
    affinity: ThreadAffinity,
    this: Weak<dyn Provider<Item = T>>,
    title: RwLock<Option<String>>,
    allows_selection: AtomicBool,
    observer: RwLock<Option<Weak<dyn ProviderObserver>>>,
    load_state: RwLock<LoadState>,
    needs_load: AtomicBool,
}

impl<T: ProviderItem> ProviderBase<T> {
    /// Creates the base for a provider of the given kind.
    ///
    /// The provider's thread affinity is the calling thread.
    pub fn new(kind: ProviderKind, this: Weak<dyn Provider<Item = T>>) -> Self {
        Self {
            id: ProviderId::next(),
            kind,
            affinity: ThreadAffinity::current(),
            this,
            title: RwLock::new(None),
            allows_selection: AtomicBool::new(true),
            observer: RwLock::new(None),
            load_state: RwLock::new(LoadState::Initial),
            needs_load: AtomicBool::new(false),
        }
    }

    /// Sets the initial title.
    pub fn with_title(self, title: Option<String>) -> Self {
        *self.title.write() = title;
        self
    }

    /// Sets the initial selectability.
    pub fn with_selection(self, allows_selection: bool) -> Self {
        self.allows_selection.store(allows_selection, Ordering::Relaxed);
        self
    }

    /// Returns the provider's identity.
    #[inline]
    pub fn id(&self) -> ProviderId {
        self.id
    }

    /// Returns the provider's kind.
    #[inline]
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Returns the provider's thread affinity.
    #[inline]
    pub fn affinity(&self) -> ThreadAffinity {
        self.affinity
    }

    /// Asserts that `operation` runs on the provider's thread.
    #[inline]
    pub fn check_thread(&self, operation: &str) {
        self.affinity.check(operation);
    }

    /// Returns a strong handle to the owning provider.
    ///
    /// # Panics
    ///
    /// Panics if the provider is being dropped.
    pub fn shared(&self) -> SharedProvider<T> {
        match self.this.upgrade() {
            Some(provider) => provider,
            None => panic!("provider {} accessed during teardown", self.id),
        }
    }

    /// Returns the title, if any.
    pub fn title(&self) -> Option<String> {
        self.title.read().clone()
    }

    /// Replaces the title.
    pub fn set_title(&self, title: Option<String>) {
        *self.title.write() = title;
    }

    /// Returns `true` if items of this provider can be selected.
    pub fn allows_selection(&self) -> bool {
        self.allows_selection.load(Ordering::Relaxed)
    }

    /// Sets whether items of this provider can be selected.
    pub fn set_allows_selection(&self, allows_selection: bool) {
        self.allows_selection.store(allows_selection, Ordering::Relaxed);
    }

    // -------------------------------------------------------------------------
    // Observer slot
    // -------------------------------------------------------------------------

    /// Returns the current observer if it is still alive.
    pub fn observer(&self) -> Option<Arc<dyn ProviderObserver>> {
        self.observer.read().as_ref().and_then(Weak::upgrade)
    }

    /// Returns `true` if an observer is attached and alive.
    pub fn has_observer(&self) -> bool {
        self.observer().is_some()
    }

    /// Replaces the observer. Passing `None` detaches the current one.
    pub fn set_observer(&self, observer: Option<Weak<dyn ProviderObserver>>) {
        self.check_thread("set_observer");
        tracing::debug!(
            target: targets::PROVIDER,
            provider = %self.id,
            attached = observer.is_some(),
            "observer replaced"
        );
        *self.observer.write() = observer;
    }

    // -------------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------------

    /// Sends `change` to the observer, if any.
    pub fn notify(&self, change: ProviderChange) {
        self.check_thread(change.name());
        let observer = self.observer();
        tracing::trace!(
            target: targets::PROVIDER,
            provider = %self.id,
            observed = observer.is_some(),
            ?change,
            "notify"
        );
        if let Some(observer) = observer {
            observer.provider_changed(self.id, change);
        }
    }

    /// Announces inserted items.
    pub fn notify_items_inserted(&self, paths: Vec<ItemPath>) {
        self.notify(ProviderChange::ItemsInserted(paths));
    }

    /// Announces removed items.
    pub fn notify_items_removed(&self, paths: Vec<ItemPath>) {
        self.notify(ProviderChange::ItemsRemoved(paths));
    }

    /// Announces items that changed in place.
    pub fn notify_items_refreshed(&self, paths: Vec<ItemPath>) {
        self.notify(ProviderChange::ItemsRefreshed(paths));
    }

    /// Announces a moved item.
    pub fn notify_item_moved(&self, from: ItemPath, to: ItemPath) {
        self.notify(ProviderChange::ItemMoved { from, to });
    }

    /// Announces inserted sections.
    pub fn notify_sections_inserted(&self, sections: Vec<usize>) {
        self.notify(ProviderChange::SectionsInserted(sections));
    }

    /// Announces removed sections.
    pub fn notify_sections_removed(&self, sections: Vec<usize>) {
        self.notify(ProviderChange::SectionsRemoved(sections));
    }

    /// Announces sections that changed in place.
    pub fn notify_sections_refreshed(&self, sections: Vec<usize>) {
        self.notify(ProviderChange::SectionsRefreshed(sections));
    }

    /// Announces a moved section.
    pub fn notify_section_moved(&self, from: usize, to: usize) {
        self.notify(ProviderChange::SectionMoved { from, to });
    }

    /// Announces that everything changed.
    pub fn notify_reloaded(&self) {
        self.notify(ProviderChange::Reloaded);
    }

    /// Announces that a content load is starting.
    pub fn notify_will_load(&self) {
        self.notify(ProviderChange::WillLoad);
    }

    /// Announces that a content load finished.
    pub fn notify_loaded(&self, error: Option<LoadError>) {
        self.notify(ProviderChange::Loaded(error));
    }

    /// Runs `update` as one coalesced batch.
    ///
    /// With an observer the request is handed upward so an enclosing batch can
    /// absorb it; otherwise the update and completion run synchronously.
    pub fn perform_update(&self, update: UpdateFn, completion: Option<UpdateFn>) {
        self.check_thread("perform_update");
        match self.observer() {
            Some(observer) => observer.perform_update(self.id, update, completion),
            None => {
                update();
                if let Some(completion) = completion {
                    completion();
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Returns the current load state.
    pub fn load_state(&self) -> LoadState {
        self.load_state.read().clone()
    }

    /// Moves to `next`, returning the previous state.
    ///
    /// Invalid transitions leave the state untouched.
    pub fn transition_load_state(&self, next: LoadState) -> Result<LoadState, CompositionError> {
        let mut state = self.load_state.write();
        if !state.can_transition_to(&next) {
            tracing::warn!(
                target: targets::PROVIDER,
                provider = %self.id,
                from = state.name(),
                to = next.name(),
                "rejected load state transition"
            );
            return Err(CompositionError::InvalidLoadTransition {
                from: state.name(),
                to: next.name(),
            });
        }
        tracing::debug!(
            target: targets::PROVIDER,
            provider = %self.id,
            from = state.name(),
            to = next.name(),
            "load state changed"
        );
        Ok(std::mem::replace(&mut *state, next))
    }

    /// Marks the content as needing a load. Repeated calls coalesce.
    pub fn set_needs_load_content(&self) {
        if !self.needs_load.swap(true, Ordering::SeqCst) {
            tracing::trace!(target: targets::PROVIDER, provider = %self.id, "load scheduled");
        }
    }

    /// Returns `true` if a load is pending.
    pub fn needs_load(&self) -> bool {
        self.needs_load.load(Ordering::SeqCst)
    }

    /// Clears the pending flag, returning whether a load was pending.
    pub fn take_needs_load(&self) -> bool {
        self.needs_load.swap(false, Ordering::SeqCst)
    }
}

impl<T: ProviderItem> fmt::Debug for ProviderBase<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBase")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("title", &*self.title.read())
            .field("observed", &self.has_observer())
            .field("load_state", &self.load_state.read().name())
            .finish()
    }
}
