//! Core traits for sectioned data providers.
//!
//! This module defines the contract every provider implements, the change
//! notifications providers send to their single observer, and the observer
//! trait that composites, selectors and the root signal hub implement.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use horizon_sections_core::LoadError;

use super::base::ProviderBase;
use super::index::ItemPath;
use super::loading::LoadState;

/// Counter for generating unique provider IDs.
static PROVIDER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique handle identifying a provider.
///
/// Assigned once at construction and used as the lookup key wherever a
/// container needs to find a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(u64);

impl ProviderId {
    pub(crate) fn next() -> Self {
        Self(PROVIDER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value of this ID.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The variant a provider belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Owns raw items.
    Leaf,
    /// Concatenates an ordered list of children.
    Composite,
    /// Shows exactly one of its children at a time.
    Selector,
    /// A user-defined implementation.
    Custom,
}

impl ProviderKind {
    /// Returns a short, human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Leaf => "Leaf",
            ProviderKind::Composite => "Composite",
            ProviderKind::Selector => "Selector",
            ProviderKind::Custom => "Custom",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bounds every item type must satisfy.
///
/// Items are opaque to the engine; they only need to be cloned out of
/// `item_at` and compared in `paths_for`.
pub trait ProviderItem: Clone + PartialEq + Send + Sync + 'static {}

impl<T: Clone + PartialEq + Send + Sync + 'static> ProviderItem for T {}

/// A shared, dynamically-dispatched provider.
pub type SharedProvider<T> = Arc<dyn Provider<Item = T>>;

/// A deferred batch of mutations, or the completion that follows one.
pub type UpdateFn = Box<dyn FnOnce() + Send>;

/// A structural change announced by a provider.
///
/// Indices are expressed in the coordinate space of the provider that sends
/// the notification. Containers re-base them before forwarding.
#[derive(Debug, Clone)]
pub enum ProviderChange {
    /// Items were inserted at the given paths.
    ItemsInserted(Vec<ItemPath>),
    /// Items were removed from the given paths.
    ItemsRemoved(Vec<ItemPath>),
    /// Items at the given paths changed in place.
    ItemsRefreshed(Vec<ItemPath>),
    /// An item moved.
    ItemMoved { from: ItemPath, to: ItemPath },
    /// Sections were inserted.
    SectionsInserted(Vec<usize>),
    /// Sections were removed.
    SectionsRemoved(Vec<usize>),
    /// Sections changed in place.
    SectionsRefreshed(Vec<usize>),
    /// A section moved.
    SectionMoved { from: usize, to: usize },
    /// Everything changed; observers should reload from scratch.
    Reloaded,
    /// A content load is about to start.
    WillLoad,
    /// A content load finished, with the error if it failed.
    Loaded(Option<LoadError>),
}

impl ProviderChange {
    /// Returns a short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderChange::ItemsInserted(_) => "items_inserted",
            ProviderChange::ItemsRemoved(_) => "items_removed",
            ProviderChange::ItemsRefreshed(_) => "items_refreshed",
            ProviderChange::ItemMoved { .. } => "item_moved",
            ProviderChange::SectionsInserted(_) => "sections_inserted",
            ProviderChange::SectionsRemoved(_) => "sections_removed",
            ProviderChange::SectionsRefreshed(_) => "sections_refreshed",
            ProviderChange::SectionMoved { .. } => "section_moved",
            ProviderChange::Reloaded => "reloaded",
            ProviderChange::WillLoad => "will_load",
            ProviderChange::Loaded(_) => "loaded",
        }
    }

    /// Returns `true` for load lifecycle notifications.
    ///
    /// These stop at the immediate parent and are never re-based.
    pub fn is_load_event(&self) -> bool {
        matches!(self, ProviderChange::WillLoad | ProviderChange::Loaded(_))
    }
}

impl PartialEq for ProviderChange {
    fn eq(&self, other: &Self) -> bool {
        use ProviderChange::*;
        match (self, other) {
            (ItemsInserted(a), ItemsInserted(b))
            | (ItemsRemoved(a), ItemsRemoved(b))
            | (ItemsRefreshed(a), ItemsRefreshed(b)) => a == b,
            (ItemMoved { from: fa, to: ta }, ItemMoved { from: fb, to: tb }) => {
                fa == fb && ta == tb
            }
            (SectionsInserted(a), SectionsInserted(b))
            | (SectionsRemoved(a), SectionsRemoved(b))
            | (SectionsRefreshed(a), SectionsRefreshed(b)) => a == b,
            (SectionMoved { from: fa, to: ta }, SectionMoved { from: fb, to: tb }) => {
                fa == fb && ta == tb
            }
            (Reloaded, Reloaded) | (WillLoad, WillLoad) => true,
            (Loaded(a), Loaded(b)) => match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => a.ptr_eq(b),
                _ => false,
            },
            _ => false,
        }
    }
}

/// The receiving end of a provider's single observer slot.
///
/// A provider holds at most one observer, as a weak reference. Composites and
/// selectors observe their children; [`ProviderSignals`](super::ProviderSignals)
/// observes the root of a tree.
pub trait ProviderObserver: Send + Sync {
    /// Called when the provider identified by `source` announces a change.
    fn provider_changed(&self, source: ProviderId, change: ProviderChange);

    /// Called when `source` requests that `update` run as one coalesced batch.
    ///
    /// The default runs the update and then the completion immediately.
    fn perform_update(&self, source: ProviderId, update: UpdateFn, completion: Option<UpdateFn>) {
        let _ = source;
        update();
        if let Some(completion) = completion {
            completion();
        }
    }
}

/// The capability contract every provider implements.
///
/// A provider exposes a number of sections, each holding a number of items,
/// addressed in the provider's own (local) coordinate space. Providers are
/// always shared as `Arc`s; the concrete constructors in this crate return
/// `Arc<Self>`.
///
/// # Implementation Requirements
///
/// At minimum, implement [`base`](Provider::base),
/// [`section_count`](Provider::section_count),
/// [`item_count`](Provider::item_count), [`item_at`](Provider::item_at) and
/// [`paths_for`](Provider::paths_for). Mutations must be announced through
/// the `notify_*` methods of the [`ProviderBase`], after the data has changed
/// and with no locks held.
pub trait Provider: Send + Sync {
    /// The opaque item type.
    type Item: ProviderItem;

    /// Returns the shared per-provider state.
    fn base(&self) -> &ProviderBase<Self::Item>;

    /// Returns the number of sections currently exposed.
    fn section_count(&self) -> usize;

    /// Returns the number of items in `section`.
    ///
    /// # Panics
    ///
    /// Panics if `section >= section_count()`.
    fn item_count(&self, section: usize) -> usize;

    /// Returns the item at `path`, or `None` if the path no longer addresses
    /// a current item.
    fn item_at(&self, path: ItemPath) -> Option<Self::Item>;

    /// Returns every path at which `item` currently appears.
    fn paths_for(&self, item: &Self::Item) -> Vec<ItemPath>;

    /// Resolves the provider that actually backs `section`.
    ///
    /// The default returns this provider.
    fn provider_for_section(&self, section: usize) -> SharedProvider<Self::Item> {
        let count = self.section_count();
        if section >= count {
            panic_section_out_of_range(self.id(), section, count);
        }
        self.base().shared()
    }

    /// Returns the direct children of this provider, in order.
    fn children(&self) -> Vec<SharedProvider<Self::Item>> {
        Vec::new()
    }

    /// Returns the currently visible child, for providers that show one child
    /// at a time.
    fn active_child(&self) -> Option<ProviderId> {
        None
    }

    /// Called when the provider becomes visible.
    fn became_active(&self) {}

    /// Called when the provider is about to stop being visible.
    fn will_resign_active(&self) {}

    /// (Re)populates the provider's content.
    fn load_content(&self) {}

    /// Discards the provider's content.
    fn reset_content(&self) {}

    /// Runs a pending content load requested via
    /// [`set_needs_load_content`](Provider::set_needs_load_content).
    fn load_if_needed(&self) {
        if self.base().take_needs_load() {
            self.load_content();
        }
    }

    // -------------------------------------------------------------------------
    // Convenience methods
    // -------------------------------------------------------------------------

    /// Returns this provider's identity.
    fn id(&self) -> ProviderId {
        self.base().id()
    }

    /// Returns this provider's kind.
    fn kind(&self) -> ProviderKind {
        self.base().kind()
    }

    /// Returns the human-readable title, if any.
    fn title(&self) -> Option<String> {
        self.base().title()
    }

    /// Returns `true` if items of this provider can be selected.
    fn allows_selection(&self) -> bool {
        self.base().allows_selection()
    }

    /// Returns the current load state.
    fn load_state(&self) -> LoadState {
        self.base().load_state()
    }

    /// Replaces the observer. Passing `None` detaches the current one.
    fn set_observer(&self, observer: Option<Weak<dyn ProviderObserver>>) {
        self.base().set_observer(observer);
    }

    /// Marks the content as needing a load; repeated calls coalesce.
    fn set_needs_load_content(&self) {
        self.base().set_needs_load_content();
    }

    /// Requests that `update` run as one coalesced batch.
    fn perform_update(&self, update: UpdateFn, completion: Option<UpdateFn>) {
        self.base().perform_update(update, completion);
    }
}

#[cold]
#[inline(never)]
pub(crate) fn panic_section_out_of_range(provider: ProviderId, section: usize, count: usize) -> ! {
    panic!("provider {provider}: section {section} is out of range (section count is {count})")
}
