//! Sectioned data providers and their composition.
//!
//! A provider exposes items grouped into sections and announces structural
//! changes to a single observer. Providers nest: a composite concatenates
//! its children into one flat section space, a selector shows exactly one
//! child at a time, and both re-base their children's notifications into
//! their own coordinates before passing them up.
//!
//! # Core Types
//!
//! - `Provider`: the trait every provider implements
//! - `ProviderBase`: per-provider state and the `notify_*` primitives
//! - `ProviderChange`: the notifications a provider sends upward
//! - `ItemPath`: a (section, item) position
//! - `SectionMapping`: one child's local/global section translation
//!
//! # Provider Implementations
//!
//! - `LeafProvider`: owns sections of items, optionally loaded on demand
//! - `CompositeProvider`: concatenates an ordered list of children
//! - `SelectorProvider`: shows one active child
//!
//! # Example
//!
//! ```
//! use horizon_sections::provider::{
//!     CompositeProvider, ItemPath, LeafProvider, Provider, ProviderSignals, SelectorProvider,
//! };
//!
//! let pinned = LeafProvider::new(vec![vec!["welcome".to_string()]]);
//! let today = LeafProvider::new(vec![vec!["standup".to_string(), "review".to_string()]]);
//! let week = LeafProvider::new(vec![vec!["planning".to_string()], vec!["retro".to_string()]]);
//!
//! let range = SelectorProvider::<String>::new();
//! range.add_child(today.clone());
//! range.add_child(week.clone());
//!
//! let root = CompositeProvider::<String>::new();
//! root.add_child(pinned.clone());
//! root.add_child(range.clone());
//!
//! let signals = ProviderSignals::attach(&*root);
//! signals.changed.connect(|change| println!("apply {change:?}"));
//!
//! assert_eq!(root.section_count(), 2);
//! assert_eq!(root.item_at(ItemPath::new(1, 1)).as_deref(), Some("review"));
//!
//! range.select(&*week, None);
//! assert_eq!(root.section_count(), 3);
//! ```
//!
//! # Architecture Overview
//!
//! ```text
//!   queries (global → local)          notifications (local → global)
//!
//!   ┌───────────────────┐             ┌───────────────────┐
//!   │  ProviderSignals  │<────────────│ CompositeProvider │
//!   └───────────────────┘             └───────────────────┘
//!                                       │ SectionMapping │
//!                     ┌─────────────────┴───┐        ┌───┴──────────────┐
//!                     │    LeafProvider     │        │ SelectorProvider │
//!                     └─────────────────────┘        └──────────────────┘
//! ```

mod base;
mod composite;
mod debug;
mod index;
mod leaf;
mod loading;
mod mapping;
mod selector;
mod signals;
mod traits;

#[cfg(test)]
mod test_support;

pub use base::ProviderBase;
pub use composite::CompositeProvider;
pub use debug::ProviderTreeDebug;
pub use index::ItemPath;
pub use leaf::{ContentLoader, LeafProvider, LeafProviderBuilder};
pub use loading::{LoadState, LoadTicket};
pub use mapping::SectionMapping;
pub use selector::SelectorProvider;
pub use signals::ProviderSignals;
pub use traits::{
    Provider, ProviderChange, ProviderId, ProviderItem, ProviderKind, ProviderObserver,
    SharedProvider, UpdateFn,
};
