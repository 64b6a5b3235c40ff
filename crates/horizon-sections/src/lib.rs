//! Horizon Sections - composable, sectioned data providers.
//!
//! Several independent list or grid data sources, each addressing its own
//! sections from zero, are presented to a consumer as one flatly-addressed
//! collection. Containers keep an invertible local/global section mapping
//! per child and re-base change notifications as they bubble up through
//! arbitrarily nested compositions.
//!
//! This crate re-exports everything in `horizon-sections-core`.
//!
//! # Example
//!
//! ```
//! use horizon_sections::{CompositeProvider, ItemPath, LeafProvider, Provider};
//!
//! let favourites = LeafProvider::new(vec![vec!["tea", "coffee"]]);
//! let everything = LeafProvider::new(vec![vec!["juice"], vec!["water", "milk"]]);
//!
//! let menu = CompositeProvider::<&str>::new();
//! menu.add_child(favourites.clone());
//! menu.add_child(everything.clone());
//!
//! assert_eq!(menu.section_count(), 3);
//! assert_eq!(menu.item_at(ItemPath::new(2, 1)), Some("milk"));
//!
//! everything.remove_section(0);
//! assert_eq!(menu.section_count(), 2);
//! ```

pub use horizon_sections_core::*;

pub mod provider;

pub use provider::{
    CompositeProvider, ContentLoader, ItemPath, LeafProvider, LeafProviderBuilder, LoadState,
    LoadTicket, Provider, ProviderBase, ProviderChange, ProviderId, ProviderItem, ProviderKind,
    ProviderObserver, ProviderSignals, ProviderTreeDebug, SectionMapping, SelectorProvider,
    SharedProvider, UpdateFn,
};
