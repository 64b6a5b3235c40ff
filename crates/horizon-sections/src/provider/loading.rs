//! Content loading state.
//!
//! Providers whose content arrives asynchronously track a [`LoadState`]. A
//! leaf hands its loader a single-use [`LoadTicket`]; the loader completes
//! the ticket, immediately or later, on the provider's thread. Starting a
//! new load supersedes every outstanding ticket, and superseded tickets are
//! ignored when they complete.

use std::fmt;
use std::sync::Weak;

use horizon_sections_core::LoadError;

use super::leaf::LeafProvider;
use super::traits::ProviderItem;

/// The current state of a provider's content.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    /// Nothing has been loaded yet.
    #[default]
    Initial,
    /// The first load (or a load after a reset or failure) is running.
    Loading,
    /// Content is loaded and non-empty.
    Loaded,
    /// The last load succeeded but produced no items.
    NoContent,
    /// The last load failed.
    Error(LoadError),
    /// Content is present and a reload is running.
    Refreshing,
}

impl LoadState {
    /// Returns the state name, for logging and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            LoadState::Initial => "Initial",
            LoadState::Loading => "Loading",
            LoadState::Loaded => "Loaded",
            LoadState::NoContent => "NoContent",
            LoadState::Error(_) => "Error",
            LoadState::Refreshing => "Refreshing",
        }
    }

    /// Returns `true` while a load is running.
    #[inline]
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading | LoadState::Refreshing)
    }

    /// Returns `true` once a load has finished, successfully or not.
    #[inline]
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            LoadState::Loaded | LoadState::NoContent | LoadState::Error(_)
        )
    }

    /// Returns the error if the last load failed.
    #[inline]
    pub fn error(&self) -> Option<&LoadError> {
        match self {
            LoadState::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` if moving from this state to `next` is allowed.
    pub fn can_transition_to(&self, next: &LoadState) -> bool {
        use LoadState::*;
        match (self, next) {
            (_, Initial) => true,
            (Initial | Loaded | NoContent | Error(_), Loading) => true,
            (Loaded | NoContent | Error(_), Refreshing) => true,
            // A new load supersedes the running one.
            (Loading, Loading) | (Refreshing, Refreshing) => true,
            (Loading | Refreshing, Loaded | NoContent | Error(_)) => true,
            _ => false,
        }
    }

    /// Returns the state a new load should start in.
    ///
    /// Providers that already show content refresh in place.
    pub(crate) fn loading_successor(&self) -> LoadState {
        match self {
            LoadState::Loaded | LoadState::NoContent | LoadState::Refreshing => {
                LoadState::Refreshing
            }
            _ => LoadState::Loading,
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Error(err) => write!(f, "Error({err})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Single-use handle through which a loader reports one load's outcome.
///
/// Dropping a ticket without completing it leaves the provider in its
/// loading state until the next load or reset.
#[must_use = "a load ticket must be completed for the provider to leave its loading state"]
pub struct LoadTicket<T: ProviderItem> {
    provider: Weak<LeafProvider<T>>,
    generation: u64,
}

impl<T: ProviderItem> LoadTicket<T> {
    pub(crate) fn new(provider: Weak<LeafProvider<T>>, generation: u64) -> Self {
        Self {
            provider,
            generation,
        }
    }

    /// Returns the load generation this ticket belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Completes the load with new content (one `Vec` per section) or an error.
    ///
    /// Returns `false` if the ticket was superseded or the provider is gone.
    pub fn complete(self, result: Result<Vec<Vec<T>>, LoadError>) -> bool {
        match self.provider.upgrade() {
            Some(provider) => provider.finish_load(self.generation, result),
            None => false,
        }
    }

    /// Completes the load successfully with new content.
    pub fn done(self, sections: Vec<Vec<T>>) -> bool {
        self.complete(Ok(sections))
    }

    /// Completes the load with a failure.
    pub fn fail(self, error: LoadError) -> bool {
        self.complete(Err(error))
    }
}

impl<T: ProviderItem> fmt::Debug for LoadTicket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadTicket")
            .field("generation", &self.generation)
            .finish()
    }
}
