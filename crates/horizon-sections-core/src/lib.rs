//! Core systems for Horizon Sections.
//!
//! This crate provides the infrastructure shared by every provider in the
//! Horizon Sections composition engine:
//!
//! - **Errors**: [`CompositionError`] for fallible registration and load-state
//!   transitions, [`LoadError`] for opaque content-load failures
//! - **Thread affinity**: single-threaded checks for mutations and notifications
//! - **Signal/Slot System**: fan-out of change notifications at the UI boundary
//! - **Logging**: `tracing` targets and tree-formatting options
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_sections_core::Signal;
//!
//! let reloaded = Signal::<()>::new();
//! let conn_id = reloaded.connect(|_| println!("reload the table"));
//! reloaded.emit(());
//! reloaded.disconnect(conn_id);
//! ```

mod error;
pub mod logging;
pub mod signal;
pub mod thread_check;

pub use error::{CompositionError, LoadError, Result};
pub use logging::{TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionId, Signal};
pub use thread_check::{ThreadAffinity, are_thread_checks_enabled, set_thread_checks_enabled};
