//! Root observer exposing a provider tree's changes as signals.
//!
//! A provider has a single observer slot. [`ProviderSignals`] occupies the
//! root's slot and fans every notification out through [`Signal`]s, so
//! several consumers can follow the same tree. It also owns batching: nested
//! `perform_update` requests from anywhere in the tree are coalesced into one
//! batch bracketed by `batch_started` and `batch_finished`.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use horizon_sections_core::logging::{span_names, targets};
use horizon_sections_core::{LoadError, Signal};

use super::traits::{Provider, ProviderChange, ProviderId, ProviderObserver, UpdateFn};

#[derive(Default)]
struct BatchState {
    depth: usize,
    completions: Vec<UpdateFn>,
}

/// Signals emitted for the root of a provider tree.
///
/// Structural changes arrive on [`changed`](Self::changed) already re-based to
/// the root's coordinate space. Load notifications from the root itself go to
/// [`load_started`](Self::load_started) and
/// [`load_finished`](Self::load_finished) instead.
///
/// # Example
///
/// ```
/// use horizon_sections::{LeafProvider, ProviderChange, ProviderSignals};
///
/// let leaf = LeafProvider::new(vec![vec![1, 2]]);
/// let signals = ProviderSignals::attach(&*leaf);
///
/// signals.changed.connect(|change| {
///     if let ProviderChange::ItemsInserted(paths) = change {
///         println!("inserted at {paths:?}");
///     }
/// });
///
/// leaf.push_item(0, 3);
/// ```
pub struct ProviderSignals {
    root: ProviderId,
    batch: Mutex<BatchState>,
    /// Emitted for every structural change of the tree.
    pub changed: Signal<ProviderChange>,
    /// Emitted when the outermost batch starts.
    pub batch_started: Signal<()>,
    /// Emitted when the outermost batch finishes, before its completions run.
    pub batch_finished: Signal<()>,
    /// Emitted when the root starts loading content.
    pub load_started: Signal<()>,
    /// Emitted when the root finished loading content, with the error if the
    /// load failed.
    pub load_finished: Signal<Option<LoadError>>,
}

impl ProviderSignals {
    /// Installs a new signal hub as `root`'s observer.
    ///
    /// The provider only holds a weak reference; keep the returned `Arc`
    /// alive for as long as the signals should fire.
    pub fn attach<P: Provider + ?Sized>(root: &P) -> Arc<Self> {
        let signals = Arc::new(Self {
            root: root.id(),
            batch: Mutex::new(BatchState::default()),
            changed: Signal::new(),
            batch_started: Signal::new(),
            batch_finished: Signal::new(),
            load_started: Signal::new(),
            load_finished: Signal::new(),
        });
        let observer: Arc<dyn ProviderObserver> = signals.clone();
        let observer: Weak<dyn ProviderObserver> = Arc::downgrade(&observer);
        root.set_observer(Some(observer));
        tracing::debug!(target: targets::ROOT, root = %signals.root, "signals attached");
        signals
    }

    /// Detaches from `root` if it is the provider these signals observe.
    pub fn detach<P: Provider + ?Sized>(&self, root: &P) {
        if root.id() == self.root {
            root.set_observer(None);
            tracing::debug!(target: targets::ROOT, root = %self.root, "signals detached");
        }
    }

    /// Returns the observed root's identity.
    pub fn root(&self) -> ProviderId {
        self.root
    }

    /// Returns `true` while a batch is running.
    pub fn is_batching(&self) -> bool {
        self.batch.lock().depth > 0
    }

    /// Returns the current batch nesting depth.
    pub fn batch_depth(&self) -> usize {
        self.batch.lock().depth
    }
}

impl ProviderObserver for ProviderSignals {
    fn provider_changed(&self, source: ProviderId, change: ProviderChange) {
        if source != self.root {
            tracing::warn!(
                target: targets::ROOT,
                root = %self.root,
                %source,
                change = change.name(),
                "change from a provider other than the root"
            );
        }
        match change {
            ProviderChange::WillLoad => self.load_started.emit(()),
            ProviderChange::Loaded(error) => self.load_finished.emit(error),
            change => self.changed.emit(change),
        }
    }

    fn perform_update(&self, source: ProviderId, update: UpdateFn, completion: Option<UpdateFn>) {
        let outermost = {
            let mut batch = self.batch.lock();
            batch.depth += 1;
            if let Some(completion) = completion {
                batch.completions.push(completion);
            }
            batch.depth == 1
        };

        let _span = outermost.then(|| {
            tracing::debug_span!(target: targets::ROOT, span_names::BATCH, %source).entered()
        });
        if outermost {
            self.batch_started.emit(());
        }

        update();

        let finished = {
            let mut batch = self.batch.lock();
            batch.depth -= 1;
            (batch.depth == 0).then(|| std::mem::take(&mut batch.completions))
        };

        if let Some(completions) = finished {
            self.batch_finished.emit(());
            tracing::trace!(
                target: targets::ROOT,
                completions = completions.len(),
                "batch finished"
            );
            for completion in completions {
                completion();
            }
        }
    }
}

impl fmt::Debug for ProviderSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let batch = self.batch.lock();
        f.debug_struct("ProviderSignals")
            .field("root", &self.root)
            .field("batch_depth", &batch.depth)
            .field("pending_completions", &batch.completions.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(ProviderSignals: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::composite::CompositeProvider;
    use crate::provider::index::ItemPath;
    use crate::provider::leaf::LeafProvider;

    fn recording<A: Clone + Send + 'static>(signal: &Signal<A>) -> Arc<Mutex<Vec<A>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        signal.connect(move |value: &A| sink.lock().push(value.clone()));
        log
    }

    #[test]
    fn test_changes_fan_out() {
        let leaf = LeafProvider::new(vec![vec![1u32]]);
        let signals = ProviderSignals::attach(&*leaf);
        let first = recording(&signals.changed);
        let second = recording(&signals.changed);

        leaf.push_item(0, 2);

        let expected = vec![ProviderChange::ItemsInserted(vec![ItemPath::new(0, 1)])];
        assert_eq!(*first.lock(), expected);
        assert_eq!(*second.lock(), expected);
    }

    #[test]
    fn test_load_notifications_use_load_signals() {
        let error = LoadError::msg("timeout");
        let reported = error.clone();
        let leaf: Arc<LeafProvider<u32>> = LeafProvider::builder()
            .loader(move |ticket| {
                ticket.fail(reported.clone());
            })
            .build();
        let signals = ProviderSignals::attach(&*leaf);
        let started = recording(&signals.load_started);
        let finished = recording(&signals.load_finished);
        let changed = recording(&signals.changed);

        leaf.load_content();

        assert_eq!(started.lock().len(), 1);
        let finished = finished.lock();
        assert_eq!(finished.len(), 1);
        assert!(finished[0].as_ref().is_some_and(|e| e.ptr_eq(&error)));
        assert!(changed.lock().is_empty());
    }

    #[test]
    fn test_nested_batches_coalesce() {
        let leaf = LeafProvider::new(vec![vec![0u32]]);
        let signals = ProviderSignals::attach(&*leaf);
        let order = Arc::new(Mutex::new(Vec::<String>::new()));

        for (signal, label) in [
            (&signals.batch_started, "started"),
            (&signals.batch_finished, "finished"),
        ] {
            let order = order.clone();
            signal.connect(move |_| order.lock().push(label.to_string()));
        }

        let inner_leaf = leaf.clone();
        let inner_order = order.clone();
        let outer_order = order.clone();
        let outer_completion = order.clone();
        leaf.perform_update(
            Box::new(move || {
                outer_order.lock().push("outer update".into());
                let nested_order = inner_order.clone();
                inner_leaf.perform_update(
                    Box::new(move || nested_order.lock().push("inner update".into())),
                    Some(Box::new(move || inner_order.lock().push("inner done".into()))),
                );
            }),
            Some(Box::new(move || outer_completion.lock().push("outer done".into()))),
        );

        assert_eq!(
            *order.lock(),
            vec![
                "started",
                "outer update",
                "inner update",
                "finished",
                "outer done",
                "inner done",
            ]
        );
        assert!(!signals.is_batching());
    }

    #[test]
    fn test_batches_from_nested_children_reach_root() {
        let leaf = LeafProvider::new(vec![vec![0u32]]);
        let composite = CompositeProvider::<u32>::new();
        composite.add_child(leaf.clone());
        let signals = ProviderSignals::attach(&*composite);
        let started = recording(&signals.batch_started);
        let changed = recording(&signals.changed);

        let target = leaf.clone();
        leaf.perform_update(Box::new(move || {
            target.push_item(0, 1);
        }), None);

        assert_eq!(started.lock().len(), 1);
        assert_eq!(
            *changed.lock(),
            vec![ProviderChange::ItemsInserted(vec![ItemPath::new(0, 1)])]
        );
        assert_eq!(signals.batch_depth(), 0);
    }

    #[test]
    fn test_detach_stops_delivery() {
        let leaf = LeafProvider::new(vec![vec![1u32]]);
        let signals = ProviderSignals::attach(&*leaf);
        let changed = recording(&signals.changed);

        signals.detach(&*leaf);
        leaf.push_item(0, 2);

        assert!(changed.lock().is_empty());
    }

    #[test]
    fn test_dropped_signals_are_not_called() {
        let leaf = LeafProvider::new(vec![vec![1u32]]);
        drop(ProviderSignals::attach(&*leaf));

        leaf.push_item(0, 2);
        assert!(!leaf.base().has_observer());
    }
}
