//! Recording observer shared by the provider unit tests.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::traits::{Provider, ProviderChange, ProviderId, ProviderObserver, UpdateFn};

/// Records every notification it receives.
pub(crate) struct Recorder {
    events: Mutex<Vec<(ProviderId, ProviderChange)>>,
    batches: Mutex<Vec<ProviderId>>,
}

impl Recorder {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
        })
    }

    /// Installs a new recorder as `provider`'s observer.
    pub(crate) fn attach<P: Provider + ?Sized>(provider: &P) -> Arc<Self> {
        let recorder = Self::new();
        provider.set_observer(Some(recorder.as_weak()));
        recorder
    }

    pub(crate) fn as_weak(self: &Arc<Self>) -> Weak<dyn ProviderObserver> {
        let observer: Arc<dyn ProviderObserver> = self.clone();
        Arc::downgrade(&observer)
    }

    pub(crate) fn events(&self) -> Vec<(ProviderId, ProviderChange)> {
        self.events.lock().clone()
    }

    pub(crate) fn changes(&self) -> Vec<ProviderChange> {
        self.events.lock().iter().map(|(_, change)| change.clone()).collect()
    }

    pub(crate) fn batch_sources(&self) -> Vec<ProviderId> {
        self.batches.lock().clone()
    }

    pub(crate) fn clear(&self) {
        self.events.lock().clear();
        self.batches.lock().clear();
    }
}

impl ProviderObserver for Recorder {
    fn provider_changed(&self, source: ProviderId, change: ProviderChange) {
        self.events.lock().push((source, change));
    }

    fn perform_update(&self, source: ProviderId, update: UpdateFn, completion: Option<UpdateFn>) {
        self.batches.lock().push(source);
        update();
        if let Some(completion) = completion {
            completion();
        }
    }
}
