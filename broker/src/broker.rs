//! The discovery broker.
//!
//! Broadcasts `<namespace>:requestProvider`, buffers every
//! `<namespace>:announceProvider` reply in receipt order and notifies
//! observers with a payload-less `providerDetailsUpdated`. Also keeps the
//! user's default wallet (`rdns`) in a durable slot.
//!
//! Discovery never fails: no wallets installed or a host that never answers
//! both show up as an empty buffer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;

use thiserror::Error;

use crate::bus::{Detail, Event, ListenerId, MessageBus};
use crate::config::{BrokerConfig, ConfigError, DEFAULT_NAMESPACE, DEFAULT_SETTLE_WINDOW_MS};
use crate::emitter::{Callback, EventEmitter};
use crate::logging::TARGET;
use crate::providers::ProviderDetail;
use crate::storage::{KeyValueStore, StoreError};

/// Notification emitted after each appended announcement.
pub const PROVIDER_DETAILS_UPDATED: &str = "providerDetailsUpdated";

/// Fixed slot key for the persisted default wallet.
pub const DEFAULT_PROVIDER_KEY: &str = "eip6963.defaultProviderRdns";

pub fn request_event_name(namespace: &str) -> String {
    format!("{namespace}:requestProvider")
}

pub fn announce_event_name(namespace: &str) -> String {
    format!("{namespace}:announceProvider")
}

/// Dispatch an announcement on `bus` the way a wallet extension does.
pub fn announce(bus: &dyn MessageBus, namespace: &str, detail: ProviderDetail) {
    bus.emit(&announce_event_name(namespace), Some(Arc::new(detail) as Detail));
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("default wallet storage failed: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, BrokerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    /// No request in flight, buffer stable.
    Idle,
    /// A request was sent; the buffer may still grow.
    AwaitingAnnouncements,
}

#[derive(Debug)]
struct Cycle {
    number: u64,
    state: DiscoveryState,
}

/// State reachable from the bus listener.
#[derive(Default)]
struct Shared {
    buffer: RwLock<Vec<ProviderDetail>>,
    emitter: EventEmitter,
}

impl Shared {
    fn on_announce(&self, event: &Event) {
        let Some(detail) = event.detail::<ProviderDetail>() else {
            tracing::debug!(target: TARGET, event = %event.name, "ignoring announcement without provider detail");
            return;
        };

        tracing::info!(
            target: TARGET,
            name = %detail.info.name,
            rdns = %detail.info.rdns,
            "received announceProvider"
        );

        self.buffer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(detail.clone());
        metrics::counter!("eip6963_announcements_total").increment(1);

        tracing::debug!(target: TARGET, name = %detail.info.name, "updated wallet provider details");
        self.emitter.emit(PROVIDER_DETAILS_UPDATED);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Discovers EIP-6963 wallets over an injected [`MessageBus`].
pub struct DiscoveryBroker {
    shared: Arc<Shared>,
    bus: Arc<dyn MessageBus>,
    store: Arc<dyn KeyValueStore>,
    namespace: String,
    settle_window: Duration,
    subscription: Mutex<Option<ListenerId>>,
    cycle: Mutex<Cycle>,
}

impl DiscoveryBroker {
    /// Broker on the default `eip6963` namespace.
    pub fn new(bus: Arc<dyn MessageBus>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::build(
            bus,
            store,
            DEFAULT_NAMESPACE.to_string(),
            Duration::from_millis(DEFAULT_SETTLE_WINDOW_MS),
        )
    }

    /// Broker using `config` for namespace, settle window and storage.
    pub fn from_config(
        bus: Arc<dyn MessageBus>,
        config: &BrokerConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(
            bus,
            config.open_store(),
            config.namespace.clone(),
            config.settle_window(),
        ))
    }

    /// Like [`from_config`](Self::from_config) with an explicit store.
    pub fn with_store(
        bus: Arc<dyn MessageBus>,
        store: Arc<dyn KeyValueStore>,
        config: &BrokerConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(
            bus,
            store,
            config.namespace.clone(),
            config.settle_window(),
        ))
    }

    fn build(
        bus: Arc<dyn MessageBus>,
        store: Arc<dyn KeyValueStore>,
        namespace: String,
        settle_window: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            bus,
            store,
            namespace,
            settle_window,
            subscription: Mutex::new(None),
            cycle: Mutex::new(Cycle {
                number: 0,
                state: DiscoveryState::Idle,
            }),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // -----------------------------------------------------------------------
    // Discovery
    // -----------------------------------------------------------------------

    /// Start listening for announcements.
    ///
    /// Calling this again while subscribed does nothing; every announcement
    /// is appended exactly once.
    pub fn subscribe(&self) {
        let mut subscription = lock(&self.subscription);
        if subscription.is_some() {
            tracing::debug!(target: TARGET, "already subscribed to announceProvider");
            return;
        }

        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let id = self.bus.on(
            &announce_event_name(&self.namespace),
            Arc::new(move |event: &Event| {
                if let Some(shared) = shared.upgrade() {
                    shared.on_announce(event);
                }
            }),
        );
        *subscription = Some(id);
        tracing::debug!(target: TARGET, namespace = %self.namespace, "subscribed to announceProvider");
    }

    /// Stop listening. Returns `false` if not subscribed.
    pub fn unsubscribe(&self) -> bool {
        match lock(&self.subscription).take() {
            Some(id) => {
                self.bus.off(id);
                tracing::debug!(target: TARGET, "unsubscribed from announceProvider");
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.subscription).is_some()
    }

    /// Clear the buffer and broadcast `requestProvider`.
    ///
    /// Returns without waiting for replies. Announcements arriving later,
    /// including late replies to an earlier request, land in the new cycle.
    pub fn request_providers(&self) {
        let number = {
            let mut cycle = lock(&self.cycle);
            cycle.number += 1;
            cycle.state = DiscoveryState::AwaitingAnnouncements;
            cycle.number
        };

        self.shared
            .buffer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        metrics::counter!("eip6963_discovery_requests_total").increment(1);

        tracing::info!(target: TARGET, cycle = number, "emitting requestProvider");
        self.bus.emit(&request_event_name(&self.namespace), None);
    }

    /// Mark the current cycle settled. The broker cannot know when all
    /// wallets have answered, so callers decide.
    pub fn settle(&self) {
        lock(&self.cycle).state = DiscoveryState::Idle;
    }

    /// Request providers, wait the settle window, return what arrived.
    pub async fn discover(&self) -> Vec<ProviderDetail> {
        self.request_providers();
        tokio::time::sleep(self.settle_window).await;
        self.settle();
        let providers = self.providers();
        tracing::info!(
            target: TARGET,
            cycle = self.cycle(),
            count = providers.len(),
            "discovery settled"
        );
        providers
    }

    pub fn state(&self) -> DiscoveryState {
        lock(&self.cycle).state
    }

    /// Number of `request_providers` calls so far.
    pub fn cycle(&self) -> u64 {
        lock(&self.cycle).number
    }

    pub fn settle_window(&self) -> Duration {
        self.settle_window
    }

    // -----------------------------------------------------------------------
    // Buffer access
    // -----------------------------------------------------------------------

    /// Snapshot of the buffer in receipt order.
    pub fn providers(&self) -> Vec<ProviderDetail> {
        self.shared
            .buffer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.shared
            .buffer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First buffered record for `rdns`.
    pub fn find(&self, rdns: &str) -> Option<ProviderDetail> {
        self.shared
            .buffer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|d| d.info.rdns == rdns)
            .cloned()
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    pub fn on(&self, event: &str, callback: Callback) -> ListenerId {
        self.shared.emitter.on(event, callback)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.shared.emitter.off(id)
    }

    /// Shorthand for `on(PROVIDER_DETAILS_UPDATED, ..)`.
    pub fn on_update<F>(&self, f: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on(PROVIDER_DETAILS_UPDATED, Arc::new(f))
    }

    // -----------------------------------------------------------------------
    // Default wallet
    // -----------------------------------------------------------------------

    /// Persist `rdns` as the default wallet, replacing any previous value.
    pub fn store_default(&self, rdns: &str) -> Result<()> {
        tracing::info!(target: TARGET, rdns, "storing default wallet");
        self.store.set(DEFAULT_PROVIDER_KEY, rdns)?;
        Ok(())
    }

    pub fn read_default(&self) -> Result<Option<String>> {
        let rdns = self.store.get(DEFAULT_PROVIDER_KEY)?;
        tracing::debug!(target: TARGET, rdns = ?rdns, "read default wallet");
        Ok(rdns)
    }

    pub fn remove_default(&self) -> Result<()> {
        tracing::info!(target: TARGET, "removing default wallet");
        self.store.delete(DEFAULT_PROVIDER_KEY)?;
        Ok(())
    }

    /// The buffered record matching the stored default, if both exist.
    pub fn default_provider(&self) -> Result<Option<ProviderDetail>> {
        Ok(self.read_default()?.and_then(|rdns| self.find(&rdns)))
    }
}

impl Drop for DiscoveryBroker {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
