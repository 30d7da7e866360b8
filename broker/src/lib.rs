//! EIP-6963 wallet discovery broker.
//!
//! Discovers injected wallet providers over an in-page event bus:
//! - broadcast `eip6963:requestProvider`
//! - buffer every `eip6963:announceProvider` reply in receipt order
//! - notify observers with `providerDetailsUpdated`
//!
//! The user's chosen default wallet (`rdns`) is kept in a durable key-value
//! slot backed by memory, a JSON file or the OS keychain.
//!
//! Note: this crate neither implements a wallet nor any EIP-1193 RPC method.
//! Provider handles are stored and handed back untouched.

pub mod broker;
pub mod bus;
pub mod config;
pub mod emitter;
pub mod logging;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use broker::{
    BrokerError, DEFAULT_PROVIDER_KEY, DiscoveryBroker, DiscoveryState, PROVIDER_DETAILS_UPDATED,
    announce,
};
pub use bus::{Event, ListenerId, LocalBus, MessageBus};
pub use config::{BrokerConfig, StorageConfig};
pub use providers::{
    Eip1193Provider, Eip1193ProviderDyn, ProviderDetail, ProviderHandle, ProviderInfo,
    ProviderRpcError, RequestArguments, RequestParams,
};
pub use storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore, StoreError};
