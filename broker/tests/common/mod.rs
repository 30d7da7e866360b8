//! Fake wallet extensions for broker tests.

#![allow(dead_code)]

use std::sync::{Arc, Weak};
use std::time::Duration;

use eip6963_broker::bus::{Event, LocalBus, MessageBus};
use eip6963_broker::{
    Eip1193Provider, ProviderDetail, ProviderInfo, ProviderRpcError, RequestArguments, announce,
};
use serde_json::{Value, json};

/// Wallet stub answering `eth_chainId` only.
pub struct StubProvider {
    pub chain_id: &'static str,
}

impl Eip1193Provider for StubProvider {
    async fn request(&self, args: RequestArguments) -> Result<Value, ProviderRpcError> {
        match args.method.as_str() {
            "eth_chainId" => Ok(json!(self.chain_id)),
            other => Err(ProviderRpcError::unsupported_method(other)),
        }
    }
}

/// A record as a wallet would announce it, with a fresh uuid.
pub fn detail(rdns: &str, name: &str) -> ProviderDetail {
    ProviderDetail::new(
        ProviderInfo {
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            icon: "data:image/svg+xml;base64,PHN2Zy8+".to_string(),
            rdns: rdns.to_string(),
        },
        Arc::new(StubProvider { chain_id: "0x1" }),
    )
}

/// Install a wallet that answers every `requestProvider` synchronously.
pub fn install_wallet(bus: &Arc<LocalBus>, rdns: &'static str, name: &'static str) {
    let weak: Weak<LocalBus> = Arc::downgrade(bus);
    bus.on(
        "eip6963:requestProvider",
        Arc::new(move |_: &Event| {
            if let Some(bus) = weak.upgrade() {
                announce(bus.as_ref(), "eip6963", detail(rdns, name));
            }
        }),
    );
}

/// Install a wallet that answers after `delay` on the tokio runtime.
pub fn install_slow_wallet(
    bus: &Arc<LocalBus>,
    rdns: &'static str,
    name: &'static str,
    delay: Duration,
) {
    let weak: Weak<LocalBus> = Arc::downgrade(bus);
    bus.on(
        "eip6963:requestProvider",
        Arc::new(move |_: &Event| {
            let weak = weak.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(bus) = weak.upgrade() {
                    announce(bus.as_ref(), "eip6963", detail(rdns, name));
                }
            });
        }),
    );
}
