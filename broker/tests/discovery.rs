//! Discovery buffer and notification behaviour.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use eip6963_broker::bus::{LocalBus, MessageBus};
use eip6963_broker::{DiscoveryBroker, MemoryStore, PROVIDER_DETAILS_UPDATED, announce};

use common::detail;

fn setup() -> (Arc<LocalBus>, DiscoveryBroker) {
    let bus = Arc::new(LocalBus::new());
    let broker = DiscoveryBroker::new(bus.clone(), Arc::new(MemoryStore::new()));
    broker.subscribe();
    (bus, broker)
}

fn counter(broker: &DiscoveryBroker) -> Arc<AtomicUsize> {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    broker.on_update(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });
    hits
}

// ============================================================================
// Buffering
// ============================================================================

#[test]
fn announcements_accumulate_in_receipt_order() {
    let (bus, broker) = setup();
    broker.request_providers();

    let rdns: Vec<String> = (0..7).map(|i| format!("com.example.wallet{i}")).collect();
    for r in &rdns {
        announce(bus.as_ref(), "eip6963", detail(r, r));
    }

    let got: Vec<String> = broker
        .providers()
        .iter()
        .map(|d| d.info.rdns.clone())
        .collect();
    assert_eq!(got, rdns);
}

#[test]
fn request_resets_buffer_before_new_announcements() {
    let (bus, broker) = setup();
    broker.request_providers();
    announce(bus.as_ref(), "eip6963", detail("io.metamask", "MetaMask"));
    announce(bus.as_ref(), "eip6963", detail("io.rabby", "Rabby"));
    assert_eq!(broker.len(), 2);

    broker.request_providers();
    assert!(broker.is_empty());

    announce(bus.as_ref(), "eip6963", detail("io.rabby", "Rabby"));
    assert_eq!(broker.len(), 1);
    assert_eq!(broker.providers()[0].info.rdns, "io.rabby");
}

#[test]
fn reset_is_visible_to_request_listeners() {
    let (bus, broker) = setup();
    broker.request_providers();
    announce(bus.as_ref(), "eip6963", detail("io.metamask", "MetaMask"));

    let broker = Arc::new(broker);
    let seen_len = Arc::new(AtomicUsize::new(usize::MAX));
    {
        let broker = Arc::downgrade(&broker);
        let seen_len = Arc::clone(&seen_len);
        bus.on(
            "eip6963:requestProvider",
            Arc::new(move |_: &eip6963_broker::Event| {
                if let Some(b) = broker.upgrade() {
                    seen_len.store(b.len(), Ordering::SeqCst);
                }
            }),
        );
    }

    broker.request_providers();
    assert_eq!(seen_len.load(Ordering::SeqCst), 0);
}

#[test]
fn repeated_announcements_are_not_deduplicated() {
    let (bus, broker) = setup();
    broker.request_providers();
    announce(bus.as_ref(), "eip6963", detail("io.metamask", "MetaMask"));
    announce(bus.as_ref(), "eip6963", detail("io.metamask", "MetaMask"));

    let providers = broker.providers();
    assert_eq!(providers.len(), 2);
    assert_ne!(providers[0].info.uuid, providers[1].info.uuid);
    assert!(providers[0].same_wallet(&providers[1]));
    assert_eq!(eip6963_broker::providers::unique_by_rdns(&providers).len(), 1);
}

#[test]
fn unsolicited_announcement_is_accepted() {
    let (bus, broker) = setup();
    announce(bus.as_ref(), "eip6963", detail("io.metamask", "MetaMask"));
    assert_eq!(broker.len(), 1);
    assert_eq!(broker.cycle(), 0);
}

#[test]
fn announcement_before_subscribe_is_missed() {
    let bus = Arc::new(LocalBus::new());
    let broker = DiscoveryBroker::new(bus.clone(), Arc::new(MemoryStore::new()));

    announce(bus.as_ref(), "eip6963", detail("io.metamask", "MetaMask"));
    broker.subscribe();
    assert!(broker.is_empty());
}

#[test]
fn find_returns_first_match() {
    let (bus, broker) = setup();
    announce(bus.as_ref(), "eip6963", detail("io.metamask", "MetaMask"));
    announce(bus.as_ref(), "eip6963", detail("com.coinbase.wallet", "Coinbase Wallet"));

    let found = broker.find("com.coinbase.wallet").unwrap();
    assert_eq!(found.info.name, "Coinbase Wallet");
    assert!(broker.find("io.unknown").is_none());
}

// ============================================================================
// Notifications
// ============================================================================

#[test]
fn one_notification_per_append() {
    let (bus, broker) = setup();
    let hits = counter(&broker);

    broker.request_providers();
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    for i in 0..3 {
        announce(bus.as_ref(), "eip6963", detail(&format!("w{i}"), "W"));
        assert_eq!(hits.load(Ordering::SeqCst), i + 1);
    }
}

#[test]
fn observer_sees_appended_record_on_notification() {
    let (bus, broker) = setup();
    let broker = Arc::new(broker);
    let lens = Arc::new(std::sync::Mutex::new(Vec::new()));
    {
        let weak = Arc::downgrade(&broker);
        let lens = Arc::clone(&lens);
        broker.on(
            PROVIDER_DETAILS_UPDATED,
            Arc::new(move || {
                if let Some(b) = weak.upgrade() {
                    lens.lock().unwrap().push(b.len());
                }
            }),
        );
    }

    announce(bus.as_ref(), "eip6963", detail("io.metamask", "MetaMask"));
    announce(bus.as_ref(), "eip6963", detail("io.rabby", "Rabby"));
    assert_eq!(*lens.lock().unwrap(), vec![1, 2]);
}

#[test]
fn off_stops_notifications() {
    let (bus, broker) = setup();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let id = broker.on_update(move || {
        h.fetch_add(1, Ordering::SeqCst);
    });

    announce(bus.as_ref(), "eip6963", detail("io.metamask", "MetaMask"));
    assert!(broker.off(id));
    announce(bus.as_ref(), "eip6963", detail("io.rabby", "Rabby"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn zero_extensions_no_notification() {
    let (_bus, broker) = setup();
    let hits = counter(&broker);

    broker.request_providers();
    assert!(broker.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn double_subscribe_notifies_once_per_announcement() {
    let (bus, broker) = setup();
    broker.subscribe();
    let hits = counter(&broker);

    announce(bus.as_ref(), "eip6963", detail("io.metamask", "MetaMask"));
    assert_eq!(broker.len(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
