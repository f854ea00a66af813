//! Shared test utilities for integration tests
//!
//! A scriptable native bridge and callback recorders.

use consent_relay::bridge::{BridgeRequest, EventSink, NativeBridge, TerminalEvent};
use consent_relay::config::RelayConfig;
use consent_relay::{ConsentContext, ConsentStatus, ErrorValue, Platform};
use parking_lot::Mutex;
use std::sync::Arc;

/// Bridge that records requests and keeps the latest event sink so tests can answer from any
/// thread.
pub struct FakeBridge {
    pub requests: Mutex<Vec<BridgeRequest>>,
    pub status: Mutex<ConsentStatus>,
    sink: Mutex<Option<EventSink>>,
}

impl FakeBridge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            status: Mutex::new(ConsentStatus::Unknown),
            sink: Mutex::new(None),
        })
    }

    pub fn sink(&self) -> EventSink {
        self.sink.lock().clone().expect("bridge has not received a request")
    }

    pub fn fire(&self, event: TerminalEvent) {
        self.sink().deliver(event);
    }

    /// Deliver `event` from a freshly spawned thread and wait for it to post.
    pub fn fire_from_thread(&self, event: TerminalEvent) {
        let sink = self.sink();
        std::thread::spawn(move || sink.deliver(event))
            .join()
            .expect("foreign thread panicked");
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl NativeBridge for FakeBridge {
    fn is_supported(&self) -> bool {
        true
    }

    fn can_request_ads(&self) -> bool {
        *self.status.lock() == ConsentStatus::Obtained
    }

    fn consent_status(&self) -> ConsentStatus {
        *self.status.lock()
    }

    fn tc_string(&self) -> String {
        "CP-fake".to_string()
    }

    fn additional_consent_string(&self) -> String {
        "1~".to_string()
    }

    fn purpose_consents_string(&self) -> String {
        "1111".to_string()
    }

    fn gdpr_applies(&self) -> i32 {
        1
    }

    fn request(&self, request: BridgeRequest, sink: EventSink) {
        self.requests.lock().push(request);
        *self.sink.lock() = Some(sink);
    }

    fn reset(&self) {
        *self.status.lock() = ConsentStatus::Unknown;
    }
}

pub fn context_with_bridge(bridge: Arc<FakeBridge>, config: RelayConfig) -> ConsentContext {
    ConsentContext::builder()
        .platform(Platform::Android)
        .bridge_for(Platform::Android, move || bridge as Arc<dyn NativeBridge>)
        .config(config)
        .build()
}

/// Ordered log of continuation firings.
#[derive(Clone, Default)]
pub struct CallbackLog(Arc<Mutex<Vec<String>>>);

impl CallbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, label: &str) -> impl FnOnce() + Send + 'static {
        let log = self.0.clone();
        let label = label.to_string();
        move || log.lock().push(format!("{} ok", label))
    }

    pub fn failure(&self, label: &str) -> impl FnOnce(ErrorValue) + Send + 'static {
        let log = self.0.clone();
        let label = label.to_string();
        move |e| log.lock().push(format!("{} err {}", label, e.code))
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}
