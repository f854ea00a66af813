//! Consent Facade
//!
//! Public entry point for Init, Show, Reshow and Reset, plus the synchronous reads.
//!
//! Operations never block and never run a continuation inline: every outcome, including an
//! immediate busy refusal, arrives through the [`CompletionDispatcher`]. A single global gate
//! admits one operation at a time across all three kinds. Terminal events from the bridge are
//! marshalled through the dispatcher before any gate or pending state is touched, so that state
//! is only ever mutated on the designated context.

use crate::bridge::{BridgeRequest, EventSink, NativeBridge, TerminalEvent, TerminalOutcome};
use crate::config::RelayConfig;
use crate::context::BridgeSlot;
use crate::dispatch::CompletionDispatcher;
use crate::error::ErrorValue;
use crate::gate::OperationGate;
use crate::payload;
use crate::simulation::{SimulationResolver, SimulationStrategy};
use crate::types::{ConsentStatus, FailureCallback, InitOptions, OperationKind, SuccessCallback};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// Continuations of an admitted operation; consumed exactly once.
struct PendingOperation {
    on_success: SuccessCallback,
    on_failure: FailureCallback,
}

struct Inner {
    bridge: BridgeSlot,
    dispatcher: Arc<CompletionDispatcher>,
    gate: OperationGate,
    pending: Mutex<HashMap<OperationKind, PendingOperation>>,
    simulation: Option<Arc<dyn SimulationStrategy>>,
    auto_show: bool,
    default_test_devices: Vec<String>,
    consent_strings_warned: AtomicBool,
}

/// Cheap to clone; clones share the same gate and pending state.
#[derive(Clone)]
pub struct ConsentFacade {
    inner: Arc<Inner>,
}

impl ConsentFacade {
    pub(crate) fn new(
        bridge: BridgeSlot,
        dispatcher: Arc<CompletionDispatcher>,
        simulation: Option<Arc<dyn SimulationStrategy>>,
        config: &RelayConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                bridge,
                dispatcher,
                gate: OperationGate::new(),
                pending: Mutex::new(HashMap::new()),
                simulation,
                auto_show: config.auto_show,
                default_test_devices: config.test_device_hashed_ids.clone(),
                consent_strings_warned: AtomicBool::new(false),
            }),
        }
    }

    fn bridge(&self) -> &Arc<dyn NativeBridge> {
        self.inner.bridge.get()
    }

    pub fn is_supported(&self) -> bool {
        self.bridge().is_supported()
    }

    pub fn can_request_ads(&self) -> bool {
        self.bridge().can_request_ads()
    }

    pub fn consent_status(&self) -> ConsentStatus {
        self.bridge().consent_status()
    }

    /// IAB TCF TC string, or empty if unavailable.
    pub fn tc_string(&self) -> String {
        self.warn_if_consent_strings_unavailable();
        self.bridge().tc_string()
    }

    /// IAB TCF additional consent string, or empty if unavailable.
    pub fn additional_consent_string(&self) -> String {
        self.warn_if_consent_strings_unavailable();
        self.bridge().additional_consent_string()
    }

    /// IAB TCF purpose consents string, or empty if unavailable.
    pub fn purpose_consents_string(&self) -> String {
        self.warn_if_consent_strings_unavailable();
        self.bridge().purpose_consents_string()
    }

    /// IAB TCF gdprApplies: 0 or 1, or -1 if unknown.
    pub fn gdpr_applies(&self) -> i32 {
        self.warn_if_consent_strings_unavailable();
        self.bridge().gdpr_applies()
    }

    /// Whether an operation currently holds the gate.
    pub fn is_busy(&self) -> bool {
        self.inner.gate.is_busy()
    }

    /// Kind of the operation awaiting its terminal event, if any.
    pub fn active_operation(&self) -> Option<OperationKind> {
        self.inner.pending.lock().keys().next().copied()
    }

    /// Request a consent info update.
    ///
    /// `None` options, or options without test devices, pick up the configured default
    /// test-device list.
    pub fn init<S, F>(&self, options: Option<InitOptions>, on_success: S, on_failure: F)
    where
        S: FnOnce() + Send + 'static,
        F: FnOnce(ErrorValue) + Send + 'static,
    {
        let options = options
            .unwrap_or_default()
            .merged_with_default_devices(&self.inner.default_test_devices);
        let request = match payload::encode_init_options(&options) {
            Ok(options_json) => BridgeRequest::Init { options_json },
            Err(e) => {
                warn!(error = %e, "Failed to encode init options");
                self.inner.dispatcher.post(move || on_failure(ErrorValue::unknown()));
                return;
            }
        };
        self.begin(request, Box::new(on_success), Box::new(on_failure));
    }

    /// Show the consent form if required. `on_dismissed` also fires when no form is needed.
    pub fn show<S, F>(&self, on_dismissed: S, on_failure: F)
    where
        S: FnOnce() + Send + 'static,
        F: FnOnce(ErrorValue) + Send + 'static,
    {
        self.begin(BridgeRequest::Show, Box::new(on_dismissed), Box::new(on_failure));
    }

    /// Show the privacy options form.
    pub fn reshow<S, F>(&self, on_dismissed: S, on_failure: F)
    where
        S: FnOnce() + Send + 'static,
        F: FnOnce(ErrorValue) + Send + 'static,
    {
        self.begin(BridgeRequest::Reshow, Box::new(on_dismissed), Box::new(on_failure));
    }

    /// Clear the provider's cached consent decision. Not gated.
    pub fn reset(&self) {
        debug!("Resetting consent information");
        self.bridge().reset();
    }

    fn begin(&self, request: BridgeRequest, on_success: SuccessCallback, on_failure: FailureCallback) {
        let kind = request.kind();
        let bridge = self.bridge().clone();

        if !bridge.is_supported() {
            self.complete_unsupported(kind, on_success, on_failure);
            return;
        }

        if !self.inner.gate.try_begin() {
            warn!(kind = %kind, "Rejecting operation, another is in progress");
            self.inner
                .dispatcher
                .post(move || on_failure(ErrorValue::busy()));
            return;
        }

        debug!(kind = %kind, "Operation admitted");
        self.inner.pending.lock().insert(
            kind,
            PendingOperation {
                on_success,
                on_failure,
            },
        );
        bridge.request(request, self.event_sink());
    }

    fn complete_unsupported(
        &self,
        kind: OperationKind,
        on_success: SuccessCallback,
        on_failure: FailureCallback,
    ) {
        let dispatcher = &self.inner.dispatcher;
        if let Some(strategy) = &self.inner.simulation {
            let resolver = SimulationResolver::new(kind, dispatcher.clone(), on_success, on_failure);
            match strategy.present(resolver) {
                Ok(()) => {}
                Err(declined) => declined.succeed(),
            }
            return;
        }

        debug!(kind = %kind, "Unsupported platform, completing immediately");
        dispatcher.post(on_success);
    }

    fn event_sink(&self) -> EventSink {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        EventSink::new(self.inner.dispatcher.clone(), move |event| {
            if let Some(inner) = weak.upgrade() {
                ConsentFacade { inner }.resolve(event);
            }
        })
    }

    /// Runs on the designated context, from a dispatcher drain.
    fn resolve(&self, event: TerminalEvent) {
        let kind = event.kind;
        let pending = self.inner.pending.lock().remove(&kind);
        self.inner.gate.end();

        let Some(op) = pending else {
            warn!(kind = %kind, "Terminal event with no pending operation");
            return;
        };

        match event.outcome {
            TerminalOutcome::Success => {
                debug!(kind = %kind, "Operation succeeded");
                (op.on_success)();
                if kind == OperationKind::Init && self.inner.auto_show {
                    self.auto_show();
                }
            }
            TerminalOutcome::Failure(raw) => {
                let error = payload::decode_error(raw.as_deref());
                debug!(kind = %kind, error = %error, "Operation failed");
                (op.on_failure)(error);
            }
            TerminalOutcome::Abandoned => {
                debug!(kind = %kind, "Operation abandoned");
                (op.on_failure)(ErrorValue::abandoned());
            }
        }
    }

    fn auto_show(&self) {
        debug!("Auto-showing consent form after init");
        self.show(
            || {},
            |error| warn!(error = %error, "Auto-show failed"),
        );
    }

    fn warn_if_consent_strings_unavailable(&self) {
        if self.inner.consent_strings_warned.load(Ordering::Acquire) {
            return;
        }
        if self.consent_status() == ConsentStatus::Unknown
            && !self.inner.consent_strings_warned.swap(true, Ordering::AcqRel)
        {
            warn!(
                "Consent strings may be unavailable before consent is collected. \
                 Read them after Init and the consent flow complete."
            );
        }
    }
}

impl fmt::Debug for ConsentFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsentFacade")
            .field("busy", &self.is_busy())
            .field("active_operation", &self.active_operation())
            .finish()
    }
}
