//! Native Bridge Abstraction
//!
//! Per-platform capability that issues requests to the foreign consent provider and reads its
//! cached state. Requests return immediately; the provider later reports a terminal event
//! through an [`EventSink`], from whatever thread it likes. The sink only ever posts onto the
//! [`CompletionDispatcher`], so nothing on the foreign thread touches gate or pending state.

use crate::dispatch::CompletionDispatcher;
use crate::types::{ConsentStatus, OperationKind};
use std::fmt;
use std::sync::Arc;

mod unsupported;

pub use unsupported::UnsupportedBridge;

/// Foreign callback names, as sent by the native transports.
pub mod callbacks {
    pub const ON_INIT_SUCCESS: &str = "OnInitSuccess";
    pub const ON_INIT_FAILURE: &str = "OnInitFailure";
    pub const ON_SHOW_DISMISSED: &str = "OnShowDismissed";
    pub const ON_SHOW_FAILED: &str = "OnShowFailed";
    pub const ON_RESHOW_DISMISSED: &str = "OnReshowDismissed";
    pub const ON_RESHOW_FAILED: &str = "OnReshowFailed";
}

/// A request issued to the foreign provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeRequest {
    /// Request a consent info update. `options_json` is the encoded init options.
    Init { options_json: String },
    /// Show the consent form if required.
    Show,
    /// Show the privacy options form.
    Reshow,
}

impl BridgeRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            BridgeRequest::Init { .. } => OperationKind::Init,
            BridgeRequest::Show => OperationKind::Show,
            BridgeRequest::Reshow => OperationKind::Reshow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOutcome {
    /// Init succeeded, or the form was dismissed.
    Success,
    /// Raw failure payload as sent by the provider, if any.
    Failure(Option<String>),
    /// The host tore the request down before the provider answered.
    Abandoned,
}

/// One of the outcomes signalled by the provider after a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalEvent {
    pub kind: OperationKind,
    pub outcome: TerminalOutcome,
}

impl TerminalEvent {
    pub fn success(kind: OperationKind) -> Self {
        Self {
            kind,
            outcome: TerminalOutcome::Success,
        }
    }

    pub fn failure(kind: OperationKind, payload: Option<String>) -> Self {
        Self {
            kind,
            outcome: TerminalOutcome::Failure(payload),
        }
    }

    pub fn abandoned(kind: OperationKind) -> Self {
        Self {
            kind,
            outcome: TerminalOutcome::Abandoned,
        }
    }

    /// Map a foreign callback name and its payload to an event.
    ///
    /// Success callbacks ignore the payload. Returns `None` for names outside
    /// [`callbacks`].
    pub fn from_callback(method: &str, payload: Option<&str>) -> Option<Self> {
        let owned = payload.map(str::to_string);
        let event = match method {
            callbacks::ON_INIT_SUCCESS => Self::success(OperationKind::Init),
            callbacks::ON_INIT_FAILURE => Self::failure(OperationKind::Init, owned),
            callbacks::ON_SHOW_DISMISSED => Self::success(OperationKind::Show),
            callbacks::ON_SHOW_FAILED => Self::failure(OperationKind::Show, owned),
            callbacks::ON_RESHOW_DISMISSED => Self::success(OperationKind::Reshow),
            callbacks::ON_RESHOW_FAILED => Self::failure(OperationKind::Reshow, owned),
            _ => return None,
        };
        Some(event)
    }
}

type EventHandler = dyn Fn(TerminalEvent) + Send + Sync;

/// Out-of-band channel through which a bridge reports terminal events.
///
/// Cheap to clone and safe to call from any thread. Every delivery is deferred to the next
/// dispatcher drain.
#[derive(Clone)]
pub struct EventSink {
    dispatcher: Arc<CompletionDispatcher>,
    handler: Arc<EventHandler>,
}

impl EventSink {
    pub fn new<F>(dispatcher: Arc<CompletionDispatcher>, handler: F) -> Self
    where
        F: Fn(TerminalEvent) + Send + Sync + 'static,
    {
        Self {
            dispatcher,
            handler: Arc::new(handler),
        }
    }

    pub fn deliver(&self, event: TerminalEvent) {
        let handler = self.handler.clone();
        self.dispatcher.post(move || handler(event));
    }

    /// Deliver a message from a transport that forwards callback names.
    ///
    /// Returns false and drops the message if the name is not recognised.
    pub fn deliver_callback(&self, method: &str, payload: Option<&str>) -> bool {
        match TerminalEvent::from_callback(method, payload) {
            Some(event) => {
                self.deliver(event);
                true
            }
            None => {
                tracing::warn!(method, "Ignoring unrecognised provider callback");
                false
            }
        }
    }

    /// Report that the host tore down a pending request without an answer.
    pub fn abandon(&self, kind: OperationKind) {
        self.deliver(TerminalEvent::abandoned(kind));
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

/// Per-platform access to the foreign consent provider.
///
/// Reads are synchronous and reflect whatever the provider last reported. TCF reads return an
/// empty string, or `-1` for the GDPR flag, when the value is unavailable.
pub trait NativeBridge: Send + Sync {
    fn is_supported(&self) -> bool;

    fn can_request_ads(&self) -> bool;

    fn consent_status(&self) -> ConsentStatus;

    /// IAB TCF TC string.
    fn tc_string(&self) -> String;

    /// IAB TCF additional consent string.
    fn additional_consent_string(&self) -> String;

    /// IAB TCF purpose consents string.
    fn purpose_consents_string(&self) -> String;

    /// IAB TCF gdprApplies: 0 or 1, or -1 if unknown.
    fn gdpr_applies(&self) -> i32;

    /// Issue `request` without blocking. The outcome must eventually reach `sink`.
    fn request(&self, request: BridgeRequest, sink: EventSink);

    /// Clear the provider's locally cached consent decision.
    fn reset(&self);
}
