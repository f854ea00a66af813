//! Stub bridge for environments without a native provider.

use super::{BridgeRequest, EventSink, NativeBridge};
use crate::types::ConsentStatus;

/// Reports unsupported and returns "unavailable" for every read.
///
/// The facade never routes requests here through the gate; `request` is an accepted no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedBridge;

impl NativeBridge for UnsupportedBridge {
    fn is_supported(&self) -> bool {
        false
    }

    fn can_request_ads(&self) -> bool {
        false
    }

    fn consent_status(&self) -> ConsentStatus {
        ConsentStatus::Unknown
    }

    fn tc_string(&self) -> String {
        String::new()
    }

    fn additional_consent_string(&self) -> String {
        String::new()
    }

    fn purpose_consents_string(&self) -> String {
        String::new()
    }

    fn gdpr_applies(&self) -> i32 {
        -1
    }

    fn request(&self, request: BridgeRequest, _sink: EventSink) {
        tracing::debug!(kind = %request.kind(), "Unsupported bridge ignoring request");
    }

    fn reset(&self) {}
}
