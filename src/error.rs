//! Error types for the consent relay.
//!
//! Two families live here. [`ErrorValue`] is the plain failure descriptor handed to an
//! operation's failure continuation; it never travels as a Rust `Err`. [`RelayError`] covers
//! faults in the crate's own plumbing (configuration, logging, payload encoding).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Code reserved for a terminal event whose payload could not be interpreted.
pub const CODE_UNINTERPRETABLE: i32 = -2;

/// Code for admission refusal while another operation is in flight.
pub const CODE_BUSY: i32 = -3;

/// Code for simulated failures and abandoned requests.
pub const CODE_SIMULATED: i32 = -1;

pub const MSG_BUSY: &str = "operation already in progress";
pub const MSG_UNKNOWN: &str = "unknown error";
pub const MSG_MALFORMED: &str = "malformed error payload";
pub const MSG_SIMULATED: &str = "simulated failure";
pub const MSG_ABANDONED: &str = "operation abandoned before completion";

/// Domain tag carried by failures produced by a simulation strategy.
pub const SIMULATION_DOMAIN: &str = "simulation";

/// Structured failure descriptor delivered to failure continuations.
///
/// Either synthesized by the relay (busy, unknown, malformed, simulated) or decoded from a
/// payload sent by the foreign provider. The capitalised keys are what the native side emits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorValue {
    #[serde(default, alias = "Code")]
    pub code: i32,
    #[serde(default, alias = "Message")]
    pub message: String,
    #[serde(default, alias = "Domain")]
    pub domain: String,
}

impl ErrorValue {
    pub fn new(code: i32, message: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            domain: domain.into(),
        }
    }

    /// Admission refused: another operation is active.
    pub fn busy() -> Self {
        Self::new(CODE_BUSY, MSG_BUSY, "")
    }

    /// Failure event arrived without a payload.
    pub fn unknown() -> Self {
        Self::new(CODE_UNINTERPRETABLE, MSG_UNKNOWN, "")
    }

    /// Failure event arrived with a payload that does not decode.
    pub fn malformed() -> Self {
        Self::new(CODE_UNINTERPRETABLE, MSG_MALFORMED, "")
    }

    pub fn simulated() -> Self {
        Self::new(CODE_SIMULATED, MSG_SIMULATED, SIMULATION_DOMAIN)
    }

    /// Implicit failure for a request torn down without a terminal event.
    pub fn abandoned() -> Self {
        Self::new(CODE_SIMULATED, MSG_ABANDONED, "")
    }

    pub fn is_busy(&self) -> bool {
        self.code == CODE_BUSY
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.domain.is_empty() {
            write!(f, "[{}] {}", self.code, self.message)
        } else {
            write!(f, "[{}:{}] {}", self.domain, self.code, self.message)
        }
    }
}

/// Faults in the relay's own setup and plumbing.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging setup failed: {0}")]
    LoggingError(String),

    #[error("Payload encoding failed: {0}")]
    PayloadError(#[from] serde_json::Error),
}

impl From<config::ConfigError> for RelayError {
    fn from(err: config::ConfigError) -> Self {
        RelayError::ConfigError(err.to_string())
    }
}
