//! Shared types for consent operations.

use crate::error::ErrorValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Continuation fired when an operation succeeds or its form is dismissed.
pub type SuccessCallback = Box<dyn FnOnce() + Send + 'static>;

/// Continuation fired with the failure of an operation.
pub type FailureCallback = Box<dyn FnOnce(ErrorValue) + Send + 'static>;

/// The three callback-completed operations. At most one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Init,
    Show,
    Reshow,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Init => "init",
            OperationKind::Show => "show",
            OperationKind::Reshow => "reshow",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consent status as last reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConsentStatus {
    #[default]
    Unknown = 0,
    Required = 1,
    NotRequired = 2,
    Obtained = 3,
}

impl ConsentStatus {
    /// Decode the integer the native side reports. Unrecognised values are `Unknown`.
    pub fn from_native(value: i32) -> Self {
        match value {
            1 => ConsentStatus::Required,
            2 => ConsentStatus::NotRequired,
            3 => ConsentStatus::Obtained,
            _ => ConsentStatus::Unknown,
        }
    }
}

/// Debug geography override for testing consent flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugGeography {
    #[default]
    Disabled,
    Eea,
    NotEea,
}

impl DebugGeography {
    pub fn as_native(self) -> i32 {
        match self {
            DebugGeography::Disabled => 0,
            DebugGeography::Eea => 1,
            DebugGeography::NotEea => 2,
        }
    }
}

/// Options for the Init request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitOptions {
    #[serde(default)]
    pub tag_for_under_age_of_consent: bool,
    #[serde(default)]
    pub debug_geography: DebugGeography,
    /// Hashed device identifiers treated as test devices, in order.
    #[serde(default)]
    pub test_device_hashed_ids: Vec<String>,
}

impl InitOptions {
    /// Fill in `defaults` when the caller supplied no test devices.
    pub fn merged_with_default_devices(mut self, defaults: &[String]) -> Self {
        if self.test_device_hashed_ids.is_empty() && !defaults.is_empty() {
            self.test_device_hashed_ids = defaults.to_vec();
        }
        self
    }
}
