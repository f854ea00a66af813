//! Consent Relay: single-flight consent operations with ordered callback delivery
//!
//! Runs Init, Show and Reshow against a native consent provider one at a time, and delivers
//! their completions, which may arrive on any thread, in FIFO order on the host's designated
//! context.

pub mod bridge;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod facade;
pub mod gate;
pub mod logging;
pub mod payload;
pub mod simulation;
pub mod types;

pub use bridge::{BridgeRequest, EventSink, NativeBridge, TerminalEvent, TerminalOutcome};
pub use context::{ConsentContext, Platform};
pub use dispatch::CompletionDispatcher;
pub use error::{ErrorValue, RelayError};
pub use facade::ConsentFacade;
pub use types::{ConsentStatus, DebugGeography, InitOptions, OperationKind};
