//! Development-mode simulation of provider outcomes.
//!
//! When no native provider is available, a registered [`SimulationStrategy`] may take over a
//! request and decide its outcome, for example from a developer prompt or a test script. The
//! strategy receives a [`SimulationResolver`] owning the caller's continuations; resolving it
//! posts the matching continuation onto the dispatcher. A resolver dropped unresolved reports
//! [`ErrorValue::simulated`], the same as a prompt closed without an answer.

use crate::dispatch::CompletionDispatcher;
use crate::error::ErrorValue;
use crate::types::{FailureCallback, OperationKind, SuccessCallback};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// When a simulation strategy takes requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Every request is simulated.
    #[default]
    Always,
    /// Only the first request in a session is simulated; later ones succeed immediately.
    OncePerSession,
}

/// Owns the continuations of one simulated request.
pub struct SimulationResolver {
    kind: OperationKind,
    dispatcher: Arc<CompletionDispatcher>,
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

impl SimulationResolver {
    pub(crate) fn new(
        kind: OperationKind,
        dispatcher: Arc<CompletionDispatcher>,
        on_success: SuccessCallback,
        on_failure: FailureCallback,
    ) -> Self {
        Self {
            kind,
            dispatcher,
            on_success: Some(on_success),
            on_failure: Some(on_failure),
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn succeed(mut self) {
        self.on_failure = None;
        if let Some(cb) = self.on_success.take() {
            self.dispatcher.post(cb);
        }
    }

    pub fn fail(mut self, error: ErrorValue) {
        self.fail_with(error);
    }

    fn fail_with(&mut self, error: ErrorValue) {
        self.on_success = None;
        if let Some(cb) = self.on_failure.take() {
            self.dispatcher.post(move || cb(error));
        }
    }
}

impl Drop for SimulationResolver {
    fn drop(&mut self) {
        if self.on_success.is_some() || self.on_failure.is_some() {
            self.fail_with(ErrorValue::simulated());
        }
    }
}

impl fmt::Debug for SimulationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationResolver")
            .field("kind", &self.kind)
            .field("resolved", &self.on_success.is_none())
            .finish()
    }
}

/// Injectable capability that simulates the provider in development environments.
pub trait SimulationStrategy: Send + Sync {
    /// Take over `resolver`, or hand it back to decline the request.
    fn present(&self, resolver: SimulationResolver) -> Result<(), SimulationResolver>;
}

/// What a [`ScriptedSimulation`] does with the next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedOutcome {
    Succeed,
    Fail,
    /// Keep the request open until [`ScriptedSimulation::resolve_held`] or
    /// [`ScriptedSimulation::close`].
    Hold,
}

/// Scripted stand-in for a developer prompt.
///
/// Outcomes are consumed in order; once the script is empty each request is held, as a prompt
/// would wait for the developer. Only one request is held at a time; presenting a new one
/// closes the previous prompt.
#[derive(Default)]
pub struct ScriptedSimulation {
    mode: SimulationMode,
    shown_this_session: AtomicBool,
    script: Mutex<VecDeque<SimulatedOutcome>>,
    held: Mutex<Option<SimulationResolver>>,
}

impl ScriptedSimulation {
    pub fn new(mode: SimulationMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_script<I>(mode: SimulationMode, outcomes: I) -> Self
    where
        I: IntoIterator<Item = SimulatedOutcome>,
    {
        let sim = Self::new(mode);
        sim.script.lock().extend(outcomes);
        sim
    }

    pub fn push_outcome(&self, outcome: SimulatedOutcome) {
        self.script.lock().push_back(outcome);
    }

    /// Kind of the request currently held, if any.
    pub fn held_kind(&self) -> Option<OperationKind> {
        self.held.lock().as_ref().map(SimulationResolver::kind)
    }

    /// Answer the held request. Returns false if nothing is held.
    pub fn resolve_held(&self, succeed: bool) -> bool {
        let Some(resolver) = self.held.lock().take() else {
            return false;
        };
        if succeed {
            resolver.succeed();
        } else {
            resolver.fail(ErrorValue::simulated());
        }
        true
    }

    /// Close the prompt without answering; the held request fails.
    pub fn close(&self) {
        drop(self.held.lock().take());
    }
}

impl SimulationStrategy for ScriptedSimulation {
    fn present(&self, resolver: SimulationResolver) -> Result<(), SimulationResolver> {
        let already_shown = self.shown_this_session.swap(true, Ordering::AcqRel);
        if self.mode == SimulationMode::OncePerSession && already_shown {
            return Err(resolver);
        }

        let outcome = self
            .script
            .lock()
            .pop_front()
            .unwrap_or(SimulatedOutcome::Hold);
        tracing::debug!(kind = %resolver.kind(), ?outcome, "Simulating provider request");

        match outcome {
            SimulatedOutcome::Succeed => resolver.succeed(),
            SimulatedOutcome::Fail => resolver.fail(ErrorValue::simulated()),
            SimulatedOutcome::Hold => {
                let previous = self.held.lock().replace(resolver);
                drop(previous);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ScriptedSimulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedSimulation")
            .field("mode", &self.mode)
            .field("held", &self.held_kind())
            .finish()
    }
}
