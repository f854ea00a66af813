//! Composition root.
//!
//! A [`ConsentContext`] is built once at process start. It owns the completion dispatcher the
//! host drains and the facade the application calls. The native bridge is chosen lazily on
//! first use from the factories registered for the running platform; with none registered the
//! [`UnsupportedBridge`] is used.
//!
//! With `simulation.enabled` set and no strategy supplied, the builder registers a
//! [`ScriptedSimulation`] from the configured mode and script.

use crate::bridge::{NativeBridge, UnsupportedBridge};
use crate::config::RelayConfig;
use crate::dispatch::{CompletionDispatcher, DrainReport};
use crate::facade::ConsentFacade;
use crate::simulation::{ScriptedSimulation, SimulationStrategy};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Target platform for bridge selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Android,
    Ios,
    /// Desktop, server or any development environment.
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Other
        }
    }
}

pub type BridgeFactory = Box<dyn FnOnce() -> Arc<dyn NativeBridge> + Send>;

/// Lazily selected bridge. Selection happens once and is never re-evaluated.
pub(crate) struct BridgeSlot {
    platform: Platform,
    factories: Mutex<HashMap<Platform, BridgeFactory>>,
    selected: OnceLock<Arc<dyn NativeBridge>>,
}

impl BridgeSlot {
    pub(crate) fn new(platform: Platform, factories: HashMap<Platform, BridgeFactory>) -> Self {
        Self {
            platform,
            factories: Mutex::new(factories),
            selected: OnceLock::new(),
        }
    }

    pub(crate) fn get(&self) -> &Arc<dyn NativeBridge> {
        self.selected.get_or_init(|| {
            let factory = self.factories.lock().remove(&self.platform);
            match factory {
                Some(factory) => {
                    debug!(platform = ?self.platform, "Selected native bridge");
                    factory()
                }
                None => {
                    debug!(platform = ?self.platform, "No native bridge registered, using unsupported stub");
                    Arc::new(UnsupportedBridge)
                }
            }
        })
    }
}

pub struct ConsentContext {
    dispatcher: Arc<CompletionDispatcher>,
    facade: ConsentFacade,
    config: RelayConfig,
    scripted: Option<Arc<ScriptedSimulation>>,
}

impl ConsentContext {
    pub fn builder() -> ConsentContextBuilder {
        ConsentContextBuilder::default()
    }

    pub fn facade(&self) -> &ConsentFacade {
        &self.facade
    }

    pub fn dispatcher(&self) -> &Arc<CompletionDispatcher> {
        &self.dispatcher
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Simulation registered from config, if any. Used to answer held requests.
    pub fn scripted_simulation(&self) -> Option<&Arc<ScriptedSimulation>> {
        self.scripted.as_ref()
    }

    /// Run queued completions. Call from the designated context, once per tick.
    pub fn drain(&self) -> DrainReport {
        self.dispatcher.drain()
    }
}

impl fmt::Debug for ConsentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsentContext")
            .field("dispatcher", &self.dispatcher)
            .field("config", &self.config)
            .finish()
    }
}

#[derive(Default)]
pub struct ConsentContextBuilder {
    config: RelayConfig,
    dispatcher: Option<Arc<CompletionDispatcher>>,
    platform: Option<Platform>,
    factories: HashMap<Platform, BridgeFactory>,
    simulation: Option<Arc<dyn SimulationStrategy>>,
}

impl ConsentContextBuilder {
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing dispatcher instead of creating one.
    pub fn dispatcher(mut self, dispatcher: Arc<CompletionDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Override platform detection.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Register a bridge constructor for `platform`. It runs at most once, on first use.
    pub fn bridge_for<F>(mut self, platform: Platform, factory: F) -> Self
    where
        F: FnOnce() -> Arc<dyn NativeBridge> + Send + 'static,
    {
        self.factories.insert(platform, Box::new(factory));
        self
    }

    /// Use `bridge` whatever platform is detected.
    pub fn bridge(mut self, bridge: Arc<dyn NativeBridge>) -> Self {
        let platform = self.platform.unwrap_or_else(Platform::current);
        self.platform = Some(platform);
        self.factories.insert(platform, Box::new(move || bridge));
        self
    }

    pub fn simulation(mut self, strategy: Arc<dyn SimulationStrategy>) -> Self {
        self.simulation = Some(strategy);
        self
    }

    pub fn build(self) -> ConsentContext {
        let dispatcher = self.dispatcher.unwrap_or_else(CompletionDispatcher::shared);
        let platform = self.platform.unwrap_or_else(Platform::current);
        let slot = BridgeSlot::new(platform, self.factories);

        let mut scripted = None;
        let simulation = match self.simulation {
            Some(strategy) => Some(strategy),
            None if self.config.simulation.enabled => {
                let sim = &self.config.simulation;
                debug!(
                    mode = ?sim.mode,
                    script_len = sim.script.len(),
                    "Registering configured simulation"
                );
                let strategy = Arc::new(ScriptedSimulation::with_script(
                    sim.mode,
                    sim.script.clone(),
                ));
                scripted = Some(strategy.clone());
                Some(strategy as Arc<dyn SimulationStrategy>)
            }
            None => None,
        };

        let facade = ConsentFacade::new(slot, dispatcher.clone(), simulation, &self.config);
        ConsentContext {
            dispatcher,
            facade,
            config: self.config,
            scripted,
        }
    }
}
