//! Consent Relay host binary
//!
//! Demonstration host: drains the dispatcher on a fixed tick and runs the Init → Show flow
//! against a provider that answers from its own threads, or with `--no-provider` against the
//! unsupported stub and whatever simulation the config registers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use consent_relay::bridge::{BridgeRequest, EventSink, NativeBridge, TerminalEvent};
use consent_relay::config::{parse_device_id_list, ConfigLoader, RelayConfig};
use consent_relay::error::ErrorValue;
use consent_relay::logging::init_logging;
use consent_relay::payload::encode_error;
use consent_relay::{ConsentContext, ConsentStatus, OperationKind, Platform};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "consent-relay", version, about = "Consent relay host harness")]
struct Cli {
    /// Workspace directory searched for consent-relay.toml
    #[arg(long, default_value = ".")]
    workspace: PathBuf,

    /// Explicit config file (skips the layered lookup)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable logging
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run Init then Show against a threaded provider
    Simulate {
        /// Make the provider fail Init
        #[arg(long)]
        fail_init: bool,

        /// Make the provider fail Show
        #[arg(long)]
        fail_show: bool,

        /// Provider response latency in milliseconds
        #[arg(long, default_value_t = 50)]
        latency_ms: u64,

        /// Host tick interval in milliseconds
        #[arg(long, default_value_t = 16)]
        tick_ms: u64,

        /// Run without a provider; held simulated requests are accepted on the next tick
        #[arg(long)]
        no_provider: bool,

        /// Test device ids, comma or newline separated, replacing the configured list
        #[arg(long)]
        test_devices: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

/// Provider stand-in that answers every request from a fresh thread.
struct ThreadedProvider {
    latency: Duration,
    fail_init: bool,
    fail_show: bool,
    status: Arc<Mutex<ConsentStatus>>,
}

impl ThreadedProvider {
    fn answer(&self, kind: OperationKind) -> TerminalEvent {
        let fail = match kind {
            OperationKind::Init => self.fail_init,
            OperationKind::Show | OperationKind::Reshow => self.fail_show,
        };
        if !fail {
            return TerminalEvent::success(kind);
        }
        let payload = encode_error(&ErrorValue::new(1, format!("{} failed", kind), "provider")).ok();
        TerminalEvent::failure(kind, payload)
    }
}

impl NativeBridge for ThreadedProvider {
    fn is_supported(&self) -> bool {
        true
    }

    fn can_request_ads(&self) -> bool {
        matches!(
            *self.status.lock(),
            ConsentStatus::Obtained | ConsentStatus::NotRequired
        )
    }

    fn consent_status(&self) -> ConsentStatus {
        *self.status.lock()
    }

    fn tc_string(&self) -> String {
        match *self.status.lock() {
            ConsentStatus::Obtained => "CPzHq4APzHq4AAHABBENAUEAAAAAAAAAAAAAAAAAAAAA".to_string(),
            _ => String::new(),
        }
    }

    fn additional_consent_string(&self) -> String {
        String::new()
    }

    fn purpose_consents_string(&self) -> String {
        String::new()
    }

    fn gdpr_applies(&self) -> i32 {
        match *self.status.lock() {
            ConsentStatus::Unknown => -1,
            _ => 1,
        }
    }

    fn request(&self, request: BridgeRequest, sink: EventSink) {
        let kind = request.kind();
        let event = self.answer(kind);
        let latency = self.latency;
        let status = self.status.clone();
        std::thread::spawn(move || {
            std::thread::sleep(latency);
            if event.outcome == consent_relay::TerminalOutcome::Success {
                *status.lock() = match kind {
                    OperationKind::Init => ConsentStatus::Required,
                    OperationKind::Show | OperationKind::Reshow => ConsentStatus::Obtained,
                };
            }
            sink.deliver(event);
        });
    }

    fn reset(&self) {
        *self.status.lock() = ConsentStatus::Unknown;
    }
}

fn load_config(cli: &Cli) -> Result<RelayConfig> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load(&cli.workspace).context("loading layered config")?,
    };
    if cli.quiet {
        config.debug_logging = false;
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config.effective_logging()).context("initializing logging")?;

    match cli.command {
        Command::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Simulate {
            fail_init,
            fail_show,
            latency_ms,
            tick_ms,
            no_provider,
            test_devices,
        } => {
            let mut config = config;
            if let Some(list) = test_devices {
                config.test_device_hashed_ids = parse_device_id_list(&list);
            }
            let builder = ConsentContext::builder().config(config);
            let context = if no_provider {
                builder.platform(Platform::Other).build()
            } else {
                builder
                    .bridge(Arc::new(ThreadedProvider {
                        latency: Duration::from_millis(latency_ms),
                        fail_init,
                        fail_show,
                        status: Arc::new(Mutex::new(ConsentStatus::Unknown)),
                    }))
                    .build()
            };
            simulate(context, tick_ms).await
        }
    }
}

async fn simulate(context: ConsentContext, tick_ms: u64) -> Result<()> {
    let facade = context.facade().clone();

    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<std::result::Result<(), ErrorValue>>();

    info!("Starting consent flow");
    let after_init = facade.clone();
    let init_done = done_tx.clone();
    facade.init(
        None,
        move || {
            info!("Init succeeded");
            let ok = init_done.clone();
            after_init.show(
                move || {
                    let _ = ok.send(Ok(()));
                },
                move |e| {
                    let _ = init_done.send(Err(e));
                },
            );
        },
        move |e| {
            let _ = done_tx.send(Err(e));
        },
    );

    let mut ticker = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
    let outcome = loop {
        ticker.tick().await;
        if let Some(sim) = context.scripted_simulation() {
            if let Some(kind) = sim.held_kind() {
                info!(kind = %kind, "Accepting simulated prompt");
                sim.resolve_held(true);
            }
        }
        context.drain();
        if let Ok(outcome) = done_rx.try_recv() {
            break outcome;
        }
    };

    match outcome {
        Ok(()) => {
            info!(
                status = ?facade.consent_status(),
                can_request_ads = facade.can_request_ads(),
                "Consent flow complete"
            );
            println!("consent status: {:?}", facade.consent_status());
            println!("can request ads: {}", facade.can_request_ads());
            println!("tc string: {}", facade.tc_string());
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Consent flow failed");
            anyhow::bail!("consent flow failed: {}", e)
        }
    }
}
