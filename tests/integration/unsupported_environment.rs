//! Behaviour with no native provider installed, with and without a simulation strategy.

use super::test_utils::CallbackLog;
use consent_relay::config::RelayConfig;
use consent_relay::simulation::{ScriptedSimulation, SimulatedOutcome, SimulationMode};
use consent_relay::{ConsentContext, ConsentStatus, OperationKind, Platform};
use std::sync::Arc;

fn unsupported_context() -> ConsentContext {
    ConsentContext::builder().platform(Platform::Other).build()
}

#[test]
fn test_reads_report_unavailable() {
    let ctx = unsupported_context();
    let facade = ctx.facade();
    assert!(!facade.is_supported());
    assert!(!facade.can_request_ads());
    assert_eq!(facade.consent_status(), ConsentStatus::Unknown);
    assert_eq!(facade.tc_string(), "");
    assert_eq!(facade.additional_consent_string(), "");
    assert_eq!(facade.purpose_consents_string(), "");
    assert_eq!(facade.gdpr_applies(), -1);
}

#[test]
fn test_operations_succeed_without_setting_gate() {
    let ctx = unsupported_context();
    let facade = ctx.facade();
    let log = CallbackLog::new();

    facade.init(None, log.success("init"), log.failure("init"));
    assert!(!facade.is_busy());
    facade.show(log.success("show"), log.failure("show"));
    assert!(!facade.is_busy());
    facade.reshow(log.success("reshow"), log.failure("reshow"));
    assert!(!facade.is_busy());
    facade.reset();

    assert!(log.entries().is_empty());
    ctx.drain();
    assert_eq!(log.entries(), vec!["init ok", "show ok", "reshow ok"]);
}

#[test]
fn test_simulation_scripted_outcomes() {
    let sim = Arc::new(ScriptedSimulation::with_script(
        SimulationMode::Always,
        [SimulatedOutcome::Succeed, SimulatedOutcome::Fail],
    ));
    let ctx = ConsentContext::builder()
        .platform(Platform::Other)
        .simulation(sim.clone())
        .build();
    let facade = ctx.facade();
    let log = CallbackLog::new();

    facade.init(None, log.success("init"), log.failure("init"));
    facade.show(log.success("show"), log.failure("show"));
    facade.reshow(log.success("reshow"), log.failure("reshow"));
    assert_eq!(sim.held_kind(), Some(OperationKind::Reshow));

    ctx.drain();
    assert_eq!(log.entries(), vec!["init ok", "show err -1"]);

    assert!(sim.resolve_held(true));
    ctx.drain();
    assert_eq!(log.entries(), vec!["init ok", "show err -1", "reshow ok"]);
}

#[test]
fn test_simulation_once_per_session_falls_back_to_success() {
    let sim = Arc::new(ScriptedSimulation::with_script(
        SimulationMode::OncePerSession,
        [SimulatedOutcome::Fail],
    ));
    let ctx = ConsentContext::builder()
        .platform(Platform::Other)
        .config(RelayConfig::default())
        .simulation(sim)
        .build();
    let facade = ctx.facade();
    let log = CallbackLog::new();

    facade.init(None, log.success("init"), log.failure("init"));
    facade.show(log.success("show"), log.failure("show"));
    ctx.drain();

    assert_eq!(log.entries(), vec!["init err -1", "show ok"]);
}

#[test]
fn test_closed_prompt_reports_failure() {
    let sim = Arc::new(ScriptedSimulation::new(SimulationMode::Always));
    let ctx = ConsentContext::builder()
        .platform(Platform::Other)
        .simulation(sim.clone())
        .build();
    let log = CallbackLog::new();

    ctx.facade().show(log.success("show"), log.failure("show"));
    ctx.drain();
    assert!(log.entries().is_empty());

    sim.close();
    ctx.drain();
    assert_eq!(log.entries(), vec!["show err -1"]);
}
