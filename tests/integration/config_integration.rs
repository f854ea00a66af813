//! Integration tests for the configuration system

use super::test_utils::{context_with_bridge, CallbackLog, FakeBridge};
use consent_relay::config::{ConfigLoader, WORKSPACE_CONFIG_FILE};
use consent_relay::simulation::SimulationMode;
use consent_relay::{BridgeRequest, ConsentContext, OperationKind, Platform, TerminalEvent};
use tempfile::TempDir;

#[test]
fn test_config_file_drives_default_devices_and_auto_show() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("relay.toml");
    std::fs::write(
        &config_file,
        r#"
auto_show = true
debug_logging = false
test_device_hashed_ids = ["33BE2250B43518CCDA7DE426D04EE231"]

[simulation]
mode = "once_per_session"

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.auto_show);
    assert_eq!(config.simulation.mode, SimulationMode::OncePerSession);
    assert_eq!(config.logging.format, "json");
    assert!(!config.effective_logging().enabled);

    let bridge = FakeBridge::new();
    let ctx = context_with_bridge(bridge.clone(), config);
    let log = CallbackLog::new();
    ctx.facade().init(None, log.success("init"), log.failure("init"));

    let options_json = match &bridge.requests.lock()[0] {
        BridgeRequest::Init { options_json } => options_json.clone(),
        other => panic!("unexpected request {:?}", other),
    };
    let value: serde_json::Value = serde_json::from_str(&options_json).unwrap();
    assert_eq!(
        value["TestDeviceHashedIds"],
        serde_json::json!(["33BE2250B43518CCDA7DE426D04EE231"])
    );

    bridge.fire(TerminalEvent::success(OperationKind::Init));
    ctx.drain();
    assert_eq!(log.entries(), vec!["init ok"]);
    assert_eq!(ctx.facade().active_operation(), Some(OperationKind::Show));
}

#[test]
fn test_invalid_log_format_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("relay.toml");
    std::fs::write(&config_file, "[logging]\nformat = \"xml\"\n").unwrap();
    assert!(ConfigLoader::load_from_file(&config_file).is_err());
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_workspace_file_name() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join(WORKSPACE_CONFIG_FILE),
        "test_device_hashed_ids = [\"WS\"]\n",
    )
    .unwrap();
    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert_eq!(config.test_device_hashed_ids, vec!["WS"]);
}

fn simulated_context(mode: &str) -> (TempDir, ConsentContext) {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("relay.toml");
    std::fs::write(
        &config_file,
        format!("[simulation]\nenabled = true\nmode = \"{}\"\nscript = [\"fail\"]\n", mode),
    )
    .unwrap();
    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    let ctx = ConsentContext::builder()
        .platform(Platform::Other)
        .config(config)
        .build();
    (temp_dir, ctx)
}

#[test]
fn test_configured_once_per_session_completes_second_request() {
    let (_temp_dir, ctx) = simulated_context("once_per_session");
    let log = CallbackLog::new();

    ctx.facade().init(None, log.success("init"), log.failure("init"));
    ctx.facade().show(log.success("show"), log.failure("show"));
    ctx.drain();

    assert_eq!(log.entries(), vec!["init err -1", "show ok"]);
    assert_eq!(ctx.scripted_simulation().and_then(|sim| sim.held_kind()), None);
}

#[test]
fn test_configured_always_mode_holds_second_request() {
    let (_temp_dir, ctx) = simulated_context("always");
    let log = CallbackLog::new();

    ctx.facade().init(None, log.success("init"), log.failure("init"));
    ctx.facade().show(log.success("show"), log.failure("show"));
    ctx.drain();

    assert_eq!(log.entries(), vec!["init err -1"]);
    let sim = ctx.scripted_simulation().unwrap();
    assert_eq!(sim.held_kind(), Some(OperationKind::Show));

    assert!(sim.resolve_held(true));
    ctx.drain();
    assert_eq!(log.entries(), vec!["init err -1", "show ok"]);
}
