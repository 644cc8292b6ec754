mod common;

use common::{object, Handlers};
use ferrous_decor::{ContainerOptions, ServiceCollection};
use serial_test::serial;
use std::env;

const VARS: [&str; 3] = [
    "FERROUS_DECOR_MAX_BUILD_DEPTH",
    "FERROUS_DECOR_RESOLVE_UNREGISTERED",
    "FERROUS_DECOR_LOG_DECISIONS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_defaults() {
    let options = ContainerOptions::default();
    assert_eq!(options.max_build_depth, 64);
    assert!(options.resolve_unregistered_concrete_types);
    assert!(!options.log_decisions);
}

#[test]
fn test_json_fills_missing_fields_with_defaults() {
    let options = ContainerOptions::from_json(r#"{ "log_decisions": true }"#).unwrap();
    assert!(options.log_decisions);
    assert_eq!(options.max_build_depth, 64);

    let json = options.to_json().unwrap();
    assert_eq!(ContainerOptions::from_json(&json).unwrap(), options);
}

#[test]
fn test_invalid_json_is_configuration_error() {
    let err = ContainerOptions::from_json(r#"{ "max_build_depth": "deep" }"#).err().unwrap();
    assert!(err.is_configuration());
}

#[test]
#[serial]
fn test_env_overrides_defaults() {
    clear_env();
    env::set_var("FERROUS_DECOR_MAX_BUILD_DEPTH", "12");
    env::set_var("FERROUS_DECOR_RESOLVE_UNREGISTERED", "false");

    let options = ContainerOptions::from_env().unwrap();
    clear_env();

    assert_eq!(options.max_build_depth, 12);
    assert!(!options.resolve_unregistered_concrete_types);
    assert!(!options.log_decisions);
}

#[test]
#[serial]
fn test_env_with_invalid_value_is_rejected() {
    clear_env();
    env::set_var("FERROUS_DECOR_LOG_DECISIONS", "sometimes");

    let err = ContainerOptions::from_env().err().unwrap();
    clear_env();

    assert!(err.is_configuration());
    assert!(err.to_string().contains("FERROUS_DECOR_LOG_DECISIONS"));
}

#[test]
#[serial]
fn test_env_without_variables_gives_defaults() {
    clear_env();
    assert_eq!(ContainerOptions::from_env().unwrap(), ContainerOptions::default());
}

#[test]
fn test_log_decisions_installs_logging_observer() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ferrous_decor=trace")
        .with_test_writer()
        .try_init();

    let h = Handlers::new();
    let options = ContainerOptions {
        log_decisions: true,
        ..ContainerOptions::default()
    };
    let mut sc = ServiceCollection::with_options(options);
    sc.add_transient(h.service(), h.stub_handler.expr()).unwrap();
    sc.add_decorator_when(h.handler.expr(), h.transaction.expr(), |_| true).unwrap();
    sc.add_decorator_when(h.handler.expr(), h.log.expr(), |_| false).unwrap();

    let sp = sc.build();
    let instance = object(sp.get_instance(&h.service()).unwrap());
    assert_eq!(instance.describe(), "TransactionDecorator<RealCommand>(StubHandler)");
    assert!(sp.options().log_decisions);
}
