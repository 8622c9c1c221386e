// [tests/mirror/libs/shared/config/resolver_precedence.test.rs]
/**
 * =================================================================
 * APARATO: CONFIG RESOLVER CERTIFIER (V3.0)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L4-SHARED)
 * RESPONSABILIDAD: PRECEDENCIA env > db > default Y REDACCIÓN
 * =================================================================
 */

use std::collections::BTreeMap;

use cerberus_shared_config::{
    validators, ConfigError, ConfigResolver, ConfigValue, DefaultValue, KeyDefinition,
    ResolutionSource, ValueType,
};

fn plain_key(name: &'static str, value_type: ValueType) -> KeyDefinition {
    KeyDefinition { name, value_type, default: None, validator: None, sensitive: false, docs: "test key" }
}

fn snapshots(
    env_pairs: &[(&str, &str)],
    db_pairs: &[(&str, &str)],
) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    let environment = env_pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    let database = db_pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    (environment, database)
}

#[test]
fn certify_environment_wins_over_database_and_default() {
    let (environment, database) = snapshots(&[("SYNC_MODE", "strict")], &[("sync_mode", "lenient")]);
    let resolver = ConfigResolver::from_snapshots(environment, database);

    let definition = KeyDefinition {
        default: Some(DefaultValue::Literal("default")),
        ..plain_key("sync_mode", ValueType::String)
    };

    let (value, source) = resolver.resolve_with_source(&definition).expect("must resolve");
    assert_eq!(value, ConfigValue::String("strict".to_string()));
    assert_eq!(source, ResolutionSource::Environment("SYNC_MODE".to_string()));
}

#[test]
fn certify_database_wins_over_default() {
    let (environment, database) = snapshots(&[], &[("sync_mode", "lenient")]);
    let resolver = ConfigResolver::from_snapshots(environment, database);

    let definition = KeyDefinition {
        default: Some(DefaultValue::Literal("default")),
        ..plain_key("sync_mode", ValueType::String)
    };

    let (value, source) = resolver.resolve_with_source(&definition).expect("must resolve");
    assert_eq!(value, ConfigValue::String("lenient".to_string()));
    assert_eq!(source, ResolutionSource::Database);
}

#[test]
fn certify_default_thunk_materializes_last() {
    let (environment, database) = snapshots(&[], &[]);
    let resolver = ConfigResolver::from_snapshots(environment, database);

    let definition = KeyDefinition {
        default: Some(DefaultValue::Thunk(|| "computed".to_string())),
        ..plain_key("sync_mode", ValueType::String)
    };

    let (value, source) = resolver.resolve_with_source(&definition).expect("must resolve");
    assert_eq!(value, ConfigValue::String("computed".to_string()));
    assert_eq!(source, ResolutionSource::Default);
}

#[test]
fn certify_boolean_environment_contract() {
    // Contrato: exactamente "1"/"0"/"true"/"false".
    for (raw, expected) in [("1", true), ("true", true), ("0", false), ("false", false)] {
        let (environment, database) = snapshots(&[("FLAG", raw)], &[]);
        let resolver = ConfigResolver::from_snapshots(environment, database);
        let value = resolver.resolve(&plain_key("flag", ValueType::Bool)).expect("must parse");
        assert_eq!(value, ConfigValue::Bool(expected), "raw input {raw}");
    }

    let (environment, database) = snapshots(&[("FLAG", "yes")], &[]);
    let resolver = ConfigResolver::from_snapshots(environment, database);
    assert!(resolver.resolve(&plain_key("flag", ValueType::Bool)).is_err());
}

#[test]
fn certify_array_parsing_with_comma_separator() {
    let (environment, database) = snapshots(&[("TABLES", "accounts,tokens,gateways")], &[]);
    let resolver = ConfigResolver::from_snapshots(environment, database);

    let definition = KeyDefinition {
        validator: Some(validators::validate_unique),
        ..plain_key(
            "tables",
            ValueType::Array { separator: ',', element: Box::new(ValueType::String) },
        )
    };

    let value = resolver.resolve(&definition).expect("must parse");
    let items = value.as_array().expect("array value");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_str(), Some("accounts"));
}

#[test]
fn certify_sensitive_values_are_redacted_in_diagnostics() {
    let (environment, database) = snapshots(&[("API_SECRET", "super-secret-material")], &[]);
    let resolver = ConfigResolver::from_snapshots(environment, database);

    let definition = KeyDefinition {
        sensitive: true,
        ..plain_key("api_secret", ValueType::Int) // forzamos el fallo de parseo
    };

    let fault = resolver.resolve(&definition).expect_err("must reject");
    let rendered = fault.to_string();

    assert!(rendered.contains("*redacted*"), "diagnostic must redact: {rendered}");
    assert!(!rendered.contains("super-secret-material"), "secret leaked: {rendered}");
    assert!(rendered.contains("environment variable API_SECRET"), "source missing: {rendered}");
}

#[test]
fn certify_missing_required_key_names_the_env_variable() {
    let (environment, database) = snapshots(&[], &[]);
    let resolver = ConfigResolver::from_snapshots(environment, database);

    let fault = resolver.resolve(&plain_key("relay_token", ValueType::String)).expect_err("must miss");
    match &fault {
        ConfigError::MissingValue { env_name, .. } => assert_eq!(env_name, "RELAY_TOKEN"),
        other => panic!("unexpected fault kind: {other}"),
    }
    assert_eq!(fault.key(), "relay_token");
}
// FIN DEL ARCHIVO [tests/mirror/libs/shared/config/resolver_precedence.test.rs]
