// [tests/mirror/libs/shared/config/validator_catalog.test.rs]
/**
 * =================================================================
 * APARATO: VALIDATOR CATALOG CERTIFIER (V3.0)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L4-SHARED)
 * RESPONSABILIDAD: PREDICADOS DE FORMA DEL CATÁLOGO DE CONFIGURACIÓN
 * =================================================================
 */

use cerberus_shared_config::{validators, ConfigValue};

fn text(raw: &str) -> ConfigValue {
    ConfigValue::String(raw.to_string())
}

#[test]
fn certify_uri_validator_and_trailing_slash_variant() {
    assert!(validators::validate_uri(&text("https://portal.example.com/admin")).is_ok());
    assert!(validators::validate_uri(&text("ftp://portal.example.com")).is_err());
    assert!(validators::validate_uri(&text("https://")).is_err());

    assert!(validators::validate_uri_with_trailing_slash(&text("https://portal.example.com/")).is_ok());
    assert!(validators::validate_uri_with_trailing_slash(&text("https://portal.example.com")).is_err());
}

#[test]
fn certify_fqdn_validator() {
    assert!(validators::validate_fqdn(&text("gateway.example.com")).is_ok());
    assert!(validators::validate_fqdn(&text("localhost")).is_err(), "single label rejected");
    assert!(validators::validate_fqdn(&text("-bad.example.com")).is_err(), "leading dash rejected");
    assert!(validators::validate_fqdn(&text("ex..ample.com")).is_err(), "empty label rejected");
}

#[test]
fn certify_email_validator() {
    assert!(validators::validate_email(&text("ops@example.com")).is_ok());
    assert!(validators::validate_email(&text("no-at-sign.example.com")).is_err());
    assert!(validators::validate_email(&text("@example.com")).is_err());
    assert!(validators::validate_email(&text("ops@single-label")).is_err());
}

#[test]
fn certify_base64_validator() {
    assert!(validators::validate_base64(&text("aGVsbG8gd29ybGQ=")).is_ok());
    assert!(validators::validate_base64(&text("not base64 !!!")).is_err());
}

#[test]
fn certify_unique_validator_over_arrays() {
    let unique = ConfigValue::Array(vec![text("a"), text("b"), text("c")]);
    assert!(validators::validate_unique(&unique).is_ok());

    let duplicated = ConfigValue::Array(vec![text("a"), text("b"), text("a")]);
    let problem = validators::validate_unique(&duplicated).expect_err("must reject duplicates");
    assert!(problem.contains("duplicate"), "{problem}");
}

#[test]
fn certify_port_validator_bounds() {
    assert!(validators::validate_port(&ConfigValue::Int(1)).is_ok());
    assert!(validators::validate_port(&ConfigValue::Int(65535)).is_ok());
    assert!(validators::validate_port(&ConfigValue::Int(0)).is_err());
    assert!(validators::validate_port(&ConfigValue::Int(65536)).is_err());
}

#[test]
fn certify_cidr_validator_excludes_reserved_ranges() {
    let routable = ConfigValue::Cidr("100.64.0.0/10".parse().unwrap());
    assert!(validators::validate_cidr_excluding_reserved(&routable).is_ok());

    let loopback = ConfigValue::Cidr("127.0.0.0/24".parse().unwrap());
    assert!(validators::validate_cidr_excluding_reserved(&loopback).is_err());

    let link_local = ConfigValue::Cidr("169.254.10.0/24".parse().unwrap());
    assert!(validators::validate_cidr_excluding_reserved(&link_local).is_err());

    let v6_loopback = ConfigValue::Cidr("::1/128".parse().unwrap());
    assert!(validators::validate_cidr_excluding_reserved(&v6_loopback).is_err());
}
// FIN DEL ARCHIVO [tests/mirror/libs/shared/config/validator_catalog.test.rs]
