// [libs/shared/config/src/validators.rs]
/*!
 * =================================================================
 * APARATO: CONFIG VALIDATOR CATALOG (V5.0)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4)
 * RESPONSABILIDAD: PREDICADOS DE FORMA SOBRE VALORES YA TIPADOS
 *
 * Los validadores son funciones totales: describen el problema en una
 * frase y nunca provocan pánico ante entradas hostiles.
 * =================================================================
 */

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use ipnetwork::IpNetwork;
use std::collections::HashSet;

use crate::definition::ConfigValue;

/// Rangos reservados que el validador de CIDR excluye por defecto:
/// loopback, link-local IPv4/IPv6 y los bloques de documentación.
const RESERVED_CIDR_RANGES: &[&str] = &[
    "127.0.0.0/8",
    "169.254.0.0/16",
    "224.0.0.0/4",
    "192.0.2.0/24",
    "::1/128",
    "fe80::/10",
    "ff00::/8",
];

/// URI http(s) válida; `uri_with_trailing_slash` exige el sufijo '/'.
pub fn validate_uri(value: &ConfigValue) -> Result<(), String> {
    validate_uri_shape(value, false)
}

pub fn validate_uri_with_trailing_slash(value: &ConfigValue) -> Result<(), String> {
    validate_uri_shape(value, true)
}

fn validate_uri_shape(value: &ConfigValue, require_trailing_slash: bool) -> Result<(), String> {
    let raw = value.as_str().ok_or_else(|| "expected a string URI".to_string())?;

    let remainder = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .ok_or_else(|| "expected an http(s) URI".to_string())?;

    let host_segment = remainder.split('/').next().unwrap_or_default();
    if host_segment.is_empty() {
        return Err("URI is missing a host".to_string());
    }
    if require_trailing_slash && !raw.ends_with('/') {
        return Err("URI must end with a trailing slash".to_string());
    }
    Ok(())
}

/// FQDN: etiquetas alfanuméricas (más guiones interiores) separadas
/// por puntos, al menos dos etiquetas, sin exceder 253 octetos.
pub fn validate_fqdn(value: &ConfigValue) -> Result<(), String> {
    let raw = value.as_str().ok_or_else(|| "expected a string FQDN".to_string())?;

    if raw.len() > 253 {
        return Err("FQDN exceeds 253 characters".to_string());
    }
    let labels: Vec<&str> = raw.split('.').collect();
    if labels.len() < 2 {
        return Err("FQDN must contain at least two labels".to_string());
    }
    for label in labels {
        let is_well_formed = !label.is_empty()
            && label.len() <= 63
            && label.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
            && !label.starts_with('-')
            && !label.ends_with('-');
        if !is_well_formed {
            return Err(format!("FQDN label '{label}' is malformed"));
        }
    }
    Ok(())
}

/// Email con forma mínima `local@dominio` donde el dominio es un FQDN.
pub fn validate_email(value: &ConfigValue) -> Result<(), String> {
    let raw = value.as_str().ok_or_else(|| "expected a string email".to_string())?;

    let (local_part, domain_part) = raw
        .split_once('@')
        .ok_or_else(|| "email is missing the '@' separator".to_string())?;
    if local_part.is_empty() {
        return Err("email local part is empty".to_string());
    }
    validate_fqdn(&ConfigValue::String(domain_part.to_string()))
        .map_err(|problem| format!("email domain rejected: {problem}"))
}

/// Payload base64 estándar decodificable.
pub fn validate_base64(value: &ConfigValue) -> Result<(), String> {
    let raw = value.as_str().ok_or_else(|| "expected a base64 string".to_string())?;
    BASE64_STANDARD
        .decode(raw)
        .map(|_| ())
        .map_err(|decode_fault| format!("value is not valid base64: {decode_fault}"))
}

/// Unicidad de elementos dentro de un valor array.
pub fn validate_unique(value: &ConfigValue) -> Result<(), String> {
    let items = value.as_array().ok_or_else(|| "expected an array value".to_string())?;

    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.to_string()) {
            return Err(format!("duplicate element '{item}'"));
        }
    }
    Ok(())
}

/// Puerto TCP/UDP en 1..=65535.
pub fn validate_port(value: &ConfigValue) -> Result<(), String> {
    let raw = value.as_int().ok_or_else(|| "expected an integer port".to_string())?;
    if (1..=65535).contains(&raw) {
        Ok(())
    } else {
        Err(format!("port {raw} is outside 1..65535"))
    }
}

/// CIDR fuera de los rangos reservados (loopback, link-local, multicast,
/// documentación). El solapamiento parcial también se rechaza.
pub fn validate_cidr_excluding_reserved(value: &ConfigValue) -> Result<(), String> {
    let network = match value {
        ConfigValue::Cidr(network) => *network,
        _ => return Err("expected a CIDR value".to_string()),
    };

    for reserved_literal in RESERVED_CIDR_RANGES {
        let reserved: IpNetwork = reserved_literal
            .parse()
            .expect("reserved range table must hold parseable CIDR literals");
        let overlaps = reserved.contains(network.ip()) || network.contains(reserved.ip());
        if overlaps {
            return Err(format!("CIDR {network} overlaps reserved range {reserved_literal}"));
        }
    }
    Ok(())
}
// FIN DEL ARCHIVO [libs/shared/config/src/validators.rs]
