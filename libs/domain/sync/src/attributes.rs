// [libs/domain/sync/src/attributes.rs]
/*!
 * =================================================================
 * APARATO: PROVIDER ATTRIBUTE MAPS (V6.0 - EXACT CONTRACTS)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: NORMALIZACIÓN EXACTA DE PAYLOADS IDP -> DOMINIO
 *
 * Contratos por proveedor:
 *   Entra   : email = userPrincipalName (o mail); actor = displayName;
 *             grupo = "Group:" ‖ displayName; id grupo = "G:" ‖ id
 *   Okta    : email = profile.email; actor = "{firstName} {lastName}";
 *             grupo = "Group:" ‖ profile.name; id grupo = "G:" ‖ id
 *   Google  : email = primario; actor = name.fullName;
 *             grupo = "Group:" ‖ name; id grupo = "G:" ‖ id
 *   WorkOS  : email = primario; actor = "{first_name} {last_name}";
 *             grupo = "Group:" ‖ name; id grupo = "G:" ‖ id
 *
 * Un campo requerido ausente es una violación de mapeo que el
 * clasificador trata como error de cliente (deshabilita el directorio).
 * =================================================================
 */

use serde_json::Value;
use thiserror::Error;

use cerberus_domain_models::{RemoteGroup, RemoteUser};

/// Prefijo literal de identificadores de grupo sincronizados.
pub const GROUP_IDENTIFIER_PREFIX: &str = "G:";
/// Prefijo literal de nombres de grupo sincronizados.
pub const GROUP_NAME_PREFIX: &str = "Group:";

/// Registro remoto sin un campo que el contrato declara obligatorio.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("remote {entity} record is missing required field '{field}'")]
pub struct MappingViolation {
    pub entity: &'static str,
    pub field: &'static str,
}

fn required_str<'a>(
    payload: &'a Value,
    path: &[&str],
    entity: &'static str,
    field: &'static str,
) -> Result<&'a str, MappingViolation> {
    let mut cursor = payload;
    for segment in path {
        cursor = match cursor.get(segment) {
            Some(next) => next,
            None => return Err(MappingViolation { entity, field }),
        };
    }
    match cursor.as_str() {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(MappingViolation { entity, field }),
    }
}

/// Compone el identificador persistido de un grupo sincronizado.
pub fn group_provider_identifier(remote_group_id: &str) -> String {
    format!("{GROUP_IDENTIFIER_PREFIX}{remote_group_id}")
}

/// Compone el nombre persistido de un grupo sincronizado.
pub fn group_display_name(remote_group_name: &str) -> String {
    format!("{GROUP_NAME_PREFIX}{remote_group_name}")
}

// --- ESTRATO MICROSOFT ENTRA (GRAPH) ---

pub fn map_entra_user(payload: &Value) -> Result<RemoteUser, MappingViolation> {
    let provider_identifier = required_str(payload, &["id"], "user", "id")?;
    // userPrincipalName es el canónico; 'mail' queda como respaldo.
    let email = required_str(payload, &["userPrincipalName"], "user", "userPrincipalName")
        .or_else(|_| required_str(payload, &["mail"], "user", "userPrincipalName"))?;
    let actor_name = required_str(payload, &["displayName"], "user", "displayName")?;

    Ok(RemoteUser {
        provider_identifier: provider_identifier.to_string(),
        email: email.to_string(),
        actor_name: actor_name.to_string(),
    })
}

pub fn map_entra_group(payload: &Value) -> Result<RemoteGroup, MappingViolation> {
    let remote_id = required_str(payload, &["id"], "group", "id")?;
    let display_name = required_str(payload, &["displayName"], "group", "displayName")?;

    Ok(RemoteGroup {
        provider_identifier: group_provider_identifier(remote_id),
        name: group_display_name(display_name),
    })
}

// --- ESTRATO OKTA ---

pub fn map_okta_user(payload: &Value) -> Result<RemoteUser, MappingViolation> {
    let provider_identifier = required_str(payload, &["id"], "user", "id")?;
    let email = required_str(payload, &["profile", "email"], "user", "profile.email")?;
    let first_name = required_str(payload, &["profile", "firstName"], "user", "profile.firstName")?;
    let last_name = required_str(payload, &["profile", "lastName"], "user", "profile.lastName")?;

    Ok(RemoteUser {
        provider_identifier: provider_identifier.to_string(),
        email: email.to_string(),
        actor_name: format!("{first_name} {last_name}"),
    })
}

pub fn map_okta_group(payload: &Value) -> Result<RemoteGroup, MappingViolation> {
    let remote_id = required_str(payload, &["id"], "group", "id")?;
    let profile_name = required_str(payload, &["profile", "name"], "group", "profile.name")?;

    Ok(RemoteGroup {
        provider_identifier: group_provider_identifier(remote_id),
        name: group_display_name(profile_name),
    })
}

// --- ESTRATO GOOGLE WORKSPACE ---

pub fn map_google_user(payload: &Value) -> Result<RemoteUser, MappingViolation> {
    let provider_identifier = required_str(payload, &["id"], "user", "id")?;
    let email = required_str(payload, &["primaryEmail"], "user", "primaryEmail")?;
    let actor_name = required_str(payload, &["name", "fullName"], "user", "name.fullName")?;

    Ok(RemoteUser {
        provider_identifier: provider_identifier.to_string(),
        email: email.to_string(),
        actor_name: actor_name.to_string(),
    })
}

pub fn map_google_group(payload: &Value) -> Result<RemoteGroup, MappingViolation> {
    let remote_id = required_str(payload, &["id"], "group", "id")?;
    let name = required_str(payload, &["name"], "group", "name")?;

    Ok(RemoteGroup {
        provider_identifier: group_provider_identifier(remote_id),
        name: group_display_name(name),
    })
}

// --- ESTRATO WORKOS (JUMPCLOUD) ---

pub fn map_workos_user(payload: &Value) -> Result<RemoteUser, MappingViolation> {
    let provider_identifier = required_str(payload, &["id"], "user", "id")?;

    // WorkOS entrega una colección de emails; el primario manda.
    let email = payload
        .get("emails")
        .and_then(|emails| emails.as_array())
        .and_then(|emails| {
            emails
                .iter()
                .find(|entry| entry.get("primary").and_then(Value::as_bool).unwrap_or(false))
                .or_else(|| emails.first())
        })
        .and_then(|entry| entry.get("value"))
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or(MappingViolation { entity: "user", field: "emails" })?;

    let first_name = required_str(payload, &["first_name"], "user", "first_name")?;
    let last_name = required_str(payload, &["last_name"], "user", "last_name")?;

    Ok(RemoteUser {
        provider_identifier: provider_identifier.to_string(),
        email: email.to_string(),
        actor_name: format!("{first_name} {last_name}"),
    })
}

pub fn map_workos_group(payload: &Value) -> Result<RemoteGroup, MappingViolation> {
    let remote_id = required_str(payload, &["id"], "group", "id")?;
    let name = required_str(payload, &["name"], "group", "name")?;

    Ok(RemoteGroup {
        provider_identifier: group_provider_identifier(remote_id),
        name: group_display_name(name),
    })
}
// FIN DEL ARCHIVO [libs/domain/sync/src/attributes.rs]
