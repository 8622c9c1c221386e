// [libs/domain/models/src/identity.rs]
/*!
 * =================================================================
 * APARATO: IDENTITY & GROUP DOMAIN MODELS (V8.0 - DIRECTORY LINK)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: MAPEO IDP <-> ACTOR Y MEMBRESÍAS DE GRUPO
 *
 * VISION HIPER-HOLÍSTICA:
 * La Identidad es el asa externa de un actor en un IdP concreto.
 * Invariante de unicidad: (account_id, provider_id, provider_identifier)
 * entre registros no borrados. Los grupos sincronizados llevan el
 * identificador literal "G:<idp-id>" y nombre "Group:<remoto>".
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Asa de un usuario en un proveedor externo, vinculada a un actor local.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub account_id: Uuid,
    pub provider_id: Uuid,
    /// Identificador del usuario según el proveedor (inmutable).
    pub provider_identifier: String,
    /// Documento opaco con el userinfo remoto; ver [`ProviderState`].
    #[serde(default)]
    pub provider_state: serde_json::Value,
    pub actor_id: Uuid,
    pub created_by: CreatedBy,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Email efectivo según el último userinfo sincronizado.
    pub fn email(&self) -> Option<&str> {
        self.provider_state
            .get("userinfo")
            .and_then(|userinfo| userinfo.get("email"))
            .and_then(|email| email.as_str())
    }
}

/// Accesor tipado del documento `provider_state`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderState {
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub userinfo: serde_json::Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProviderState {
    /// Fusiona el email remoto preservando el resto del documento
    /// (refresh tokens, sub opaco, claves custom).
    pub fn merge_email(document: &serde_json::Value, email: &str) -> serde_json::Value {
        let mut merged = match document {
            serde_json::Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        let userinfo = merged
            .entry("userinfo".to_string())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if let serde_json::Value::Object(userinfo_map) = userinfo {
            userinfo_map.insert("email".to_string(), serde_json::Value::String(email.to_string()));
        } else {
            *userinfo = serde_json::json!({ "email": email });
        }
        serde_json::Value::Object(merged)
    }
}

/// Origen de creación de un registro del directorio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatedBy {
    Provider,
    Identity,
    System,
}

impl CreatedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreatedBy::Provider => "provider",
            CreatedBy::Identity => "identity",
            CreatedBy::System => "system",
        }
    }
}

impl std::str::FromStr for CreatedBy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "provider" => Ok(CreatedBy::Provider),
            "identity" => Ok(CreatedBy::Identity),
            "system" => Ok(CreatedBy::System),
            other => Err(format!("unknown created_by '{other}'")),
        }
    }
}

/// Grupo de actores, sincronizado desde el IdP o gestionado localmente.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorGroup {
    pub id: Uuid,
    pub account_id: Uuid,
    pub provider_id: Option<Uuid>,
    /// `"G:" ‖ <idp-group-id>` para grupos sincronizados.
    pub provider_identifier: Option<String>,
    pub name: String,
    pub created_by: CreatedBy,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Tupla de membresía en almacenamiento (claves locales).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Membership {
    pub actor_id: Uuid,
    pub group_id: Uuid,
}

/// Tupla de membresía durante la sincronización (claves del proveedor).
///
/// El orden canónico es `(group_provider_identifier, actor_provider_identifier)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MembershipTuple {
    pub group_provider_identifier: String,
    pub actor_provider_identifier: String,
}

impl MembershipTuple {
    pub fn new(group_provider_identifier: impl Into<String>, actor_provider_identifier: impl Into<String>) -> Self {
        Self {
            group_provider_identifier: group_provider_identifier.into(),
            actor_provider_identifier: actor_provider_identifier.into(),
        }
    }
}
// FIN DEL ARCHIVO [libs/domain/models/src/identity.rs]
