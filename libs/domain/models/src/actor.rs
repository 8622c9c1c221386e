// [libs/domain/models/src/actor.rs]
/*!
 * =================================================================
 * APARATO: ACTOR DOMAIN MODELS (V3.1)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: PRINCIPALES REFERENCIADOS POR POLÍTICAS DE ACCESO
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Principal local sobre el que se evalúan políticas. Un actor puede
/// estar vinculado a identidades de varios proveedores de la misma cuenta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub actor_type: ActorType,
    pub disabled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Actor {
    pub fn is_active(&self) -> bool {
        self.disabled_at.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    AccountAdminUser,
    AccountUser,
    ServiceAccount,
}

impl ActorType {
    /// Representación canónica persistida en la columna `type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::AccountAdminUser => "account_admin_user",
            ActorType::AccountUser => "account_user",
            ActorType::ServiceAccount => "service_account",
        }
    }
}
// FIN DEL ARCHIVO [libs/domain/models/src/actor.rs]
