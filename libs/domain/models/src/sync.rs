// [libs/domain/models/src/sync.rs]
/*!
 * =================================================================
 * APARATO: DIRECTORY SYNC DTOS (V7.0 - PLAN CONTRACT)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: INSTANTÁNEAS REMOTAS Y PLANES EFÍMEROS DE SINCRONÍA
 *
 * VISION HIPER-HOLÍSTICA:
 * Los adaptadores normalizan los payloads de cada IdP a estas tres
 * formas; el planner diffea contra el estado local y emite planes
 * que el repositorio aplica dentro de UNA transacción. Los planes
 * son efímeros: jamás se persisten.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::MembershipTuple;

/// Usuario remoto ya normalizado por el adaptador del proveedor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    /// Identificador del usuario según el IdP.
    pub provider_identifier: String,
    /// Email primario resuelto según el mapa de atributos del adaptador.
    pub email: String,
    /// Nombre visible que alimenta `actor.name`.
    pub actor_name: String,
}

/// Grupo remoto normalizado. `provider_identifier` ya porta el prefijo
/// literal `G:` y `name` el prefijo `Group:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteGroup {
    pub provider_identifier: String,
    pub name: String,
}

/// Plan de identidades: qué insertar, actualizar y borrar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySyncPlan {
    /// Remotos sin contraparte local.
    pub insert: Vec<RemoteUser>,
    /// Remotos con contraparte local cuyo email o nombre de actor derivó.
    pub update: Vec<RemoteUser>,
    /// Ids locales sin contraparte remota.
    pub delete: Vec<Uuid>,
}

impl IdentitySyncPlan {
    pub fn is_noop(&self) -> bool {
        self.insert.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// Plan de grupos: upsert de remotos y borrado de huérfanos locales.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSyncPlan {
    pub upsert: Vec<RemoteGroup>,
    pub delete: Vec<Uuid>,
}

/// Plan de membresías en tuplas de identificadores del proveedor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSyncPlan {
    pub upsert: Vec<MembershipTuple>,
    pub delete: Vec<MembershipTuple>,
}

/// Paquete de planes para una corrida de sincronización de un proveedor.
#[derive(Debug, Clone, Default)]
pub struct ProviderSyncPlan {
    pub identities: IdentitySyncPlan,
    pub groups: GroupSyncPlan,
    pub memberships: MembershipSyncPlan,
}

impl ProviderSyncPlan {
    /// Resumen de una línea para el rastro forense del scheduler.
    pub fn summary(&self) -> String {
        format!(
            "identities +{}/~{}/-{} groups +{}/-{} memberships +{}/-{}",
            self.identities.insert.len(),
            self.identities.update.len(),
            self.identities.delete.len(),
            self.groups.upsert.len(),
            self.groups.delete.len(),
            self.memberships.upsert.len(),
            self.memberships.delete.len(),
        )
    }
}
// FIN DEL ARCHIVO [libs/domain/models/src/sync.rs]
