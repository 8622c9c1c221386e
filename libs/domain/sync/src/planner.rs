// [libs/domain/sync/src/planner.rs]
/*!
 * =================================================================
 * APARATO: SYNC DIFF PLANNER (V8.0 - DETERMINISTIC)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DIFF PURO INSTANTÁNEA REMOTA vs ESTADO LOCAL
 *
 * # Mathematical Proof (Determinism):
 * El planner indexa ambos lados por identificador del proveedor y
 * ordena cada conjunto de salida por esa llave. Para un par idéntico
 * (instantánea remota, estado local) los planes emitidos son idénticos
 * sin importar el orden de llegada de las páginas remotas.
 * =================================================================
 */

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use uuid::Uuid;

use cerberus_domain_models::{
    GroupSyncPlan, IdentitySyncPlan, MembershipSyncPlan, MembershipTuple, ProviderSyncPlan,
    RemoteGroup, RemoteUser,
};

/// Proyección local de una identidad, suficiente para el predicado de drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub id: Uuid,
    pub provider_identifier: String,
    /// `provider_state.userinfo.email` vigente.
    pub email: Option<String>,
    /// Nombre del actor asociado.
    pub actor_name: String,
}

/// Proyección local de un grupo sincronizado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalGroup {
    pub id: Uuid,
    pub provider_identifier: String,
    pub name: String,
}

/// Diff de identidades.
///
/// - insert: remoto sin contraparte local
/// - update: remoto cuya contraparte local derivó en email o nombre
/// - delete: local sin contraparte remota
pub fn plan_identities(remote_users: &[RemoteUser], local_identities: &[LocalIdentity]) -> IdentitySyncPlan {
    let remote_index = index_remote_users(remote_users);
    let local_index: BTreeMap<&str, &LocalIdentity> = local_identities
        .iter()
        .map(|identity| (identity.provider_identifier.as_str(), identity))
        .collect();

    let mut plan = IdentitySyncPlan::default();

    for (provider_identifier, remote_user) in &remote_index {
        match local_index.get(provider_identifier) {
            None => plan.insert.push((*remote_user).clone()),
            Some(local_identity) => {
                let email_drifted = local_identity.email.as_deref() != Some(remote_user.email.as_str());
                let name_drifted = local_identity.actor_name != remote_user.actor_name;
                if email_drifted || name_drifted {
                    plan.update.push((*remote_user).clone());
                }
            }
        }
    }

    for (provider_identifier, local_identity) in &local_index {
        if !remote_index.contains_key(provider_identifier) {
            plan.delete.push(local_identity.id);
        }
    }

    // El orden de borrado sigue la llave del proveedor (ya lo garantiza
    // la iteración del índice local), no el uuid local.
    plan
}

/// Diff de grupos: upsert de todo lo remoto con drift o sin contraparte,
/// borrado de locales huérfanos.
pub fn plan_groups(remote_groups: &[RemoteGroup], local_groups: &[LocalGroup]) -> GroupSyncPlan {
    let remote_index: BTreeMap<&str, &RemoteGroup> = remote_groups
        .iter()
        .map(|group| (group.provider_identifier.as_str(), group))
        .collect();
    let local_index: BTreeMap<&str, &LocalGroup> = local_groups
        .iter()
        .map(|group| (group.provider_identifier.as_str(), group))
        .collect();

    let mut plan = GroupSyncPlan::default();

    for (provider_identifier, remote_group) in &remote_index {
        let needs_upsert = match local_index.get(provider_identifier) {
            None => true,
            Some(local_group) => local_group.name != remote_group.name,
        };
        if needs_upsert {
            plan.upsert.push((*remote_group).clone());
        }
    }

    for (provider_identifier, local_group) in &local_index {
        if !remote_index.contains_key(provider_identifier) {
            plan.delete.push(local_group.id);
        }
    }

    plan
}

/// Diff de membresías sobre tuplas de identificadores del proveedor.
pub fn plan_memberships(
    remote_tuples: &[MembershipTuple],
    local_tuples: &[MembershipTuple],
) -> MembershipSyncPlan {
    let remote_set: BTreeSet<&MembershipTuple> = remote_tuples.iter().collect();
    let local_set: BTreeSet<&MembershipTuple> = local_tuples.iter().collect();

    MembershipSyncPlan {
        upsert: remote_set.difference(&local_set).map(|tuple| (*tuple).clone()).collect(),
        delete: local_set.difference(&remote_set).map(|tuple| (*tuple).clone()).collect(),
    }
}

/// Corrida completa: los tres planes de una pasada de sincronización.
pub fn plan_provider_sync(
    remote_users: &[RemoteUser],
    remote_groups: &[RemoteGroup],
    remote_memberships: &[MembershipTuple],
    local_identities: &[LocalIdentity],
    local_groups: &[LocalGroup],
    local_memberships: &[MembershipTuple],
) -> ProviderSyncPlan {
    ProviderSyncPlan {
        identities: plan_identities(remote_users, local_identities),
        groups: plan_groups(remote_groups, local_groups),
        memberships: plan_memberships(remote_memberships, local_memberships),
    }
}

/// Índice remoto por identificador; ante duplicados en la instantánea
/// (páginas solapadas del IdP) gana la primera aparición.
fn index_remote_users<'snapshot>(
    remote_users: &'snapshot [RemoteUser],
) -> BTreeMap<&'snapshot str, &'snapshot RemoteUser> {
    let mut index = BTreeMap::new();
    for remote_user in remote_users {
        index.entry(remote_user.provider_identifier.as_str()).or_insert(remote_user);
    }
    index
}
// FIN DEL ARCHIVO [libs/domain/sync/src/planner.rs]
