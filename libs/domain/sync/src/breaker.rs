// [libs/domain/sync/src/breaker.rs]
/*!
 * =================================================================
 * APARATO: DELETE-ALL CIRCUIT BREAKER (V3.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: VETO DE PLANES QUE ANIQUILAN UNA CLASE COMPLETA
 *
 * Una instantánea remota vacía con estado local poblado suele delatar
 * una credencial degradada o un tenant remoto mal apuntado, no una
 * baja masiva legítima. El cortacircuitos convierte ese plan en un
 * error de cliente ANTES de tocar la transacción.
 * =================================================================
 */

use cerberus_domain_models::ProviderSyncPlan;

use crate::classifier::SyncFault;

/// Veta el plan si alguna clase de recursos quedaría completamente
/// aniquilada: todo lo local se borra y lo remoto no aporta nada.
pub fn assert_plan_is_not_destructive(
    plan: &ProviderSyncPlan,
    local_identity_count: usize,
    local_group_count: usize,
) -> Result<(), SyncFault> {
    let identities_wiped = local_identity_count > 0
        && plan.identities.delete.len() == local_identity_count
        && plan.identities.insert.is_empty()
        && plan.identities.update.is_empty();

    if identities_wiped {
        return Err(SyncFault::CircuitBreaker {
            resource_class: "identities",
            local_total: local_identity_count,
        });
    }

    let groups_wiped = local_group_count > 0
        && plan.groups.delete.len() == local_group_count
        && plan.groups.upsert.is_empty();

    if groups_wiped {
        return Err(SyncFault::CircuitBreaker {
            resource_class: "groups",
            local_total: local_group_count,
        });
    }

    Ok(())
}
// FIN DEL ARCHIVO [libs/domain/sync/src/breaker.rs]
