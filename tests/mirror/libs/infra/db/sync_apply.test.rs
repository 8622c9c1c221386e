// [tests/mirror/libs/infra/db/sync_apply.test.rs]
/**
 * =================================================================
 * APARATO: SYNC APPLY CERTIFIER (V5.0 - HAPPY PATH & ATOMICITY)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L3)
 * RESPONSABILIDAD: APLICACIÓN TRANSACCIONAL DEL PLAN Y PREDICADO DE AGENDA
 *
 * Suite con PostgreSQL real: se auto-omite cuando la variable
 * CERBERUS_TEST_DATABASE_URL no está definida en el entorno.
 * =================================================================
 */

use cerberus_domain_models::{
    GroupSyncPlan, IdentitySyncPlan, MembershipSyncPlan, MembershipTuple, Provider,
    ProviderSyncPlan, RemoteGroup, RemoteUser,
};
use cerberus_infra_db::repositories::{DirectoryRepository, ProviderRepository};
use cerberus_infra_db::schema::apply_control_plane_schema;
use cerberus_infra_db::{reject_locked, DbError, PostgresClient};
use uuid::Uuid;

async fn proving_grounds_client() -> Option<PostgresClient> {
    let database_url = match std::env::var("CERBERUS_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            println!("⏭️  [SKIP]: CERBERUS_TEST_DATABASE_URL not set; PostgreSQL suite skipped.");
            return None;
        }
    };

    let client = PostgresClient::connect(&database_url).expect("test cluster must be reachable");
    let connection = client.get_connection().await.expect("pool must lend a connection");
    apply_control_plane_schema(&**connection).await.expect("schema must level");
    Some(client)
}

/// Siembra cuenta + proveedor Entra con la feature idp_sync activa.
async fn seed_provider(client: &PostgresClient) -> Provider {
    let connection = client.get_connection().await.expect("connection");

    let account_id = Uuid::new_v4();
    connection
        .execute(
            "INSERT INTO accounts (id, legal_name, features) VALUES ($1, $2, '{\"idp_sync\": true}'::jsonb)",
            &[&account_id, &"Proving Grounds Inc"],
        )
        .await
        .expect("account seed");

    let provider_id = Uuid::new_v4();
    connection
        .execute(
            "INSERT INTO auth_providers (id, account_id, name, adapter, provisioner)
             VALUES ($1, $2, $3, 'microsoft_entra', 'custom')",
            &[&provider_id, &account_id, &"Corporate Entra"],
        )
        .await
        .expect("provider seed");

    ProviderRepository::new(client.clone())
        .get_provider(provider_id)
        .await
        .expect("provider readback")
}

fn entra_happy_path_plan() -> ProviderSyncPlan {
    ProviderSyncPlan {
        identities: IdentitySyncPlan {
            insert: vec![RemoteUser {
                provider_identifier: "U1".to_string(),
                email: "a@x".to_string(),
                actor_name: "A".to_string(),
            }],
            update: Vec::new(),
            delete: Vec::new(),
        },
        groups: GroupSyncPlan {
            upsert: vec![RemoteGroup {
                provider_identifier: "G:G1".to_string(),
                name: "Group:All".to_string(),
            }],
            delete: Vec::new(),
        },
        memberships: MembershipSyncPlan {
            upsert: vec![MembershipTuple::new("G:G1", "U1")],
            delete: Vec::new(),
        },
    }
}

#[tokio::test]
async fn certify_entra_happy_path_lands_in_one_transaction() {
    let Some(client) = proving_grounds_client().await else { return };
    let provider = seed_provider(&client).await;

    let directory = DirectoryRepository::new(client.clone());
    directory
        .apply_sync_plan(&provider, &entra_happy_path_plan())
        .await
        .expect("plan must apply");

    // Identidad con el email en provider_state y actor con nombre A.
    let identities = directory.load_local_identities(provider.id).await.expect("identities");
    assert_eq!(identities.len(), 1);
    assert_eq!(identities[0].provider_identifier, "U1");
    assert_eq!(identities[0].email.as_deref(), Some("a@x"));
    assert_eq!(identities[0].actor_name, "A");

    // Grupo con los prefijos literales.
    let groups = directory.load_local_groups(provider.id).await.expect("groups");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].provider_identifier, "G:G1");
    assert_eq!(groups[0].name, "Group:All");

    // Membresía resuelta a llaves locales.
    let memberships = directory.load_local_memberships(provider.id).await.expect("memberships");
    assert_eq!(memberships, vec![MembershipTuple::new("G:G1", "U1")]);

    // Marca de sincronía avanzada y racha en cero.
    let refreshed = ProviderRepository::new(client.clone())
        .get_provider(provider.id)
        .await
        .expect("provider readback");
    assert!(refreshed.last_synced_at.is_some());
    assert_eq!(refreshed.last_syncs_failed, 0);
}

#[tokio::test]
async fn certify_claimed_provider_rejects_the_apply_without_side_effects() {
    let Some(client) = proving_grounds_client().await else { return };
    let provider = seed_provider(&client).await;

    // Un par retiene el candado advisory de la fila del proveedor.
    let mut peer_connection = client.get_connection().await.expect("peer connection");
    let peer_transaction = peer_connection.transaction().await.expect("peer tx");
    let claimed = reject_locked(&peer_transaction, "auth_providers", &[provider.id])
        .await
        .expect("peer claim");
    assert_eq!(claimed, vec![provider.id]);

    // La aplicación local aborta con ClaimConflict y CERO efectos.
    let directory = DirectoryRepository::new(client.clone());
    let outcome = directory.apply_sync_plan(&provider, &entra_happy_path_plan()).await;
    assert!(matches!(outcome, Err(DbError::ClaimConflict)));

    peer_transaction.rollback().await.expect("peer rollback");

    let identities = directory.load_local_identities(provider.id).await.expect("identities");
    assert!(identities.is_empty(), "a rejected apply must leave no rows behind");

    let untouched = ProviderRepository::new(client.clone())
        .get_provider(provider.id)
        .await
        .expect("provider readback");
    assert!(untouched.last_synced_at.is_none(), "last_synced_at must not advance");

    // La otra mitad del contrato de atomicidad: el registro del fallo
    // incrementa la racha exactamente en uno.
    let streak = ProviderRepository::new(client.clone())
        .record_transient_failure(provider.id, "Microsoft Graph API is temporarily unavailable")
        .await
        .expect("failure record");
    assert_eq!(streak, 1);
}

#[tokio::test]
async fn certify_scheduler_readiness_predicate() {
    let Some(client) = proving_grounds_client().await else { return };
    let providers = ProviderRepository::new(client.clone());

    // Fresco, jamás sincronizado: listo de inmediato y primero en orden.
    let fresh = seed_provider(&client).await;

    // Con racha de 2 fallos y última sincronía hace 20 minutos: el
    // backoff 10min·(2²+1) = 50min aún lo retiene.
    let backed_off = seed_provider(&client).await;
    // Con racha de 11: expulsado del ciclo sin importar la antigüedad.
    let exhausted = seed_provider(&client).await;

    let connection = client.get_connection().await.expect("connection");
    connection
        .execute(
            "UPDATE auth_providers
             SET last_synced_at = now() - interval '20 minutes', last_syncs_failed = 2
             WHERE id = $1",
            &[&backed_off.id],
        )
        .await
        .expect("backoff fixture");
    connection
        .execute(
            "UPDATE auth_providers
             SET last_synced_at = now() - interval '10 days', last_syncs_failed = 11
             WHERE id = $1",
            &[&exhausted.id],
        )
        .await
        .expect("exhausted fixture");

    let ready = providers
        .list_ready_to_be_synced("microsoft_entra", 50)
        .await
        .expect("readiness query");
    let ready_ids: Vec<Uuid> = ready.iter().map(|provider| provider.id).collect();

    assert!(ready_ids.contains(&fresh.id), "never-synced providers run first");
    assert!(!ready_ids.contains(&backed_off.id), "exponential backoff must hold the provider");
    assert!(!ready_ids.contains(&exhausted.id), "streaks above 10 leave the cycle");

    // NULLS FIRST: el jamás sincronizado precede a cualquier marcado.
    if let Some(first_ready) = ready.first() {
        assert!(first_ready.last_synced_at.is_none());
    }
}
// FIN DEL ARCHIVO [tests/mirror/libs/infra/db/sync_apply.test.rs]
