// [tests/mirror/libs/infra/db/advisory_locks.test.rs]
/**
 * =================================================================
 * APARATO: ADVISORY LOCK CERTIFIER (V4.0)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L3)
 * RESPONSABILIDAD: reject_locked FILTRA FILAS RECLAMADAS POR PARES
 *
 * Suite con PostgreSQL real: se auto-omite cuando la variable
 * CERBERUS_TEST_DATABASE_URL no está definida en el entorno.
 * =================================================================
 */

use cerberus_infra_db::schema::apply_control_plane_schema;
use cerberus_infra_db::{reject_locked, PostgresClient};
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

#[tokio::test]
async fn certify_reject_locked_filters_rows_claimed_by_a_peer() {
    let Some(client) = proving_grounds_client().await else { return };

    let row_alpha = Uuid::new_v4();
    let row_beta = Uuid::new_v4();
    let row_gamma = Uuid::new_v4();

    // T2 reclama row_alpha y retiene su transacción abierta.
    let mut peer_connection = client.get_connection().await.expect("peer connection");
    let peer_transaction = peer_connection.transaction().await.expect("peer tx");
    let peer_claims = reject_locked(&peer_transaction, "auth_providers", &[row_alpha])
        .await
        .expect("peer claim");
    assert_eq!(peer_claims, vec![row_alpha]);

    // T1 disputa las tres filas: solo beta y gamma son reclamables.
    let mut local_connection = client.get_connection().await.expect("local connection");
    let local_transaction = local_connection.transaction().await.expect("local tx");
    let local_claims =
        reject_locked(&local_transaction, "auth_providers", &[row_alpha, row_beta, row_gamma])
            .await
            .expect("local claim");
    assert_eq!(local_claims, vec![row_beta, row_gamma]);
    local_transaction.rollback().await.expect("local rollback");

    // T2 comete: sus candados se liberan con la transacción.
    peer_transaction.commit().await.expect("peer commit");

    // Una transacción fresca reclama las tres filas completas.
    let mut fresh_connection = client.get_connection().await.expect("fresh connection");
    let fresh_transaction = fresh_connection.transaction().await.expect("fresh tx");
    let fresh_claims =
        reject_locked(&fresh_transaction, "auth_providers", &[row_alpha, row_beta, row_gamma])
            .await
            .expect("fresh claim");
    assert_eq!(fresh_claims, vec![row_alpha, row_beta, row_gamma]);
    fresh_transaction.rollback().await.expect("fresh rollback");
}

#[tokio::test]
async fn certify_empty_row_set_is_a_noop() {
    let Some(client) = proving_grounds_client().await else { return };

    let mut connection = client.get_connection().await.expect("connection");
    let transaction = connection.transaction().await.expect("tx");
    let claims = reject_locked(&transaction, "auth_providers", &[]).await.expect("claim");
    assert!(claims.is_empty());
    transaction.rollback().await.expect("rollback");
}
// FIN DEL ARCHIVO [tests/mirror/libs/infra/db/advisory_locks.test.rs]
