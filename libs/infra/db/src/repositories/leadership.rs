// [libs/infra/db/src/repositories/leadership.rs]
/*!
 * =================================================================
 * APARATO: LEADERSHIP LEASE REGISTRY (V6.0 - CAS ELECTION)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: SUSTRATO DURABLE DE ELECCIÓN PARA EL EJECUTOR GLOBAL
 *
 * # Mathematical Proof (At-Most-One Holder):
 * El UPSERT condicional solo reescribe la fila cuando el holder es el
 * mismo o el lease venció; la fila `job_key` es la unidad de exclusión
 * y PostgreSQL serializa las escrituras sobre ella. A lo sumo un
 * holder vigente por llave en todo instante.
 * =================================================================
 */

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};
use uuid::Uuid;

use cerberus_infra_jobs::{LeaseFault, LeaseRegistry};

use crate::client::PostgresClient;

/// CAS de adquisición/renovación. Afecta 0 filas cuando otro holder
/// posee el lease vigente.
const CLAIM_OR_RENEW_LEASE: &str = r#"
    INSERT INTO leadership (job_key, holder_id, lease_until)
    VALUES ($1, $2, now() + make_interval(secs => $3))
    ON CONFLICT (job_key) DO UPDATE
    SET holder_id = EXCLUDED.holder_id,
        lease_until = EXCLUDED.lease_until
    WHERE leadership.holder_id = EXCLUDED.holder_id
       OR leadership.lease_until <= now()
"#;

const RELEASE_LEASE: &str = r#"
    DELETE FROM leadership WHERE job_key = $1 AND holder_id = $2
"#;

pub struct PostgresLeaseRegistry {
    database_client: PostgresClient,
}

impl PostgresLeaseRegistry {
    pub fn new(database_client: PostgresClient) -> Self {
        Self { database_client }
    }
}

#[async_trait]
impl LeaseRegistry for PostgresLeaseRegistry {
    #[instrument(skip(self))]
    async fn try_acquire(
        &self,
        job_key: &str,
        holder_id: Uuid,
        lease_duration: Duration,
    ) -> Result<bool, LeaseFault> {
        let connection = self
            .database_client
            .get_connection()
            .await
            .map_err(|pool_fault| LeaseFault::Backend(pool_fault.to_string()))?;

        let lease_seconds = lease_duration.as_secs_f64();
        let rows_affected = connection
            .execute(CLAIM_OR_RENEW_LEASE, &[&job_key, &holder_id, &lease_seconds])
            .await
            .map_err(|query_fault| LeaseFault::Backend(query_fault.to_string()))?;

        let acquired = rows_affected == 1;
        debug!("👑 [LEASE_CAS]: key={} holder={} acquired={}", job_key, holder_id, acquired);
        Ok(acquired)
    }

    async fn release(&self, job_key: &str, holder_id: Uuid) -> Result<(), LeaseFault> {
        let connection = self
            .database_client
            .get_connection()
            .await
            .map_err(|pool_fault| LeaseFault::Backend(pool_fault.to_string()))?;

        connection
            .execute(RELEASE_LEASE, &[&job_key, &holder_id])
            .await
            .map_err(|query_fault| LeaseFault::Backend(query_fault.to_string()))?;
        Ok(())
    }
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/leadership.rs]
