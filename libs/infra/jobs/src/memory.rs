// [libs/infra/jobs/src/memory.rs]
/*!
 * =================================================================
 * APARATO: IN-MEMORY LEASE REGISTRY (V3.0)
 * CLASIFICACIÓN: INFRASTRUCTURE PRIMITIVES (ESTRATO L3)
 * RESPONSABILIDAD: SUSTRATO DE ELECCIÓN PARA NODO ÚNICO Y PRUEBAS
 *
 * Despliegues de un solo nodo no necesitan coordinación Postgres: este
 * registro en RAM honra el mismo contrato CAS que el sustrato durable.
 * =================================================================
 */

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use crate::global::{LeaseFault, LeaseRegistry};

#[derive(Debug, Clone, Copy)]
struct LeaseRow {
    holder_id: Uuid,
    lease_until: Instant,
}

/// Registro de arrendamientos respaldado por un mapa protegido.
#[derive(Default)]
pub struct InMemoryLeaseRegistry {
    rows: Mutex<HashMap<String, LeaseRow>>,
}

impl InMemoryLeaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holder vigente de una llave, si el lease no venció.
    pub fn current_holder(&self, job_key: &str) -> Option<Uuid> {
        let rows_guard = self.rows.lock().expect("LOCK_POISONED");
        rows_guard
            .get(job_key)
            .filter(|row| row.lease_until > Instant::now())
            .map(|row| row.holder_id)
    }

    /// Expira el lease de una llave de inmediato (simulación de muerte
    /// del líder en el proving grounds).
    pub fn forcibly_expire(&self, job_key: &str) {
        let mut rows_guard = self.rows.lock().expect("LOCK_POISONED");
        rows_guard.remove(job_key);
    }
}

#[async_trait]
impl LeaseRegistry for InMemoryLeaseRegistry {
    async fn try_acquire(
        &self,
        job_key: &str,
        holder_id: Uuid,
        lease_duration: Duration,
    ) -> Result<bool, LeaseFault> {
        let mut rows_guard = self.rows.lock().map_err(|_| {
            LeaseFault::Backend("lease registry lock poisoned".to_string())
        })?;

        let now = Instant::now();
        let row = rows_guard.get(job_key).copied();

        // CAS: gana quien encuentre la fila libre, vencida o propia.
        let claimable = match row {
            None => true,
            Some(existing) => existing.holder_id == holder_id || existing.lease_until <= now,
        };

        if claimable {
            rows_guard.insert(
                job_key.to_string(),
                LeaseRow { holder_id, lease_until: now + lease_duration },
            );
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn release(&self, job_key: &str, holder_id: Uuid) -> Result<(), LeaseFault> {
        let mut rows_guard = self.rows.lock().map_err(|_| {
            LeaseFault::Backend("lease registry lock poisoned".to_string())
        })?;

        if rows_guard.get(job_key).is_some_and(|row| row.holder_id == holder_id) {
            rows_guard.remove(job_key);
        }
        Ok(())
    }
}
// FIN DEL ARCHIVO [libs/infra/jobs/src/memory.rs]
