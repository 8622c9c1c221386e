// [libs/infra/jobs/src/global.rs]
/*!
 * =================================================================
 * APARATO: GLOBALLY-UNIQUE EXECUTOR (V7.0 - LEASE ELECTION)
 * CLASIFICACIÓN: INFRASTRUCTURE PRIMITIVES (ESTRATO L3)
 * RESPONSABILIDAD: UN SOLO LÍDER DE CLÚSTER POR LLAVE DE TRABAJO
 *
 * Máquina de estados por llave:
 *
 *   NEW ──claim ok──▶ LEADER ──tick──▶ LEADER
 *     │                  │
 *     │                  ▼ renovación perdida / nodo muerto
 *     │              (carrera de re-elección)
 *     └──claim lost──▶ FOLLOWER ──lease vencido──▶ NEW
 *
 * La elección se asienta sobre un registro de arrendamientos con CAS
 * condicional: a lo sumo un holder vigente por llave. El seguidor
 * que observa el lease vencido duerme un jitter rand(0..199ms) antes
 * de reintentar, evitando la tormenta de reintentos simultáneos.
 *
 * Garantías: ticks sin solape en el líder; ejecución al-menos-una-vez
 * por intervalo durante failovers — los trabajos deben ser idempotentes.
 * =================================================================
 */

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::concurrent::RecurrentJob;

/// Cota superior exclusiva del jitter de re-elección, en milisegundos.
const REELECTION_JITTER_CEILING_MS: u64 = 200;

#[derive(Error, Debug)]
pub enum LeaseFault {
    /// El sustrato de arrendamientos no respondió; el llamador decide
    /// si degradarse a seguidor o reintentar.
    #[error("[L3_LEASE_FAULT]: LEASE_BACKEND_UNAVAILABLE -> {0}")]
    Backend(String),
}

/// Sustrato de elección: una fila de arrendamiento por llave de trabajo.
#[async_trait]
pub trait LeaseRegistry: Send + Sync + 'static {
    /// Adquiere o renueva el arrendamiento `(job_key, holder_id)`.
    /// Devuelve `true` sii el holder es el líder vigente al retornar.
    async fn try_acquire(
        &self,
        job_key: &str,
        holder_id: Uuid,
        lease_duration: Duration,
    ) -> Result<bool, LeaseFault>;

    /// Libera el arrendamiento si este holder lo posee.
    async fn release(&self, job_key: &str, holder_id: Uuid) -> Result<(), LeaseFault>;
}

/// Opciones del ejecutor global.
#[derive(Debug, Clone)]
pub struct GlobalExecutorOptions {
    /// Llave de clúster del trabajo (p.ej. "directory_sync_scheduler").
    pub job_key: String,
    /// Cadencia de ticks del líder.
    pub interval: Duration,
    /// Vigencia del arrendamiento; debe exceder `interval` más la
    /// duración esperada de un tick para no perder el liderazgo en vuelo.
    pub lease_duration: Duration,
}

/// Lanza el ejecutor globalmente único sobre un registro de leases.
pub fn spawn_global_executor<J: RecurrentJob>(
    config: J::Config,
    lease_registry: Arc<dyn LeaseRegistry>,
    options: GlobalExecutorOptions,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let holder_id = Uuid::new_v4();
        let mut job_state = J::state(config);

        info!(
            "👑 [GLOBAL_EXECUTOR]: Node {} contending for job key [{}].",
            holder_id, options.job_key
        );

        loop {
            match lease_registry
                .try_acquire(&options.job_key, holder_id, options.lease_duration)
                .await
            {
                Ok(true) => {
                    // --- ESTADO LEADER ---
                    info!(
                        "👑 [LEADERSHIP_WON]: Node {} leads [{}]. Interval ticks armed.",
                        holder_id, options.job_key
                    );

                    loop {
                        J::execute(&mut job_state).await;
                        tokio::time::sleep(options.interval).await;

                        // Renovación post-tick: perderla degrada a FOLLOWER.
                        let renewed = lease_registry
                            .try_acquire(&options.job_key, holder_id, options.lease_duration)
                            .await
                            .unwrap_or(false);

                        if !renewed {
                            warn!(
                                "⚔️  [LEADERSHIP_LOST]: Node {} lost [{}]. Falling back to follower.",
                                holder_id, options.job_key
                            );
                            break;
                        }
                    }
                }
                Ok(false) => {
                    // --- ESTADO FOLLOWER ---
                    // Los seguidores ignoran los ticks; vigilan el lease.
                    debug!(
                        "🕯️  [FOLLOWER_WATCH]: Node {} shadowing [{}].",
                        holder_id, options.job_key
                    );
                    tokio::time::sleep(options.lease_duration).await;
                    sleep_reelection_jitter().await;
                }
                Err(backend_fault) => {
                    warn!(
                        "⚠️ [LEASE_BACKEND]: Claim attempt for [{}] failed: {}. Retrying.",
                        options.job_key, backend_fault
                    );
                    tokio::time::sleep(options.lease_duration).await;
                    sleep_reelection_jitter().await;
                }
            }
        }
    })
}

/// Jitter uniforme en [0, 200) ms antes de re-disputar el liderazgo.
async fn sleep_reelection_jitter() {
    let jitter_ms = rand::thread_rng().gen_range(0..REELECTION_JITTER_CEILING_MS);
    tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
}
// FIN DEL ARCHIVO [libs/infra/jobs/src/global.rs]
