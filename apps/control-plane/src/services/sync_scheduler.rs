// [apps/control-plane/src/services/sync_scheduler.rs]
/*!
 * =================================================================
 * APARATO: DIRECTORY SYNC SCHEDULER (V8.0 - BATCH LOOP)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: SELECCIÓN ready_to_be_synced Y DESPACHO EN LOTES
 *
 * Hospedado bajo el ejecutor globalmente único: un líder de clúster
 * por adaptador. Cada tick entrega un lote de hasta 5 proveedores al
 * motor de sincronía; dos proveedores del lote corren en paralelo en el mismo
 * nodo, y el candado advisory por fila impide que dos nodos apliquen
 * el mismo proveedor.
 * =================================================================
 */

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, error, info};

use cerberus_domain_models::ProviderAdapter;
use cerberus_infra_jobs::RecurrentJob;

use crate::services::sync_engine::DirectorySyncEngine;
use crate::state::AppState;

/// Lote máximo de proveedores por tick.
const SCHEDULER_BATCH_SIZE: i64 = 5;
/// Cadencia del scheduler por adaptador.
pub const SCHEDULER_INTERVAL: Duration = Duration::from_secs(60);
/// Vigencia del lease de liderazgo del scheduler.
pub const SCHEDULER_LEASE: Duration = Duration::from_secs(300);

/// Contexto inyectado al trabajo del scheduler.
pub struct SchedulerContext {
    pub state: AppState,
    pub engine: Arc<DirectorySyncEngine>,
    pub adapter: ProviderAdapter,
}

/// Llave de clúster del scheduler de un adaptador.
pub fn scheduler_job_key(adapter: ProviderAdapter) -> String {
    format!("directory_sync:{}", adapter.as_str())
}

pub struct SyncSchedulerJob;

#[async_trait]
impl RecurrentJob for SyncSchedulerJob {
    type Config = SchedulerContext;
    type State = SchedulerContext;

    const NAME: &'static str = "directory_sync_scheduler";

    fn state(config: Self::Config) -> Self::State {
        config
    }

    async fn execute(context: &mut Self::State) {
        let ready_providers = match context
            .state
            .provider_repository
            .list_ready_to_be_synced(context.adapter.as_str(), SCHEDULER_BATCH_SIZE)
            .await
        {
            Ok(providers) => providers,
            Err(selection_fault) => {
                error!("❌ [SYNC_SCHEDULER]: Candidate selection failed: {}", selection_fault);
                return;
            }
        };

        if ready_providers.is_empty() {
            debug!("🗓️  [SYNC_SCHEDULER]: No {} providers ready.", context.adapter.as_str());
            return;
        }

        info!(
            "🗓️  [SYNC_SCHEDULER]: Dispatching {} {} provider(s).",
            ready_providers.len(),
            context.adapter.as_str()
        );

        // Los proveedores del lote corren en paralelo; cada pipeline
        // individual es serial por contrato.
        let sync_runs = ready_providers
            .iter()
            .map(|provider| context.engine.sync_provider(provider));
        join_all(sync_runs).await;
    }
}
// FIN DEL ARCHIVO [apps/control-plane/src/services/sync_scheduler.rs]
