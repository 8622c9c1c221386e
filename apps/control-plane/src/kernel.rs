// [apps/control-plane/src/kernel.rs]
/**
 * =================================================================
 * APARATO: CONTROL PLANE KERNEL (V12.0 - COMPOSITION ROOT)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN DE DAEMONS
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la placa base donde se conectan todos los servicios:
 * los ejecutores concurrentes por nodo (refresco de credenciales,
 * reaper de tokens), los schedulers globalmente únicos por adaptador
 * y el supervisor singleton del bus de replicación.
 * =================================================================
 */

use std::sync::Arc;

use tracing::info;

use cerberus_domain_models::ProviderAdapter;
use cerberus_infra_db::repositories::PostgresLeaseRegistry;
use cerberus_infra_db::PostgresClient;
use cerberus_infra_jobs::{
    spawn_concurrent_executor, spawn_global_executor, ExecutorOptions, GlobalExecutorOptions,
    LeaseRegistry,
};

use crate::services::reaper::{TokenReaperJob, REAPER_INTERVAL};
use crate::services::replication_manager::ReplicationSupervisor;
use crate::services::sync_engine::DirectorySyncEngine;
use crate::services::sync_scheduler::{
    scheduler_job_key, SchedulerContext, SyncSchedulerJob, SCHEDULER_INTERVAL, SCHEDULER_LEASE,
};
use crate::services::token_refresher::{TokenRefresherJob, REFRESH_INTERVAL};
use crate::settings::Settings;
use crate::state::AppState;

/// Adaptadores que participan de la sincronización de directorios.
const DIRECTORY_ADAPTERS: [ProviderAdapter; 4] = [
    ProviderAdapter::MicrosoftEntra,
    ProviderAdapter::Okta,
    ProviderAdapter::GoogleWorkspace,
    ProviderAdapter::Jumpcloud,
];

pub struct ControlPlaneKernel {
    pub settings: Settings,
    pub application_state: AppState,
}

impl ControlPlaneKernel {
    /// Ignición: enlaza el pool y forja el estado neural.
    pub fn ignite(settings: Settings) -> anyhow::Result<Self> {
        let database_client = PostgresClient::connect(&settings.database_url)?;
        let application_state = AppState::new(database_client);
        Ok(Self { settings, application_state })
    }

    /// Lanza todos los daemons del nodo y bloquea hasta la señal de
    /// apagado. Los ticks en vuelo corren hasta completarse dentro
    /// del runtime antes de la salida del proceso.
    pub async fn launch_control_plane_operations(self) -> anyhow::Result<()> {
        let shared_state = self.application_state.clone();

        let lease_registry: Arc<dyn LeaseRegistry> =
            Arc::new(PostgresLeaseRegistry::new(shared_state.database_client.clone()));

        // --- 1. DAEMONS CONCURRENTES POR NODO ---

        // A. Rotación de credenciales OAuth (barrido de 5 minutos)
        spawn_concurrent_executor::<TokenRefresherJob>(
            shared_state.clone(),
            ExecutorOptions::every(REFRESH_INTERVAL),
        );

        // B. Higiene de tokens vencidos
        spawn_concurrent_executor::<TokenReaperJob>(
            shared_state.clone(),
            ExecutorOptions::every(REAPER_INTERVAL),
        );

        // --- 2. SCHEDULERS GLOBALMENTE ÚNICOS POR ADAPTADOR ---

        let sync_engine = Arc::new(DirectorySyncEngine::new(shared_state.clone()));

        for adapter in DIRECTORY_ADAPTERS {
            let scheduler_context = SchedulerContext {
                state: shared_state.clone(),
                engine: Arc::clone(&sync_engine),
                adapter,
            };

            spawn_global_executor::<SyncSchedulerJob>(
                scheduler_context,
                Arc::clone(&lease_registry),
                GlobalExecutorOptions {
                    job_key: scheduler_job_key(adapter),
                    interval: SCHEDULER_INTERVAL,
                    lease_duration: SCHEDULER_LEASE,
                },
            );
        }

        // --- 3. SUPERVISOR SINGLETON DEL BUS DE REPLICACIÓN ---

        let replication_supervisor = ReplicationSupervisor::new(
            shared_state.clone(),
            self.settings.clone(),
            Arc::clone(&lease_registry),
        );
        tokio::spawn(replication_supervisor.run());

        info!(
            "🚀 [KERNEL_ONLINE]: Control plane node operational (external URL: {}).",
            self.settings.external_url
        );

        // --- 4. ESPERA DE LA SEÑAL DE APAGADO ---
        tokio::signal::ctrl_c().await?;
        info!("🛑 [KERNEL_SHUTDOWN]: Shutdown signal received. Ceasing to schedule new ticks.");
        Ok(())
    }
}
// FIN DEL ARCHIVO [apps/control-plane/src/kernel.rs]
