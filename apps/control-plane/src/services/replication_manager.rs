// [apps/control-plane/src/services/replication_manager.rs]
/*!
 * =================================================================
 * APARATO: REPLICATION SUPERVISOR (V9.0 - SINGLETON GUARD)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: A LO SUMO UN CONSUMIDOR DE WAL EN EL CLÚSTER
 *
 * Físicas del supervisor:
 * 1. SINGLETON: el consumidor se registra bajo la llave global
 *    'replication_consumer'; si otro nodo la posee, este manager lo
 *    trata como éxito y queda en standby.
 * 2. RETRY: el enlace se reintenta hasta 10 veces con 30 s de
 *    espaciado; agotado el presupuesto, la supervisión se rinde y el
 *    bucle exterior (la política de reinicio) vuelve a empezar.
 * 3. DURABILIDAD: el slot es durable, el WAL no confirmado se
 *    re-entrega tras la reconexión; los hooks deben ser idempotentes.
 * =================================================================
 */

use std::sync::Arc;
use std::time::Duration;

use tokio_postgres::config::Host;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use cerberus_infra_jobs::LeaseRegistry;
use cerberus_infra_replication::{
    ReplicationConfig, ReplicationConnection, ReplicationError, WireConfig,
};

use crate::services::hooks::build_event_dispatcher;
use crate::settings::Settings;
use crate::state::AppState;

/// Llave global del singleton de replicación.
const SINGLETON_JOB_KEY: &str = "replication_consumer";
/// Vigencia del lease del singleton.
const SINGLETON_LEASE: Duration = Duration::from_secs(60);
/// Cadencia de renovación del lease durante el streaming.
const LEASE_RENEWAL_INTERVAL: Duration = Duration::from_secs(20);
/// Presupuesto de reintentos de conexión.
const CONNECT_RETRY_LIMIT: u32 = 10;
/// Espaciado entre reintentos de conexión.
const CONNECT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Esquema y plugin normativos del bus de eventos.
const REPLICATION_SCHEMA: &str = "public";
const OUTPUT_PLUGIN: &str = "pgoutput";
const PROTO_VERSION: u8 = 1;

pub struct ReplicationSupervisor {
    state: AppState,
    settings: Settings,
    lease_registry: Arc<dyn LeaseRegistry>,
}

impl ReplicationSupervisor {
    pub fn new(state: AppState, settings: Settings, lease_registry: Arc<dyn LeaseRegistry>) -> Self {
        Self { state, settings, lease_registry }
    }

    /// Bucle perpetuo de supervisión; pensado para `tokio::spawn`.
    pub async fn run(self) {
        let holder_id = Uuid::new_v4();
        info!("🛰️  [REPL_SUPERVISOR]: Node {} contending for the WAL consumer.", holder_id);

        loop {
            match self
                .lease_registry
                .try_acquire(SINGLETON_JOB_KEY, holder_id, SINGLETON_LEASE)
                .await
            {
                Ok(true) => {
                    self.supervise_stream(holder_id).await;
                    // La supervisión terminó (presupuesto agotado o
                    // liderazgo perdido); re-disputar desde cero.
                }
                Ok(false) => {
                    // Otro nodo ya consume el WAL: éxito por contrato.
                    debug!("🛰️  [REPL_SUPERVISOR]: Peer holds the consumer. Standing by.");
                    tokio::time::sleep(SINGLETON_LEASE).await;
                }
                Err(lease_fault) => {
                    warn!("⚠️ [REPL_SUPERVISOR]: Lease backend unavailable: {}. Retrying.", lease_fault);
                    tokio::time::sleep(SINGLETON_LEASE).await;
                }
            }
        }
    }

    /// Mantiene el flujo vivo mientras se conserve el liderazgo.
    async fn supervise_stream(&self, holder_id: Uuid) {
        let wire_config = match build_wire_config(&self.settings.database_url) {
            Ok(config) => config,
            Err(config_fault) => {
                error!("❌ [REPL_SUPERVISOR]: Unusable database coordinates: {}", config_fault);
                return;
            }
        };

        let mut connect_attempts: u32 = 0;

        while connect_attempts < CONNECT_RETRY_LIMIT {
            connect_attempts += 1;

            let replication_config = ReplicationConfig {
                schema: REPLICATION_SCHEMA.to_string(),
                publication_name: self.settings.replication_publication_name.clone(),
                replication_slot_name: self.settings.replication_slot_name.clone(),
                output_plugin: OUTPUT_PLUGIN.to_string(),
                proto_version: PROTO_VERSION,
                table_subscriptions: self.settings.replication_table_subscriptions.clone(),
                wire: wire_config.clone(),
            };

            let dispatcher = build_event_dispatcher(
                &self.settings.replication_table_subscriptions,
                Arc::clone(&self.state.event_bus),
            );

            let mut connection = ReplicationConnection::new(replication_config, dispatcher);
            let stream = connection.run();
            tokio::pin!(stream);

            let mut renewal_ticker = tokio::time::interval(LEASE_RENEWAL_INTERVAL);
            renewal_ticker.tick().await; // el primer tick es inmediato

            let stream_outcome: Result<(), ReplicationError> = loop {
                tokio::select! {
                    outcome = &mut stream => break outcome,

                    _ = renewal_ticker.tick() => {
                        let renewed = self
                            .lease_registry
                            .try_acquire(SINGLETON_JOB_KEY, holder_id, SINGLETON_LEASE)
                            .await
                            .unwrap_or(false);

                        if !renewed {
                            warn!("⚔️  [REPL_SUPERVISOR]: Consumer leadership lost mid-stream. Dropping link.");
                            return;
                        }
                    }
                }
            };

            match stream_outcome {
                Ok(()) => return,
                Err(stream_fault) => {
                    warn!(
                        "🔌 [REPL_SUPERVISOR]: Stream collapsed (attempt {}/{}): {}",
                        connect_attempts, CONNECT_RETRY_LIMIT, stream_fault
                    );
                    tokio::time::sleep(CONNECT_RETRY_INTERVAL).await;
                }
            }
        }

        error!(
            "💀 [REPL_SUPERVISOR]: Connect budget exhausted ({} attempts). Yielding to restart policy.",
            CONNECT_RETRY_LIMIT
        );
    }
}

/// Deriva las coordenadas de la sesión de replicación de la URL libpq.
pub fn build_wire_config(database_url: &str) -> Result<WireConfig, String> {
    let parsed: tokio_postgres::Config = database_url
        .parse()
        .map_err(|parse_fault| format!("malformed DATABASE_URL: {parse_fault}"))?;

    let host = parsed
        .get_hosts()
        .iter()
        .find_map(|host| match host {
            Host::Tcp(hostname) => Some(hostname.clone()),
            #[allow(unreachable_patterns)]
            _ => None,
        })
        .ok_or_else(|| "DATABASE_URL must name a TCP host".to_string())?;

    let port = parsed.get_ports().first().copied().unwrap_or(5432);
    let user = parsed.get_user().unwrap_or("postgres").to_string();
    let password = parsed
        .get_password()
        .map(|raw| String::from_utf8_lossy(raw).into_owned());
    let database = parsed.get_dbname().unwrap_or("postgres").to_string();

    Ok(WireConfig {
        host,
        port,
        user,
        password,
        database,
        application_name: "cerberus-replication-consumer".to_string(),
    })
}
// FIN DEL ARCHIVO [apps/control-plane/src/services/replication_manager.rs]
