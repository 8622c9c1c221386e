// [apps/control-plane/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: APPLICATION STATE HUB (V9.0 - COMPOSITION ROOT)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE REPOSITORIOS, BUS Y PRESENCIA
 * =================================================================
 */

pub mod presence;

use std::sync::Arc;

use cerberus_infra_db::repositories::{
    AccountRepository, DirectoryRepository, ProviderRepository, TokenRepository,
};
use cerberus_infra_db::PostgresClient;

use crate::services::event_bus::EventBus;
use crate::state::presence::PresenceRegistry;

/// Contenedor de estado compartido (thread-safe) del centro de mando.
#[derive(Clone)]
pub struct AppState {
    /// Pool táctico hacia el clúster PostgreSQL.
    pub database_client: PostgresClient,
    /// Bus de eventos para señales de entidad en tiempo real.
    pub event_bus: Arc<EventBus>,
    /// Registro de presencia de gateways, relays y clientes.
    pub presence: Arc<PresenceRegistry>,

    // --- REPOSITORIOS DEL ESTRATO L3 ---
    pub account_repository: Arc<AccountRepository>,
    pub provider_repository: Arc<ProviderRepository>,
    pub directory_repository: Arc<DirectoryRepository>,
    pub token_repository: Arc<TokenRepository>,
}

impl AppState {
    /// Forja el estado maestro inyectando todas las dependencias.
    pub fn new(database_client: PostgresClient) -> Self {
        Self {
            event_bus: Arc::new(EventBus::new()),
            presence: Arc::new(PresenceRegistry::new()),
            account_repository: Arc::new(AccountRepository::new(database_client.clone())),
            provider_repository: Arc::new(ProviderRepository::new(database_client.clone())),
            directory_repository: Arc::new(DirectoryRepository::new(database_client.clone())),
            token_repository: Arc::new(TokenRepository::new(database_client.clone())),
            database_client,
        }
    }
}
// FIN DEL ARCHIVO [apps/control-plane/src/state/mod.rs]
