// [apps/control-plane/src/services/reaper.rs]
/*!
 * =================================================================
 * APARATO: THE REAPER SYSTEM SERVICE (V9.0 - HYGIENE)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: PURGA DE TOKENS VENCIDOS
 *
 * Corre en TODOS los nodos: la purga es idempotente y el motor SQL
 * arbitra las filas; no requiere liderazgo de clúster.
 * =================================================================
 */

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use cerberus_infra_jobs::RecurrentJob;

use crate::state::AppState;

/// Cadencia de la higiene de tokens.
pub const REAPER_INTERVAL: Duration = Duration::from_secs(60);

pub struct TokenReaperJob;

#[async_trait]
impl RecurrentJob for TokenReaperJob {
    type Config = AppState;
    type State = AppState;

    const NAME: &'static str = "token_reaper";

    fn state(config: Self::Config) -> Self::State {
        config
    }

    async fn execute(state: &mut Self::State) {
        if let Err(purge_fault) = state.token_repository.purge_expired_tokens().await {
            warn!("💀 [REAPER]: Expired token purge failed: {}", purge_fault);
        }
    }
}
// FIN DEL ARCHIVO [apps/control-plane/src/services/reaper.rs]
