// [apps/control-plane/src/services/token_refresher.rs]
/*!
 * =================================================================
 * APARATO: CREDENTIAL REFRESH DAEMON (V7.0 - OAUTH SWEEP)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: BARRIDO QUINQUEMINUTAL DE CREDENCIALES VENCIDAS
 *
 * Un fallo de rotación NO toca el estado del proveedor: el scheduler
 * observará el token vencido y aplicará su presupuesto normal de
 * errores. El refrescador solo escribe el documento adapter_state.
 * =================================================================
 */

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use cerberus_infra_idp::refresh_access_token;
use cerberus_infra_jobs::RecurrentJob;

use crate::state::AppState;

/// Cadencia del barrido de refresco.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub struct TokenRefresherJob;

#[async_trait]
impl RecurrentJob for TokenRefresherJob {
    type Config = AppState;
    type State = AppState;

    const NAME: &'static str = "provider_token_refresher";

    fn state(config: Self::Config) -> Self::State {
        config
    }

    async fn execute(state: &mut Self::State) {
        let stale_providers = match state.provider_repository.list_needing_token_refresh().await {
            Ok(providers) => providers,
            Err(selection_fault) => {
                warn!("⚠️ [TOKEN_REFRESHER]: Candidate selection failed: {}", selection_fault);
                return;
            }
        };

        if stale_providers.is_empty() {
            return;
        }

        info!("🔑 [TOKEN_REFRESHER]: Rotating credentials for {} provider(s).", stale_providers.len());

        for provider in &stale_providers {
            match refresh_access_token(provider).await {
                Ok(rotated) => {
                    let rotated_document = provider
                        .typed_state()
                        .with_rotated_credentials(
                            rotated.access_token,
                            rotated.refresh_token,
                            rotated.expires_at,
                        )
                        .to_document();

                    if let Err(persist_fault) = state
                        .provider_repository
                        .persist_rotated_state(provider.id, &rotated_document)
                        .await
                    {
                        warn!("⚠️ [TOKEN_REFRESHER]: Persist failed for {}: {}", provider.id, persist_fault);
                    }
                }
                Err(refresh_fault) => {
                    // Se deja el proveedor intacto: el presupuesto del
                    // scheduler gobierna la eventual deshabilitación.
                    warn!(
                        "⚠️ [TOKEN_REFRESHER]: Rotation failed for provider {}: {}",
                        provider.id, refresh_fault
                    );
                }
            }
        }
    }
}
// FIN DEL ARCHIVO [apps/control-plane/src/services/token_refresher.rs]
