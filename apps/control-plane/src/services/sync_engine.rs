// [apps/control-plane/src/services/sync_engine.rs]
/*!
 * =================================================================
 * APARATO: DIRECTORY SYNC ENGINE (V11.0 - PROVIDER PIPELINE)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: PIPELINE POR PROVEEDOR fetch -> plan -> apply
 *
 * Secuencia normativa por proveedor:
 * 1. Compuerta de suscripción: features.idp_sync de la cuenta.
 * 2. list_users y list_groups EN PARALELO; ambos deben triunfar.
 * 3. Miembros por grupo con cortocircuito al primer fallo.
 * 4. Planner puro sobre instantánea remota y estado local.
 * 5. Cortacircuitos anti-aniquilación y aplicación en UNA transacción
 *    (identidades -> grupos -> membresías -> last_synced_at).
 *
 * Todo fallo pasa por el clasificador: los errores de cliente
 * deshabilitan el directorio de inmediato; los transitorios se
 * registran y escalan a las 24 h de racha.
 * =================================================================
 */

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use cerberus_domain_models::{MembershipTuple, Provider, ProviderAdapter, RemoteGroup, RemoteUser};
use cerberus_domain_sync::attributes::GROUP_IDENTIFIER_PREFIX;
use cerberus_domain_sync::{
    assert_plan_is_not_destructive, classify, directory_action, plan_provider_sync, ApiFlavor,
    Classified, DirectoryAction, MappingViolation, SyncFault,
};
use cerberus_infra_db::DbError;
use cerberus_infra_idp::{
    EntraDirectoryClient, GoogleDirectoryClient, OktaDirectoryClient, WorkOsDirectoryClient,
};

use crate::state::AppState;

/// Mensaje persistido cuando la cuenta no porta la feature idp_sync.
const SUBSCRIPTION_GATE_MESSAGE: &str =
    "IdP directory sync is not included in the account subscription";

/// Endpoints raíz por defecto de cada directorio.
const ENTRA_DEFAULT_ENDPOINT: &str = "https://graph.microsoft.com";
const GOOGLE_DEFAULT_ENDPOINT: &str = "https://admin.googleapis.com";
const WORKOS_DEFAULT_ENDPOINT: &str = "https://api.workos.com";

/// Motor de sincronía: un pipeline serial por proveedor; el scheduler decide
/// cuántos proveedores corren en paralelo por tick.
pub struct DirectorySyncEngine {
    state: AppState,
    entra_client: EntraDirectoryClient,
    okta_client: OktaDirectoryClient,
    google_client: GoogleDirectoryClient,
    workos_client: WorkOsDirectoryClient,
}

impl DirectorySyncEngine {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            entra_client: EntraDirectoryClient::new(),
            okta_client: OktaDirectoryClient::new(),
            google_client: GoogleDirectoryClient::new(),
            workos_client: WorkOsDirectoryClient::new(),
        }
    }

    /// Corre la sincronización completa de un proveedor, registrando
    /// el desenlace (éxito, registro o deshabilitación) en su fila.
    #[instrument(skip(self, provider), fields(provider_id = %provider.id, adapter = provider.adapter.as_str()))]
    pub async fn sync_provider(&self, provider: &Provider) {
        // 1. COMPUERTA DE SUSCRIPCIÓN
        match self.state.account_repository.get_account(provider.account_id).await {
            Ok(account) if account.idp_sync_enabled() => {}
            Ok(_) => {
                let _ = self
                    .state
                    .provider_repository
                    .record_transient_failure(provider.id, SUBSCRIPTION_GATE_MESSAGE)
                    .await;
                return;
            }
            Err(lookup_fault) => {
                error!("❌ [SYNC_ENGINE]: Account lookup failed: {}", lookup_fault);
                return;
            }
        }

        // 2-4. INSTANTÁNEA REMOTA Y PLAN
        let outcome = self.execute_sync_pipeline(provider).await;

        // 5. DESENLACE
        match outcome {
            Ok(()) => {}
            Err(PipelineFault::Remote(fault)) => self.register_fault(provider, &fault).await,
            Err(PipelineFault::Internal { step, fault }) => {
                // Fallo interno: se registra con el mensaje del paso y
                // el scheduler reintenta con su backoff normal.
                error!("💥 [SYNC_ENGINE]: Internal fault during {}: {}", step, fault);
                let step_message = format!("Internal error during {step}");
                if let Err(persist_fault) = self
                    .state
                    .provider_repository
                    .record_transient_failure(provider.id, &step_message)
                    .await
                {
                    error!("❌ [SYNC_ENGINE]: Failed to record sync failure: {}", persist_fault);
                }
            }
            Err(PipelineFault::ClaimedByPeer) => {
                // Otro nodo aplica este proveedor en este instante; el
                // candado advisory arbitró. No es un fallo.
                info!("🔒 [SYNC_ENGINE]: Provider {} claimed by a peer node. Skipping.", provider.id);
            }
        }
    }

    /// Pipeline completo; retorna el fallo crudo para clasificación.
    async fn execute_sync_pipeline(&self, provider: &Provider) -> Result<(), PipelineFault> {
        let (remote_users, remote_groups, remote_memberships) =
            self.fetch_remote_snapshot(provider).await.map_err(PipelineFault::Remote)?;

        let local_identities = self
            .state
            .directory_repository
            .load_local_identities(provider.id)
            .await
            .map_err(|fault| PipelineFault::internal("sync_identities", fault))?;
        let local_groups = self
            .state
            .directory_repository
            .load_local_groups(provider.id)
            .await
            .map_err(|fault| PipelineFault::internal("sync_groups", fault))?;
        let local_memberships = self
            .state
            .directory_repository
            .load_local_memberships(provider.id)
            .await
            .map_err(|fault| PipelineFault::internal("sync_memberships", fault))?;

        let plan = plan_provider_sync(
            &remote_users,
            &remote_groups,
            &remote_memberships,
            &local_identities,
            &local_groups,
            &local_memberships,
        );

        assert_plan_is_not_destructive(&plan, local_identities.len(), local_groups.len())
            .map_err(PipelineFault::Remote)?;

        self.state
            .directory_repository
            .apply_sync_plan(provider, &plan)
            .await
            .map_err(|fault| match fault {
                DbError::ClaimConflict => PipelineFault::ClaimedByPeer,
                other => PipelineFault::internal("save_last_synced_at", other),
            })?;

        info!("✅ [SYNC_ENGINE]: Provider {} synchronized ({}).", provider.id, plan.summary());
        Ok(())
    }

    /// Usuarios y grupos en paralelo; miembros con cortocircuito.
    async fn fetch_remote_snapshot(
        &self,
        provider: &Provider,
    ) -> Result<(Vec<RemoteUser>, Vec<RemoteGroup>, Vec<MembershipTuple>), SyncFault> {
        let access_token = provider
            .typed_state()
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(SyncFault::Validation(MappingViolation {
                entity: "provider",
                field: "access_token",
            }))?;

        match provider.adapter {
            ProviderAdapter::MicrosoftEntra => {
                let endpoint = provider.api_endpoint().unwrap_or(ENTRA_DEFAULT_ENDPOINT).to_string();
                let (users_outcome, groups_outcome) = tokio::join!(
                    self.entra_client.list_users(&endpoint, &access_token),
                    self.entra_client.list_groups(&endpoint, &access_token)
                );
                let remote_users = users_outcome?;
                let remote_groups = groups_outcome?;

                let mut remote_memberships = Vec::new();
                for remote_group in &remote_groups {
                    let members = self
                        .entra_client
                        .list_group_members(&endpoint, &access_token, raw_group_id(remote_group))
                        .await?;
                    collect_membership_tuples(&mut remote_memberships, remote_group, members);
                }
                Ok((remote_users, remote_groups, remote_memberships))
            }

            ProviderAdapter::Okta => {
                let endpoint = provider
                    .api_endpoint()
                    .ok_or(SyncFault::Validation(MappingViolation {
                        entity: "provider",
                        field: "api_base_url",
                    }))?
                    .to_string();
                let (users_outcome, groups_outcome) = tokio::join!(
                    self.okta_client.list_users(&endpoint, &access_token),
                    self.okta_client.list_groups(&endpoint, &access_token)
                );
                let remote_users = users_outcome?;
                let remote_groups = groups_outcome?;

                let mut remote_memberships = Vec::new();
                for remote_group in &remote_groups {
                    let members = self
                        .okta_client
                        .list_group_members(&endpoint, &access_token, raw_group_id(remote_group))
                        .await?;
                    collect_membership_tuples(&mut remote_memberships, remote_group, members);
                }
                Ok((remote_users, remote_groups, remote_memberships))
            }

            ProviderAdapter::GoogleWorkspace => {
                let endpoint = provider.api_endpoint().unwrap_or(GOOGLE_DEFAULT_ENDPOINT).to_string();
                let (users_outcome, groups_outcome) = tokio::join!(
                    self.google_client.list_users(&endpoint, &access_token),
                    self.google_client.list_groups(&endpoint, &access_token)
                );
                let remote_users = users_outcome?;
                let remote_groups = groups_outcome?;

                let mut remote_memberships = Vec::new();
                for remote_group in &remote_groups {
                    let members = self
                        .google_client
                        .list_group_members(&endpoint, &access_token, raw_group_id(remote_group))
                        .await?;
                    collect_membership_tuples(&mut remote_memberships, remote_group, members);
                }
                Ok((remote_users, remote_groups, remote_memberships))
            }

            ProviderAdapter::Jumpcloud => {
                let endpoint = provider.api_endpoint().unwrap_or(WORKOS_DEFAULT_ENDPOINT).to_string();
                let directory_identifier = provider
                    .adapter_config
                    .get("workos_directory_id")
                    .and_then(serde_json::Value::as_str)
                    .ok_or(SyncFault::Validation(MappingViolation {
                        entity: "provider",
                        field: "workos_directory_id",
                    }))?
                    .to_string();

                let (users_outcome, groups_outcome) = tokio::join!(
                    self.workos_client.list_users(&endpoint, &access_token, &directory_identifier),
                    self.workos_client.list_groups(&endpoint, &access_token, &directory_identifier)
                );
                let remote_users = users_outcome?;
                let remote_groups = groups_outcome?;

                let mut remote_memberships = Vec::new();
                for remote_group in &remote_groups {
                    let members = self
                        .workos_client
                        .list_group_members(&endpoint, &access_token, raw_group_id(remote_group))
                        .await?;
                    collect_membership_tuples(&mut remote_memberships, remote_group, members);
                }
                Ok((remote_users, remote_groups, remote_memberships))
            }

            // Adaptadores sin directorio: el scheduler jamás los entrega.
            _ => Err(SyncFault::Validation(MappingViolation { entity: "provider", field: "adapter" })),
        }
    }

    /// Clasifica y persiste el desenlace de un fallo.
    async fn register_fault(&self, provider: &Provider, fault: &SyncFault) {
        let classified: Classified = classify(flavor_of(provider.adapter), fault);
        let action = directory_action(&classified, provider.sync_errored_at, Utc::now());

        match action {
            DirectoryAction::Disable => {
                if let Err(persist_fault) = self
                    .state
                    .provider_repository
                    .disable_directory(provider.id, &classified.message)
                    .await
                {
                    error!("❌ [SYNC_ENGINE]: Failed to disable directory: {}", persist_fault);
                }
            }
            DirectoryAction::Record => {
                if let Err(persist_fault) = self
                    .state
                    .provider_repository
                    .record_transient_failure(provider.id, &classified.message)
                    .await
                {
                    error!("❌ [SYNC_ENGINE]: Failed to record sync failure: {}", persist_fault);
                }
            }
        }

        warn!(
            "⚠️ [SYNC_ENGINE]: Provider {} sync failed ({:?}): {}",
            provider.id, classified.kind, classified.message
        );
    }

    /// Sonda de conectividad para el subcomando verify-provider: corre
    /// list_users y reporta el mensaje clasificado sin tocar estado.
    pub async fn probe_provider(&self, provider: &Provider) -> Result<usize, String> {
        match self.fetch_remote_snapshot(provider).await {
            Ok((remote_users, _, _)) => Ok(remote_users.len()),
            Err(fault) => Err(classify(flavor_of(provider.adapter), &fault).message),
        }
    }
}

/// Desenlace interno del pipeline, previo a la clasificación.
enum PipelineFault {
    /// Fallo de la frontera remota; pasa por el clasificador.
    Remote(SyncFault),
    /// Fallo interno de persistencia con el paso que lo produjo.
    Internal { step: &'static str, fault: DbError },
    /// El candado advisory quedó en manos de otro nodo.
    ClaimedByPeer,
}

impl PipelineFault {
    fn internal(step: &'static str, fault: DbError) -> Self {
        PipelineFault::Internal { step, fault }
    }
}

/// Identificador crudo del grupo según el IdP (sin el prefijo G:).
fn raw_group_id(remote_group: &RemoteGroup) -> &str {
    remote_group
        .provider_identifier
        .strip_prefix(GROUP_IDENTIFIER_PREFIX)
        .unwrap_or(&remote_group.provider_identifier)
}

fn collect_membership_tuples(
    accumulator: &mut Vec<MembershipTuple>,
    remote_group: &RemoteGroup,
    members: Vec<RemoteUser>,
) {
    accumulator.extend(members.into_iter().map(|member| {
        MembershipTuple::new(remote_group.provider_identifier.clone(), member.provider_identifier)
    }));
}

fn flavor_of(adapter: ProviderAdapter) -> ApiFlavor {
    match adapter {
        ProviderAdapter::Okta => ApiFlavor::Okta,
        ProviderAdapter::GoogleWorkspace => ApiFlavor::GoogleDirectory,
        ProviderAdapter::Jumpcloud => ApiFlavor::WorkOs,
        _ => ApiFlavor::MicrosoftGraph,
    }
}
// FIN DEL ARCHIVO [apps/control-plane/src/services/sync_engine.rs]
