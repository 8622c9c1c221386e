// [libs/infra/db/src/repositories/provider/mod.rs]
/*!
 * =================================================================
 * APARATO: PROVIDER REPOSITORY (V10.0 - SYNC LEDGER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CICLO DE VIDA DEL ESTADO DE SINCRONÍA DEL PROVEEDOR
 *
 * # Mathematical Proof (Disjoint Writers):
 * El refrescador de tokens escribe exclusivamente 'adapter_state'; el
 * motor de sincronía escribe exclusivamente las columnas de estado de
 * sync. Ambos trabajos pueden competir sin transacción compartida:
 * el conjunto de columnas tocadas es disjunto por construcción.
 * =================================================================
 */

pub mod queries;

use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use cerberus_domain_models::Provider;

use crate::client::PostgresClient;
use crate::errors::DbError;
use crate::repositories::provider::queries as sql_registry;

/// Umbral de racha que eleva el registro de fallos a nivel warning.
const FAILURE_STREAK_WARNING_THRESHOLD: i32 = 3;

pub struct ProviderRepository {
    database_client: PostgresClient,
}

impl ProviderRepository {
    pub fn new(database_client: PostgresClient) -> Self {
        Self { database_client }
    }

    /// Proveedores de un adaptador listos para sincronizar (predicado del scheduler).
    #[instrument(skip(self))]
    pub async fn list_ready_to_be_synced(
        &self,
        adapter: &str,
        batch_limit: i64,
    ) -> Result<Vec<Provider>, DbError> {
        let connection = self.database_client.get_connection().await?;
        let rows = connection
            .query(sql_registry::SELECT_READY_TO_SYNC, &[&batch_limit, &adapter])
            .await?;
        rows.iter().map(map_row_to_provider).collect()
    }

    /// Proveedores con credenciales vencidas y refresh token vivo.
    #[instrument(skip(self))]
    pub async fn list_needing_token_refresh(&self) -> Result<Vec<Provider>, DbError> {
        let connection = self.database_client.get_connection().await?;
        let rows = connection.query(sql_registry::SELECT_NEEDING_REFRESH, &[]).await?;
        rows.iter().map(map_row_to_provider).collect()
    }

    pub async fn get_provider(&self, provider_id: Uuid) -> Result<Provider, DbError> {
        let connection = self.database_client.get_connection().await?;
        let row = connection
            .query_opt(sql_registry::SELECT_PROVIDER_BY_ID, &[&provider_id])
            .await?
            .ok_or(DbError::NotFound)?;
        map_row_to_provider(&row)
    }

    /// Registra un fallo transitorio sin deshabilitar el directorio.
    #[instrument(skip(self, human_message), fields(provider_id = %provider_id))]
    pub async fn record_transient_failure(
        &self,
        provider_id: Uuid,
        human_message: &str,
    ) -> Result<i32, DbError> {
        let connection = self.database_client.get_connection().await?;
        let row = connection
            .query_one(sql_registry::RECORD_TRANSIENT_FAILURE, &[&provider_id, &human_message])
            .await?;
        let failure_streak: i32 = row.get(0);

        if failure_streak >= FAILURE_STREAK_WARNING_THRESHOLD {
            warn!(
                "📉 [SYNC_STREAK]: Provider {} has failed {} consecutive syncs: {}",
                provider_id, failure_streak, human_message
            );
        }
        Ok(failure_streak)
    }

    /// Deshabilita el directorio con `disabled_reason = "Sync error"`.
    #[instrument(skip(self, human_message), fields(provider_id = %provider_id))]
    pub async fn disable_directory(&self, provider_id: Uuid, human_message: &str) -> Result<(), DbError> {
        let connection = self.database_client.get_connection().await?;
        connection
            .query_one(sql_registry::DISABLE_DIRECTORY, &[&provider_id, &human_message])
            .await?;

        warn!("🚫 [DIRECTORY_DISABLED]: Provider {} disabled: {}", provider_id, human_message);
        Ok(())
    }

    /// Persiste credenciales rotadas preservando el resto del documento.
    #[instrument(skip(self, rotated_state), fields(provider_id = %provider_id))]
    pub async fn persist_rotated_state(
        &self,
        provider_id: Uuid,
        rotated_state: &serde_json::Value,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection().await?;
        connection
            .execute(sql_registry::PERSIST_ROTATED_STATE, &[&provider_id, rotated_state])
            .await?;
        info!("🔑 [STATE_ROTATED]: Credentials persisted for provider {}.", provider_id);
        Ok(())
    }
}

/// Mapeo nominal fila -> entidad de dominio.
pub(crate) fn map_row_to_provider(row: &Row) -> Result<Provider, DbError> {
    let adapter_raw: String = row.try_get("adapter")?;
    let provisioner_raw: String = row.try_get("provisioner")?;

    Ok(Provider {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        name: row.try_get("name")?,
        adapter: adapter_raw.parse().map_err(DbError::MappingError)?,
        provisioner: provisioner_raw.parse().map_err(DbError::MappingError)?,
        adapter_config: row.try_get("adapter_config")?,
        adapter_state: row.try_get("adapter_state")?,
        last_synced_at: row.try_get::<_, Option<DateTime<Utc>>>("last_synced_at")?,
        last_syncs_failed: row.try_get("last_syncs_failed")?,
        last_sync_error: row.try_get("last_sync_error")?,
        sync_errored_at: row.try_get("sync_errored_at")?,
        sync_disabled_at: row.try_get("sync_disabled_at")?,
        sync_error_emailed_at: row.try_get("sync_error_emailed_at")?,
        is_disabled: row.try_get("is_disabled")?,
        disabled_reason: row.try_get("disabled_reason")?,
        is_verified: row.try_get("is_verified")?,
        disabled_at: row.try_get("disabled_at")?,
        deleted_at: row.try_get("deleted_at")?,
        created_at: row.try_get("created_at")?,
    })
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/provider/mod.rs]
