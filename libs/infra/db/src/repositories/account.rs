// [libs/infra/db/src/repositories/account.rs]
/*!
 * =================================================================
 * APARATO: ACCOUNT REPOSITORY (V6.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LECTURA DE LA RAÍZ DE TENENCIA Y SUS COMPUERTAS
 * =================================================================
 */

use tokio_postgres::Row;
use tracing::instrument;
use uuid::Uuid;

use cerberus_domain_models::Account;

use crate::client::PostgresClient;
use crate::errors::DbError;

const SELECT_ACCOUNT_BY_ID: &str = r#"
    SELECT id, legal_name, disabled_at, features, limits, metadata,
           warning, warning_last_sent_at, config, created_at
    FROM accounts
    WHERE id = $1
"#;

pub struct AccountRepository {
    database_client: PostgresClient,
}

impl AccountRepository {
    pub fn new(database_client: PostgresClient) -> Self {
        Self { database_client }
    }

    /// Recupera la cuenta; el motor de sincronía consulta aquí la
    /// compuerta `features.idp_sync` antes de tocar el directorio.
    #[instrument(skip(self))]
    pub async fn get_account(&self, account_id: Uuid) -> Result<Account, DbError> {
        let connection = self.database_client.get_connection().await?;
        let row = connection
            .query_opt(SELECT_ACCOUNT_BY_ID, &[&account_id])
            .await?
            .ok_or(DbError::NotFound)?;
        map_row_to_account(&row)
    }
}

fn map_row_to_account(row: &Row) -> Result<Account, DbError> {
    let features_document: serde_json::Value = row.try_get("features")?;
    let limits_document: serde_json::Value = row.try_get("limits")?;
    let config_document: serde_json::Value = row.try_get("config")?;

    Ok(Account {
        id: row.try_get("id")?,
        legal_name: row.try_get("legal_name")?,
        disabled_at: row.try_get("disabled_at")?,
        features: serde_json::from_value(features_document)
            .map_err(|fault| DbError::MappingError(format!("features: {fault}")))?,
        limits: serde_json::from_value(limits_document)
            .map_err(|fault| DbError::MappingError(format!("limits: {fault}")))?,
        metadata: row.try_get("metadata")?,
        warning: row.try_get("warning")?,
        warning_last_sent_at: row.try_get("warning_last_sent_at")?,
        config: serde_json::from_value(config_document)
            .map_err(|fault| DbError::MappingError(format!("config: {fault}")))?,
        created_at: row.try_get("created_at")?,
    })
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/account.rs]
