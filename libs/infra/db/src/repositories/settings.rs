// [libs/infra/db/src/repositories/settings.rs]
/*!
 * =================================================================
 * APARATO: CONFIG OVERRIDES LOADER (V2.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: FUENTE 'db' DEL RESOLUTOR DE CONFIGURACIÓN
 * =================================================================
 */

use std::collections::BTreeMap;

use tracing::instrument;

use crate::client::PostgresClient;
use crate::errors::DbError;

const SELECT_ALL_OVERRIDES: &str = "SELECT key, value FROM configs";

/// Carga los overrides persistidos; el resolutor los consulta con
/// precedencia por debajo del entorno y por encima de los defaults.
#[instrument(skip(database_client))]
pub async fn load_config_overrides(
    database_client: &PostgresClient,
) -> Result<BTreeMap<String, String>, DbError> {
    let connection = database_client.get_connection().await?;
    let rows = connection.query(SELECT_ALL_OVERRIDES, &[]).await?;

    let mut overrides = BTreeMap::new();
    for row in rows {
        let key: String = row.try_get("key")?;
        let value: String = row.try_get("value")?;
        overrides.insert(key, value);
    }
    Ok(overrides)
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/settings.rs]
