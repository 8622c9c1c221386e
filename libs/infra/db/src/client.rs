// [libs/infra/db/src/client.rs]
/*!
 * =================================================================
 * APARATO: POSTGRES CONNECTION CLIENT (V7.0 - POOLED)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DEL POOL Y PRÉSTAMO DE CONEXIONES
 *
 * La base de datos es el ÚNICO almacén mutable compartido del clúster:
 * cada corrida de sincronización es una transacción y los candados
 * advisory por fila arbitran los reclamos entre nodos.
 * =================================================================
 */

use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::NoTls;
use tracing::info;

use crate::errors::DbError;

/// Conexiones máximas del pool por nodo.
const POOL_MAX_CONNECTIONS: usize = 16;

#[derive(Clone)]
pub struct PostgresClient {
    connection_pool: Pool,
}

impl PostgresClient {
    /// Establece el pool contra la URL de conexión estándar de libpq.
    pub fn connect(database_connection_url: &str) -> Result<Self, DbError> {
        if database_connection_url.is_empty() {
            return Err(DbError::ConnectionError("DATABASE_URL undefined".into()));
        }

        let postgres_config: tokio_postgres::Config = database_connection_url
            .parse()
            .map_err(|parse_fault| DbError::ConnectionError(format!("MALFORMED_URL: {parse_fault}")))?;

        let pool_manager = Manager::from_config(
            postgres_config,
            NoTls,
            ManagerConfig { recycling_method: RecyclingMethod::Fast },
        );

        let connection_pool = Pool::builder(pool_manager)
            .max_size(POOL_MAX_CONNECTIONS)
            .build()
            .map_err(|build_fault| DbError::ConnectionError(format!("POOL_IGNITION_FAILURE: {build_fault}")))?;

        info!("🔌 [DATABASE]: Connection pool armed ({} slots).", POOL_MAX_CONNECTIONS);

        Ok(Self { connection_pool })
    }

    /// Presta una conexión del pool; el préstamo retorna al soltarse.
    pub async fn get_connection(&self) -> Result<Object, DbError> {
        self.connection_pool.get().await.map_err(DbError::from)
    }
}
// FIN DEL ARCHIVO [libs/infra/db/src/client.rs]
