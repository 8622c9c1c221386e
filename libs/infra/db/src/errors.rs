// [libs/infra/db/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG (V6.0)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Fallo de enlace físico o de configuración del pool.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// El pool se agotó o rechazó la adquisición de una conexión.
    #[error("[L3_DB_POOL_FAULT]: CONNECTION_ALLOCATION_DENIED -> {0}")]
    PoolError(String),

    /// Error de sintaxis o ejecución devuelto por el motor PostgreSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] tokio_postgres::Error),

    /// Fallo en la transformación de tipos entre SQL y el dominio.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// El registro solicitado no existe en las tablas activas.
    #[error("[L3_DB_FAULT]: IDENTIFIER_NOT_FOUND")]
    NotFound,

    /// Otro nodo posee el candado advisory de la fila disputada.
    #[error("[L3_DB_CLAIM_FAULT]: ROW_CLAIMED_BY_PEER")]
    ClaimConflict,
}

impl From<deadpool_postgres::PoolError> for DbError {
    fn from(pool_fault: deadpool_postgres::PoolError) -> Self {
        DbError::PoolError(pool_fault.to_string())
    }
}
// FIN DEL ARCHIVO [libs/infra/db/src/errors.rs]
