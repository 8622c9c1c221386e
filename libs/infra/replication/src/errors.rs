// [libs/infra/replication/src/errors.rs]
/*!
 * =================================================================
 * APARATO: REPLICATION ERROR CATALOG (V4.0)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: FALLOS DE SESIÓN, PROTOCOLO Y SERVIDOR
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplicationError {
    /// Fallo de E/S del socket de replicación.
    #[error("[L3_REPL_NET_FAULT]: SOCKET_SEVERED -> {0}")]
    Io(#[from] std::io::Error),

    /// ErrorResponse emitido por el servidor PostgreSQL.
    #[error("[L3_REPL_SERVER_FAULT]: {code} -> {message}")]
    Server { code: String, message: String },

    /// El flujo violó el protocolo esperado (mensaje fuera de secuencia).
    #[error("[L3_REPL_PROTOCOL_FAULT]: {0}")]
    Protocol(String),

    /// La autenticación fue rechazada o el mecanismo no está soportado.
    #[error("[L3_REPL_AUTH_FAULT]: {0}")]
    Authentication(String),

    /// El servidor cerró el flujo; el supervisor debe reconectar.
    #[error("[L3_REPL_FAULT]: STREAM_DISCONNECTED")]
    Disconnected,
}
// FIN DEL ARCHIVO [libs/infra/replication/src/errors.rs]
