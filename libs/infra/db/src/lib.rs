// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: POSTGRES PERSISTENCE ADAPTER (V8.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ACCESO ACID AL ALMACÉN COMPARTIDO DEL CLÚSTER
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod locks;
pub mod repositories;
pub mod schema;

pub use client::PostgresClient;
pub use errors::DbError;
pub use locks::reject_locked;
