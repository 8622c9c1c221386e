// [libs/infra/replication/src/lib.rs]
/*!
 * =================================================================
 * APARATO: LOGICAL REPLICATION EVENT BUS (V6.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CONSUMO DEL WAL Y DESPACHO TIPADO POR TABLA
 *
 * Tres aparatos componen el bus:
 * - protocol: decodificador puro y total del flujo de replicación.
 * - wire + connection: sesión replication=database y máquina de
 *   estados publication -> slot -> streaming con KeepAlives.
 * - dispatcher: mapeo tabla -> hook con advertencias por tabla huérfana.
 * =================================================================
 */

pub mod connection;
pub mod dispatcher;
pub mod errors;
pub mod protocol;
pub mod wire;

pub use connection::{ReplicationConfig, ReplicationConnection, ReplicationStep, TableWrite, WriteHandler, WriteOperation};
pub use dispatcher::{EventDispatcher, RowImage, TableHook};
pub use errors::ReplicationError;
pub use protocol::{
    decode_replication_message, encode_standby_status_update, postgres_epoch_microseconds,
    KeepAliveBody, PgOutputMessage, RelationBody, RelationColumn, ReplicationMessage, ReplyMode,
    TupleData, TupleValue, XLogDataBody,
};
pub use wire::{ReplicationWireSession, WireConfig};
