// [libs/infra/replication/src/connection.rs]
/*!
 * =================================================================
 * APARATO: REPLICATION CONNECTION ENGINE (V9.0 - STATE MACHINE)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: publication -> slot -> streaming Y KEEPALIVES
 *
 * Máquina de estados, gobernada por respuestas de consulta:
 *
 *   connect ─▶ check_publication
 *      ├─existe(1) ─▶ check_replication_slot
 *      │                ├─existe(1) ─▶ start_replication_slot ─▶ streaming
 *      │                └─existe(0) ─▶ create_replication_slot ─▶ start…
 *      └─existe(0) ─▶ create_publication ─▶ check_replication_slot
 *
 * Los writes se procesan de a UNO en orden estricto del WAL: sin
 * reordenamiento ni batching a través del callback on_write. Como el
 * slot es durable, el WAL sin confirmar se re-entrega al reconectar.
 * =================================================================
 */

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::errors::ReplicationError;
use crate::protocol::{
    decode_replication_message, encode_standby_status_update, postgres_epoch_microseconds,
    PgOutputMessage, RelationBody, ReplicationMessage, ReplyMode, TupleData, TupleValue,
};
use crate::wire::{CopyEvent, ReplicationWireSession, WireConfig};

/// Paso vigente de la máquina de estados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationStep {
    Disconnected,
    CheckPublication,
    CreatePublication,
    CheckReplicationSlot,
    CreateReplicationSlot,
    StartReplicationSlot,
    Streaming,
}

/// Configuración completa del consumidor de replicación.
#[derive(Debug, Clone)]
pub struct ReplicationConfig {
    pub schema: String,
    pub publication_name: String,
    pub replication_slot_name: String,
    pub output_plugin: String,
    pub proto_version: u8,
    /// Tablas suscritas, en el orden declarado de la publicación.
    pub table_subscriptions: Vec<String>,
    pub wire: WireConfig,
}

impl ReplicationConfig {
    /// Lista `schema.tabla` separada por comas para CREATE PUBLICATION.
    fn qualified_table_list(&self) -> String {
        self.table_subscriptions
            .iter()
            .map(|table| format!("{}.{}", self.schema, table))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Imagen textual de una fila decodificada: columna -> valor.
pub type DecodedRow = BTreeMap<String, Option<String>>;

/// Operación de datos decodificada, lista para el despachador.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOperation {
    Insert { new_row: DecodedRow },
    Update { old_row: Option<DecodedRow>, new_row: DecodedRow },
    Delete { old_row: DecodedRow },
}

/// Write decodificado con su tabla de origen resuelta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableWrite {
    pub namespace: String,
    pub table: String,
    pub operation: WriteOperation,
}

/// Receptor de writes; el despachador de tablas implementa este contrato.
pub trait WriteHandler: Send {
    fn on_write(&mut self, write: TableWrite);
}

pub struct ReplicationConnection<H: WriteHandler> {
    config: ReplicationConfig,
    step: ReplicationStep,
    /// Metadatos de relaciones anunciados por el servidor (oid -> forma).
    relations: HashMap<u32, RelationBody>,
    handler: H,
}

impl<H: WriteHandler> ReplicationConnection<H> {
    pub fn new(config: ReplicationConfig, handler: H) -> Self {
        Self { config, step: ReplicationStep::Disconnected, relations: HashMap::new(), handler }
    }

    pub fn current_step(&self) -> ReplicationStep {
        self.step
    }

    /// Conduce la máquina de estados hasta el streaming y procesa el
    /// flujo hasta la desconexión. El supervisor decide el reintento.
    #[instrument(skip(self), fields(slot = %self.config.replication_slot_name))]
    pub async fn run(&mut self) -> Result<(), ReplicationError> {
        let mut session = ReplicationWireSession::connect(&self.config.wire).await?;

        // 1. PUBLICACIÓN
        self.step = ReplicationStep::CheckPublication;
        let publication_exists = self.query_exists(&mut session, &format!(
            "SELECT 1 FROM pg_publication WHERE pubname = '{}'",
            self.config.publication_name
        )).await?;

        if !publication_exists {
            self.step = ReplicationStep::CreatePublication;
            let create_publication = format!(
                "CREATE PUBLICATION {} FOR TABLE {}",
                self.config.publication_name,
                self.config.qualified_table_list()
            );
            session.simple_query(&create_publication).await?;
            info!("📣 [REPL_SETUP]: Publication '{}' created.", self.config.publication_name);
        }

        // 2. SLOT DURABLE
        self.step = ReplicationStep::CheckReplicationSlot;
        let slot_exists = self.query_exists(&mut session, &format!(
            "SELECT 1 FROM pg_replication_slots WHERE slot_name = '{}'",
            self.config.replication_slot_name
        )).await?;

        if !slot_exists {
            self.step = ReplicationStep::CreateReplicationSlot;
            let create_slot = format!(
                "CREATE_REPLICATION_SLOT \"{}\" LOGICAL {} NOEXPORT_SNAPSHOT",
                self.config.replication_slot_name, self.config.output_plugin
            );
            session.simple_query(&create_slot).await?;
            info!("🧷 [REPL_SETUP]: Replication slot '{}' created.", self.config.replication_slot_name);
        }

        // 3. STREAMING
        self.step = ReplicationStep::StartReplicationSlot;
        let start_replication = format!(
            "START_REPLICATION SLOT \"{}\" LOGICAL 0/0 (proto_version '{}', publication_names '{}')",
            self.config.replication_slot_name, self.config.proto_version, self.config.publication_name
        );
        session.start_copy_both(&start_replication).await?;

        self.step = ReplicationStep::Streaming;
        info!("🌊 [REPL_STREAMING]: WAL stream online ({} tables).", self.config.table_subscriptions.len());

        let stream_outcome = self.pump_stream(&mut session).await;
        self.step = ReplicationStep::Disconnected;
        stream_outcome
    }

    /// Bucle de streaming: un payload a la vez, en orden de llegada.
    async fn pump_stream(&mut self, session: &mut ReplicationWireSession) -> Result<(), ReplicationError> {
        loop {
            let payload = match session.next_copy_payload().await? {
                CopyEvent::Data(payload) => payload,
                CopyEvent::Done => return Err(ReplicationError::Disconnected),
            };

            match decode_replication_message(&payload) {
                ReplicationMessage::KeepAlive(keep_alive) => {
                    if keep_alive.reply == ReplyMode::Now {
                        // Contrato: write/flush/apply = wal_end + 1, reloj
                        // en µs desde la época PostgreSQL.
                        let status_update = encode_standby_status_update(
                            keep_alive.wal_end + 1,
                            postgres_epoch_microseconds(Utc::now()),
                            true,
                        );
                        session.send_copy_data(&status_update).await?;
                        debug!("💓 [REPL_KEEPALIVE]: Acknowledged wal_end {}.", keep_alive.wal_end);
                    }
                    // reply=later: sin respuesta, el flujo continúa.
                }

                ReplicationMessage::XLogData(xlog) => self.process_change(xlog.change),

                ReplicationMessage::Unsupported(raw) => {
                    warn!("❓ [REPL_DECODER]: Unsupported envelope ({} bytes). Ignored.", raw.len());
                }
            }
        }
    }

    /// Procesa un mensaje pgoutput: estado para Relation, despacho para
    /// los mensajes de datos, silencio para el resto.
    fn process_change(&mut self, change: PgOutputMessage) {
        match change {
            PgOutputMessage::Relation(relation) => {
                debug!(
                    "🗺️  [REPL_RELATION]: {}.{} ({} columns) registered.",
                    relation.namespace,
                    relation.name,
                    relation.columns.len()
                );
                self.relations.insert(relation.relation_id, relation);
            }

            PgOutputMessage::Insert { relation_id, new_tuple } => {
                if let Some(write) = self.assemble_write(relation_id, |relation| WriteOperation::Insert {
                    new_row: zip_tuple(relation, &new_tuple),
                }) {
                    self.handler.on_write(write);
                }
            }

            PgOutputMessage::Update { relation_id, old_tuple, new_tuple } => {
                if let Some(write) = self.assemble_write(relation_id, |relation| WriteOperation::Update {
                    old_row: old_tuple.as_ref().map(|tuple| zip_tuple(relation, tuple)),
                    new_row: zip_tuple(relation, &new_tuple),
                }) {
                    self.handler.on_write(write);
                }
            }

            PgOutputMessage::Delete { relation_id, old_tuple } => {
                if let Some(write) = self.assemble_write(relation_id, |relation| WriteOperation::Delete {
                    old_row: zip_tuple(relation, &old_tuple),
                }) {
                    self.handler.on_write(write);
                }
            }

            // Semántica de solo-estado: el bus reenvía únicamente datos.
            PgOutputMessage::Begin { .. }
            | PgOutputMessage::Commit { .. }
            | PgOutputMessage::Origin { .. }
            | PgOutputMessage::Type { .. }
            | PgOutputMessage::Truncate { .. } => {}

            PgOutputMessage::Unsupported(raw) => {
                warn!("❓ [REPL_DECODER]: Unsupported pgoutput message ({} bytes). Ignored.", raw.len());
            }
        }
    }

    fn assemble_write(
        &self,
        relation_id: u32,
        build_operation: impl FnOnce(&RelationBody) -> WriteOperation,
    ) -> Option<TableWrite> {
        match self.relations.get(&relation_id) {
            Some(relation) => Some(TableWrite {
                namespace: relation.namespace.clone(),
                table: relation.name.clone(),
                operation: build_operation(relation),
            }),
            None => {
                warn!("❓ [REPL_RELATION]: Data message for unknown relation oid {}.", relation_id);
                None
            }
        }
    }

    async fn query_exists(
        &self,
        session: &mut ReplicationWireSession,
        sql: &str,
    ) -> Result<bool, ReplicationError> {
        let rows = session.simple_query(sql).await?;
        Ok(!rows.is_empty())
    }
}

/// Alinea la TupleData con las columnas anunciadas por Relation.
fn zip_tuple(relation: &RelationBody, tuple: &TupleData) -> DecodedRow {
    relation
        .columns
        .iter()
        .zip(tuple.values.iter())
        .map(|(column, value)| {
            let rendered = match value {
                TupleValue::Null | TupleValue::UnchangedToast => None,
                TupleValue::Text(text) => Some(text.clone()),
            };
            (column.name.clone(), rendered)
        })
        .collect()
}
// FIN DEL ARCHIVO [libs/infra/replication/src/connection.rs]
