// [libs/infra/replication/src/protocol.rs]
/*!
 * =================================================================
 * APARATO: REPLICATION WIRE DECODER (V9.0 - TOTAL & PURE)
 * CLASIFICACIÓN: INFRASTRUCTURE CODEC (ESTRATO L3)
 * RESPONSABILIDAD: BYTES DEL WAL -> EVENTOS TIPADOS
 *
 * El decodificador es puro y total: ningún payload hostil provoca
 * pánico; todo mensaje desconocido o truncado degrada a 'Unsupported'
 * y el flujo continúa. Cubre el sobre de replicación ('k'/'w') y los
 * mensajes pgoutput v1: Begin, Commit, Origin, Relation, Type,
 * Insert, Update, Delete y Truncate.
 * =================================================================
 */

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, TimeZone, Utc};

/// Petición de respuesta de un KeepAlive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// El servidor exige StandbyStatusUpdate inmediato.
    Now,
    /// Sin urgencia; no se emite respuesta.
    Later,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAliveBody {
    pub wal_end: u64,
    /// Reloj del servidor en µs desde 2000-01-01T00:00:00Z.
    pub server_clock: i64,
    pub reply: ReplyMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XLogDataBody {
    pub wal_start: u64,
    pub wal_end: u64,
    pub server_clock: i64,
    pub change: PgOutputMessage,
}

/// Sobre de nivel superior del flujo COPY BOTH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationMessage {
    KeepAlive(KeepAliveBody),
    XLogData(XLogDataBody),
    Unsupported(Vec<u8>),
}

/// Columna de un mensaje Relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationColumn {
    pub flags: u8,
    pub name: String,
    pub type_oid: u32,
    pub type_modifier: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationBody {
    pub relation_id: u32,
    pub namespace: String,
    pub name: String,
    pub replica_identity: u8,
    pub columns: Vec<RelationColumn>,
}

/// Valor de una columna dentro de una TupleData.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TupleValue {
    Null,
    /// Valor TOAST no re-emitido por el servidor.
    UnchangedToast,
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TupleData {
    pub values: Vec<TupleValue>,
}

/// Mensajes pgoutput v1 ya decodificados.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PgOutputMessage {
    Begin { final_lsn: u64, commit_timestamp: i64, xid: u32 },
    Commit { flags: u8, commit_lsn: u64, end_lsn: u64, commit_timestamp: i64 },
    Origin { origin_lsn: u64, name: String },
    Relation(RelationBody),
    Type { type_oid: u32, namespace: String, name: String },
    Insert { relation_id: u32, new_tuple: TupleData },
    Update { relation_id: u32, old_tuple: Option<TupleData>, new_tuple: TupleData },
    Delete { relation_id: u32, old_tuple: TupleData },
    Truncate { relation_ids: Vec<u32>, options: u8 },
    Unsupported(Vec<u8>),
}

/// Decodifica un payload COPY BOTH completo del servidor.
pub fn decode_replication_message(payload: &[u8]) -> ReplicationMessage {
    match try_decode_envelope(payload) {
        Some(message) => message,
        None => ReplicationMessage::Unsupported(payload.to_vec()),
    }
}

fn try_decode_envelope(payload: &[u8]) -> Option<ReplicationMessage> {
    let mut cursor = Cursor::new(payload);
    match cursor.read_u8().ok()? {
        b'k' => {
            let wal_end = cursor.read_u64::<BigEndian>().ok()?;
            let server_clock = cursor.read_i64::<BigEndian>().ok()?;
            let reply = match cursor.read_u8().ok()? {
                0 => ReplyMode::Later,
                _ => ReplyMode::Now,
            };
            Some(ReplicationMessage::KeepAlive(KeepAliveBody { wal_end, server_clock, reply }))
        }
        b'w' => {
            let wal_start = cursor.read_u64::<BigEndian>().ok()?;
            let wal_end = cursor.read_u64::<BigEndian>().ok()?;
            let server_clock = cursor.read_i64::<BigEndian>().ok()?;
            let change_offset = cursor.position() as usize;
            let change = decode_pgoutput_message(&payload[change_offset..]);
            Some(ReplicationMessage::XLogData(XLogDataBody { wal_start, wal_end, server_clock, change }))
        }
        _ => None,
    }
}

/// Decodifica un mensaje pgoutput v1; total por construcción.
pub fn decode_pgoutput_message(payload: &[u8]) -> PgOutputMessage {
    match try_decode_pgoutput(payload) {
        Some(message) => message,
        None => PgOutputMessage::Unsupported(payload.to_vec()),
    }
}

fn try_decode_pgoutput(payload: &[u8]) -> Option<PgOutputMessage> {
    let mut cursor = Cursor::new(payload);
    match cursor.read_u8().ok()? {
        b'B' => Some(PgOutputMessage::Begin {
            final_lsn: cursor.read_u64::<BigEndian>().ok()?,
            commit_timestamp: cursor.read_i64::<BigEndian>().ok()?,
            xid: cursor.read_u32::<BigEndian>().ok()?,
        }),

        b'C' => Some(PgOutputMessage::Commit {
            flags: cursor.read_u8().ok()?,
            commit_lsn: cursor.read_u64::<BigEndian>().ok()?,
            end_lsn: cursor.read_u64::<BigEndian>().ok()?,
            commit_timestamp: cursor.read_i64::<BigEndian>().ok()?,
        }),

        b'O' => Some(PgOutputMessage::Origin {
            origin_lsn: cursor.read_u64::<BigEndian>().ok()?,
            name: read_cstring(&mut cursor)?,
        }),

        b'R' => {
            let relation_id = cursor.read_u32::<BigEndian>().ok()?;
            let namespace = read_cstring(&mut cursor)?;
            let name = read_cstring(&mut cursor)?;
            let replica_identity = cursor.read_u8().ok()?;
            let column_count = cursor.read_u16::<BigEndian>().ok()?;

            let mut columns = Vec::with_capacity(usize::from(column_count));
            for _ in 0..column_count {
                columns.push(RelationColumn {
                    flags: cursor.read_u8().ok()?,
                    name: read_cstring(&mut cursor)?,
                    type_oid: cursor.read_u32::<BigEndian>().ok()?,
                    type_modifier: cursor.read_i32::<BigEndian>().ok()?,
                });
            }

            Some(PgOutputMessage::Relation(RelationBody {
                relation_id,
                namespace,
                name,
                replica_identity,
                columns,
            }))
        }

        b'Y' => Some(PgOutputMessage::Type {
            type_oid: cursor.read_u32::<BigEndian>().ok()?,
            namespace: read_cstring(&mut cursor)?,
            name: read_cstring(&mut cursor)?,
        }),

        b'I' => {
            let relation_id = cursor.read_u32::<BigEndian>().ok()?;
            // Marcador 'N': tupla nueva.
            if cursor.read_u8().ok()? != b'N' {
                return None;
            }
            let new_tuple = read_tuple_data(&mut cursor)?;
            Some(PgOutputMessage::Insert { relation_id, new_tuple })
        }

        b'U' => {
            let relation_id = cursor.read_u32::<BigEndian>().ok()?;
            let mut old_tuple = None;

            // 'K' (llave de réplica) u 'O' (tupla vieja) son opcionales.
            let marker = cursor.read_u8().ok()?;
            let marker = if marker == b'K' || marker == b'O' {
                old_tuple = Some(read_tuple_data(&mut cursor)?);
                cursor.read_u8().ok()?
            } else {
                marker
            };

            if marker != b'N' {
                return None;
            }
            let new_tuple = read_tuple_data(&mut cursor)?;
            Some(PgOutputMessage::Update { relation_id, old_tuple, new_tuple })
        }

        b'D' => {
            let relation_id = cursor.read_u32::<BigEndian>().ok()?;
            let marker = cursor.read_u8().ok()?;
            if marker != b'K' && marker != b'O' {
                return None;
            }
            let old_tuple = read_tuple_data(&mut cursor)?;
            Some(PgOutputMessage::Delete { relation_id, old_tuple })
        }

        b'T' => {
            let relation_count = cursor.read_u32::<BigEndian>().ok()?;
            let options = cursor.read_u8().ok()?;
            let mut relation_ids = Vec::with_capacity(relation_count as usize);
            for _ in 0..relation_count {
                relation_ids.push(cursor.read_u32::<BigEndian>().ok()?);
            }
            Some(PgOutputMessage::Truncate { relation_ids, options })
        }

        _ => None,
    }
}

fn read_tuple_data(cursor: &mut Cursor<&[u8]>) -> Option<TupleData> {
    let column_count = cursor.read_u16::<BigEndian>().ok()?;
    let mut values = Vec::with_capacity(usize::from(column_count));

    for _ in 0..column_count {
        match cursor.read_u8().ok()? {
            b'n' => values.push(TupleValue::Null),
            b'u' => values.push(TupleValue::UnchangedToast),
            b't' => {
                let length = cursor.read_u32::<BigEndian>().ok()? as usize;
                let start = cursor.position() as usize;
                let buffer = *cursor.get_ref();
                let end = start.checked_add(length)?;
                if end > buffer.len() {
                    return None;
                }
                let text = String::from_utf8_lossy(&buffer[start..end]).into_owned();
                cursor.set_position(end as u64);
                values.push(TupleValue::Text(text));
            }
            _ => return None,
        }
    }

    Some(TupleData { values })
}

fn read_cstring(cursor: &mut Cursor<&[u8]>) -> Option<String> {
    let buffer = *cursor.get_ref();
    let start = cursor.position() as usize;
    let terminator = buffer[start..].iter().position(|byte| *byte == 0)?;
    let text = String::from_utf8_lossy(&buffer[start..start + terminator]).into_owned();
    cursor.set_position((start + terminator + 1) as u64);
    Some(text)
}

// --- EMISIÓN: StandbyStatusUpdate ('r') ---

/// Codifica el StandbyStatusUpdate de respuesta a un KeepAlive.
///
/// Contrato del flujo: las tres posiciones (write/flush/apply) viajan con el
/// mismo valor `wal_position`; `clock_microseconds` es µs desde la
/// época PostgreSQL (2000-01-01T00:00:00Z).
pub fn encode_standby_status_update(
    wal_position: u64,
    clock_microseconds: i64,
    request_reply: bool,
) -> Vec<u8> {
    let mut frame = Vec::with_capacity(1 + 8 * 3 + 8 + 1);
    frame.push(b'r');
    frame.write_u64::<BigEndian>(wal_position).expect("vec write is infallible");
    frame.write_u64::<BigEndian>(wal_position).expect("vec write is infallible");
    frame.write_u64::<BigEndian>(wal_position).expect("vec write is infallible");
    frame.write_i64::<BigEndian>(clock_microseconds).expect("vec write is infallible");
    frame.push(u8::from(request_reply));
    frame
}

/// Microsegundos transcurridos desde la época PostgreSQL (2000-01-01).
pub fn postgres_epoch_microseconds(now: DateTime<Utc>) -> i64 {
    let postgres_epoch = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    (now - postgres_epoch).num_microseconds().unwrap_or(i64::MAX)
}
// FIN DEL ARCHIVO [libs/infra/replication/src/protocol.rs]
