// [tests/mirror/libs/infra/replication/decoder_wire.test.rs]
/**
 * =================================================================
 * APARATO: REPLICATION DECODER CERTIFIER (V4.0 - WIRE VECTORS)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L3)
 * RESPONSABILIDAD: DECODIFICACIÓN TOTAL DE VECTORES DE BYTES
 * =================================================================
 */

use cerberus_infra_replication::{
    decode_replication_message, encode_standby_status_update, postgres_epoch_microseconds,
    PgOutputMessage, ReplicationMessage, ReplyMode, TupleValue,
};
use chrono::{TimeZone, Utc};

fn push_u16(frame: &mut Vec<u8>, value: u16) {
    frame.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(frame: &mut Vec<u8>, value: u32) {
    frame.extend_from_slice(&value.to_be_bytes());
}

fn push_u64(frame: &mut Vec<u8>, value: u64) {
    frame.extend_from_slice(&value.to_be_bytes());
}

fn push_i64(frame: &mut Vec<u8>, value: i64) {
    frame.extend_from_slice(&value.to_be_bytes());
}

fn push_cstring(frame: &mut Vec<u8>, text: &str) {
    frame.extend_from_slice(text.as_bytes());
    frame.push(0);
}

/// Sobre XLogData ('w') alrededor de un mensaje pgoutput.
fn xlog_envelope(change: &[u8]) -> Vec<u8> {
    let mut frame = vec![b'w'];
    push_u64(&mut frame, 100);
    push_u64(&mut frame, 200);
    push_i64(&mut frame, 9_999);
    frame.extend_from_slice(change);
    frame
}

/// Mensaje Relation de una tabla 'public.resources' (id, name).
fn relation_change(relation_id: u32) -> Vec<u8> {
    let mut change = vec![b'R'];
    push_u32(&mut change, relation_id);
    push_cstring(&mut change, "public");
    push_cstring(&mut change, "resources");
    change.push(b'd'); // replica identity default
    push_u16(&mut change, 2);
    for (column_name, type_oid) in [("id", 2950u32), ("name", 25u32)] {
        change.push(0); // flags
        push_cstring(&mut change, column_name);
        push_u32(&mut change, type_oid);
        change.extend_from_slice(&(-1i32).to_be_bytes());
    }
    change
}

#[test]
fn certify_keepalive_decoding_both_reply_modes() {
    let mut frame = vec![b'k'];
    push_u64(&mut frame, 0x0000_0001_0000_00AB);
    push_i64(&mut frame, 777_000);
    frame.push(1);

    match decode_replication_message(&frame) {
        ReplicationMessage::KeepAlive(body) => {
            assert_eq!(body.wal_end, 0x0000_0001_0000_00AB);
            assert_eq!(body.server_clock, 777_000);
            assert_eq!(body.reply, ReplyMode::Now);
        }
        other => panic!("expected KeepAlive, got {other:?}"),
    }

    *frame.last_mut().unwrap() = 0;
    match decode_replication_message(&frame) {
        ReplicationMessage::KeepAlive(body) => assert_eq!(body.reply, ReplyMode::Later),
        other => panic!("expected KeepAlive, got {other:?}"),
    }
}

#[test]
fn certify_relation_then_insert_decoding() {
    // 1. Relation: anuncia la forma de la tabla.
    let relation_frame = xlog_envelope(&relation_change(4242));
    match decode_replication_message(&relation_frame) {
        ReplicationMessage::XLogData(xlog) => {
            assert_eq!(xlog.wal_start, 100);
            assert_eq!(xlog.wal_end, 200);
            match xlog.change {
                PgOutputMessage::Relation(relation) => {
                    assert_eq!(relation.relation_id, 4242);
                    assert_eq!(relation.namespace, "public");
                    assert_eq!(relation.name, "resources");
                    assert_eq!(relation.columns.len(), 2);
                    assert_eq!(relation.columns[0].name, "id");
                    assert_eq!(relation.columns[1].name, "name");
                }
                other => panic!("expected Relation, got {other:?}"),
            }
        }
        other => panic!("expected XLogData, got {other:?}"),
    }

    // 2. Insert: tupla nueva con un NULL explícito.
    let mut insert_change = vec![b'I'];
    push_u32(&mut insert_change, 4242);
    insert_change.push(b'N');
    push_u16(&mut insert_change, 2);
    insert_change.push(b't');
    push_u32(&mut insert_change, 2);
    insert_change.extend_from_slice(b"R1");
    insert_change.push(b'n');

    match decode_replication_message(&xlog_envelope(&insert_change)) {
        ReplicationMessage::XLogData(xlog) => match xlog.change {
            PgOutputMessage::Insert { relation_id, new_tuple } => {
                assert_eq!(relation_id, 4242);
                assert_eq!(new_tuple.values.len(), 2);
                assert_eq!(new_tuple.values[0], TupleValue::Text("R1".to_string()));
                assert_eq!(new_tuple.values[1], TupleValue::Null);
            }
            other => panic!("expected Insert, got {other:?}"),
        },
        other => panic!("expected XLogData, got {other:?}"),
    }
}

#[test]
fn certify_update_with_old_tuple_and_delete_decoding() {
    // Update con imagen vieja por llave ('K').
    let mut update_change = vec![b'U'];
    push_u32(&mut update_change, 7);
    update_change.push(b'K');
    push_u16(&mut update_change, 1);
    update_change.push(b't');
    push_u32(&mut update_change, 3);
    update_change.extend_from_slice(b"old");
    update_change.push(b'N');
    push_u16(&mut update_change, 1);
    update_change.push(b't');
    push_u32(&mut update_change, 3);
    update_change.extend_from_slice(b"new");

    match decode_replication_message(&xlog_envelope(&update_change)) {
        ReplicationMessage::XLogData(xlog) => match xlog.change {
            PgOutputMessage::Update { relation_id, old_tuple, new_tuple } => {
                assert_eq!(relation_id, 7);
                let old_tuple = old_tuple.expect("old tuple announced via K marker");
                assert_eq!(old_tuple.values[0], TupleValue::Text("old".to_string()));
                assert_eq!(new_tuple.values[0], TupleValue::Text("new".to_string()));
            }
            other => panic!("expected Update, got {other:?}"),
        },
        other => panic!("expected XLogData, got {other:?}"),
    }

    // Delete con imagen vieja completa ('O').
    let mut delete_change = vec![b'D'];
    push_u32(&mut delete_change, 7);
    delete_change.push(b'O');
    push_u16(&mut delete_change, 1);
    delete_change.push(b't');
    push_u32(&mut delete_change, 4);
    delete_change.extend_from_slice(b"gone");

    match decode_replication_message(&xlog_envelope(&delete_change)) {
        ReplicationMessage::XLogData(xlog) => match xlog.change {
            PgOutputMessage::Delete { relation_id, old_tuple } => {
                assert_eq!(relation_id, 7);
                assert_eq!(old_tuple.values[0], TupleValue::Text("gone".to_string()));
            }
            other => panic!("expected Delete, got {other:?}"),
        },
        other => panic!("expected XLogData, got {other:?}"),
    }
}

#[test]
fn certify_decoder_is_total_over_hostile_input() {
    // Sobre desconocido a nivel superior.
    assert!(matches!(
        decode_replication_message(&[b'z', 1, 2, 3]),
        ReplicationMessage::Unsupported(_)
    ));

    // Sobre vacío.
    assert!(matches!(decode_replication_message(&[]), ReplicationMessage::Unsupported(_)));

    // KeepAlive truncado.
    assert!(matches!(
        decode_replication_message(&[b'k', 0, 0]),
        ReplicationMessage::Unsupported(_)
    ));

    // pgoutput desconocido dentro de un sobre válido degrada solo el cambio.
    let unknown_change = xlog_envelope(&[b'Q', 9, 9, 9]);
    match decode_replication_message(&unknown_change) {
        ReplicationMessage::XLogData(xlog) => {
            assert!(matches!(xlog.change, PgOutputMessage::Unsupported(_)));
        }
        other => panic!("expected XLogData, got {other:?}"),
    }

    // Tupla con longitud mentirosa: total, sin pánico.
    let mut lying_insert = vec![b'I'];
    push_u32(&mut lying_insert, 1);
    lying_insert.push(b'N');
    push_u16(&mut lying_insert, 1);
    lying_insert.push(b't');
    push_u32(&mut lying_insert, 9_999);
    lying_insert.extend_from_slice(b"short");
    match decode_replication_message(&xlog_envelope(&lying_insert)) {
        ReplicationMessage::XLogData(xlog) => {
            assert!(matches!(xlog.change, PgOutputMessage::Unsupported(_)));
        }
        other => panic!("expected XLogData, got {other:?}"),
    }
}

#[test]
fn certify_standby_status_update_contract() {
    // Propiedad: las tres posiciones viajan con wal_end + 1 y el reloj
    // se mide en µs desde 2000-01-01T00:00:00Z.
    let wal_end: u64 = 5_000;
    let clock = postgres_epoch_microseconds(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 1).unwrap());
    assert_eq!(clock, 1_000_000);

    let frame = encode_standby_status_update(wal_end + 1, clock, true);

    assert_eq!(frame[0], b'r');
    assert_eq!(frame.len(), 1 + 8 + 8 + 8 + 8 + 1);

    let write_position = u64::from_be_bytes(frame[1..9].try_into().unwrap());
    let flush_position = u64::from_be_bytes(frame[9..17].try_into().unwrap());
    let apply_position = u64::from_be_bytes(frame[17..25].try_into().unwrap());
    let encoded_clock = i64::from_be_bytes(frame[25..33].try_into().unwrap());

    assert_eq!(write_position, wal_end + 1);
    assert_eq!(flush_position, wal_end + 1);
    assert_eq!(apply_position, wal_end + 1);
    assert_eq!(encoded_clock, 1_000_000);
    assert_eq!(frame[33], 1);
}
// FIN DEL ARCHIVO [tests/mirror/libs/infra/replication/decoder_wire.test.rs]
