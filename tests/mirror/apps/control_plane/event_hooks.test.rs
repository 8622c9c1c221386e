// [tests/mirror/apps/control_plane/event_hooks.test.rs]
/**
 * =================================================================
 * APARATO: EVENT HOOKS CERTIFIER (V3.0 - WAL -> BUS)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L4-APP)
 * RESPONSABILIDAD: HOOKS POR TABLA Y SEÑAL DE REVOCACIÓN DE TOKENS
 * =================================================================
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use cerberus_control_plane::services::event_bus::{ControlPlaneEvent, EventBus};
use cerberus_control_plane::services::hooks::build_event_dispatcher;
use cerberus_infra_replication::{RowImage, TableWrite, WriteHandler, WriteOperation};
use uuid::Uuid;

fn row(pairs: &[(&str, Option<&str>)]) -> RowImage {
    pairs
        .iter()
        .map(|(column, value)| (column.to_string(), value.map(str::to_string)))
        .collect::<BTreeMap<_, _>>()
}

fn write_for(table: &str, operation: WriteOperation) -> TableWrite {
    TableWrite { namespace: "public".to_string(), table: table.to_string(), operation }
}

fn subscriptions() -> Vec<String> {
    ["accounts", "tokens", "gateways"].iter().map(|table| table.to_string()).collect()
}

#[tokio::test]
async fn certify_generic_insert_becomes_an_entity_change_signal() {
    let event_bus = Arc::new(EventBus::new());
    let mut receiver = event_bus.subscribe();
    let mut dispatcher = build_event_dispatcher(&subscriptions(), Arc::clone(&event_bus));

    let account_id = Uuid::new_v4();
    let gateway_id = Uuid::new_v4();
    dispatcher.on_write(write_for(
        "gateways",
        WriteOperation::Insert {
            new_row: row(&[
                ("id", Some(&gateway_id.to_string())),
                ("account_id", Some(&account_id.to_string())),
            ]),
        },
    ));

    match receiver.recv().await.expect("signal delivered") {
        ControlPlaneEvent::EntityChanged { table, operation, entity_id, account_id: signal_account } => {
            assert_eq!(table, "gateways");
            assert_eq!(operation, "insert");
            assert_eq!(entity_id, Some(gateway_id));
            assert_eq!(signal_account, Some(account_id));
        }
        other => panic!("expected EntityChanged, got {other:?}"),
    }
}

#[tokio::test]
async fn certify_token_delete_emits_the_revocation_signal() {
    let event_bus = Arc::new(EventBus::new());
    let mut receiver = event_bus.subscribe();
    let mut dispatcher = build_event_dispatcher(&subscriptions(), Arc::clone(&event_bus));

    let token_id = Uuid::new_v4();
    dispatcher.on_write(write_for(
        "tokens",
        WriteOperation::Delete { old_row: row(&[("id", Some(&token_id.to_string()))]) },
    ));

    match receiver.recv().await.expect("signal delivered") {
        ControlPlaneEvent::TokenRevoked { token_id: revoked } => assert_eq!(revoked, token_id),
        other => panic!("expected TokenRevoked, got {other:?}"),
    }
}

#[tokio::test]
async fn certify_token_soft_delete_also_revokes() {
    let event_bus = Arc::new(EventBus::new());
    let mut receiver = event_bus.subscribe();
    let mut dispatcher = build_event_dispatcher(&subscriptions(), Arc::clone(&event_bus));

    let token_id = Uuid::new_v4();
    dispatcher.on_write(write_for(
        "tokens",
        WriteOperation::Update {
            old_row: None,
            new_row: row(&[
                ("id", Some(&token_id.to_string())),
                ("deleted_at", Some("2026-03-01 10:00:00+00")),
            ]),
        },
    ));

    match receiver.recv().await.expect("signal delivered") {
        ControlPlaneEvent::TokenRevoked { token_id: revoked } => assert_eq!(revoked, token_id),
        other => panic!("expected TokenRevoked, got {other:?}"),
    }

    // Un update vivo (sin deleted_at) sigue siendo un cambio de entidad.
    dispatcher.on_write(write_for(
        "tokens",
        WriteOperation::Update {
            old_row: None,
            new_row: row(&[("id", Some(&token_id.to_string())), ("deleted_at", None)]),
        },
    ));

    match receiver.recv().await.expect("signal delivered") {
        ControlPlaneEvent::EntityChanged { table, operation, .. } => {
            assert_eq!(table, "tokens");
            assert_eq!(operation, "update");
        }
        other => panic!("expected EntityChanged, got {other:?}"),
    }
}
// FIN DEL ARCHIVO [tests/mirror/apps/control_plane/event_hooks.test.rs]
