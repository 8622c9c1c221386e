// [apps/control-plane/src/services/hooks.rs]
/*!
 * =================================================================
 * APARATO: REPLICATION TABLE HOOKS (V7.0 - EVENT FANOUT)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: PUENTE WAL -> BUS DE EVENTOS POR TABLA
 *
 * Cada tabla suscrita recibe un hook. El hook genérico difunde el
 * cambio de entidad por el bus; el hook de tokens además emite la
 * señal de revocación cuando un token muere (DELETE o soft-delete),
 * para que las sesiones que lo portan se desconecten.
 * =================================================================
 */

use std::sync::Arc;

use uuid::Uuid;

use cerberus_infra_replication::{EventDispatcher, RowImage, TableHook};

use crate::services::event_bus::EventBus;

/// Hook genérico: difunde el cambio con id y cuenta de la fila.
pub struct BroadcastHook {
    table: String,
    event_bus: Arc<EventBus>,
}

impl BroadcastHook {
    pub fn new(table: impl Into<String>, event_bus: Arc<EventBus>) -> Self {
        Self { table: table.into(), event_bus }
    }
}

impl TableHook for BroadcastHook {
    fn on_insert(&self, new_row: &RowImage) {
        self.event_bus.broadcast_entity_change(
            &self.table,
            "insert",
            extract_uuid(new_row, "id"),
            extract_uuid(new_row, "account_id"),
        );
    }

    fn on_update(&self, _old_row: Option<&RowImage>, new_row: &RowImage) {
        self.event_bus.broadcast_entity_change(
            &self.table,
            "update",
            extract_uuid(new_row, "id"),
            extract_uuid(new_row, "account_id"),
        );
    }

    fn on_delete(&self, old_row: &RowImage) {
        self.event_bus.broadcast_entity_change(
            &self.table,
            "delete",
            extract_uuid(old_row, "id"),
            extract_uuid(old_row, "account_id"),
        );
    }
}

/// Hook de tokens: la muerte de un token (física o suave) revoca las
/// sesiones que lo portan.
pub struct TokenLifecycleHook {
    event_bus: Arc<EventBus>,
}

impl TokenLifecycleHook {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self { event_bus }
    }
}

impl TableHook for TokenLifecycleHook {
    fn on_insert(&self, new_row: &RowImage) {
        self.event_bus.broadcast_entity_change(
            "tokens",
            "insert",
            extract_uuid(new_row, "id"),
            extract_uuid(new_row, "account_id"),
        );
    }

    fn on_update(&self, _old_row: Option<&RowImage>, new_row: &RowImage) {
        let soft_deleted = new_row
            .get("deleted_at")
            .map(|value| value.is_some())
            .unwrap_or(false);

        if soft_deleted {
            if let Some(token_id) = extract_uuid(new_row, "id") {
                self.event_bus.broadcast_token_revoked(token_id);
                return;
            }
        }

        self.event_bus.broadcast_entity_change(
            "tokens",
            "update",
            extract_uuid(new_row, "id"),
            extract_uuid(new_row, "account_id"),
        );
    }

    fn on_delete(&self, old_row: &RowImage) {
        if let Some(token_id) = extract_uuid(old_row, "id") {
            self.event_bus.broadcast_token_revoked(token_id);
        }
    }
}

/// Arma el despachador con un hook por tabla suscrita.
pub fn build_event_dispatcher(
    table_subscriptions: &[String],
    event_bus: Arc<EventBus>,
) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();

    for table in table_subscriptions {
        let hook: Arc<dyn TableHook> = if table == "tokens" {
            Arc::new(TokenLifecycleHook::new(Arc::clone(&event_bus)))
        } else {
            Arc::new(BroadcastHook::new(table.clone(), Arc::clone(&event_bus)))
        };
        dispatcher = dispatcher.register_hook(table.clone(), hook);
    }

    dispatcher
}

fn extract_uuid(row: &RowImage, column: &str) -> Option<Uuid> {
    row.get(column)
        .and_then(|value| value.as_deref())
        .and_then(|raw| raw.parse().ok())
}
// FIN DEL ARCHIVO [apps/control-plane/src/services/hooks.rs]
