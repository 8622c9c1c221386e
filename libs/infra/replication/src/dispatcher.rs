// [libs/infra/replication/src/dispatcher.rs]
/*!
 * =================================================================
 * APARATO: TABLE EVENT DISPATCHER (V6.0 - FANOUT)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: MAPEO tabla -> hook Y FANOUT DE OPERACIONES
 *
 * El despachador invoca los hooks en el mismo hilo del flujo de
 * replicación: el orden de commit del servidor se preserva de punta
 * a punta. Los hooks responden por sus propios fallos; aquí no hay
 * reintentos. Una tabla sin hook produce una advertencia por evento.
 * =================================================================
 */

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::connection::{TableWrite, WriteHandler, WriteOperation};

/// Imagen textual de fila entregada a los hooks.
pub type RowImage = BTreeMap<String, Option<String>>;

/// Contrato de un hook por tabla. Los hooks deben retornar: sus
/// fallos internos son problema suyo, el bus no reintenta.
pub trait TableHook: Send + Sync {
    fn on_insert(&self, new_row: &RowImage);
    fn on_update(&self, old_row: Option<&RowImage>, new_row: &RowImage);
    fn on_delete(&self, old_row: &RowImage);
}

/// Despachador con el mapa estático `tabla -> hook`.
pub struct EventDispatcher {
    table_hooks: HashMap<String, Arc<dyn TableHook>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { table_hooks: HashMap::new() }
    }

    /// Registra el hook de una tabla; el último registro gana.
    pub fn register_hook(mut self, table: impl Into<String>, hook: Arc<dyn TableHook>) -> Self {
        self.table_hooks.insert(table.into(), hook);
        self
    }

    /// Tablas con hook registrado (las pruebas verifican cobertura).
    pub fn registered_tables(&self) -> Vec<&str> {
        self.table_hooks.keys().map(String::as_str).collect()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteHandler for EventDispatcher {
    fn on_write(&mut self, write: TableWrite) {
        let hook = match self.table_hooks.get(&write.table) {
            Some(hook) => Arc::clone(hook),
            None => {
                warn!(
                    "❓ [EVENT_DISPATCH]: No hook registered for table '{}.{}'. Event dropped.",
                    write.namespace, write.table
                );
                return;
            }
        };

        debug!("📬 [EVENT_DISPATCH]: {} change routed.", write.table);

        match write.operation {
            WriteOperation::Insert { new_row } => hook.on_insert(&new_row),
            WriteOperation::Update { old_row, new_row } => hook.on_update(old_row.as_ref(), &new_row),
            WriteOperation::Delete { old_row } => hook.on_delete(&old_row),
        }
    }
}
// FIN DEL ARCHIVO [libs/infra/replication/src/dispatcher.rs]
