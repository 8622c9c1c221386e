// [apps/control-plane/src/services/event_bus.rs]
/*!
 * =================================================================
 * APARATO: CONTROL PLANE EVENT BUS (V7.0 - BROADCASTER)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: DIFUSIÓN IN-PROCESO DE SEÑALES DE ENTIDAD
 *
 * Los hooks del bus de replicación publican aquí; los componentes
 * interesados (presencia, empujadores de sesión) se suscriben sin
 * sondear la base de datos. La pérdida de un suscriptor lento no
 * bloquea la emisión (canal broadcast con capacidad fija).
 * =================================================================
 */

use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

/// Capacidad del canal de difusión; absorbe ráfagas de replicación
/// sin disparar errores de lagging en suscriptores sanos.
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Señales de cambio de entidad propagadas a las sesiones vivas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlPlaneEvent {
    /// Una fila de una tabla suscrita cambió en el WAL.
    EntityChanged {
        table: String,
        operation: &'static str,
        entity_id: Option<Uuid>,
        account_id: Option<Uuid>,
    },
    /// Un token fue borrado o venció: las sesiones que lo portan
    /// deben desconectarse.
    TokenRevoked { token_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    transmission_channel: broadcast::Sender<ControlPlaneEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { transmission_channel: sender }
    }

    /// Nuevo receptor para un componente interesado.
    pub fn subscribe(&self) -> broadcast::Receiver<ControlPlaneEvent> {
        self.transmission_channel.subscribe()
    }

    pub fn broadcast_entity_change(
        &self,
        table: &str,
        operation: &'static str,
        entity_id: Option<Uuid>,
        account_id: Option<Uuid>,
    ) {
        self.dispatch(ControlPlaneEvent::EntityChanged {
            table: table.to_string(),
            operation,
            entity_id,
            account_id,
        });
    }

    pub fn broadcast_token_revoked(&self, token_id: Uuid) {
        warn!("🎫 [EVENT_BUS]: Token {} revoked. Sessions holding it must drop.", token_id);
        self.dispatch(ControlPlaneEvent::TokenRevoked { token_id });
    }

    fn dispatch(&self, event: ControlPlaneEvent) {
        match self.transmission_channel.send(event) {
            Ok(receiver_count) => {
                debug!("📢 [EVENT_BUS]: Signal dispatched to {} receivers.", receiver_count);
            }
            Err(_) => {
                // Sin suscriptores: estado legítimo durante el arranque.
                debug!("📢 [EVENT_BUS]: Signal emitted with zero receivers.");
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
// FIN DEL ARCHIVO [apps/control-plane/src/services/event_bus.rs]
