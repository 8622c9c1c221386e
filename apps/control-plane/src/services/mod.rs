// [apps/control-plane/src/services/mod.rs]
/*!
 * =================================================================
 * APARATO: SERVICE ORCHESTRATION HUB (V9.0)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE DAEMONS Y MOTORES
 * =================================================================
 */

pub mod event_bus;
pub mod hooks;
pub mod reaper;
pub mod replication_manager;
pub mod sync_engine;
pub mod sync_scheduler;
pub mod token_refresher;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS) ---

pub use event_bus::{ControlPlaneEvent, EventBus};
pub use replication_manager::ReplicationSupervisor;
pub use sync_engine::DirectorySyncEngine;
pub use sync_scheduler::{SchedulerContext, SyncSchedulerJob};
