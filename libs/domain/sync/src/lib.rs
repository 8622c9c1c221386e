// [libs/domain/sync/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DIRECTORY SYNC DOMAIN (V6.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: PLANIFICACIÓN DE DIFFS Y CLASIFICACIÓN DE FALLOS
 * =================================================================
 */

pub mod attributes;
pub mod breaker;
pub mod classifier;
pub mod planner;

pub use attributes::MappingViolation;
pub use breaker::assert_plan_is_not_destructive;
pub use classifier::{
    classify, directory_action, ApiFlavor, Classified, DirectoryAction, FaultKind, SyncFault,
    TransportFault,
};
pub use planner::{plan_provider_sync, LocalGroup, LocalIdentity};
