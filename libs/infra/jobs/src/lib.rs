// [libs/infra/jobs/src/lib.rs]
/*!
 * =================================================================
 * APARATO: RECURRENT JOB FABRIC (V5.0)
 * CLASIFICACIÓN: INFRASTRUCTURE PRIMITIVES (ESTRATO L3)
 * RESPONSABILIDAD: HOSPEDAJE DE TRABAJOS PERIÓDICOS
 *
 * Dos clases de ejecutores sostienen los motores periódicos:
 * - Concurrente: corre en cada nodo, ticks síncronos sin solape.
 * - Global: corre en exactamente un nodo del clúster, con elección
 *   por arrendamiento y failover con jitter acotado (< 200 ms).
 * =================================================================
 */

pub mod concurrent;
pub mod global;
pub mod memory;

pub use concurrent::{spawn_concurrent_executor, ExecutorOptions, RecurrentJob};
pub use global::{spawn_global_executor, GlobalExecutorOptions, LeaseFault, LeaseRegistry};
pub use memory::InMemoryLeaseRegistry;
