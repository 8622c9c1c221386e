// [libs/infra/jobs/src/concurrent.rs]
/*!
 * =================================================================
 * APARATO: CONCURRENT EXECUTOR (V6.0 - NO OVERLAP)
 * CLASIFICACIÓN: INFRASTRUCTURE PRIMITIVES (ESTRATO L3)
 * RESPONSABILIDAD: TICKER POR NODO SIN SOLAPE DE EJECUCIONES
 *
 * Contrato:
 * 1. Al inicializar se invoca `state(config)` una sola vez.
 * 2. El primer tick se agenda a `initial_delay` (default 0).
 * 3. `execute` corre síncrono dentro de la tarea del ejecutor: el
 *    siguiente tick se agenda `interval` DESPUÉS del retorno, por lo
 *    que el solape es estructuralmente imposible. La concurrencia
 *    interna del trabajo es asunto del propio callback.
 * =================================================================
 */

use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Comportamiento de un trabajo recurrente.
#[async_trait]
pub trait RecurrentJob: Send + 'static {
    type Config: Send + 'static;
    type State: Send + 'static;

    /// Nombre nominal del trabajo para el rastro forense.
    const NAME: &'static str;

    /// Construye el estado inicial a partir de la configuración.
    fn state(config: Self::Config) -> Self::State;

    /// Un tick del trabajo. El ejecutor no agenda el siguiente tick
    /// hasta que este retorna.
    async fn execute(state: &mut Self::State);
}

/// Opciones de cadencia del ejecutor.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorOptions {
    pub interval: Duration,
    pub initial_delay: Duration,
}

impl ExecutorOptions {
    pub fn every(interval: Duration) -> Self {
        Self { interval, initial_delay: Duration::ZERO }
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }
}

/// Lanza el bucle perpetuo del trabajo en el runtime de Tokio.
///
/// El handle devuelto permite abortar el ejecutor en el apagado del
/// nodo; un tick en vuelo corre hasta completarse dentro del runtime.
pub fn spawn_concurrent_executor<J: RecurrentJob>(
    config: J::Config,
    options: ExecutorOptions,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut job_state = J::state(config);

        info!(
            "⏱️  [EXECUTOR_ONLINE]: Concurrent job [{}] armed (interval {:?}, initial delay {:?}).",
            J::NAME,
            options.interval,
            options.initial_delay
        );

        tokio::time::sleep(options.initial_delay).await;

        loop {
            J::execute(&mut job_state).await;
            debug!("⏱️  [EXECUTOR_TICK]: Job [{}] tick completed.", J::NAME);
            // Reprogramación DESPUÉS del retorno: sin solape posible.
            tokio::time::sleep(options.interval).await;
        }
    })
}
// FIN DEL ARCHIVO [libs/infra/jobs/src/concurrent.rs]
