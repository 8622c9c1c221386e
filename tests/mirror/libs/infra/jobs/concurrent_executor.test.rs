// [tests/mirror/libs/infra/jobs/concurrent_executor.test.rs]
/**
 * =================================================================
 * APARATO: CONCURRENT EXECUTOR CERTIFIER (V3.0 - NO OVERLAP)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L3)
 * RESPONSABILIDAD: TICKS SIN SOLAPE Y DELAY INICIAL
 * =================================================================
 */

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cerberus_infra_jobs::{spawn_concurrent_executor, ExecutorOptions, RecurrentJob};

/// Sonda compartida: cuenta ejecuciones vivas y detecta solapes.
#[derive(Clone, Default)]
struct OverlapProbe {
    in_flight: Arc<AtomicU32>,
    completed: Arc<AtomicU32>,
    overlaps_detected: Arc<AtomicU32>,
}

struct SlowProbeJob;

#[async_trait]
impl RecurrentJob for SlowProbeJob {
    type Config = OverlapProbe;
    type State = OverlapProbe;

    const NAME: &'static str = "slow_probe";

    fn state(config: Self::Config) -> Self::State {
        config
    }

    async fn execute(probe: &mut Self::State) {
        let concurrent = probe.in_flight.fetch_add(1, Ordering::SeqCst);
        if concurrent > 0 {
            probe.overlaps_detected.fetch_add(1, Ordering::SeqCst);
        }

        // Un tick deliberadamente más largo que el intervalo: si el
        // ejecutor re-agendara por reloj y no por retorno, solaparía.
        tokio::time::sleep(Duration::from_millis(80)).await;

        probe.in_flight.fetch_sub(1, Ordering::SeqCst);
        probe.completed.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn certify_ticks_never_overlap_even_with_slow_executions() {
    let probe = OverlapProbe::default();

    let executor_handle = spawn_concurrent_executor::<SlowProbeJob>(
        probe.clone(),
        ExecutorOptions::every(Duration::from_millis(10)),
    );

    tokio::time::sleep(Duration::from_millis(400)).await;
    executor_handle.abort();

    let completed = probe.completed.load(Ordering::SeqCst);
    let overlaps = probe.overlaps_detected.load(Ordering::SeqCst);

    assert!(completed >= 2, "expected several completed ticks, got {completed}");
    assert_eq!(overlaps, 0, "executor must never run two ticks concurrently");
}

struct CountingJob;

#[async_trait]
impl RecurrentJob for CountingJob {
    type Config = Arc<AtomicU32>;
    type State = Arc<AtomicU32>;

    const NAME: &'static str = "counting_probe";

    fn state(config: Self::Config) -> Self::State {
        config
    }

    async fn execute(counter: &mut Self::State) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn certify_initial_delay_postpones_the_first_tick() {
    let tick_counter = Arc::new(AtomicU32::new(0));

    let executor_handle = spawn_concurrent_executor::<CountingJob>(
        Arc::clone(&tick_counter),
        ExecutorOptions::every(Duration::from_secs(3600)).with_initial_delay(Duration::from_millis(150)),
    );

    // Antes del delay inicial: ningún tick.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(tick_counter.load(Ordering::SeqCst), 0, "tick fired before the initial delay");

    // Después del delay: exactamente el primer tick.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(tick_counter.load(Ordering::SeqCst), 1, "first tick missing after the delay");

    executor_handle.abort();
}
// FIN DEL ARCHIVO [tests/mirror/libs/infra/jobs/concurrent_executor.test.rs]
