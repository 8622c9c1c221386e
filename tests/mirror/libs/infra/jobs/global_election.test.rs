// [tests/mirror/libs/infra/jobs/global_election.test.rs]
/**
 * =================================================================
 * APARATO: GLOBAL ELECTION CERTIFIER (V4.0 - FAILOVER)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L3)
 * RESPONSABILIDAD: UN LÍDER A LA VEZ Y FAILOVER ACOTADO
 * =================================================================
 */

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cerberus_infra_jobs::{
    spawn_global_executor, GlobalExecutorOptions, InMemoryLeaseRegistry, RecurrentJob,
};
use uuid::Uuid;

const TEST_JOB_KEY: &str = "election_probe";

/// Sonda: registra qué instancia ejecutó cada tick.
#[derive(Clone)]
struct ElectionProbe {
    instance_tag: Uuid,
    tick_log: Arc<Mutex<Vec<Uuid>>>,
    tick_count: Arc<AtomicU32>,
}

struct ElectionProbeJob;

#[async_trait]
impl RecurrentJob for ElectionProbeJob {
    type Config = ElectionProbe;
    type State = ElectionProbe;

    const NAME: &'static str = "election_probe";

    fn state(config: Self::Config) -> Self::State {
        config
    }

    async fn execute(probe: &mut Self::State) {
        probe.tick_log.lock().expect("LOCK_POISONED").push(probe.instance_tag);
        probe.tick_count.fetch_add(1, Ordering::SeqCst);
    }
}

fn probe_pair() -> (ElectionProbe, ElectionProbe, Arc<Mutex<Vec<Uuid>>>) {
    let tick_log = Arc::new(Mutex::new(Vec::new()));
    let alpha = ElectionProbe {
        instance_tag: Uuid::new_v4(),
        tick_log: Arc::clone(&tick_log),
        tick_count: Arc::new(AtomicU32::new(0)),
    };
    let beta = ElectionProbe {
        instance_tag: Uuid::new_v4(),
        tick_log: Arc::clone(&tick_log),
        tick_count: Arc::new(AtomicU32::new(0)),
    };
    (alpha, beta, tick_log)
}

#[tokio::test]
async fn certify_exactly_one_leader_between_two_contenders() {
    let lease_registry = Arc::new(InMemoryLeaseRegistry::new());
    let (alpha, beta, tick_log) = probe_pair();

    let options = |_: &str| GlobalExecutorOptions {
        job_key: TEST_JOB_KEY.to_string(),
        interval: Duration::from_millis(20),
        lease_duration: Duration::from_millis(120),
    };

    let alpha_handle = spawn_global_executor::<ElectionProbeJob>(
        alpha.clone(),
        lease_registry.clone(),
        options("alpha"),
    );
    let beta_handle = spawn_global_executor::<ElectionProbeJob>(
        beta.clone(),
        lease_registry.clone(),
        options("beta"),
    );

    // Tras un segundo, exactamente una instancia acumuló todos los ticks.
    tokio::time::sleep(Duration::from_secs(1)).await;

    let observed_leaders: HashSet<Uuid> = tick_log.lock().expect("LOCK_POISONED").iter().copied().collect();
    assert_eq!(observed_leaders.len(), 1, "two leaders ticked concurrently");
    assert!(lease_registry.current_holder(TEST_JOB_KEY).is_some());

    alpha_handle.abort();
    beta_handle.abort();
}

#[tokio::test]
async fn certify_follower_takes_over_after_leader_death() {
    let lease_registry = Arc::new(InMemoryLeaseRegistry::new());
    let (alpha, beta, tick_log) = probe_pair();

    let short_options = GlobalExecutorOptions {
        job_key: TEST_JOB_KEY.to_string(),
        interval: Duration::from_millis(10),
        lease_duration: Duration::from_millis(40),
    };

    let alpha_handle = spawn_global_executor::<ElectionProbeJob>(
        alpha.clone(),
        lease_registry.clone(),
        short_options.clone(),
    );

    // Alfa toma el liderazgo en solitario.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(alpha.tick_count.load(Ordering::SeqCst) > 0, "alpha never led");

    let beta_handle = spawn_global_executor::<ElectionProbeJob>(
        beta.clone(),
        lease_registry.clone(),
        short_options,
    );

    // Muerte del líder: aborto del proceso y expiración de su lease.
    alpha_handle.abort();
    lease_registry.forcibly_expire(TEST_JOB_KEY);

    // Failover: lease (40ms) + jitter (<200ms) + margen de scheduling.
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(
        beta.tick_count.load(Ordering::SeqCst) > 0,
        "the follower never took over after the leader died"
    );

    // El rastro termina en ticks del sucesor, sin intercalado tardío.
    let log_guard = tick_log.lock().expect("LOCK_POISONED");
    let last_tick = log_guard.last().copied().expect("log must not be empty");
    assert_eq!(last_tick, beta.instance_tag);

    beta_handle.abort();
}
// FIN DEL ARCHIVO [tests/mirror/libs/infra/jobs/global_election.test.rs]
