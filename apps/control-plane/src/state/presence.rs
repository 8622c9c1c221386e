// [apps/control-plane/src/state/presence.rs]
/*!
 * =================================================================
 * APARATO: PRESENCE REGISTRY (V8.0 - ADMISSION GUARDED)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L4)
 * RESPONSABILIDAD: ONLINE-SETS POR TOPIC Y ADMISIÓN LIMITADA
 *
 * Contratos:
 * 1. Admisión: 1 token/segundo por balde (remote_ip, token_id). La
 *    misma IP con tokens distintos no se limita; el mismo token desde
 *    IPs distintas tampoco.
 * 2. Relays: un join nuevo para un relay existente desaloja al
 *    tracker previo con un shutdown ordenado.
 * 3. Los suscriptores reciben deltas de membresía, no instantáneas.
 * =================================================================
 */

use std::collections::HashMap;
use std::net::IpAddr;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::{broadcast, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Un token por segundo por balde de admisión.
const ADMISSION_REFILL_INTERVAL: Duration = Duration::from_secs(1);
/// Capacidad del canal de deltas de presencia.
const DIFF_CHANNEL_CAPACITY: usize = 1024;

/// Meta de una entidad rastreada dentro de un topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceMeta {
    pub joined_at: DateTime<Utc>,
    /// Carga opaca del tracker (versión, coordenadas de relay, etc.).
    pub payload: serde_json::Value,
}

impl PresenceMeta {
    /// Meta de un relay con sus coordenadas de plano de datos.
    pub fn for_relay(
        ipv4: Option<Ipv4Addr>,
        ipv6: Option<Ipv6Addr>,
        port: u16,
        lat: Option<f64>,
        lon: Option<f64>,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            joined_at,
            payload: json!({
                "ipv4": ipv4.map(|address| address.to_string()),
                "ipv6": ipv6.map(|address| address.to_string()),
                "port": port,
                "lat": lat,
                "lon": lon,
            }),
        }
    }
}

/// Delta de membresía difundido a los suscriptores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceDiff {
    Joined { topic: String, key: String },
    Left { topic: String, key: String },
}

/// Rechazo de admisión de un socket entrante.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionRejection {
    RateLimit,
}

struct PresenceEntry {
    metas: Vec<PresenceMeta>,
    /// Canal de apagado del tracker exclusivo vigente (relays).
    shutdown_notifier: Option<oneshot::Sender<()>>,
}

/// Registro de presencia por nodo; los pares del clúster ven sus
/// propias entradas vía gossip (fuera de este aparato).
pub struct PresenceRegistry {
    topics: RwLock<HashMap<String, HashMap<String, PresenceEntry>>>,
    diff_channel: broadcast::Sender<PresenceDiff>,
    admission_buckets: Mutex<HashMap<(IpAddr, Uuid), Instant>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        let (diff_sender, _) = broadcast::channel(DIFF_CHANNEL_CAPACITY);
        Self {
            topics: RwLock::new(HashMap::new()),
            diff_channel: diff_sender,
            admission_buckets: Mutex::new(HashMap::new()),
        }
    }

    // --- ESTRATO DE ADMISIÓN ---

    /// Compuerta de admisión por balde `(remote_ip, token_id)`.
    pub fn admit_join(&self, remote_ip: IpAddr, token_id: Uuid) -> Result<(), AdmissionRejection> {
        let mut buckets_guard = self.admission_buckets.lock().expect("LOCK_POISONED");
        let now = Instant::now();
        let bucket_key = (remote_ip, token_id);

        if let Some(last_admitted) = buckets_guard.get(&bucket_key) {
            if now.duration_since(*last_admitted) < ADMISSION_REFILL_INTERVAL {
                warn!("🛑 [PRESENCE_ADMISSION]: Bucket ({}, {}) rate limited.", remote_ip, token_id);
                return Err(AdmissionRejection::RateLimit);
            }
        }

        buckets_guard.insert(bucket_key, now);
        Ok(())
    }

    // --- ESTRATO DE RASTREO ---

    /// Agrega una meta al online-set del topic.
    pub fn track(&self, topic: &str, key: &str, meta: PresenceMeta) {
        let mut topics_guard = self.topics.write().expect("LOCK_POISONED");
        let topic_entries = topics_guard.entry(topic.to_string()).or_default();

        let entry = topic_entries
            .entry(key.to_string())
            .or_insert_with(|| PresenceEntry { metas: Vec::new(), shutdown_notifier: None });
        entry.metas.push(meta);

        debug!("🟢 [PRESENCE]: {} joined topic '{}'.", key, topic);
        let _ = self
            .diff_channel
            .send(PresenceDiff::Joined { topic: topic.to_string(), key: key.to_string() });
    }

    /// Rastreo exclusivo (relays): un join nuevo para la misma llave
    /// desaloja al holder previo con un shutdown ordenado.
    pub fn track_exclusive(
        &self,
        topic: &str,
        key: &str,
        meta: PresenceMeta,
        shutdown_notifier: oneshot::Sender<()>,
    ) {
        let mut topics_guard = self.topics.write().expect("LOCK_POISONED");
        let topic_entries = topics_guard.entry(topic.to_string()).or_default();

        if let Some(previous_entry) = topic_entries.remove(key) {
            if let Some(previous_notifier) = previous_entry.shutdown_notifier {
                info!("♻️  [PRESENCE]: Evicting previous tracker of '{}' in '{}'.", key, topic);
                let _ = previous_notifier.send(());
            }
        }

        topic_entries.insert(
            key.to_string(),
            PresenceEntry { metas: vec![meta], shutdown_notifier: Some(shutdown_notifier) },
        );

        let _ = self
            .diff_channel
            .send(PresenceDiff::Joined { topic: topic.to_string(), key: key.to_string() });
    }

    /// Retira una entidad del online-set.
    pub fn untrack(&self, topic: &str, key: &str) {
        let mut topics_guard = self.topics.write().expect("LOCK_POISONED");
        if let Some(topic_entries) = topics_guard.get_mut(topic) {
            if topic_entries.remove(key).is_some() {
                debug!("⚪ [PRESENCE]: {} left topic '{}'.", key, topic);
                let _ = self
                    .diff_channel
                    .send(PresenceDiff::Left { topic: topic.to_string(), key: key.to_string() });
            }
        }
    }

    // --- ESTRATO DE CONSULTA ---

    /// Instantánea del online-set de un topic.
    pub fn list(&self, topic: &str) -> HashMap<String, Vec<PresenceMeta>> {
        let topics_guard = self.topics.read().expect("LOCK_POISONED");
        topics_guard
            .get(topic)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(key, entry)| (key.clone(), entry.metas.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get(&self, topic: &str, key: &str) -> Option<Vec<PresenceMeta>> {
        let topics_guard = self.topics.read().expect("LOCK_POISONED");
        topics_guard.get(topic).and_then(|entries| entries.get(key)).map(|entry| entry.metas.clone())
    }

    /// Suscripción a los deltas de membresía de todos los topics.
    pub fn subscribe(&self) -> broadcast::Receiver<PresenceDiff> {
        self.diff_channel.subscribe()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
// FIN DEL ARCHIVO [apps/control-plane/src/state/presence.rs]
