// [tests/mirror/apps/control_plane/presence_admission.test.rs]
/**
 * =================================================================
 * APARATO: PRESENCE ADMISSION CERTIFIER (V4.0 - BUCKET ISOLATION)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L4-APP)
 * RESPONSABILIDAD: AISLAMIENTO DEL LÍMITE POR BALDE (ip, token)
 * =================================================================
 */

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use cerberus_control_plane::state::presence::{AdmissionRejection, PresenceMeta, PresenceRegistry};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

fn ip(last_octet: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(203, 0, 113, last_octet))
}

#[tokio::test]
async fn certify_same_bucket_is_limited_within_one_second() {
    let registry = PresenceRegistry::new();
    let remote_ip = ip(10);
    let token_id = Uuid::new_v4();

    assert!(registry.admit_join(remote_ip, token_id).is_ok(), "first join admitted");
    assert_eq!(
        registry.admit_join(remote_ip, token_id),
        Err(AdmissionRejection::RateLimit),
        "second join within the same second must be limited"
    );

    // Tras el intervalo de recarga, el balde vuelve a admitir.
    tokio::time::sleep(Duration::from_millis(1_050)).await;
    assert!(registry.admit_join(remote_ip, token_id).is_ok(), "bucket refills after one second");
}

#[tokio::test]
async fn certify_distinct_tokens_from_the_same_ip_are_not_limited() {
    let registry = PresenceRegistry::new();
    let remote_ip = ip(20);

    let first_token = Uuid::new_v4();
    let second_token = Uuid::new_v4();

    assert!(registry.admit_join(remote_ip, first_token).is_ok());
    assert!(registry.admit_join(remote_ip, second_token).is_ok(), "different token, same IP");
}

#[tokio::test]
async fn certify_distinct_ips_with_the_same_token_are_not_limited() {
    let registry = PresenceRegistry::new();
    let token_id = Uuid::new_v4();

    assert!(registry.admit_join(ip(30), token_id).is_ok());
    assert!(registry.admit_join(ip(31), token_id).is_ok(), "different IP, same token");
}

#[tokio::test]
async fn certify_track_list_get_and_diff_subscription() {
    let registry = PresenceRegistry::new();
    let mut diff_receiver = registry.subscribe();

    let gateway_key = Uuid::new_v4().to_string();
    registry.track(
        "gateways:acct-1",
        &gateway_key,
        PresenceMeta { joined_at: Utc::now(), payload: json!({ "version": "1.4.2" }) },
    );

    // list: instantánea del online-set.
    let snapshot = registry.list("gateways:acct-1");
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[&gateway_key].len(), 1);

    // get: metas de una entidad puntual.
    let metas = registry.get("gateways:acct-1", &gateway_key).expect("entity tracked");
    assert_eq!(metas[0].payload["version"], "1.4.2");

    // subscribe: el delta de join llegó al suscriptor.
    let joined = diff_receiver.recv().await.expect("diff delivered");
    assert_eq!(
        joined,
        cerberus_control_plane::state::presence::PresenceDiff::Joined {
            topic: "gateways:acct-1".to_string(),
            key: gateway_key.clone(),
        }
    );

    // untrack emite el delta de salida y vacía el set.
    registry.untrack("gateways:acct-1", &gateway_key);
    let left = diff_receiver.recv().await.expect("diff delivered");
    assert_eq!(
        left,
        cerberus_control_plane::state::presence::PresenceDiff::Left {
            topic: "gateways:acct-1".to_string(),
            key: gateway_key.clone(),
        }
    );
    assert!(registry.get("gateways:acct-1", &gateway_key).is_none());
}
// FIN DEL ARCHIVO [tests/mirror/apps/control_plane/presence_admission.test.rs]
