// [tests/mirror/libs/domain/models/token_secrecy.test.rs]
/**
 * =================================================================
 * APARATO: TOKEN SECRECY CERTIFIER (V3.0)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L2)
 * RESPONSABILIDAD: EL NONCE JAMÁS TOCA EL ALMACENAMIENTO
 * =================================================================
 */

use cerberus_domain_models::token::{compute_secret_hash, forge_token};
use cerberus_domain_models::TokenType;
use chrono::{Duration, Utc};

#[test]
fn certify_forged_token_persists_only_salt_and_digest() {
    let now = Utc::now();
    let created = forge_token(None, TokenType::GatewayGroup, None, None, now);

    // El registro persistible: salt y digesto, nada más del material.
    let persisted_document = serde_json::to_value(&created.token).expect("token must serialize");
    let rendered = persisted_document.to_string();

    assert!(persisted_document.get("secret_salt").is_some());
    assert!(persisted_document.get("secret_hash").is_some());
    assert!(persisted_document.get("secret_nonce").is_none(), "nonce field must not exist");
    assert!(persisted_document.get("secret_fragment").is_none(), "fragment field must not exist");
    assert!(
        !rendered.contains(&created.encoded_secret),
        "the encoded secret leaked into the persisted record"
    );
}

#[test]
fn certify_secret_verification_round() {
    let now = Utc::now();
    let created = forge_token(None, TokenType::Client, None, None, now);

    assert!(created.token.verify_secret(&created.encoded_secret));
    assert!(!created.token.verify_secret("forged-material"));

    // El digesto cubre exactamente presentado ‖ salt.
    let recomputed = compute_secret_hash(&created.encoded_secret, &created.token.secret_salt);
    assert_eq!(recomputed, created.token.secret_hash);
}

#[test]
fn certify_usability_predicate() {
    let now = Utc::now();

    let fresh = forge_token(None, TokenType::Browser, Some(now + Duration::hours(1)), Some(3), now);
    assert!(fresh.token.is_usable(now));

    let expired = forge_token(None, TokenType::Browser, Some(now - Duration::seconds(1)), None, now);
    assert!(!expired.token.is_usable(now));

    let mut exhausted = forge_token(None, TokenType::Email, None, Some(0), now).token;
    assert!(!exhausted.is_usable(now));
    exhausted.remaining_attempts = Some(1);
    assert!(exhausted.is_usable(now));

    let mut deleted = forge_token(None, TokenType::ApiClient, None, None, now).token;
    deleted.deleted_at = Some(now);
    assert!(!deleted.is_usable(now));
}

#[test]
fn certify_two_forges_never_collide() {
    let now = Utc::now();
    let first = forge_token(None, TokenType::RelayGroup, None, None, now);
    let second = forge_token(None, TokenType::RelayGroup, None, None, now);

    assert_ne!(first.encoded_secret, second.encoded_secret);
    assert_ne!(first.token.secret_salt, second.token.secret_salt);
    assert_ne!(first.token.secret_hash, second.token.secret_hash);
}
// FIN DEL ARCHIVO [tests/mirror/libs/domain/models/token_secrecy.test.rs]
