// [libs/domain/models/src/tests_serialization.rs]
/**
 * =================================================================
 * APARATO: MODELS SERIALIZATION CERTIFIER (V4.0)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L2)
 * RESPONSABILIDAD: PARIDAD SERDE DE ENTIDADES Y ACCESORES OPACOS
 * =================================================================
 */

use cerberus_domain_models::identity::ProviderState;
use cerberus_domain_models::{
    Account, ActorGroup, ActorType, AdapterState, CreatedBy, Identity, MembershipTuple, Provider,
    ProviderAdapter, Relay,
};
use chrono::{TimeZone, Utc};
use serde_json::json;

#[test]
fn certify_account_feature_gate_semantics() {
    let account_document = json!({
        "id": "7e7f7d4e-33cc-4d2d-9f3a-0a8a5a3c9b01",
        "legal_name": "Umbra Industries",
        "disabled_at": null,
        "features": { "idp_sync": true, "rest_api": true },
        "limits": { "monthly_active_users": 250, "gateway_groups": null },
        "metadata": { "stripe": { "customer_id": "cus_000" } },
        "warning": null,
        "warning_last_sent_at": null,
        "config": { "notifications": { "outdated_gateway": { "enabled": true, "last_notified": null } } },
        "created_at": "2026-01-10T08:00:00Z"
    });

    let account: Account = serde_json::from_value(account_document).expect("account must decode");

    assert!(account.idp_sync_enabled());
    // El flag desconocido 'rest_api' debe sobrevivir en el mapa extra.
    assert_eq!(account.features.extra.get("rest_api"), Some(&true));
    assert_eq!(account.limits.get("monthly_active_users"), Some(&Some(250)));
    assert_eq!(account.limits.get("gateway_groups"), Some(&None));
}

#[test]
fn certify_adapter_state_rotation_preserves_foreign_keys() {
    let original_document = json!({
        "access_token": "old-access",
        "refresh_token": "refresh-1",
        "expires_at": "2026-03-01T00:00:00Z",
        "userinfo": { "email": "ops@umbra.example", "sub": "abc123" },
        "custom_claim": "must-survive"
    });

    let state: AdapterState = serde_json::from_value(original_document).expect("state must decode");
    let rotated = state.with_rotated_credentials(
        "new-access".to_string(),
        None,
        Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
    );

    let rotated_document = rotated.to_document();
    assert_eq!(rotated_document["access_token"], "new-access");
    // Sin refresh_token nuevo, el anterior queda intacto.
    assert_eq!(rotated_document["refresh_token"], "refresh-1");
    assert_eq!(rotated_document["custom_claim"], "must-survive");
    assert_eq!(rotated_document["userinfo"]["sub"], "abc123");
}

#[test]
fn certify_provider_state_email_merge() {
    let existing = json!({
        "userinfo": { "email": "stale@umbra.example", "sub": "zz9" },
        "refresh_token": "rt-keep"
    });

    let merged = ProviderState::merge_email(&existing, "fresh@umbra.example");

    assert_eq!(merged["userinfo"]["email"], "fresh@umbra.example");
    assert_eq!(merged["userinfo"]["sub"], "zz9");
    assert_eq!(merged["refresh_token"], "rt-keep");
}

#[test]
fn certify_provider_adapter_canonical_names() {
    let provider_document = json!({
        "id": "a7b1c9f0-51a0-4c7e-8f4e-2b7d9e6a1c22",
        "account_id": "7e7f7d4e-33cc-4d2d-9f3a-0a8a5a3c9b01",
        "name": "Corporate Entra",
        "adapter": "microsoft_entra",
        "provisioner": "custom",
        "adapter_config": { "api_base_url": "https://graph.microsoft.com" },
        "adapter_state": {},
        "last_synced_at": null,
        "last_syncs_failed": 0,
        "last_sync_error": null,
        "sync_errored_at": null,
        "sync_disabled_at": null,
        "sync_error_emailed_at": null,
        "disabled_at": null,
        "deleted_at": null,
        "created_at": "2026-01-10T08:00:00Z"
    });

    let provider: Provider = serde_json::from_value(provider_document).expect("provider must decode");
    assert_eq!(provider.adapter, ProviderAdapter::MicrosoftEntra);
    assert!(provider.adapter.supports_directory_sync());
    assert!(provider.is_sync_eligible());
    assert_eq!(provider.api_endpoint(), Some("https://graph.microsoft.com"));
}

#[test]
fn certify_enum_wire_names() {
    assert_eq!(serde_json::to_value(ActorType::AccountAdminUser).unwrap(), json!("account_admin_user"));
    assert_eq!(serde_json::to_value(CreatedBy::Provider).unwrap(), json!("provider"));
    assert_eq!(
        serde_json::to_value(ProviderAdapter::GoogleWorkspace).unwrap(),
        json!("google_workspace")
    );
}

#[test]
fn certify_identity_group_and_relay_entities() {
    let identity_document = json!({
        "id": "0b6bfa2e-6f7a-4a0d-b2ee-27f9d5a4a111",
        "account_id": "7e7f7d4e-33cc-4d2d-9f3a-0a8a5a3c9b01",
        "provider_id": "a7b1c9f0-51a0-4c7e-8f4e-2b7d9e6a1c22",
        "provider_identifier": "U1",
        "provider_state": { "userinfo": { "email": "a@x" } },
        "actor_id": "11111111-2222-4333-8444-555555555555",
        "created_by": "provider",
        "deleted_at": null,
        "created_at": "2026-02-01T08:00:00Z"
    });
    let identity: Identity = serde_json::from_value(identity_document).expect("identity must decode");
    assert_eq!(identity.email(), Some("a@x"));
    assert_eq!(identity.created_by, CreatedBy::Provider);

    let group_document = json!({
        "id": "2c1c2a00-9f00-4c00-8a00-000000000001",
        "account_id": "7e7f7d4e-33cc-4d2d-9f3a-0a8a5a3c9b01",
        "provider_id": "a7b1c9f0-51a0-4c7e-8f4e-2b7d9e6a1c22",
        "provider_identifier": "G:GRP-77",
        "name": "Group:Engineering",
        "created_by": "provider",
        "deleted_at": null,
        "created_at": "2026-02-01T08:00:00Z"
    });
    let group: ActorGroup = serde_json::from_value(group_document).expect("group must decode");
    assert_eq!(group.provider_identifier.as_deref(), Some("G:GRP-77"));
    assert_eq!(group.name, "Group:Engineering");

    let relay_document = json!({
        "id": "3d3d3d3d-4e4e-4f4f-8a8a-9b9b9b9b9b9b",
        "account_id": null,
        "ipv4": "198.51.100.7",
        "ipv6": null,
        "port": 3478,
        "lat": 52.52,
        "lon": 13.40,
        "last_seen_version": "1.4.0",
        "last_seen_at": null,
        "deleted_at": null
    });
    let relay: Relay = serde_json::from_value(relay_document).expect("relay must decode");
    assert_eq!(relay.ipv4.map(|address| address.to_string()).as_deref(), Some("198.51.100.7"));
    assert_eq!(relay.port, 3478);
}

#[test]
fn certify_membership_tuple_ordering_is_group_first() {
    let tuple_alpha = MembershipTuple::new("G:A", "U2");
    let tuple_beta = MembershipTuple::new("G:B", "U1");
    // El orden canónico compara primero el identificador del grupo.
    assert!(tuple_alpha < tuple_beta);
}
// FIN DEL ARCHIVO [libs/domain/models/src/tests_serialization.rs]
