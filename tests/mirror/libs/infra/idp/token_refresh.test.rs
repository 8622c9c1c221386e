// [tests/mirror/libs/infra/idp/token_refresh.test.rs]
/**
 * =================================================================
 * APARATO: TOKEN REFRESH CERTIFIER (V4.0 - ROTATION)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L3)
 * RESPONSABILIDAD: GRANT refresh_token Y PRESERVACIÓN DE DOCUMENTO
 * =================================================================
 */

use cerberus_domain_models::{Provider, ProviderAdapter, Provisioner};
use cerberus_domain_sync::SyncFault;
use cerberus_infra_idp::refresh_access_token;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_with(
    adapter: ProviderAdapter,
    adapter_config: serde_json::Value,
    adapter_state: serde_json::Value,
) -> Provider {
    Provider {
        id: Uuid::new_v4(),
        account_id: Uuid::new_v4(),
        name: "Test Directory".to_string(),
        adapter,
        provisioner: Provisioner::Custom,
        adapter_config,
        adapter_state,
        last_synced_at: None,
        last_syncs_failed: 0,
        last_sync_error: None,
        sync_errored_at: None,
        sync_disabled_at: None,
        sync_error_emailed_at: None,
        is_disabled: false,
        disabled_reason: None,
        is_verified: true,
        disabled_at: None,
        deleted_at: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn certify_refresh_grant_rotates_the_credential_triad() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-original"))
        .and(body_string_contains("client_id=client-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-fresh",
            "refresh_token": "rt-rotated",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let provider = provider_with(
        ProviderAdapter::MicrosoftEntra,
        json!({
            "token_endpoint": format!("{}/oauth2/v2.0/token", server.uri()),
            "client_id": "client-1",
            "client_secret": "secret-1"
        }),
        json!({
            "access_token": "at-stale",
            "refresh_token": "rt-original",
            "expires_at": "2020-01-01T00:00:00Z",
            "userinfo": { "sub": "keep-me" }
        }),
    );

    let rotated = refresh_access_token(&provider).await.expect("rotation must succeed");

    assert_eq!(rotated.access_token, "at-fresh");
    assert_eq!(rotated.refresh_token.as_deref(), Some("rt-rotated"));
    assert!(rotated.expires_at > Utc::now() + Duration::minutes(30));

    // La fusión sobre adapter_state solo toca la tríada OAuth.
    let rotated_document = provider
        .typed_state()
        .with_rotated_credentials(rotated.access_token, rotated.refresh_token, rotated.expires_at)
        .to_document();

    assert_eq!(rotated_document["access_token"], "at-fresh");
    assert_eq!(rotated_document["refresh_token"], "rt-rotated");
    assert_eq!(rotated_document["userinfo"]["sub"], "keep-me");
}

#[tokio::test]
async fn certify_rejected_grant_maps_to_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "The refresh token has expired"
        })))
        .mount(&server)
        .await;

    let provider = provider_with(
        ProviderAdapter::Okta,
        json!({
            "token_endpoint": format!("{}/token", server.uri()),
            "client_id": "client-1",
            "client_secret": "secret-1"
        }),
        json!({ "refresh_token": "rt-dead", "expires_at": "2020-01-01T00:00:00Z" }),
    );

    let fault = refresh_access_token(&provider).await.expect_err("must fail");
    match fault {
        SyncFault::Unauthorized { message } => {
            assert_eq!(message, "The refresh token has expired");
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn certify_missing_refresh_token_is_a_validation_fault() {
    let provider = provider_with(
        ProviderAdapter::MicrosoftEntra,
        json!({ "token_endpoint": "https://login.example.com/token" }),
        json!({ "access_token": "at-only" }),
    );

    let fault = refresh_access_token(&provider).await.expect_err("must fail");
    match fault {
        SyncFault::Validation(violation) => assert_eq!(violation.field, "refresh_token"),
        other => panic!("expected Validation, got {other:?}"),
    }
}
// FIN DEL ARCHIVO [tests/mirror/libs/infra/idp/token_refresh.test.rs]
