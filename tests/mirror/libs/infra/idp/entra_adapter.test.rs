// [tests/mirror/libs/infra/idp/entra_adapter.test.rs]
/**
 * =================================================================
 * APARATO: ENTRA ADAPTER CERTIFIER (V4.0 - GRAPH CONTRACTS)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L3)
 * RESPONSABILIDAD: PAGINACIÓN @odata.nextLink Y MAPEO DE ESTATUS
 * =================================================================
 */

use cerberus_domain_sync::SyncFault;
use cerberus_infra_idp::EntraDirectoryClient;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn certify_user_listing_drains_odata_pagination() {
    let server = MockServer::start().await;

    // Página 1: dos usuarios y un nextLink absoluto.
    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "id": "U1", "userPrincipalName": "a@x", "displayName": "A", "accountEnabled": true },
                { "id": "U2", "userPrincipalName": "b@x", "displayName": "B", "accountEnabled": true }
            ],
            "@odata.nextLink": format!("{}/v1.0/users-page2", server.uri())
        })))
        .mount(&server)
        .await;

    // Página 2: el último usuario, sin nextLink.
    Mock::given(method("GET"))
        .and(path("/v1.0/users-page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "id": "U3", "userPrincipalName": "c@x", "displayName": "C", "accountEnabled": true }
            ]
        })))
        .mount(&server)
        .await;

    let client = EntraDirectoryClient::new();
    let users = client.list_users(&server.uri(), "token").await.expect("listing must succeed");

    // Acumulación en orden de inserción a través de las páginas.
    let identifiers: Vec<&str> = users.iter().map(|user| user.provider_identifier.as_str()).collect();
    assert_eq!(identifiers, vec!["U1", "U2", "U3"]);
    assert_eq!(users[0].email, "a@x");
    assert_eq!(users[0].actor_name, "A");
}

#[tokio::test]
async fn certify_user_listing_selects_only_needed_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .and(query_param(
            "$select",
            "id,accountEnabled,displayName,givenName,surname,mail,userPrincipalName",
        ))
        .and(query_param("$filter", "accountEnabled eq true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = EntraDirectoryClient::new();
    let users = client.list_users(&server.uri(), "token").await.expect("listing must succeed");
    assert!(users.is_empty());
}

#[tokio::test]
async fn certify_group_members_filter_account_enabled_client_side() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/groups/G1/transitiveMembers/microsoft.graph.user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "id": "U1", "userPrincipalName": "a@x", "displayName": "A", "accountEnabled": true },
                { "id": "U2", "userPrincipalName": "b@x", "displayName": "B", "accountEnabled": false },
                { "id": "U3", "userPrincipalName": "c@x", "displayName": "C" }
            ]
        })))
        .mount(&server)
        .await;

    let client = EntraDirectoryClient::new();
    let members = client
        .list_group_members(&server.uri(), "token", "G1")
        .await
        .expect("member listing must succeed");

    // Solo el miembro habilitado sobrevive; el filtro corre del lado cliente.
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].provider_identifier, "U1");
}

#[tokio::test]
async fn certify_unauthorized_carries_the_provider_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": "InvalidAuthenticationToken", "message": "Insufficient privileges" }
        })))
        .mount(&server)
        .await;

    let client = EntraDirectoryClient::new();
    let fault = client.list_users(&server.uri(), "bad-token").await.expect_err("must fail");

    match fault {
        SyncFault::Unauthorized { message } => assert_eq!(message, "Insufficient privileges"),
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn certify_server_errors_ask_for_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/groups"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = EntraDirectoryClient::new();
    let fault = client.list_groups(&server.uri(), "token").await.expect_err("must fail");

    assert!(matches!(fault, SyncFault::RetryLater), "5xx must map to retry_later");
}

#[tokio::test]
async fn certify_client_errors_carry_the_decoded_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": "Authorization_RequestDenied", "message": "denied" }
        })))
        .mount(&server)
        .await;

    let client = EntraDirectoryClient::new();
    let fault = client.list_users(&server.uri(), "token").await.expect_err("must fail");

    match fault {
        SyncFault::Status { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body["error"]["code"], "Authorization_RequestDenied");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}
// FIN DEL ARCHIVO [tests/mirror/libs/infra/idp/entra_adapter.test.rs]
