// [tests/mirror/libs/infra/idp/okta_adapter.test.rs]
/**
 * =================================================================
 * APARATO: OKTA ADAPTER CERTIFIER (V4.0 - LINK PAGINATION)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L3)
 * RESPONSABILIDAD: CABECERA Link rel="next" Y ENVOLTORIO DE ERRORES
 * =================================================================
 */

use cerberus_domain_sync::SyncFault;
use cerberus_infra_idp::OktaDirectoryClient;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn certify_user_listing_follows_link_header() {
    let server = MockServer::start().await;

    // Página 2 (con cursor), montada con matcher específico.
    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .and(query_param("after", "cursor-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "00u3", "profile": { "email": "c@x", "firstName": "Carol", "lastName": "Chen" } }
        ])))
        .mount(&server)
        .await;

    // Página 1 (sin cursor) anuncia la siguiente vía Link.
    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .and(query_param_is_missing("after"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "Link",
                    format!(
                        "<{}/api/v1/users?after=cursor-2>; rel=\"next\", <{}/api/v1/users>; rel=\"self\"",
                        server.uri(),
                        server.uri()
                    )
                    .as_str(),
                )
                .set_body_json(json!([
                    { "id": "00u1", "profile": { "email": "a@x", "firstName": "Ada", "lastName": "Ly" } },
                    { "id": "00u2", "profile": { "email": "b@x", "firstName": "Bob", "lastName": "Po" } }
                ])),
        )
        .mount(&server)
        .await;

    let client = OktaDirectoryClient::new();
    let users = client.list_users(&server.uri(), "okta-token").await.expect("listing must succeed");

    let identifiers: Vec<&str> = users.iter().map(|user| user.provider_identifier.as_str()).collect();
    assert_eq!(identifiers, vec!["00u1", "00u2", "00u3"]);
    assert_eq!(users[0].actor_name, "Ada Ly");
}

#[tokio::test]
async fn certify_requests_carry_bearer_authorization() {
    let server = MockServer::start().await;

    // El access token rotado por el grant OAuth viaja como portador.
    Mock::given(method("GET"))
        .and(path("/api/v1/groups"))
        .and(header("Authorization", "Bearer okta-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = OktaDirectoryClient::new();
    let groups = client.list_groups(&server.uri(), "okta-token").await.expect("must succeed");
    assert!(groups.is_empty());
}

#[tokio::test]
async fn certify_group_members_map_through_the_user_contract() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/groups/00g1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "00u9", "profile": { "email": "m@x", "firstName": "Mia", "lastName": "Ng" } }
        ])))
        .mount(&server)
        .await;

    let client = OktaDirectoryClient::new();
    let members = client
        .list_group_members(&server.uri(), "okta-token", "00g1")
        .await
        .expect("must succeed");

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].provider_identifier, "00u9");
}

#[tokio::test]
async fn certify_client_error_envelope_reaches_the_classifier() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorCode": "E0000011",
            "errorSummary": "Invalid token provided",
            "errorLink": "E0000011",
            "errorId": "oae-x"
        })))
        .mount(&server)
        .await;

    let client = OktaDirectoryClient::new();
    let fault = client.list_users(&server.uri(), "bad").await.expect_err("must fail");

    match fault {
        SyncFault::Status { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body["errorCode"], "E0000011");
            assert_eq!(body["errorSummary"], "Invalid token provided");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn certify_unauthorized_uses_error_summary() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errorCode": "E0000011",
            "errorSummary": "Invalid token provided"
        })))
        .mount(&server)
        .await;

    let client = OktaDirectoryClient::new();
    let fault = client.list_users(&server.uri(), "bad").await.expect_err("must fail");

    match fault {
        SyncFault::Unauthorized { message } => assert_eq!(message, "Invalid token provided"),
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}
// FIN DEL ARCHIVO [tests/mirror/libs/infra/idp/okta_adapter.test.rs]
