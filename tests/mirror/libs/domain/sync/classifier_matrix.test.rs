// [tests/mirror/libs/domain/sync/classifier_matrix.test.rs]
/**
 * =================================================================
 * APARATO: ERROR CLASSIFIER CERTIFIER (V4.0 - MATRIX)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L2)
 * RESPONSABILIDAD: MATRIZ NORMATIVA DE CLASIFICACIÓN Y MENSAJES
 * =================================================================
 */

use cerberus_domain_models::ProviderSyncPlan;
use cerberus_domain_sync::{
    assert_plan_is_not_destructive, classify, directory_action, ApiFlavor, DirectoryAction,
    FaultKind, SyncFault, TransportFault,
};
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

#[test]
fn certify_entra_unauthorized_message_shape() {
    // Escenario: list_users devuelve HTTP 401 con el texto de Graph.
    let fault = SyncFault::Unauthorized { message: "Insufficient privileges".to_string() };
    let classified = classify(ApiFlavor::MicrosoftGraph, &fault);

    assert_eq!(classified.kind, FaultKind::ClientError);
    assert_eq!(classified.message, "Microsoft Graph API returned 401: Insufficient privileges");
    assert_eq!(
        directory_action(&classified, None, Utc::now()),
        DirectoryAction::Disable,
        "401 must disable the directory immediately"
    );
}

#[test]
fn certify_okta_unavailable_message_shape() {
    // Escenario: list_groups devuelve HTTP 503.
    let classified = classify(ApiFlavor::Okta, &SyncFault::RetryLater);

    assert_eq!(classified.kind, FaultKind::Transient);
    assert_eq!(classified.message, "Okta API is temporarily unavailable");
    assert_eq!(directory_action(&classified, None, Utc::now()), DirectoryAction::Record);
}

#[test]
fn certify_transient_streak_escalates_after_24_hours() {
    let classified = classify(ApiFlavor::Okta, &SyncFault::RetryLater);
    let now = Utc::now();

    // Racha joven: se registra sin deshabilitar.
    let young_streak = Some(now - Duration::hours(23));
    assert_eq!(directory_action(&classified, young_streak, now), DirectoryAction::Record);

    // Racha de 24 h ininterrumpida: escala a deshabilitación.
    let old_streak = Some(now - Duration::hours(24));
    assert_eq!(directory_action(&classified, old_streak, now), DirectoryAction::Disable);
}

#[test]
fn certify_entra_envelope_preserves_native_codes() {
    let body = json!({
        "error": {
            "code": "Authorization_RequestDenied",
            "message": "Insufficient privileges to complete the operation.",
            "innerError": { "code": "InsufficientPermissions" }
        }
    });
    let classified = classify(ApiFlavor::MicrosoftGraph, &SyncFault::Status { status: 403, body });

    assert_eq!(classified.kind, FaultKind::ClientError);
    assert_eq!(
        classified.message,
        "HTTP 403 - Authorization_RequestDenied (InsufficientPermissions): Insufficient privileges to complete the operation."
    );
}

#[test]
fn certify_google_envelope_preserves_code_and_reason() {
    let body = json!({
        "error": {
            "code": 403,
            "message": "Not Authorized to access this resource/api",
            "errors": [ { "reason": "forbidden" }, { "reason": "ignored" } ]
        }
    });
    let classified = classify(ApiFlavor::GoogleDirectory, &SyncFault::Status { status: 403, body });

    assert_eq!(
        classified.message,
        "HTTP 403 - 403 (forbidden): Not Authorized to access this resource/api"
    );
}

#[test]
fn certify_okta_envelope_preserves_error_code_and_summary() {
    let body = json!({
        "errorCode": "E0000011",
        "errorSummary": "Invalid token provided",
        "errorLink": "E0000011",
        "errorId": "abc"
    });
    let classified = classify(ApiFlavor::Okta, &SyncFault::Status { status: 400, body });

    assert_eq!(classified.message, "HTTP 400 - E0000011: Invalid token provided");
}

#[test]
fn certify_transport_faults_are_transient() {
    for transport in [
        TransportFault::Nxdomain,
        TransportFault::Timeout,
        TransportFault::ConnectionRefused,
        TransportFault::Closed,
        TransportFault::TlsAlert,
        TransportFault::HostUnreachable,
        TransportFault::NetUnreachable,
    ] {
        let classified = classify(ApiFlavor::WorkOs, &SyncFault::Transport(transport));
        assert_eq!(classified.kind, FaultKind::Transient, "{transport:?}");
        assert!(classified.message.starts_with("WorkOS API is unreachable:"), "{}", classified.message);
    }
}

#[test]
fn certify_missing_scopes_message_is_actionable() {
    let fault = SyncFault::MissingScopes {
        missing: vec!["Directory.Read.All".to_string(), "User.Read.All".to_string()],
    };
    let classified = classify(ApiFlavor::MicrosoftGraph, &fault);

    assert_eq!(classified.kind, FaultKind::ClientError);
    assert!(classified.message.contains("Directory.Read.All, User.Read.All"), "{}", classified.message);
}

#[test]
fn certify_circuit_breaker_vetoes_wipe_plans() {
    // Instantánea remota vacía contra 3 identidades locales vivas.
    let destructive_plan = ProviderSyncPlan {
        identities: cerberus_domain_models::IdentitySyncPlan {
            insert: Vec::new(),
            update: Vec::new(),
            delete: vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()],
        },
        ..ProviderSyncPlan::default()
    };

    let fault = assert_plan_is_not_destructive(&destructive_plan, 3, 0)
        .expect_err("a full wipe must trip the breaker");

    let classified = classify(ApiFlavor::GoogleDirectory, &fault);
    assert_eq!(classified.kind, FaultKind::ClientError);
    assert!(classified.message.contains("refusing to apply a destructive plan"));

    // Un recambio legítimo (hay inserts) no dispara el veto.
    let turnover_plan = ProviderSyncPlan {
        identities: cerberus_domain_models::IdentitySyncPlan {
            insert: vec![cerberus_domain_models::RemoteUser {
                provider_identifier: "U1".into(),
                email: "a@x".into(),
                actor_name: "A".into(),
            }],
            update: Vec::new(),
            delete: vec![Uuid::new_v4()],
        },
        ..ProviderSyncPlan::default()
    };
    assert!(assert_plan_is_not_destructive(&turnover_plan, 1, 0).is_ok());
}
// FIN DEL ARCHIVO [tests/mirror/libs/domain/sync/classifier_matrix.test.rs]
