//! # HTTP End-to-End Flow
//!
//! Runs the API configured with an Ed25519 issuer key, as a deployment would
//! be. Disclosures are signed out-of-process, submitted to `/api/verify`,
//! and the resulting verification gates circle membership.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use rosca_api::state::{AppConfig, AppState};
use rosca_attest::{
    DisclosedAttributes, DisclosureIssuer, DocumentType, Ed25519DisclosureSigner, ProofBackend,
    VerifierConfig,
};
use rosca_core::{CountryCode, SubjectId};

const ISSUER_SEED: [u8; 32] = [42u8; 32];

fn signed_app() -> axum::Router {
    let signer = Ed25519DisclosureSigner::from_seed(&ISSUER_SEED);
    let config = AppConfig {
        backend: ProofBackend::Ed25519 {
            public_key_hex: signer.public_key_hex(),
        },
        ..AppConfig::default()
    };
    rosca_api::app(AppState::with_config(config).unwrap())
}

fn disclosure(seed: &[u8; 32], subject: &str, country: &str, age: u8) -> Value {
    let config = VerifierConfig::default();
    let issuer = DisclosureIssuer::new(
        Ed25519DisclosureSigner::from_seed(seed),
        config.scope,
        config.endpoint,
    );
    let package = issuer.issue(
        DocumentType::Passport,
        &SubjectId::new(subject).unwrap(),
        DisclosedAttributes {
            nationality_code: Some(CountryCode::new(country).unwrap()),
            age_at_verification: Some(age),
            is_unique: Some(true),
            passed_sanctions_screen: Some(true),
        },
    );
    serde_json::to_value(package.to_request()).unwrap()
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn verify_join_contribute_and_pay_out() {
    let app = signed_app();

    for (name, age) in [("A", 20), ("B", 30), ("C", 40)] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/verify",
            Some(disclosure(&ISSUER_SEED, name, "USA", age)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["credentialSubject"]["nationalityCode"], "USA");
    }

    let (status, circle) = send(
        &app,
        "POST",
        "/v1/circles",
        Some(json!({
            "monthlyAmount": "100.00",
            "maxMembers": 3,
            "durationPeriods": 3,
            "countryCode": "USA",
            "minAge": 18,
            "maxAge": 65
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = circle["id"].as_u64().unwrap();

    for name in ["A", "B", "C"] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/v1/circles/{id}/join"),
            Some(json!({ "subjectId": name })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    for (period, recipient) in ["A", "B", "C"].into_iter().enumerate() {
        for name in ["A", "B", "C"] {
            let (status, _) = send(
                &app,
                "POST",
                &format!("/v1/circles/{id}/contributions"),
                Some(json!({ "subjectId": name, "periodIndex": period })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, payout) =
            send(&app, "POST", &format!("/v1/circles/{id}/advance"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payout["recipient"], recipient);
        assert_eq!(payout["amount"], "300.00");
    }

    let (_, circle) = send(&app, "GET", &format!("/v1/circles/{id}"), None).await;
    assert_eq!(circle["phase"], "Completed");

    let (status, settled) = send(&app, "GET", &format!("/v1/payouts?circle={id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let settled = settled.as_array().unwrap();
    assert_eq!(settled.len(), 3);
    assert_eq!(settled[2]["completesCircle"], true);
}

#[tokio::test]
async fn disclosure_from_another_issuer_is_rejected() {
    let app = signed_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/verify",
        Some(disclosure(&[9u8; 32], "mallory", "USA", 30)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error_code"], "VERIFICATION_FAILED");

    let (_, verified) = send(&app, "GET", "/v1/users/mallory/verified", None).await;
    assert_eq!(verified["isVerified"], false);
}

#[tokio::test]
async fn verified_foreign_national_is_refused_at_join() {
    let app = signed_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/verify",
        Some(disclosure(&ISSUER_SEED, "D", "GBR", 30)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, circle) = send(
        &app,
        "POST",
        "/v1/circles",
        Some(json!({
            "monthlyAmount": "10",
            "maxMembers": 2,
            "durationPeriods": 2,
            "countryCode": "USA",
            "minAge": 18,
            "maxAge": 65
        })),
    )
    .await;
    let id = circle["id"].as_u64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/circles/{id}/join"),
        Some(json!({ "subjectId": "D" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "INELIGIBLE");
    assert_eq!(body["error"]["details"]["code"], "COUNTRY_MISMATCH");

    let (_, eligibility) = send(
        &app,
        "GET",
        "/v1/users/D/eligibility?country=GBR&minAge=18&maxAge=65",
        None,
    )
    .await;
    assert_eq!(eligibility["eligible"], true);
}
