//! Newsletter and contact form integration tests.
//!
//! Only paths that fail before any email is sent are exercised, so no email
//! provider account is needed.

use joy_junction_integration_tests::{client, fresh_client_key, url};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_newsletter_rejects_invalid_email() {
    let resp = client()
        .post(url("/api/newsletter"))
        .header("x-forwarded-for", fresh_client_key())
        .json(&json!({"email": "not-an-email"}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("JSON body");
    assert_eq!(body["error"], "Validation failed");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_newsletter_sixth_request_rate_limited() {
    let key = fresh_client_key();

    for _ in 0..5 {
        let resp = client()
            .post(url("/api/newsletter"))
            .header("x-forwarded-for", &key)
            .json(&json!({"email": "invalid"}))
            .send()
            .await
            .expect("Failed to send request");
        assert_ne!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let resp = client()
        .post(url("/api/newsletter"))
        .header("x-forwarded-for", &key)
        .json(&json!({"email": "invalid"}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key("retry-after"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_contact_collects_validation_details() {
    let resp = client()
        .post(url("/api/contact"))
        .json(&json!({
            "name": "",
            "email": "nope",
            "message": "hi"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("JSON body");
    assert_eq!(body["details"].as_array().map(Vec::len), Some(3));
}
