use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};
use mockito::{Matcher, Server};
use relay_transform::config::QWEN_CLIENT_ID;
use relay_transform::{Credential, CredentialStore, OAuthClient, TransformError};

const TOKEN_PATH: &str = "/api/v1/oauth2/token";

fn write_credential(path: &Path, credential: &Credential) {
    std::fs::write(path, serde_json::to_string_pretty(credential).unwrap()).unwrap();
}

fn expired_credential() -> Credential {
    let expiry = (Utc::now() - Duration::minutes(5)).timestamp_millis();
    Credential::new("stale-access", "refresh-123", expiry)
}

fn store(server: &Server, path: &Path) -> CredentialStore {
    let oauth = OAuthClient::new(format!("{}{}", server.url(), TOKEN_PATH), QWEN_CLIENT_ID).unwrap();
    CredentialStore::new(path, oauth)
}

#[tokio::test]
async fn test_expired_credential_refreshed_once() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .match_header("content-type", "application/json")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("client_id".into(), QWEN_CLIENT_ID.into()),
            Matcher::UrlEncoded("refresh_token".into(), "refresh-123".into()),
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"fresh-access","token_type":"Bearer","expires_in":3600}"#)
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oauth_creds.json");
    write_credential(&path, &expired_credential());
    let store = store(&server, &path);

    let before = Utc::now().timestamp_millis();
    let credential = store.ensure_fresh().await.unwrap().unwrap();
    let after = Utc::now().timestamp_millis();

    mock.assert_async().await;
    assert_eq!(credential.access_token, "fresh-access");
    assert_eq!(credential.refresh_token, "refresh-123");
    let expiry = credential.expiry_date.unwrap();
    assert!(expiry >= before + 3_600_000 - 60_000);
    assert!(expiry <= after + 3_600_000 - 60_000);

    // a second call sees the fresh token and stays off the network
    let again = store.ensure_fresh().await.unwrap().unwrap();
    assert_eq!(again, credential);
}

#[tokio::test]
async fn test_refresh_persists_pretty_json() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", TOKEN_PATH)
        .with_status(200)
        .with_body(r#"{"access_token":"fresh","refresh_token":"rotated","expires_in":60,"resource_url":"portal.qwen.ai"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("oauth_creds.json");
    let store = store(&server, &path);

    store.refresh("original").await.unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("\n  \"access_token\": \"fresh\""));
    let on_disk: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(on_disk["refresh_token"], "original");
    assert_eq!(on_disk["resource_url"], "portal.qwen.ai");
    assert!(on_disk["expiry_date"].is_i64());
    assert!(on_disk.get("expires_in").is_none());

    // a new store reads back what was written
    let reloaded = CredentialStore::new(&path, OAuthClient::new("http://unused", "x").unwrap());
    reloaded.load().await;
    assert_eq!(reloaded.current().await, store.current().await);
}

#[tokio::test]
async fn test_refresh_rejection_propagates() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", TOKEN_PATH)
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant"}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oauth_creds.json");
    write_credential(&path, &expired_credential());
    let store = store(&server, &path);

    let err = store.ensure_fresh().await.unwrap_err();

    match err {
        TransformError::OAuthRejected { status, body } => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("Expected OAuthRejected, got {:?}", other),
    }
    // stale record is kept and the file is untouched
    assert_eq!(store.current().await.unwrap().access_token, "stale-access");
}

#[tokio::test]
async fn test_network_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oauth_creds.json");
    write_credential(&path, &expired_credential());
    // nothing listens on the discard port
    let oauth = OAuthClient::new("http://127.0.0.1:9/token", QWEN_CLIENT_ID).unwrap();
    let store = CredentialStore::new(&path, oauth);

    let err = store.ensure_fresh().await.unwrap_err();

    assert!(matches!(err, TransformError::Http(_)));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .with_status(200)
        .with_body(r#"{"access_token":"fresh","expires_in":3600}"#)
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oauth_creds.json");
    write_credential(&path, &expired_credential());
    let store = Arc::new(store(&server, &path));

    let (a, b, c) = tokio::join!(store.ensure_fresh(), store.ensure_fresh(), store.ensure_fresh());

    mock.assert_async().await;
    for result in [a, b, c] {
        assert_eq!(result.unwrap().unwrap().access_token, "fresh");
    }
}
