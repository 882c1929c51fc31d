// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fixed_token_never_hits_the_network() {
    let source = TokenSource::fixed("abc");
    let http = reqwest::Client::new();
    assert_eq!(source.token(&http).await.unwrap(), "abc");
}

#[tokio::test]
async fn metadata_token_is_fetched_and_cached() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/token")
        .match_header("Metadata-Flavor", "Google")
        .with_body(
            serde_json::json!({
                "access_token": "minted",
                "expires_in": 3600,
                "token_type": "Bearer"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let source = TokenSource::metadata_at(format!("{}/token", server.url()));
    let http = reqwest::Client::new();
    assert_eq!(source.token(&http).await.unwrap(), "minted");
    // second call is served from the cache
    assert_eq!(source.token(&http).await.unwrap(), "minted");
    mock.assert_async().await;
}

#[tokio::test]
async fn metadata_errors_surface() {
    let mut server = mockito::Server::new_async().await;
    let _m1 = server
        .mock("GET", "/token")
        .with_status(403)
        .with_body("forbidden")
        .create_async()
        .await;

    let source = TokenSource::metadata_at(format!("{}/token", server.url()));
    let err = source.token(&reqwest::Client::new()).await.unwrap_err();
    assert!(matches!(err, GcsError::Status { status: 403, .. }));
}
