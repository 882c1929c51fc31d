// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::gcs::{GcsClient, TokenSource};
use mockito::Matcher;

fn client(server: &mockito::Server) -> GcsClient {
    GcsClient::with_base_url("testproject", TokenSource::fixed("t"), server.url())
}

async fn stub_listing(server: &mut mockito::Server, items: serde_json::Value) -> mockito::Mock {
    server
        .mock("GET", "/b")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("project".into(), "testproject".into()),
            Matcher::UrlEncoded("prefix".into(), "intervene-dev-intp".into()),
        ]))
        .with_body(serde_json::json!({ "items": items }).to_string())
        .create_async()
        .await
}

#[tokio::test]
async fn stale_buckets_are_deleted() {
    let mut server = mockito::Server::new_async().await;
    let _listing = stub_listing(
        &mut server,
        serde_json::json!([
            {"name": "intervene-dev-intpold-work", "timeCreated": "2020-01-01T00:00:00Z"},
            {"name": "intervene-dev-intpnew-work", "timeCreated": chrono::Utc::now().to_rfc3339()}
        ]),
    )
    .await;
    let _m2 = server
        .mock("GET", "/b/intervene-dev-intpold-work/o")
        .with_body("{\"items\": []}")
        .create_async()
        .await;
    let delete_old = server
        .mock("DELETE", "/b/intervene-dev-intpold-work")
        .with_status(204)
        .create_async()
        .await;
    let delete_new = server
        .mock("DELETE", "/b/intervene-dev-intpnew-work")
        .expect(0)
        .create_async()
        .await;

    bucket_clean_up(&client(&server), "intervene-dev-intp").await.unwrap();
    delete_old.assert_async().await;
    delete_new.assert_async().await;
}

#[tokio::test]
async fn per_bucket_failures_do_not_stop_the_sweep() {
    let mut server = mockito::Server::new_async().await;
    let _listing = stub_listing(
        &mut server,
        serde_json::json!([
            {"name": "intervene-dev-intpbad-work", "timeCreated": "2020-01-01T00:00:00Z"},
            {"name": "intervene-dev-intpgood-work", "timeCreated": "2020-01-01T00:00:00Z"}
        ]),
    )
    .await;
    let mut object_listings = Vec::new();
    for bucket in ["intervene-dev-intpbad-work", "intervene-dev-intpgood-work"] {
        let mock = server
            .mock("GET", format!("/b/{bucket}/o").as_str())
            .with_body("{\"items\": []}")
            .create_async()
            .await;
        object_listings.push(mock);
    }
    let _m4 = server
        .mock("DELETE", "/b/intervene-dev-intpbad-work")
        .with_status(500)
        .create_async()
        .await;
    let delete_good = server
        .mock("DELETE", "/b/intervene-dev-intpgood-work")
        .with_status(204)
        .create_async()
        .await;

    bucket_clean_up(&client(&server), "intervene-dev-intp").await.unwrap();
    delete_good.assert_async().await;
}

#[tokio::test]
async fn buckets_without_a_creation_time_are_skipped() {
    let mut server = mockito::Server::new_async().await;
    let _listing = stub_listing(
        &mut server,
        serde_json::json!([{"name": "intervene-dev-intpmystery-work"}]),
    )
    .await;
    let delete = server
        .mock("DELETE", "/b/intervene-dev-intpmystery-work")
        .expect(0)
        .create_async()
        .await;

    bucket_clean_up(&client(&server), "intervene-dev-intp").await.unwrap();
    delete.assert_async().await;
}
