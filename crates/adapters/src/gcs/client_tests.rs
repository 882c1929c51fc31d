// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use mockito::Matcher;

fn client(server: &mockito::Server) -> GcsClient {
    GcsClient::with_base_url("testproject", TokenSource::fixed("test-token"), server.url())
}

#[tokio::test]
async fn bucket_exists_maps_status_codes() {
    let mut server = mockito::Server::new_async().await;
    let found = server
        .mock("GET", "/b/there")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body("{\"name\": \"there\"}")
        .create_async()
        .await;
    let missing = server
        .mock("GET", "/b/gone")
        .with_status(404)
        .create_async()
        .await;

    let gcs = client(&server);
    assert!(gcs.bucket_exists("there").await.unwrap());
    assert!(!gcs.bucket_exists("gone").await.unwrap());
    found.assert_async().await;
    missing.assert_async().await;
}

#[tokio::test]
async fn bucket_exists_propagates_server_errors() {
    let mut server = mockito::Server::new_async().await;
    let _m1 = server
        .mock("GET", "/b/broken")
        .with_status(503)
        .with_body("try later")
        .create_async()
        .await;

    let err = client(&server).bucket_exists("broken").await.unwrap_err();
    match err {
        GcsError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "try later");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn create_bucket_posts_the_config() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/b")
        .match_query(Matcher::UrlEncoded("project".into(), "testproject".into()))
        .match_body(Matcher::PartialJson(serde_json::json!({
            "name": "intervene-dev-intptest01-work",
            "location": "europe-west2",
            "iamConfiguration": {
                "uniformBucketLevelAccess": {"enabled": true},
                "publicAccessPrevention": "enforced"
            },
            "softDeletePolicy": {"retentionDurationSeconds": "0"}
        })))
        .with_status(200)
        .with_body("{\"name\": \"intervene-dev-intptest01-work\"}")
        .create_async()
        .await;

    let bucket = Bucket {
        name: "intervene-dev-intptest01-work".to_string(),
        location: Some("europe-west2".to_string()),
        lifecycle: Some(Lifecycle {
            rule: vec![LifecycleRule::abort_multipart_after(1)],
        }),
        iam_configuration: Some(IamConfiguration::locked_down()),
        soft_delete_policy: Some(SoftDeletePolicy::disabled()),
        time_created: None,
    };
    client(&server).create_bucket(&bucket).await.unwrap();
    mock.assert_async().await;
}

#[test]
fn lifecycle_rules_serialize_to_the_wire_shape() {
    let rule = LifecycleRule::delete_by_suffix(1, &[".vcf", ".pgen"]);
    let value = serde_json::to_value(&rule).unwrap();
    assert_eq!(value["action"]["type"], "Delete");
    assert_eq!(value["condition"]["age"], 1);
    assert_eq!(value["condition"]["matchesSuffix"][0], ".vcf");

    let abort = LifecycleRule::abort_multipart_after(1);
    let value = serde_json::to_value(&abort).unwrap();
    assert_eq!(value["action"]["type"], "AbortIncompleteMultipartUpload");
    assert!(value["condition"].get("matchesSuffix").is_none());
}

#[tokio::test]
async fn list_objects_follows_pagination() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/b/bkt/o")
        .match_query(Matcher::Exact(String::new()))
        .with_body(
            serde_json::json!({
                "items": [{"name": "a"}, {"name": "b"}],
                "nextPageToken": "tok2"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/b/bkt/o")
        .match_query(Matcher::UrlEncoded("pageToken".into(), "tok2".into()))
        .with_body(serde_json::json!({"items": [{"name": "c"}]}).to_string())
        .create_async()
        .await;

    let names = client(&server).list_objects("bkt").await.unwrap();
    assert_eq!(names, ["a", "b", "c"]);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn delete_object_percent_encodes_the_name() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/b/bkt/o/data%2Fhi.pgen")
        .with_status(204)
        .create_async()
        .await;

    client(&server).delete_object("bkt", "data/hi.pgen").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn force_delete_empties_the_bucket_first() {
    let mut server = mockito::Server::new_async().await;
    let _m2 = server
        .mock("GET", "/b/bkt/o")
        .with_body(serde_json::json!({"items": [{"name": "a"}, {"name": "b"}]}).to_string())
        .create_async()
        .await;
    let delete_a = server
        .mock("DELETE", "/b/bkt/o/a")
        .with_status(204)
        .create_async()
        .await;
    let delete_b = server
        .mock("DELETE", "/b/bkt/o/b")
        .with_status(204)
        .create_async()
        .await;
    let delete_bucket = server
        .mock("DELETE", "/b/bkt")
        .with_status(204)
        .create_async()
        .await;

    client(&server).delete_bucket_force("bkt").await.unwrap();
    delete_a.assert_async().await;
    delete_b.assert_async().await;
    delete_bucket.assert_async().await;
}

#[tokio::test]
async fn list_buckets_filters_by_prefix() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/b")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("project".into(), "testproject".into()),
            Matcher::UrlEncoded("prefix".into(), "intervene-dev-intp".into()),
        ]))
        .with_body(
            serde_json::json!({
                "items": [
                    {"name": "intervene-dev-intpa-work", "timeCreated": "2024-01-01T00:00:00Z"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let buckets = client(&server)
        .list_buckets(Some("intervene-dev-intp"))
        .await
        .unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].name, "intervene-dev-intpa-work");
    assert!(buckets[0].time_created.is_some());
    mock.assert_async().await;
}
