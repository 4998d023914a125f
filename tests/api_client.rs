use datahub_lib::api::{ApiClient, NewDataset};
use datahub_lib::transfer::{UploadCompleteRequest, UploadedFileRecord};
use datahub_lib::DataHubError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn login_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "admin", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-123"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None).unwrap();
    assert_eq!(client.login("admin", "secret").await.unwrap(), "tok-123");
}

#[tokio::test]
async fn missing_dataset_maps_to_api_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/datasets/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Dataset not found"})))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok".into())).unwrap();
    let err = client.get_dataset("ghost").await.unwrap_err();

    assert!(err.is_not_found());
    match err {
        DataHubError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Dataset not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn plain_text_error_body_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/datasets"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None).unwrap();
    let err = client.list_datasets().await.unwrap_err();
    assert_eq!(err.to_string(), "API Error (502): Bad Gateway");
}

#[tokio::test]
async fn check_auth_is_false_on_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/check"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Unauthorized"})))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("stale".into())).unwrap();
    assert!(!client.check_auth().await.unwrap());
}

#[tokio::test]
async fn upload_complete_sends_records_and_total() {
    let server = MockServer::start().await;
    let expected = json!({
        "files": [{
            "name": "info.json",
            "path": "meta/info.json",
            "size": 42,
            "url": "https://b.cos.ap-shanghai.myqcloud.com/datasets/d/meta/info.json"
        }],
        "totalSize": 42
    });
    Mock::given(method("POST"))
        .and(path("/api/datasets/d/upload-complete"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "d",
            "name": "D",
            "author": "lab",
            "size": "42.00 B"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = UploadCompleteRequest {
        files: vec![UploadedFileRecord {
            name: "info.json".into(),
            path: "meta/info.json".into(),
            size_bytes: 42,
            url: "https://b.cos.ap-shanghai.myqcloud.com/datasets/d/meta/info.json".into(),
            preview_data: None,
        }],
        total_size: 42,
    };

    let client = ApiClient::new(&server.uri(), Some("tok".into())).unwrap();
    let updated = client.upload_complete("d", &request).await.unwrap();
    assert_eq!(updated.size.as_deref(), Some("42.00 B"));
}

#[tokio::test]
async fn create_and_delete_dataset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/datasets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "pick-place", "name": "Pick Place"})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/datasets/pick-place"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok".into())).unwrap();
    let created = client
        .create_dataset(&NewDataset::named("Pick Place", "lab"))
        .await
        .unwrap();
    assert_eq!(created.id, "pick-place");

    client.delete_dataset("pick-place").await.unwrap();
}
