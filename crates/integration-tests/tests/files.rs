//! Files API and context injection flows

mod harness;

use harness::mock_openai::MockOpenAi;
use harness::server::TestServer;

const CSV: &str = "Date,Product,Sales\n2024-01-01,A,150\n2024-01-02,B,200";

async fn upload_csv(server: &TestServer) -> serde_json::Value {
    let form = reqwest::multipart::Form::new()
        .part(
            "file",
            reqwest::multipart::Part::text(CSV)
                .file_name("sales.csv")
                .mime_str("text/csv")
                .unwrap(),
        )
        .text("purpose", "assistants");

    server
        .client()
        .post(server.url("/v1/files"))
        .bearer_auth(harness::TEST_API_KEY)
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn upload_then_fetch_metadata_and_content() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let uploaded = upload_csv(&server).await;
    let id = uploaded["id"].as_str().unwrap();

    assert!(id.starts_with("file-"));
    assert_eq!(uploaded["object"], "file");
    assert_eq!(uploaded["filename"], "sales.csv");
    assert_eq!(uploaded["purpose"], "assistants");
    assert_eq!(uploaded["bytes"], CSV.len() as u64);
    assert_eq!(uploaded["status"], "processed");

    let metadata: serde_json::Value = server
        .get(&format!("/v1/files/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(metadata["id"], id);

    let content = server
        .get(&format!("/v1/files/{id}/content"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        content.headers().get("content-type").unwrap().to_str().unwrap(),
        "text/csv"
    );
    assert_eq!(content.text().await.unwrap(), CSV);
}

#[tokio::test]
async fn listing_filters_by_purpose() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    upload_csv(&server).await;

    let listed: serde_json::Value = server
        .get("/v1/files?purpose=assistants")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["object"], "list");
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let empty: serde_json::Value = server
        .get("/v1/files?purpose=batch")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(empty["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn chat_with_file_ids_injects_the_framed_preamble() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let uploaded = upload_csv(&server).await;
    let id = uploaded["id"].as_str().unwrap();

    let response = server
        .post_json(
            "/v1/chat/completions",
            &serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "Summarize"}],
                "file_ids": [id]
            }),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // The first user message the provider saw starts with the framed
    // preamble and carries the CSV header line verbatim
    let seen = mock.last_request().unwrap();
    let content = seen["messages"][0]["content"].as_str().unwrap();
    assert!(content.starts_with("=== UPLOADED FILES CONTEXT ==="));
    assert!(content.contains("Date,Product,Sales"));
    assert!(content.contains("sales.csv"));
    assert!(content.ends_with("Summarize"));
}

#[tokio::test]
async fn unknown_file_id_fails_the_chat_request() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let response = server
        .post_json(
            "/v1/chat/completions",
            &serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "Summarize"}],
                "file_ids": ["file-00000000000000000000000000000000"]
            }),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "file_not_found");
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn malformed_file_id_is_a_validation_error() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let response = server
        .post_json(
            "/v1/chat/completions",
            &serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "Summarize"}],
                "file_ids": ["upload-123"]
            }),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "validation");
}

#[tokio::test]
async fn delete_removes_the_artifact() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let uploaded = upload_csv(&server).await;
    let id = uploaded["id"].as_str().unwrap();

    let deleted: serde_json::Value = server
        .client()
        .delete(server.url(&format!("/v1/files/{id}")))
        .bearer_auth(harness::TEST_API_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted["deleted"], true);

    let missing = server.get(&format!("/v1/files/{id}")).send().await.unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn files_health_probe_reports_backend() {
    let mock = MockOpenAi::start().await.unwrap();
    let server = TestServer::start(&mock.base_url()).await.unwrap();

    let health: serde_json::Value = server
        .get("/v1/files/health")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["storage"], "memory");
}
