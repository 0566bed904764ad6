mod support;

use serde_json::json;
use support::{Reply, StubServer};
use zimage::{
    ApiClient, ApiResponse, AuthTokens, Config, GenerateRequest, GenerateSuccess, ImageGenerator,
    ImageService,
};

fn generator(stub: &StubServer) -> ImageGenerator {
    let config = Config::new()
        .with_gitee_base_url(stub.url("/v1"))
        .with_spaces(stub.url("/z"), stub.url("/q"))
        .with_upscale_url(stub.base_url.clone());
    ImageGenerator::new(config).unwrap()
}

#[actix_web::test]
async fn gitee_end_to_end() {
    let stub = StubServer::start(vec![(
        "POST",
        "/v1/images/generations",
        Reply::json(200, json!({"data": [{"url": "http://img/1.png"}]})),
    )])
    .await;

    let response = generator(&stub)
        .dispatch(
            GenerateRequest::new("gitee", "a cat"),
            &AuthTokens::new().with_api_key("sk-test"),
        )
        .await;
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"success": true, "data": {"url": "http://img/1.png"}})
    );
}

#[actix_web::test]
async fn huggingface_qwen_end_to_end() {
    let stub = StubServer::start(vec![
        (
            "POST",
            "/q/gradio_api/call/generate_image",
            Reply::json(200, json!({"event_id": "abc"})),
        ),
        (
            "GET",
            "/q/gradio_api/call/generate_image/abc",
            Reply::events("event: complete\ndata: [{\"url\":\"http://img/2.png\"},7]\n"),
        ),
    ])
    .await;

    let response = generator(&stub)
        .dispatch(
            GenerateRequest::new("huggingface", "a cat").with_model("qwen"),
            &AuthTokens::new(),
        )
        .await;
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"success": true, "data": {"url": "http://img/2.png", "seed": 7}})
    );
}

#[actix_web::test]
async fn hf_qwen_alias_reaches_the_qwen_space() {
    let stub = StubServer::start(vec![
        (
            "POST",
            "/q/gradio_api/call/generate_image",
            Reply::json(200, json!({"event_id": "e"})),
        ),
        (
            "GET",
            "/q/gradio_api/call/generate_image/e",
            Reply::events("event: complete\ndata: [{\"url\":\"http://img/q.png\"},3]\n"),
        ),
    ])
    .await;

    let response = generator(&stub)
        .dispatch(
            GenerateRequest::new("hf-qwen", "a cat"),
            // The Gitee key must not leak into the queue calls.
            &AuthTokens::new().with_api_key("sk-test"),
        )
        .await;
    assert!(response.is_success());
    for sent in stub.requests() {
        assert!(sent.path.starts_with("/q/"));
        assert_eq!(sent.header("authorization"), None);
    }
}

#[actix_web::test]
async fn quota_failure_collapses_to_its_message() {
    let stub = StubServer::start(vec![
        (
            "POST",
            "/z/gradio_api/call/generate_image",
            Reply::json(200, json!({"event_id": "e"})),
        ),
        (
            "GET",
            "/z/gradio_api/call/generate_image/e",
            Reply::events("event: error\ndata: null\n"),
        ),
    ])
    .await;

    let response = generator(&stub)
        .dispatch(GenerateRequest::new("hf-zimage", "a cat"), &AuthTokens::new())
        .await;
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"success": false, "error": "Quota exhausted, please set HF Token"})
    );
}

#[actix_web::test]
async fn generator_upscales_through_the_configured_service() {
    let stub = StubServer::start(vec![(
        "POST",
        "/api/upscale",
        Reply::json(200, json!({"url": "http://img/4x.png"})),
    )])
    .await;

    let response = generator(&stub)
        .upscale("http://img/1.png", 4, Some("hf_abc"))
        .await;
    assert_eq!(response.data().and_then(|d| d.url.as_deref()), Some("http://img/4x.png"));

    let sent = &stub.requests()[0];
    assert_eq!(sent.header("x-hf-token"), Some("hf_abc"));
    assert_eq!(sent.json(), json!({"url": "http://img/1.png", "scale": 4}));
}

#[actix_web::test]
async fn api_client_attaches_api_key_only_when_present() {
    let stub = StubServer::start(vec![(
        "POST",
        "/api/generate",
        Reply::json(200, json!({"url": "http://img/1.png"})),
    )])
    .await;
    let client = ApiClient::new(stub.base_url.clone());

    let with_key = client
        .generate(
            GenerateRequest::new("gitee", "a cat"),
            &AuthTokens::new().with_api_key("sk-test").with_hf_token("hf_abc"),
        )
        .await;
    assert_eq!(
        with_key,
        ApiResponse::Success(GenerateSuccess {
            url: Some("http://img/1.png".into()),
            ..Default::default()
        })
    );
    client
        .generate(GenerateRequest::new("gitee", "a cat"), &AuthTokens::new())
        .await;

    let requests = stub.requests();
    assert_eq!(requests[0].header("x-api-key"), Some("sk-test"));
    assert_eq!(requests[0].header("x-hf-token"), None);
    assert_eq!(requests[0].json()["provider"], "gitee");
    assert_eq!(requests[0].json()["model"], "z-image-turbo");
    assert_eq!(requests[1].header("x-api-key"), None);
}

#[actix_web::test]
async fn api_client_surfaces_server_errors() {
    let stub = StubServer::start(vec![
        (
            "POST",
            "/api/generate",
            Reply::json(401, json!({"error": "API Key is required for Gitee AI"})),
        ),
        ("POST", "/api/upscale", Reply::status(500, "oops")),
    ])
    .await;
    let client = ApiClient::new(stub.base_url.clone());

    let response = client
        .generate(GenerateRequest::new("gitee", "a cat"), &AuthTokens::new())
        .await;
    assert_eq!(response.error(), Some("API Key is required for Gitee AI"));

    let response = client.upscale("http://img/1.png", 4, None).await;
    assert_eq!(response.error(), Some("Failed to upscale image"));
}
