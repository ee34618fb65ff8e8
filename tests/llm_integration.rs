use axum_chat_widget::llm::{ChatCompletionsGenerator, LlmSettings, Provider, ReplyGenerator, Turn};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(base_url: String, provider: Provider, api_key: Option<&str>) -> LlmSettings {
    LlmSettings {
        base_url,
        api_key: api_key.map(ToString::to_string),
        model: "test-model".to_string(),
        provider,
        temperature: 0.7,
        top_p: 0.95,
        max_tokens: 500,
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_generates_from_history() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "stream": false,
            "max_tokens": 500,
            "messages": [
                { "role": "system", "content": "Be brief." },
                { "role": "user", "content": "hi" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Hello there!\n")))
        .expect(1)
        .mount(&llm)
        .await;

    let generator =
        ChatCompletionsGenerator::new(settings(llm.uri(), Provider::Generic, Some("sk-test")));
    let reply = generator
        .generate(&[Turn::system("Be brief."), Turn::user("hi")])
        .await
        .unwrap();

    assert_eq!(reply, "Hello there!");
}

#[tokio::test]
async fn test_azure_uses_deployment_url_and_api_key_header() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/chat-dep/chat/completions"))
        .and(query_param("api-version", "2024-08-01-preview"))
        .and(header("api-key", "azure-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
        .expect(1)
        .mount(&llm)
        .await;

    let provider = Provider::AzureOpenAI {
        deployment_name: "chat-dep".to_string(),
        api_version: "2024-08-01-preview".to_string(),
    };
    let generator = ChatCompletionsGenerator::new(settings(llm.uri(), provider, Some("azure-key")));

    assert_eq!(generator.generate(&[Turn::user("hi")]).await.unwrap(), "ok");
}

#[tokio::test]
async fn test_error_status_fails() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "error": "slow down" })))
        .mount(&llm)
        .await;

    let generator = ChatCompletionsGenerator::new(settings(llm.uri(), Provider::Generic, None));
    assert!(generator.generate(&[Turn::user("hi")]).await.is_err());
}

#[tokio::test]
async fn test_missing_content_fails() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&llm)
        .await;

    let generator = ChatCompletionsGenerator::new(settings(llm.uri(), Provider::Generic, None));
    let err = generator.generate(&[Turn::user("hi")]).await.unwrap_err();
    assert!(err.to_string().contains("no message content"));
}
