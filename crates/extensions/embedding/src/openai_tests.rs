use super::*;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer, dimension: usize) -> OpenAIEmbedding {
    OpenAIEmbedding::new(
        OpenAIEmbeddingConfig::new("test-key")
            .with_base_url(server.uri())
            .with_dimension(dimension),
    )
    .unwrap()
}

#[test]
fn test_config_defaults() {
    let config = OpenAIEmbeddingConfig::new("test-key");
    assert_eq!(config.model, "text-embedding-3-small");
    assert_eq!(config.dimension, 1536);
    assert_eq!(config.base_url, "https://api.openai.com/v1");
}

#[test]
fn test_config_builder_trims_slash() {
    let config = OpenAIEmbeddingConfig::new("key")
        .with_model("text-embedding-3-large")
        .with_dimension(3072)
        .with_base_url("https://custom.api.com/v1/");
    assert_eq!(config.model, "text-embedding-3-large");
    assert_eq!(config.dimension, 3072);
    assert_eq!(config.base_url, "https://custom.api.com/v1");
}

#[tokio::test]
async fn test_embed_batch_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"embedding": [0.1, 0.2, 0.3]},
                {"embedding": [0.4, 0.5, 0.6]}
            ]
        })))
        .mount(&server)
        .await;

    let embeddings = provider(&server, 3).embed_batch(&["a", "b"]).await.unwrap();
    assert_eq!(embeddings.len(), 2);
    assert_eq!(embeddings[1].vector, vec![0.4, 0.5, 0.6]);
}

#[tokio::test]
async fn test_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = provider(&server, 3).embed("text").await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_dimension_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"embedding": [0.1, 0.2]}]
        })))
        .mount(&server)
        .await;

    let err = provider(&server, 3).embed("text").await.unwrap_err();
    assert!(err.to_string().contains("Dimension mismatch"));
}

#[tokio::test]
async fn test_empty_batch_skips_request() {
    let server = MockServer::start().await;
    let result = provider(&server, 3).embed_batch(&[]).await.unwrap();
    assert!(result.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}
