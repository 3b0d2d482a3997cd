use application::resources::RagResources;
use domain::error::RagError;
use domain::models::REFUSAL_MESSAGE;
use infrastructure::config::Config;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COLLECTION_PATH: &str = "/collections/qa_rag_data_science";
const QUERY_PATH: &str = "/collections/qa_rag_data_science/points/query";

fn config(qdrant: &MockServer, ollama: &MockServer) -> Config {
    Config {
        qdrant_url: qdrant.uri(),
        ollama_base_url: ollama.uri(),
        ..Config::default()
    }
}

async fn mount_collection(server: &MockServer, size: u64) {
    Mock::given(method("GET"))
        .and(path(COLLECTION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "status": "green",
                "points_count": 3,
                "config": { "params": { "vectors": { "size": size, "distance": "Cosine" } } }
            },
            "status": "ok"
        })))
        .mount(server)
        .await;
}

async fn mount_embedding(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .and(body_partial_json(json!({ "prompt": "query: What is overfitting?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embedding": [0.1, 0.2, 0.3, 0.4]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn answers_through_remote_services() {
    let qdrant = MockServer::start().await;
    let ollama = MockServer::start().await;
    mount_collection(&qdrant, 4).await;
    mount_embedding(&ollama).await;
    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(body_partial_json(json!({ "limit": 3, "with_payload": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "points": [
                { "id": 7, "version": 1, "score": 0.8,
                  "payload": { "text": "Overfitting occurs when a model..." } },
                { "id": 9, "version": 1, "score": 0.2,
                  "payload": { "text": "Unrelated passage" } }
            ] },
            "status": "ok"
        })))
        .mount(&qdrant)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "raw": true, "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Overfitting là hiện tượng mô hình học quá khớp.<|im_end|>",
            "done": true
        })))
        .expect(1)
        .mount(&ollama)
        .await;

    let resources = RagResources::connect(config(&qdrant, &ollama)).await.unwrap();
    assert_eq!(resources.collection().vector_size, Some(4));

    let answer = resources.service().generate_answer("What is overfitting?").await;
    assert_eq!(answer, "Overfitting là hiện tượng mô hình học quá khớp.");

    let requests = ollama.received_requests().await.unwrap();
    let generate = requests
        .iter()
        .find(|r| r.url.path() == "/api/generate")
        .unwrap();
    let body: serde_json::Value = generate.body_json().unwrap();
    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.contains("- Overfitting occurs when a model..."));
    assert!(!prompt.contains("Unrelated passage"));
    assert_eq!(body["options"]["num_predict"], 512);
    resources.shutdown();
}

#[tokio::test]
async fn store_errors_become_a_refusal() {
    let qdrant = MockServer::start().await;
    let ollama = MockServer::start().await;
    mount_collection(&qdrant, 4).await;
    mount_embedding(&ollama).await;
    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&qdrant)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "unused" })))
        .expect(0)
        .mount(&ollama)
        .await;

    let resources = RagResources::connect(config(&qdrant, &ollama)).await.unwrap();
    let answer = resources.service().generate_answer("What is overfitting?").await;
    assert_eq!(answer, REFUSAL_MESSAGE);
}

#[tokio::test]
async fn missing_collection_fails_at_startup() {
    let qdrant = MockServer::start().await;
    let ollama = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(COLLECTION_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": { "error": "Not found: Collection `qa_rag_data_science` doesn't exist!" }
        })))
        .mount(&qdrant)
        .await;

    let err = RagResources::connect(config(&qdrant, &ollama))
        .await
        .err()
        .unwrap();
    let message = format!("{err:#}");
    assert!(message.contains("qa_rag_data_science"), "{message}");
    assert!(message.contains("404"), "{message}");
}

#[tokio::test]
async fn configured_dimension_must_match_the_collection() {
    let qdrant = MockServer::start().await;
    let ollama = MockServer::start().await;
    mount_collection(&qdrant, 1024).await;

    let config = Config {
        embedding_dim: Some(768),
        ..config(&qdrant, &ollama)
    };
    let err = RagResources::connect(config).await.err().unwrap();
    assert_eq!(
        err.downcast_ref::<RagError>(),
        Some(&RagError::DimensionMismatch {
            expected: 1024,
            actual: 768
        })
    );
}
