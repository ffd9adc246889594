//! Router tests driven through `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use medbot::{router, AppContext};
use medbot_core::{AppError, AppResult};
use medbot_knowledge::{AnswerGenerator, ConversationTurn};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const INDEX: &str = "medical-chatbot";

/// Answers with a canned reply, failing on questions containing "fail".
#[derive(Default)]
struct StubGenerator {
    asked: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl AnswerGenerator for StubGenerator {
    async fn answer(&self, question: &str) -> AppResult<ConversationTurn> {
        self.asked.lock().unwrap().push(question.to_string());
        if question.contains("fail") {
            return Err(AppError::Llm("Groq API error (500): boom".to_string()));
        }
        if question.contains("down") {
            return Err(AppError::UpstreamUnavailable(
                "Groq request failed: connection refused".to_string(),
            ));
        }
        Ok(ConversationTurn {
            question: question.to_string(),
            answer: format!("answer to {}", question),
        })
    }
}

fn ready_app() -> (Router, Arc<StubGenerator>) {
    let generator = Arc::new(StubGenerator::default());
    let context = AppContext::ready(INDEX, generator.clone());
    (router(context), generator)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_root_message() {
    let (app, _) = ready_app();
    let (status, body) = send(app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Medical Chatbot API is running."}));
}

#[tokio::test]
async fn test_health_before_startup() {
    let app = router(AppContext::new(INDEX));
    let (status, body) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "ok", "pinecone_index": INDEX, "model_ready": false})
    );
}

#[tokio::test]
async fn test_health_after_startup() {
    let context = AppContext::new(INDEX);
    context
        .mark_ready(Arc::new(StubGenerator::default()))
        .unwrap();

    let (_, body) = send(router(context), get("/health")).await;
    assert_eq!(body["model_ready"], json!(true));
    assert_eq!(body["pinecone_index"], json!(INDEX));
}

#[tokio::test]
async fn test_ask_before_startup() {
    let app = router(AppContext::new(INDEX));
    let (status, body) = send(app, post_json("/ask/", json!({"question": "What is acne?"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Model not initialized yet."}));
}

#[tokio::test]
async fn test_ask_trims_question() {
    let (app, generator) = ready_app();
    let (status, body) = send(
        app,
        post_json("/ask/", json!({"question": "  What is acne?\n"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"question": "What is acne?", "answer": "answer to What is acne?"})
    );
    assert_eq!(*generator.asked.lock().unwrap(), vec!["What is acne?"]);
}

#[tokio::test]
async fn test_ask_rejects_empty_question() {
    for question in ["", "   ", "\n\t"] {
        let (app, generator) = ready_app();
        let (status, body) = send(app, post_json("/ask/", json!({"question": question}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "Question cannot be empty."}));
        assert!(generator.asked.lock().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_ask_rejects_malformed_body() {
    let (app, _) = ready_app();
    let (status, body) = send(app, post_json("/ask/", json!({"text": "hi"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_ask_downstream_errors() {
    let (app, _) = ready_app();
    let (status, body) = send(app, post_json("/ask/", json!({"question": "please fail"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["detail"].as_str().unwrap().contains("boom"));

    let (app, _) = ready_app();
    let (status, _) = send(app, post_json("/ask/", json!({"question": "is it down"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_questions_in_order_with_inline_error() {
    let (app, generator) = ready_app();
    let (status, body) = send(
        app,
        get("/questions/?questions=What%20is%20acne%3F&questions=please+fail"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let turns = body.as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["question"], json!("What is acne?"));
    assert_eq!(turns[0]["answer"], json!("answer to What is acne?"));
    assert_eq!(turns[1]["question"], json!("please fail"));
    assert!(turns[1]["answer"].as_str().unwrap().starts_with("Error: "));

    assert_eq!(
        *generator.asked.lock().unwrap(),
        vec!["What is acne?", "please fail"]
    );
}

#[tokio::test]
async fn test_questions_blank_entry_inline() {
    let (app, generator) = ready_app();
    let (status, body) = send(app, get("/questions/?questions=+&questions=gout")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body[0]["answer"],
        json!("Error: Question cannot be empty.")
    );
    assert_eq!(body[1]["answer"], json!("answer to gout"));
    assert_eq!(*generator.asked.lock().unwrap(), vec!["gout"]);
}

#[tokio::test]
async fn test_questions_empty_list() {
    let (app, _) = ready_app();
    let (status, body) = send(app, get("/questions/")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"detail": "Questions list cannot be empty."}));
}

#[tokio::test]
async fn test_questions_before_startup() {
    let app = router(AppContext::new(INDEX));
    let (status, body) = send(app, get("/questions/")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Model not initialized yet."}));
}

#[tokio::test]
async fn test_cors_headers() {
    let (app, _) = ready_app();
    let request = Request::builder()
        .uri("/")
        .header("origin", "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
