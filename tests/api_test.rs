//! Drives the full axum router against the in-memory store and scripted providers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use threadchat_backend::app::create_app;
use threadchat_backend::config::AuthConfig;
use threadchat_backend::errors::LlmError;
use threadchat_backend::external::llm_provider::LlmProvider;
use threadchat_backend::models::UsageCounter;
use threadchat_backend::services::llm_service::{ModelRouter, StaticSwitch};
use threadchat_backend::services::quota_service::FixedClock;
use threadchat_backend::state::{AppParts, AppState};
use threadchat_backend::store::{MemoryStore, UserStore};

struct ScriptedProvider {
    name: &'static str,
    reply: String,
    models: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(name: &'static str, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply: reply.to_string(),
            models: Mutex::new(Vec::new()),
        })
    }

    fn models(&self) -> Vec<String> {
        self.models.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(&self, model: &str, _prompt: &str) -> Result<String, LlmError> {
        self.models.lock().push(model.to_string());
        Ok(self.reply.clone())
    }
}

struct TestApp {
    app: Router,
    store: MemoryStore,
    gemini: Arc<ScriptedProvider>,
    openai: Arc<ScriptedProvider>,
    switch: Arc<StaticSwitch>,
}

fn test_app() -> TestApp {
    let store = MemoryStore::new();
    let gemini = ScriptedProvider::new("Gemini", "Rust Borrowing Explained");
    let openai = ScriptedProvider::new("OpenAI", "borrowing lets you reference data");
    let switch = Arc::new(StaticSwitch::new(true));
    let router = ModelRouter::new("gemini-2.0-flash", gemini.clone(), openai.clone(), switch.clone());

    let state = AppState::new(AppParts {
        chat_store: Arc::new(store.clone()),
        user_store: Arc::new(store.clone()),
        router: Arc::new(router),
        clock: Arc::new(FixedClock::new(Utc::now().date_naive())),
        auth: AuthConfig::new("integration-secret"),
        daily_token_limit: 10_000,
        title_model: "gemini-2.0-flash".to_string(),
    });

    TestApp {
        app: create_app(state),
        store,
        gemini,
        openai,
        switch,
    }
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Signs up `username` and returns an access token
    async fn login(&self, username: &str) -> String {
        let creds = json!({ "username": username, "password": "s3cret" });
        let (status, _) = self.call(Method::POST, "/api/signup/", None, Some(creds.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.call(Method::POST, "/api/token/", None, Some(creds)).await;
        assert_eq!(status, StatusCode::OK);
        body["access"].as_str().unwrap().to_string()
    }

    async fn store_user_id(&self, username: &str) -> Uuid {
        self.store
            .find_user_by_username(username)
            .await
            .unwrap()
            .expect("user exists")
            .id
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let t = test_app();
    let (status, body) = t.call(Method::GET, "/api/health/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_chat_requires_auth() {
    let t = test_app();
    let (status, _) = t
        .call(Method::POST, "/api/chat/", None, Some(json!({"model": "gpt-4o", "message": "hi"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.call(Method::GET, "/api/threads/", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_validation() {
    let t = test_app();
    let (status, body) = t
        .call(Method::POST, "/api/signup/", None, Some(json!({ "username": "ana" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username and password are required.");

    t.login("ana").await;
    let (status, body) = t
        .call(Method::POST, "/api/signup/", None, Some(json!({ "username": "ana", "password": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username already exists.");
}

#[tokio::test]
async fn test_refresh_and_login() {
    let t = test_app();
    let creds = json!({ "username": "ana", "password": "s3cret" });
    t.call(Method::POST, "/api/signup/", None, Some(creds.clone())).await;
    let (_, pair) = t.call(Method::POST, "/api/token/", None, Some(creds)).await;

    let (status, body) = t
        .call(Method::POST, "/api/token/refresh/", None, Some(json!({ "refresh": pair["refresh"] })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().unwrap();

    let (status, body) = t.call(Method::POST, "/api/login/", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User logged in.");

    let (status, _) = t
        .call(Method::POST, "/api/token/", None, Some(json!({ "username": "ana", "password": "wrong" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_chat_turn_shape_and_title() {
    let t = test_app();
    let token = t.login("ana").await;

    let (status, body) = t
        .call(Method::POST, "/api/chat/", Some(&token), Some(json!({"model": "gpt-4o", "message": "what is borrowing"})))
        .await;

    assert_eq!(status, StatusCode::OK);
    for key in ["id", "model", "message", "response", "timestamp", "thread_id"] {
        assert!(body.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["response"], "borrowing lets you reference data");

    let thread_id = body["thread_id"].as_str().unwrap();
    let (status, title) = t
        .call(Method::GET, &format!("/api/threads/{}/title/", thread_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(title, json!({ "id": thread_id, "title": "Rust Borrowing Explained" }));
    assert_eq!(t.gemini.models(), vec!["gemini-2.0-flash".to_string()]);
}

#[tokio::test]
async fn test_empty_model_uses_default_provider() {
    let t = test_app();
    let token = t.login("ana").await;

    let (status, body) = t
        .call(Method::POST, "/api/chat/", Some(&token), Some(json!({"model": "", "message": "hi"})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "gemini-2.0-flash");
    assert!(t.openai.models().is_empty());
}

#[tokio::test]
async fn test_unsupported_model_is_500() {
    let t = test_app();
    let token = t.login("ana").await;

    let (status, body) = t
        .call(Method::POST, "/api/chat/", Some(&token), Some(json!({"model": "llama-3", "message": "hi"})))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("llama-3"));
    assert_eq!(t.store.message_count(), 0);
}

#[tokio::test]
async fn test_disabled_llm_is_500() {
    let t = test_app();
    let token = t.login("ana").await;
    t.switch.set(false);

    let (status, body) = t
        .call(Method::POST, "/api/chat/", Some(&token), Some(json!({"model": "gpt-4o", "message": "hi"})))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "LLM usage is currently disabled by admin.");
    assert_eq!(t.store.message_count(), 0);
}

#[tokio::test]
async fn test_quota_exceeded_is_429_without_message() {
    let t = test_app();
    let token = t.login("ana").await;

    let (_, first) = t
        .call(Method::POST, "/api/chat/", Some(&token), Some(json!({"model": "gpt-4o", "message": "hi"})))
        .await;
    let (_, messages) = t.call(Method::GET, "/api/chat/", Some(&token), None).await;
    assert_eq!(messages.as_array().unwrap().len(), 1);
    let user_id = t.store_user_id("ana").await;
    t.store.set_usage(UsageCounter {
        user_id,
        tokens_used: 10_001,
        last_reset: Utc::now().date_naive(),
    });

    let (status, body) = t
        .call(
            Method::POST,
            "/api/chat/",
            Some(&token),
            Some(json!({"model": "gpt-4o", "message": "again", "thread_id": first["thread_id"]})),
        )
        .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Daily quota exceeded.");
    let (_, messages) = t.call(Method::GET, "/api/chat/", Some(&token), None).await;
    assert_eq!(messages.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_foreign_thread_id_creates_new_thread() {
    let t = test_app();
    let owner = t.login("ana").await;
    let other = t.login("bob").await;

    let (_, owned) = t
        .call(Method::POST, "/api/chat/", Some(&owner), Some(json!({"model": "gpt-4o", "message": "mine"})))
        .await;

    let (status, body) = t
        .call(
            Method::POST,
            "/api/chat/",
            Some(&other),
            Some(json!({"model": "gpt-4o", "message": "hijack", "thread_id": owned["thread_id"]})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["thread_id"], owned["thread_id"]);

    let uri = format!("/api/threads/{}/messages/", owned["thread_id"].as_str().unwrap());
    let (status, _) = t.call(Method::GET, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, history) = t.call(Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_thread_lifecycle() {
    let t = test_app();
    let token = t.login("ana").await;

    let (status, created) = t.call(Method::POST, "/api/threads/", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "");
    let thread_id = created["id"].as_str().unwrap().to_string();

    for text in ["first", "second"] {
        let (status, _) = t
            .call(
                Method::POST,
                "/api/chat/",
                Some(&token),
                Some(json!({"model": "gpt-4o", "message": text, "thread_id": thread_id})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, threads) = t.call(Method::GET, "/api/threads/", Some(&token), None).await;
    assert_eq!(threads.as_array().unwrap().len(), 1);

    let messages_uri = format!("/api/threads/{}/messages/", thread_id);
    let (_, history) = t.call(Method::GET, &messages_uri, Some(&token), None).await;
    let texts: Vec<_> = history.as_array().unwrap().iter().map(|m| m["message"].clone()).collect();
    assert_eq!(texts, vec![json!("first"), json!("second")]);

    let (status, body) = t
        .call(Method::DELETE, &format!("/api/threads/{}/", thread_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = t.call(Method::GET, &messages_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = t
        .call(Method::GET, &format!("/api/threads/{}/title/", thread_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(t.store.message_count(), 0);
}

#[tokio::test]
async fn test_malformed_chat_body_is_400() {
    let t = test_app();
    let token = t.login("ana").await;

    let (status, body) = t
        .call(Method::POST, "/api/chat/", Some(&token), Some(json!({"model": "gpt-4o"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = t
        .call(Method::POST, "/api/chat/", Some(&token), Some(json!({"model": "gpt-4o", "message": "  "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(t.store.message_count(), 0);
}

#[tokio::test]
async fn test_malformed_token_bodies_are_400() {
    let t = test_app();
    t.login("ana").await;

    let (status, body) = t
        .call(Method::POST, "/api/token/", None, Some(json!({ "username": "ana" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("password"));

    let (status, body) = t.call(Method::POST, "/api/token/refresh/", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("refresh"));
}
