//! Local stand-in for the chat-completions endpoint, used by tests.

use std::sync::{Arc, Mutex};

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

/// A successful completion whose first choice carries `content`.
pub fn chat_reply(content: &str) -> Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 34, "total_tokens": 46}
    })
}

/// Answers every `POST /chat/completions` with a fixed status and body,
/// keeping each request body for inspection.
pub struct ChatServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl ChatServer {
    pub async fn start(status: StatusCode, reply: Value) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        let app = Router::new().route(
            "/chat/completions",
            post(move |Json(body): Json<Value>| {
                let seen = seen.clone();
                let reply = reply.clone();
                async move {
                    seen.lock().unwrap().push(body);
                    (status, Json(reply))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}
