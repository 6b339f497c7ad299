//! Drives the chat router end to end against a stub task API.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use todo_chat::agent::ChatAgent;
use todo_chat::api::{router, types::ChatResponse, AppState};
use todo_chat::config::Config;

type Tasks = Arc<Mutex<Vec<Value>>>;

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A small FastAPI-like task service keeping tasks in memory.
fn task_api(tasks: Tasks) -> Router {
    async fn list(State(tasks): State<Tasks>) -> Json<Value> {
        Json(Value::Array(tasks.lock().unwrap().clone()))
    }

    async fn create(State(tasks): State<Tasks>, Json(mut body): Json<Value>) -> Json<Value> {
        let mut tasks = tasks.lock().unwrap();
        body["id"] = json!(tasks.len() + 1);
        tasks.push(body.clone());
        Json(body)
    }

    async fn fetch(
        State(tasks): State<Tasks>,
        Path(id): Path<String>,
    ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t["id"].to_string() == id)
            .cloned()
            .map(Json)
            .ok_or_else(|| (StatusCode::NOT_FOUND, Json(json!({"detail": "Task not found"}))))
    }

    async fn update(
        State(tasks): State<Tasks>,
        Path(id): Path<String>,
        Json(patch): Json<Value>,
    ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        let mut tasks = tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t["id"].to_string() == id)
            .ok_or_else(|| (StatusCode::NOT_FOUND, Json(json!({"detail": "Task not found"}))))?;
        if let (Some(task), Some(patch)) = (task.as_object_mut(), patch.as_object()) {
            for (k, v) in patch {
                task.insert(k.clone(), v.clone());
            }
        }
        Ok(Json(task.clone()))
    }

    async fn remove(State(tasks): State<Tasks>, Path(id): Path<String>) -> StatusCode {
        let mut tasks = tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t["id"].to_string() != id);
        if tasks.len() < before {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::NOT_FOUND
        }
    }

    Router::new()
        .route("/api/v1/tasks", get(list).post(create))
        .route("/api/v1/tasks/:id", get(fetch).put(update).delete(remove))
        .with_state(tasks)
}

async fn chat_server() -> (String, Tasks) {
    let tasks: Tasks = Arc::new(Mutex::new(Vec::new()));
    let task_base = spawn(task_api(tasks.clone())).await;

    let config = Config::new(format!("{}/api/v1", task_base), None);
    let agent = ChatAgent::from_config(&config).unwrap();
    let chat_base = spawn(router(Arc::new(AppState::new(agent)))).await;
    (chat_base, tasks)
}

async fn chat(client: &reqwest::Client, base: &str, body: Value) -> (StatusCode, ChatResponse) {
    let res = client
        .post(format!("{}/api/chat", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = StatusCode::from_u16(res.status().as_u16()).unwrap();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn add_then_complete_through_http() {
    let (base, tasks) = chat_server().await;
    let client = reqwest::Client::new();

    let (status, added) = chat(
        &client,
        &base,
        json!({"message": "Add a task to buy groceries", "user_id": "u1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(added.conversation_id.starts_with("conv_"));
    assert_eq!(
        added.response,
        "I'll add \"buy groceries\" to your todo list.\n\nSuccessfully added task: \"buy groceries\""
    );
    assert_eq!(tasks.lock().unwrap().len(), 1);

    let (status, done) = chat(
        &client,
        &base,
        json!({
            "conversation_id": added.conversation_id,
            "message": "mark groceries as done",
            "user_id": "u1"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done.conversation_id, added.conversation_id);
    assert_eq!(done.tool_results.len(), 1);
    assert!(done.tool_results[0].success);
    assert_eq!(tasks.lock().unwrap()[0]["status"], "completed");

    let conv: Value = client
        .get(format!("{}/api/conversations/{}?user_id=u1", base, added.conversation_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(conv["messages"].as_array().unwrap().len(), 4);
    assert_eq!(conv["title"], "Add a task to buy groceries");
}

#[tokio::test]
async fn bad_requests_get_apology_bodies() {
    let (base, _) = chat_server().await;
    let client = reqwest::Client::new();

    let (status, body) = chat(&client, &base, json!({"message": "", "user_id": "u1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.conversation_id, "");
    assert!(body
        .response
        .starts_with("Sorry, I encountered an error processing your request: "));

    let res = client
        .post(format!("{}/api/chat", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let body: ChatResponse = res.json().await.unwrap();
    assert_eq!(body.conversation_id, "");
    assert!(body.tool_calls.is_empty());
}

#[tokio::test]
async fn unmatched_message_without_fallback_key_apologises() {
    let (base, _) = chat_server().await;
    let client = reqwest::Client::new();

    let (status, body) = chat(
        &client,
        &base,
        json!({"message": "what's the weather like?", "user_id": "u1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.response,
        "Sorry, I encountered an error processing your request: generative fallback is not configured"
    );
    assert!(body.tool_calls.is_empty());

    let health: Value = client
        .get(format!("{}/api/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
}
