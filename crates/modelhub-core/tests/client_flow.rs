//! End-to-end token lifecycle against an in-process stub API.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use modelhub_core::api::{ApiClient, ApiError, ClientConfig, HttpClient, RequestDescriptor};
use modelhub_core::auth::{AuthClient, Credential, MemoryTokenStore, TokenStore};
use modelhub_core::models::{DatasetCreate, TrainingCreate};

#[derive(Debug, Clone)]
struct Hit {
    method: String,
    path: String,
    authorization: Option<String>,
}

#[derive(Clone, Default)]
struct Recorder {
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl Recorder {
    fn hits(&self) -> Vec<Hit> {
        self.hits.lock().expect("recorder lock").clone()
    }

    fn last(&self) -> Hit {
        self.hits().last().cloned().expect("at least one request")
    }
}

async fn record(State(recorder): State<Recorder>, req: Request, next: Next) -> Response {
    let hit = Hit {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        authorization: req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    recorder.hits.lock().expect("recorder lock").push(hit);
    next.run(req).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers.get("authorization").and_then(|v| v.to_str().ok())
}

async fn token(Json(body): Json<Value>) -> Response {
    if body["email"] == "a@b.com" && body["password"] == "pw" {
        Json(json!({"access_token": "xyz"})).into_response()
    } else if body["email"] == "typed@b.com" {
        Json(json!({"access_token": "typed", "token_type": "bearer", "redirect_url": "/dashboard"})).into_response()
    } else if body["email"] == "empty@b.com" {
        Json(json!({"access_token": "", "token_type": "bearer"})).into_response()
    } else if body["email"] == "legacy@b.com" {
        Json(json!({"message": "Login successful"})).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Incorrect email or password"}))).into_response()
    }
}

async fn signin(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@b.com" {
        (StatusCode::BAD_REQUEST, Json(json!({"detail": "Email already registered"}))).into_response()
    } else {
        (StatusCode::CREATED, Json(json!({"email": body["email"], "hashed_password": "$2b$..."}))).into_response()
    }
}

async fn me(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some("Bearer xyz") | Some("Bearer typed") => {
            Json(json!({"id": 1, "email": "a@b.com", "is_admin": false})).into_response()
        }
        Some("Bearer limited") => (StatusCode::FORBIDDEN, Json(json!({"detail": "Forbidden"}))).into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Could not validate credentials"}))).into_response(),
    }
}

async fn create_dataset(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"id": 1, "name": body["name"], "creation_date": "2024/05/01 10:00:00", "user_is_admin": false}))
}

async fn list_datasets() -> Json<Value> {
    Json(json!([{"id": 1, "name": "cifar"}, {"id": 2, "name": "mnist"}]))
}

async fn get_dataset(Path(id): Path<i64>) -> Response {
    if id == 1 {
        Json(json!({"id": 1, "name": "cifar"})).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"detail": "Dataset not found"}))).into_response()
    }
}

async fn create_training(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "id": 5,
        "experiment_name": body["experiment_name"],
        "model_id": body["model_id"],
        "model_name": "resnet",
        "dataset_id": body["dataset_id"],
        "dataset_name": "cifar",
        "precision": 0.8,
        "recall": 0.6
    }))
}

async fn admin_delete_user(Path(email): Path<String>) -> Json<Value> {
    Json(json!({"message": format!("User {email} has been deleted")}))
}

async fn admin_delete_dataset(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({"message": format!("Dataset with {id} ID deleted successfully")}))
}

async fn boom() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "database exploded").into_response()
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!([]))
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub server");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    addr
}

async fn spawn_stub() -> (SocketAddr, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/token", post(token))
        .route("/signin", post(signin))
        .route("/users/me", get(me))
        .route("/datasets", post(create_dataset).get(list_datasets))
        .route("/datasets/{id}", get(get_dataset))
        .route("/trainings", post(create_training))
        .route("/admin/users/delete/{email}", post(admin_delete_user))
        .route("/admin/datasets/{id}", delete(admin_delete_dataset))
        .route("/boom", get(boom))
        .route("/slow", get(slow))
        .layer(middleware::from_fn_with_state(recorder.clone(), record));

    (serve(app).await, recorder)
}

fn clients(addr: SocketAddr, store: Arc<MemoryTokenStore>) -> (AuthClient, ApiClient) {
    let config = ClientConfig::new(&format!("http://{addr}")).expect("client config");
    let http = HttpClient::new(config, store).expect("http client");
    (AuthClient::new(http.clone()), ApiClient::new(http))
}

#[tokio::test]
async fn test_login_persists_token_and_authenticates_followups() {
    let (addr, recorder) = spawn_stub().await;
    let store = Arc::new(MemoryTokenStore::new());
    let (auth, _) = clients(addr, store.clone());

    let credential = auth.login("a@b.com", "pw").await.expect("login");
    assert_eq!(credential, Credential::new("xyz"));
    assert_eq!(store.load(), Some(Credential::new("xyz")));

    // Login itself goes out without a bearer header
    assert_eq!(recorder.last().path, "/token");
    assert_eq!(recorder.last().authorization, None);

    let user = auth.current_user().await.expect("current user");
    assert_eq!(user.email, "a@b.com");
    let hit = recorder.last();
    assert_eq!(hit.path, "/users/me");
    assert_eq!(hit.authorization.as_deref(), Some("Bearer xyz"));
}

#[tokio::test]
async fn test_login_stores_full_response_body() {
    let (addr, _) = spawn_stub().await;
    let store = Arc::new(MemoryTokenStore::new());
    let (auth, _) = clients(addr, store.clone());

    auth.login("typed@b.com", "pw").await.expect("login");
    let stored = store.load().expect("stored credential");
    assert_eq!(stored.access_token, "typed");
    assert_eq!(stored.token_type.as_deref(), Some("bearer"));
    assert_eq!(stored.extra.get("redirect_url"), Some(&json!("/dashboard")));
}

#[tokio::test]
async fn test_rejected_login_leaves_store_unchanged() {
    let (addr, _) = spawn_stub().await;

    let empty = Arc::new(MemoryTokenStore::new());
    let (auth, _) = clients(addr, empty.clone());
    match auth.login("a@b.com", "wrong").await {
        Err(ApiError::Authentication { status, message }) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "Incorrect email or password");
        }
        other => panic!("expected authentication error, got {other:?}"),
    }
    assert_eq!(empty.load(), None);

    let seeded = Arc::new(MemoryTokenStore::new());
    seeded.save(&Credential::new("previous"));
    let (auth, _) = clients(addr, seeded.clone());
    assert!(auth.login("a@b.com", "wrong").await.is_err());
    assert_eq!(seeded.load(), Some(Credential::new("previous")));
}

#[tokio::test]
async fn test_login_without_token_in_body_is_invalid_response() {
    let (addr, _) = spawn_stub().await;
    let store = Arc::new(MemoryTokenStore::new());
    let (auth, _) = clients(addr, store.clone());

    let result = auth.login("legacy@b.com", "pw").await;
    assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
    assert_eq!(store.load(), None);
}

#[tokio::test]
async fn test_login_with_empty_token_is_invalid_response() {
    let (addr, recorder) = spawn_stub().await;
    let store = Arc::new(MemoryTokenStore::new());
    store.save(&Credential::new("previous"));
    let (auth, api) = clients(addr, store.clone());

    let result = auth.login("empty@b.com", "pw").await;
    assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
    assert_eq!(store.load(), Some(Credential::new("previous")));

    store.clear();
    assert!(matches!(auth.login("empty@b.com", "pw").await, Err(ApiError::InvalidResponse(_))));
    assert_eq!(store.load(), None);
    assert!(!auth.is_authenticated().await);

    api.request(RequestDescriptor::get("/datasets")).await.expect("anonymous request");
    assert_eq!(recorder.last().authorization, None);
}

#[tokio::test]
async fn test_stored_empty_token_sends_no_header() {
    let (addr, recorder) = spawn_stub().await;
    let store = Arc::new(MemoryTokenStore::with_raw(r#"{"access_token": ""}"#));
    let (auth, api) = clients(addr, store);

    api.request(RequestDescriptor::get("/datasets")).await.expect("anonymous request");
    assert_eq!(recorder.last().authorization, None);

    let before = recorder.hits().len();
    assert!(matches!(auth.current_user().await, Err(ApiError::NotAuthenticated)));
    assert_eq!(recorder.hits().len(), before);
}

#[tokio::test]
async fn test_current_user_without_token_makes_no_request() {
    let (addr, recorder) = spawn_stub().await;
    let (auth, _) = clients(addr, Arc::new(MemoryTokenStore::new()));

    assert!(matches!(auth.current_user().await, Err(ApiError::NotAuthenticated)));
    assert!(recorder.hits().is_empty());
}

#[tokio::test]
async fn test_logout_then_current_user_is_not_authenticated() {
    let (addr, recorder) = spawn_stub().await;
    let store = Arc::new(MemoryTokenStore::new());
    let (auth, _) = clients(addr, store.clone());

    auth.login("a@b.com", "pw").await.expect("login");
    let before = recorder.hits().len();

    auth.logout().await;
    assert_eq!(store.load(), None);
    assert!(!auth.is_authenticated().await);
    assert!(matches!(auth.current_user().await, Err(ApiError::NotAuthenticated)));
    assert_eq!(recorder.hits().len(), before);

    // Logging out twice is fine
    auth.logout().await;
}

#[tokio::test]
async fn test_rejected_token_is_cleared() {
    let (addr, _) = spawn_stub().await;
    let store = Arc::new(MemoryTokenStore::new());
    store.save(&Credential::new("expired"));
    let (auth, _) = clients(addr, store.clone());

    match auth.current_user().await {
        Err(ApiError::Authentication { status, message }) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "Could not validate credentials");
        }
        other => panic!("expected authentication error, got {other:?}"),
    }
    assert_eq!(store.load(), None);
}

#[tokio::test]
async fn test_rejection_leaves_newer_login_alone() {
    let store = Arc::new(MemoryTokenStore::new());
    store.save(&Credential::new("stale"));

    // Another login lands while the request for the stale token is in flight
    let relogin = store.clone();
    let app = Router::new().route(
        "/users/me",
        get(move || {
            let store = relogin.clone();
            async move {
                store.save(&Credential::new("newer"));
                (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Could not validate credentials"})))
            }
        }),
    );
    let addr = serve(app).await;
    let (auth, _) = clients(addr, store.clone());

    match auth.current_user().await {
        Err(ApiError::Authentication { status, .. }) => assert_eq!(status.as_u16(), 401),
        other => panic!("expected authentication error, got {other:?}"),
    }
    assert_eq!(store.load(), Some(Credential::new("newer")));
}

#[tokio::test]
async fn test_forbidden_token_is_kept() {
    let (addr, _) = spawn_stub().await;
    let store = Arc::new(MemoryTokenStore::new());
    store.save(&Credential::new("limited"));
    let (auth, _) = clients(addr, store.clone());

    assert!(matches!(auth.current_user().await, Err(ApiError::Authentication { .. })));
    assert_eq!(store.load(), Some(Credential::new("limited")));
}

#[tokio::test]
async fn test_signup_returns_raw_response_and_leaves_store_alone() {
    let (addr, _) = spawn_stub().await;
    let store = Arc::new(MemoryTokenStore::new());
    let (auth, _) = clients(addr, store.clone());

    let response = auth.signup("new@b.com", "pw").await.expect("signup");
    assert_eq!(response.status.as_u16(), 201);
    let body: Value = response.json().expect("json body");
    assert_eq!(body["email"], "new@b.com");
    assert_eq!(store.load(), None);

    match auth.signup("taken@b.com", "pw").await {
        Err(ApiError::HttpStatus { status, body }) => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("Email already registered"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_request_header_tracks_store_contents() {
    let (addr, recorder) = spawn_stub().await;
    let store = Arc::new(MemoryTokenStore::new());
    let (_, api) = clients(addr, store.clone());

    api.request(RequestDescriptor::get("/datasets")).await.expect("anonymous request");
    assert_eq!(recorder.last().authorization, None);

    store.save(&Credential::new("T"));
    api.request(RequestDescriptor::get("/datasets")).await.expect("authenticated request");
    assert_eq!(recorder.last().authorization.as_deref(), Some("Bearer T"));

    store.clear();
    api.request(RequestDescriptor::get("datasets")).await.expect("anonymous request");
    assert_eq!(recorder.last().authorization, None);
}

#[tokio::test]
async fn test_resource_calls() {
    let (addr, recorder) = spawn_stub().await;
    let store = Arc::new(MemoryTokenStore::new());
    store.save(&Credential::new("xyz"));
    let (_, api) = clients(addr, store);

    let created = api.create_dataset(&DatasetCreate::new("imagenet")).await.expect("create dataset");
    assert_eq!(created.name, "imagenet");
    let hit = recorder.last();
    assert_eq!((hit.method.as_str(), hit.path.as_str()), ("POST", "/datasets"));
    assert_eq!(hit.authorization.as_deref(), Some("Bearer xyz"));

    let datasets = api.list_datasets().await.expect("list datasets");
    assert_eq!(datasets.len(), 2);

    assert_eq!(api.get_dataset(1).await.expect("get dataset").name, "cifar");

    let training = api
        .create_training(&TrainingCreate {
            experiment_name: "baseline".to_string(),
            model_id: 3,
            dataset_id: 1,
        })
        .await
        .expect("create training");
    assert_eq!(training.model_id, 3);
    assert_eq!(training.dataset_name, "cifar");

    let ack = api.admin_delete_dataset(2).await.expect("delete dataset");
    assert_eq!(ack.message, "Dataset with 2 ID deleted successfully");
    assert_eq!(recorder.last().method, "DELETE");

    let ack = api.admin_delete_user("a@b.com").await.expect("delete user");
    assert_eq!(ack.message, "User a@b.com has been deleted");
    assert_eq!(recorder.last().path, "/admin/users/delete/a@b.com");

    let ack = api.admin_delete_user("odd/name x@b.com").await.expect("delete user");
    assert_eq!(ack.message, "User odd/name x@b.com has been deleted");
    assert_eq!(recorder.last().path, "/admin/users/delete/odd%2Fname%20x@b.com");
}

#[tokio::test]
async fn test_error_statuses_propagate() {
    let (addr, _) = spawn_stub().await;
    let store = Arc::new(MemoryTokenStore::new());
    store.save(&Credential::new("xyz"));
    let (_, api) = clients(addr, store);

    match api.get_dataset(99).await {
        Err(ApiError::HttpStatus { status, body }) => {
            assert_eq!(status.as_u16(), 404);
            assert!(body.contains("Dataset not found"));
        }
        other => panic!("expected 404, got {other:?}"),
    }

    match api.request(RequestDescriptor::get("/boom")).await {
        Err(err @ ApiError::HttpStatus { .. }) => {
            assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
            assert!(!err.is_retryable());
        }
        other => panic!("expected 500, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Grab a free port, then close it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let store = Arc::new(MemoryTokenStore::new());
    let (auth, api) = clients(addr, store.clone());

    let err = api.list_datasets().await.expect_err("nothing is listening");
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.is_retryable());

    assert!(matches!(auth.login("a@b.com", "pw").await, Err(ApiError::Transport(_))));
    assert_eq!(store.load(), None);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let (addr, _) = spawn_stub().await;
    let config = ClientConfig::new(&format!("http://{addr}"))
        .expect("client config")
        .with_timeout(Duration::from_millis(200));
    let http = HttpClient::new(config, Arc::new(MemoryTokenStore::new())).expect("http client");

    let err = http
        .request(RequestDescriptor::get("/slow"))
        .await
        .expect_err("request should time out");
    match &err {
        ApiError::Transport(e) => assert!(e.is_timeout(), "expected a timeout, got {e}"),
        other => panic!("expected transport error, got {other:?}"),
    }
    assert!(err.is_retryable());
}
