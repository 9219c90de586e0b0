//! In-memory stand-in for the CS-Cart REST API.
//!
//! Serves generic entity CRUD under `/api/{entity}` behind HTTP Basic Auth,
//! plus the `/api/?version` probe, which answers with HTML like a real store.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, RawQuery, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const CART_VERSION: &str = "4.18.1";

/// Login and API key the server accepts.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub user_login: String,
    pub api_key: String,
}

impl Credentials {
    pub fn new(user_login: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            user_login: user_login.into(),
            api_key: api_key.into(),
        }
    }

    fn authorization(&self) -> String {
        let raw = format!("{}:{}", self.user_login, self.api_key);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

#[derive(Default)]
struct Collection {
    next_id: u64,
    items: BTreeMap<u64, Map<String, Value>>,
}

type Db = Arc<RwLock<HashMap<String, Collection>>>;

#[derive(Clone)]
struct AppState {
    credentials: Arc<Credentials>,
    db: Db,
}

pub fn app(credentials: Credentials) -> Router {
    let state = AppState {
        credentials: Arc::new(credentials),
        db: Db::default(),
    };
    Router::new()
        .route("/api/", get(root))
        .route("/api/{entity}", get(list_items).post(create_item))
        .route(
            "/api/{entity}/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .with_state(state)
}

pub async fn run(listener: TcpListener, credentials: Credentials) -> Result<(), std::io::Error> {
    axum::serve(listener, app(credentials)).await
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let expected = state.credentials.authorization();
    let supplied = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if supplied != Some(expected.as_str()) {
        log::debug!(
            "rejecting {} {}: bad credentials",
            request.method(),
            request.uri()
        );
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    next.run(request).await
}

async fn root(RawQuery(query): RawQuery) -> Response {
    match query.as_deref() {
        Some("version") => {
            Html(format!("CS-Cart: version <b>{CART_VERSION}</b>")).into_response()
        }
        _ => message(StatusCode::NOT_FOUND, "Not found"),
    }
}

async fn list_items(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Json<Value> {
    let db = state.db.read().await;
    let items: Vec<Value> = db
        .get(&entity)
        .map(|c| c.items.values().cloned().map(Value::Object).collect())
        .unwrap_or_default();
    Json(json!({ entity: items, "params": params }))
}

async fn create_item(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Json(input): Json<Value>,
) -> Response {
    let Value::Object(mut fields) = input else {
        return message(StatusCode::BAD_REQUEST, "Body must be a JSON object");
    };
    let mut db = state.db.write().await;
    let collection = db.entry(entity).or_default();
    collection.next_id += 1;
    let id = collection.next_id;
    fields.insert("id".to_string(), json!(id));
    collection.items.insert(id, fields);
    (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
}

async fn get_item(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, u64)>,
) -> Response {
    let db = state.db.read().await;
    match db.get(&entity).and_then(|c| c.items.get(&id)) {
        Some(item) => Json(Value::Object(item.clone())).into_response(),
        None => message(StatusCode::NOT_FOUND, "Not found"),
    }
}

async fn update_item(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, u64)>,
    Json(input): Json<Value>,
) -> Response {
    let Value::Object(fields) = input else {
        return message(StatusCode::BAD_REQUEST, "Body must be a JSON object");
    };
    let mut db = state.db.write().await;
    let Some(item) = db.get_mut(&entity).and_then(|c| c.items.get_mut(&id)) else {
        return message(StatusCode::NOT_FOUND, "Not found");
    };
    for (key, value) in fields {
        if key != "id" {
            item.insert(key, value);
        }
    }
    Json(json!({ "id": id })).into_response()
}

async fn delete_item(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, u64)>,
) -> Response {
    let mut db = state.db.write().await;
    match db.get_mut(&entity).and_then(|c| c.items.remove(&id)) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => message(StatusCode::NOT_FOUND, "Not found"),
    }
}
