#![allow(dead_code)]

use axum::extract::{Path as UrlPath, Query, Request as HttpRequest, State};
use axum::http::{Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

pub const TOKEN: &str = "secret_test_token";

/// Page objects embed at most this many relation references.
const RELATION_PAGE: usize = 25;

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub body: Value,
}

#[derive(Default)]
struct Pages {
    databases: BTreeMap<String, Vec<Value>>,
    requests: Vec<Request>,
    created: usize,
}

#[derive(Clone)]
struct FakeState {
    pages: Arc<Mutex<Pages>>,
    page_size: usize,
}

impl FakeState {
    fn lock(&self) -> MutexGuard<'_, Pages> {
        self.pages.lock().expect("lock")
    }
}

type Reply = (StatusCode, Json<Value>);

/// Loopback stand-in for the Notion REST API.
pub struct FakeNotion {
    base_url: String,
    pages: Arc<Mutex<Pages>>,
}

impl FakeNotion {
    pub fn start(page_size: usize) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind fake notion");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let addr = listener.local_addr().expect("local addr");
        let pages = Arc::new(Mutex::new(Pages::default()));
        let app = router(FakeState {
            pages: Arc::clone(&pages),
            page_size: page_size.max(1),
        });

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("tokio runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, app).await.expect("serve fake notion");
            });
        });

        Self {
            base_url: format!("http://{addr}/v1"),
            pages,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Pages> {
        self.pages.lock().expect("lock")
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn add_page(&self, database: &str, page: Value) {
        self.lock()
            .databases
            .entry(database.to_string())
            .or_default()
            .push(page);
    }

    pub fn page(&self, id: &str) -> Option<Value> {
        self.lock()
            .databases
            .values()
            .flatten()
            .find(|page| page["id"] == id)
            .cloned()
    }

    pub fn pages(&self, database: &str) -> Vec<Value> {
        self.lock().databases.get(database).cloned().unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.lock().requests.clone()
    }

    pub fn writes(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "PATCH" || (r.method == "POST" && r.path == "/v1/pages"))
            .collect()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    pub fn command(&self, home: &Path) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("shelf-sync");
        cmd.env_clear()
            .current_dir(home)
            .env("HOME", home)
            .env("SHELF_SYNC_CONFIG_PATH", home.join("missing.toml"))
            .env("SHELF_SYNC_LOG", "warn")
            .env("NOTION_TOKEN", TOKEN)
            .env("NOTION_API_BASE", &self.base_url)
            .env("BOOKS_DATABASE_ID", "books")
            .env("YEARS_DATABASE_ID", "years");
        cmd
    }
}

fn router(state: FakeState) -> Router {
    Router::new()
        .route("/v1/databases/{id}/query", post(query_database))
        .route("/v1/pages", post(create_page))
        .route("/v1/pages/{id}", patch(patch_page))
        .route("/v1/pages/{id}/properties/{property_id}", get(list_relation))
        .layer(middleware::from_fn(require_token))
        .with_state(state)
}

async fn require_token(request: HttpRequest, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TOKEN}"));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"object": "error", "status": 401, "code": "unauthorized"})),
        )
            .into_response();
    }
    next.run(request).await
}

fn record(pages: &mut Pages, method: Method, path: String, body: Value) {
    pages.requests.push(Request {
        method: method.to_string(),
        path,
        body,
    });
}

fn not_found() -> Reply {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"object": "error", "status": 404, "code": "object_not_found"})),
    )
}

/// Offset-cursor window over `len` items: `(start, end, next_cursor)`.
fn window(cursor: Option<&str>, len: usize, size: usize) -> (usize, usize, Value) {
    let start = cursor
        .and_then(|c| c.parse::<usize>().ok())
        .unwrap_or(0)
        .min(len);
    let end = (start + size).min(len);
    let next = if end < len {
        Value::String(end.to_string())
    } else {
        Value::Null
    };
    (start, end, next)
}

fn truncate_relations(page: &Value) -> Value {
    let mut page = page.clone();
    if let Some(props) = page["properties"].as_object_mut() {
        for property in props.values_mut() {
            let Some(refs) = property.get("relation").and_then(Value::as_array).cloned() else {
                continue;
            };
            property["has_more"] = Value::Bool(refs.len() > RELATION_PAGE);
            property["relation"] = Value::Array(refs.into_iter().take(RELATION_PAGE).collect());
        }
    }
    page
}

fn apply_properties(page: &mut Value, properties: &Value) {
    let Some(updates) = properties.as_object() else {
        return;
    };
    for (name, container) in updates {
        let mut replacement = Map::new();
        if let Some(id) = page["properties"][name].get("id").cloned() {
            replacement.insert("id".to_string(), id);
        }
        if let Some(fields) = container.as_object() {
            for (key, value) in fields {
                replacement.insert("type".to_string(), Value::String(key.clone()));
                replacement.insert(key.clone(), value.clone());
            }
        }
        page["properties"][name] = Value::Object(replacement);
    }
}

async fn query_database(
    State(state): State<FakeState>,
    UrlPath(id): UrlPath<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut pages = state.lock();
    let cursor = body["start_cursor"].as_str().map(str::to_string);
    record(&mut pages, Method::POST, format!("/v1/databases/{id}/query"), body);

    let Some(records) = pages.databases.get(&id) else {
        return not_found();
    };
    let (start, end, next) = window(cursor.as_deref(), records.len(), state.page_size);
    let results: Vec<Value> = records[start..end].iter().map(truncate_relations).collect();
    (
        StatusCode::OK,
        Json(json!({
            "object": "list",
            "results": results,
            "next_cursor": next,
            "has_more": end < records.len(),
        })),
    )
}

async fn list_relation(
    State(state): State<FakeState>,
    UrlPath((id, property_id)): UrlPath<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let mut pages = state.lock();
    record(
        &mut pages,
        Method::GET,
        format!("/v1/pages/{id}/properties/{property_id}"),
        Value::Null,
    );

    let Some(property) = pages
        .databases
        .values()
        .flatten()
        .find(|page| page["id"] == id.as_str())
        .and_then(|page| page["properties"].as_object())
        .and_then(|props| props.values().find(|p| p["id"] == property_id.as_str()))
    else {
        return not_found();
    };
    let refs = property["relation"].as_array().cloned().unwrap_or_default();
    let cursor = params.get("start_cursor").map(String::as_str);
    let (start, end, next) = window(cursor, refs.len(), RELATION_PAGE);
    let results: Vec<Value> = refs[start..end]
        .iter()
        .map(|r| json!({"object": "property_item", "type": "relation", "relation": r}))
        .collect();
    (
        StatusCode::OK,
        Json(json!({
            "object": "list",
            "results": results,
            "next_cursor": next,
            "has_more": end < refs.len(),
        })),
    )
}

async fn patch_page(
    State(state): State<FakeState>,
    UrlPath(id): UrlPath<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut pages = state.lock();
    record(&mut pages, Method::PATCH, format!("/v1/pages/{id}"), body.clone());

    let Some(page) = pages
        .databases
        .values_mut()
        .flatten()
        .find(|page| page["id"] == id.as_str())
    else {
        return not_found();
    };
    apply_properties(page, &body["properties"]);
    (StatusCode::OK, Json(page.clone()))
}

async fn create_page(State(state): State<FakeState>, Json(body): Json<Value>) -> Reply {
    let mut pages = state.lock();
    record(&mut pages, Method::POST, "/v1/pages".to_string(), body.clone());

    let Some(database) = body["parent"]["database_id"].as_str().map(str::to_string) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"object": "error", "status": 400, "code": "validation_error"})),
        );
    };
    pages.created += 1;
    let mut page = json!({
        "object": "page",
        "id": format!("log-{}", pages.created),
        "created_time": "2024-06-01T00:00:00.000Z",
        "properties": {},
    });
    apply_properties(&mut page, &body["properties"]);
    pages.databases.entry(database).or_default().push(page.clone());
    (StatusCode::OK, Json(page))
}

pub fn created_at(minutes: u32) -> String {
    format!("2024-01-01T{:02}:{:02}:00.000Z", minutes / 60, minutes % 60)
}

pub fn book_page(id: &str, minutes: u32, status: &str, finished: Option<&str>) -> Value {
    let date = match finished {
        Some(day) => json!({"start": day, "end": null, "time_zone": null}),
        None => Value::Null,
    };
    json!({
        "object": "page",
        "id": id,
        "created_time": created_at(minutes),
        "properties": {
            "Name": {"id": "title", "type": "title", "title": [{"type": "text", "plain_text": format!("Book {id}")}]},
            "Status": {"id": "st", "type": "select", "select": {"name": status}},
            "Fim": {"id": "fim", "type": "date", "date": date},
            "Most Recent": {"id": "mr", "type": "checkbox", "checkbox": false}
        }
    })
}

pub fn year_page(id: &str, year: &str, linked: &[&str]) -> Value {
    let refs: Vec<Value> = linked.iter().map(|id| json!({"id": id})).collect();
    json!({
        "object": "page",
        "id": id,
        "created_time": created_at(0),
        "properties": {
            "Name": {"id": "title", "type": "title", "title": [{"type": "text", "plain_text": year}]},
            "Books Read": {"id": "br", "type": "relation", "relation": refs, "has_more": false}
        }
    })
}

pub fn relation_ids(page: &Value, property: &str) -> Vec<String> {
    page["properties"][property]["relation"]
        .as_array()
        .map(|refs| {
            refs.iter()
                .filter_map(|r| r["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
