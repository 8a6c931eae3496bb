//! Test utilities for SDK and CLI testing
//!
//! Provides a recording fake transport for manager and handler tests, and a
//! mock HTTP server for exercising [`HttpClient`](crate::client::HttpClient)
//! end to end.

use crate::client::{Transport, API_VERSION_HEADER};
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap as AxumHeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use baremetal_core::BaremetalError;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Host used in `next` links; clients must strip it.
const NEXT_LINK_HOST: &str = "http://ironic.example:6385";

/// Largest page the mock hands out, whatever limit the client asks for.
pub const MAX_PAGE_SIZE: usize = 2;

/// A recorded request: method, url and JSON body.
pub type Call = (Method, String, Option<Value>);

/// In-memory transport answering canned responses keyed by method and url.
///
/// Every request is recorded, including ones with no canned response, which
/// fail with a 404.
#[derive(Debug, Default)]
pub struct FakeApi {
    responses: HashMap<(Method, String), Option<Value>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method url` with `body`.
    pub fn with_response(mut self, method: Method, url: &str, body: Value) -> Self {
        self.responses.insert((method, url.to_string()), Some(body));
        self
    }

    /// Answer `method url` with no content.
    pub fn with_empty_response(mut self, method: Method, url: &str) -> Self {
        self.responses.insert((method, url.to_string()), None);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn json_request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> baremetal_core::Result<(HeaderMap, Option<Value>)> {
        self.calls
            .lock()
            .unwrap()
            .push((method.clone(), url.to_string(), body.cloned()));
        match self.responses.get(&(method.clone(), url.to_string())) {
            Some(body) => Ok((HeaderMap::new(), body.clone())),
            None => Err(BaremetalError::Http {
                status: 404,
                message: format!("no fake response for {} {}", method, url),
            }),
        }
    }
}

/// Mock server state
#[derive(Debug, Clone)]
pub struct MockServerState {
    /// Stored port groups, in creation order
    pub portgroups: Arc<Mutex<Vec<Value>>>,
    /// Registered drivers
    pub drivers: Arc<Mutex<Vec<Value>>>,
    /// API version header seen on each request
    pub api_versions: Arc<Mutex<Vec<String>>>,
    /// Auth token header seen on each request
    pub tokens: Arc<Mutex<Vec<String>>>,
    created: Arc<Mutex<u32>>,
}

fn portgroup_uuid(n: u32) -> String {
    format!("11111111-2222-3333-4444-{:012}", n)
}

impl Default for MockServerState {
    fn default() -> Self {
        let portgroups = (1..=3)
            .map(|n| {
                json!({
                    "uuid": portgroup_uuid(n),
                    "address": format!("aa:bb:cc:00:00:0{}", n),
                    "name": format!("pg-{}", n),
                    "node_uuid": "node-1",
                    "extra": {},
                    "created_at": "2024-01-01T00:00:00+00:00",
                    "updated_at": null
                })
            })
            .collect();

        let drivers = vec![
            json!({"name": "ipmi", "hosts": ["conductor-1", "conductor-2"]}),
            json!({"name": "redfish", "hosts": ["conductor-1"]}),
        ];

        Self {
            portgroups: Arc::new(Mutex::new(portgroups)),
            drivers: Arc::new(Mutex::new(drivers)),
            api_versions: Arc::new(Mutex::new(Vec::new())),
            tokens: Arc::new(Mutex::new(Vec::new())),
            created: Arc::new(Mutex::new(3)),
        }
    }
}

impl MockServerState {
    fn record(&self, headers: &AxumHeaderMap) {
        if let Some(v) = headers.get(API_VERSION_HEADER).and_then(|v| v.to_str().ok()) {
            self.api_versions.lock().unwrap().push(v.to_string());
        }
        if let Some(v) = headers.get("x-auth-token").and_then(|v| v.to_str().ok()) {
            self.tokens.lock().unwrap().push(v.to_string());
        }
    }
}

/// Mock server implementation
#[derive(Debug)]
pub struct MockServer {
    state: MockServerState,
    port: u16,
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockServer {
    /// Create a new mock server
    pub fn new() -> Self {
        Self {
            state: MockServerState::default(),
            port: 0, // Will be assigned when server starts
        }
    }

    /// Start the mock server and return the address
    pub async fn start(mut self) -> Result<(Self, String)> {
        let app = self.create_router();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        self.port = addr.port();

        let server_url = format!("http://127.0.0.1:{}", self.port);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock server error: {}", e);
            }
        });

        // Give the server a moment to start and verify it's running
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                break;
            }
        }

        Ok((self, server_url))
    }

    /// Get the server port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the server state
    pub fn state(&self) -> &MockServerState {
        &self.state
    }

    fn create_router(&self) -> Router {
        Router::new()
            // Port group endpoints
            .route(
                "/v1/portgroups",
                get(list_portgroups_handler).post(create_portgroup_handler),
            )
            .route("/v1/portgroups/", get(list_portgroups_handler))
            .route("/v1/portgroups/detail", get(list_portgroups_detail_handler))
            .route(
                "/v1/portgroups/:id",
                get(get_portgroup_handler)
                    .patch(update_portgroup_handler)
                    .delete(delete_portgroup_handler),
            )
            // Driver endpoints
            .route("/v1/drivers", get(list_drivers_handler))
            .route("/v1/drivers/:name", get(get_driver_handler))
            .route("/v1/drivers/:name/properties", get(driver_properties_handler))
            .with_state(self.state.clone())
    }
}

fn not_found(kind: &str, id: &str) -> Response {
    let fault = json!({
        "faultstring": format!("{} {} could not be found.", kind, id),
        "debuginfo": null
    });
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error_message": fault.to_string() })),
    )
        .into_response()
}

fn project(item: &Value, fields: &[&str]) -> Value {
    let projected: Map<String, Value> = fields
        .iter()
        .filter_map(|f| item.get(*f).map(|v| (f.to_string(), v.clone())))
        .collect();
    Value::Object(projected)
}

fn list_portgroups(
    state: &MockServerState,
    params: &HashMap<String, String>,
    detail: bool,
) -> Value {
    let all = state.portgroups.lock().unwrap().clone();
    let mut items: Vec<Value> = all
        .into_iter()
        .filter(|pg| {
            params
                .get("address")
                .map_or(true, |a| pg["address"] == json!(a))
        })
        .filter(|pg| {
            params
                .get("node")
                .map_or(true, |n| pg["node_uuid"] == json!(n))
        })
        .collect();

    if let Some(marker) = params.get("marker") {
        if let Some(pos) = items.iter().position(|pg| pg["uuid"] == json!(marker)) {
            items.drain(..=pos);
        }
    }

    let page_size = params
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .filter(|l| *l > 0)
        .map_or(MAX_PAGE_SIZE, |l| l.min(MAX_PAGE_SIZE));

    let mut next = None;
    if items.len() > page_size {
        items.truncate(page_size);
        let last = items[page_size - 1]["uuid"].as_str().unwrap_or_default();
        next = Some(format!(
            "{}/v1/portgroups{}?limit={}&marker={}",
            NEXT_LINK_HOST,
            if detail { "/detail" } else { "" },
            page_size,
            last
        ));
    }

    let fields: Vec<String> = params
        .get("fields")
        .map(|f| f.split(',').map(String::from).collect())
        .unwrap_or_default();
    let items: Vec<Value> = if !fields.is_empty() {
        let names: Vec<&str> = fields.iter().map(String::as_str).collect();
        items.iter().map(|pg| project(pg, &names)).collect()
    } else if detail {
        items
    } else {
        items
            .iter()
            .map(|pg| project(pg, &["uuid", "address", "name"]))
            .collect()
    };

    let mut body = json!({ "portgroups": items });
    if let Some(next) = next {
        body["next"] = json!(next);
    }
    body
}

async fn list_portgroups_handler(
    State(state): State<MockServerState>,
    headers: AxumHeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.record(&headers);
    Json(list_portgroups(&state, &params, false))
}

async fn list_portgroups_detail_handler(
    State(state): State<MockServerState>,
    headers: AxumHeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.record(&headers);
    Json(list_portgroups(&state, &params, true))
}

async fn get_portgroup_handler(
    State(state): State<MockServerState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let portgroups = state.portgroups.lock().unwrap();
    match portgroups.iter().find(|pg| pg["uuid"] == json!(id)) {
        Some(pg) => match params.get("fields") {
            Some(fields) => {
                let names: Vec<&str> = fields.split(',').collect();
                Json(project(pg, &names)).into_response()
            }
            None => Json(pg.clone()).into_response(),
        },
        None => not_found("Portgroup", &id),
    }
}

async fn create_portgroup_handler(
    State(state): State<MockServerState>,
    Json(mut body): Json<Map<String, Value>>,
) -> Response {
    let mut created = state.created.lock().unwrap();
    *created += 1;
    body.insert("uuid".to_string(), json!(portgroup_uuid(*created)));
    body.entry("extra").or_insert_with(|| json!({}));
    body.insert("created_at".to_string(), json!("2024-06-01T00:00:00+00:00"));
    body.insert("updated_at".to_string(), Value::Null);

    let pg = Value::Object(body);
    state.portgroups.lock().unwrap().push(pg.clone());
    (StatusCode::CREATED, Json(pg)).into_response()
}

async fn update_portgroup_handler(
    State(state): State<MockServerState>,
    Path(id): Path<String>,
    Json(patch): Json<Vec<Value>>,
) -> Response {
    let mut portgroups = state.portgroups.lock().unwrap();
    let Some(pg) = portgroups.iter_mut().find(|pg| pg["uuid"] == json!(id)) else {
        return not_found("Portgroup", &id);
    };

    for op in patch {
        let path = op["path"].as_str().unwrap_or_default().trim_start_matches('/');
        let Some(fields) = pg.as_object_mut() else {
            continue;
        };
        match op["op"].as_str() {
            Some("add") | Some("replace") => {
                fields.insert(path.to_string(), op["value"].clone());
            }
            Some("remove") => {
                fields.remove(path);
            }
            _ => return StatusCode::BAD_REQUEST.into_response(),
        }
    }
    pg["updated_at"] = json!("2024-06-02T00:00:00+00:00");
    Json(pg.clone()).into_response()
}

async fn delete_portgroup_handler(
    State(state): State<MockServerState>,
    Path(id): Path<String>,
) -> Response {
    let mut portgroups = state.portgroups.lock().unwrap();
    match portgroups.iter().position(|pg| pg["uuid"] == json!(id)) {
        Some(pos) => {
            portgroups.remove(pos);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found("Portgroup", &id),
    }
}

async fn list_drivers_handler(
    State(state): State<MockServerState>,
    headers: AxumHeaderMap,
) -> Json<Value> {
    state.record(&headers);
    let drivers = state.drivers.lock().unwrap().clone();
    Json(json!({ "drivers": drivers }))
}

async fn get_driver_handler(
    State(state): State<MockServerState>,
    Path(name): Path<String>,
) -> Response {
    let drivers = state.drivers.lock().unwrap();
    match drivers.iter().find(|d| d["name"] == json!(name)) {
        Some(driver) => Json(driver.clone()).into_response(),
        None => not_found("Driver", &name),
    }
}

async fn driver_properties_handler(Path(name): Path<String>) -> Response {
    if name != "ipmi" {
        return not_found("Driver", &name);
    }
    Json(json!({
        "ipmi_address": "IP address or hostname of the node. Required.",
        "ipmi_password": "password. Optional."
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_startup() {
        let server = MockServer::new();
        let (server, url) = server.start().await.unwrap();

        assert!(server.port() > 0);
        assert!(url.contains(&server.port().to_string()));

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/v1/drivers", url))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_portgroup_pages_link_to_next() {
        let (_, url) = MockServer::new().start().await.unwrap();

        let client = reqwest::Client::new();
        let body: Value = client
            .get(format!("{}/v1/portgroups/?limit=2", url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["portgroups"].as_array().unwrap().len(), 2);
        assert_eq!(
            body["next"],
            json!(format!(
                "{}/v1/portgroups?limit=2&marker={}",
                NEXT_LINK_HOST,
                portgroup_uuid(2)
            ))
        );
        // Short view by default
        assert!(body["portgroups"][0].get("node_uuid").is_none());
    }

    #[tokio::test]
    async fn test_fake_api_records_calls() {
        let fake = FakeApi::new().with_response(Method::GET, "/v1/x", json!({"a": 1}));

        let (_, body) = fake.json_request(Method::GET, "/v1/x", None).await.unwrap();
        assert_eq!(body, Some(json!({"a": 1})));

        let err = fake
            .json_request(Method::DELETE, "/v1/x", None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(fake.request_count(), 2);
        assert_eq!(fake.calls()[1].0, Method::DELETE);
    }
}
