use axum::body::Body;
use axum::extract::{Path, Query};
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use dhavaflix::app::{build_router, AppState};
use dhavaflix::fetch::{CatalogSource, GatewayClient};
use dhavaflix::tmdb::{TmdbApi, TmdbClient, UpstreamReply};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::util::ServiceExt;

const API_KEY: &str = "test-key";

type Call = (String, String, Vec<(String, String)>);

#[derive(Default)]
struct FakeTmdb {
    replies: HashMap<String, (StatusCode, Value)>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTmdb {
    fn with(mut self, path: &str, status: StatusCode, body: Value) -> Self {
        self.replies.insert(path.to_string(), (status, body));
        self
    }
}

#[async_trait::async_trait]
impl TmdbApi for FakeTmdb {
    async fn get(
        &self,
        api_key: &str,
        path: &str,
        params: &[(String, String)],
    ) -> anyhow::Result<UpstreamReply> {
        self.calls
            .lock()
            .unwrap()
            .push((api_key.to_string(), path.to_string(), params.to_vec()));
        match self.replies.get(path) {
            Some((status, body)) => Ok(UpstreamReply {
                status: *status,
                body: body.clone(),
            }),
            None => Err(anyhow::anyhow!("connection refused")),
        }
    }
}

fn app(tmdb: FakeTmdb, api_key: Option<&str>) -> (Router, Arc<FakeTmdb>) {
    let tmdb = Arc::new(tmdb);
    let state = AppState {
        tmdb: tmdb.clone(),
        tmdb_api_key: api_key.map(str::to_string),
    };
    (build_router(state), tmdb)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::get(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn rejects_missing_path() {
    let (app, tmdb) = app(FakeTmdb::default(), Some(API_KEY));
    let res = app.oneshot(get_request("/api/tmdb?query=x")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await, json!({"message": "API path is required"}));
    assert!(tmdb.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fails_fast_without_credential() {
    let (app, tmdb) = app(
        FakeTmdb::default().with("movie/550", StatusCode::OK, json!({"id": 550})),
        None,
    );
    let res = app
        .oneshot(get_request("/api/tmdb?path=movie/550"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(res).await, json!({"message": "API key is not configured"}));
    assert!(tmdb.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn relays_success_and_forwards_params() {
    let upstream = json!({"page": 1, "results": [{"id": 1, "title": "Film"}]});
    let (app, tmdb) = app(
        FakeTmdb::default().with("discover/movie", StatusCode::OK, upstream.clone()),
        Some(API_KEY),
    );
    let res = app
        .oneshot(get_request(
            "/api/tmdb?path=discover/movie&region=IN&with_original_language=hi%7Cte%7Cta",
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, upstream);

    let calls = tmdb.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (key, path, params) = &calls[0];
    assert_eq!(key, API_KEY);
    assert_eq!(path, "discover/movie");
    assert_eq!(
        params,
        &vec![
            ("region".to_string(), "IN".to_string()),
            ("with_original_language".to_string(), "hi|te|ta".to_string()),
        ]
    );
}

#[tokio::test]
async fn passes_upstream_errors_through() {
    let error_body = json!({"status_code": 34, "status_message": "The resource you requested could not be found."});
    let (app, _) = app(
        FakeTmdb::default().with("movie/0", StatusCode::NOT_FOUND, error_body.clone()),
        Some(API_KEY),
    );
    let res = app
        .oneshot(get_request("/api/tmdb?path=movie/0"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await, error_body);
}

#[tokio::test]
async fn transport_failure_is_internal_error_without_credential() {
    let (app, _) = app(FakeTmdb::default(), Some(API_KEY));
    let res = app
        .oneshot(get_request("/api/tmdb?path=movie/550"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(res).await;
    assert_eq!(body, json!({"message": "Internal Server Error"}));
    assert!(!body.to_string().contains(API_KEY));
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _) = app(FakeTmdb::default(), None);
    let res = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn fetch_client_collapses_failures_to_none() {
    let (router, _) = app(
        FakeTmdb::default()
            .with("trending/all/week", StatusCode::OK, json!({"results": []}))
            .with("movie/0", StatusCode::NOT_FOUND, json!({"status_code": 34})),
        Some(API_KEY),
    );
    let addr = serve(router).await;
    let client = GatewayClient::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();

    let ok = client.fetch("trending/all/week", &[]).await;
    assert_eq!(ok, Some(json!({"results": []})));
    assert!(client.fetch("movie/0", &[]).await.is_none());
    assert!(client.fetch("movie/unknown", &[]).await.is_none());
}

#[tokio::test]
async fn fetch_client_returns_none_when_gateway_is_down() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = GatewayClient::new(&format!("http://{addr}"), Duration::from_secs(1)).unwrap();
    assert!(client.fetch("movie/550", &[]).await.is_none());
}

#[tokio::test]
async fn fetch_client_times_out_slow_gateway() {
    let slow = Router::new().route(
        "/api/tmdb",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }),
    );
    let addr = serve(slow).await;
    let client = GatewayClient::new(&format!("http://{addr}"), Duration::from_millis(200)).unwrap();
    assert!(client.fetch("movie/550", &[]).await.is_none());
}

#[tokio::test]
async fn tmdb_client_injects_credential_and_language() {
    let upstream = Router::new()
        .route(
            "/3/*path",
            get(
                |Path(path): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                    if path == "broken" {
                        return "not json".to_string();
                    }
                    json!({"path": path, "query": q}).to_string()
                },
            ),
        );
    let addr = serve(upstream).await;
    let client = TmdbClient::new(&format!("http://{addr}/3"), Duration::from_secs(2)).unwrap();

    let reply = client
        .get(API_KEY, "movie/550", &[("append_to_response".to_string(), "videos".to_string())])
        .await
        .unwrap();
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["path"], "movie/550");
    assert_eq!(reply.body["query"]["api_key"], API_KEY);
    assert_eq!(reply.body["query"]["language"], "en-US");
    assert_eq!(reply.body["query"]["append_to_response"], "videos");

    let err = client.get(API_KEY, "broken", &[]).await.unwrap_err();
    assert!(!format!("{err:#}").contains(API_KEY));
}
