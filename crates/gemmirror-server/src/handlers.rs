//! HTTP handlers for the ingestion and dependency-snapshot API.
//!
//! Client errors (validation, auth) return short plain-text reasons.
//! Server-side failures return a generic reason; the full error goes
//! to the log. Ingestion and store work runs on the blocking pool
//! since diesel and the archive fetch are synchronous.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use gemmirror_core::{
    error::MirrorError,
    request::{IngestionRequest, REQUIRED_FIELDS},
    snapshot::{self, DependencyRecord},
};
use gemmirror_db::SpecStore;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::state::AppState;

/// An error response: status code plus a short reason.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }

    fn bad_gateway() -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: "upstream fetch failed".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// GET /api/v1/dependencies: binary snapshot encoding.
pub async fn dependencies(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(names) = gem_names(&params) else {
        return StatusCode::OK.into_response();
    };

    match resolve_snapshot(&state, names).await {
        Ok(records) => match snapshot::encode_binary(&records) {
            Ok(bytes) => (
                [(header::CONTENT_TYPE, "application/octet-stream")],
                bytes,
            )
                .into_response(),
            Err(err) => {
                error!("encoding binary snapshot: {err}");
                ApiError::internal().into_response()
            }
        },
        Err(err) => err.into_response(),
    }
}

/// GET /api/v1/dependencies.json: JSON snapshot encoding.
pub async fn dependencies_json(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(names) = gem_names(&params) else {
        return StatusCode::OK.into_response();
    };

    match resolve_snapshot(&state, names).await {
        Ok(records) => match snapshot::encode_json(&records) {
            Ok(json) => (
                [(header::CONTENT_TYPE, "application/json")],
                json,
            )
                .into_response(),
            Err(err) => {
                error!("encoding JSON snapshot: {err}");
                ApiError::internal().into_response()
            }
        },
        Err(err) => err.into_response(),
    }
}

/// POST /api/v1/add_spec.json: ingest one gem version.
pub async fn add_spec(
    Extension(state): Extension<Arc<AppState>>,
    body: String,
) -> Response {
    let payload = match parse_payload(&state.token, &body) {
        Ok(payload) => payload,
        Err(err) => return err.into_response(),
    };

    info!(
        gem = payload.full_name(),
        prerelease = payload.prerelease,
        "webhook: add spec"
    );

    let job_state = state.clone();
    let request = payload.clone();
    let outcome = tokio::task::spawn_blocking(move || job_state.job.run(&request)).await;

    match outcome {
        Ok(Ok(_)) => echo(&payload).into_response(),
        Ok(Err(MirrorError::Fetch(err))) => {
            error!(gem = payload.full_name(), "fetch failed: {err}");
            ApiError::bad_gateway().into_response()
        }
        Ok(Err(err)) => {
            error!(gem = payload.full_name(), "ingestion failed: {err}");
            ApiError::internal().into_response()
        }
        Err(err) => {
            error!("ingestion task panicked: {err}");
            ApiError::internal().into_response()
        }
    }
}

/// POST /api/v1/remove_spec.json: unindex one gem version.
pub async fn remove_spec(
    Extension(state): Extension<Arc<AppState>>,
    body: String,
) -> Response {
    let payload = match parse_payload(&state.token, &body) {
        Ok(payload) => payload,
        Err(err) => return err.into_response(),
    };

    info!(gem = payload.full_name(), "webhook: remove spec");

    let db = state.write_db.clone();
    let request = payload.clone();
    let removed = tokio::task::spawn_blocking(move || {
        db.with_conn(|conn| {
            SpecStore::soft_remove(conn, &request.name, &request.version, &request.platform)
        })
    })
    .await;

    match removed {
        Ok(Ok(removed)) => {
            if !removed {
                warn!(gem = payload.full_name(), "remove spec matched no version");
            }
            echo(&payload).into_response()
        }
        Ok(Err(err)) => {
            error!(gem = payload.full_name(), "remove failed: {err}");
            ApiError::internal().into_response()
        }
        Err(err) => {
            error!("remove task panicked: {err}");
            ApiError::internal().into_response()
        }
    }
}

/// GET /health: store reachability.
pub async fn health(Extension(state): Extension<Arc<AppState>>) -> Response {
    let db = state.read_db.clone();
    match tokio::task::spawn_blocking(move || db.ping()).await {
        Ok(Ok(())) => Json(json!({ "status": "ok" })).into_response(),
        Ok(Err(err)) => {
            error!("health check failed: {err}");
            ApiError::internal().into_response()
        }
        Err(err) => {
            error!("health task panicked: {err}");
            ApiError::internal().into_response()
        }
    }
}

pub async fn quick_redirect(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    redirect(&state.upstream_url, &format!("/quick/Marshal.4.8/{id}"))
}

pub async fn fetch_redirect(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    redirect(&state.upstream_url, &format!("/fetch/actual/gem/{id}"))
}

pub async fn gem_redirect(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    redirect(&state.upstream_url, &format!("/gems/{id}"))
}

pub async fn specs_redirect(Extension(state): Extension<Arc<AppState>>) -> Response {
    redirect(&state.upstream_url, "/specs.4.8.gz")
}

/// 302 to the same path on the upstream origin.
fn redirect(upstream_url: &str, path: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, format!("{upstream_url}{path}"))],
    )
        .into_response()
}

/// `gems` query parameter as a name list. `None` when absent, which
/// short-circuits to an empty 200 response.
fn gem_names(params: &HashMap<String, String>) -> Option<Vec<String>> {
    params.get("gems").map(|raw| {
        raw.split(',')
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    })
}

async fn resolve_snapshot(
    state: &Arc<AppState>,
    names: Vec<String>,
) -> Result<Vec<DependencyRecord>, ApiError> {
    let state = state.clone();
    tokio::task::spawn_blocking(move || state.snapshot.snapshot_for(&names))
        .await
        .map_err(|err| {
            error!("snapshot task panicked: {err}");
            ApiError::internal()
        })?
        .map_err(|err| {
            error!("snapshot failed: {err}");
            ApiError::internal()
        })
}

/// Validates a webhook body: token first (exact-string match), then
/// each required field in order, naming the first one missing.
fn parse_payload(
    configured_token: &Option<String>,
    body: &str,
) -> Result<IngestionRequest, ApiError> {
    let value: Value =
        serde_json::from_str(body).map_err(|_| ApiError::unprocessable("invalid JSON"))?;

    if let Some(expected) = configured_token {
        let supplied = value.get("rubygems_token").and_then(Value::as_str);
        if supplied != Some(expected.as_str()) {
            return Err(ApiError::forbidden("invalid token"));
        }
    }

    for key in REQUIRED_FIELDS {
        if value.get(key).is_none_or(Value::is_null) {
            return Err(ApiError::unprocessable(format!("no spec {key} given")));
        }
    }

    let name = value["name"]
        .as_str()
        .ok_or_else(|| ApiError::unprocessable("no spec name given"))?;
    let version = value["version"]
        .as_str()
        .ok_or_else(|| ApiError::unprocessable("no spec version given"))?;
    let platform = value["platform"]
        .as_str()
        .ok_or_else(|| ApiError::unprocessable("no spec platform given"))?;
    let prerelease = value["prerelease"]
        .as_bool()
        .ok_or_else(|| ApiError::unprocessable("no spec prerelease given"))?;

    Ok(IngestionRequest::new(name, version, platform, prerelease))
}

fn echo(payload: &IngestionRequest) -> Json<Value> {
    Json(json!({
        "name": payload.name,
        "version": payload.version,
        "platform": payload.platform,
        "prerelease": payload.prerelease,
    }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use gemmirror_core::config::Config;
    use gemmirror_db::{
        models::{NewSpec, SpecDependency},
        Database,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::routes;

    fn test_state(token: Option<&str>) -> Arc<AppState> {
        let db = Database::open(":memory:").unwrap();
        let config = Config {
            token: token.map(str::to_string),
            upstream_url: "https://upstream.test".to_string(),
            ..Config::default()
        };
        Arc::new(AppState::new(db.clone(), db, &config))
    }

    fn app(state: Arc<AppState>) -> Router {
        routes::router(state)
    }

    fn seed(state: &Arc<AppState>, name: &str, version: &str, deps: Vec<SpecDependency>) {
        state
            .write_db
            .transaction(|conn| {
                SpecStore::upsert_spec(
                    conn,
                    &NewSpec {
                        name: name.to_string(),
                        number: version.to_string(),
                        platform: "ruby".to_string(),
                        authors: None,
                        description: None,
                        summary: None,
                        full_name: format!("{name}-{version}"),
                        dependencies: deps,
                    },
                )
            })
            .unwrap();
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn add_spec_missing_platform_names_the_field() {
        let app = app(test_state(None));
        let body = r#"{"name":"foo","version":"1.0.0","prerelease":false}"#;

        let response = app
            .oneshot(post_json("/api/v1/add_spec.json", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(text, "no spec platform given");
    }

    #[tokio::test]
    async fn add_spec_invalid_json_is_unprocessable() {
        let app = app(test_state(None));

        let response = app
            .oneshot(post_json("/api/v1/add_spec.json", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(text, "invalid JSON");
    }

    #[tokio::test]
    async fn add_spec_token_mismatch_is_forbidden() {
        let app = app(test_state(Some("T")));
        let body = r#"{"name":"foo","version":"1.0.0","platform":"ruby","prerelease":false,"rubygems_token":"X"}"#;

        let response = app
            .oneshot(post_json("/api/v1/add_spec.json", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn add_spec_missing_token_is_forbidden_when_configured() {
        let app = app(test_state(Some("T")));
        let body = r#"{"name":"foo","version":"1.0.0","platform":"ruby","prerelease":false}"#;

        let response = app
            .oneshot(post_json("/api/v1/add_spec.json", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn add_spec_known_version_echoes_without_fetching() {
        let state = test_state(None);
        seed(&state, "foo", "1.0.0", vec![]);
        let app = app(state);

        // already mirrored: the skip path answers without any upstream
        // traffic
        let body = r#"{"name":"foo","version":"1.0.0","platform":"ruby","prerelease":false}"#;
        let response = app
            .oneshot(post_json("/api/v1/add_spec.json", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let echoed: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(
            echoed,
            json!({"name":"foo","version":"1.0.0","platform":"ruby","prerelease":false})
        );
    }

    #[tokio::test]
    async fn remove_spec_unindexes_the_version() {
        let state = test_state(None);
        seed(&state, "foo", "1.0.0", vec![]);
        let app = app(state.clone());

        let body = r#"{"name":"foo","version":"1.0.0","platform":"ruby","prerelease":false}"#;
        let response = app
            .oneshot(post_json("/api/v1/remove_spec.json", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let records = state
            .write_db
            .with_conn(|conn| SpecStore::deps_for(conn, &["foo".to_string()]))
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn dependencies_without_gems_param_is_empty_ok() {
        let app = app(test_state(None));

        let response = app.oneshot(get("/api/v1/dependencies")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn dependencies_json_serves_the_snapshot() {
        let state = test_state(None);
        seed(&state, "bar", "2.1.0", vec![]);
        seed(
            &state,
            "foo",
            "1.0.0",
            vec![SpecDependency {
                name: "bar".to_string(),
                requirements: ">= 2.0".to_string(),
                scope: "runtime".to_string(),
            }],
        );
        let app = app(state);

        let response = app
            .oneshot(get("/api/v1/dependencies.json?gems=foo"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let records: Vec<DependencyRecord> =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "foo");
        assert_eq!(records[0].version, "1.0.0");
        assert_eq!(
            records[0].dependencies,
            vec![("bar".to_string(), ">= 2.0".to_string())]
        );
    }

    #[tokio::test]
    async fn dependencies_binary_matches_json_snapshot() {
        let state = test_state(None);
        seed(&state, "foo", "1.0.0", vec![]);
        let app = app(state);

        let response = app
            .oneshot(get("/api/v1/dependencies?gems=foo,missing"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/octet-stream"
        );

        let records: Vec<DependencyRecord> =
            bincode::deserialize(&body_bytes(response).await).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "foo");
    }

    #[tokio::test]
    async fn passthrough_endpoints_redirect_upstream() {
        let app = app(test_state(None));

        let cases = [
            ("/gems/foo-1.0.0.gem", "https://upstream.test/gems/foo-1.0.0.gem"),
            (
                "/quick/Marshal.4.8/foo-1.0.0.gemspec.rz",
                "https://upstream.test/quick/Marshal.4.8/foo-1.0.0.gemspec.rz",
            ),
            (
                "/fetch/actual/gem/foo-1.0.0.gem",
                "https://upstream.test/fetch/actual/gem/foo-1.0.0.gem",
            ),
            ("/specs.4.8.gz", "https://upstream.test/specs.4.8.gz"),
        ];

        for (path, location) in cases {
            let response = app.clone().oneshot(get(path)).await.unwrap();
            assert_eq!(response.status(), StatusCode::FOUND, "path {path}");
            assert_eq!(
                response.headers().get(header::LOCATION).unwrap(),
                location,
                "path {path}"
            );
        }
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app(test_state(None));

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
