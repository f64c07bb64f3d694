use axum::{
    extract::State,
    http::HeaderMap,
    routing::{post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UpdateRequest,
            UpdateResponse,
        },
        error::AuthError,
        extractors::AppJson,
        jwt::AuthUser,
    },
    state::AppState,
};

/// Header naming the account an update targets.
const EMAIL_HEADER: &str = "email";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/update", put(update))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AuthError> {
    state.auth.register(payload).await.map(Json)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    state.auth.login(payload).await.map(Json)
}

#[instrument(skip(state, headers, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    headers: HeaderMap,
    AppJson(payload): AppJson<UpdateRequest>,
) -> Result<Json<UpdateResponse>, AuthError> {
    let email = headers.get(EMAIL_HEADER).and_then(|v| v.to_str().ok());
    state.auth.update(user_id, email, payload).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        Router::new().merge(auth_routes()).with_state(state)
    }

    async fn call(
        state: &AppState,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
        body: Value,
    ) -> (StatusCode, Value) {
        let (status, _, value) = send(state, method, path, headers, body.to_string()).await;
        (status, value)
    }

    async fn send(
        state: &AppState,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> (StatusCode, String, Value) {
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        let res = app(state.clone())
            .oneshot(req.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, content_type, value)
    }

    async fn register(state: &AppState, email: &str, password: &str) -> (StatusCode, Value) {
        call(
            state,
            Method::POST,
            "/auth/register",
            &[],
            json!({ "email": email, "firstName": "Ann", "lastName": "Lee", "password": password }),
        )
        .await
    }

    #[tokio::test]
    async fn register_returns_authtoken_and_email() {
        let state = AppState::fake();
        let (status, body) = register(&state, "a@b.com", "p1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "a@b.com");
        let token = body["authtoken"].as_str().unwrap();
        assert!(state.auth.keys().verify(token).is_ok());
    }

    #[tokio::test]
    async fn duplicate_register_is_400_with_error() {
        let state = AppState::fake();
        register(&state, "a@b.com", "p1").await;
        let (status, body) = register(&state, "a@b.com", "p1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email id already exists");
    }

    #[tokio::test]
    async fn invalid_register_lists_field_errors() {
        let state = AppState::fake();
        let (status, body) = register(&state, "bad", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["email", "password"]);
    }

    #[tokio::test]
    async fn register_without_password_lists_field_error() {
        let state = AppState::fake();
        let (status, content_type, body) = send(
            &state,
            Method::POST,
            "/auth/register",
            &[],
            r#"{"email":"a@b.com","firstName":"A","lastName":"B"}"#.into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type, "application/json");
        assert_eq!(body["errors"][0]["field"], "password");
    }

    #[tokio::test]
    async fn truncated_bodies_get_json_errors() {
        let state = AppState::fake();
        for path in ["/auth/register", "/auth/login"] {
            let (status, content_type, body) =
                send(&state, Method::POST, path, &[], r#"{"email":"a@b"#.into()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(content_type, "application/json", "{path}");
            assert!(body["error"].is_string(), "{path}");
        }

        let (_, a) = register(&state, "a@b.com", "p1").await;
        let bearer = format!("Bearer {}", a["authtoken"].as_str().unwrap());
        let (status, content_type, body) = send(
            &state,
            Method::PUT,
            "/auth/update",
            &[("authorization", bearer.as_str()), ("email", "a@b.com")],
            r#"{"name": 42}"#.into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type, "application/json");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn login_with_missing_fields_is_invalid_credentials() {
        let state = AppState::fake();
        let (status, body) = call(&state, Method::POST, "/auth/login", &[], json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn login_failures_share_one_response() {
        let state = AppState::fake();
        register(&state, "a@b.com", "p1").await;

        let (ok_status, ok_body) = call(
            &state,
            Method::POST,
            "/auth/login",
            &[],
            json!({ "email": "a@b.com", "password": "p1" }),
        )
        .await;
        assert_eq!(ok_status, StatusCode::OK);
        assert_eq!(ok_body["userName"], "Ann");
        assert_eq!(ok_body["userEmail"], "a@b.com");
        assert!(ok_body["authtoken"].is_string());

        let wrong = call(
            &state,
            Method::POST,
            "/auth/login",
            &[],
            json!({ "email": "a@b.com", "password": "wrong" }),
        )
        .await;
        let unknown = call(
            &state,
            Method::POST,
            "/auth/login",
            &[],
            json!({ "email": "ghost@b.com", "password": "p1" }),
        )
        .await;
        assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);
        assert!(wrong.1.get("authtoken").is_none());
    }

    #[tokio::test]
    async fn update_requires_token_and_matching_email() {
        let state = AppState::fake();
        let (_, a) = register(&state, "a@b.com", "p1").await;
        let (_, b) = register(&state, "b@b.com", "p2").await;
        let bearer_a = format!("Bearer {}", a["authtoken"].as_str().unwrap());
        let bearer_b = format!("Bearer {}", b["authtoken"].as_str().unwrap());

        let (status, _) = call(
            &state,
            Method::PUT,
            "/auth/update",
            &[("email", "a@b.com")],
            json!({ "name": "Ann" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(
            &state,
            Method::PUT,
            "/auth/update",
            &[("authorization", bearer_a.as_str())],
            json!({ "name": "Ann" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email not found in the request headers");

        let (status, _) = call(
            &state,
            Method::PUT,
            "/auth/update",
            &[("authorization", bearer_b.as_str()), ("email", "a@b.com")],
            json!({ "name": "Mallory" }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(
            &state,
            Method::PUT,
            "/auth/update",
            &[("authorization", bearer_a.as_str()), ("email", "nobody@b.com")],
            json!({ "name": "Ann" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(
            &state,
            Method::PUT,
            "/auth/update",
            &[("authorization", bearer_a.as_str()), ("email", "a@b.com")],
            json!({ "name": "Ann" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let claims = state
            .auth
            .keys()
            .verify(body["authtoken"].as_str().unwrap())
            .unwrap();
        let original = state
            .auth
            .keys()
            .verify(a["authtoken"].as_str().unwrap())
            .unwrap();
        assert_eq!(claims.user.id, original.user.id);
    }
}
