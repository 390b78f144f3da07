use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::dto::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest},
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Err(AppError::ValidationFailure(format!("{field} is required")));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let Json(payload) = payload?;
    require("email", &payload.email)?;
    require("password", &payload.password)?;

    state
        .auth
        .register(payload.name, payload.email, payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("User registered successfully")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(payload) = payload?;
    let token = state.auth.login(payload.email, payload.password).await?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".into(),
        token,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        app::build_app,
        state::AppState,
        test_support::{json_request, send},
    };

    #[tokio::test]
    async fn register_then_login_over_http() {
        let state = AppState::fake();
        let app = build_app(state.clone());

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/register",
                json!({ "name": "Ada", "email": "ada@example.com", "password": "s3cret" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "success": true, "message": "User registered successfully" }));

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/login",
                json!({ "email": "ada@example.com", "password": "s3cret" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let token = body["token"].as_str().expect("token");
        let claims = state.auth.keys().verify(token).unwrap();
        assert_eq!(claims.email, "ada@example.com");
        assert!(!body.to_string().contains("argon2"));
    }

    #[tokio::test]
    async fn duplicate_registration_is_400() {
        let app = build_app(AppState::fake());
        let req = || {
            json_request(
                "POST",
                "/api/auth/register",
                json!({ "name": "Ada", "email": "ada@example.com", "password": "pw" }),
            )
        };
        assert_eq!(send(&app, req()).await.0, StatusCode::CREATED);

        let (status, body) = send(&app, req()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "message": "User already exists" }));
    }

    #[tokio::test]
    async fn bad_credentials_are_401() {
        let app = build_app(AppState::fake());
        send(
            &app,
            json_request(
                "POST",
                "/api/auth/register",
                json!({ "name": "Ada", "email": "ada@example.com", "password": "pw" }),
            ),
        )
        .await;

        for creds in [
            json!({ "email": "ada@example.com", "password": "pwx" }),
            json!({ "email": "nobody@example.com", "password": "pw" }),
        ] {
            let (status, body) = send(&app, json_request("POST", "/api/auth/login", creds)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["message"], "Invalid email or password");
            assert!(body.get("token").is_none());
        }
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            &app,
            json_request("POST", "/api/auth/register", json!({ "email": "ada@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/register",
                json!({ "name": "Ada", "email": "", "password": "pw" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "email is required");
    }
}
