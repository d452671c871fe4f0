//! Email/password sign-up, sign-in and session endpoints.

use std::borrow::Cow;

use axum::{Json, Router, extract::State, http::StatusCode};
use db::models::{
    session::{Session, SessionRepository},
    user::{CreateUserData, User, UserRepository},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::{Validate, ValidateEmail, ValidationError};

use crate::{
    AppState,
    auth::{MaybeSession, RequireSession, hash_password, verify_password},
    error::{ApiError, ErrorMessage},
    extract::ValidJson,
    openapi::{HttpMethod, ResponseSpec, RouteContract, schema_ref},
};

const TAG: &str = "Auth";

const MAX_NAME_LENGTH: usize = 255;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct SignUpRequest {
    #[validate(custom(function = "validate_name"))]
    #[schemars(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = "validate_email_address"))]
    #[schemars(email)]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    #[schemars(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct SignInRequest {
    #[validate(custom(function = "validate_sign_in_email"))]
    #[schemars(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schemars(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AuthResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionResponse {
    pub session: Session,
    pub user: User,
}

fn message(code: &'static str, text: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(text))
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if length == 0 {
        return Err(message("length", "Name is required"));
    }
    if length > MAX_NAME_LENGTH {
        return Err(message("length", "Name too long"));
    }
    Ok(())
}

fn validate_email_address(email: &str) -> Result<(), ValidationError> {
    if email.trim().to_string().validate_email() {
        Ok(())
    } else {
        Err(message("email", "Invalid email address"))
    }
}

fn validate_sign_in_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(message("length", "Email is required"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(message(
            "length",
            "Password must be between 8 and 128 characters",
        ));
    }
    Ok(())
}

const INVALID_BODY: ResponseSpec =
    ResponseSpec::json(422, "Invalid request body", schema_ref::<ErrorMessage>);

pub const SIGN_UP: RouteContract = RouteContract {
    operation_id: "signUpEmail",
    method: HttpMethod::Post,
    path: "/auth/sign-up/email",
    summary: "Create an account and start a session",
    tag: TAG,
    requires_session: false,
    path_params: &[],
    query: None,
    body: Some(schema_ref::<SignUpRequest>),
    responses: &[
        ResponseSpec::json(200, "Account created", schema_ref::<AuthResponse>),
        ResponseSpec::json(409, "Email already registered", schema_ref::<ErrorMessage>),
        INVALID_BODY,
    ],
};

pub const SIGN_IN: RouteContract = RouteContract {
    operation_id: "signInEmail",
    method: HttpMethod::Post,
    path: "/auth/sign-in/email",
    summary: "Start a session with email and password",
    tag: TAG,
    requires_session: false,
    path_params: &[],
    query: None,
    body: Some(schema_ref::<SignInRequest>),
    responses: &[
        ResponseSpec::json(200, "Signed in", schema_ref::<AuthResponse>),
        ResponseSpec::json(401, "Invalid email or password", schema_ref::<ErrorMessage>),
        INVALID_BODY,
    ],
};

pub const GET_SESSION: RouteContract = RouteContract {
    operation_id: "getSession",
    method: HttpMethod::Get,
    path: "/auth/get-session",
    summary: "Current session, or null when signed out",
    tag: TAG,
    requires_session: false,
    path_params: &[],
    query: None,
    body: None,
    responses: &[ResponseSpec::json(
        200,
        "The active session or null",
        schema_ref::<Option<SessionResponse>>,
    )],
};

pub const SIGN_OUT: RouteContract = RouteContract {
    operation_id: "signOut",
    method: HttpMethod::Post,
    path: "/auth/sign-out",
    summary: "Revoke the current session",
    tag: TAG,
    requires_session: true,
    path_params: &[],
    query: None,
    body: None,
    responses: &[
        ResponseSpec::empty(204, "Session revoked"),
        ResponseSpec::json(401, "No active session", schema_ref::<ErrorMessage>),
    ],
};

pub const CONTRACTS: &[RouteContract] = &[SIGN_UP, SIGN_IN, GET_SESSION, SIGN_OUT];

pub fn router() -> Router<AppState> {
    let router = Router::new();
    let router = SIGN_UP.bind(router, sign_up);
    let router = SIGN_IN.bind(router, sign_in);
    let router = GET_SESSION.bind(router, get_session);
    SIGN_OUT.bind(router, sign_out)
}

/// Open a session for `user` and sign a token for it.
async fn start_session(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let session = SessionRepository::new(state.pool())
        .create(user.id, state.config().session_ttl)
        .await?;
    let token = state
        .jwt()
        .issue_access_token(user.id, session.id, session.expires_at)?;
    Ok(AuthResponse { token, user })
}

#[instrument(name = "auth.sign_up", skip_all)]
pub async fn sign_up(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SignUpRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let password_hash = hash_password(payload.password).await?;
    let user = UserRepository::new(state.pool())
        .create(CreateUserData {
            name: payload.name,
            email: payload.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, "user signed up");
    Ok(Json(start_session(&state, user).await?))
}

#[instrument(name = "auth.sign_in", skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SignInRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = UserRepository::new(state.pool())
        .find_by_email(&payload.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(payload.password, user.password_hash.clone()).await? {
        return Err(ApiError::InvalidCredentials);
    }

    Ok(Json(start_session(&state, user).await?))
}

#[instrument(name = "auth.get_session", skip_all)]
pub async fn get_session(MaybeSession(ctx): MaybeSession) -> Json<Option<SessionResponse>> {
    Json(ctx.map(|ctx| SessionResponse {
        session: ctx.session,
        user: ctx.user,
    }))
}

#[instrument(name = "auth.sign_out", skip(state, ctx), fields(user_id = %ctx.user.id))]
pub async fn sign_out(
    State(state): State<AppState>,
    RequireSession(ctx): RequireSession,
) -> Result<StatusCode, ApiError> {
    SessionRepository::new(state.pool())
        .revoke(ctx.session.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up(name: &str, email: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_sign_up_validation() {
        assert!(sign_up("Ada", "ada@example.com", "hunter2hunter2").validate().is_ok());
        assert!(sign_up("", "ada@example.com", "hunter2hunter2").validate().is_err());
        assert!(sign_up("Ada", "not-an-email", "hunter2hunter2").validate().is_err());
        assert!(sign_up("Ada", "ada@example.com", "short").validate().is_err());
        assert!(
            sign_up("Ada", "ada@example.com", &"p".repeat(129))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_sign_in_requires_both_fields() {
        let sign_in = |email: &str, password: &str| SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        assert!(sign_in("ada@example.com", "whatever").validate().is_ok());
        assert_eq!(
            crate::error::describe_validation_errors(
                &sign_in("  ", "whatever").validate().unwrap_err()
            ),
            "email: Email is required"
        );
        assert_eq!(
            crate::error::describe_validation_errors(
                &sign_in("ada@example.com", "").validate().unwrap_err()
            ),
            "password: Password is required"
        );
    }
}
