use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use chrono::Utc;
use db::models::{
    session::{Session, SessionError, SessionRepository},
    user::{User, UserError, UserRepository},
};
use tracing::{debug, warn};

use crate::{AppState, error::ApiError};

/// The signed-in user and the session their token is bound to.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: User,
    pub session: Session,
}

/// Attach a [`RequestContext`] when the request carries a live session.
///
/// Missing, malformed, expired or revoked credentials leave the request
/// anonymous; handlers that need a session ask for [`RequireSession`].
pub async fn load_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let bearer = match req.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(token)) => token.token().to_owned(),
        None => return next.run(req).await,
    };

    let identity = match state.jwt().decode_access_token(&bearer) {
        Ok(details) => details,
        Err(error) => {
            debug!(?error, "ignoring undecodable access token");
            return next.run(req).await;
        }
    };

    let pool = state.pool();
    let session_repo = SessionRepository::new(pool);
    let session = match session_repo.get(identity.session_id).await {
        Ok(session) => session,
        Err(SessionError::NotFound) => {
            debug!("session `{}` not found", identity.session_id);
            return next.run(req).await;
        }
        Err(error @ SessionError::Database(_)) => {
            warn!(?error, "failed to load session");
            return ApiError::from(error).into_response();
        }
    };

    if session.user_id != identity.user_id || !session.is_active(Utc::now()) {
        debug!("session `{}` rejected (revoked or expired)", session.id);
        return next.run(req).await;
    }

    let user = match UserRepository::new(pool).fetch_user(session.user_id).await {
        Ok(user) => user,
        Err(UserError::NotFound) => {
            warn!("user `{}` missing", session.user_id);
            return next.run(req).await;
        }
        Err(error) => {
            warn!(?error, "failed to load user");
            return ApiError::from(error).into_response();
        }
    };

    if let Err(error) = session_repo.touch(session.id).await {
        warn!(?error, "failed to update session last-used time");
    }

    req.extensions_mut().insert(RequestContext { user, session });
    next.run(req).await
}

/// Rejects with 401 unless [`load_session`] attached a session.
#[derive(Debug, Clone)]
pub struct RequireSession(pub RequestContext);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .map(RequireSession)
            .ok_or(ApiError::Unauthorized)
    }
}

#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<RequestContext>);

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(parts.extensions.get::<RequestContext>().cloned()))
    }
}
