//! Access tokens bound to stored sessions.
//!
//! A token only proves which session it was issued for; the session row
//! decides whether it is still honoured (see [`super::load_session`]).

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const AUDIENCE: &str = "bunplate";

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("invalid token")]
    InvalidToken,
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessTokenClaims {
    sub: Uuid,
    sid: Uuid,
    iat: i64,
    exp: i64,
    aud: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenDetails {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct JwtService {
    secret: Arc<SecretString>,
}

impl JwtService {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret: Arc::new(secret),
        }
    }

    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = AccessTokenClaims {
            sub: user_id,
            sid: session_id,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            aud: AUDIENCE.to_string(),
        };

        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &key)?)
    }

    pub fn decode_access_token(&self, token: &str) -> Result<AccessTokenDetails, JwtError> {
        if token.trim().is_empty() {
            return Err(JwtError::InvalidToken);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.set_audience(&[AUDIENCE]);
        validation.required_spec_claims = HashSet::from([
            "sub".to_string(),
            "exp".to_string(),
            "aud".to_string(),
        ]);
        validation.leeway = 30;

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let claims = decode::<AccessTokenClaims>(token, &key, &validation)?.claims;

        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(JwtError::InvalidToken)?;

        Ok(AccessTokenDetails {
            user_id: claims.sub,
            session_id: claims.sid,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn service(secret: &str) -> JwtService {
        JwtService::new(SecretString::from(secret))
    }

    #[test]
    fn test_issue_and_decode() {
        let jwt = service("test-secret");
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(1);

        let token = jwt
            .issue_access_token(user_id, session_id, expires_at)
            .unwrap();
        let details = jwt.decode_access_token(&token).unwrap();

        assert_eq!(details.user_id, user_id);
        assert_eq!(details.session_id, session_id);
        assert_eq!(details.expires_at.timestamp(), expires_at.timestamp());
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let token = service("one")
            .issue_access_token(Uuid::new_v4(), Uuid::new_v4(), Utc::now() + Duration::hours(1))
            .unwrap();
        assert!(service("two").decode_access_token(&token).is_err());
    }

    #[test]
    fn test_rejects_expired_and_garbage() {
        let jwt = service("test-secret");
        let expired = jwt
            .issue_access_token(Uuid::new_v4(), Uuid::new_v4(), Utc::now() - Duration::hours(1))
            .unwrap();
        assert!(jwt.decode_access_token(&expired).is_err());
        assert!(jwt.decode_access_token("not-a-token").is_err());
        assert!(matches!(
            jwt.decode_access_token("  "),
            Err(JwtError::InvalidToken)
        ));
    }
}
