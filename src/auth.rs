use axum::{
    RequestPartsExt,
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, Cookie, HeaderMapExt, authorization::Bearer},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, Result},
};

/// Claims of a session token issued by the hosted auth provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Claims {
    /// Sign a token the way the auth provider does. Sessions are issued
    /// elsewhere; this exists for tooling and tests.
    pub fn issue(
        user_id: Uuid,
        email: Option<String>,
        jwt_secret: &str,
        audience: &str,
        ttl: Duration,
    ) -> Result<(String, Self)> {
        let now = Utc::now();
        let claims = Self {
            sub: user_id.to_string(),
            aud: audience.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            email,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(jwt_secret.as_ref()),
        )?;

        Ok((token, claims))
    }

    pub fn verify(token: &str, jwt_secret: &str, audience: &str) -> Result<Self> {
        let mut validation = Validation::default();
        validation.set_audience(&[audience]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(jwt_secret.as_ref()),
            &validation,
        )?;

        Ok(token_data.claims)
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

async fn session_token(parts: &mut Parts, cookie_name: &str) -> Option<String> {
    if let Ok(TypedHeader(Authorization(bearer))) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
    {
        return Some(bearer.token().to_string());
    }

    // form posts from the browser carry the session in a cookie
    parts
        .headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(cookie_name).map(str::to_string))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = session_token(parts, &state.config.session_cookie)
            .await
            .ok_or_else(|| AppError::Authentication("Not authenticated".to_string()))?;

        let claims = Claims::verify(&token, &state.config.jwt_secret, &state.config.jwt_audience)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Authentication("Invalid user ID in token".to_string()))?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
        })
    }
}

// Optional auth user (anonymous viewing, and flows that branch on "not signed in")
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl OptionalAuthUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.user_id)
    }

    /// The caller's id, or an authentication error if there is no session.
    pub fn require(&self) -> Result<Uuid> {
        self.user_id()
            .ok_or_else(|| AppError::Authentication("Not authenticated".to_string()))
    }
}

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(OptionalAuthUser(Some(user))),
            Err(e) => {
                tracing::trace!("Treating request as anonymous: {}", e);
                Ok(OptionalAuthUser(None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issued_tokens_verify() {
        let user_id = Uuid::new_v4();
        let (token, _) = Claims::issue(user_id, None, SECRET, "authenticated", Duration::hours(1))
            .unwrap();

        let claims = Claims::verify(&token, SECRET, "authenticated").unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn wrong_audience_or_secret_is_rejected() {
        let (token, _) = Claims::issue(
            Uuid::new_v4(),
            None,
            SECRET,
            "authenticated",
            Duration::hours(1),
        )
        .unwrap();

        assert!(Claims::verify(&token, SECRET, "service_role").is_err());
        assert!(Claims::verify(&token, "other-secret", "authenticated").is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let (token, _) = Claims::issue(
            Uuid::new_v4(),
            None,
            SECRET,
            "authenticated",
            Duration::hours(-2),
        )
        .unwrap();

        assert!(matches!(
            Claims::verify(&token, SECRET, "authenticated"),
            Err(AppError::Jwt(_))
        ));
    }
}
