use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, models::Role};

/// Claims issued by the external identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_farmer(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Farmer)
}

pub fn ensure_customer(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Customer)
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthenticated)?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthenticated)?
        .trim();
    Ok(Some(token))
}

fn decode_user(token: &str) -> Result<AuthUser, AppError> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected bearer token");
        AppError::Unauthenticated
    })?;

    let user_id =
        Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthenticated)?;
    let role = Role::parse(&decoded.claims.role).ok_or(AppError::Unauthenticated)?;

    Ok(AuthUser { user_id, role })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or(AppError::Unauthenticated)?;
        decode_user(token)
    }
}

/// Guest-friendly endpoints take `Option<AuthUser>`: no header means a guest,
/// a bad header is still rejected.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => decode_user(token).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(sub: &str, role: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            exp: (chrono::Utc::now().timestamp() + 600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/orders");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn decodes_role_and_rejects_bad_credentials() {
        // SAFETY: single test touching this variable.
        unsafe { std::env::set_var("JWT_SECRET", "test-secret") };
        let id = Uuid::new_v4();

        let mut ok = parts(Some(&format!("Bearer {}", token(&id.to_string(), "farmer"))));
        let user = <AuthUser as FromRequestParts<()>>::from_request_parts(&mut ok, &())
            .await
            .unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.role, Role::Farmer);
        assert!(ensure_farmer(&user).is_ok());
        assert!(matches!(ensure_customer(&user), Err(AppError::Forbidden)));

        let mut unknown_role = parts(Some(&format!("Bearer {}", token(&id.to_string(), "admin"))));
        let err = <AuthUser as FromRequestParts<()>>::from_request_parts(&mut unknown_role, &())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unauthenticated");

        let mut missing = parts(None);
        let guest =
            <AuthUser as OptionalFromRequestParts<()>>::from_request_parts(&mut missing, &())
                .await
                .unwrap();
        assert!(guest.is_none());

        let mut garbage = parts(Some("Basic abc"));
        assert!(
            <AuthUser as OptionalFromRequestParts<()>>::from_request_parts(&mut garbage, &())
                .await
                .is_err()
        );
    }
}
