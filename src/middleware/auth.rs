//! Authentication extractor
//!
//! Handlers that take an [`AuthUser`] only run for requests carrying a valid
//! `Authorization: Bearer <id token>` header. The user row is created the
//! first time a token for it is seen.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use crate::models::user::User;
use crate::state::AppState;
use crate::utils::errors::CollectivError;

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.user.user_id
    }
}

/// Token part of a bearer authorization header
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = CollectivError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| CollectivError::Unauthorized("No token was provided".to_string()))?;

        let token = header
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or_else(|| CollectivError::Unauthorized("Given token is invalid".to_string()))?;

        let user_id = state.services.auth_service.verify_user_id(token)?;

        let user = state.services.user_service.get_or_create(&user_id).await?;
        debug!(user_id = %user.user_id, "Request authenticated");

        Ok(Self { user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer  token "), Some("token"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer   "), None);
    }
}
