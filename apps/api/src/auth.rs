//! Caller identity.
//!
//! Tokens are validated by the gateway in front of this service, which
//! forwards the authenticated user as `x-user-id` and/or `x-user-email`.
//! A request carrying neither is unauthenticated.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::errors::AppError;
use crate::store::{collections, DocumentStore, Filter};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

impl AuthUser {
    /// The authenticated user id, required by handlers that own resources
    /// directly (chat sessions).
    pub fn require_user_id(&self) -> Result<&str, AppError> {
        self.user_id.as_deref().ok_or(AppError::Unauthorized)
    }
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser {
            user_id: header(parts, USER_ID_HEADER),
            email: header(parts, USER_EMAIL_HEADER),
        };
        if user.user_id.is_none() && user.email.is_none() {
            return Err(AppError::Unauthorized);
        }
        Ok(user)
    }
}

/// Resolves the user an agent-result request is about.
///
/// Order: explicit `userId` from the request, then the first user whose
/// `email` matches an explicit email, then the authenticated user id, then
/// the first user matching the authenticated email. An explicit email with
/// no matching user is an error even when the caller is authenticated.
pub async fn resolve_user_id(
    store: &dyn DocumentStore,
    auth: &AuthUser,
    explicit_user_id: Option<&str>,
    explicit_email: Option<&str>,
) -> Result<String, AppError> {
    let non_empty = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(user_id) = non_empty(explicit_user_id) {
        return Ok(user_id);
    }
    if let Some(email) = non_empty(explicit_email) {
        return user_id_for_email(store, &email).await;
    }
    if let Some(user_id) = auth.user_id.clone() {
        return Ok(user_id);
    }

    let email = auth.email.clone().ok_or_else(missing_identity)?;
    user_id_for_email(store, &email).await
}

async fn user_id_for_email(store: &dyn DocumentStore, email: &str) -> Result<String, AppError> {
    let users = store
        .query(collections::USERS, &[Filter::eq("email", email)], Some(1))
        .await?;
    match users.into_iter().next() {
        Some(user) => Ok(user.id),
        None => {
            debug!("No user found for email {email}");
            Err(missing_identity())
        }
    }
}

fn missing_identity() -> AppError {
    AppError::BadRequest("userId or email required".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use serde_json::json;

    fn auth(user_id: Option<&str>, email: Option<&str>) -> AuthUser {
        AuthUser {
            user_id: user_id.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    async fn store_with_user() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        store
            .insert_with_id(
                collections::USERS,
                "user-42",
                json!({"email": "asha@example.com"}).as_object().cloned().unwrap(),
            )
            .await;
        store
    }

    #[tokio::test]
    async fn test_explicit_user_id_wins() {
        let store = store_with_user().await;
        let id = resolve_user_id(&store, &auth(Some("auth-id"), None), Some("explicit"), None)
            .await
            .unwrap();
        assert_eq!(id, "explicit");
    }

    #[tokio::test]
    async fn test_authenticated_id_used_next() {
        let store = store_with_user().await;
        let id = resolve_user_id(&store, &auth(Some("auth-id"), None), None, None)
            .await
            .unwrap();
        assert_eq!(id, "auth-id");
    }

    #[tokio::test]
    async fn test_explicit_email_beats_authenticated_id() {
        let store = store_with_user().await;
        let id = resolve_user_id(
            &store,
            &auth(Some("auth-id"), None),
            None,
            Some("asha@example.com"),
        )
        .await
        .unwrap();
        assert_eq!(id, "user-42");
    }

    #[tokio::test]
    async fn test_unmatched_explicit_email_does_not_fall_back() {
        let store = store_with_user().await;
        let err = resolve_user_id(
            &store,
            &auth(Some("auth-id"), None),
            None,
            Some("nobody@example.com"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_email_lookup() {
        let store = store_with_user().await;
        let id = resolve_user_id(&store, &auth(None, Some("asha@example.com")), None, None)
            .await
            .unwrap();
        assert_eq!(id, "user-42");
    }

    #[tokio::test]
    async fn test_unknown_email_is_client_error() {
        let store = store_with_user().await;
        let err = resolve_user_id(&store, &auth(None, Some("nobody@example.com")), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_require_user_id() {
        assert!(matches!(
            auth(None, Some("a@b.c")).require_user_id(),
            Err(AppError::Unauthorized)
        ));
        assert_eq!(auth(Some("u1"), None).require_user_id().unwrap(), "u1");
    }
}
