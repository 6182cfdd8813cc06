//! Request identity.
//!
//! Authentication happens upstream; the gateway forwards the verified user id
//! in the `x-user-id` header. Handlers that change state take a
//! [`CurrentUser`]; admin-only handlers take an [`AdminUser`].
//!
//! ```text
//! x-user-id missing            → 401 UNAUTHORIZED
//! x-user-id present            → CurrentUser
//! AdminUser, no `admin` role   → 403 FORBIDDEN
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                warn!(uri = %parts.uri, "Request without user identity");
                ApiError::unauthorized()
            })?;

        let user = CurrentUser { id: id.to_string() };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// A [`CurrentUser`] holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;

        if !state.db.users().is_admin(&user.id).await? {
            warn!(user_id = %user.id, uri = %parts.uri, "Admin route denied");
            return Err(ApiError::forbidden("Admin role required"));
        }

        Ok(AdminUser(user))
    }
}
