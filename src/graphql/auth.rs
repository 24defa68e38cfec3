//! Request identity for GraphQL operations
//!
//! There is no login: the HTTP layer attaches an [`AuthUser`] taken from the
//! `x-user-id` header (or the WebSocket `connection_init` payload), falling
//! back to the configured default identity. Resolvers that write require one:
//!
//! ```ignore
//! async fn add_movie(&self, ctx: &Context<'_>) -> Result<..> {
//!     let user = ctx.auth_user()?;
//!     ...
//! }
//! ```

use async_graphql::{Context, ErrorExtensions, Result};
use serde::{Deserialize, Serialize};

/// Header carrying the caller's identity on HTTP requests
pub const USER_ID_HEADER: &str = "x-user-id";

/// Key carrying the caller's identity in a WebSocket `connection_init` payload
pub const USER_ID_INIT_KEY: &str = "userId";

/// Identity attached to a request, available in GraphQL resolvers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
}

/// Pick the identity for a request: an explicit non-blank id wins, otherwise
/// the configured default. `None` means the request is anonymous.
pub fn resolve_identity(explicit: Option<&str>, default_user_id: Option<&str>) -> Option<AuthUser> {
    explicit
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .or_else(|| default_user_id.filter(|id| !id.is_empty()))
        .map(|id| AuthUser {
            user_id: id.to_string(),
        })
}

/// Identity for a WebSocket connection: a non-blank `userId` in the
/// `connection_init` payload, then the upgrade request header, then the default.
pub fn resolve_connection_identity(
    init_payload: &serde_json::Value,
    header_user_id: Option<&str>,
    default_user_id: Option<&str>,
) -> Option<AuthUser> {
    let init_user = init_payload
        .get(USER_ID_INIT_KEY)
        .and_then(|v| v.as_str())
        .filter(|id| !id.trim().is_empty());
    resolve_identity(init_user.or(header_user_id), default_user_id)
}

/// Extension trait to get the request identity from GraphQL context
pub trait AuthExt {
    /// Get the identity, or an `UNAUTHORIZED` error if the request is anonymous
    fn auth_user(&self) -> Result<&AuthUser>;

    /// Get the identity if present
    fn try_auth_user(&self) -> Option<&AuthUser>;
}

impl<'a> AuthExt for Context<'a> {
    fn auth_user(&self) -> Result<&AuthUser> {
        self.data_opt::<AuthUser>().ok_or_else(|| {
            async_graphql::Error::new("Authentication required")
                .extend_with(|_, e| e.set("code", "UNAUTHORIZED"))
        })
    }

    fn try_auth_user(&self) -> Option<&AuthUser> {
        self.data_opt::<AuthUser>()
    }
}
