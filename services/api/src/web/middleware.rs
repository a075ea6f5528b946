//! services/api/src/web/middleware.rs
//!
//! Identity middleware and the role gate.
//!
//! Authentication itself is an external collaborator: an upstream gateway
//! verifies credentials and forwards the caller's identity in trusted
//! headers. This middleware only parses those claims; it never re-checks
//! credentials.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;
use vidya_core::domain::{Identity, Role};
use vidya_core::ports::{PortError, PortResult};

const USER_ID_HEADER: &str = "x-user-id";
const USER_NAME_HEADER: &str = "x-user-name";
const USER_ROLE_HEADER: &str = "x-user-role";

/// Middleware that parses the identity headers and makes an `Identity`
/// available to handlers via request extensions.
///
/// Missing or malformed claims get 401 Unauthorized.
pub async fn require_identity(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let identity = identity_from_headers(req.headers())?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Parses the trusted identity headers into an `Identity`.
pub fn identity_from_headers(headers: &HeaderMap) -> Result<Identity, StatusCode> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let role = headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(Role::parse)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let name = headers
        .get(USER_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Anonymous")
        .to_string();

    Ok(Identity {
        user_id,
        name,
        role,
    })
}

/// The single place "am I allowed" is decided for mutations, instead of
/// re-deriving role checks in every handler and view.
pub fn require_role(identity: &Identity, allowed: &[Role]) -> PortResult<()> {
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(PortError::Forbidden(format!(
            "role '{}' may not perform this action",
            identity.role.as_str()
        )))
    }
}
