//! Request context: who is calling and from where.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::domain::UserId;
use crate::error::PollError;
use crate::service::Voter;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Origin recorded when no forwarding header is present.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// Identity and network origin of the caller, extracted per request.
///
/// The user id comes from the `x-user-id` header; an absent or blank
/// header means an anonymous caller. The origin is the first hop of
/// `x-forwarded-for`, else `x-real-ip`, else `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Identified user, if any.
    pub user_id: Option<UserId>,
    /// Client network origin.
    pub origin: String,
}

impl Actor {
    /// Builds an actor from request headers.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::InvalidRequest`] if `x-user-id` is present but
    /// is not a UUID.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, PollError> {
        let user_id = match header_str(headers, USER_ID_HEADER) {
            Some(raw) => Some(
                raw.parse::<UserId>()
                    .map_err(|_| PollError::InvalidRequest(format!("invalid {USER_ID_HEADER} header")))?,
            ),
            None => None,
        };

        let origin = header_str(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| header_str(headers, "x-real-ip"))
            .unwrap_or(UNKNOWN_ORIGIN)
            .to_string();

        Ok(Self { user_id, origin })
    }

    /// Returns the caller's user id.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Unauthorized`] for anonymous callers.
    pub fn require_user(&self) -> Result<UserId, PollError> {
        self.user_id.ok_or(PollError::Unauthorized)
    }

    /// Converts the caller into a [`Voter`].
    #[must_use]
    pub fn voter(&self) -> Voter {
        Voter {
            user_id: self.user_id,
            origin: self.origin.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = PollError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
