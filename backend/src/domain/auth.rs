//! Session claims and expiry.
//!
//! The platform's login flow stores [`SessionClaims`] in the session cookie.
//! The ledger only inspects them; issuing and refreshing sessions happen
//! elsewhere.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Identity and validity window of an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// Authenticated user.
    pub user_id: UserId,
    /// When the session was issued.
    pub issued_at: DateTime<Utc>,
    /// When the session stops being valid. `None` never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionClaims {
    /// Claims issued at `issued_at` and valid for `ttl`.
    pub fn issued(user_id: UserId, issued_at: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self {
            user_id,
            issued_at,
            expires_at: issued_at.checked_add_signed(ttl),
        }
    }

    /// Claims that never expire.
    pub const fn without_expiry(user_id: UserId, issued_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            issued_at,
            expires_at: None,
        }
    }
}

/// Whether `claims` are expired at `now`.
///
/// Expiry is inclusive: at exactly `expires_at` the session is no longer
/// valid.
///
/// # Examples
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use engagement_ledger::domain::{SessionClaims, UserId, is_expired};
///
/// let issued = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("time");
/// let claims = SessionClaims::issued(UserId::random(), issued, TimeDelta::hours(1));
/// assert!(!is_expired(&claims, issued + TimeDelta::minutes(59)));
/// assert!(is_expired(&claims, issued + TimeDelta::hours(1)));
/// ```
pub fn is_expired(claims: &SessionClaims, now: DateTime<Utc>) -> bool {
    claims.expires_at.is_some_and(|expires_at| now >= expires_at)
}
