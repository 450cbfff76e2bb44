// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// An OAuth 2.0 access token, as issued by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Token {
    pub id: Uuid,
    pub credential_id: Uuid,
    pub expires_in: Duration,
    pub created_at: DateTime<Utc>,
}

impl OAuth2Token {
    /// The instant after which the token is considered expired
    ///
    /// Saturates to the maximum representable datetime, so a lifetime which
    /// overflows the calendar never expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at
            .checked_add_signed(self.expires_in)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the token is expired
    ///
    /// A token is expired only once `now` is strictly past its expiration
    /// instant.
    ///
    /// # Parameters
    ///
    /// * `now` - The current time
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn token(created_at: DateTime<Utc>, expires_in: i64) -> OAuth2Token {
        OAuth2Token {
            id: Uuid::new_v4(),
            credential_id: Uuid::new_v4(),
            expires_in: Duration::seconds(expires_in),
            created_at,
        }
    }

    #[test]
    fn test_expiration_boundary() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let token = token(created_at, 3600);

        assert_eq!(token.expires_at(), created_at + Duration::hours(1));

        assert!(!token.is_expired(created_at + Duration::seconds(3599)));
        // Exactly at the expiration instant, the token is still valid
        assert!(!token.is_expired(created_at + Duration::seconds(3600)));
        assert!(token.is_expired(created_at + Duration::seconds(3601)));
    }

    #[test]
    fn test_zero_lifetime() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let token = token(created_at, 0);

        assert!(!token.is_expired(created_at));
        assert!(token.is_expired(created_at + Duration::milliseconds(1)));
    }

    #[test]
    fn test_overflowing_lifetime_never_expires() {
        let token = token(DateTime::<Utc>::MAX_UTC - Duration::days(1), 86400 * 365);
        assert_eq!(token.expires_at(), DateTime::<Utc>::MAX_UTC);
        assert!(!token.is_expired(DateTime::<Utc>::MAX_UTC));
    }
}
