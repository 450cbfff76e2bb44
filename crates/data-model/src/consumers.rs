// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use serde::Serialize;
use uuid::Uuid;

/// An OAuth 2.0 credential registered on the gateway, owned by a [`Consumer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OAuth2Credential {
    pub id: Uuid,
    pub consumer_id: Uuid,
}

/// A registered API client
///
/// The gateway only requires one of `username` and `custom_id` to be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Consumer {
    pub id: Uuid,
    pub username: Option<String>,
    pub custom_id: Option<String>,
}

impl Consumer {
    /// A human readable name for this consumer
    ///
    /// Falls back to the custom ID, then to the consumer ID, when no username
    /// is set.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.username
            .as_deref()
            .or(self.custom_id.as_deref())
            .map_or_else(|| self.id.to_string(), ToOwned::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        let id = Uuid::from_u128(42);
        let mut consumer = Consumer {
            id,
            username: Some("mobile-app".to_owned()),
            custom_id: Some("app-7".to_owned()),
        };
        assert_eq!(consumer.display_name(), "mobile-app");

        consumer.username = None;
        assert_eq!(consumer.display_name(), "app-7");

        consumer.custom_id = None;
        assert_eq!(consumer.display_name(), id.to_string());
    }
}
