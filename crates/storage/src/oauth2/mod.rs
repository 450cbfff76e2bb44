// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Repositories to interact with entities related to the OAuth 2.0 plugin of
//! the gateway

mod credential;
mod token;

pub use self::{credential::OAuth2CredentialRepository, token::OAuth2TokenRepository};
