// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! A module containing the Cassandra implementation of the OAuth2-related
//! repositories

mod credential;
mod token;

pub use self::{
    credential::CassandraOAuth2CredentialRepository, token::CassandraOAuth2TokenRepository,
};
