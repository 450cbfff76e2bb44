// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use async_trait::async_trait;
use sweeper_data_model::{OAuth2Credential, Uuid};

use crate::repository_impl;

/// An [`OAuth2CredentialRepository`] helps reading [`OAuth2Credential`] from
/// the storage backend
#[async_trait]
pub trait OAuth2CredentialRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Lookup a credential by its ID
    ///
    /// Returns `None` if no [`OAuth2Credential`] was found
    ///
    /// # Parameters
    ///
    /// * `id`: The ID of the credential to lookup
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn lookup(&mut self, id: Uuid) -> Result<Option<OAuth2Credential>, Self::Error>;
}

repository_impl!(OAuth2CredentialRepository:
    async fn lookup(&mut self, id: Uuid) -> Result<Option<OAuth2Credential>, Self::Error>;
);
