// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use async_trait::async_trait;
use sweeper_data_model::OAuth2Token;

use crate::{Page, ScanCursor, repository_impl};

/// An [`OAuth2TokenRepository`] helps interacting with [`OAuth2Token`] saved
/// in the storage backend
#[async_trait]
pub trait OAuth2TokenRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Count all the tokens in the table
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn count(&mut self) -> Result<u64, Self::Error>;

    /// Fetch one page of tokens
    ///
    /// Returns the tokens of the page, and the cursor to the next page if the
    /// scan is not over
    ///
    /// # Parameters
    ///
    /// * `cursor`: Where to resume the scan, `None` to start from the
    ///   beginning
    /// * `limit`: The maximum number of tokens to fetch
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn list(
        &mut self,
        cursor: Option<ScanCursor>,
        limit: usize,
    ) -> Result<Page<OAuth2Token>, Self::Error>;

    /// Delete a token
    ///
    /// # Parameters
    ///
    /// * `token`: The token to delete
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn delete(&mut self, token: &OAuth2Token) -> Result<(), Self::Error>;
}

repository_impl!(OAuth2TokenRepository:
    async fn count(&mut self) -> Result<u64, Self::Error>;

    async fn list(
        &mut self,
        cursor: Option<ScanCursor>,
        limit: usize,
    ) -> Result<Page<OAuth2Token>, Self::Error>;

    async fn delete(&mut self, token: &OAuth2Token) -> Result<(), Self::Error>;
);
