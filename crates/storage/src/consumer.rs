// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Repository to read the gateway consumers

use async_trait::async_trait;
use sweeper_data_model::{Consumer, Uuid};

use crate::repository_impl;

/// A [`ConsumerRepository`] helps reading [`Consumer`] from the storage
/// backend
#[async_trait]
pub trait ConsumerRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Lookup a consumer by its ID
    ///
    /// Returns `None` if no [`Consumer`] was found
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn lookup(&mut self, id: Uuid) -> Result<Option<Consumer>, Self::Error>;
}

repository_impl!(ConsumerRepository:
    async fn lookup(&mut self, id: Uuid) -> Result<Option<Consumer>, Self::Error>;
);
