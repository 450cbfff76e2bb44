// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use thiserror::Error;

use crate::{
    MapErr,
    consumer::ConsumerRepository,
    oauth2::{OAuth2CredentialRepository, OAuth2TokenRepository},
};

/// A type-erased [`RepositoryAccess`], with its error type erased into a
/// [`RepositoryError`]
///
/// Dropping it releases the underlying storage session.
pub type BoxRepository = Box<dyn RepositoryAccess<Error = RepositoryError> + Send + Sync + 'static>;

/// An opaque, type-erased error
#[derive(Debug, Error)]
#[error(transparent)]
pub struct RepositoryError {
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl RepositoryError {
    /// Construct a [`RepositoryError`] from any error kind
    pub fn from_error<E>(value: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            source: Box::new(value),
        }
    }
}

/// Access the various repositories the backend implements.
pub trait RepositoryAccess: Send {
    /// The backend-specific error type used by each repository.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Get an [`OAuth2TokenRepository`]
    fn oauth2_token<'c>(
        &'c mut self,
    ) -> Box<dyn OAuth2TokenRepository<Error = Self::Error> + 'c>;

    /// Get an [`OAuth2CredentialRepository`]
    fn oauth2_credential<'c>(
        &'c mut self,
    ) -> Box<dyn OAuth2CredentialRepository<Error = Self::Error> + 'c>;

    /// Get a [`ConsumerRepository`]
    fn consumer<'c>(&'c mut self) -> Box<dyn ConsumerRepository<Error = Self::Error> + 'c>;
}

impl<R, F, E> RepositoryAccess for MapErr<R, F>
where
    R: RepositoryAccess,
    F: FnMut(R::Error) -> E + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn oauth2_token<'c>(
        &'c mut self,
    ) -> Box<dyn OAuth2TokenRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.oauth2_token(), &mut self.mapper))
    }

    fn oauth2_credential<'c>(
        &'c mut self,
    ) -> Box<dyn OAuth2CredentialRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.oauth2_credential(), &mut self.mapper))
    }

    fn consumer<'c>(&'c mut self) -> Box<dyn ConsumerRepository<Error = Self::Error> + 'c> {
        Box::new(MapErr::new(self.inner.consumer(), &mut self.mapper))
    }
}
