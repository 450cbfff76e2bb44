// Copyright 2024 New Vector Ltd.
// Copyright 2021-2024 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Interactions with the storage backend
//!
//! This crate provides a set of traits that can be implemented to interact with
//! the storage backend. Those traits are called repositories and are grouped by
//! the table they manage.
//!
//! Each of those repositories can be accessed via the [`RepositoryAccess`]
//! trait. This trait can be wrapped in a [`BoxRepository`] to allow using it
//! without caring about the underlying storage backend, and without carrying
//! around the generic type parameter.
//!
//! Two backends exist: the Cassandra one in `sweeper-storage-cassandra`, and
//! the [`memory`] one in this crate, which is useful for testing.
//!
//! # Defining a new repository
//!
//! To define a new repository, you have to:
//!   1. Define a new (async) repository trait, with the methods you need
//!   2. Write an implementation of this trait for each storage backend
//!   3. Make it accessible via the [`RepositoryAccess`] trait
//!
//! The repository trait definition should look like this:
//!
//! ```ignore
//! #[async_trait]
//! pub trait FakeDataRepository: Send + Sync {
//!     /// The error type returned by the repository
//!     type Error;
//!
//!     /// Lookup a [`FakeData`] by its ID
//!     ///
//!     /// Returns `None` if no [`FakeData`] was found
//!     ///
//!     /// # Errors
//!     ///
//!     /// Returns [`Self::Error`] if the underlying repository fails
//!     async fn lookup(&mut self, id: Uuid) -> Result<Option<FakeData>, Self::Error>;
//! }
//!
//! repository_impl!(FakeDataRepository:
//!     async fn lookup(&mut self, id: Uuid) -> Result<Option<FakeData>, Self::Error>;
//! );
//! ```
//!
//! Lookups return a `Result<Option<T>, Self::Error>`, because 'not found'
//! errors are usually cases that are handled differently. All the methods use
//! an `&mut self`, which ensures only one operation is done at a time on a
//! single repository instance.

#![deny(clippy::future_not_send, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod consumer;
pub mod memory;
pub mod oauth2;
pub mod pagination;
pub(crate) mod repository;
mod utils;

pub use self::{
    pagination::{Page, ScanCursor},
    repository::{BoxRepository, RepositoryAccess, RepositoryError},
    utils::MapErr,
};
