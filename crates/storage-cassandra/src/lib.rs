// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! A Cassandra implementation of the storage traits
//!
//! The tables are the ones the gateway maintains in its keyspace:
//! `oauth2_tokens`, `oauth2_credentials` and `consumers`. Every statement is
//! prepared once when the session is opened and executed with bound values.

#![deny(clippy::future_not_send, missing_docs)]
#![allow(clippy::module_name_repetitions)]

use std::error::Error as StdError;

use scylla::errors::{ExecutionError, NewSessionError, PrepareError};
use thiserror::Error;

mod consumer;
mod oauth2;
mod repository;
mod tls;
pub(crate) mod tracing;

pub use self::{
    consumer::CassandraConsumerRepository,
    oauth2::{CassandraOAuth2CredentialRepository, CassandraOAuth2TokenRepository},
    repository::{CassandraRepository, ConnectOptions},
    tls::{TlsError, client_config_from_trust_store},
};

/// Generic error when interacting with the database
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Could not open a session on the cluster
    #[error("could not connect to the cluster")]
    Connect(#[from] NewSessionError),

    /// A statement was rejected while preparing it
    #[error("could not prepare statement")]
    Prepare(#[from] PrepareError),

    /// An error which came from the driver while running a statement
    #[error(transparent)]
    Driver(#[from] ExecutionError),

    /// The response could not be decoded into the expected rows
    #[error("could not decode the rows returned by the database")]
    Decode {
        /// The underlying error
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    /// A value was out of the expected range
    #[error("unexpected value for {column}: {value}")]
    OutOfRange {
        /// The column holding the value
        column: &'static str,

        /// The value itself
        value: i64,
    },
}

impl DatabaseError {
    pub(crate) fn decode<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Decode {
            source: Box::new(source),
        }
    }
}
