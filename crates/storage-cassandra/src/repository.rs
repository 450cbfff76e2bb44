// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::sync::Arc;

use rustls::ClientConfig;
use scylla::{
    client::{session::Session, session_builder::SessionBuilder},
    statement::prepared::PreparedStatement,
};
use sweeper_storage::{
    BoxRepository, MapErr, RepositoryAccess, RepositoryError,
    consumer::ConsumerRepository,
    oauth2::{OAuth2CredentialRepository, OAuth2TokenRepository},
};
use tracing::{Instrument, info_span};

use crate::{
    DatabaseError,
    consumer::CassandraConsumerRepository,
    oauth2::{CassandraOAuth2CredentialRepository, CassandraOAuth2TokenRepository},
};

/// Parameters used to open a session on the cluster
#[derive(Clone)]
pub struct ConnectOptions {
    /// Hostname or IP of one contact point
    pub host: String,

    /// Port of the CQL native protocol
    pub port: u16,

    /// Keyspace holding the gateway tables
    pub keyspace: String,

    /// Username to authenticate with
    pub username: String,

    /// Password to authenticate with
    pub password: String,

    /// TLS configuration, `None` to connect in plain text
    pub tls: Option<Arc<ClientConfig>>,
}

impl std::fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("keyspace", &self.keyspace)
            .field("username", &self.username)
            .field("tls", &self.tls.is_some())
            .finish_non_exhaustive()
    }
}

/// The statements used by the repositories, prepared once per session
pub(crate) struct Statements {
    pub(crate) count_tokens: PreparedStatement,
    pub(crate) list_tokens: PreparedStatement,
    pub(crate) delete_token: PreparedStatement,
    pub(crate) lookup_credential: PreparedStatement,
    pub(crate) lookup_consumer: PreparedStatement,
}

impl Statements {
    async fn prepare(session: &Session) -> Result<Self, DatabaseError> {
        Ok(Self {
            count_tokens: session
                .prepare("SELECT COUNT(*) FROM oauth2_tokens")
                .await?,
            list_tokens: session
                .prepare("SELECT id, credential_id, expires_in, created_at FROM oauth2_tokens")
                .await?,
            delete_token: session
                .prepare("DELETE FROM oauth2_tokens WHERE id = ?")
                .await?,
            lookup_credential: session
                .prepare("SELECT id, consumer_id FROM oauth2_credentials WHERE id = ?")
                .await?,
            lookup_consumer: session
                .prepare("SELECT id, username, custom_id FROM consumers WHERE id = ?")
                .await?,
        })
    }
}

/// An implementation of the [`RepositoryAccess`] trait backed by a Cassandra
/// session
///
/// The session is closed when the repository is dropped.
pub struct CassandraRepository {
    session: Session,
    statements: Statements,
}

impl CassandraRepository {
    /// Open a session on the cluster and prepare the statements
    ///
    /// # Errors
    ///
    /// Returns a [`DatabaseError`] if the cluster is unreachable, rejects the
    /// credentials, or rejects one of the statements
    pub async fn connect(options: &ConnectOptions) -> Result<Self, DatabaseError> {
        let mut builder = SessionBuilder::new()
            .known_node(format!("{}:{}", options.host, options.port))
            .user(&options.username, &options.password)
            .use_keyspace(&options.keyspace, false);

        if let Some(tls) = &options.tls {
            builder = builder.tls_context(Some(tls.clone()));
        }

        let session = builder
            .build()
            .instrument(info_span!(
                "db.connect",
                server.address = %options.host,
                server.port = options.port,
                db.namespace = %options.keyspace,
            ))
            .await?;

        let statements = Statements::prepare(&session)
            .instrument(info_span!("db.prepare"))
            .await?;

        Ok(Self {
            session,
            statements,
        })
    }

    /// Transform the repository into a type-erased [`BoxRepository`]
    #[must_use]
    pub fn boxed(self) -> BoxRepository {
        Box::new(MapErr::new(self, RepositoryError::from_error))
    }
}

impl Drop for CassandraRepository {
    fn drop(&mut self) {
        tracing::debug!("Closing the database session");
    }
}

impl RepositoryAccess for CassandraRepository {
    type Error = DatabaseError;

    fn oauth2_token<'c>(
        &'c mut self,
    ) -> Box<dyn OAuth2TokenRepository<Error = Self::Error> + 'c> {
        Box::new(CassandraOAuth2TokenRepository::new(
            &self.session,
            &self.statements,
        ))
    }

    fn oauth2_credential<'c>(
        &'c mut self,
    ) -> Box<dyn OAuth2CredentialRepository<Error = Self::Error> + 'c> {
        Box::new(CassandraOAuth2CredentialRepository::new(
            &self.session,
            &self.statements,
        ))
    }

    fn consumer<'c>(&'c mut self) -> Box<dyn ConsumerRepository<Error = Self::Error> + 'c> {
        Box::new(CassandraConsumerRepository::new(
            &self.session,
            &self.statements,
        ))
    }
}
