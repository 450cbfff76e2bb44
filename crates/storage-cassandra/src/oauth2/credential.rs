// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use async_trait::async_trait;
use scylla::client::session::Session;
use sweeper_data_model::OAuth2Credential;
use sweeper_storage::oauth2::OAuth2CredentialRepository;
use uuid::Uuid;

use crate::{DatabaseError, repository::Statements, tracing::StatementExt};

/// An implementation of [`OAuth2CredentialRepository`] for a Cassandra session
pub struct CassandraOAuth2CredentialRepository<'c> {
    session: &'c Session,
    statements: &'c Statements,
}

impl<'c> CassandraOAuth2CredentialRepository<'c> {
    /// Create a new [`CassandraOAuth2CredentialRepository`] from an active
    /// session
    pub(crate) fn new(session: &'c Session, statements: &'c Statements) -> Self {
        Self {
            session,
            statements,
        }
    }
}

#[async_trait]
impl OAuth2CredentialRepository for CassandraOAuth2CredentialRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.oauth2_credential.lookup",
        skip_all,
        fields(
            db.query.text,
            oauth2_credential.id = %id,
        ),
        err,
    )]
    async fn lookup(&mut self, id: Uuid) -> Result<Option<OAuth2Credential>, Self::Error> {
        let statement = self.statements.lookup_credential.traced();
        let row = self
            .session
            .execute_unpaged(statement, (id,))
            .await?
            .into_rows_result()
            .map_err(DatabaseError::decode)?
            .maybe_first_row::<(Uuid, Uuid)>()
            .map_err(DatabaseError::decode)?;

        Ok(row.map(|(id, consumer_id)| OAuth2Credential { id, consumer_id }))
    }
}
