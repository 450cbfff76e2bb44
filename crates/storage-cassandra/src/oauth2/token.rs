// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::ops::ControlFlow;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use scylla::{client::session::Session, response::PagingState, value::CqlTimestamp};
use sweeper_data_model::OAuth2Token;
use sweeper_storage::{Page, ScanCursor, oauth2::OAuth2TokenRepository};
use uuid::Uuid;

use crate::{DatabaseError, repository::Statements, tracing::StatementExt};

/// An implementation of [`OAuth2TokenRepository`] for a Cassandra session
pub struct CassandraOAuth2TokenRepository<'c> {
    session: &'c Session,
    statements: &'c Statements,
}

impl<'c> CassandraOAuth2TokenRepository<'c> {
    /// Create a new [`CassandraOAuth2TokenRepository`] from an active session
    pub(crate) fn new(session: &'c Session, statements: &'c Statements) -> Self {
        Self {
            session,
            statements,
        }
    }
}

type TokenRow = (Uuid, Uuid, i32, CqlTimestamp);

fn token_from_row(
    (id, credential_id, expires_in, created_at): TokenRow,
) -> Result<OAuth2Token, DatabaseError> {
    let created_at = DateTime::<Utc>::from_timestamp_millis(created_at.0).ok_or(
        DatabaseError::OutOfRange {
            column: "created_at",
            value: created_at.0,
        },
    )?;

    Ok(OAuth2Token {
        id,
        credential_id,
        expires_in: Duration::seconds(i64::from(expires_in)),
        created_at,
    })
}

#[async_trait]
impl OAuth2TokenRepository for CassandraOAuth2TokenRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.oauth2_token.count",
        skip_all,
        fields(
            db.query.text,
        ),
        err,
    )]
    async fn count(&mut self) -> Result<u64, Self::Error> {
        let statement = self.statements.count_tokens.traced();
        let (count,) = self
            .session
            .execute_unpaged(statement, ())
            .await?
            .into_rows_result()
            .map_err(DatabaseError::decode)?
            .single_row::<(i64,)>()
            .map_err(DatabaseError::decode)?;

        u64::try_from(count).map_err(|_| DatabaseError::OutOfRange {
            column: "count",
            value: count,
        })
    }

    #[tracing::instrument(
        name = "db.oauth2_token.list",
        skip_all,
        fields(
            db.query.text,
            db.page.size = limit,
            db.page.resumed = cursor.is_some(),
        ),
        err,
    )]
    async fn list(
        &mut self,
        cursor: Option<ScanCursor>,
        limit: usize,
    ) -> Result<Page<OAuth2Token>, Self::Error> {
        let mut statement = self.statements.list_tokens.clone();
        statement.set_page_size(i32::try_from(limit.max(1)).unwrap_or(i32::MAX));

        let paging_state = match cursor {
            Some(cursor) => PagingState::new_from_raw_bytes(cursor.as_bytes()),
            None => PagingState::start(),
        };

        let (result, paging_state) = self
            .session
            .execute_single_page(statement.traced(), (), paging_state)
            .await?;

        let items = result
            .into_rows_result()
            .map_err(DatabaseError::decode)?
            .rows::<TokenRow>()
            .map_err(DatabaseError::decode)?
            .map(|row| row.map_err(DatabaseError::decode).and_then(token_from_row))
            .collect::<Result<Vec<_>, _>>()?;

        let next = match paging_state.into_paging_control_flow() {
            ControlFlow::Continue(state) => state
                .as_bytes_slice()
                .map(|bytes| ScanCursor::from_bytes(bytes.to_vec())),
            ControlFlow::Break(()) => None,
        };

        Ok(Page { items, next })
    }

    #[tracing::instrument(
        name = "db.oauth2_token.delete",
        skip_all,
        fields(
            db.query.text,
            oauth2_token.id = %token.id,
            oauth2_credential.id = %token.credential_id,
        ),
        err,
    )]
    async fn delete(&mut self, token: &OAuth2Token) -> Result<(), Self::Error> {
        let statement = self.statements.delete_token.traced();
        self.session.execute_unpaged(statement, (token.id,)).await?;

        Ok(())
    }
}
