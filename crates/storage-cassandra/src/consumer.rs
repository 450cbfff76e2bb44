// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use async_trait::async_trait;
use scylla::client::session::Session;
use sweeper_data_model::Consumer;
use sweeper_storage::consumer::ConsumerRepository;
use uuid::Uuid;

use crate::{DatabaseError, repository::Statements, tracing::StatementExt};

/// `username` and `custom_id` are both nullable, the gateway requires only one
/// of them
type ConsumerRow = (Uuid, Option<String>, Option<String>);

fn consumer_from_row((id, username, custom_id): ConsumerRow) -> Consumer {
    Consumer {
        id,
        username,
        custom_id,
    }
}

/// An implementation of [`ConsumerRepository`] for a Cassandra session
pub struct CassandraConsumerRepository<'c> {
    session: &'c Session,
    statements: &'c Statements,
}

impl<'c> CassandraConsumerRepository<'c> {
    /// Create a new [`CassandraConsumerRepository`] from an active session
    pub(crate) fn new(session: &'c Session, statements: &'c Statements) -> Self {
        Self {
            session,
            statements,
        }
    }
}

#[async_trait]
impl ConsumerRepository for CassandraConsumerRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.consumer.lookup",
        skip_all,
        fields(
            db.query.text,
            consumer.id = %id,
        ),
        err,
    )]
    async fn lookup(&mut self, id: Uuid) -> Result<Option<Consumer>, Self::Error> {
        let statement = self.statements.lookup_consumer.traced();
        let row = self
            .session
            .execute_unpaged(statement, (id,))
            .await?
            .into_rows_result()
            .map_err(DatabaseError::decode)?
            .maybe_first_row::<ConsumerRow>()
            .map_err(DatabaseError::decode)?;

        Ok(row.map(consumer_from_row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_without_username() {
        let id = Uuid::from_u128(7);
        let consumer = consumer_from_row((id, None, Some("partner-42".to_owned())));

        assert_eq!(consumer.id, id);
        assert_eq!(consumer.username, None);
        assert_eq!(consumer.display_name(), "partner-42");
    }

    #[test]
    fn test_consumer_with_username() {
        let consumer = consumer_from_row((Uuid::nil(), Some("mobile-app".to_owned()), None));
        assert_eq!(consumer.display_name(), "mobile-app");
    }
}
