// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Deletion of the expired OAuth 2.0 tokens

use sweeper_data_model::{AbuseTally, AbusiveConsumer, Clock, SweepSummary, Uuid};
use sweeper_storage::{BoxRepository, RepositoryError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::TokenSweeper;

/// Errors which abort a sweep run
#[derive(Debug, Error)]
pub enum SweepError {
    /// The storage backend failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A credential which had tokens deleted does not exist
    #[error("credential {credential_id} not found")]
    MissingCredential {
        /// The ID of the credential
        credential_id: Uuid,
    },

    /// The consumer owning a credential does not exist
    #[error("consumer {consumer_id} of credential {credential_id} not found")]
    MissingConsumer {
        /// The ID of the credential
        credential_id: Uuid,

        /// The ID of the consumer
        consumer_id: Uuid,
    },

    /// The report could not be rendered or sent
    #[error("could not send the report")]
    Email(#[from] sweeper_email::Error),
}

impl TokenSweeper {
    /// Run one full pass over the token table
    ///
    /// Every token which expired strictly before the instant captured at the
    /// start of the run is deleted. Consumers whose credential accounts for at
    /// least the abuse threshold of deleted tokens are reported.
    ///
    /// The repository is dropped when this returns, on success and on error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails, if a reported credential
    /// or consumer can't be found, or if the report could not be sent. The
    /// deletions done before the failure are not rolled back.
    #[tracing::instrument(
        name = "job.sweep_expired_tokens",
        skip_all,
        fields(
            db.namespace = %self.settings.keyspace,
            sweep.abuse_threshold = self.settings.abuse_threshold,
        ),
    )]
    pub async fn run(&self, mut repo: BoxRepository) -> Result<SweepSummary, SweepError> {
        let now = self.clock.now();

        let count_before = repo.oauth2_token().count().await?;
        info!(count = count_before, "tokens before deletion");

        let mut tally = AbuseTally::new();
        let mut deleted: u64 = 0;
        let mut cursor = None;
        loop {
            let page = repo
                .oauth2_token()
                .list(cursor, self.settings.page_size)
                .await?;

            for token in &page.items {
                if !token.is_expired(now) {
                    continue;
                }

                info!(
                    oauth2_token.id = %token.id,
                    oauth2_credential.id = %token.credential_id,
                    expires_in = token.expires_in.num_seconds(),
                    created_at = %token.created_at,
                    expired_at = %token.expires_at(),
                    "Deleting expired token"
                );
                repo.oauth2_token().delete(token).await?;
                tally.record(token.credential_id);
                deleted += 1;
            }

            cursor = page.next;
            if cursor.is_none() {
                break;
            }
        }

        let count_after = repo.oauth2_token().count().await?;
        info!(count = count_after, "tokens after deletion");

        if count_before.checked_sub(deleted) != Some(count_after) {
            // Tokens are created concurrently by the gateway
            warn!(
                count_before,
                count_after, deleted, "token count changed outside of the sweep"
            );
        }

        if deleted == 0 {
            debug!("no expired token to clean up");
        } else {
            info!(
                count = deleted,
                credentials = tally.len(),
                "cleaned up expired tokens"
            );
        }

        let mut abusers = Vec::new();
        for (credential_id, tokens) in tally.offenders(self.settings.abuse_threshold) {
            let credential = repo
                .oauth2_credential()
                .lookup(credential_id)
                .await?
                .ok_or(SweepError::MissingCredential { credential_id })?;

            let consumer = repo
                .consumer()
                .lookup(credential.consumer_id)
                .await?
                .ok_or(SweepError::MissingConsumer {
                    credential_id,
                    consumer_id: credential.consumer_id,
                })?;

            let username = consumer.display_name();
            warn!(
                db.namespace = %self.settings.keyspace,
                consumer.id = %consumer.id,
                consumer.username = %username,
                tokens,
                "Consumer created an abnormal amount of tokens"
            );

            abusers.push(AbusiveConsumer {
                credential_id,
                consumer_id: consumer.id,
                username,
                tokens,
            });
        }

        let summary = SweepSummary {
            server: self.settings.server.clone(),
            keyspace: self.settings.keyspace.clone(),
            executed_at: now,
            count_before,
            count_after,
            deleted,
            abusers,
        };

        if let Some(notifier) = &self.notifier {
            notifier
                .mailer
                .send_report(notifier.to.clone(), &summary)
                .await?;
            info!(email.to = %notifier.to, "Sent the sweep report");
        } else {
            debug!("No recipient or relay configured, not sending the report");
        }

        Ok(summary)
    }
}
