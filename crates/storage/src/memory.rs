// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! An in-memory storage backend, mostly useful for tests
//!
//! A [`MemoryRepository`] is a handle on a shared [`MemoryStore`]: the store
//! can still be inspected after the repository was handed over and dropped.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use sweeper_data_model::{Consumer, OAuth2Credential, OAuth2Token, Uuid};
use thiserror::Error;

use crate::{
    BoxRepository, MapErr, Page, RepositoryAccess, RepositoryError, ScanCursor,
    consumer::ConsumerRepository,
    oauth2::{OAuth2CredentialRepository, OAuth2TokenRepository},
};

/// Errors returned by the in-memory backend
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The scan cursor was not produced by this backend
    #[error("invalid scan cursor")]
    InvalidCursor,

    /// A failure was injected on this token
    #[error("injected failure while deleting token {0}")]
    InjectedFailure(Uuid),
}

#[derive(Default)]
struct Tables {
    tokens: BTreeMap<Uuid, OAuth2Token>,
    credentials: HashMap<Uuid, OAuth2Credential>,
    consumers: HashMap<Uuid, Consumer>,
    failing_deletes: HashSet<Uuid>,
    open_sessions: usize,
}

/// The data shared by all the [`MemoryRepository`] opened on it
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // The lock is never held across a panic point that leaves the tables
        // half-updated, so a poisoned lock is still consistent
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new repository on this store
    #[must_use]
    pub fn repository(&self) -> MemoryRepository {
        self.tables().open_sessions += 1;
        MemoryRepository {
            store: self.clone(),
        }
    }

    /// Insert a token
    pub fn add_token(&self, token: OAuth2Token) {
        self.tables().tokens.insert(token.id, token);
    }

    /// Insert a credential
    pub fn add_credential(&self, credential: OAuth2Credential) {
        self.tables().credentials.insert(credential.id, credential);
    }

    /// Insert a consumer
    pub fn add_consumer(&self, consumer: Consumer) {
        self.tables().consumers.insert(consumer.id, consumer);
    }

    /// Make the deletion of the given token fail
    pub fn fail_delete(&self, token_id: Uuid) {
        self.tables().failing_deletes.insert(token_id);
    }

    /// Whether the given token is still stored
    #[must_use]
    pub fn contains_token(&self, token_id: &Uuid) -> bool {
        self.tables().tokens.contains_key(token_id)
    }

    /// Number of stored tokens
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tables().tokens.len()
    }

    /// Number of repositories currently opened on this store
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.tables().open_sessions
    }
}

/// An implementation of [`RepositoryAccess`] backed by a [`MemoryStore`]
pub struct MemoryRepository {
    store: MemoryStore,
}

impl MemoryRepository {
    /// Box the repository, erasing its error type
    #[must_use]
    pub fn boxed(self) -> BoxRepository {
        Box::new(MapErr::new(self, RepositoryError::from_error))
    }
}

impl Drop for MemoryRepository {
    fn drop(&mut self) {
        let mut tables = self.store.tables();
        tables.open_sessions = tables.open_sessions.saturating_sub(1);
    }
}

impl RepositoryAccess for MemoryRepository {
    type Error = MemoryError;

    fn oauth2_token<'c>(
        &'c mut self,
    ) -> Box<dyn OAuth2TokenRepository<Error = Self::Error> + 'c> {
        Box::new(MemoryOAuth2TokenRepository { store: &self.store })
    }

    fn oauth2_credential<'c>(
        &'c mut self,
    ) -> Box<dyn OAuth2CredentialRepository<Error = Self::Error> + 'c> {
        Box::new(MemoryOAuth2CredentialRepository { store: &self.store })
    }

    fn consumer<'c>(&'c mut self) -> Box<dyn ConsumerRepository<Error = Self::Error> + 'c> {
        Box::new(MemoryConsumerRepository { store: &self.store })
    }
}

struct MemoryOAuth2TokenRepository<'c> {
    store: &'c MemoryStore,
}

#[async_trait]
impl OAuth2TokenRepository for MemoryOAuth2TokenRepository<'_> {
    type Error = MemoryError;

    async fn count(&mut self) -> Result<u64, Self::Error> {
        let count = self.store.tables().tokens.len();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn list(
        &mut self,
        cursor: Option<ScanCursor>,
        limit: usize,
    ) -> Result<Page<OAuth2Token>, Self::Error> {
        // The cursor is the ID of the last token of the previous page, so
        // deleting tokens in between pages does not shift the scan
        let after = cursor
            .map(|cursor| Uuid::from_slice(cursor.as_bytes()))
            .transpose()
            .map_err(|_| MemoryError::InvalidCursor)?;

        let tables = self.store.tables();
        let mut remaining = match after {
            Some(after) => tables
                .tokens
                .range((std::ops::Bound::Excluded(after), std::ops::Bound::Unbounded)),
            None => tables.tokens.range(..),
        }
        .map(|(_, token)| token.clone());

        let items: Vec<_> = remaining.by_ref().take(limit).collect();
        let next = match (items.last(), remaining.next()) {
            (Some(last), Some(_)) => Some(ScanCursor::from_bytes(last.id.as_bytes().to_vec())),
            _ => None,
        };

        Ok(Page { items, next })
    }

    async fn delete(&mut self, token: &OAuth2Token) -> Result<(), Self::Error> {
        let mut tables = self.store.tables();
        if tables.failing_deletes.contains(&token.id) {
            return Err(MemoryError::InjectedFailure(token.id));
        }

        tables.tokens.remove(&token.id);
        Ok(())
    }
}

struct MemoryOAuth2CredentialRepository<'c> {
    store: &'c MemoryStore,
}

#[async_trait]
impl OAuth2CredentialRepository for MemoryOAuth2CredentialRepository<'_> {
    type Error = MemoryError;

    async fn lookup(&mut self, id: Uuid) -> Result<Option<OAuth2Credential>, Self::Error> {
        Ok(self.store.tables().credentials.get(&id).cloned())
    }
}

struct MemoryConsumerRepository<'c> {
    store: &'c MemoryStore,
}

#[async_trait]
impl ConsumerRepository for MemoryConsumerRepository<'_> {
    type Error = MemoryError;

    async fn lookup(&mut self, id: Uuid) -> Result<Option<Consumer>, Self::Error> {
        Ok(self.store.tables().consumers.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn token() -> OAuth2Token {
        OAuth2Token {
            id: Uuid::new_v4(),
            credential_id: Uuid::new_v4(),
            expires_in: Duration::seconds(3600),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_scan_pages_survive_deletes() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            store.add_token(token());
        }

        let mut repo = store.repository().boxed();
        assert_eq!(repo.oauth2_token().count().await.unwrap(), 5);

        let mut seen = 0;
        let mut cursor = None;
        loop {
            let page = repo.oauth2_token().list(cursor, 2).await.unwrap();
            assert!(page.items.len() <= 2);
            for token in &page.items {
                repo.oauth2_token().delete(token).await.unwrap();
                seen += 1;
            }

            cursor = page.next;
            if cursor.is_none() {
                break;
            }
        }

        assert_eq!(seen, 5);
        assert_eq!(repo.oauth2_token().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lookups() {
        let store = MemoryStore::new();
        let consumer = Consumer {
            id: Uuid::new_v4(),
            username: Some("alice".to_owned()),
            custom_id: None,
        };
        let credential = OAuth2Credential {
            id: Uuid::new_v4(),
            consumer_id: consumer.id,
        };
        store.add_consumer(consumer.clone());
        store.add_credential(credential.clone());

        let mut repo = store.repository().boxed();
        assert_eq!(
            repo.oauth2_credential().lookup(credential.id).await.unwrap(),
            Some(credential)
        );
        assert_eq!(
            repo.consumer().lookup(consumer.id).await.unwrap(),
            Some(consumer)
        );
        assert_eq!(repo.consumer().lookup(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sessions_are_released_on_drop() {
        let store = MemoryStore::new();
        let repo = store.repository().boxed();
        assert_eq!(store.open_sessions(), 1);
        drop(repo);
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_invalid_cursor() {
        let store = MemoryStore::new();
        let mut repo = store.repository();
        let res = repo
            .oauth2_token()
            .list(Some(ScanCursor::from_bytes(vec![1, 2, 3])), 10)
            .await;
        assert!(matches!(res, Err(MemoryError::InvalidCursor)));
    }
}
