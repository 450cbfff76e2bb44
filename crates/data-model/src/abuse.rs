// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

/// Number of expired tokens a single credential must account for in one run
/// before its consumer gets reported
pub const DEFAULT_ABUSE_THRESHOLD: usize = 100;

/// Per-credential count of tokens deleted during a run
///
/// Credentials which had no token deleted are absent from the tally.
/// Iteration follows the order in which credentials were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbuseTally {
    counts: IndexMap<Uuid, usize>,
}

impl AbuseTally {
    /// Create an empty tally
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more deleted token for the given credential
    ///
    /// Returns the updated count for that credential
    pub fn record(&mut self, credential_id: Uuid) -> usize {
        let count = self.counts.entry(credential_id).or_insert(0);
        *count += 1;
        *count
    }

    /// Number of distinct credentials in the tally
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no token was recorded at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Credentials whose count meets or exceeds the threshold, with their count
    pub fn offenders(&self, threshold: usize) -> impl Iterator<Item = (Uuid, usize)> + '_ {
        self.counts
            .iter()
            .filter(move |(_, count)| **count >= threshold)
            .map(|(id, count)| (*id, *count))
    }
}

/// A consumer which created an abnormal amount of tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbusiveConsumer {
    pub credential_id: Uuid,
    pub consumer_id: Uuid,
    /// See [`crate::Consumer::display_name`]
    pub username: String,
    pub tokens: usize,
}
