// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AbusiveConsumer;

/// Outcome of a sweep run, used to render the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Name of the host running the sweep
    pub server: String,

    /// Keyspace which was swept
    pub keyspace: String,

    /// The instant captured at the start of the run
    pub executed_at: DateTime<Utc>,

    /// Number of tokens in the table before the sweep
    pub count_before: u64,

    /// Number of tokens in the table after the sweep
    pub count_after: u64,

    /// Number of tokens deleted by the sweep
    pub deleted: u64,

    /// Consumers which crossed the abuse threshold
    pub abusers: Vec<AbusiveConsumer>,
}

impl SweepSummary {
    /// Whether at least one consumer crossed the abuse threshold
    #[must_use]
    pub fn has_abusers(&self) -> bool {
        !self.abusers.is_empty()
    }
}
