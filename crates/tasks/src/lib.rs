// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! The jobs run by the token sweeper

#![deny(missing_docs)]

use std::sync::Arc;

use sweeper_data_model::{Clock, SystemClock};
use sweeper_email::{Mailbox, Mailer};

mod sweep;

pub use self::sweep::SweepError;

/// Settings of a sweep run, resolved by the caller before the run starts
#[derive(Debug, Clone)]
pub struct SweepSettings {
    /// Name of the host running the sweep, shown in the report
    pub server: String,

    /// Keyspace being swept, shown in the report
    pub keyspace: String,

    /// Number of expired tokens from a single credential from which its
    /// consumer is reported
    pub abuse_threshold: usize,

    /// Number of tokens fetched per page while scanning
    pub page_size: usize,
}

/// Where to send the report of a run
#[derive(Clone)]
pub struct ReportNotifier {
    mailer: Mailer,
    to: Mailbox,
}

impl ReportNotifier {
    /// Send the report to the given recipient using the given mailer
    #[must_use]
    pub fn new(mailer: Mailer, to: Mailbox) -> Self {
        Self { mailer, to }
    }
}

/// Deletes the expired tokens and reports about it
#[derive(Clone)]
pub struct TokenSweeper {
    settings: SweepSettings,
    clock: Arc<dyn Clock>,
    notifier: Option<ReportNotifier>,
}

impl TokenSweeper {
    /// Create a sweeper which uses the system clock and sends no report
    #[must_use]
    pub fn new(settings: SweepSettings) -> Self {
        Self {
            settings,
            clock: Arc::new(SystemClock::default()),
            notifier: None,
        }
    }

    /// Use the given clock instead of the system one
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Send the report of each run through the given notifier
    #[must_use]
    pub fn with_notifier(mut self, notifier: ReportNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }
}
