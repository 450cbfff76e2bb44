// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Contexts used in templates

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sweeper_data_model::{AbusiveConsumer, SweepSummary, Uuid};

/// Format used to display the execution instant of a sweep
pub const EXECUTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Helper trait to construct sample contexts
pub trait TemplateContext: Serialize {
    /// Generate sample values for this context type
    ///
    /// This is then used to check for template validity in unit tests
    fn sample(now: DateTime<Utc>) -> Vec<Self>
    where
        Self: Sized;
}

/// Context used by the sweep report templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportContext {
    server: String,
    keyspace: String,
    executed_at: String,
    count_before: u64,
    count_after: u64,
    deleted: u64,
    abusers: Vec<AbusiveConsumer>,
}

impl From<&SweepSummary> for ReportContext {
    fn from(summary: &SweepSummary) -> Self {
        Self {
            server: summary.server.clone(),
            keyspace: summary.keyspace.clone(),
            executed_at: summary.executed_at.format(EXECUTED_AT_FORMAT).to_string(),
            count_before: summary.count_before,
            count_after: summary.count_after,
            deleted: summary.deleted,
            abusers: summary.abusers.clone(),
        }
    }
}

impl TemplateContext for ReportContext {
    fn sample(now: DateTime<Utc>) -> Vec<Self> {
        let quiet = SweepSummary {
            server: "sweeper.example.com".to_owned(),
            keyspace: "kong".to_owned(),
            executed_at: now,
            count_before: 12,
            count_after: 12,
            deleted: 0,
            abusers: Vec::new(),
        };

        let busy = SweepSummary {
            executed_at: now + Duration::minutes(5),
            count_before: 1_542,
            count_after: 1_230,
            deleted: 312,
            abusers: vec![
                AbusiveConsumer {
                    credential_id: Uuid::from_u128(0x01),
                    consumer_id: Uuid::from_u128(0x0a),
                    username: "mobile-app".to_owned(),
                    tokens: 150,
                },
                AbusiveConsumer {
                    credential_id: Uuid::from_u128(0x02),
                    consumer_id: Uuid::from_u128(0x0b),
                    username: "<script>alert(1)</script>".to_owned(),
                    tokens: 100,
                },
            ],
            ..quiet.clone()
        };

        vec![Self::from(&quiet), Self::from(&busy)]
    }
}
