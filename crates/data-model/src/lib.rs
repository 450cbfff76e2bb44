// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

#![allow(clippy::module_name_repetitions)]

//! Data types shared by the token sweeper crates

mod abuse;
mod clock;
mod consumers;
mod summary;
mod tokens;

pub use uuid::Uuid;

pub use self::{
    abuse::{AbuseTally, AbusiveConsumer, DEFAULT_ABUSE_THRESHOLD},
    clock::{Clock, MockClock, SystemClock},
    consumers::{Consumer, OAuth2Credential},
    summary::SweepSummary,
    tokens::OAuth2Token,
};
