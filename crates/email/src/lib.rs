// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Helps sending the sweep report by email, with different email backends

#![deny(missing_docs)]

mod mailer;
mod transport;

pub use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials as SmtpCredentials,
};

pub use self::{
    mailer::{Error, Mailer, default_sender},
    transport::{SentMessage, SmtpMode, Transport as MailTransport},
};
