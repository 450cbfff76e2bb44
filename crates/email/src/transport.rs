// Copyright 2024, 2025 New Vector Ltd.
// Copyright 2022-2024 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Email transport backends

use std::{
    num::NonZeroU16,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use lettre::{
    AsyncTransport, Tokio1Executor,
    address::Envelope,
    transport::smtp::{AsyncSmtpTransport, authentication::Credentials},
};
use thiserror::Error;

/// Encryption mode to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SmtpMode {
    /// Plain text
    #[default]
    Plain,
    /// `StartTLS` (starts as plain text then upgrade to TLS)
    StartTls,
    /// TLS
    Tls,
}

/// A message captured by the in-memory transport
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// The envelope the message was sent with
    pub envelope: Envelope,

    /// The raw, formatted message
    pub raw: Vec<u8>,
}

/// A wrapper around many [`AsyncTransport`]s
#[derive(Default, Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

#[derive(Default)]
enum TransportInner {
    #[default]
    Blackhole,
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Memory(Mutex<Vec<SentMessage>>),
}

impl Transport {
    fn new(inner: TransportInner) -> Self {
        let inner = Arc::new(inner);
        Self { inner }
    }

    /// Construct a blackhole transport
    #[must_use]
    pub fn blackhole() -> Self {
        Self::new(TransportInner::Blackhole)
    }

    /// Construct a transport which keeps the messages in memory, see
    /// [`Transport::sent_messages`]
    #[must_use]
    pub fn memory() -> Self {
        Self::new(TransportInner::Memory(Mutex::default()))
    }

    /// Construct a SMTP transport
    ///
    /// Without an explicit port, the standard port of the mode is used (25 for
    /// plain text, 587 for `StartTLS`, 465 for TLS).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying SMTP transport could not be built
    pub fn smtp(
        mode: SmtpMode,
        hostname: &str,
        port: Option<NonZeroU16>,
        credentials: Option<Credentials>,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let mut t = match mode {
            SmtpMode::Plain => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(hostname),
            SmtpMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(hostname)?,
            SmtpMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(hostname)?,
        };

        if let Some(credentials) = credentials {
            t = t.credentials(credentials);
        }

        if let Some(port) = port {
            t = t.port(port.into());
        }

        Ok(Self::new(TransportInner::Smtp(t.build())))
    }

    /// Messages captured by the in-memory transport. Always empty for the
    /// other backends
    #[must_use]
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        match self.inner.as_ref() {
            TransportInner::Memory(sent) => sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            TransportInner::Blackhole | TransportInner::Smtp(_) => Vec::new(),
        }
    }
}

impl Transport {
    /// Test the connection to the underlying transport. Only works with the
    /// SMTP backend for now
    ///
    /// # Errors
    ///
    /// Will return `Err` if the connection test failed
    pub async fn test_connection(&self) -> Result<(), Error> {
        match self.inner.as_ref() {
            TransportInner::Smtp(t) => {
                t.test_connection().await?;
            }
            TransportInner::Blackhole | TransportInner::Memory(_) => {}
        }

        Ok(())
    }
}

/// Errors returned by the transports
#[derive(Debug, Error)]
#[error(transparent)]
pub enum Error {
    /// The SMTP relay rejected the message or could not be reached
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
impl AsyncTransport for Transport {
    type Ok = ();
    type Error = Error;

    async fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error> {
        match self.inner.as_ref() {
            TransportInner::Blackhole => {
                tracing::warn!(
                    "An email was supposed to be sent but no email backend is configured"
                );
            }
            TransportInner::Smtp(t) => {
                t.send_raw(envelope, email).await?;
            }
            TransportInner::Memory(sent) => {
                sent.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(SentMessage {
                        envelope: envelope.clone(),
                        raw: email.to_vec(),
                    });
            }
        }

        Ok(())
    }
}
