// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::num::NonZeroU16;

use serde::{Deserialize, Serialize};

use crate::{ConfigurationSection, util::missing_field};

/// Encryption mode to use when talking to the SMTP relay
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailSmtpMode {
    /// Plain text
    #[default]
    Plain,

    /// `StartTLS` (starts as plain text then upgrade to TLS)
    StartTls,

    /// TLS
    Tls,
}

/// Configuration related to sending the report by email
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Recipient of the report. No report is sent if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// Sender of the report. Defaults to a mailbox named after the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Hostname of the SMTP relay. No report is sent if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Port of the SMTP relay. Defaults to the standard port of the mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<NonZeroU16>,

    /// Encryption mode towards the SMTP relay
    #[serde(default)]
    pub mode: EmailSmtpMode,

    /// Username for SMTP authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password for SMTP authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("to", &self.to)
            .field("from", &self.from)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("mode", &self.mode)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl EmailConfig {
    /// Whether both a recipient and a relay are configured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.to.is_some() && self.hostname.is_some()
    }
}

impl ConfigurationSection for EmailConfig {
    const PATH: Option<&'static str> = Some("email");

    fn validate(
        &self,
        figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        match (&self.username, &self.password) {
            (Some(_), None) => Err(missing_field(figment, &["email", "password"]).into()),
            (None, Some(_)) => Err(missing_field(figment, &["email", "username"]).into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::{
        Figment, Jail,
        providers::{Format, Yaml},
    };

    use super::*;
    use crate::ConfigurationSectionExt;

    #[test]
    fn load_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    email:
                      to: ops@example.com
                      hostname: smtp.example.com
                      mode: starttls
                      port: 587
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let config = EmailConfig::extract(&figment).map_err(|e| e.to_string())?;

            assert_eq!(config.to.as_deref(), Some("ops@example.com"));
            assert_eq!(config.hostname.as_deref(), Some("smtp.example.com"));
            assert_eq!(config.mode, EmailSmtpMode::StartTls);
            assert_eq!(config.port.map(NonZeroU16::get), Some(587));
            assert!(config.from.is_none());
            assert!(config.is_enabled());

            Ok(())
        });
    }

    #[test]
    fn disabled_without_relay() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "email:\n  to: ops@example.com\n")?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let config = EmailConfig::extract_or_default(&figment).map_err(|e| e.to_string())?;
            assert_eq!(config.mode, EmailSmtpMode::Plain);
            assert!(!config.is_enabled());

            let config = EmailConfig::extract_or_default(&Figment::new())
                .map_err(|e| e.to_string())?;
            assert!(!config.is_enabled());

            Ok(())
        });
    }

    #[test]
    fn credentials_go_in_pairs() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    email:
                      hostname: smtp.example.com
                      username: mailer
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let error = EmailConfig::extract(&figment).unwrap_err();
            assert!(error.to_string().contains("password"));

            Ok(())
        });
    }
}
