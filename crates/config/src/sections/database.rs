// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::num::NonZeroU32;

use camino::Utf8PathBuf;
use figment::error::Error as FigmentError;
use serde::{Deserialize, Serialize};

use crate::{
    ConfigurationSection,
    util::{error_on_field, missing_field},
};

fn default_port() -> u16 {
    9042
}

fn default_page_size() -> NonZeroU32 {
    NonZeroU32::new(1000).unwrap_or(NonZeroU32::MIN)
}

/// Transport encryption towards the cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DatabaseTlsConfig {
    /// Whether to connect over TLS
    #[serde(default)]
    pub enabled: bool,

    /// Path to the PEM trust store used to verify the cluster certificates.
    /// Required when TLS is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<Utf8PathBuf>,
}

/// Database connection configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Contact point of the cluster
    pub host: String,

    /// Port of the CQL native protocol
    #[serde(default = "default_port")]
    pub port: u16,

    /// Keyspace holding the token tables
    pub keyspace: String,

    /// Username used to authenticate
    pub username: String,

    /// Password used to authenticate
    pub password: String,

    /// Transport encryption settings
    #[serde(default)]
    pub tls: DatabaseTlsConfig,

    /// Number of tokens fetched per page while scanning the table
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroU32,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("keyspace", &self.keyspace)
            .field("username", &self.username)
            .field("tls", &self.tls)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl ConfigurationSection for DatabaseConfig {
    const PATH: Option<&'static str> = Some("database");

    fn validate(
        &self,
        figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        if self.tls.enabled {
            let Some(ca) = &self.tls.ca else {
                return Err(missing_field(figment, &["database", "tls", "ca"]).into());
            };

            if !ca.is_file() {
                return Err(error_on_field(
                    figment,
                    FigmentError::from(format!("trust store {ca} does not exist")),
                    &["database", "tls", "ca"],
                )
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use figment::{
        Figment, Jail,
        providers::{Env, Format, Yaml},
    };

    use super::*;

    #[test]
    fn load_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    database:
                      host: cassandra.example.com
                      keyspace: kong
                      username: sweeper
                      password: hunter2
                ",
            )?;

            let config = Figment::new()
                .merge(Yaml::file("config.yaml"))
                .extract_inner::<DatabaseConfig>("database")?;

            assert_eq!(config.host, "cassandra.example.com");
            assert_eq!(config.port, 9042);
            assert_eq!(config.keyspace, "kong");
            assert_eq!(config.username, "sweeper");
            assert_eq!(config.password, "hunter2");
            assert!(!config.tls.enabled);
            assert_eq!(config.page_size.get(), 1000);

            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    database:
                      host: cassandra.example.com
                      port: 9142
                      keyspace: kong
                      username: sweeper
                      password: hunter2
                ",
            )?;
            jail.set_env("TOKEN_SWEEPER_DATABASE__KEYSPACE", "gateway");
            jail.set_env("TOKEN_SWEEPER_DATABASE__PAGE_SIZE", "50");

            let figment = Figment::new()
                .merge(Yaml::file("config.yaml"))
                .merge(Env::prefixed("TOKEN_SWEEPER_").split("__"));
            let config = DatabaseConfig::extract(&figment).map_err(|e| e.to_string())?;

            assert_eq!(config.port, 9142);
            assert_eq!(config.keyspace, "gateway");
            assert_eq!(config.page_size.get(), 50);

            Ok(())
        });
    }

    #[test]
    fn tls_requires_a_trust_store() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    database:
                      host: cassandra.example.com
                      keyspace: kong
                      username: sweeper
                      password: hunter2
                      tls:
                        enabled: true
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let error = DatabaseConfig::extract(&figment).unwrap_err();
            let error = error.downcast::<FigmentError>().unwrap();
            assert_eq!(error.path, vec!["database", "tls", "ca"]);

            Ok(())
        });
    }

    #[test]
    fn tls_trust_store_must_exist() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    database:
                      host: cassandra.example.com
                      keyspace: kong
                      username: sweeper
                      password: hunter2
                      tls:
                        enabled: true
                        ca: /this/does/not/exist.pem
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let error = DatabaseConfig::extract(&figment).unwrap_err();
            assert!(error.to_string().contains("/this/does/not/exist.pem"));

            jail.create_file("ca.pem", "")?;
            let figment = figment.merge(("database.tls.ca", "ca.pem"));
            let config = DatabaseConfig::extract(&figment).map_err(|e| e.to_string())?;
            assert!(config.tls.enabled);

            Ok(())
        });
    }
}
