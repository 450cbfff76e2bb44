// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use serde::{Deserialize, Serialize};

mod database;
mod email;
mod sweep;

pub use self::{
    database::{DatabaseConfig, DatabaseTlsConfig},
    email::{EmailConfig, EmailSmtpMode},
    sweep::SweepConfig,
};
use crate::util::ConfigurationSection;

/// Application configuration root
#[derive(Debug, Serialize, Deserialize)]
pub struct RootConfig {
    /// Database connection configuration
    pub database: DatabaseConfig,

    /// Configuration related to sending the report by email
    #[serde(default)]
    pub email: EmailConfig,

    /// Configuration of the sweep job
    #[serde(default)]
    pub sweep: SweepConfig,
}

impl ConfigurationSection for RootConfig {
    fn validate(
        &self,
        figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        self.database.validate(figment)?;
        self.email.validate(figment)?;
        self.sweep.validate(figment)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use figment::{
        Figment, Jail,
        providers::{Format, Serialized, Yaml},
    };

    use super::*;

    #[test]
    fn load_root_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    database:
                      host: cassandra.example.com
                      keyspace: kong
                      username: sweeper
                      password: hunter2
                    email:
                      to: ops@example.com
                ",
            )?;

            let overrides = serde_json::json!({
                "database": { "keyspace": "gateway" },
                "email": { "hostname": "smtp.example.com" },
            });
            let figment = Figment::new()
                .merge(Yaml::file("config.yaml"))
                .merge(Serialized::defaults(overrides));

            let config = RootConfig::extract(&figment).map_err(|e| e.to_string())?;
            assert_eq!(config.database.host, "cassandra.example.com");
            assert_eq!(config.database.keyspace, "gateway");
            assert!(config.email.is_enabled());
            assert_eq!(config.sweep.abuse_threshold.get(), 100);

            Ok(())
        });
    }

    #[test]
    fn database_section_is_required() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "sweep:\n  abuse_threshold: 10\n")?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(RootConfig::extract(&figment).is_err());

            Ok(())
        });
    }
}
