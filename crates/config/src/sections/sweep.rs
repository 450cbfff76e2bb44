// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use sweeper_data_model::DEFAULT_ABUSE_THRESHOLD;

use crate::ConfigurationSection;

fn default_abuse_threshold() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_ABUSE_THRESHOLD).unwrap_or(NonZeroUsize::MIN)
}

/// Configuration of the sweep job itself
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Number of expired tokens deleted for a single credential in one run
    /// from which its consumer is reported
    #[serde(default = "default_abuse_threshold")]
    pub abuse_threshold: NonZeroUsize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            abuse_threshold: default_abuse_threshold(),
        }
    }
}

impl ConfigurationSection for SweepConfig {
    const PATH: Option<&'static str> = Some("sweep");
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
            jail.create_file("config.yaml", "sweep:\n  abuse_threshold: 25\n")?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let config = SweepConfig::extract_or_default(&figment).map_err(|e| e.to_string())?;
            assert_eq!(config.abuse_threshold.get(), 25);

            let config = SweepConfig::extract_or_default(&Figment::new())
                .map_err(|e| e.to_string())?;
            assert_eq!(config.abuse_threshold.get(), 100);

            Ok(())
        });
    }

    #[test]
    fn zero_threshold_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "sweep:\n  abuse_threshold: 0\n")?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(SweepConfig::extract_or_default(&figment).is_err());

            Ok(())
        });
    }
}
