// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

//! Templates rendering

use std::{collections::BTreeMap, sync::Arc};

use anyhow::Context as _;
use minijinja::UndefinedBehavior;
use thiserror::Error;
use tracing::debug;

mod context;

#[macro_use]
mod macros;

pub use self::context::{EXECUTED_AT_FORMAT, ReportContext, TemplateContext};

/// Wrapper around [`minijinja::Environment`] helping rendering the various
/// templates
#[derive(Debug, Clone)]
pub struct Templates {
    environment: Arc<minijinja::Environment<'static>>,
}

/// There was an issue while loading the templates
#[derive(Error, Debug)]
pub enum TemplateLoadingError {
    /// Some templates failed to compile
    #[error("could not compile template {template:?}")]
    Compile {
        /// The name of the template being compiled
        template: &'static str,

        /// The underlying error
        #[source]
        source: minijinja::Error,
    },
}

impl Templates {
    /// Compile the embedded templates
    ///
    /// Templates ending in `.html` are auto-escaped.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the templates does not compile
    #[tracing::instrument(name = "templates.load", skip_all)]
    pub fn load() -> Result<Self, TemplateLoadingError> {
        let mut env = minijinja::Environment::new();
        // Don't allow use of undefined variables
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        for (template, source) in TEMPLATES {
            debug!(template, "Registering template");
            env.add_template(template, source)
                .map_err(|source| TemplateLoadingError::Compile { template, source })?;
        }

        Ok(Self {
            environment: Arc::new(env),
        })
    }
}

/// Failed to render a template
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Missing template
    #[error("missing template {template:?}")]
    Missing {
        /// The name of the template being rendered
        template: &'static str,

        /// The underlying error
        #[source]
        source: minijinja::Error,
    },

    /// Failed to render the template
    #[error("could not render template {template:?}")]
    Render {
        /// The name of the template being rendered
        template: &'static str,

        /// The underlying error
        #[source]
        source: minijinja::Error,
    },
}

register_templates! {
    /// Render the subject of the sweep report
    pub fn render_report_subject(ReportContext) { "report_subject.txt" }

    /// Render the sweep report (HTML variant)
    pub fn render_report_html(ReportContext) { "report.html" }

    /// Render the sweep report (plain text variant)
    pub fn render_report_txt(ReportContext) { "report.txt" }
}

impl Templates {
    /// Render all templates with the generated samples to check if they render
    /// properly.
    ///
    /// Returns the renders in a map whose keys are template names
    /// and the values are lists of renders (according to the list
    /// of samples).
    ///
    /// # Errors
    ///
    /// Returns an error if any of the templates fails to render
    pub fn check_render(
        &self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> anyhow::Result<BTreeMap<&'static str, Vec<String>>> {
        check::all(self, now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sweeper_data_model::{AbusiveConsumer, SweepSummary, Uuid};

    use super::*;

    fn summary() -> SweepSummary {
        SweepSummary {
            server: "sweeper01".to_owned(),
            keyspace: "kong".to_owned(),
            executed_at: chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap(),
            count_before: 250,
            count_after: 50,
            deleted: 200,
            abusers: vec![AbusiveConsumer {
                credential_id: Uuid::from_u128(1),
                consumer_id: Uuid::from_u128(2),
                username: "Tom & <Jerry>".to_owned(),
                tokens: 150,
            }],
        }
    }

    #[test]
    fn check_builtin_templates() {
        let templates = Templates::load().unwrap();
        let now = chrono::Utc.with_ymd_and_hms(2022, 1, 16, 14, 40, 0).unwrap();
        let renders = templates.check_render(now).unwrap();

        assert_eq!(renders.len(), 3);
        assert!(renders.values().all(|samples| samples.len() == 2));
    }

    #[test]
    fn render_subject() {
        let templates = Templates::load().unwrap();
        let subject = templates
            .render_report_subject(&ReportContext::from(&summary()))
            .unwrap();

        assert_eq!(
            subject.trim(),
            "sweeper01 OAuth Token Cleanup executed at 2024-03-01 12:30:05 UTC"
        );
    }

    #[test]
    fn render_html_escapes_values() {
        let templates = Templates::load().unwrap();
        let html = templates
            .render_report_html(&ReportContext::from(&summary()))
            .unwrap();

        assert!(html.contains("OAuth_Tokens Rows Deleted: </span> 200"));
        assert!(html.contains("00000000-0000-0000-0000-000000000002"));
        assert!(html.contains("Tom &amp; &lt;Jerry&gt;"));
        assert!(!html.contains("<Jerry>"));
        assert!(html.contains("Tokens Created: </span> 150"));
    }

    #[test]
    fn render_txt_is_not_escaped() {
        let templates = Templates::load().unwrap();
        let txt = templates
            .render_report_txt(&ReportContext::from(&summary()))
            .unwrap();

        assert!(txt.contains("Consumer Name: Tom & <Jerry>"));
        assert!(txt.contains("OAuth_Tokens Rows Deleted: 200"));
    }

    #[test]
    fn render_without_abusers() {
        let mut summary = summary();
        summary.abusers.clear();

        let templates = Templates::load().unwrap();
        let context = ReportContext::from(&summary);

        let html = templates.render_report_html(&context).unwrap();
        assert!(html.contains("Consumer Token Creation Abuse (If any)"));
        assert!(!html.contains("Consumer ID"));

        let txt = templates.render_report_txt(&context).unwrap();
        assert!(txt.contains("  none"));
    }
}
