// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{num::NonZeroUsize, process::ExitCode};

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{ArgAction, CommandFactory, Parser, error::ErrorKind};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::Serialize;
use sweeper_config::{ConfigurationSection, RootConfig};
use sweeper_tasks::{SweepSettings, TokenSweeper};
use sweeper_templates::Templates;
use tracing::{info, info_span};

use crate::util::{notifier_from_config, repository_from_config, server_hostname};

/// Prefix of the environment variables overriding the configuration files
const ENV_PREFIX: &str = "TOKEN_SWEEPER_";

fn existing_file(value: &str) -> Result<Utf8PathBuf, String> {
    let path = Utf8PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("file {path} not found or not reachable"))
    }
}

/// Delete the expired OAuth 2.0 tokens of an API gateway keyspace, and report
/// the consumers creating an abnormal amount of them
#[derive(Parser)]
#[command(version, about)]
pub struct Options {
    /// Path to the configuration file(s). Later files override earlier ones
    #[arg(short, long, action = ArgAction::Append, value_parser = existing_file)]
    config: Vec<Utf8PathBuf>,

    /// Cassandra contact host
    cassandrahost: String,

    /// Keyspace holding the `oauth2_tokens` table
    keyspace: String,

    /// Cassandra username
    username: String,

    /// Cassandra password
    password: String,

    /// Email address to send the report to
    #[arg(long)]
    email: Option<String>,

    /// Email address the report is sent from
    #[arg(long)]
    sender: Option<String>,

    /// SMTP relay used to send the report
    #[arg(long)]
    smtpserver: Option<String>,

    /// Connect to Cassandra over TLS
    #[arg(long, requires = "ca")]
    ssl: bool,

    /// PEM trust store used to verify the Cassandra certificates. Must exist
    /// when `--ssl` is set
    #[arg(long)]
    ca: Option<Utf8PathBuf>,

    /// CQL native port [default: 9042]
    #[arg(long)]
    port: Option<u16>,

    /// Number of expired tokens from a single credential from which its
    /// consumer is reported [default: 100]
    #[arg(long)]
    abuse_threshold: Option<NonZeroUsize>,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("config", &self.config)
            .field("cassandrahost", &self.cassandrahost)
            .field("keyspace", &self.keyspace)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("sender", &self.sender)
            .field("smtpserver", &self.smtpserver)
            .field("ssl", &self.ssl)
            .field("ca", &self.ca)
            .field("port", &self.port)
            .field("abuse_threshold", &self.abuse_threshold)
            .finish_non_exhaustive()
    }
}

/// The part of the configuration set by the command line arguments
#[derive(Serialize)]
struct Overrides<'a> {
    database: DatabaseOverrides<'a>,
    email: EmailOverrides<'a>,
    sweep: SweepOverrides,
}

#[derive(Serialize)]
struct DatabaseOverrides<'a> {
    host: &'a str,
    keyspace: &'a str,
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    tls: TlsOverrides<'a>,
}

#[derive(Serialize)]
struct TlsOverrides<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ca: Option<&'a Utf8Path>,
}

#[derive(Serialize)]
struct EmailOverrides<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hostname: Option<&'a str>,
}

#[derive(Serialize)]
struct SweepOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    abuse_threshold: Option<NonZeroUsize>,
}

impl Options {
    /// Check the arguments clap can't check on its own
    ///
    /// # Errors
    ///
    /// Returns a usage error if `--ssl` is set and the trust store given with
    /// `--ca` does not exist
    pub fn validate(self) -> Result<Self, clap::Error> {
        if let Some(ca) = self.ca.as_deref().filter(|ca| self.ssl && !ca.is_file()) {
            return Err(Self::command().error(
                ErrorKind::ValueValidation,
                format!("trust store {ca} not found or not reachable"),
            ));
        }

        Ok(self)
    }

    fn overrides(&self) -> Overrides<'_> {
        Overrides {
            database: DatabaseOverrides {
                host: &self.cassandrahost,
                keyspace: &self.keyspace,
                username: &self.username,
                password: &self.password,
                port: self.port,
                tls: TlsOverrides {
                    enabled: self.ssl.then_some(true),
                    ca: self.ca.as_deref(),
                },
            },
            email: EmailOverrides {
                to: self.email.as_deref(),
                from: self.sender.as_deref(),
                hostname: self.smtpserver.as_deref(),
            },
            sweep: SweepOverrides {
                abuse_threshold: self.abuse_threshold,
            },
        }
    }

    /// Layer the configuration files, the environment and the command line
    /// arguments, the latter taking precedence
    pub fn figment(&self) -> Figment {
        let files = self
            .config
            .iter()
            .fold(Figment::new(), |figment, path| {
                figment.merge(Yaml::file_exact(path))
            });

        files
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(self.overrides()))
    }

    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        let span = info_span!("cli.sweep.init").entered();
        let config = RootConfig::extract(figment)
            .map_err(anyhow::Error::from_boxed)
            .context("invalid configuration")?;

        let server = server_hostname()?;

        // Load and compile the templates
        let templates = Templates::load().context("could not load the report templates")?;

        let notifier = notifier_from_config(&config.email, &server, &templates)?;

        let settings = SweepSettings {
            server,
            keyspace: config.database.keyspace.clone(),
            abuse_threshold: config.sweep.abuse_threshold.get(),
            page_size: usize::try_from(config.database.page_size.get()).unwrap_or(usize::MAX),
        };

        let mut sweeper = TokenSweeper::new(settings);
        if let Some(notifier) = notifier {
            sweeper = sweeper.with_notifier(notifier);
        }

        // Connect to the database
        info!(
            host = %config.database.host,
            port = config.database.port,
            keyspace = %config.database.keyspace,
            tls = config.database.tls.enabled,
            "Connecting to the database"
        );
        let repo = repository_from_config(&config.database).await?;

        drop(config);
        drop(span);

        let summary = sweeper
            .run(repo.boxed())
            .await
            .context("the sweep did not complete")?;

        info!(
            deleted = summary.deleted,
            count_before = summary.count_before,
            count_after = summary.count_after,
            abusers = summary.abusers.len(),
            "Sweep finished"
        );

        Ok(ExitCode::SUCCESS)
    }
}
