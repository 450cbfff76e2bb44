// Copyright 2026 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::time::Duration;

use anyhow::Context;
use sweeper_config::{DatabaseConfig, EmailConfig, EmailSmtpMode};
use sweeper_email::{MailTransport, Mailbox, Mailer, default_sender};
use sweeper_storage_cassandra::{
    CassandraRepository, ConnectOptions, client_config_from_trust_store,
};
use sweeper_tasks::ReportNotifier;
use sweeper_templates::Templates;
use tracing::{Instrument, debug};

/// Name of the local host, used to identify the sweep in the report
pub fn server_hostname() -> anyhow::Result<String> {
    hostname::get()
        .context("could not get the local hostname")?
        .into_string()
        .map_err(|name| anyhow::anyhow!("local hostname {name:?} is not valid UTF-8"))
}

pub fn mailer_from_config(
    config: &EmailConfig,
    server: &str,
    templates: &Templates,
) -> Result<Mailer, anyhow::Error> {
    let from = match &config.from {
        Some(from) => from
            .parse()
            .context("invalid email configuration: invalid 'from' address")?,
        None => default_sender(server).with_context(|| {
            format!("could not build a sender address from the hostname {server:?}")
        })?,
    };

    let hostname = config
        .hostname
        .as_deref()
        .context("invalid email configuration: missing hostname")?;

    let credentials = match (&config.username, &config.password) {
        (Some(username), Some(password)) => Some(sweeper_email::SmtpCredentials::new(
            username.clone(),
            password.clone(),
        )),
        (None, None) => None,
        _ => {
            anyhow::bail!("invalid email configuration: missing username or password");
        }
    };

    let mode = match config.mode {
        EmailSmtpMode::Plain => sweeper_email::SmtpMode::Plain,
        EmailSmtpMode::StartTls => sweeper_email::SmtpMode::StartTls,
        EmailSmtpMode::Tls => sweeper_email::SmtpMode::Tls,
    };

    let transport = MailTransport::smtp(mode, hostname, config.port, credentials)
        .context("failed to build SMTP transport")?;

    Ok(Mailer::new(templates.clone(), transport, from))
}

/// Build the report notifier, if both a recipient and a relay are configured
pub fn notifier_from_config(
    config: &EmailConfig,
    server: &str,
    templates: &Templates,
) -> Result<Option<ReportNotifier>, anyhow::Error> {
    let Some(to) = config.to.as_deref().filter(|_| config.is_enabled()) else {
        debug!("No email recipient or SMTP relay configured, the report won't be sent");
        return Ok(None);
    };

    let to: Mailbox = to
        .parse()
        .context("invalid email configuration: invalid 'to' address")?;

    let mailer = mailer_from_config(config, server, templates)?;
    test_mailer_in_background(&mailer, Duration::from_secs(10));

    Ok(Some(ReportNotifier::new(mailer, to)))
}

/// Test the connection to the mailer in a background task
pub fn test_mailer_in_background(mailer: &Mailer, timeout: Duration) {
    let mailer = mailer.clone();

    let span = tracing::info_span!("cli.test_mailer");
    tokio::spawn(
        async move {
            match tokio::time::timeout(timeout, mailer.test_connection()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(
                        error = &err as &dyn std::error::Error,
                        "Could not connect to the mail backend, the report may not be sent!"
                    );
                }
                Err(_) => {
                    tracing::warn!("Timed out while testing the mail backend connection, the report may not be sent!");
                }
            }
        }
        .instrument(span),
    );
}

fn connect_options_from_config(config: &DatabaseConfig) -> Result<ConnectOptions, anyhow::Error> {
    let tls = if config.tls.enabled {
        let ca = config
            .tls
            .ca
            .as_deref()
            .context("invalid database configuration: TLS is enabled without a trust store")?;

        let tls = client_config_from_trust_store(ca)
            .context("could not load the database trust store")?;
        Some(tls)
    } else {
        None
    };

    Ok(ConnectOptions {
        host: config.host.clone(),
        port: config.port,
        keyspace: config.keyspace.clone(),
        username: config.username.clone(),
        password: config.password.clone(),
        tls,
    })
}

/// Open a session on the cluster
pub async fn repository_from_config(
    config: &DatabaseConfig,
) -> Result<CassandraRepository, anyhow::Error> {
    let options = connect_options_from_config(config)?;
    CassandraRepository::connect(&options)
        .await
        .context("could not connect to the database")
}

#[cfg(test)]
mod tests {
    use figment::{Figment, Jail};
    use sweeper_config::ConfigurationSection;

    use super::*;

    fn figment() -> Figment {
        Figment::new()
            .merge(("database.host", "cassandra01"))
            .merge(("database.keyspace", "kong"))
            .merge(("database.username", "sweeper"))
            .merge(("database.password", "hunter2"))
    }

    #[test]
    fn connect_options_without_tls() {
        let config = DatabaseConfig::extract(&figment()).unwrap();
        let options = connect_options_from_config(&config).unwrap();

        assert_eq!(options.host, "cassandra01");
        assert_eq!(options.port, 9042);
        assert_eq!(options.keyspace, "kong");
        assert!(options.tls.is_none());
    }

    #[test]
    fn connect_options_with_empty_trust_store() {
        Jail::expect_with(|jail| {
            jail.create_file("ca.pem", "")?;
            let figment = figment()
                .merge(("database.tls.enabled", true))
                .merge(("database.tls.ca", "ca.pem"));

            let config = DatabaseConfig::extract(&figment).map_err(|e| e.to_string())?;
            let res = connect_options_from_config(&config);
            assert!(res.is_err());

            Ok(())
        });
    }

    #[test]
    fn no_notifier_without_relay() {
        let templates = Templates::load().unwrap();
        let config = EmailConfig {
            to: Some("ops@example.com".to_owned()),
            ..EmailConfig::default()
        };

        let notifier = notifier_from_config(&config, "sweeper01.example.com", &templates).unwrap();
        assert!(notifier.is_none());
    }

    #[test]
    fn invalid_sender() {
        let templates = Templates::load().unwrap();
        let config = EmailConfig {
            to: Some("ops@example.com".to_owned()),
            from: Some("not an address".to_owned()),
            hostname: Some("smtp.example.com".to_owned()),
            ..EmailConfig::default()
        };

        let res = mailer_from_config(&config, "sweeper01.example.com", &templates);
        assert!(res.is_err());
    }
}
