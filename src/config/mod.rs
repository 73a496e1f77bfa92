//! YAML configuration for the duty bot.
//!
//! Configuration is loaded once at startup and handed to the rest of the
//! process as plain read-only data. Any problem found here is fatal: the
//! process refuses to start rather than run with a partially valid duty
//! roster, since a silently empty roster is indistinguishable from "no one
//! on duty today".
//!
//! # Example
//!
//! ```yaml
//! http:
//!   port: 8000
//! secret_code: hunter2
//! duty:
//!   mon: [alice@x.com]
//!   tue: [bob@x.com, carol@x.com]
//! email:
//!   addr: bot@x.com
//!   password: app-password
//! smtp:
//!   host: smtp.gmail.com
//!   port: 587
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duty::{DutyRoster, Recipient};

/// Errors that can occur while loading configuration. All fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid YAML or has the wrong shape.
    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The config parsed but fails validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
    /// HTTP listener settings.
    #[serde(default)]
    pub http: HttpOptions,

    /// Webhook secret for signature verification. When absent, signatures
    /// are not checked.
    #[serde(default)]
    pub secret_code: Option<String>,

    /// The weekly duty table.
    #[serde(default)]
    pub duty: DutyTableConfig,

    /// The sender account used for every outgoing notification.
    #[serde(default)]
    pub email: EmailAccount,

    /// SMTP relay settings.
    #[serde(default)]
    pub smtp: SmtpOptions,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpOptions {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpOptions {
    fn default() -> Self {
        HttpOptions { port: default_port() }
    }
}

fn default_port() -> u16 {
    8000
}

/// The duty table as authored in YAML: seven named weekday slots, each a
/// possibly empty list of recipient addresses. Omitted slots default to
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DutyTableConfig {
    #[serde(default)]
    pub sun: Vec<String>,
    #[serde(default)]
    pub mon: Vec<String>,
    #[serde(default)]
    pub tue: Vec<String>,
    #[serde(default)]
    pub wed: Vec<String>,
    #[serde(default)]
    pub thurs: Vec<String>,
    #[serde(default)]
    pub fri: Vec<String>,
    #[serde(default)]
    pub sat: Vec<String>,
}

impl DutyTableConfig {
    /// Converts the named slots into the indexable roster, Sunday first.
    pub fn to_roster(&self) -> DutyRoster {
        let slot = |names: &[String]| names.iter().map(Recipient::new).collect::<Vec<_>>();
        DutyRoster::new([
            slot(&self.sun),
            slot(&self.mon),
            slot(&self.tue),
            slot(&self.wed),
            slot(&self.thurs),
            slot(&self.fri),
            slot(&self.sat),
        ])
    }

    fn slots(&self) -> [(&'static str, &[String]); 7] {
        [
            ("sun", &self.sun),
            ("mon", &self.mon),
            ("tue", &self.tue),
            ("wed", &self.wed),
            ("thurs", &self.thurs),
            ("fri", &self.fri),
            ("sat", &self.sat),
        ]
    }
}

/// The sender identity used for every outgoing notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailAccount {
    /// Sender address, also the SMTP username.
    #[serde(default)]
    pub addr: String,

    /// SMTP credential for the sender address.
    #[serde(default)]
    pub password: String,
}

/// SMTP relay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpOptions {
    /// Relay hostname.
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// Relay port (submission with STARTTLS).
    #[serde(default = "default_smtp_port")]
    pub port: u16,
}

impl Default for SmtpOptions {
    fn default() -> Self {
        SmtpOptions {
            host: default_smtp_host(),
            port: default_smtp_port(),
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

impl Options {
    /// Loads and validates configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let options: Options = serde_yaml::from_str(&contents)?;
        options.validate()?;
        Ok(options)
    }

    /// Validates the parsed configuration.
    ///
    /// - the sender account must have a non-empty address and credential
    /// - every duty slot entry must be non-empty (an empty slot is legal; a
    ///   blank recipient inside one is not)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.email.addr.trim().is_empty() {
            return Err(ConfigError::Invalid("email.addr must be set".to_string()));
        }
        if self.email.password.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "email.password must be set".to_string(),
            ));
        }
        if self.smtp.host.trim().is_empty() {
            return Err(ConfigError::Invalid("smtp.host must be set".to_string()));
        }

        for (day, slot) in self.duty.slots() {
            if slot.iter().any(|member| member.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "duty.{day} contains an empty recipient"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    const VALID: &str = "\
http:
  port: 9000
secret_code: hunter2
duty:
  mon: [alice@x.com]
  tue: [bob@x.com, carol@x.com]
email:
  addr: bot@x.com
  password: app-password
";

    fn parse(yaml: &str) -> Options {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn full_config_parses() {
        let options = parse(VALID);
        assert_eq!(options.http.port, 9000);
        assert_eq!(options.secret_code.as_deref(), Some("hunter2"));
        assert_eq!(options.duty.mon, vec!["alice@x.com"]);
        assert_eq!(options.email.addr, "bot@x.com");
        assert_eq!(options.smtp.host, "smtp.gmail.com");
        assert_eq!(options.smtp.port, 587);
        options.validate().unwrap();
    }

    #[test]
    fn omitted_fields_use_defaults() {
        let options = parse("email: { addr: bot@x.com, password: p }");
        assert_eq!(options.http.port, 8000);
        assert!(options.secret_code.is_none());
        assert!(options.duty.to_roster().is_empty());
        options.validate().unwrap();
    }

    #[test]
    fn roster_conversion_preserves_slot_order() {
        let roster = parse(VALID).duty.to_roster();
        assert!(roster.recipients_for(Weekday::Sun).is_empty());
        assert_eq!(
            roster.recipients_for(Weekday::Tue),
            &[Recipient::from("bob@x.com"), Recipient::from("carol@x.com")]
        );
    }

    #[test]
    fn missing_account_fails_validation() {
        let err = parse("duty: { mon: [alice@x.com] }").validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_password_fails_validation() {
        let err = parse("email: { addr: bot@x.com }").validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn blank_duty_entry_fails_validation() {
        let yaml = "\
duty:
  wed: ['']
email:
  addr: bot@x.com
  password: p
";
        let err = parse(yaml).validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("duty.wed"), "{message}");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result: Result<Options, _> = serde_yaml::from_str("dutty: {}");
        assert!(result.is_err());
    }
}
