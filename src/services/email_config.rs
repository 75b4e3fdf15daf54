//! Email configuration loading and validation
//!
//! Example (TOML):
//! ```toml
//! subject = "Charger usage {{ Metadata.From.strftime('%Y-%m') }}"
//! filename = "usage-{{ Metadata.From.strftime('%Y-%m') }}.xlsx"
//! to = ["board@example.com"]
//! text = "Usage report attached."
//!
//! [server]
//! address = "smtp.example.com"
//! port = 587
//! username = "reports@example.com"
//! password = "secret"
//! encryption = "explicit"
//!
//! [from]
//! name = "Charger reports"
//! address = "reports@example.com"
//! ```

use std::fs;
use std::path::Path;

use lettre::Address;
use serde::{Deserialize, Deserializer};

use crate::types::{ReporterError, Result};

/// SMTP connection security
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    /// Plaintext SMTP
    Disabled,
    /// Plaintext connect, then STARTTLS before authenticating
    #[default]
    Explicit,
    /// TLS from the first byte (SMTPS)
    Implicit,
}

impl Encryption {
    pub fn default_port(self) -> u16 {
        match self {
            Self::Disabled => 25,
            Self::Explicit => 587,
            Self::Implicit => 465,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub address: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub encryption: Encryption,
}

impl ServerConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.encryption.default_port())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SenderConfig {
    /// Display name; may be a template
    #[serde(default)]
    pub name: Option<String>,
    pub address: String,
}

/// Outbound email settings for one report run
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub server: ServerConfig,
    pub from: SenderConfig,
    #[serde(default, deserialize_with = "string_or_list")]
    pub to: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub cc: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub bcc: Vec<String>,
    pub subject: String,
    /// Attachment filename template; no attachment when absent
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

impl EmailConfig {
    /// Load and validate a config file (`.toml` or `.json`)
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let config = match extension.as_deref() {
            Some("toml") => Self::from_toml(&content)?,
            Some("json") => Self::from_json(&content)?,
            _ => {
                return Err(ReporterError::ConfigValidation(format!(
                    "unsupported email config format: {}",
                    path.display()
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ReporterError::ConfigValidation(format!("invalid TOML: {}", e)))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ReporterError::ConfigValidation(format!("invalid JSON: {}", e)))
    }

    /// Check addresses and required values
    pub fn validate(&self) -> Result<()> {
        if self.server.address.trim().is_empty() {
            return Err(ReporterError::ConfigValidation(
                "server.address must not be empty".into(),
            ));
        }
        if self.subject.trim().is_empty() {
            return Err(ReporterError::ConfigValidation(
                "subject must not be empty".into(),
            ));
        }

        parse_address("from.address", &self.from.address)?;
        for (field, list) in [("to", &self.to), ("cc", &self.cc), ("bcc", &self.bcc)] {
            for address in list {
                parse_address(field, address)?;
            }
        }

        if self.recipient_count() == 0 {
            return Err(ReporterError::ConfigValidation(
                "at least one recipient (to, cc or bcc) is required".into(),
            ));
        }

        if self.text.is_none() && self.html.is_none() {
            tracing::warn!("email config has neither a text nor an html body");
        }
        if self.filename.is_none() {
            tracing::warn!("email config has no filename; the report will not be attached");
        }

        Ok(())
    }

    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }
}

/// Parse an email address, naming the config field on failure
pub fn parse_address(field: &str, value: &str) -> Result<Address> {
    value.trim().parse::<Address>().map_err(|e| {
        ReporterError::ConfigValidation(format!("{} has invalid address {:?}: {}", field, value, e))
    })
}

fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::count_warnings;
    use tempfile::TempDir;

    const TOML_CONFIG: &str = r#"
subject = "Report for {{ Metadata.From.strftime('%Y-%m') }}"
filename = "report.xlsx"
to = "board@example.com"
text = "See attachment."

[server]
address = "smtp.example.com"
username = "user"
password = "pass"
encryption = "implicit"

[from]
name = "Reporter"
address = "reports@example.com"
"#;

    // ========== Parsing ==========

    #[test]
    fn test_toml_single_recipient_string() {
        let config = EmailConfig::from_toml(TOML_CONFIG).unwrap();

        assert_eq!(config.to, vec!["board@example.com".to_string()]);
        assert!(config.cc.is_empty());
        assert_eq!(config.server.encryption, Encryption::Implicit);
        assert_eq!(config.server.port(), 465);
        assert_eq!(config.from.name.as_deref(), Some("Reporter"));
        assert_eq!(config.filename.as_deref(), Some("report.xlsx"));
        assert!(config.html.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_json_recipient_list() {
        let json = r#"{
            "server": {"address": "smtp.example.com", "port": 2525, "username": "u", "password": "p"},
            "from": {"address": "reports@example.com"},
            "to": ["a@example.com", "b@example.com"],
            "bcc": "audit@example.com",
            "subject": "Report",
            "html": "<p>Report</p>"
        }"#;

        let config = EmailConfig::from_json(json).unwrap();

        assert_eq!(config.to.len(), 2);
        assert_eq!(config.bcc, vec!["audit@example.com".to_string()]);
        assert_eq!(config.server.encryption, Encryption::Explicit);
        assert_eq!(config.server.port(), 2525);
        assert_eq!(config.recipient_count(), 3);
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_required_key() {
        let err = EmailConfig::from_toml("subject = \"x\"\nto = \"a@example.com\"").unwrap_err();
        assert!(matches!(err, ReporterError::ConfigValidation(_)));
    }

    #[test]
    fn test_unknown_encryption_mode() {
        let config = TOML_CONFIG.replace("\"implicit\"", "\"ssl\"");
        assert!(EmailConfig::from_toml(&config).is_err());
    }

    // ========== Validation ==========

    #[test]
    fn test_invalid_to_address_rejected() {
        let config = TOML_CONFIG.replace("board@example.com", "not-an-address");
        let err = EmailConfig::from_toml(&config).unwrap().validate().unwrap_err();
        assert!(matches!(err, ReporterError::ConfigValidation(ref msg) if msg.starts_with("to ")));
    }

    #[test]
    fn test_invalid_from_address_rejected() {
        let config = TOML_CONFIG.replace("reports@example.com", "reports.example.com");
        let err = EmailConfig::from_toml(&config).unwrap().validate().unwrap_err();
        assert!(
            matches!(err, ReporterError::ConfigValidation(ref msg) if msg.starts_with("from.address"))
        );
    }

    #[test]
    fn test_no_recipients_rejected() {
        let config = TOML_CONFIG.replace("to = \"board@example.com\"\n", "");
        let err = EmailConfig::from_toml(&config).unwrap().validate().unwrap_err();
        assert!(matches!(err, ReporterError::ConfigValidation(_)));
    }

    #[test]
    fn test_missing_bodies_is_not_an_error() {
        let config = TOML_CONFIG.replace("text = \"See attachment.\"\n", "");
        let config = EmailConfig::from_toml(&config).unwrap();
        assert!(config.text.is_none() && config.html.is_none());

        let (result, warnings) = count_warnings(|| config.validate());
        result.unwrap();
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_complete_config_validates_without_warnings() {
        let config = EmailConfig::from_toml(TOML_CONFIG).unwrap();
        let (result, warnings) = count_warnings(|| config.validate());
        result.unwrap();
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_missing_filename_warns() {
        let config = TOML_CONFIG.replace("filename = \"report.xlsx\"\n", "");
        let config = EmailConfig::from_toml(&config).unwrap();
        assert!(config.filename.is_none());

        let (result, warnings) = count_warnings(|| config.validate());
        result.unwrap();
        assert_eq!(warnings, 1);
    }

    // ========== load() ==========

    #[test]
    fn test_load_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("email.toml");
        fs::write(&path, TOML_CONFIG).unwrap();

        let config = EmailConfig::load(&path).unwrap();
        assert_eq!(config.server.address, "smtp.example.com");
    }

    #[test]
    fn test_load_validates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("email.toml");
        fs::write(&path, TOML_CONFIG.replace("board@example.com", "nope")).unwrap();

        assert!(matches!(
            EmailConfig::load(&path),
            Err(ReporterError::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("email.ini");
        fs::write(&path, TOML_CONFIG).unwrap();

        assert!(matches!(
            EmailConfig::load(&path),
            Err(ReporterError::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.toml");
        assert!(matches!(EmailConfig::load(&path), Err(ReporterError::Io(_))));
    }
}
