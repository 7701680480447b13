//! Client configuration, loaded from TOML.

use crate::{
    error::{Error, Result},
    executor::DEFAULT_MAX_ROUNDS,
    login::Credentials,
    service_name::{ServiceNameResolver, ServiceNameType},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, fs, path::Path, str::FromStr, time::Duration};
use url::Url;

/// Which of the two client variants to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientMode {
    /// Honour the configured principal, name type and service principal.
    #[default]
    Custom,
    /// `HTTP@host` naming, whatever is in the ticket cache.
    Standard,
}

impl FromStr for ClientMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "custom" => Ok(ClientMode::Custom),
            "standard" => Ok(ClientMode::Standard),
            _ => Err(Error::InvalidArgument(format!(
                "unknown mode `{}`, expected custom or standard",
                s
            ))),
        }
    }
}

impl fmt::Display for ClientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMode::Custom => f.write_str("custom"),
            ClientMode::Standard => f.write_str("standard"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TransportConfig {
    /// Seconds to wait for the TCP connection.
    pub connect_timeout_secs: Option<u64>,

    /// Seconds for the whole request.
    pub timeout_secs: Option<u64>,

    /// Challenge rounds answered before giving up.
    #[serde(default = "TransportConfig::default_max_negotiation_rounds")]
    pub max_negotiation_rounds: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: None,
            timeout_secs: None,
            max_negotiation_rounds: Self::default_max_negotiation_rounds(),
        }
    }
}

impl TransportConfig {
    fn default_max_negotiation_rounds() -> usize {
        DEFAULT_MAX_ROUNDS
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_negotiation_rounds == 0 {
            return Err(Error::Config(
                "max-negotiation-rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ClientConfig {
    /// The url to GET.
    pub access_url: Option<String>,

    /// `name@REALM` or `prefix/name@REALM`. Logged in as when a keytab is
    /// given, and the source of the service name prefix.
    pub user_principal: Option<String>,

    pub keytab_location: Option<String>,

    /// Used verbatim as the target name in user based mode.
    pub service_principal: Option<String>,

    pub service_name_type: Option<ServiceNameType>,

    #[serde(default)]
    pub mode: ClientMode,

    /// Passed through to the login subsystem as is.
    #[serde(default)]
    pub login_options: BTreeMap<String, String>,

    #[serde(default)]
    pub transport: TransportConfig,
}

impl FromStr for ClientConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        contents.parse()
    }

    pub fn validate(&self) -> Result<()> {
        self.transport.validate()
    }

    pub fn access_url(&self) -> Result<&str> {
        self.access_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::Config("access-url is not set".to_string()))
    }

    /// Parsed [`access_url`](Self::access_url).
    pub fn url(&self) -> Result<Url> {
        let url = self.access_url()?;
        Url::parse(url).map_err(|source| Error::InvalidUrl {
            url: url.to_string(),
            source,
        })
    }

    /// The login source. Standard mode always uses the ticket cache.
    pub fn credentials(&self) -> Credentials {
        match self.mode {
            ClientMode::Custom => Credentials::new(
                self.keytab_location.as_deref(),
                self.user_principal.as_deref(),
            ),
            ClientMode::Standard => Credentials::TicketCache,
        }
    }

    /// The service naming strategy. Fails on a malformed principal.
    pub fn resolver(&self) -> Result<ServiceNameResolver> {
        match self.mode {
            ClientMode::Custom => ServiceNameResolver::new(
                self.user_principal
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty()),
                self.service_name_type,
                self.service_principal.as_deref(),
            ),
            ClientMode::Standard => Ok(ServiceNameResolver::default_naming()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service_name::NameForm;
    use std::path::PathBuf;

    #[test]
    fn test_default_values() {
        let config = ClientConfig::default();
        assert_eq!(config.mode, ClientMode::Custom);
        assert!(config.access_url.is_none());
        assert!(config.login_options.is_empty());
        assert_eq!(config.transport.max_negotiation_rounds, 4);
        assert!(config.transport.timeout().is_none());
        assert_eq!(config.credentials(), Credentials::TicketCache);
    }

    #[test]
    fn test_config_from_toml() {
        let config: ClientConfig = r#"
            access-url = "https://svc.example.com/api"
            user-principal = "HTTP/svc.example.com@EXAMPLE.COM"
            keytab-location = "/etc/svc.keytab"
            service-principal = "alice@EXAMPLE.COM"
            service-name-type = "user-based"
            mode = "custom"

            [login-options]
            ticketCache = "FILE:/tmp/krb5cc_1000"

            [transport]
            connect-timeout-secs = 10
            timeout-secs = 30
            max-negotiation-rounds = 2
        "#
        .parse()
        .unwrap();

        assert_eq!(config.access_url().unwrap(), "https://svc.example.com/api");
        assert_eq!(config.service_name_type, Some(ServiceNameType::UserBased));
        assert_eq!(
            config.login_options.get("ticketCache").map(String::as_str),
            Some("FILE:/tmp/krb5cc_1000")
        );
        assert_eq!(config.transport.connect_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.transport.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.transport.max_negotiation_rounds, 2);
        assert_eq!(
            config.credentials(),
            Credentials::Keytab {
                keytab: PathBuf::from("/etc/svc.keytab"),
                principal: "HTTP/svc.example.com@EXAMPLE.COM".to_string(),
            }
        );
        let name = config.resolver().unwrap().resolve("svc.example.com").unwrap();
        assert_eq!(name.name, "alice@EXAMPLE.COM");
        assert_eq!(name.form, NameForm::UserName);
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let err = "[transport]\nmax-negotiation-rounds = 0"
            .parse::<ClientConfig>()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config = ClientConfig {
            transport: TransportConfig {
                max_negotiation_rounds: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        assert!(ClientConfig::default().validate().is_ok());
        assert_eq!(
            TransportConfig::default().max_negotiation_rounds,
            DEFAULT_MAX_ROUNDS
        );
    }

    #[test]
    fn test_legacy_name_type_spelling() {
        let config: ClientConfig = r#"service-name-type = "HOST_BASED""#.parse().unwrap();
        assert_eq!(config.service_name_type, Some(ServiceNameType::HostBased));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = "access_url = \"http://h\"".parse::<ClientConfig>().unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_standard_mode_ignores_identity() {
        let config = ClientConfig {
            user_principal: Some("svc/alice@REALM".to_string()),
            keytab_location: Some("/etc/svc.keytab".to_string()),
            service_name_type: Some(ServiceNameType::UserBased),
            mode: ClientMode::Standard,
            ..Default::default()
        };
        assert_eq!(config.credentials(), Credentials::TicketCache);
        let name = config.resolver().unwrap().resolve("h.example.com").unwrap();
        assert_eq!(name.name, "HTTP@h.example.com");
        assert_eq!(name.form, NameForm::HostBasedService);
    }

    #[test]
    fn test_principal_trimmed_for_login_and_naming() {
        let config = ClientConfig {
            user_principal: Some(" svc/alice@REALM ".to_string()),
            keytab_location: Some("/etc/svc.keytab".to_string()),
            service_name_type: Some(ServiceNameType::UserBased),
            ..Default::default()
        };
        assert_eq!(
            config.credentials(),
            Credentials::Keytab {
                keytab: PathBuf::from("/etc/svc.keytab"),
                principal: "svc/alice@REALM".to_string(),
            }
        );
        let name = config.resolver().unwrap().resolve("h").unwrap();
        assert_eq!(name.name, "svc@REALM");
        assert_eq!(name.form, NameForm::UserName);

        let config = ClientConfig {
            user_principal: Some("   ".to_string()),
            ..Default::default()
        };
        let name = config.resolver().unwrap().resolve("h").unwrap();
        assert_eq!(name.name, "HTTP@h");
    }

    #[test]
    fn test_malformed_principal_fails_resolver() {
        let config = ClientConfig {
            user_principal: Some("svc/alice".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.resolver().unwrap_err(),
            Error::MalformedPrincipal { .. }
        ));
    }

    #[test]
    fn test_missing_and_bad_url() {
        let config = ClientConfig::default();
        assert!(matches!(config.url().unwrap_err(), Error::Config(_)));

        let config = ClientConfig {
            access_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.url().unwrap_err(), Error::InvalidUrl { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = ClientConfig::load("/nonexistent/spnego-get.toml").unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("Standard".parse::<ClientMode>().unwrap(), ClientMode::Standard);
        assert!("rest".parse::<ClientMode>().is_err());
    }
}
