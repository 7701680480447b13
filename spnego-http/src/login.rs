//! Logging in, from a keytab or from the ticket cache.

use crate::{
    error::{Error, Result},
    security::SecurityLayer,
};
use std::{collections::BTreeMap, fmt, path::PathBuf};
use tracing::debug;

pub const USE_KEY_TAB: &str = "useKeyTab";
pub const USE_TICKET_CACHE: &str = "useTicketCache";
pub const KEY_TAB: &str = "keyTab";
pub const PRINCIPAL: &str = "principal";
pub const STORE_KEY: &str = "storeKey";
pub const DO_NOT_PROMPT: &str = "doNotPrompt";
pub const IS_INITIATOR: &str = "isInitiator";
/// Passthrough option naming a specific credential cache.
pub const TICKET_CACHE: &str = "ticketCache";

/// Where the identity comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Keytab { keytab: PathBuf, principal: String },
    TicketCache,
}

impl Credentials {
    /// Keytab login only when both the keytab and the principal are
    /// given and not blank, otherwise the ticket cache.
    pub fn new(keytab: Option<&str>, principal: Option<&str>) -> Self {
        let keytab = keytab.map(str::trim).filter(|s| !s.is_empty());
        let principal = principal.map(str::trim).filter(|s| !s.is_empty());
        match (keytab, principal) {
            (Some(keytab), Some(principal)) => Credentials::Keytab {
                keytab: PathBuf::from(keytab),
                principal: principal.to_string(),
            },
            _ => Credentials::TicketCache,
        }
    }

    pub fn is_keytab(&self) -> bool {
        matches!(self, Credentials::Keytab { .. })
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Keytab { keytab, principal } => {
                write!(f, "keytab {} for {}", keytab.display(), principal)
            }
            Credentials::TicketCache => f.write_str("ticket cache"),
        }
    }
}

/// The options handed to the login subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginConfig {
    options: BTreeMap<String, String>,
}

impl LoginConfig {
    /// Build the option set for `credentials`. `extra` may add options
    /// or override the derived ones, but `doNotPrompt` and `isInitiator`
    /// are always `true`.
    pub fn new(credentials: &Credentials, extra: &BTreeMap<String, String>) -> Self {
        let mut options = BTreeMap::new();
        match credentials {
            Credentials::Keytab { keytab, principal } => {
                options.insert(USE_KEY_TAB.to_string(), "true".to_string());
                options.insert(KEY_TAB.to_string(), keytab.display().to_string());
                options.insert(PRINCIPAL.to_string(), principal.clone());
                options.insert(STORE_KEY.to_string(), "true".to_string());
            }
            Credentials::TicketCache => {
                options.insert(USE_TICKET_CACHE.to_string(), "true".to_string());
            }
        }
        options.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        options.insert(DO_NOT_PROMPT.to_string(), "true".to_string());
        options.insert(IS_INITIATOR.to_string(), "true".to_string());
        LoginConfig { options }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .map_or(false, |v| v.eq_ignore_ascii_case("true"))
    }

    pub fn use_keytab(&self) -> bool {
        self.flag(USE_KEY_TAB)
    }

    pub fn keytab(&self) -> Option<&str> {
        self.get(KEY_TAB)
    }

    pub fn principal(&self) -> Option<&str> {
        self.get(PRINCIPAL)
    }

    pub fn ticket_cache(&self) -> Option<&str> {
        self.get(TICKET_CACHE)
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}

/// Logs in through a [`SecurityLayer`] with fixed credentials.
pub struct CredentialAcquirer<L> {
    layer: L,
    credentials: Credentials,
    options: BTreeMap<String, String>,
}

impl<L: SecurityLayer> CredentialAcquirer<L> {
    pub fn new(layer: L, credentials: Credentials) -> Self {
        CredentialAcquirer {
            layer,
            credentials,
            options: BTreeMap::new(),
        }
    }

    /// Passthrough options for the login subsystem.
    pub fn with_options(mut self, options: BTreeMap<String, String>) -> Self {
        self.options = options;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    pub fn login_config(&self) -> LoginConfig {
        LoginConfig::new(&self.credentials, &self.options)
    }

    /// Log in. The identity is released when the returned value is
    /// dropped. Failures are reported as [`Error::LoginFailed`] against
    /// `target`.
    pub fn login(&self, target: &str) -> Result<AuthenticatedIdentity<'_, L>> {
        let config = self.login_config();
        debug!(
            credentials = %self.credentials,
            keytab = config.use_keytab(),
            "logging in"
        );
        let credential = self
            .layer
            .login(&config)
            .map_err(|e| Error::LoginFailed {
                target: target.to_string(),
                source: Box::new(e),
            })?;
        debug!(credentials = %self.credentials, "logged in");
        Ok(AuthenticatedIdentity {
            layer: &self.layer,
            credential,
        })
    }
}

/// A logged in identity, scoped to one unit of work.
pub struct AuthenticatedIdentity<'a, L: SecurityLayer> {
    layer: &'a L,
    credential: L::Credential,
}

impl<'a, L: SecurityLayer> AuthenticatedIdentity<'a, L> {
    pub fn layer(&self) -> &'a L {
        self.layer
    }

    pub fn credential(&self) -> &L::Credential {
        &self.credential
    }
}

impl<'a, L: SecurityLayer> Drop for AuthenticatedIdentity<'a, L> {
    fn drop(&mut self) {
        self.layer.logout(&mut self.credential);
        debug!("released kerberos identity");
    }
}
