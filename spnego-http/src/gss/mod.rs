//! A small safe binding to the system gssapi (MIT krb5), initiator side
//! only, and the [`SecurityLayer`] built on it.

pub mod context;
pub mod credential;
pub mod error;
pub mod name;
pub mod oid;
pub(crate) mod util;

pub use self::{
    context::ClientCtx,
    credential::Cred,
    error::{Error, GssapiError},
    name::Name,
};

use crate::{
    login::LoginConfig,
    security::{ContextFlags, SecurityContextToken, SecurityLayer},
    service_name::{NameForm, ResolvedServiceName},
};
use oid::{Oid, GSS_MECH_SPNEGO, GSS_NT_HOSTBASED_SERVICE, GSS_NT_KRB5_PRINCIPAL, GSS_NT_USER_NAME};
use std::path::Path;
use tracing::debug;

/// Where [`Gssapi::login`] gets its credentials from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginSource<'a> {
    Keytab(&'a str),
    Ccache(&'a str),
    DefaultCcache,
}

impl<'a> LoginSource<'a> {
    fn from_config(config: &'a LoginConfig) -> Result<Self, GssapiError> {
        if config.use_keytab() {
            let keytab = config
                .keytab()
                .ok_or_else(|| GssapiError::InvalidOption("useKeyTab without keyTab".into()))?;
            if config.principal().is_none() {
                return Err(GssapiError::InvalidOption("useKeyTab without principal".into()));
            }
            if !Path::new(keytab).exists() {
                return Err(GssapiError::KeytabNotFound(keytab.into()));
            }
            Ok(LoginSource::Keytab(keytab))
        } else if let Some(ccache) = config.ticket_cache() {
            Ok(LoginSource::Ccache(ccache))
        } else {
            Ok(LoginSource::DefaultCcache)
        }
    }
}

/// The system gssapi, negotiating with the SPNEGO mechanism.
#[derive(Debug, Clone, Copy)]
pub struct Gssapi {
    mech: &'static Oid,
}

impl Default for Gssapi {
    fn default() -> Self {
        Gssapi {
            mech: &GSS_MECH_SPNEGO,
        }
    }
}

impl Gssapi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Negotiate with `mech` instead of SPNEGO, e.g. raw krb5 for
    /// servers that don't wrap their tokens.
    pub fn with_mech(mech: &'static Oid) -> Self {
        Gssapi { mech }
    }
}

impl SecurityLayer for Gssapi {
    type Credential = Cred;
    type Name = Name;
    type Context = ClientCtx;
    type Error = GssapiError;

    fn login(&self, config: &LoginConfig) -> Result<Cred, GssapiError> {
        let source = LoginSource::from_config(config)?;
        let principal = config
            .principal()
            .map(|p| Name::new(p.as_bytes(), &GSS_NT_KRB5_PRINCIPAL))
            .transpose()?;
        match source {
            LoginSource::Keytab(keytab) => {
                let principal = principal.ok_or_else(|| {
                    GssapiError::InvalidOption("useKeyTab without principal".into())
                })?;
                debug!(keytab, principal = %principal, "acquiring credentials from keytab");
                Cred::acquire_with_keytab(&principal, keytab)
            }
            LoginSource::Ccache(ccache) => {
                debug!(ccache, "acquiring credentials from ticket cache");
                Cred::acquire_from_ccache(principal.as_ref(), ccache)
            }
            LoginSource::DefaultCcache => {
                debug!("acquiring credentials from the default ticket cache");
                Ok(Cred::acquire(principal.as_ref())?)
            }
        }
    }

    fn create_name(&self, name: &ResolvedServiceName) -> Result<Name, GssapiError> {
        let kind = match name.form {
            NameForm::HostBasedService => &GSS_NT_HOSTBASED_SERVICE,
            NameForm::UserName => &GSS_NT_USER_NAME,
        };
        Ok(Name::new(name.name.as_bytes(), kind)?)
    }

    fn create_context(
        &self,
        credential: &Cred,
        target: Name,
        flags: ContextFlags,
    ) -> Result<ClientCtx, GssapiError> {
        Ok(ClientCtx::new(credential, target, flags, self.mech))
    }

    fn generate_token(
        &self,
        context: &mut ClientCtx,
        input: &[u8],
    ) -> Result<Option<SecurityContextToken>, GssapiError> {
        let token = context.step(input)?;
        debug!(
            input = input.len(),
            output = token.as_ref().map_or(0, |t| t.len()),
            complete = context.is_complete(),
            "gss_init_sec_context"
        );
        Ok(token.map(SecurityContextToken::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::login::{Credentials, KEY_TAB, PRINCIPAL, TICKET_CACHE, USE_KEY_TAB};
    use std::collections::BTreeMap;

    fn config(credentials: &Credentials, extra: &[(&str, &str)]) -> LoginConfig {
        let extra = extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>();
        LoginConfig::new(credentials, &extra)
    }

    #[test]
    fn test_missing_keytab() {
        let creds = Credentials::new(Some("/nonexistent/svc.keytab"), Some("svc@REALM"));
        let err = Gssapi::new().login(&config(&creds, &[])).unwrap_err();
        match err {
            GssapiError::KeytabNotFound(path) => {
                assert_eq!(path.to_str(), Some("/nonexistent/svc.keytab"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_keytab_mode_needs_keytab_and_principal() {
        let err = Gssapi::new()
            .login(&config(&Credentials::TicketCache, &[(USE_KEY_TAB, "true")]))
            .unwrap_err();
        assert!(matches!(err, GssapiError::InvalidOption(_)));

        let with_keytab = config(
            &Credentials::TicketCache,
            &[(USE_KEY_TAB, "true"), (KEY_TAB, "/etc/svc.keytab")],
        );
        assert!(matches!(
            LoginSource::from_config(&with_keytab),
            Err(GssapiError::InvalidOption(_))
        ));
    }

    #[test]
    fn test_login_source_selection() {
        let keytab = std::env::temp_dir().join(format!("spnego-http-{}.keytab", std::process::id()));
        std::fs::write(&keytab, b"").unwrap();
        let keytab_s = keytab.to_str().unwrap();
        let creds = Credentials::new(Some(keytab_s), Some("svc@REALM"));
        let cfg = config(&creds, &[]);
        assert_eq!(LoginSource::from_config(&cfg).unwrap(), LoginSource::Keytab(keytab_s));
        std::fs::remove_file(&keytab).unwrap();

        let cfg = config(&Credentials::TicketCache, &[(TICKET_CACHE, "FILE:/tmp/krb5cc_test")]);
        assert_eq!(
            LoginSource::from_config(&cfg).unwrap(),
            LoginSource::Ccache("FILE:/tmp/krb5cc_test")
        );

        let cfg = config(&Credentials::TicketCache, &[(PRINCIPAL, "alice@REALM")]);
        assert_eq!(LoginSource::from_config(&cfg).unwrap(), LoginSource::DefaultCcache);
    }
}
