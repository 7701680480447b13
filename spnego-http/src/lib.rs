//! Authenticated HTTP GETs over SPNEGO (Kerberos).
//!
//! A request is made on behalf of a configured identity, either a
//! principal with its keytab or whatever the ticket cache holds. Each
//! call to [`AuthenticatedHttpExecutor::execute_get`] logs in, derives the
//! target service name from the configured principal and the destination
//! host, answers the server's `Negotiate` challenges, and logs out again.
//!
//! The native security machinery sits behind [`SecurityLayer`]; the
//! `gssapi` feature (on by default) provides [`gss::Gssapi`], which
//! talks to the system MIT krb5 gssapi.
//!
//! ```no_run
//! use spnego_http::{config::ClientConfig, AuthenticatedHttpExecutor};
//!
//! let config = ClientConfig::load("spnego-get.toml")?;
//! let executor = AuthenticatedHttpExecutor::from_config(&config)?;
//! let body = executor.execute_get(config.access_url()?)?;
//! println!("{}", body);
//! # Ok::<(), spnego_http::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod executor;
#[cfg(feature = "gssapi")]
pub mod gss;
pub mod login;
pub mod negotiate;
pub mod principal;
pub mod security;
pub mod service_name;
pub mod transport;

pub use crate::{
    error::{Error, Result},
    executor::AuthenticatedHttpExecutor,
    login::{AuthenticatedIdentity, CredentialAcquirer, Credentials, LoginConfig},
    negotiate::SpnegoNegotiator,
    principal::Principal,
    security::{ContextFlags, SecurityContextToken, SecurityLayer},
    service_name::{NameForm, ResolvedServiceName, ServiceNameResolver, ServiceNameType},
};
