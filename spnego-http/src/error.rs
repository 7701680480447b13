//! Error type for the request pipeline.

use std::path::PathBuf;

/// Boxed source error from the security layer or the transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A principal that isn't `name@REALM` or `prefix/name@REALM`.
    #[error("malformed principal `{principal}`: {reason}")]
    MalformedPrincipal {
        principal: String,
        reason: &'static str,
    },

    /// A caller supplied value the pipeline can't work with.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid url `{url}`")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Identity acquisition failed: expired or missing ticket, bad
    /// keytab, unknown principal, clock skew.
    #[error("kerberos login failed for {target}")]
    LoginFailed {
        target: String,
        #[source]
        source: BoxError,
    },

    /// Name or context creation, or token generation failed during the
    /// handshake.
    #[error("SPNEGO negotiation with {target} failed")]
    NegotiationFailed {
        target: String,
        #[source]
        source: BoxError,
    },

    /// The transport worked but the server didn't answer with success.
    #[error("request to {url} failed, status is {status}, reason {}", .reason.as_deref().unwrap_or("unknown"))]
    RequestFailed {
        url: String,
        status: u16,
        reason: Option<String>,
    },

    #[error("error executing call to {url}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("can't read config file {}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config")]
    ConfigParse(#[from] toml::de::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The HTTP status of a [`Error::RequestFailed`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
