//! The boundary between the request pipeline and the native security
//! layer.
//!
//! Everything that talks to Kerberos goes through [`SecurityLayer`]: the
//! login, name construction, context creation and token generation. The
//! production implementation is [`crate::gss::Gssapi`]; tests drive the
//! pipeline with their own.

use crate::{login::LoginConfig, service_name::ResolvedServiceName};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bitflags::bitflags;
use bytes::Bytes;
use std::{error, fmt, ops::Deref};

bitflags! {
    /// Services requested from a security context. The bit values are
    /// the GSS_C_*_FLAG values of RFC 2744.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ContextFlags: u32 {
        const DELEGATE = 1;
        const MUTUAL = 2;
        const REPLAY = 4;
        const SEQUENCE = 8;
        const CONFIDENTIALITY = 16;
        const INTEGRITY = 32;
    }
}

impl Default for ContextFlags {
    /// Mutual authentication with credential delegation.
    fn default() -> Self {
        ContextFlags::MUTUAL | ContextFlags::DELEGATE
    }
}

/// An opaque token produced by one round of context establishment.
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityContextToken(Bytes);

impl SecurityContextToken {
    pub fn new(token: impl Into<Bytes>) -> Self {
        SecurityContextToken(token.into())
    }

    /// The token as it goes into an `Authorization: Negotiate` header.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Deref for SecurityContextToken {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Bytes> for SecurityContextToken {
    fn from(token: Bytes) -> Self {
        SecurityContextToken(token)
    }
}

impl fmt::Debug for SecurityContextToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecurityContextToken({} bytes)", self.0.len())
    }
}

/// The capabilities the pipeline needs from a Kerberos/GSS
/// implementation.
pub trait SecurityLayer {
    /// A logged in identity. Dropping it releases the native handle.
    type Credential;

    /// A target name in the form chosen by the resolver.
    type Name;

    /// An initiator security context.
    type Context;

    type Error: error::Error + Send + Sync + 'static;

    /// Log in according to `config`, never prompting.
    fn login(&self, config: &LoginConfig) -> Result<Self::Credential, Self::Error>;

    /// Called once when an identity obtained from [`login`](Self::login)
    /// goes out of scope, right before its credential is dropped.
    fn logout(&self, _credential: &mut Self::Credential) {}

    fn create_name(&self, name: &ResolvedServiceName) -> Result<Self::Name, Self::Error>;

    fn create_context(
        &self,
        credential: &Self::Credential,
        target: Self::Name,
        flags: ContextFlags,
    ) -> Result<Self::Context, Self::Error>;

    /// Feed `input` (empty on the first round) to the context and return
    /// the next token for the acceptor, or `None` once there is nothing
    /// more to send.
    fn generate_token(
        &self,
        context: &mut Self::Context,
        input: &[u8],
    ) -> Result<Option<SecurityContextToken>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let flags = ContextFlags::default();
        assert!(flags.contains(ContextFlags::MUTUAL));
        assert!(flags.contains(ContextFlags::DELEGATE));
        assert_eq!(flags.bits(), 3);
    }

    #[test]
    fn test_token_base64() {
        let token = SecurityContextToken::new(&b"\x60\x82\x01"[..]);
        assert_eq!(token.to_base64(), "YIIB");
        assert_eq!(token.len(), 3);
    }
}
