//! Kerberos principal names, `prefix/host-or-user@REALM` or
//! `user@REALM`.

use crate::error::Error;
use std::{fmt, str::FromStr};

/// Service prefix used when the principal has no `/` component.
pub const DEFAULT_SERVICE: &str = "HTTP";

/// A principal split into its components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    prefix: String,
    host_or_user: String,
    realm: String,
    explicit_prefix: bool,
}

impl Principal {
    /// Parse `principal`. Exactly one `@` is required, and the part
    /// before it may contain at most one `/`. Without a `/` the prefix
    /// is [`DEFAULT_SERVICE`].
    pub fn parse(principal: &str) -> Result<Self, Error> {
        let malformed = |reason| Error::MalformedPrincipal {
            principal: principal.to_string(),
            reason,
        };

        let (name, realm) = match principal.split_once('@') {
            Some((_, rest)) if rest.contains('@') => return Err(malformed("more than one `@`")),
            Some(parts) => parts,
            None => return Err(malformed("missing `@REALM`")),
        };
        if realm.is_empty() {
            return Err(malformed("empty realm"));
        }

        let (prefix, host_or_user, explicit_prefix) = match name.split_once('/') {
            Some((_, rest)) if rest.contains('/') => return Err(malformed("more than one `/`")),
            Some((prefix, host_or_user)) => (prefix, host_or_user, true),
            None => (DEFAULT_SERVICE, name, false),
        };
        if prefix.is_empty() {
            return Err(malformed("empty service prefix"));
        }
        if host_or_user.is_empty() {
            return Err(malformed("empty host or user name"));
        }

        Ok(Principal {
            prefix: prefix.to_string(),
            host_or_user: host_or_user.to_string(),
            realm: realm.to_string(),
            explicit_prefix,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn host_or_user(&self) -> &str {
        &self.host_or_user
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }
}

impl FromStr for Principal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Principal::parse(s)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.explicit_prefix {
            write!(f, "{}/{}@{}", self.prefix, self.host_or_user, self.realm)
        } else {
            write!(f, "{}@{}", self.host_or_user, self.realm)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_malformed(principal: &str) {
        match Principal::parse(principal) {
            Err(Error::MalformedPrincipal { principal: p, .. }) => assert_eq!(p, principal),
            other => panic!("expected MalformedPrincipal for {principal:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_service_principal() {
        let p = Principal::parse("HTTP/svc.example.com@EXAMPLE.COM").unwrap();
        assert_eq!(p.prefix(), "HTTP");
        assert_eq!(p.host_or_user(), "svc.example.com");
        assert_eq!(p.realm(), "EXAMPLE.COM");
    }

    #[test]
    fn test_custom_prefix() {
        let p: Principal = "svc/alice@REALM".parse().unwrap();
        assert_eq!(p.prefix(), "svc");
        assert_eq!(p.host_or_user(), "alice");
        assert_eq!(p.realm(), "REALM");
    }

    #[test]
    fn test_user_principal_defaults_to_http() {
        let p = Principal::parse("alice@EXAMPLE.COM").unwrap();
        assert_eq!(p.prefix(), DEFAULT_SERVICE);
        assert_eq!(p.host_or_user(), "alice");
        assert_eq!(p.realm(), "EXAMPLE.COM");
    }

    #[test]
    fn test_at_count() {
        assert_malformed("alice");
        assert_malformed("HTTP/host.example.com");
        assert_malformed("alice@EXAMPLE.COM@OTHER.COM");
        assert_malformed("a@b@c@d");
    }

    #[test]
    fn test_empty_components() {
        assert_malformed("");
        assert_malformed("@EXAMPLE.COM");
        assert_malformed("alice@");
        assert_malformed("/host@EXAMPLE.COM");
        assert_malformed("HTTP/@EXAMPLE.COM");
    }

    #[test]
    fn test_too_many_slashes() {
        assert_malformed("HTTP/host/extra@EXAMPLE.COM");
    }

    #[test]
    fn test_display_round_trips_input() {
        for s in ["HTTP/svc.example.com@EXAMPLE.COM", "alice@EXAMPLE.COM"] {
            assert_eq!(Principal::parse(s).unwrap().to_string(), s);
        }
    }
}
