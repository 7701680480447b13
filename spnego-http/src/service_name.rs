//! Deriving the target service name presented to the security layer.

use crate::{
    error::Error,
    principal::{Principal, DEFAULT_SERVICE},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::{debug, warn};

/// How the outbound service name is built from the configured principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceNameType {
    /// `prefix@destination-host`.
    #[default]
    #[serde(alias = "HOST_BASED", alias = "host_based")]
    HostBased,
    /// The explicit service principal, or `prefix@REALM`.
    #[serde(alias = "USER_BASED", alias = "user_based")]
    UserBased,
}

impl FromStr for ServiceNameType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "host-based" => Ok(ServiceNameType::HostBased),
            "user-based" => Ok(ServiceNameType::UserBased),
            _ => Err(Error::InvalidArgument(format!(
                "unknown service name type `{}`, expected host-based or user-based",
                s
            ))),
        }
    }
}

impl fmt::Display for ServiceNameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceNameType::HostBased => f.write_str("host-based"),
            ServiceNameType::UserBased => f.write_str("user-based"),
        }
    }
}

/// Which name type the security layer should import the name as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameForm {
    /// `service@host`, GSS_C_NT_HOSTBASED_SERVICE.
    HostBasedService,
    /// A user or principal name, GSS_C_NT_USER_NAME.
    UserName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServiceName {
    pub name: String,
    pub form: NameForm,
}

impl ResolvedServiceName {
    fn host_based(prefix: &str, host: &str) -> Self {
        ResolvedServiceName {
            name: format!("{}@{}", prefix, host),
            form: NameForm::HostBasedService,
        }
    }
}

impl fmt::Display for ResolvedServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The naming strategy handed to the negotiator. The principal is
/// validated once, here; [`resolve`](Self::resolve) then only depends on
/// the destination host.
#[derive(Debug, Clone, Default)]
pub struct ServiceNameResolver {
    principal: Option<Principal>,
    name_type: Option<ServiceNameType>,
    service_principal: Option<String>,
}

impl ServiceNameResolver {
    pub fn new(
        principal: Option<&str>,
        name_type: Option<ServiceNameType>,
        service_principal: Option<&str>,
    ) -> Result<Self, Error> {
        let principal = principal.map(Principal::parse).transpose()?;
        let service_principal = service_principal
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);
        if name_type == Some(ServiceNameType::UserBased)
            && principal.is_none()
            && service_principal.is_none()
        {
            return Err(Error::InvalidArgument(
                "a user based service name needs a principal or an explicit service principal"
                    .to_string(),
            ));
        }
        Ok(ServiceNameResolver {
            principal,
            name_type,
            service_principal,
        })
    }

    /// `HTTP@host`, host based, whatever the host.
    pub fn default_naming() -> Self {
        ServiceNameResolver::default()
    }

    pub fn name_type(&self) -> Option<ServiceNameType> {
        self.name_type
    }

    pub fn resolve(&self, destination_host: &str) -> Result<ResolvedServiceName, Error> {
        if destination_host.is_empty() {
            return Err(Error::InvalidArgument(
                "destination host must not be empty".to_string(),
            ));
        }
        let resolved = match (&self.principal, self.name_type) {
            (None, None) => ResolvedServiceName::host_based(DEFAULT_SERVICE, destination_host),
            (principal, name_type) => {
                let prefix = principal.as_ref().map_or(DEFAULT_SERVICE, |p| p.prefix());
                match name_type.unwrap_or_default() {
                    ServiceNameType::HostBased => {
                        ResolvedServiceName::host_based(prefix, destination_host)
                    }
                    ServiceNameType::UserBased => self.resolve_user_based(prefix)?,
                }
            }
        };
        debug!(
            host = destination_host,
            name = %resolved.name,
            form = ?resolved.form,
            "resolved target service name"
        );
        Ok(resolved)
    }

    fn resolve_user_based(&self, prefix: &str) -> Result<ResolvedServiceName, Error> {
        let name = match (&self.service_principal, &self.principal) {
            (Some(service_principal), _) => service_principal.clone(),
            (None, Some(principal)) => {
                // frequently not the name the service is registered under
                let name = format!("{}@{}", prefix, principal.realm());
                warn!(%name, "user based service name derived from the principal's realm");
                name
            }
            (None, None) => {
                return Err(Error::InvalidArgument(
                    "a user based service name needs a principal or an explicit service principal"
                        .to_string(),
                ))
            }
        };
        Ok(ResolvedServiceName {
            name,
            form: NameForm::UserName,
        })
    }
}

/// Resolve in one go, parsing `principal` on the way.
pub fn resolve(
    principal: Option<&str>,
    name_type: Option<ServiceNameType>,
    service_principal: Option<&str>,
    destination_host: &str,
) -> Result<ResolvedServiceName, Error> {
    ServiceNameResolver::new(principal, name_type, service_principal)?.resolve(destination_host)
}
