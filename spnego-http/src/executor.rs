use crate::{
    error::{Error, Result},
    login::CredentialAcquirer,
    negotiate::SpnegoNegotiator,
    security::{ContextFlags, SecurityLayer},
    service_name::ServiceNameResolver,
    transport::{get_negotiated, Transport},
};
use tracing::{debug, info};
use url::Url;

/// Challenge rounds answered per request unless configured otherwise.
pub const DEFAULT_MAX_ROUNDS: usize = 4;

/// Runs authenticated GETs: log in, negotiate, request, log out, once
/// per call. Nothing is kept between calls.
pub struct AuthenticatedHttpExecutor<L, T> {
    acquirer: CredentialAcquirer<L>,
    resolver: ServiceNameResolver,
    transport: T,
    flags: ContextFlags,
    max_rounds: usize,
}

impl<L: SecurityLayer, T: Transport> AuthenticatedHttpExecutor<L, T> {
    pub fn new(acquirer: CredentialAcquirer<L>, resolver: ServiceNameResolver, transport: T) -> Self {
        AuthenticatedHttpExecutor {
            acquirer,
            resolver,
            transport,
            flags: ContextFlags::default(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_flags(mut self, flags: ContextFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn acquirer(&self) -> &CredentialAcquirer<L> {
        &self.acquirer
    }

    pub fn resolver(&self) -> &ServiceNameResolver {
        &self.resolver
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `url` and return the body of a successful response.
    pub fn execute_get(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|source| Error::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        // host only: no port, no canonicalisation
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidArgument(format!("url {} has no host", url)))?;

        let identity = self.acquirer.login(url)?;
        let response = {
            let mut negotiator =
                SpnegoNegotiator::new(&identity, &self.resolver, host, url).with_flags(self.flags);
            let response = get_negotiated(&self.transport, &parsed, &mut negotiator, self.max_rounds)?;
            if let Some(name) = negotiator.resolved_name() {
                debug!(%url, service = %name, "negotiated");
            }
            response
        };
        drop(identity);

        if !response.is_success() {
            return Err(Error::RequestFailed {
                url: url.to_string(),
                status: response.status,
                reason: response.reason,
            });
        }
        info!(%url, status = response.status, "request succeeded");
        Ok(response.body)
    }
}

#[cfg(feature = "gssapi")]
impl AuthenticatedHttpExecutor<crate::gss::Gssapi, crate::transport::ReqwestTransport> {
    /// The production executor for `config`: system gssapi over reqwest.
    pub fn from_config(config: &crate::config::ClientConfig) -> Result<Self> {
        config.validate()?;
        let acquirer = CredentialAcquirer::new(crate::gss::Gssapi::new(), config.credentials())
            .with_options(config.login_options.clone());
        let transport = crate::transport::ReqwestTransport::new(&config.transport)?;
        Ok(AuthenticatedHttpExecutor::new(acquirer, config.resolver()?, transport)
            .with_max_rounds(config.transport.max_negotiation_rounds))
    }
}
