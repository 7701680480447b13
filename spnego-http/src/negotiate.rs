use crate::{
    error::{Error, Result},
    login::AuthenticatedIdentity,
    security::{ContextFlags, SecurityContextToken, SecurityLayer},
    service_name::{ResolvedServiceName, ServiceNameResolver},
    transport::{ChallengeHandler, NEGOTIATE},
};
use tracing::debug;

/// Produces SPNEGO tokens for one request as the logged in identity.
///
/// The target name is resolved and the security context established on
/// the first challenge. Later challenges continue the same context.
pub struct SpnegoNegotiator<'a, 'b, L: SecurityLayer> {
    identity: &'b AuthenticatedIdentity<'a, L>,
    resolver: &'b ServiceNameResolver,
    host: String,
    target: String,
    flags: ContextFlags,
    resolved: Option<ResolvedServiceName>,
    context: Option<L::Context>,
}

impl<'a, 'b, L: SecurityLayer> SpnegoNegotiator<'a, 'b, L> {
    /// `target` only labels errors, usually the request url.
    pub fn new(
        identity: &'b AuthenticatedIdentity<'a, L>,
        resolver: &'b ServiceNameResolver,
        host: &str,
        target: &str,
    ) -> Self {
        SpnegoNegotiator {
            identity,
            resolver,
            host: host.to_string(),
            target: target.to_string(),
            flags: ContextFlags::default(),
            resolved: None,
            context: None,
        }
    }

    pub fn with_flags(mut self, flags: ContextFlags) -> Self {
        self.flags = flags;
        self
    }

    /// The service name the context was opened against, once it has been.
    pub fn resolved_name(&self) -> Option<&ResolvedServiceName> {
        self.resolved.as_ref()
    }

    fn failed<E>(&self, e: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::NegotiationFailed {
            target: self.target.clone(),
            source: Box::new(e),
        }
    }

    fn establish(&mut self) -> Result<L::Context> {
        let layer = self.identity.layer();
        let resolved = self.resolver.resolve(&self.host)?;
        let name = layer
            .create_name(&resolved)
            .map_err(|e| self.failed(e))?;
        let context = layer
            .create_context(self.identity.credential(), name, self.flags)
            .map_err(|e| self.failed(e))?;
        debug!(target = %self.target, name = %resolved, "created security context");
        self.resolved = Some(resolved);
        Ok(context)
    }

    /// Feed `challenge` (empty for the initial one) to the context and
    /// return the token to send, if any.
    pub fn negotiate(&mut self, challenge: &[u8]) -> Result<Option<SecurityContextToken>> {
        let mut context = match self.context.take() {
            Some(context) => context,
            None => self.establish()?,
        };
        let token = self
            .identity
            .layer()
            .generate_token(&mut context, challenge)
            .map_err(|e| self.failed(e))?;
        self.context = Some(context);
        Ok(token)
    }
}

impl<'a, 'b, L: SecurityLayer> ChallengeHandler for SpnegoNegotiator<'a, 'b, L> {
    fn scheme(&self) -> &str {
        NEGOTIATE
    }

    fn respond(&mut self, challenge: &[u8]) -> Result<Option<SecurityContextToken>> {
        self.negotiate(challenge)
    }
}
