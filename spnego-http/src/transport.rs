//! The HTTP side: a minimal GET transport, and the challenge/response
//! loop that drives an authentication scheme over it.

use crate::{
    config::TransportConfig,
    error::{BoxError, Error, Result},
    security::SecurityContextToken,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use tracing::{debug, warn};
use url::Url;

/// The scheme SPNEGO tokens travel under in `WWW-Authenticate` and
/// `Authorization` headers.
pub const NEGOTIATE: &str = "Negotiate";

pub const UNAUTHORIZED: u16 = 401;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: Option<String>,
    /// Every `WWW-Authenticate` header value, in order.
    pub www_authenticate: Vec<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            reason: None,
            www_authenticate: vec![],
            body: body.into(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_www_authenticate(mut self, value: impl Into<String>) -> Self {
        self.www_authenticate.push(value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The token offered under `scheme`. `Ok(Some(vec![]))` for a bare
    /// `Negotiate`, `Ok(None)` when the scheme isn't offered at all.
    pub fn challenge(&self, scheme: &str) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        for value in &self.www_authenticate {
            for part in value.split(',') {
                let part = part.trim();
                let (name, token) = match part.split_once(char::is_whitespace) {
                    Some((name, token)) => (name, token.trim()),
                    None => (part, ""),
                };
                if name.eq_ignore_ascii_case(scheme) {
                    return if token.is_empty() {
                        Ok(Some(vec![]))
                    } else {
                        BASE64.decode(token).map(Some)
                    };
                }
            }
        }
        Ok(None)
    }
}

/// A plain GET, one round trip, no authentication logic of its own.
pub trait Transport {
    fn get(&self, url: &Url, authorization: Option<&str>) -> Result<HttpResponse, BoxError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &Url, authorization: Option<&str>) -> Result<HttpResponse, BoxError> {
        (**self).get(url, authorization)
    }
}

/// The per round authentication hook.
pub trait ChallengeHandler {
    /// The scheme this handler answers, e.g. [`NEGOTIATE`].
    fn scheme(&self) -> &str;

    /// Produce the next token for `challenge` (empty when the server
    /// sent no token). `None` when there is nothing more to send.
    fn respond(&mut self, challenge: &[u8]) -> Result<Option<SecurityContextToken>>;
}

/// GET `url`, answering authentication challenges with `handler` for
/// at most `max_rounds` rounds. The final response is returned whatever
/// its status; only transport and handler failures are errors.
pub fn get_negotiated<T, H>(
    transport: &T,
    url: &Url,
    handler: &mut H,
    max_rounds: usize,
) -> Result<HttpResponse>
where
    T: Transport + ?Sized,
    H: ChallengeHandler + ?Sized,
{
    let mut authorization: Option<String> = None;
    let mut rounds = 0;
    loop {
        let response = transport
            .get(url, authorization.as_deref())
            .map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })?;
        let challenge = response
            .challenge(handler.scheme())
            .map_err(|e| Error::NegotiationFailed {
                target: url.to_string(),
                source: Box::new(e),
            })?;
        debug!(status = response.status, round = rounds, "response");

        if response.status != UNAUTHORIZED {
            // the acceptor's last token, proving its identity
            if let Some(token) = challenge.filter(|t| !t.is_empty()) {
                if authorization.is_some() {
                    handler.respond(&token)?;
                }
            }
            return Ok(response);
        }

        let challenge = match challenge {
            None => return Ok(response),
            Some(token) if token.is_empty() && authorization.is_some() => {
                debug!("server rejected the {} token", handler.scheme());
                return Ok(response);
            }
            Some(token) => token,
        };
        if rounds >= max_rounds {
            warn!(max_rounds, "giving up on authentication, too many rounds");
            return Ok(response);
        }
        rounds += 1;
        match handler.respond(&challenge)? {
            Some(token) => {
                authorization = Some(format!("{} {}", handler.scheme(), token.to_base64()));
            }
            None => return Ok(response),
        }
    }
}

/// [`Transport`] over a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        // reqwest's blocking client defaults to 30s, keep that unless asked
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("can't build http client: {}", e)))?;
        Ok(ReqwestTransport { client })
    }

    pub fn from_client(client: reqwest::blocking::Client) -> Self {
        ReqwestTransport { client }
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &Url, authorization: Option<&str>) -> Result<HttpResponse, BoxError> {
        let mut request = self.client.get(url.clone());
        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        let response = request.send()?;
        let status = response.status();
        let www_authenticate = response
            .headers()
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = response.text()?;
        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            www_authenticate,
            body,
        })
    }
}
