// Lightstep public API client
//
// Owns connection identity (API key, organization, base URL), assembles
// authenticated JSON-envelope requests, and drives them through the shared
// rate limiter and the retrying transport. Resource-specific knowledge
// lives with the callers; this module only knows paths and envelopes.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use url::Url;

use crate::envelope;
use crate::error::Error;
use crate::models::RemoteResource;
use crate::rate_limit::{RateLimit, RateLimiter};
use crate::transport::{PreparedRequest, RawResponse, Transport, TransportConfig};

/// Host used when the environment selector is `public`.
pub const PRODUCTION_HOST: &str = "https://api.lightstep.com";

/// Environment selector that maps to [`PRODUCTION_HOST`].
pub const PUBLIC_ENV: &str = "public";

/// Versioned prefix of every public API path.
pub const API_PATH: &str = "public/v0.2";

/// Media type used for both `Content-Type` and `Accept`.
pub const CONTENT_TYPE_JSON_API: &str = "application/vnd.api+json";

pub const ORG_HEADER: &str = "X-Lightstep-Org";

/// Default `User-Agent`: crate name and version.
pub const DEFAULT_USER_AGENT: &str = concat!("lsync/", env!("CARGO_PKG_VERSION"));

// ── Identity ─────────────────────────────────────────────────────────

/// Who we are and where requests go. Immutable once built.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    api_key: SecretString,
    org_name: String,
    base_url: Url,
}

impl ClientIdentity {
    /// Resolve the base URL and bind it to an organization.
    ///
    /// `base_url_override` wins when present. Otherwise `env == "public"`
    /// selects the production host and any other value is templated into
    /// `https://api-<env>.lightstep.com`. The result is
    /// `<host>/public/v0.2/<org>`.
    pub fn new(
        api_key: SecretString,
        org_name: impl Into<String>,
        env: &str,
        base_url_override: Option<&str>,
    ) -> Result<Self, Error> {
        let org_name = org_name.into();
        let host = match base_url_override.map(str::trim).filter(|s| !s.is_empty()) {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None if env == PUBLIC_ENV => PRODUCTION_HOST.to_owned(),
            None => format!("https://api-{env}.lightstep.com"),
        };
        let base_url = Url::parse(&format!("{host}/{API_PATH}/{org_name}"))?;

        Ok(Self {
            api_key,
            org_name,
            base_url,
        })
    }

    pub fn org_name(&self) -> &str {
        &self.org_name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

// ── Options ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub rate_limit: RateLimit,
    pub transport: TransportConfig,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            rate_limit: RateLimit::default(),
            transport: TransportConfig::default(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Lightstep public API.
///
/// Construct one per logical connection and share it; its rate limiter
/// bounds the aggregate request rate of every caller.
#[derive(Debug)]
pub struct Client {
    identity: ClientIdentity,
    transport: Transport,
    limiter: Arc<RateLimiter>,
    user_agent: String,
}

impl Client {
    pub fn new(identity: ClientIdentity, options: ClientOptions) -> Result<Self, Error> {
        let limiter = Arc::new(RateLimiter::new(options.rate_limit));
        let transport = Transport::new(options.transport)?;
        Ok(Self::with_parts(identity, transport, limiter, options.user_agent))
    }

    /// Assemble a client from an existing transport and limiter, e.g. to
    /// share one limiter between several organizations.
    pub fn with_parts(
        identity: ClientIdentity,
        transport: Transport,
        limiter: Arc<RateLimiter>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            transport,
            limiter,
            user_agent: user_agent.into(),
        }
    }

    /// The organization requests are made on behalf of.
    pub fn org_name(&self) -> &str {
        self.identity.org_name()
    }

    pub fn base_url(&self) -> &Url {
        self.identity.base_url()
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    // ── URL & header builders ────────────────────────────────────────

    /// `<base>/<suffix>`.
    fn url(&self, suffix: &str) -> Result<Url, Error> {
        let base = self.identity.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}", suffix.trim_start_matches('/')))?)
    }

    fn headers(&self, with_org: bool) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();

        let mut auth = header_value(
            "Authorization",
            &format!("bearer {}", self.identity.api_key.expose_secret()),
        )?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        headers.insert(USER_AGENT, header_value("User-Agent", &self.user_agent)?);
        if with_org {
            headers.insert(ORG_HEADER, header_value(ORG_HEADER, &self.identity.org_name)?);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON_API));
        headers.insert(ACCEPT, HeaderValue::from_static(CONTENT_TYPE_JSON_API));

        Ok(headers)
    }

    // ── Core call primitive ──────────────────────────────────────────

    /// Issue one request and return the raw 200 response.
    ///
    /// Any other status is a [`Error::Rejected`]; 201 and 204 included.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        cancel: &CancellationToken,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Option<&B>,
    ) -> Result<(PreparedRequest, RawResponse), Error> {
        let body = envelope::encode(body).map_err(Error::Encode)?;
        if body.is_some() && !method_supports_body(&method) {
            warn!("this HTTP method does not support a request body: {method}");
        }

        let req = PreparedRequest {
            method,
            url,
            headers,
            body: body.map(Bytes::from),
        };

        if self.limiter.wait(cancel).await.is_err() {
            return Err(Error::Cancelled {
                method: req.method,
                url: req.url,
            });
        }

        let resp = self.transport.execute(cancel, &req).await?;
        if resp.status != StatusCode::OK {
            return Err(Error::Rejected {
                method: req.method,
                url: req.url,
                status: resp.status,
                body: resp.body_text(),
            });
        }

        Ok((req, resp))
    }

    /// Call `<base>/<suffix>` and unwrap the envelope into `T`.
    ///
    /// `body` is serialized as-is; callers wrap it in an
    /// [`Envelope`](crate::Envelope) when the endpoint expects one.
    pub async fn call_api<B, T>(
        &self,
        cancel: &CancellationToken,
        method: Method,
        suffix: &str,
        body: Option<&B>,
    ) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(suffix)?;
        let (req, resp) = self
            .execute(cancel, method, url, self.headers(true)?, body)
            .await?;
        decode_with(&req, &resp, envelope::decode)
    }

    /// Like [`call_api`](Self::call_api) but leaves `data` untyped.
    pub async fn call_api_raw<B>(
        &self,
        cancel: &CancellationToken,
        method: Method,
        suffix: &str,
        body: Option<&B>,
    ) -> Result<serde_json::Value, Error>
    where
        B: Serialize + ?Sized,
    {
        self.call_api(cancel, method, suffix, body).await
    }

    /// Call `<base>/<suffix>` and discard whatever the server returned.
    pub async fn call_api_discard<B>(
        &self,
        cancel: &CancellationToken,
        method: Method,
        suffix: &str,
        body: Option<&B>,
    ) -> Result<(), Error>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(suffix)?;
        self.execute(cancel, method, url, self.headers(true)?, body)
            .await
            .map(|_| ())
    }

    // ── Verb helpers ─────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        suffix: &str,
    ) -> Result<T, Error> {
        self.call_api::<(), T>(cancel, Method::GET, suffix, None)
            .await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        suffix: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.call_api(cancel, Method::POST, suffix, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        suffix: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.call_api(cancel, Method::PUT, suffix, Some(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        suffix: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.call_api(cancel, Method::PATCH, suffix, Some(body)).await
    }

    pub async fn delete(&self, cancel: &CancellationToken, suffix: &str) -> Result<(), Error> {
        self.call_api_discard::<()>(cancel, Method::DELETE, suffix, None)
            .await
    }

    // ── Links ────────────────────────────────────────────────────────

    /// Fetch the resource behind an absolute link returned by the API.
    ///
    /// Sent without the organization header; the link already encodes it.
    pub async fn get_linked(
        &self,
        cancel: &CancellationToken,
        link: &str,
    ) -> Result<RemoteResource, Error> {
        self.follow_link(cancel, link, |bytes| {
            envelope::decode_raw(bytes).and_then(RemoteResource::from_data)
        })
        .await
    }

    /// Dereference a link to just the identifier of the object behind it.
    ///
    /// Only `data.id` is read; the rest of the object may have any shape.
    pub async fn get_by_link(
        &self,
        cancel: &CancellationToken,
        link: &str,
    ) -> Result<String, Error> {
        self.follow_link(cancel, link, |bytes| {
            envelope::decode::<Identified>(bytes).map(|data| data.id)
        })
        .await
    }

    async fn follow_link<T>(
        &self,
        cancel: &CancellationToken,
        link: &str,
        decode: impl FnOnce(&[u8]) -> Result<T, serde_json::Error>,
    ) -> Result<T, Error> {
        let url = Url::parse(link)?;
        let (req, resp) = self
            .execute::<()>(cancel, Method::GET, url, self.headers(false)?, None)
            .await?;
        decode_with(&req, &resp, decode)
    }
}

#[derive(Deserialize)]
struct Identified {
    id: String,
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader {
        name,
        reason: e.to_string(),
    })
}

fn method_supports_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::DELETE
}

/// Run `decode` over a 200 body, attaching full request context on failure.
fn decode_with<T>(
    req: &PreparedRequest,
    resp: &RawResponse,
    decode: impl FnOnce(&[u8]) -> Result<T, serde_json::Error>,
) -> Result<T, Error> {
    decode(&resp.body).map_err(|e| Error::Deserialization {
        method: req.method.clone(),
        url: req.url.clone(),
        status: resp.status,
        body: resp.body_text(),
        message: e.to_string(),
    })
}
