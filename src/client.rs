use std::{sync::Arc, time::Duration};

use reqwest::{
    header::{ACCEPT, USER_AGENT},
    Method,
};
use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::{
    errors::{Error, Result, TransportError, TransportErrorKind},
    http::{parse_api_error_parts, to_transport_error},
    resolve,
    types::{ActorMetadata, ActorRef, ActorSummary, DataEnvelope, Paginated, Schema, VersionRecord},
    BROWSER_USER_AGENT, DEFAULT_BASE_URL, DEFAULT_CLIENT_HEADER, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_DOCS_BASE_URL, DEFAULT_REQUEST_TIMEOUT,
};

#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Registry API base URL (defaults to the public registry).
    pub base_url: Option<String>,
    /// Store base URL for documentation pages.
    pub docs_base_url: Option<String>,
    /// Bearer token for the registry API.
    pub token: Option<String>,
    pub http_client: Option<reqwest::Client>,
    /// Override the connect timeout (defaults to 5s).
    pub connect_timeout: Option<Duration>,
    /// Override the request timeout (defaults to 30s).
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
pub(crate) struct ClientInner {
    base_url: String,
    docs_base_url: String,
    token: String,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl Client {
    pub fn new(cfg: Config) -> Result<Self> {
        let base_url = normalize_base_url(cfg.base_url, DEFAULT_BASE_URL)?;
        let docs_base_url = normalize_base_url(cfg.docs_base_url, DEFAULT_DOCS_BASE_URL)?;

        let connect_timeout = cfg.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let request_timeout = cfg.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let token = match cfg.token.filter(|t| !t.trim().is_empty()) {
            Some(token) => token.trim().to_string(),
            None => return Err(Error::Config("api token is required".to_string())),
        };

        let http = match cfg.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .connect_timeout(connect_timeout)
                .build()
                .map_err(|err| TransportError {
                    kind: TransportErrorKind::Connect,
                    message: "failed to build http client".to_string(),
                    source: Some(err),
                })?,
        };

        Ok(Self {
            inner: Arc::new(ClientInner {
                base_url,
                docs_base_url,
                token,
                http,
                request_timeout,
            }),
        })
    }

    pub fn actors(&self) -> ActorsClient {
        ActorsClient {
            inner: self.inner.clone(),
        }
    }
}

fn normalize_base_url(url: Option<String>, default: &str) -> Result<String> {
    let base = url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    let base = base.trim().trim_end_matches('/').to_string();
    reqwest::Url::parse(&base).map_err(|err| Error::Config(format!("invalid base url: {err}")))?;
    Ok(base)
}

#[derive(Clone)]
pub struct ActorsClient {
    inner: Arc<ClientInner>,
}

impl ActorsClient {
    /// List the actors available to the supplied token.
    pub async fn list(&self) -> Result<Vec<ActorSummary>> {
        let payload: DataEnvelope<Paginated<ActorSummary>> = self.inner.get_json("/acts").await?;
        Ok(payload.data.items)
    }

    /// Fetch the registry record for one actor.
    ///
    /// Failure here is fatal for schema resolution: the record supplies the
    /// latest version number and the store-page scrape target.
    pub async fn get(&self, actor: &ActorRef) -> Result<ActorMetadata> {
        let path = format!("/acts/{actor}");
        let payload: DataEnvelope<ActorMetadata> = self.inner.get_json(&path).await?;
        Ok(payload.data)
    }

    /// Fetch one published version record.
    pub async fn version(&self, actor: &ActorRef, version: &str) -> Result<VersionRecord> {
        let payload = self.inner.get_version(actor, version).await?;
        Ok(payload)
    }

    /// Resolve the actor's input schema through the fallback pipeline.
    ///
    /// Consults, in order: the latest version record, the actor record's
    /// embedded `input`, the public store documentation page, and the
    /// recorded example invocation. The first source yielding a non-empty
    /// object wins; if all of them come up empty the canonical empty object
    /// is returned, which is a valid outcome rather than an error. Only the
    /// initial metadata fetch can fail.
    pub async fn input_schema(&self, actor: &ActorRef) -> Result<Schema> {
        let metadata = self.get(actor).await?;
        let span = tracing::debug_span!("input_schema", actor = %actor);
        let schema = resolve::resolve(&self.inner, actor, &metadata)
            .instrument(span)
            .await;
        Ok(schema)
    }
}

impl ClientInner {
    pub(crate) async fn get_version(
        &self,
        actor: &ActorRef,
        version: &str,
    ) -> Result<VersionRecord> {
        let path = format!("/acts/{actor}/versions/{version}");
        let payload: DataEnvelope<VersionRecord> = self.get_json(&path).await?;
        Ok(payload.data)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .request(Method::GET, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, DEFAULT_CLIENT_HEADER)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(to_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(parse_api_error_parts(status, body));
        }

        let bytes = resp.bytes().await.map_err(to_transport_error)?;
        serde_json::from_slice::<T>(&bytes).map_err(Error::Serialization)
    }

    /// Fetch a store documentation page as raw text.
    ///
    /// Sent with a browser-like User-Agent; the store serves a different
    /// response shape to non-browser clients. Any failure here is a soft
    /// failure for the caller.
    pub(crate) async fn fetch_docs_page(&self, username: &str, name: &str) -> Result<String> {
        let url = format!("{}/{}/{}/input-schema", self.docs_base_url, username, name);
        let resp = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(to_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(parse_api_error_parts(status, body));
        }

        resp.text().await.map_err(to_transport_error)
    }
}
