#![cfg(feature = "blocking")]

use std::{sync::Arc, time::Duration};

use reqwest::{
    blocking::Client as HttpClient,
    header::{ACCEPT, USER_AGENT},
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    errors::{Error, Result, TransportError, TransportErrorKind},
    http::{parse_api_error_parts, to_transport_error},
    scrape,
    types::{ActorMetadata, ActorRef, ActorSummary, DataEnvelope, Paginated, Schema, VersionRecord},
    BROWSER_USER_AGENT, DEFAULT_BASE_URL, DEFAULT_CLIENT_HEADER, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_DOCS_BASE_URL, DEFAULT_REQUEST_TIMEOUT,
};

#[derive(Clone, Debug, Default)]
pub struct BlockingConfig {
    pub base_url: Option<String>,
    pub docs_base_url: Option<String>,
    pub token: Option<String>,
    pub http_client: Option<HttpClient>,
    /// Override the connect timeout (defaults to 5s).
    pub connect_timeout: Option<Duration>,
    /// Override the request timeout (defaults to 30s).
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct BlockingClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    base_url: String,
    docs_base_url: String,
    token: String,
    http: HttpClient,
    request_timeout: Duration,
}

impl BlockingClient {
    pub fn new(cfg: BlockingConfig) -> Result<Self> {
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
            None => HttpClient::builder()
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

    pub fn actors(&self) -> BlockingActorsClient {
        BlockingActorsClient {
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
pub struct BlockingActorsClient {
    inner: Arc<ClientInner>,
}

impl BlockingActorsClient {
    pub fn list(&self) -> Result<Vec<ActorSummary>> {
        let payload: DataEnvelope<Paginated<ActorSummary>> = self.inner.get_json("/acts")?;
        Ok(payload.data.items)
    }

    pub fn get(&self, actor: &ActorRef) -> Result<ActorMetadata> {
        let path = format!("/acts/{actor}");
        let payload: DataEnvelope<ActorMetadata> = self.inner.get_json(&path)?;
        Ok(payload.data)
    }

    pub fn version(&self, actor: &ActorRef, version: &str) -> Result<VersionRecord> {
        let path = format!("/acts/{actor}/versions/{version}");
        let payload: DataEnvelope<VersionRecord> = self.inner.get_json(&path)?;
        Ok(payload.data)
    }

    /// Blocking mirror of [`crate::ActorsClient::input_schema`]: same stage
    /// order, same soft-failure semantics.
    pub fn input_schema(&self, actor: &ActorRef) -> Result<Schema> {
        let metadata = self.get(actor)?;

        if let Some(version) = metadata.latest_version_number.as_deref() {
            if let Ok(record) = self.version(actor, version) {
                if let Some(schema) = record.input.and_then(Schema::from_value) {
                    return Ok(schema);
                }
            }
        }

        if let Some(schema) = metadata.input.clone().and_then(Schema::from_value) {
            return Ok(schema);
        }

        if let Ok(body) = self
            .inner
            .fetch_docs_page(&metadata.username, &metadata.name)
        {
            if let Some(schema) = scrape::schema_from_page(&body) {
                return Ok(schema);
            }
        }

        if let Some(example) = metadata.example_run_input.as_ref() {
            if let Ok(value) = serde_json::from_str(&example.body) {
                if let Some(schema) = Schema::from_value(value) {
                    return Ok(schema);
                }
            }
        }

        Ok(Schema::empty())
    }
}

impl ClientInner {
    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .request(Method::GET, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, DEFAULT_CLIENT_HEADER)
            .timeout(self.request_timeout)
            .send()
            .map_err(to_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(parse_api_error_parts(status, body));
        }

        let bytes = resp.bytes().map_err(to_transport_error)?;
        serde_json::from_slice::<T>(&bytes).map_err(Error::Serialization)
    }

    fn fetch_docs_page(&self, username: &str, name: &str) -> Result<String> {
        let url = format!("{}/{}/{}/input-schema", self.docs_base_url, username, name);
        let resp = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .timeout(self.request_timeout)
            .send()
            .map_err(to_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(parse_api_error_parts(status, body));
        }

        resp.text().map_err(to_transport_error)
    }
}
