#![cfg(feature = "mock")]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use crate::{
    errors::{Error, Result},
    types::{ActorMetadata, ActorRef, ActorSummary, Schema, VersionRecord},
};

/// In-memory mock configuration for offline tests of code consuming the
/// resolver. Queued results are returned in order; an exhausted queue is a
/// configuration error.
#[derive(Default)]
pub struct MockConfig {
    pub schemas: Vec<Result<Schema>>,
    pub metadata: Vec<Result<ActorMetadata>>,
    pub versions: Vec<Result<VersionRecord>>,
    pub actors: Vec<ActorSummary>,
}

impl MockConfig {
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schemas.push(Ok(schema));
        self
    }

    pub fn with_schema_error(mut self, err: Error) -> Self {
        self.schemas.push(Err(err));
        self
    }

    pub fn with_metadata(mut self, metadata: ActorMetadata) -> Self {
        self.metadata.push(Ok(metadata));
        self
    }

    pub fn with_metadata_error(mut self, err: Error) -> Self {
        self.metadata.push(Err(err));
        self
    }

    pub fn with_version(mut self, version: VersionRecord) -> Self {
        self.versions.push(Ok(version));
        self
    }

    pub fn with_actors(mut self, actors: Vec<ActorSummary>) -> Self {
        self.actors = actors;
        self
    }
}

#[derive(Clone)]
pub struct MockClient {
    inner: Arc<MockInner>,
}

impl MockClient {
    pub fn new(cfg: MockConfig) -> Self {
        Self {
            inner: Arc::new(MockInner::new(cfg)),
        }
    }

    pub fn actors(&self) -> MockActorsClient {
        MockActorsClient {
            inner: self.inner.clone(),
        }
    }
}

struct MockInner {
    schemas: Mutex<VecDeque<Result<Schema>>>,
    metadata: Mutex<VecDeque<Result<ActorMetadata>>>,
    versions: Mutex<VecDeque<Result<VersionRecord>>>,
    actors: Mutex<Vec<ActorSummary>>,
}

impl MockInner {
    fn new(cfg: MockConfig) -> Self {
        Self {
            schemas: Mutex::new(VecDeque::from(cfg.schemas)),
            metadata: Mutex::new(VecDeque::from(cfg.metadata)),
            versions: Mutex::new(VecDeque::from(cfg.versions)),
            actors: Mutex::new(cfg.actors),
        }
    }

    fn next_schema(&self) -> Result<Schema> {
        self.schemas
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(Error::Config("no mock schema queued".into())))
    }

    fn next_metadata(&self) -> Result<ActorMetadata> {
        self.metadata
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(Error::Config("no mock actor metadata queued".into())))
    }

    fn next_version(&self) -> Result<VersionRecord> {
        self.versions
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(Error::Config("no mock version record queued".into())))
    }
}

#[derive(Clone)]
pub struct MockActorsClient {
    inner: Arc<MockInner>,
}

impl MockActorsClient {
    pub async fn list(&self) -> Result<Vec<ActorSummary>> {
        Ok(self.inner.actors.lock().expect("lock poisoned").clone())
    }

    pub async fn get(&self, _actor: &ActorRef) -> Result<ActorMetadata> {
        self.inner.next_metadata()
    }

    pub async fn version(&self, _actor: &ActorRef, _version: &str) -> Result<VersionRecord> {
        self.inner.next_version()
    }

    pub async fn input_schema(&self, _actor: &ActorRef) -> Result<Schema> {
        self.inner.next_schema()
    }
}

pub mod fixtures {
    use super::*;
    use crate::types::ExampleRunInput;
    use serde_json::json;

    pub fn actor_metadata() -> ActorMetadata {
        ActorMetadata {
            id: "nwua9Gu5YrADL7ZDj".into(),
            username: "apify".into(),
            name: "web-scraper".into(),
            title: Some("Web Scraper".into()),
            description: None,
            latest_version_number: Some("0.1".into()),
            input: None,
            example_run_input: Some(ExampleRunInput {
                body: r#"{"startUrls": [{"url": "https://example.com"}]}"#.into(),
                content_type: Some("application/json; charset=utf-8".into()),
            }),
            created_at: None,
            modified_at: None,
        }
    }

    pub fn actor_summary(name: &str) -> ActorSummary {
        ActorSummary {
            id: format!("mock_{name}"),
            username: "apify".into(),
            name: name.into(),
            title: None,
            created_at: None,
            modified_at: None,
        }
    }

    pub fn json_schema() -> Schema {
        Schema::from_value(json!({
            "properties": {
                "startUrls": {
                    "type": "array",
                    "title": "Start URLs",
                    "editor": "requestListSources"
                },
                "maxPagesPerCrawl": {"type": "integer"}
            },
            "required": ["startUrls"]
        }))
        .expect("fixture schema is a non-empty object")
    }
}
