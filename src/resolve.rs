//! The schema resolution pipeline: an ordered list of stages, each trying
//! one data source, short-circuiting on the first non-empty result.
//!
//! Priority follows trust: structured declared data (version record, actor
//! record) over scraped data, scraped data over the derived example payload.
//! Stage failures are soft; only the metadata fetch that happens before the
//! pipeline runs can fail a resolution.

use serde_json::Value;

use crate::client::ClientInner;
use crate::scrape;
use crate::types::{ActorMetadata, ActorRef, Schema};

/// Outcome of one pipeline stage. `Empty` means "nothing usable here",
/// which is not an error: the pipeline simply advances.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StageOutcome {
    Found(Schema),
    Empty,
}

impl StageOutcome {
    /// Classify a declared `input` value: only an object with at least one
    /// key counts as found.
    fn from_input(input: Option<&Value>) -> Self {
        input
            .and_then(|value| Schema::from_value(value.clone()))
            .map(StageOutcome::Found)
            .unwrap_or(StageOutcome::Empty)
    }
}

/// Run the pipeline for an actor whose metadata was already fetched.
/// Infallible: exhausting every stage returns the canonical empty object.
pub(crate) async fn resolve(
    client: &ClientInner,
    actor: &ActorRef,
    metadata: &ActorMetadata,
) -> Schema {
    if let Some(schema) = check("version", version_stage(client, actor, metadata).await) {
        return schema;
    }
    if let Some(schema) = check("actor-metadata", metadata_stage(metadata)) {
        return schema;
    }
    if let Some(schema) = check("docs-page", docs_stage(client, metadata).await) {
        return schema;
    }
    if let Some(schema) = check("example-input", example_stage(metadata)) {
        return schema;
    }
    tracing::debug!(actor = %actor, "no schema in any source; returning empty object");
    Schema::empty()
}

fn check(stage: &'static str, outcome: StageOutcome) -> Option<Schema> {
    match outcome {
        StageOutcome::Found(schema) => {
            tracing::debug!(stage, outcome = "found", "resolved input schema");
            Some(schema)
        }
        StageOutcome::Empty => {
            tracing::debug!(stage, outcome = "empty", "stage yielded nothing");
            None
        }
    }
}

/// Stage 1: the `input` declared on the actor's latest published version.
/// A missing version number is an immediate `Empty`, not an error.
async fn version_stage(
    client: &ClientInner,
    actor: &ActorRef,
    metadata: &ActorMetadata,
) -> StageOutcome {
    let Some(version) = metadata.latest_version_number.as_deref() else {
        return StageOutcome::Empty;
    };
    match client.get_version(actor, version).await {
        Ok(record) => StageOutcome::from_input(record.input.as_ref()),
        Err(err) => {
            tracing::debug!(stage = "version", error = %err, "version fetch failed; continuing");
            StageOutcome::Empty
        }
    }
}

/// Stage 2: the `input` embedded directly on the actor record.
fn metadata_stage(metadata: &ActorMetadata) -> StageOutcome {
    StageOutcome::from_input(metadata.input.as_ref())
}

/// Stage 3: scrape the public store documentation page.
async fn docs_stage(client: &ClientInner, metadata: &ActorMetadata) -> StageOutcome {
    match client
        .fetch_docs_page(&metadata.username, &metadata.name)
        .await
    {
        Ok(body) => scrape::schema_from_page(&body)
            .map(StageOutcome::Found)
            .unwrap_or(StageOutcome::Empty),
        Err(err) => {
            tracing::debug!(stage = "docs-page", error = %err, "store page fetch failed; continuing");
            StageOutcome::Empty
        }
    }
}

/// Stage 4: parse the recorded example invocation payload. The result is a
/// literal example object, not a JSON Schema; consumers render it as raw
/// key/value pairs.
fn example_stage(metadata: &ActorMetadata) -> StageOutcome {
    let Some(example) = metadata.example_run_input.as_ref() else {
        return StageOutcome::Empty;
    };
    match serde_json::from_str::<Value>(&example.body) {
        Ok(value) => Schema::from_value(value)
            .map(StageOutcome::Found)
            .unwrap_or(StageOutcome::Empty),
        Err(err) => {
            tracing::debug!(stage = "example-input", error = %err, "example payload is not JSON");
            StageOutcome::Empty
        }
    }
}
