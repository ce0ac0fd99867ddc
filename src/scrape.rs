//! Heuristic parsing of actor store documentation pages.
//!
//! The store's `/{owner}/{name}/input-schema` page is built for humans, not
//! machines: depending on the actor it may serve raw JSON, a rendered JSON
//! code block, or a heading-per-field reference section. The strategies here
//! are layered fallbacks, each applied only when the previous one found
//! nothing. A page that defeats all of them is simply no schema source.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::extract::first_json_object;
use crate::types::{Field, PropertySchema, Schema};

/// Marker attribute on the container the store renders the schema into.
const CONTAINER_SELECTOR: &str = r#"[data-test-id="input-schema-content"]"#;

/// Element carrying a field's type label inside the reference section.
const TYPE_LABEL_SELECTOR: &str = ".InputSchemaProperty-type";

const CODE_SELECTOR: &str = "pre, code";

/// Response body shape, sniffed from the body itself; the `Content-Type`
/// header on store responses is not trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageBody {
    /// Candidate raw JSON document.
    Json,
    /// Starts with a doctype/markup declaration.
    Html,
}

pub(crate) fn classify_body(body: &str) -> PageBody {
    if body.trim_start().starts_with("<!") {
        PageBody::Html
    } else {
        PageBody::Json
    }
}

/// Extract a schema from a store page body of unknown shape.
///
/// A body that does not look like HTML is tried as a JSON document first and
/// only then parsed as HTML anyway; some origins serve markup without a
/// doctype.
pub(crate) fn schema_from_page(body: &str) -> Option<Schema> {
    if classify_body(body) == PageBody::Json {
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            if let Some(schema) = Schema::from_value(value) {
                return Some(schema);
            }
        }
    }
    schema_from_html(body)
}

/// Layered extraction from a rendered HTML page.
///
/// The sub-strategies select a single textual candidate (first match wins);
/// one JSON parse at the end decides. The heading heuristic is the
/// exception: it synthesizes a schema directly instead of locating JSON
/// text.
fn schema_from_html(body: &str) -> Option<Schema> {
    let document = Html::parse_document(body);
    let container_sel = Selector::parse(CONTAINER_SELECTOR).unwrap();
    let code_sel = Selector::parse(CODE_SELECTOR).unwrap();

    let mut candidate: Option<String> = None;

    if let Some(container) = document.select(&container_sel).next() {
        let code_text: String = container
            .select(&code_sel)
            .flat_map(|el| el.text())
            .collect();
        let code_text = code_text.trim();

        if code_text.starts_with('{') && code_text.ends_with('}') {
            candidate = Some(code_text.to_string());
        } else if let Some(object) = first_json_object(code_text) {
            candidate = Some(object.to_string());
        } else if let Some(schema) = heading_heuristic(container) {
            return Some(schema);
        }
    }

    if candidate.is_none() {
        candidate = document.select(&code_sel).find_map(|el| {
            let text: String = el.text().collect();
            let text = text.trim();
            (text.starts_with('{') && text.ends_with('}')).then(|| text.to_string())
        });
    }

    if candidate.is_none() {
        candidate = first_json_object(body).map(str::to_string);
    }

    let value = serde_json::from_str::<Value>(&candidate?).ok()?;
    Schema::from_value(value)
}

/// Synthesize a `{properties, required}` schema from the reference-style
/// layout: one `h2` per field, a following `p` holding the type label and an
/// "optional" marker, and a following `div` holding the description.
fn heading_heuristic(container: ElementRef<'_>) -> Option<Schema> {
    let type_sel = Selector::parse(TYPE_LABEL_SELECTOR).unwrap();
    let span_sel = Selector::parse("span").unwrap();
    let mut schema = PropertySchema::default();

    let headings = container
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "h2");

    for heading in headings {
        let name = heading
            .value()
            .attr("id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| text_of(&heading));
        if name.is_empty() {
            continue;
        }

        let mut field = Field {
            field_type: Some("string".into()),
            ..Default::default()
        };
        // Without a type paragraph the field cannot be proven mandatory.
        let mut optional = true;

        if let Some(para) = next_element(heading).filter(|el| el.value().name() == "p") {
            if let Some(label) = para.select(&type_sel).next() {
                let label_text = text_of(&label);
                if !label_text.is_empty() {
                    field.field_type = Some(label_text);
                }
            }
            optional = para
                .select(&span_sel)
                .any(|span| text_of(&span).to_lowercase().contains("optional"));

            if let Some(desc) = next_element(para).filter(|el| el.value().name() == "div") {
                let description = text_of(&desc);
                if !description.is_empty() {
                    field.description = Some(description);
                }
            }
        }

        if !optional {
            schema.required.push(name.clone());
        }
        schema.properties.insert(name, field);
    }

    schema.into_schema()
}

/// Next element sibling, skipping text and comment nodes.
fn next_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

fn text_of(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
