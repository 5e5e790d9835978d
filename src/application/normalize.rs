//! Mapping provider responses onto [`ContentItem`].
//!
//! Two response families are accepted:
//!
//! - Strapi: `{ "data": [...] }`, items either flat (v5) or wrapped in
//!   `attributes` (v4), media relations nested under `data`/`attributes`.
//! - Sanity: `{ "result": [...] }`, items as flat projections with
//!   `imageUrl` fields and `detailImages` arrays.
//!
//! Missing optional fields never fail the mapping. Items that cannot be
//! identified are skipped with a warning.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::application::images::ImagePolicy;
use crate::domain::content::{ContentItem, ItemId, Section};

const ENVELOPES: [&str; 2] = ["data", "result"];

const ITEM_ID_FIELDS: [&str; 3] = ["id", "projectID", "_id"];
const TITLE_FIELDS: [&str; 2] = ["title", "name"];
const IMAGE_FIELDS: [&str; 3] = ["imageUrl", "image", "mainImage"];
const POPUP_FIELDS: [&str; 4] = ["popupText", "popup", "description", "text"];
const CATEGORY_FIELDS: [&str; 2] = ["categoryId", "category"];

const SECTION_ID_FIELDS: [&str; 2] = ["id", "_key"];
const SECTION_TITLE_FIELDS: [&str; 2] = ["sectionTitle", "title"];
const SECTION_IMAGE_FIELDS: [&str; 3] = ["images", "imageUrls", "image"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("response body is not a JSON object")]
    NotAnObject,
    #[error("response body has neither `data` nor `result`")]
    MissingEnvelope,
    #[error("`{envelope}` holds neither a list nor an object")]
    EnvelopeNotAList { envelope: &'static str },
}

/// Map a decoded response body into content items.
pub fn normalize_items(body: &Value, images: &ImagePolicy) -> Result<Vec<ContentItem>, ShapeError> {
    let object = body.as_object().ok_or(ShapeError::NotAnObject)?;
    let (envelope, payload) = ENVELOPES
        .iter()
        .find_map(|name| object.get(*name).map(|value| (*name, value)))
        .ok_or(ShapeError::MissingEnvelope)?;

    let raw_items: Vec<&Value> = match payload {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![payload],
        Value::Null => Vec::new(),
        _ => return Err(ShapeError::EnvelopeNotAList { envelope }),
    };

    Ok(raw_items
        .into_iter()
        .enumerate()
        .filter_map(|(position, raw)| normalize_item(raw, position, images))
        .collect())
}

fn normalize_item(raw: &Value, position: usize, images: &ImagePolicy) -> Option<ContentItem> {
    let Some(outer) = raw.as_object() else {
        warn!(position, "skipping content item that is not an object");
        return None;
    };
    let fields = unwrap_attributes(outer);

    let Some(id) = first_id(outer, fields, &ITEM_ID_FIELDS) else {
        warn!(position, "skipping content item without an identifier");
        return None;
    };

    let project_id = first_id(outer, fields, &["projectID"]).filter(|legacy| *legacy != id);

    let title = first_string(fields, &TITLE_FIELDS).unwrap_or_default();
    let image_url = first_media(fields, &IMAGE_FIELDS, images)
        .unwrap_or_else(|| images.placeholder().to_string());
    let popup_text = first_string(fields, &POPUP_FIELDS).unwrap_or_default();
    let category = CATEGORY_FIELDS
        .iter()
        .find_map(|name| fields.get(*name).and_then(resolve_category));

    let mut sections = sections(fields, images);
    if sections.is_empty() {
        sections.push(Section {
            id: ItemId::Numeric(1),
            title: title.clone(),
            images: vec![image_url.clone()],
        });
    }

    Some(ContentItem {
        id,
        project_id,
        title,
        image_url,
        popup_text,
        category,
        sections,
    })
}

fn sections(fields: &Map<String, Value>, images: &ImagePolicy) -> Vec<Section> {
    if let Some(entries) = fields.get("sections").and_then(as_list) {
        let sections: Vec<Section> = entries
            .iter()
            .enumerate()
            .filter_map(|(position, raw)| normalize_section(raw, position, images))
            .collect();
        if !sections.is_empty() {
            return sections;
        }
    }

    match fields.get("detailImages") {
        Some(value) if as_list(value).is_some_and(|entries| !entries.is_empty()) => vec![Section {
            id: ItemId::Numeric(1),
            title: String::new(),
            images: resolve_media_list(value, images),
        }],
        _ => Vec::new(),
    }
}

fn normalize_section(raw: &Value, position: usize, images: &ImagePolicy) -> Option<Section> {
    let Some(outer) = raw.as_object() else {
        warn!(position, "skipping section that is not an object");
        return None;
    };
    let fields = unwrap_attributes(outer);

    let id = first_id(outer, fields, &SECTION_ID_FIELDS)
        .unwrap_or_else(|| ItemId::Numeric(i64::try_from(position + 1).unwrap_or(i64::MAX)));
    let title = first_string(fields, &SECTION_TITLE_FIELDS).unwrap_or_default();
    let section_images = SECTION_IMAGE_FIELDS
        .iter()
        .find_map(|name| fields.get(*name))
        .map(|value| resolve_media_list(value, images))
        .unwrap_or_default();

    Some(Section {
        id,
        title,
        images: section_images,
    })
}

/// Strapi v4 nests entity fields under `attributes`.
fn unwrap_attributes(outer: &Map<String, Value>) -> &Map<String, Value> {
    outer
        .get("attributes")
        .and_then(Value::as_object)
        .unwrap_or(outer)
}

/// Arrays, or relation wrappers of the form `{ "data": [...] }`.
fn as_list(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(entries) => Some(entries),
        Value::Object(map) => map.get("data").and_then(Value::as_array),
        _ => None,
    }
}

fn first_id(
    outer: &Map<String, Value>,
    fields: &Map<String, Value>,
    names: &[&str],
) -> Option<ItemId> {
    names.iter().find_map(|name| {
        outer
            .get(*name)
            .and_then(id_from_value)
            .or_else(|| fields.get(*name).and_then(id_from_value))
    })
}

fn id_from_value(value: &Value) -> Option<ItemId> {
    match value {
        Value::Number(number) => Some(
            number
                .as_i64()
                .map(ItemId::Numeric)
                .unwrap_or_else(|| ItemId::Text(number.to_string())),
        ),
        Value::String(text) => non_empty(text).map(ItemId::Text),
        _ => None,
    }
}

/// First non-empty string among `names`; non-string values count as absent.
fn first_string(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| fields.get(*name).and_then(Value::as_str).and_then(non_empty))
}

fn first_media(
    fields: &Map<String, Value>,
    names: &[&str],
    images: &ImagePolicy,
) -> Option<String> {
    names
        .iter()
        .find_map(|name| {
            fields
                .get(*name)
                .and_then(|value| resolve_media(value, images.preferred_format()))
        })
        .map(|url| images.normalize(&url))
}

/// Resolve a media value of any supported shape to its URL.
fn resolve_media(value: &Value, preferred_format: Option<&str>) -> Option<String> {
    match value {
        Value::String(url) => non_empty(url),
        Value::Array(entries) => entries
            .iter()
            .find_map(|entry| resolve_media(entry, preferred_format)),
        Value::Object(map) => {
            let nested = ["data", "attributes", "asset"]
                .iter()
                .filter_map(|wrapper| map.get(*wrapper))
                .find_map(|inner| resolve_media(inner, preferred_format));
            if nested.is_some() {
                return nested;
            }

            let formatted = preferred_format.and_then(|format| {
                map.get("formats")
                    .and_then(|formats| formats.get(format))
                    .and_then(|rendition| rendition.get("url"))
                    .and_then(Value::as_str)
                    .and_then(non_empty)
            });
            formatted.or_else(|| {
                ["url", "imageUrl"]
                    .iter()
                    .find_map(|name| map.get(*name).and_then(Value::as_str).and_then(non_empty))
            })
        }
        _ => None,
    }
}

/// Resolve every entry of a media list; unresolvable entries become the
/// placeholder so slide positions are preserved.
fn resolve_media_list(value: &Value, images: &ImagePolicy) -> Vec<String> {
    let resolve = |entry: &Value| {
        resolve_media(entry, images.preferred_format())
            .map(|url| images.normalize(&url))
            .unwrap_or_else(|| images.placeholder().to_string())
    };

    match value {
        Value::Null => Vec::new(),
        other => match as_list(other) {
            Some(entries) => entries.iter().map(resolve).collect(),
            None => resolve_media(other, images.preferred_format())
                .map(|url| images.normalize(&url))
                .into_iter()
                .collect(),
        },
    }
}

fn resolve_category(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => non_empty(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(entries) => entries.iter().find_map(resolve_category),
        Value::Object(map) => ["data", "attributes", "slug", "name", "id", "_id"]
            .iter()
            .filter_map(|name| map.get(*name))
            .find_map(resolve_category),
        _ => None,
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
