//! Raw records arrive in one of two shapes:
//!
//! * the published card dump: `Name`, `Subtitle`, `Strength`, `Willpower`;
//! * hand-written lists: `name`, `version`, `strength`, `willpower`.
//!
//! A record is kept when its name is a non-empty string and both stats are
//! present as non-negative integers. Anything else is skipped. The result is
//! keyed by full name: a later duplicate replaces the earlier value but keeps
//! the position where the name first appeared.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{error::RepositoryError, models::RepositoryCard};

/// Record shapes accepted by a normalisation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shapes {
    /// Only the published card dump shape.
    PublishedOnly,
    /// Either shape, published first.
    Any,
}

/// Parse a user-supplied document: either a bare list of records or an
/// object with a `cards` list.
pub fn parse_import_document(bytes: &[u8]) -> Result<Vec<RepositoryCard>, RepositoryError> {
    let document: Value = serde_json::from_slice(bytes)?;
    let records = match document {
        Value::Array(records) => records,
        Value::Object(mut object) => match object.remove("cards") {
            Some(Value::Array(records)) => records,
            _ => {
                return Err(RepositoryError::InvalidFormat(
                    "'cards' array not found".to_string(),
                ))
            }
        },
        _ => {
            return Err(RepositoryError::InvalidFormat(
                "expected a card array or an object with a 'cards' array".to_string(),
            ))
        }
    };
    Ok(normalize_records(records, Shapes::Any))
}

/// Parse the remote card dump, which must be a bare list in the published shape.
pub fn parse_remote_document(bytes: &[u8]) -> Result<Vec<RepositoryCard>, RepositoryError> {
    match serde_json::from_slice(bytes)? {
        Value::Array(records) => Ok(normalize_records(records, Shapes::PublishedOnly)),
        _ => Err(RepositoryError::InvalidFormat(
            "expected an array of cards".to_string(),
        )),
    }
}

/// Convert raw records into the deduplicated canonical set.
pub fn normalize_records(
    records: impl IntoIterator<Item = Value>,
    shapes: Shapes,
) -> Vec<RepositoryCard> {
    let mut skipped = 0usize;
    let cards = records.into_iter().filter_map(|value| {
        let card = normalize_record(value, shapes);
        if card.is_none() {
            skipped += 1;
        }
        card
    });
    let unique = dedupe(cards);
    if skipped > 0 {
        debug!(skipped, kept = unique.len(), "Skipped invalid repository records");
    }
    unique
}

/// Keep one record per full name: last value wins, first position is kept.
pub fn dedupe(cards: impl IntoIterator<Item = RepositoryCard>) -> Vec<RepositoryCard> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<RepositoryCard> = Vec::new();
    for card in cards {
        match positions.get(&card.full_name) {
            Some(&index) => unique[index] = card,
            None => {
                positions.insert(card.full_name.clone(), unique.len());
                unique.push(card);
            }
        }
    }
    unique
}

fn normalize_record(value: Value, shapes: Shapes) -> Option<RepositoryCard> {
    if !value.is_object() {
        return None;
    }
    let raw: RawRecord = serde_json::from_value(value).ok()?;
    let published = raw.published();
    match shapes {
        Shapes::PublishedOnly => published,
        Shapes::Any => published.or_else(|| raw.custom()),
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    #[serde(rename = "Name", default)]
    published_name: Option<Value>,
    #[serde(rename = "Subtitle", default)]
    subtitle: Option<Value>,
    #[serde(rename = "Strength", default)]
    published_strength: Option<Value>,
    #[serde(rename = "Willpower", default)]
    published_willpower: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    strength: Option<Value>,
    #[serde(default)]
    willpower: Option<Value>,
}

impl RawRecord {
    fn published(&self) -> Option<RepositoryCard> {
        build(
            self.published_name.as_ref(),
            self.subtitle.as_ref(),
            self.published_strength.as_ref(),
            self.published_willpower.as_ref(),
        )
    }

    fn custom(&self) -> Option<RepositoryCard> {
        build(
            self.name.as_ref(),
            self.version.as_ref(),
            self.strength.as_ref(),
            self.willpower.as_ref(),
        )
    }
}

fn build(
    name: Option<&Value>,
    version: Option<&Value>,
    strength: Option<&Value>,
    willpower: Option<&Value>,
) -> Option<RepositoryCard> {
    let name = name?.as_str().filter(|name| !name.is_empty())?;
    let strength = stat(strength?)?;
    let willpower = stat(willpower?)?;
    let version = version
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|version| !version.is_empty());
    Some(RepositoryCard::new(
        name.to_string(),
        version,
        strength,
        willpower,
    ))
}

fn stat(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|number| u32::try_from(number).ok())
}
