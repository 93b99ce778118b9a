use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::ir::{Gender, Person, PersonId, is_valid_ref, parse_birth_date};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid person list: {0}")]
    Syntax(String),
    #[error("expected an array of person records, found {0}")]
    NotAnArray(&'static str),
}

/// Text of a scalar field. Ids may arrive as strings or as numbers depending
/// on the data source; any other JSON type counts as absent.
fn scalar_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Some(int.to_string());
            }
            // JSON5 input may hand integral ids over as floats.
            match number.as_f64() {
                Some(float) if float.fract() == 0.0 && float.abs() < 1e15 => {
                    Some((float as i64).to_string())
                }
                _ => Some(number.to_string()),
            }
        }
        _ => None,
    }
}

fn text_field(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text),
        _ => None,
    }
}

fn bool_field(value: Option<Value>) -> Option<bool> {
    value?.as_bool()
}

/// Fields are read as raw JSON so that a wrongly typed value only blanks
/// that field instead of rejecting the whole record.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersonRecord {
    id: Option<Value>,
    name: Option<Value>,
    gender: Option<Value>,
    birth_date: Option<Value>,
    alive: Option<Value>,
    is_alive: Option<Value>,
    father_id: Option<Value>,
    mother_id: Option<Value>,
    spouse_id: Option<Value>,
    image_url: Option<Value>,
}

fn reference(value: Option<Value>) -> Option<PersonId> {
    let raw = scalar_text(value)?;
    is_valid_ref(Some(&raw)).then(|| PersonId::new(raw.trim()))
}

impl PersonRecord {
    fn into_person(self) -> Option<Person> {
        let id = reference(self.id)?;
        let name = text_field(self.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| Person::UNKNOWN_NAME.to_string());
        Some(Person {
            id,
            name,
            gender: text_field(self.gender)
                .as_deref()
                .map(Gender::from_token)
                .unwrap_or_default(),
            birth_date: scalar_text(self.birth_date)
                .as_deref()
                .and_then(parse_birth_date),
            alive: bool_field(self.alive)
                .or(bool_field(self.is_alive))
                .unwrap_or(true),
            father_id: reference(self.father_id),
            mother_id: reference(self.mother_id),
            spouse_id: reference(self.spouse_id),
            image_url: text_field(self.image_url).filter(|u| !u.trim().is_empty()),
        })
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parses a JSON (or JSON5) array of person records.
///
/// Elements that are not objects or lack a usable `id` are skipped. Unknown
/// fields are ignored and wrongly typed known fields read as absent.
pub fn parse_people(input: &str) -> Result<Vec<Person>, ParseError> {
    let value: Value =
        json5::from_str(input).map_err(|err| ParseError::Syntax(err.to_string()))?;
    let Value::Array(items) = value else {
        return Err(ParseError::NotAnArray(value_kind(&value)));
    };
    Ok(people_from_values(items))
}

pub fn people_from_values(items: Vec<Value>) -> Vec<Person> {
    let mut people = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            tracing::debug!(index = idx, kind = value_kind(&item), "skipping non-object person record");
            continue;
        }
        let record = match serde_json::from_value::<PersonRecord>(item) {
            Ok(record) => record,
            Err(err) => {
                tracing::debug!(index = idx, %err, "skipping malformed person record");
                continue;
            }
        };
        match record.into_person() {
            Some(person) => people.push(person),
            None => tracing::debug!(index = idx, "skipping person record without id"),
        }
    }
    people
}
