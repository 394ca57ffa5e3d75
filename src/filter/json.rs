//! JSON decoding of filter mappings.
//!
//! Objects become nested mappings unless they carry one of the tags below:
//!
//! - `{"$range": [lo, hi], "$exclusive": true}` (`null` leaves an end open)
//! - `{"$record": {"entity": "User", "id": 7}}`
//! - `{"$entity": "User"}`
//! - `{"$param": "name"}`

use crate::access::Value;
use crate::expression::BindParam;
use crate::filter::{FilterMapping, FilterRange, FilterValue, RecordRef};
use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value as Json};

impl FilterMapping {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: Json = serde_json::from_str(json).context("Failed to parse filter JSON")?;
        match document {
            Json::Object(object) => decode_mapping(object),
            other => bail!("Filter must be a JSON object, got {}", other),
        }
    }
}

fn decode_mapping(object: Map<String, Json>) -> Result<FilterMapping> {
    let mut mapping = FilterMapping::new();
    for (key, value) in object {
        let value = decode_value(value).with_context(|| format!("Invalid value for '{}'", key))?;
        mapping.insert(key, value);
    }
    Ok(mapping)
}

fn decode_value(json: Json) -> Result<FilterValue> {
    match json {
        Json::Array(items) => Ok(FilterValue::List(
            items
                .into_iter()
                .map(decode_value)
                .collect::<Result<Vec<_>>>()?,
        )),
        Json::Object(object) => decode_object(object),
        scalar => Ok(FilterValue::Scalar(decode_scalar(scalar)?)),
    }
}

fn decode_scalar(json: Json) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Boolean(b)),
        Json::String(s) => Ok(Value::String(s)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i32::try_from(i).map(Value::Int32).unwrap_or(Value::Int64(i)))
            } else {
                n.as_f64()
                    .map(Value::Float64)
                    .ok_or_else(|| anyhow!("Unsupported number {}", n))
            }
        }
        other => bail!("Expected a scalar, got {}", other),
    }
}

fn decode_object(mut object: Map<String, Json>) -> Result<FilterValue> {
    if let Some(bounds) = object.remove("$range") {
        let exclude_end = match object.remove("$exclusive") {
            None => false,
            Some(Json::Bool(b)) => b,
            Some(other) => bail!("$exclusive must be a boolean, got {}", other),
        };
        let (start, end) = match bounds {
            Json::Array(mut pair) if pair.len() == 2 => {
                let end = pair.pop().unwrap_or(Json::Null);
                let start = pair.pop().unwrap_or(Json::Null);
                (decode_bound(start)?, decode_bound(end)?)
            }
            other => bail!("$range must be a two-element array, got {}", other),
        };
        reject_extra_keys("$range", &object)?;
        return Ok(FilterValue::Range(FilterRange {
            start,
            end,
            exclude_end,
        }));
    }

    if let Some(record) = object.remove("$record") {
        let mut record = match record {
            Json::Object(record) => record,
            other => bail!("$record must be an object, got {}", other),
        };
        let entity = match record.remove("entity") {
            Some(Json::String(entity)) => entity,
            _ => bail!("$record requires a string 'entity'"),
        };
        let id = decode_scalar(record.remove("id").unwrap_or(Json::Null))?;
        reject_extra_keys("$record", &record)?;
        reject_extra_keys("$record", &object)?;
        return Ok(FilterValue::Record(RecordRef::new(entity, id)));
    }

    if let Some(entity) = object.remove("$entity") {
        reject_extra_keys("$entity", &object)?;
        return match entity {
            Json::String(name) => Ok(FilterValue::Entity(name)),
            other => bail!("$entity must be a string, got {}", other),
        };
    }

    if let Some(param) = object.remove("$param") {
        reject_extra_keys("$param", &object)?;
        return match param {
            Json::String(name) => Ok(FilterValue::Param(BindParam::new(name))),
            other => bail!("$param must be a string, got {}", other),
        };
    }

    Ok(FilterValue::Nested(decode_mapping(object)?))
}

/// Tagged objects carry nothing but their tag's own keys
fn reject_extra_keys(tag: &str, object: &Map<String, Json>) -> Result<()> {
    if object.is_empty() {
        return Ok(());
    }
    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    bail!("Unexpected keys next to {}: {}", tag, keys.join(", "))
}

fn decode_bound(json: Json) -> Result<Option<Value>> {
    match decode_scalar(json)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_scalars_and_lists() -> Result<()> {
        let mapping = FilterMapping::from_json_str(
            r#"{"name": "bob", "age": 30, "big": 5000000000, "score": 1.5, "tag": ["a", null]}"#,
        )?;
        assert_eq!(mapping.get("name"), Some(&FilterValue::from("bob")));
        assert_eq!(mapping.get("age"), Some(&FilterValue::from(30)));
        assert_eq!(mapping.get("big"), Some(&FilterValue::from(5_000_000_000i64)));
        assert_eq!(mapping.get("score"), Some(&FilterValue::from(1.5)));
        assert_eq!(
            mapping.get("tag"),
            Some(&FilterValue::List(vec!["a".into(), FilterValue::null()]))
        );
        Ok(())
    }

    #[test]
    fn test_decode_tagged_objects() -> Result<()> {
        let mapping = FilterMapping::from_json_str(
            r#"{
                "age": {"$range": [18, 65]},
                "created": {"$range": [null, 10], "$exclusive": true},
                "author": {"$record": {"entity": "User", "id": 7}},
                "kind": {"$entity": "Admin"},
                "id": {"$param": "id"}
            }"#,
        )?;
        assert_eq!(
            mapping.get("age"),
            Some(&FilterValue::Range(FilterRange::inclusive(18, 65)))
        );
        assert_eq!(
            mapping.get("created"),
            Some(&FilterValue::Range(FilterRange::until(10)))
        );
        assert_eq!(
            mapping.get("author"),
            Some(&FilterValue::Record(RecordRef::new("User", 7)))
        );
        assert_eq!(mapping.get("kind"), Some(&FilterValue::Entity("Admin".into())));
        assert_eq!(
            mapping.get("id"),
            Some(&FilterValue::Param(BindParam::new("id")))
        );
        Ok(())
    }

    #[test]
    fn test_decode_nested_mapping() -> Result<()> {
        let mapping = FilterMapping::from_json_str(r#"{"orders": {"status": "paid"}}"#)?;
        let expected =
            FilterMapping::new().with("orders", FilterMapping::new().with("status", "paid"));
        assert_eq!(mapping, expected);
        Ok(())
    }

    #[test]
    fn test_decode_errors() {
        assert!(FilterMapping::from_json_str("[1, 2]").is_err());
        assert!(FilterMapping::from_json_str(r#"{"a": {"$range": [1]}}"#).is_err());
        assert!(FilterMapping::from_json_str(r#"{"a": {"$entity": 3}}"#).is_err());
        let err = FilterMapping::from_json_str(r#"{"a": {"$record": {"id": 3}}}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid value for 'a'"));
    }

    #[test]
    fn test_tagged_objects_reject_extra_keys() {
        let err =
            FilterMapping::from_json_str(r#"{"a": {"$range": [1, 2], "$exlusive": true}}"#)
                .unwrap_err();
        assert!(format!("{:#}", err).contains("Unexpected keys next to $range: $exlusive"));

        for json in [
            r#"{"a": {"$entity": "User", "id": 1}}"#,
            r#"{"a": {"$param": "p", "$entity": "User"}}"#,
            r#"{"a": {"$record": {"entity": "User", "id": 1, "name": "x"}}}"#,
            r#"{"a": {"$record": {"entity": "User", "id": 1}, "extra": 2}}"#,
        ] {
            assert!(FilterMapping::from_json_str(json).is_err(), "{}", json);
        }

        let mapping =
            FilterMapping::from_json_str(r#"{"a": {"$range": [1, 2], "$exclusive": true}}"#)
                .unwrap();
        assert_eq!(
            mapping.get("a"),
            Some(&FilterValue::Range(FilterRange::exclusive(1, 2)))
        );
    }
}
