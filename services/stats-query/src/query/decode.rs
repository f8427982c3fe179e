//! Decodes the `query` URL parameter into a [`Query`], accepting either a
//! single JSON blob or a set of flat dotted-path form keys on the same
//! endpoint. Both encodings funnel through the same final step — building a
//! [`serde_json::Value`] and deserializing it — so there is exactly one
//! place that knows the shape of [`Query`].

use serde_json::Value;
use stats_core::Error;

use super::model::Query;
use super::types::{Granularity, QueryType};

/// Decode the request's query representation from the raw, still-encoded
/// list of URL query pairs (duplicates preserved, as `instance_keys[0]`,
/// `instance_keys[1]`, ... require).
///
/// Chooses JSON decoding when a pair named exactly `query` is present and
/// parses as JSON; otherwise falls back to flat dotted-path decoding of
/// every pair whose key starts with `query.`.
pub fn decode_query(pairs: &[(String, String)]) -> Result<Query, Error> {
    if let Some((_, raw)) = pairs.iter().find(|(k, _)| k == "query") {
        return serde_json::from_str(raw)
            .map_err(|_| Error::InvalidObject("invalid query argument".to_string()));
    }

    let flat: Vec<(&str, &str)> = pairs
        .iter()
        .filter_map(|(k, v)| k.strip_prefix("query.").map(|rest| (rest, v.as_str())))
        .collect();

    if flat.is_empty() {
        return Err(Error::InvalidObject("invalid query argument".to_string()));
    }

    let mut root = Value::Object(Default::default());
    for (path, value) in flat {
        let segments = parse_path(path);
        match segments.last() {
            Some(Segment::Key(key)) if key == "query_type" => {
                QueryType::parse_form(value).map_err(Error::InvalidObject)?;
            }
            Some(Segment::Key(key)) if key == "granularity" => {
                Granularity::parse_form(value).map_err(Error::InvalidObject)?;
            }
            _ => {}
        }
        set_path(&mut root, &segments, Value::String(value.to_string()))
            .map_err(|_| Error::InvalidObject("invalid query argument".to_string()))?;
    }

    serde_json::from_value(root).map_err(|_| Error::InvalidObject("invalid query argument".to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

fn parse_path(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for dotted in path.split('.') {
        let mut rest = dotted;
        if let Some(bracket) = rest.find('[') {
            let key = &rest[..bracket];
            if !key.is_empty() {
                segments.push(Segment::Key(key.to_string()));
            }
            rest = &rest[bracket..];
            while let Some(stripped) = rest.strip_prefix('[') {
                if let Some(end) = stripped.find(']') {
                    if let Ok(idx) = stripped[..end].parse::<usize>() {
                        segments.push(Segment::Index(idx));
                    }
                    rest = &stripped[end + 1..];
                } else {
                    break;
                }
            }
        } else {
            segments.push(Segment::Key(rest.to_string()));
        }
    }
    segments
}

fn set_path(root: &mut Value, segments: &[Segment], leaf: Value) -> Result<(), ()> {
    let Some((first, rest)) = segments.split_first() else {
        return Err(());
    };

    match first {
        Segment::Key(key) => {
            let obj = root.as_object_mut().ok_or(())?;
            let slot = obj
                .entry(key.clone())
                .or_insert_with(|| placeholder_for(rest));
            if rest.is_empty() {
                *slot = leaf;
                Ok(())
            } else {
                set_path(slot, rest, leaf)
            }
        }
        Segment::Index(idx) => {
            let arr = root.as_array_mut().ok_or(())?;
            if arr.len() <= *idx {
                arr.resize(idx + 1, Value::Null);
            }
            if rest.is_empty() {
                arr[*idx] = leaf;
                Ok(())
            } else {
                if arr[*idx].is_null() {
                    arr[*idx] = placeholder_for(rest);
                }
                set_path(&mut arr[*idx], rest, leaf)
            }
        }
    }
}

fn placeholder_for(rest: &[Segment]) -> Value {
    match rest.first() {
        Some(Segment::Index(_)) => Value::Array(Vec::new()),
        _ => Value::Object(Default::default()),
    }
}
