//! Decodes a backend chart-API HTTP response body into the canonical
//! [`Point`] list, rejecting any data left over after the top-level JSON
//! value.

use serde::Deserialize;
use stats_core::Error;

use super::model::Point;

#[derive(Debug, Deserialize, Default)]
struct BackendResponse {
    #[serde(default)]
    timeseries: Vec<BackendSeries>,
}

#[derive(Debug, Deserialize, Default)]
struct BackendSeries {
    #[serde(default)]
    data: Vec<Vec<serde_json::Value>>,
}

/// Decode a backend response body into points.
///
/// `None`/empty body is an error. Trailing bytes after the top-level JSON
/// value are an error, even if they themselves parse as JSON. An absent or
/// empty `timeseries` list decodes to an empty point list. Rows with more
/// than two entries use only the first two; rows with fewer than two are
/// dropped.
pub fn decode_response(body: Option<&str>) -> Result<Vec<Point>, Error> {
    let body = match body {
        Some(b) if !b.is_empty() => b,
        _ => return Err(Error::Decoding("empty response".to_string())),
    };

    let mut de = serde_json::Deserializer::from_str(body);
    let parsed: BackendResponse = Deserialize::deserialize(&mut de)
        .map_err(|e| Error::Decoding(format!("invalid backend response: {e}")))?;
    de.end()
        .map_err(|_| Error::Decoding("unexpected data beyond query response".to_string()))?;

    let Some(first) = parsed.timeseries.into_iter().next() else {
        return Ok(Vec::new());
    };

    Ok(first
        .data
        .into_iter()
        .filter_map(|row| {
            if row.len() < 2 {
                return None;
            }
            let t_seconds = row[0].as_f64()?;
            let value = row[1].as_f64()?;
            Some(Point {
                timestamp: (t_seconds * 1_000_000.0).round() as i64,
                value,
            })
        })
        .collect())
}
