//! Combines a compiled expression, time window, granularity and
//! summarization kind into the backend chart-API URL.

use stats_core::Error;
use url::Url;

use super::types::{Granularity, QueryType};

/// Build the backend chart-API URL for one compiled series.
///
/// `base` is the backend's base URL; any trailing `/` is stripped before
/// `/chart/api` is appended. Fails if `base` is not a valid absolute URL.
pub fn build_url(
    base: &str,
    granularity: Granularity,
    query_type: QueryType,
    start_micros: i64,
    end_micros: i64,
    expr: &str,
) -> Result<Url, Error> {
    let trimmed = base.trim_end_matches('/');
    let mut url = Url::parse(trimmed)
        .map_err(|e| Error::internal(format!("invalid backend base url {base:?}: {e}")))?;
    if !url.has_host() {
        return Err(Error::internal(format!("backend base url {base:?} has no host")));
    }

    url.path_segments_mut()
        .map_err(|_| Error::internal(format!("backend base url {base:?} cannot be a base")))?
        .pop_if_empty()
        .push("chart")
        .push("api");

    let unit = granularity
        .unit_code()
        .ok_or_else(|| Error::internal("invalid granularity".to_string()))?;
    let summarization = if query_type.is_latency() { "MEAN" } else { "SUM" };
    let start_sec = start_micros / 1_000_000;
    let end_sec = end_micros / 1_000_000;

    url.query_pairs_mut()
        .append_pair("strict", "true")
        .append_pair("g", unit)
        .append_pair("summarization", summarization)
        .append_pair("s", &start_sec.to_string())
        .append_pair("e", &end_sec.to_string())
        .append_pair("q", expr);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_expected_shape_for_requests() {
        let url = build_url(
            "https://backend.internal/",
            Granularity::Seconds,
            QueryType::Requests,
            1_000_000,
            4_600_000,
            "default(0, rawsum(align(1s, sum, ts(\"o.z.*.*.*.requests\"))))",
        )
        .unwrap();

        assert_eq!(url.path(), "/chart/api");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(pairs.contains(&("strict".to_string(), "true".to_string())));
        assert!(pairs.contains(&("g".to_string(), "s".to_string())));
        assert!(pairs.contains(&("summarization".to_string(), "SUM".to_string())));
        assert!(pairs.contains(&("s".to_string(), "1".to_string())));
        assert!(pairs.contains(&("e".to_string(), "4".to_string())));
    }

    #[test]
    fn latency_uses_mean_summarization() {
        let url = build_url(
            "https://backend.internal",
            Granularity::Seconds,
            QueryType::LatencyP99,
            0,
            1_000_000,
            "x",
        )
        .unwrap();
        let summarization = url
            .query_pairs()
            .find(|(k, _)| k == "summarization")
            .map(|(_, v)| v.to_string());
        assert_eq!(summarization.as_deref(), Some("MEAN"));
    }

    #[test]
    fn rejects_non_absolute_base() {
        assert!(build_url("not a url", Granularity::Seconds, QueryType::Requests, 0, 1, "x").is_err());
    }
}
