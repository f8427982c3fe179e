//! Builds and escapes the six dot-joined segments of a backend metric name:
//! `org.zone.domain.route.method.kind`.

use super::model::QueryTimeSeries;

/// Escape one dynamic segment: keep ASCII alphanumeric, `_`, `-`; replace
/// every other byte with `_`.
pub fn escape_segment(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Format the `DomainHost` segment. A bare host (no `:`) gets `_*` appended
/// after escaping so it matches any port; a `host:port` value is escaped
/// as-is, with the port becoming part of the segment.
fn format_domain_host(host: Option<&str>) -> String {
    match host {
        None => "*".to_string(),
        Some(h) => {
            let escaped = escape_segment(h);
            if h.contains(':') {
                escaped
            } else {
                format!("{escaped}_*")
            }
        }
    }
}

fn format_scalar(field: Option<&str>) -> String {
    match field {
        Some(v) => escape_segment(v),
        None => "*".to_string(),
    }
}

/// Build the six-segment dotted metric name for `series`, with `kind` as
/// the trailing segment.
///
/// `kind` is supplied by the caller (the expression tree, C5) rather than
/// derived from `series.query_type` directly: several query types share a
/// base metric (e.g. `success`/`error`/`failure` all read the `responses`
/// metric, filtered by response-code suffix at the expression level).
pub fn format_metric(org_key: &str, zone_name: &str, series: &QueryTimeSeries, kind: &str) -> String {
    format!(
        "{}.{}.{}.{}.{}.{}",
        escape_segment(org_key),
        escape_segment(zone_name),
        format_domain_host(series.domain_host.as_deref()),
        format_scalar(series.route_key.as_deref()),
        format_scalar(series.method.as_deref()),
        escape_segment(kind),
    )
}
