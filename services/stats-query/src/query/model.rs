//! The query plane's data model: the request root (`Query`), its time
//! window, the per-series scoping filters, and the result shapes that
//! mirror them back to the caller.

use serde::{Deserialize, Serialize};

use super::types::{Granularity, QueryType};

/// Request root. `timeseries` may be empty, in which case the result is
/// trivially empty.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Query {
    pub zone_name: String,
    #[serde(default)]
    pub time_range: TimeRange,
    #[serde(default)]
    pub timeseries: Vec<QueryTimeSeries>,
}

/// Optional time window plus the result granularity.
///
/// `start`/`end`/`duration` are microseconds since the Unix epoch (or, for
/// `duration`, a microsecond span). Exactly which combination is legal is
/// decided by the normalizer, not by this type.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TimeRange {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub granularity: Granularity,
}

/// One requested series: a query kind plus the scoping filters that narrow
/// which backend tag set it reads from.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryTimeSeries {
    #[serde(default)]
    pub name: Option<String>,
    pub query_type: QueryType,
    #[serde(default)]
    pub domain_host: Option<String>,
    #[serde(default)]
    pub route_key: Option<String>,
    #[serde(default)]
    pub shared_rule_name: Option<String>,
    #[serde(default)]
    pub rule_key: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub instance_keys: Vec<String>,
}

impl QueryTimeSeries {
    /// `RuleKey` scoping invariant: if set, at least one of `RouteKey` or
    /// `SharedRuleName` must also be set.
    pub fn rule_key_scoping_holds(&self) -> bool {
        if self.rule_key.is_none() {
            return true;
        }
        self.route_key.is_some() || self.shared_rule_name.is_some()
    }

    /// The name used in diagnostics: the human `Name` if set, else `[index]`.
    pub fn diagnostic_ident(&self, index: usize) -> String {
        match &self.name {
            Some(n) if !n.is_empty() => n.clone(),
            _ => format!("[{index}]"),
        }
    }
}

/// A single time-series sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub value: f64,
    /// Microseconds since the Unix epoch.
    pub timestamp: i64,
}

/// A result series: the originating request series plus its points, in
/// non-decreasing timestamp order.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    pub query: QueryTimeSeries,
    pub points: Vec<Point>,
}

/// Normalized time window echoed back to the caller: all fields present and
/// mutually consistent.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NormalizedTimeRange {
    pub start: i64,
    pub end: i64,
    pub duration: i64,
    pub granularity: Granularity,
}

/// The full query response: the normalized time range plus one `TimeSeries`
/// per requested series, same order.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub time_range: NormalizedTimeRange,
    pub timeseries: Vec<TimeSeries>,
}

/// Per-series context threaded through the expression tree: the scoping key,
/// zone, result granularity, and a borrow of the series being compiled.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    pub org_key: &'a str,
    pub zone_name: &'a str,
    pub granularity: Granularity,
    pub series: &'a QueryTimeSeries,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_key_scoping_requires_route_or_shared_rule() {
        let mut series = QueryTimeSeries {
            query_type: QueryType::Requests,
            rule_key: Some("rk".into()),
            ..Default::default()
        };
        assert!(!series.rule_key_scoping_holds());

        series.route_key = Some("r".into());
        assert!(series.rule_key_scoping_holds());

        series.route_key = None;
        series.shared_rule_name = Some("sr".into());
        assert!(series.rule_key_scoping_holds());
    }

    #[test]
    fn rule_key_scoping_vacuous_when_unset() {
        let series = QueryTimeSeries {
            query_type: QueryType::Requests,
            ..Default::default()
        };
        assert!(series.rule_key_scoping_holds());
    }

    #[test]
    fn diagnostic_ident_prefers_name() {
        let named = QueryTimeSeries {
            name: Some("latency".into()),
            query_type: QueryType::Requests,
            ..Default::default()
        };
        assert_eq!(named.diagnostic_ident(3), "latency");

        let unnamed = QueryTimeSeries {
            query_type: QueryType::Requests,
            ..Default::default()
        };
        assert_eq!(unnamed.diagnostic_ident(3), "[3]");
    }
}
