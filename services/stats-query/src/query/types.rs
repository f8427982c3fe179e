//! Closed enumerations for query kinds and time granularities, with the
//! string/JSON/form codecs the rest of the query plane depends on.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// The semantic kind of time series requested.
///
/// Parsing never fails outright: unrecognized input maps to [`QueryType::Unknown`]
/// so callers can distinguish "absent" from "garbage" and report a useful
/// validation error at the point where that distinction matters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Requests,
    Responses,
    Success,
    Error,
    Failure,
    LatencyP50,
    LatencyP99,
    SuccessRate,
    /// Sentinel for any string that isn't one of the canonical names above.
    #[default]
    Unknown,
}

impl QueryType {
    /// The canonical wire string for this value, or `None` for [`QueryType::Unknown`].
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            QueryType::Requests => Some("requests"),
            QueryType::Responses => Some("responses"),
            QueryType::Success => Some("success"),
            QueryType::Error => Some("error"),
            QueryType::Failure => Some("failure"),
            QueryType::LatencyP50 => Some("latency_p50"),
            QueryType::LatencyP99 => Some("latency_p99"),
            QueryType::SuccessRate => Some("success_rate"),
            QueryType::Unknown => None,
        }
    }

    /// Parse a canonical wire string, mapping anything unrecognized to
    /// [`QueryType::Unknown`] rather than failing.
    pub fn parse(s: &str) -> Self {
        match s {
            "requests" => QueryType::Requests,
            "responses" => QueryType::Responses,
            "success" => QueryType::Success,
            "error" => QueryType::Error,
            "failure" => QueryType::Failure,
            "latency_p50" => QueryType::LatencyP50,
            "latency_p99" => QueryType::LatencyP99,
            "success_rate" => QueryType::SuccessRate,
            _ => QueryType::Unknown,
        }
    }

    /// Whether this value is one of the closed set of canonical kinds.
    pub fn is_valid(self) -> bool {
        !matches!(self, QueryType::Unknown)
    }

    /// True for the two percentile-latency kinds, which share a base metric
    /// name and differ only in the percentile applied by the expression tree.
    pub fn is_latency(self) -> bool {
        matches!(self, QueryType::LatencyP50 | QueryType::LatencyP99)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => f.write_str(s),
            None => f.write_str("unknown"),
        }
    }
}

impl Serialize for QueryType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.as_str() {
            Some(s) => serializer.serialize_str(s),
            None => Err(serde::ser::Error::custom("cannot marshal unknown query_type")),
        }
    }
}

impl<'de> Deserialize<'de> for QueryType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(de::Error::custom("query_type must not be empty"));
        }
        let parsed = QueryType::parse(&raw);
        if !parsed.is_valid() {
            return Err(de::Error::custom(format!("unknown query_type {raw:?}")));
        }
        Ok(parsed)
    }
}

impl QueryType {
    /// Decode from a flat form value (identical rules to JSON, minus quoting).
    pub fn parse_form(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("query_type must not be empty".to_string());
        }
        let parsed = QueryType::parse(raw);
        if !parsed.is_valid() {
            return Err(format!("unknown query_type {raw:?}"));
        }
        Ok(parsed)
    }
}

/// The per-point time resolution of a result.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    #[default]
    Seconds,
    Minutes,
    Hours,
    /// Sentinel for any string that isn't one of the canonical names above.
    Unknown,
}

impl Granularity {
    /// The canonical wire string for this value, or `None` for [`Granularity::Unknown`].
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Granularity::Seconds => Some("seconds"),
            Granularity::Minutes => Some("minutes"),
            Granularity::Hours => Some("hours"),
            Granularity::Unknown => None,
        }
    }

    /// Parse a canonical wire string, mapping anything unrecognized to
    /// [`Granularity::Unknown`] rather than failing.
    pub fn parse(s: &str) -> Self {
        match s {
            "seconds" => Granularity::Seconds,
            "minutes" => Granularity::Minutes,
            "hours" => Granularity::Hours,
            _ => Granularity::Unknown,
        }
    }

    /// Whether this value is one of the closed set of canonical kinds.
    pub fn is_valid(self) -> bool {
        !matches!(self, Granularity::Unknown)
    }

    /// Single-letter backend unit code (`s`/`m`/`h`), used by C5 and C6.
    pub fn unit_code(self) -> Option<&'static str> {
        match self {
            Granularity::Seconds => Some("s"),
            Granularity::Minutes => Some("m"),
            Granularity::Hours => Some("h"),
            Granularity::Unknown => None,
        }
    }

    /// Decode from a flat form value (identical rules to JSON, minus quoting).
    pub fn parse_form(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("granularity must not be empty".to_string());
        }
        let parsed = Granularity::parse(raw);
        if !parsed.is_valid() {
            return Err(format!("unknown granularity {raw:?}"));
        }
        Ok(parsed)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => f.write_str(s),
            None => f.write_str("unknown"),
        }
    }
}

impl Serialize for Granularity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.as_str() {
            Some(s) => serializer.serialize_str(s),
            None => Err(serde::ser::Error::custom("cannot marshal unknown granularity")),
        }
    }
}

impl<'de> Deserialize<'de> for Granularity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(de::Error::custom("granularity must not be empty"));
        }
        let parsed = Granularity::parse(&raw);
        if !parsed.is_valid() {
            return Err(de::Error::custom(format!("unknown granularity {raw:?}")));
        }
        Ok(parsed)
    }
}
