//! Validates, compiles, dispatches, decodes, and assembles a query —
//! `RunQuery(orgKey, Query) → QueryResult | Error` — plus the HTTP-facing
//! wrapper that pulls `OrgKey` out of the request and wraps the result in
//! the response envelope.

use std::sync::Arc;

use stats_core::Error;
use tracing::instrument;

use super::executor::Executor;
use super::model::{Query, QueryContext, QueryResult, TimeSeries};
use super::{expr, response, time_range, url_builder};

/// Validate `query` before any normalization or dispatch happens.
///
/// `ZoneName` must be non-empty, `Granularity` must be one of the closed
/// set, every series must carry a valid `QueryType`, and the `RuleKey`
/// scoping invariant must hold.
pub fn validate_query(query: &Query) -> Result<(), Error> {
    if query.zone_name.is_empty() {
        return Err(Error::InvalidObject("zone_name must not be empty".to_string()));
    }
    if !query.time_range.granularity.is_valid() {
        return Err(Error::InvalidObject("invalid granularity".to_string()));
    }
    for (index, series) in query.timeseries.iter().enumerate() {
        if !series.query_type.is_valid() {
            return Err(Error::invalid_series(&series.diagnostic_ident(index), "invalid query_type"));
        }
        if !series.rule_key_scoping_holds() {
            return Err(Error::invalid_series(
                &series.diagnostic_ident(index),
                "series with a RuleKey must have a RouteKey and/or SharedRuleName",
            ));
        }
    }
    Ok(())
}

/// Run a validated query end to end: normalize its time range, compile and
/// dispatch one backend request per series, decode the responses, and
/// assemble the result in request order.
#[instrument(skip(query, executor), fields(org_key = %org_key, zone = %query.zone_name))]
pub async fn run_query(
    org_key: &str,
    query: Query,
    backend_base_url: &str,
    executor: &Executor,
) -> Result<QueryResult, Error> {
    validate_query(&query)?;
    let normalized = time_range::normalize(&query.time_range)?;

    let mut urls = Vec::with_capacity(query.timeseries.len());
    for series in &query.timeseries {
        let ctx = QueryContext {
            org_key,
            zone_name: &query.zone_name,
            granularity: normalized.granularity,
            series,
        };
        let node = expr::compile(series.query_type, normalized.granularity);
        let expression = node.query(&ctx);
        let url = url_builder::build_url(
            backend_base_url,
            normalized.granularity,
            series.query_type,
            normalized.start,
            normalized.end,
            &expression,
        )?;
        urls.push(url);
    }

    let bodies = executor.gather(urls).await?;

    let timeseries = query
        .timeseries
        .into_iter()
        .zip(bodies)
        .map(|(series, body)| {
            let points = response::decode_response(Some(&body))?;
            Ok(TimeSeries { query: series, points })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(QueryResult {
        time_range: normalized,
        timeseries,
    })
}

/// Everything the HTTP wrapper needs besides the decoded query and org key.
pub struct QueryService {
    pub backend_base_url: String,
    pub executor: Arc<Executor>,
}

impl QueryService {
    /// `AsHandler()`: run the query for an HTTP request, given its already
    /// decoded `Query` and resolved `OrgKey`. A missing `OrgKey` is the
    /// caller's responsibility to reject before this is invoked — see the
    /// `OrgKey` extractor.
    pub async fn handle(&self, org_key: &str, query: Query) -> Result<QueryResult, Error> {
        run_query(org_key, query, &self.backend_base_url, &self.executor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::model::{QueryTimeSeries, TimeRange};
    use crate::query::types::{Granularity, QueryType};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query_with(series: Vec<QueryTimeSeries>) -> Query {
        Query {
            zone_name: "z".to_string(),
            time_range: TimeRange::default(),
            timeseries: series,
        }
    }

    #[test]
    fn validate_rejects_empty_zone_name() {
        let q = Query {
            zone_name: String::new(),
            ..query_with(vec![])
        };
        let err = validate_query(&q).unwrap_err();
        assert!(matches!(err, Error::InvalidObject(m) if m.contains("zone_name")));
    }

    #[test]
    fn validate_rejects_rule_key_without_route_or_shared_rule() {
        let q = query_with(vec![QueryTimeSeries {
            query_type: QueryType::Requests,
            rule_key: Some("rk".to_string()),
            ..Default::default()
        }]);
        let err = validate_query(&q).unwrap_err();
        assert!(matches!(err, Error::InvalidObject(m) if m.contains("must have a RouteKey and/or SharedRuleName")));
    }

    #[test]
    fn validate_accepts_well_formed_query() {
        let q = query_with(vec![QueryTimeSeries {
            query_type: QueryType::Requests,
            ..Default::default()
        }]);
        assert!(validate_query(&q).is_ok());
    }

    #[tokio::test]
    async fn run_query_assembles_result_in_request_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"timeseries":[{"data":[[1.0, 2.0]]}]}"#,
            ))
            .mount(&server)
            .await;

        let executor = Executor::new(
            reqwest::Client::new(),
            crate::query::executor::ExecutorConfig::default(),
        );
        let query = query_with(vec![
            QueryTimeSeries {
                name: Some("first".to_string()),
                query_type: QueryType::Requests,
                ..Default::default()
            },
            QueryTimeSeries {
                name: Some("second".to_string()),
                query_type: QueryType::LatencyP50,
                ..Default::default()
            },
        ]);

        let result = run_query("o", query, &server.uri(), &executor).await.unwrap();
        assert_eq!(result.timeseries.len(), 2);
        assert_eq!(result.timeseries[0].query.name.as_deref(), Some("first"));
        assert_eq!(result.timeseries[1].query.name.as_deref(), Some("second"));
        assert_eq!(result.time_range.granularity, Granularity::Seconds);
        assert_eq!(result.time_range.duration, result.time_range.end - result.time_range.start);
    }

    #[tokio::test]
    async fn run_query_short_circuits_on_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let executor = Executor::new(
            reqwest::Client::new(),
            crate::query::executor::ExecutorConfig::default(),
        );
        let query = query_with(vec![QueryTimeSeries {
            query_type: QueryType::Requests,
            ..Default::default()
        }]);

        let err = run_query("o", query, &server.uri(), &executor).await.unwrap_err();
        assert!(matches!(err, Error::BackendStatus { status: 503, .. }));
    }

}
