//! The query expression tree: a small, closed algebra of nodes that each
//! support two operations — `query` (the backend expression string) and
//! `metrics` (the metric names it reads, used by composite nodes to
//! collapse several metrics into one `ts(...)` call). Implemented as a
//! tagged-variant enum rather than a trait object: the node set is closed
//! and no dispatch beyond these two methods is required.

use super::metric_name::format_metric;
use super::model::QueryContext;
use super::types::{Granularity, QueryType};

/// Aggregation applied by an `align` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agg {
    Sum,
    Mean,
}

impl Agg {
    fn as_str(self) -> &'static str {
        match self {
            Agg::Sum => "sum",
            Agg::Mean => "mean",
        }
    }
}

/// One node of the expression tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// One metric, no response-code suffix.
    Simple { kind: &'static str },
    /// One metric with a `.suffix` appended when `suffix` is non-empty.
    Suffixed {
        kind: &'static str,
        suffix: &'static str,
    },
    /// Flattens children's metrics into a single `ts(...)` with an
    /// `or`-joined metric pattern.
    Or(Vec<Node>),
    /// `align(1<unit>, <agg>, <child>)`.
    Align { agg: Agg, child: Box<Node> },
    /// `rawsum(<child>)`.
    Sum(Box<Node>),
    /// `percentile(<p>, <child>)`.
    Percentile { p: u32, child: Box<Node> },
    /// `(<c1>/<c2>/...)`.
    Div(Vec<Node>),
    /// `default(<value>, <child>)`, fills gaps with `value`.
    Default { value: &'static str, child: Box<Node> },
}

impl Node {
    /// The backend expression string for this node.
    pub fn query(&self, ctx: &QueryContext<'_>) -> String {
        match self {
            Node::Simple { .. } => render_ts(&self.metrics(ctx), tag_filter(ctx.series).as_deref()),
            Node::Suffixed { .. } => render_ts(&self.metrics(ctx), tag_filter(ctx.series).as_deref()),
            Node::Or(_) => render_ts(&self.metrics(ctx), tag_filter(ctx.series).as_deref()),
            Node::Align { agg, child } => {
                let unit = ctx.granularity.unit_code().unwrap_or("s");
                format!("align(1{unit}, {}, {})", agg.as_str(), child.query(ctx))
            }
            Node::Sum(child) => format!("rawsum({})", child.query(ctx)),
            Node::Percentile { p, child } => format!("percentile({p}, {})", child.query(ctx)),
            Node::Div(children) => {
                let joined: Vec<String> = children.iter().map(|c| c.query(ctx)).collect();
                format!("({})", joined.join("/"))
            }
            Node::Default { value, child } => format!("default({value}, {})", child.query(ctx)),
        }
    }

    /// The metric names this node reads, in the order they should appear.
    pub fn metrics(&self, ctx: &QueryContext<'_>) -> Vec<String> {
        match self {
            Node::Simple { kind } => vec![format_metric(ctx.org_key, ctx.zone_name, ctx.series, kind)],
            Node::Suffixed { kind, suffix } => {
                let base = format_metric(ctx.org_key, ctx.zone_name, ctx.series, kind);
                if suffix.is_empty() {
                    vec![base]
                } else {
                    vec![format!("{base}.{suffix}")]
                }
            }
            Node::Or(children) => children.iter().flat_map(|c| c.metrics(ctx)).collect(),
            Node::Align { child, .. }
            | Node::Sum(child)
            | Node::Percentile { child, .. }
            | Node::Default { child, .. } => child.metrics(ctx),
            Node::Div(children) => children.iter().flat_map(|c| c.metrics(ctx)).collect(),
        }
    }
}

/// Render a `ts("m1" or "m2" or ..., <tags>)` call.
fn render_ts(metrics: &[String], tags: Option<&str>) -> String {
    let metrics_expr: Vec<String> = metrics.iter().map(|m| format!("\"{m}\"")).collect();
    let metrics_expr = metrics_expr.join(" or ");
    match tags {
        Some(t) => format!("ts({metrics_expr}, {t})"),
        None => format!("ts({metrics_expr})"),
    }
}

/// Compose the tag filter appended inside `ts(...)`: `rule`, `shared_rule`,
/// `upstream`, then an instance filter, in that order, joined with `and`.
/// A multi-instance filter is parenthesized only when at least one other
/// category is also present.
fn tag_filter(series: &super::model::QueryTimeSeries) -> Option<String> {
    let mut categories = Vec::new();
    if let Some(rule) = &series.rule_key {
        categories.push(format!("rule=\"{rule}\""));
    }
    if let Some(shared_rule) = &series.shared_rule_name {
        categories.push(format!("shared_rule=\"{shared_rule}\""));
    }
    if let Some(cluster) = &series.cluster_name {
        categories.push(format!("upstream=\"{cluster}\""));
    }

    if !series.instance_keys.is_empty() {
        let exprs: Vec<String> = series
            .instance_keys
            .iter()
            .map(|k| format!("instance=\"{k}\""))
            .collect();
        let multi = exprs.len() > 1;
        let mut instance_expr = exprs.join(" or ");
        if multi && !categories.is_empty() {
            instance_expr = format!("({instance_expr})");
        }
        categories.push(instance_expr);
    }

    if categories.is_empty() {
        None
    } else {
        Some(categories.join(" and "))
    }
}

fn inner_count(kind: &'static str, suffix: &'static str) -> Node {
    let leaf = if suffix.is_empty() {
        Node::Simple { kind }
    } else {
        Node::Suffixed { kind, suffix }
    };
    Node::Sum(Box::new(Node::Align {
        agg: Agg::Sum,
        child: Box::new(leaf),
    }))
}

fn inner_success() -> Node {
    Node::Sum(Box::new(Node::Align {
        agg: Agg::Sum,
        child: Box::new(Node::Or(vec![
            Node::Suffixed { kind: "responses", suffix: "1*" },
            Node::Suffixed { kind: "responses", suffix: "2*" },
            Node::Suffixed { kind: "responses", suffix: "3*" },
        ])),
    }))
}

/// Compile a [`QueryType`] into its expression tree, per the compilation
/// table. `qt` must already be validated (not [`QueryType::Unknown`]).
pub fn compile(qt: QueryType, _granularity: Granularity) -> Node {
    match qt {
        QueryType::Requests => Node::Default {
            value: "0",
            child: Box::new(inner_count("requests", "")),
        },
        QueryType::Responses => Node::Default {
            value: "0",
            child: Box::new(inner_count("responses", "*")),
        },
        QueryType::Success => Node::Default {
            value: "0",
            child: Box::new(inner_success()),
        },
        QueryType::Error => Node::Default {
            value: "0",
            child: Box::new(inner_count("responses", "4*")),
        },
        QueryType::Failure => Node::Default {
            value: "0",
            child: Box::new(inner_count("responses", "5*")),
        },
        QueryType::LatencyP50 => Node::Default {
            value: "0",
            child: Box::new(Node::Percentile {
                p: 50,
                child: Box::new(Node::Align {
                    agg: Agg::Mean,
                    child: Box::new(Node::Simple { kind: "latency" }),
                }),
            }),
        },
        QueryType::LatencyP99 => Node::Default {
            value: "0",
            child: Box::new(Node::Percentile {
                p: 99,
                child: Box::new(Node::Align {
                    agg: Agg::Mean,
                    child: Box::new(Node::Simple { kind: "latency" }),
                }),
            }),
        },
        QueryType::SuccessRate => Node::Default {
            value: "1",
            child: Box::new(Node::Div(vec![
                inner_success(),
                inner_count("requests", ""),
            ])),
        },
        QueryType::Unknown => unreachable!("compile called with an unvalidated query type"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::model::QueryTimeSeries;

    fn ctx<'a>(org: &'a str, zone: &'a str, series: &'a QueryTimeSeries) -> QueryContext<'a> {
        QueryContext {
            org_key: org,
            zone_name: zone,
            granularity: Granularity::Seconds,
            series,
        }
    }

    #[test]
    fn requests_default_query() {
        let series = QueryTimeSeries {
            query_type: QueryType::Requests,
            ..Default::default()
        };
        let node = compile(QueryType::Requests, Granularity::Seconds);
        let c = ctx("o", "z", &series);
        assert_eq!(
            node.query(&c),
            "default(0, rawsum(align(1s, sum, ts(\"o.z.*.*.*.requests\"))))"
        );
    }

    #[test]
    fn filtered_requests_query() {
        let series = QueryTimeSeries {
            query_type: QueryType::Requests,
            domain_host: Some("d".to_string()),
            route_key: Some("r".to_string()),
            method: Some("GET".to_string()),
            cluster_name: Some("c".to_string()),
            instance_keys: vec!["i1".to_string(), "i2".to_string()],
            ..Default::default()
        };
        let node = compile(QueryType::Requests, Granularity::Seconds);
        let c = ctx("o", "z", &series);
        assert_eq!(
            node.query(&c),
            "default(0, rawsum(align(1s, sum, ts(\"o.z.d_*.r.GET.requests\", upstream=\"c\" and (instance=\"i1\" or instance=\"i2\")))))"
        );
    }

    #[test]
    fn success_rate_query() {
        let series = QueryTimeSeries {
            query_type: QueryType::SuccessRate,
            ..Default::default()
        };
        let node = compile(QueryType::SuccessRate, Granularity::Seconds);
        let c = ctx("o", "z", &series);
        assert_eq!(
            node.query(&c),
            "default(1, (rawsum(align(1s, sum, ts(\"o.z.*.*.*.responses.1*\" or \"o.z.*.*.*.responses.2*\" or \"o.z.*.*.*.responses.3*\")))/rawsum(align(1s, sum, ts(\"o.z.*.*.*.requests\")))))"
        );
    }

    #[test]
    fn single_instance_not_parenthesized_even_with_other_category() {
        let series = QueryTimeSeries {
            query_type: QueryType::Requests,
            cluster_name: Some("c".to_string()),
            instance_keys: vec!["i1".to_string()],
            ..Default::default()
        };
        let node = compile(QueryType::Requests, Granularity::Seconds);
        let c = ctx("o", "z", &series);
        assert!(node.query(&c).contains("upstream=\"c\" and instance=\"i1\""));
    }

    #[test]
    fn latency_p99_query() {
        let series = QueryTimeSeries {
            query_type: QueryType::LatencyP99,
            ..Default::default()
        };
        let node = compile(QueryType::LatencyP99, Granularity::Minutes);
        let c = QueryContext {
            org_key: "o",
            zone_name: "z",
            granularity: Granularity::Minutes,
            series: &series,
        };
        assert_eq!(
            node.query(&c),
            "default(0, percentile(99, align(1m, mean, ts(\"o.z.*.*.*.latency\"))))"
        );
    }
}
