//! The query plane: structured query data model, DSL compiler, time-range
//! normalization, scatter/gather execution, response decoding, and the
//! handler that ties them together.

pub mod decode;
pub mod executor;
pub mod expr;
pub mod handler;
pub mod metric_name;
pub mod model;
pub mod response;
pub mod time_range;
pub mod types;
pub mod url_builder;

pub use handler::{run_query, QueryService};
pub use model::{NormalizedTimeRange, Point, Query, QueryContext, QueryResult, QueryTimeSeries, TimeRange, TimeSeries};
pub use types::{Granularity, QueryType};
