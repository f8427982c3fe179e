//! Shared application state handed to every route handler.

use std::sync::Arc;

use crate::config::Config;
use crate::query::executor::Executor;
use crate::query::QueryService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub query_service: Arc<QueryService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let client = reqwest::Client::new();
        let executor_config = config.executor_config();
        let executor = Arc::new(Executor::with_auth_token(
            client,
            executor_config,
            config.backend_auth_token.clone(),
        ));
        let query_service = Arc::new(QueryService {
            backend_base_url: config.backend_url.clone(),
            executor,
        });
        Self {
            config: Arc::new(config),
            query_service,
        }
    }
}
