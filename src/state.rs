use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::Services;

/// Router state shared by every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Services,
}

impl AppState {
    pub fn new(config: AppConfig, services: Services) -> Self {
        Self {
            config: Arc::new(config),
            services,
        }
    }
}
