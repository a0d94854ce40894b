use crate::config::Config;
use crate::dispatch::InFlight;
use crate::errors::ApiError;
use crate::source::DataSource;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub source: DataSource,
    pub in_flight: InFlight,
}

impl AppState {
    pub fn new(config: Config, source: DataSource) -> Self {
        Self {
            config: Arc::new(config),
            source,
            in_flight: InFlight::default(),
        }
    }

    pub fn from_config(config: Config) -> Result<Self, ApiError> {
        let source = DataSource::from_config(&config)?;
        Ok(Self::new(config, source))
    }
}
