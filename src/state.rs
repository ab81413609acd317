use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::session::SessionController;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    controller: Arc<SessionController>,
    config: Arc<Config>,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<Store>, controller: SessionController, config: &Config) -> Self {
        Self {
            store,
            controller: Arc::new(controller),
            config: Arc::new(config.clone()),
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
