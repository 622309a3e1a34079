//! Common test utilities and helpers

#![allow(dead_code)]

use opsdesk::abstractions::{MockClassifier, MockStepExecutor};
use opsdesk::config::ConsoleConfig;
use opsdesk::runbook::{Console, Driver, SessionSettings};
use std::sync::Arc;
use std::time::Duration;

/// Configuration pointing every endpoint at `base_url`
pub fn config_for(base_url: &str) -> ConsoleConfig {
    let mut config = ConsoleConfig::default();
    config.user_id = "ops-tester".to_string();
    config.environment = "staging".to_string();
    config.api.base_url = base_url.to_string();
    config
}

/// Session settings with a short cascade delay so tests stay fast
pub fn fast_settings() -> SessionSettings {
    SessionSettings {
        user_id: "ops-tester".to_string(),
        environment: "staging".to_string(),
        cascade_delay: Duration::from_millis(1),
    }
}

/// Mock backends plus a driver wired to them
pub struct MockBackends {
    pub classifier: Arc<MockClassifier>,
    pub executor: Arc<MockStepExecutor>,
}

impl MockBackends {
    pub fn new() -> Self {
        Self {
            classifier: Arc::new(MockClassifier::new()),
            executor: Arc::new(MockStepExecutor::new()),
        }
    }

    pub fn driver(&self) -> Driver<MockClassifier, MockStepExecutor> {
        Driver::new(
            Console::new(fast_settings()),
            Arc::clone(&self.classifier),
            Arc::clone(&self.executor),
        )
    }
}
