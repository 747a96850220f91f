//! Runtime configuration

use crate::binding::BindOptions;

/// Configuration for a [`crate::Runtime`]
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Options used by `bind_to` and friends when none are given explicitly
    pub bind: BindOptions,
    /// Maximum number of queue/deferred-delete passes per `process_events`
    pub event_pass_limit: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind: BindOptions::default(),
            event_pass_limit: 64,
        }
    }
}

impl RuntimeConfig {
    pub fn with_bind_options(mut self, bind: BindOptions) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_event_pass_limit(mut self, limit: usize) -> Self {
        self.event_pass_limit = limit.max(1);
        self
    }
}
