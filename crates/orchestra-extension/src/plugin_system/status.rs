use std::sync::Arc;

use serde_json::Value;

use crate::kernel::constants::mode_key;
use crate::storage::config::ConfigStore;

pub const NORMAL_MODE: &str = "normal";
pub const SAFE_MODE: &str = "safe";

/// Decides whether the engine runs in safe mode.
///
/// The request's `_mode` input wins over the configured mode; the outcome is
/// written back so every later reader of the configuration agrees.
#[derive(Debug, Clone)]
pub struct StatusChecker {
    config: Arc<dyn ConfigStore>,
}

impl StatusChecker {
    pub fn new(config: Arc<dyn ConfigStore>, requested_mode: Option<&str>) -> Self {
        let checker = Self { config };
        let mode = requested_mode
            .map(String::from)
            .unwrap_or_else(|| checker.mode());

        if mode == SAFE_MODE {
            log::warn!("Extensions run in safe mode; activated extensions will not be registered");
            checker.config.set(&mode_key(), Value::String(SAFE_MODE.to_string()));
        } else {
            checker.config.set(&mode_key(), Value::String(NORMAL_MODE.to_string()));
        }
        checker
    }

    /// Current mode, `normal` unless configured otherwise
    pub fn mode(&self) -> String {
        self.config
            .get_string(&mode_key())
            .unwrap_or_else(|| NORMAL_MODE.to_string())
    }

    pub fn is(&self, mode: &str) -> bool {
        self.mode() == mode
    }

    pub fn is_not(&self, mode: &str) -> bool {
        !self.is(mode)
    }

    pub fn is_safe(&self) -> bool {
        self.is(SAFE_MODE)
    }
}
