//! Environment-backed configuration.

use anyhow::{Result, anyhow};

/// Connection settings for the broker and the action API, read from the
/// environment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub broker_user: String,
    pub broker_password: String,
    pub broker_host: String,
    pub broker_vhost: String,
    pub broker_queue: String,

    pub action_api_url: String,
    pub action_api_user: String,
    pub action_api_password: String,
}

impl GatewayConfig {
    /// Read every setting from the environment. The error names the first
    /// missing variable.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            broker_user: require("BROKER_USER")?,
            broker_password: require("BROKER_PASSWORD")?,
            broker_host: require("BROKER_HOST")?,
            broker_vhost: require("BROKER_VHOST")?,
            broker_queue: require("BROKER_QUEUE")?,
            action_api_url: require("ACTION_API_URL")?,
            action_api_user: require("ACTION_API_USER")?,
            action_api_password: require("ACTION_API_PASSWORD")?,
        })
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| anyhow!("missing environment variable: {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_reports_missing_variable() {
        let err = require("CHATFLOW_TEST_SURELY_UNSET").unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing environment variable: CHATFLOW_TEST_SURELY_UNSET"
        );
    }

    #[test]
    fn test_require_reads_present_variable() {
        // set_var is unsafe in edition 2024; this test is the only writer
        // of this variable.
        unsafe {
            std::env::set_var("CHATFLOW_TEST_PRESENT", "value");
        }
        assert_eq!(require("CHATFLOW_TEST_PRESENT").unwrap(), "value");
    }
}
