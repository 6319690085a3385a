use std::{env, time::Duration};

use relay_common::env_or;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_CMS_API_BASE_URL: &str = "https://api.webflow.com";

#[derive(Clone)]
pub struct RelayConfig {
    pub port: u16,
    pub cms_api_base_url: String,
    /// `None` leaves the outbound call bounded only by the transport.
    pub request_timeout: Option<Duration>,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        let cms_api_base_url = env::var("CMS_API_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CMS_API_BASE_URL.to_string());

        Self {
            port: env_or("PORT", DEFAULT_PORT),
            cms_api_base_url,
            request_timeout: timeout_from_secs(env_or("CMS_REQUEST_TIMEOUT_SECS", 0u64)),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cms_api_base_url: DEFAULT_CMS_API_BASE_URL.to_string(),
            request_timeout: None,
        }
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
