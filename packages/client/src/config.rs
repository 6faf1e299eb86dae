//! Client configuration
//!
//! Everything the client needs to reach a server and render notes. The CLI
//! fills it from flags and environment variables; library users build it
//! directly.

use notespace_core::models::{NoteLimits, DEFAULT_OWNER, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use notespace_core::utils::DateFormatOptions;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::NoteCache;
use crate::controller::OptimisticController;
use crate::error::ClientError;
use crate::retry::{RetryPolicy, RetryingApi};
use crate::transport::{HttpNoteApi, NoteApi};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3001";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub owner: String,
    pub page_size: u32,
    pub retry: RetryPolicy,
    pub date_format: DateFormatOptions,
    pub request_timeout: Duration,
    /// Local validation limits; should match the server's
    pub limits: NoteLimits,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryPolicy::default(),
            date_format: DateFormatOptions::default(),
            request_timeout: Duration::from_secs(10),
            limits: NoteLimits::default(),
        }
    }
}

impl ClientConfig {
    /// Page size clamped to what the server accepts
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// HTTP transport wrapped in the configured retry policy
    pub fn build_api(&self) -> Result<Arc<dyn NoteApi>, ClientError> {
        let http = HttpNoteApi::new(&self.server_url, &self.owner, self.request_timeout)?;
        Ok(Arc::new(RetryingApi::new(http, self.retry)))
    }

    /// Controller over a fresh, empty cache
    pub fn build_controller(&self) -> Result<OptimisticController, ClientError> {
        let cache = NoteCache::new(self.effective_page_size());
        Ok(OptimisticController::new(self.build_api()?, cache).with_limits(self.limits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.server_url, "http://127.0.0.1:3001");
        assert_eq!(config.owner, "default");
        assert_eq!(config.effective_page_size(), 20);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_page_size_is_clamped() {
        let config = ClientConfig {
            page_size: 500,
            ..Default::default()
        };
        assert_eq!(config.effective_page_size(), 100);

        let config = ClientConfig {
            page_size: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_page_size(), 1);
    }

    #[test]
    fn test_build_controller_uses_page_size() {
        let config = ClientConfig {
            page_size: 7,
            ..Default::default()
        };
        let controller = config.build_controller().unwrap();
        assert_eq!(controller.cache().page_size(), 7);
    }
}
