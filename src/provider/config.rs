// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Provider configuration options

use std::time::Duration;

/// Configuration for creating providers
///
/// # Example
///
/// ```rust
/// use farmscan::provider::ProviderConfig;
///
/// let config = ProviderConfig::new("https://bsc-dataseed.bnbchain.org")
///     .with_rate_limit(10)
///     .with_logging(true);
/// assert!(config.has_rate_limiting());
/// ```
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// RPC endpoint URL
    pub url: String,
    /// Rate limit in requests per second (None for unlimited)
    pub rate_limit_per_second: Option<u32>,
    /// Minimum delay between requests (alternative to rate limiting)
    pub min_delay: Option<Duration>,
    /// Wrap the transport in [`LoggingLayer`](crate::transport::LoggingLayer)
    pub logging_enabled: bool,
}

impl ProviderConfig {
    /// Create a new provider configuration with the specified URL
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rate_limit_per_second: None,
            min_delay: None,
            logging_enabled: false,
        }
    }

    /// Set rate limiting (requests per second)
    ///
    /// Every aggregated batch is one request, so this bounds batches, not
    /// individual reads.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.rate_limit_per_second = Some(requests_per_second);
        self
    }

    /// Set minimum delay between requests
    #[must_use]
    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = Some(delay);
        self
    }

    #[must_use]
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    /// Check if this configuration includes rate limiting
    #[must_use]
    pub fn has_rate_limiting(&self) -> bool {
        self.rate_limit_per_second.is_some() || self.min_delay.is_some()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new("http://localhost:8545")
    }
}

/// Presets
impl ProviderConfig {
    /// Public endpoints throttle aggressively; stay well below their limits.
    #[must_use]
    pub fn public_endpoint(url: impl Into<String>) -> Self {
        Self::new(url).with_rate_limit(5)
    }

    #[must_use]
    pub fn local_node(url: impl Into<String>) -> Self {
        Self::new(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_new() {
        let config = ProviderConfig::new("https://bsc-dataseed.bnbchain.org");
        assert_eq!(config.url, "https://bsc-dataseed.bnbchain.org");
        assert!(config.rate_limit_per_second.is_none());
        assert!(!config.logging_enabled);
        assert!(!config.has_rate_limiting());
    }

    #[test]
    fn test_provider_config_min_delay_counts_as_rate_limiting() {
        let config = ProviderConfig::new("http://localhost:8545")
            .with_min_delay(Duration::from_millis(200));
        assert!(config.has_rate_limiting());
    }

    #[test]
    fn test_provider_config_presets() {
        assert_eq!(
            ProviderConfig::public_endpoint("https://rpc.example").rate_limit_per_second,
            Some(5)
        );
        assert!(!ProviderConfig::local_node("http://localhost:8545").has_rate_limiting());
    }
}
