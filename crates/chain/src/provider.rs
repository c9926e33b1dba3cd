//! Provider management for a single HTTP RPC endpoint.
//! Uses Alloy providers for type-safe RPC interactions.

use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::http::reqwest::Url;
use tracing::{debug, info};

use crate::error::{ChainError, ChainResult};

/// Provider manager for one RPC endpoint.
///
/// Holds the parsed endpoint and builds a fresh Alloy provider per request,
/// leaving connection pooling, timeouts and retries to the transport.
#[derive(Debug, Clone)]
pub struct ProviderManager {
    /// Parsed HTTP endpoint
    url: Url,
}

impl ProviderManager {
    /// Create a provider manager for the given HTTP endpoint.
    pub fn new(http_url: &str) -> ChainResult<Self> {
        let url: Url = http_url
            .parse()
            .map_err(|_| ChainError::InvalidEndpoint(redact(http_url)))?;

        info!(host = url.host_str().unwrap_or("?"), "Provider manager configured");

        Ok(Self { url })
    }

    /// Build an Alloy provider for this endpoint.
    pub fn provider(&self) -> impl Provider {
        ProviderBuilder::new().on_http(self.url.clone())
    }

    /// Get current block number.
    pub async fn block_number(&self) -> ChainResult<u64> {
        let block = self.provider().get_block_number().await?;
        Ok(block)
    }

    /// Check if the endpoint answers.
    pub async fn health_check(&self) -> ChainResult<bool> {
        let block = self.block_number().await?;
        debug!(block = block, "Provider health check passed");
        Ok(block > 0)
    }
}

/// Strip everything after the host so API keys embedded in paths do not leak into logs.
fn redact(url: &str) -> String {
    match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            let host_end = rest.find('/').unwrap_or(rest.len());
            format!("{}/…", &url[..scheme_end + 3 + host_end])
        }
        None => "<unparseable>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint() {
        let err = ProviderManager::new("not a url").unwrap_err();
        assert_eq!(err, ChainError::InvalidEndpoint("<unparseable>".into()));
    }

    #[test]
    fn test_redact_hides_path() {
        assert_eq!(
            redact("https://eth-mainnet.example.com/v2/secret-key"),
            "https://eth-mainnet.example.com/…"
        );
    }

    #[tokio::test]
    #[ignore] // Requires network
    async fn test_health_check() {
        let provider = ProviderManager::new("https://ethereum-rpc.publicnode.com").unwrap();
        assert!(provider.health_check().await.unwrap());
    }
}
