//! Blacklist screening gate
//!
//! Registration is gated on an upstream karma lookup. The gate is an
//! external collaborator: an unreachable upstream is an infrastructure
//! failure, never "not blacklisted".

use crate::{
    config::ScreeningConfig,
    error::{Error, Result},
};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Decides whether an identity is barred from registration
#[async_trait]
pub trait BlacklistGate: Send + Sync {
    /// True if the identity is blacklisted; `Err(Upstream)` if the gate
    /// cannot be consulted
    async fn is_blacklisted(&self, identity: &str) -> Result<bool>;
}

/// HTTP client for the upstream karma lookup
pub struct KarmaGate {
    client: reqwest::Client,
    base_url: String,
}

impl KarmaGate {
    /// Build a gate from configuration
    pub fn new(config: &ScreeningConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build screening client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

/// Karma lookup response (subset the gate cares about)
#[derive(Debug, Deserialize)]
struct KarmaResponse {
    data: KarmaData,
}

#[derive(Debug, Deserialize)]
struct KarmaData {
    karma_type: KarmaType,
}

#[derive(Debug, Deserialize)]
struct KarmaType {
    karma: String,
}

/// Karma value the upstream returns for identities with no record
const KARMA_CLEAR: &str = "Others";

#[async_trait]
impl BlacklistGate for KarmaGate {
    async fn is_blacklisted(&self, identity: &str) -> Result<bool> {
        let url = format!("{}verification/karma/{}", self.base_url, identity);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("karma lookup failed: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::Upstream(format!("karma lookup failed: {}", e)))?;

        let body: KarmaResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("karma response malformed: {}", e)))?;

        let blacklisted = body.data.karma_type.karma != KARMA_CLEAR;
        if blacklisted {
            tracing::warn!(identity, karma = %body.data.karma_type.karma, "Identity blacklisted");
        }

        Ok(blacklisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_karma_response_parse() {
        let json = r#"{
            "status": "success",
            "message": "Successful",
            "data": {
                "karma_identity": "ada@example.com",
                "amount_in_contention": "0.00",
                "reason": null,
                "default_date": "2020-05-18",
                "karma_type": { "karma": "Others" },
                "karma_identity_type": { "identity_type": "Email" },
                "reporting_entity": { "name": "Blinkcash", "email": "support@blinkcash.ng" }
            },
            "meta": { "cost": 10, "balance": 1600 }
        }"#;

        let response: KarmaResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data.karma_type.karma, KARMA_CLEAR);
    }

    #[test]
    fn test_gate_builds_from_config() {
        let config = ScreeningConfig::default();
        let gate = KarmaGate::new(&config).unwrap();
        assert!(gate.base_url.ends_with('/'));
    }
}
