//! Domain types shared across the pulsegrid crates.
//!
//! Everything the host may persist or ship across a process boundary
//! (`MetricSpec`, `MetricSample`, `ScalerTargets`) is JSON-serializable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Raw trigger configuration: string key → string value. Keys are
/// case-sensitive and specific to the metric source.
pub type TriggerMetadata = HashMap<String, String>;

/// Authentication parameters supplied alongside the trigger.
pub type AuthParams = HashMap<String, String>;

/// Secret values resolved by the host, looked up by name.
pub type ResolvedEnv = HashMap<String, String>;

/// Platform annotations on the workload.
pub type ResolvedAnnotations = HashMap<String, String>;

// ── Identity ───────────────────────────────────────────────────────

/// The mechanism by which workload credentials are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityProvider {
    /// No identity provider configured; credentials come from the
    /// trigger's auth parameters.
    #[default]
    None,
    /// kiam-style workload identity from a platform annotation.
    Kiam,
    /// Explicit access keys from trigger authentication.
    AwsCredentials,
    /// Explicit assumable role from trigger authentication.
    AwsRole,
}

impl IdentityProvider {
    /// Parse the identity-provider mode string. Unrecognized modes fall
    /// back to `None` and resolve like explicit credentials.
    pub fn parse(mode: &str) -> Self {
        match mode {
            "kiam" => IdentityProvider::Kiam,
            "aws-credentials" => IdentityProvider::AwsCredentials,
            "aws-role" => IdentityProvider::AwsRole,
            _ => IdentityProvider::None,
        }
    }
}

// ── Metrics ────────────────────────────────────────────────────────

/// The single external-metric descriptor a scaler registers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricSpec {
    /// Name the metric is registered under.
    pub metric_name: String,
    /// Target value the control loop compares samples against.
    pub target_value: i64,
}

/// Thresholds the control loop compares measurements against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScalerTargets {
    /// Per-replica target value.
    pub target_value: i64,
    /// Floor reported when the backend window holds no datapoints.
    pub min_value: i64,
}

/// One normalized measurement, produced fresh on every poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricSample {
    /// Name the sample is reported under.
    pub metric_name: String,
    /// Measured value.
    pub value: i64,
    /// Unix timestamp (seconds) when the sample was taken.
    pub timestamp: u64,
}

impl MetricSample {
    /// Create a sample stamped with the current time.
    pub fn now(metric_name: impl Into<String>, value: i64) -> Self {
        Self {
            metric_name: metric_name.into(),
            value,
            timestamp: epoch_secs(),
        }
    }
}

/// Current Unix timestamp in seconds.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
