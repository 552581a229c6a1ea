//! Metric backend clients.
//!
//! The query executors talk to AWS through narrow capability traits so
//! polls can be exercised without a live endpoint. The SDK-backed
//! implementations build their client once, at scaler construction, from
//! the resolved authorization and region; polls reuse it unchanged.
//!
//! Backend failures of any kind (authorization, throttling, network,
//! not-found) collapse into [`BackendError::Query`]. No retry or backoff
//! happens here; a failed call surfaces to the caller, and the host's
//! next poll is the retry path.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use thiserror::Error;
use tracing::debug;

use crate::auth::AwsAuthorization;

/// Result type alias for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors surfaced by a metric backend call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("metric query failed: {0}")]
    Query(String),

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
}

/// A windowed statistic query against a namespaced metric.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticQuery {
    pub namespace: String,
    /// Ordered (name, value) pairs identifying the metric stream.
    pub dimensions: Vec<(String, String)>,
    pub metric_name: String,
    /// Statistic to aggregate with ("Average", "Sum", ...).
    pub statistic: String,
    /// Aggregation period in seconds.
    pub period_secs: i32,
    /// Trailing collection window in seconds, ending now.
    pub window_secs: u64,
}

/// Point reads of a queue's backlog attribute.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Current approximate number of visible messages on the queue.
    async fn queue_length(&self, queue_url: &str) -> BackendResult<i64>;
}

/// Windowed statistic reads.
#[async_trait]
pub trait StatsBackend: Send + Sync {
    /// Datapoint values for the query's window, newest first. An empty
    /// series means the backend reported no datapoints for the window.
    async fn latest_values(&self, query: &StatisticQuery) -> BackendResult<Vec<f64>>;
}

/// Assemble an SDK config for the resolved authorization in a region.
///
/// Static keys and assumed roles install an explicit credentials
/// provider; workload identity leaves the default chain in place so the
/// platform-served credentials are picked up.
pub async fn sdk_config(auth: &AwsAuthorization, region: &str) -> SdkConfig {
    let region = Region::new(region.to_string());
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region.clone());

    match auth {
        AwsAuthorization::StaticCredentials {
            access_key_id,
            secret_access_key,
            session_token,
        } => {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                session_token.clone(),
                None,
                "pulsegrid-static",
            ));
        }
        AwsAuthorization::AssumedRole {
            role_arn,
            session_duration,
        } => {
            let provider = AssumeRoleProvider::builder(role_arn.clone())
                .region(region)
                .session_length(*session_duration)
                .session_name("pulsegrid-scaler")
                .build()
                .await;
            loader = loader.credentials_provider(provider);
        }
        AwsAuthorization::WorkloadIdentity { role_arn } => {
            debug!(role_arn = %role_arn, "using platform-served credentials");
        }
    }

    loader.load().await
}

// ── SQS ────────────────────────────────────────────────────────────

/// SQS-backed queue reader.
pub struct SqsQueueClient {
    client: aws_sdk_sqs::Client,
}

impl SqsQueueClient {
    /// Build the SQS client for the resolved authorization and region.
    pub async fn new(auth: &AwsAuthorization, region: &str) -> Self {
        let config = sdk_config(auth, region).await;
        Self {
            client: aws_sdk_sqs::Client::new(&config),
        }
    }
}

#[async_trait]
impl QueueBackend for SqsQueueClient {
    async fn queue_length(&self, queue_url: &str) -> BackendResult<i64> {
        let attribute = aws_sdk_sqs::types::QueueAttributeName::ApproximateNumberOfMessages;

        let output = self
            .client
            .get_queue_attributes()
            .queue_url(queue_url)
            .attribute_names(attribute.clone())
            .send()
            .await
            .map_err(|e| BackendError::Query(e.to_string()))?;

        let raw = output
            .attributes()
            .and_then(|attrs| attrs.get(&attribute))
            .ok_or_else(|| {
                BackendError::MalformedResponse(format!(
                    "attribute {} missing from response",
                    attribute.as_str()
                ))
            })?;

        raw.parse().map_err(|_| {
            BackendError::MalformedResponse(format!(
                "attribute {} is not an integer: {raw:?}",
                attribute.as_str()
            ))
        })
    }
}

// ── CloudWatch ─────────────────────────────────────────────────────

/// CloudWatch-backed statistic reader.
pub struct CloudwatchClient {
    client: aws_sdk_cloudwatch::Client,
}

impl CloudwatchClient {
    /// Build the CloudWatch client for the resolved authorization and
    /// region.
    pub async fn new(auth: &AwsAuthorization, region: &str) -> Self {
        let config = sdk_config(auth, region).await;
        Self {
            client: aws_sdk_cloudwatch::Client::new(&config),
        }
    }
}

#[async_trait]
impl StatsBackend for CloudwatchClient {
    async fn latest_values(&self, query: &StatisticQuery) -> BackendResult<Vec<f64>> {
        use aws_sdk_cloudwatch::types::{Dimension, Metric, MetricDataQuery, MetricStat, ScanBy};

        let mut dimensions = Vec::with_capacity(query.dimensions.len());
        for (name, value) in &query.dimensions {
            let dimension = Dimension::builder()
                .name(name)
                .value(value)
                .build();
            dimensions.push(dimension);
        }

        let metric = Metric::builder()
            .namespace(&query.namespace)
            .metric_name(&query.metric_name)
            .set_dimensions(Some(dimensions))
            .build();

        let metric_stat = MetricStat::builder()
            .metric(metric)
            .period(query.period_secs)
            .stat(&query.statistic)
            .build();

        let data_query = MetricDataQuery::builder()
            .id("pulsegrid_query")
            .metric_stat(metric_stat)
            .return_data(true)
            .build();

        let end = SystemTime::now();
        let start = end - Duration::from_secs(query.window_secs);

        let output = self
            .client
            .get_metric_data()
            .metric_data_queries(data_query)
            .start_time(smithy_time(start))
            .end_time(smithy_time(end))
            .scan_by(ScanBy::TimestampDescending)
            .send()
            .await
            .map_err(|e| BackendError::Query(e.to_string()))?;

        Ok(output
            .metric_data_results()
            .first()
            .map(|result| result.values().to_vec())
            .unwrap_or_default())
    }
}

fn smithy_time(t: SystemTime) -> aws_sdk_cloudwatch::primitives::DateTime {
    let secs = t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    aws_sdk_cloudwatch::primitives::DateTime::from_secs(secs as i64)
}
