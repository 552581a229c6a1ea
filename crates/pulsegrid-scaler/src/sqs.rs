//! SQS queue-length scaler.
//!
//! Reports the approximate number of visible messages on one queue. Each
//! poll is a single point read of the queue attribute; the returned value
//! is the sample, with no aggregation or time window.

use async_trait::async_trait;
use tracing::error;

use pulsegrid_aws::auth::resolve_authorization;
use pulsegrid_aws::client::{QueueBackend, SqsQueueClient};
use pulsegrid_core::{
    AuthParams, IdentityProvider, MetricSample, MetricSpec, ResolvedAnnotations, TriggerMetadata,
};

use crate::error::ScalerResult;
use crate::metadata::{lenient_i64, required};
use crate::scaler::Scaler;

/// Metric name registered for SQS queue-length triggers.
pub const SQS_QUEUE_METRIC_NAME: &str = "ApproximateNumberOfMessages";

/// Fallback target when `queueLength` is absent or malformed.
pub const DEFAULT_TARGET_QUEUE_LENGTH: i64 = 5;

/// Validated SQS trigger configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqsQueueMetadata {
    pub queue_url: String,
    pub region: String,
    pub target_queue_length: i64,
}

impl SqsQueueMetadata {
    /// Parse and validate raw trigger metadata.
    ///
    /// `queueURL` and `awsRegion` are required; `queueLength` is lenient
    /// and degrades to [`DEFAULT_TARGET_QUEUE_LENGTH`].
    pub fn parse(metadata: &TriggerMetadata) -> ScalerResult<Self> {
        let queue_url = required(metadata, "queueURL")?;
        let region = required(metadata, "awsRegion")?;
        let target_queue_length =
            lenient_i64(metadata, "queueLength", DEFAULT_TARGET_QUEUE_LENGTH);

        Ok(Self {
            queue_url,
            region,
            target_queue_length,
        })
    }
}

/// Scaler over one SQS queue's backlog.
pub struct SqsQueueScaler {
    metadata: SqsQueueMetadata,
    backend: Box<dyn QueueBackend>,
}

impl SqsQueueScaler {
    /// Parse metadata, resolve credentials, and build the SQS-backed
    /// scaler. All validation happens here; a constructed scaler cannot
    /// fail for configuration reasons afterwards.
    pub async fn new(
        metadata: &TriggerMetadata,
        annotations: &ResolvedAnnotations,
        auth_params: &AuthParams,
        identity: IdentityProvider,
    ) -> ScalerResult<Self> {
        let parsed = SqsQueueMetadata::parse(metadata)?;
        let authorization = resolve_authorization(identity, auth_params, annotations, None)?;
        let backend = SqsQueueClient::new(&authorization, &parsed.region).await;

        Ok(Self {
            metadata: parsed,
            backend: Box::new(backend),
        })
    }

    /// Build a scaler over an already-constructed backend.
    pub fn with_backend(metadata: SqsQueueMetadata, backend: Box<dyn QueueBackend>) -> Self {
        Self { metadata, backend }
    }

    async fn queue_length(&self) -> ScalerResult<i64> {
        Ok(self.backend.queue_length(&self.metadata.queue_url).await?)
    }
}

#[async_trait]
impl Scaler for SqsQueueScaler {
    async fn is_active(&self) -> ScalerResult<bool> {
        Ok(self.queue_length().await? > 0)
    }

    fn metric_spec(&self) -> MetricSpec {
        MetricSpec {
            metric_name: SQS_QUEUE_METRIC_NAME.to_string(),
            target_value: self.metadata.target_queue_length,
        }
    }

    async fn get_metrics(
        &self,
        metric_name: &str,
        _selector: Option<&str>,
    ) -> ScalerResult<Vec<MetricSample>> {
        let length = match self.queue_length().await {
            Ok(length) => length,
            Err(e) => {
                error!(
                    error = %e,
                    queue_url = %self.metadata.queue_url,
                    "queue length query failed"
                );
                return Err(e);
            }
        };

        Ok(vec![MetricSample::now(metric_name, length)])
    }
}
