//! The uniform polling contract and trigger dispatch.

use async_trait::async_trait;

use pulsegrid_core::{
    AuthParams, IdentityProvider, MetricSample, MetricSpec, ResolvedAnnotations, ResolvedEnv,
    TriggerMetadata,
};

use crate::cloudwatch::CloudwatchScaler;
use crate::error::{ScalerError, ScalerResult};
use crate::sqs::SqsQueueScaler;

/// Trigger type string for the SQS queue-length source.
pub const TRIGGER_AWS_SQS_QUEUE: &str = "aws-sqs-queue";

/// Trigger type string for the CloudWatch statistical source.
pub const TRIGGER_AWS_CLOUDWATCH: &str = "aws-cloudwatch";

/// The polling contract every metric source implements.
///
/// The host constructs one scaler per trigger and polls it on every
/// reconciliation tick. All instance state is fixed at construction, so
/// poll methods take `&self` and are safe to call concurrently. Deadlines
/// belong to the caller; no operation retries internally.
#[async_trait]
pub trait Scaler: Send + Sync {
    /// Whether the source currently shows demand. Executes a measurement
    /// and returns true iff the sample is strictly greater than zero.
    async fn is_active(&self) -> ScalerResult<bool>;

    /// The single external-metric descriptor to register for this
    /// trigger. Pure accessor over construction-time state; performs no
    /// backend call and returns the same descriptor on every invocation.
    fn metric_spec(&self) -> MetricSpec;

    /// Execute one measurement and return it as a single sample tagged
    /// with `metric_name` and the current time.
    ///
    /// The selector is accepted for compatibility with the
    /// external-metrics host interface; the AWS sources ignore it.
    async fn get_metrics(
        &self,
        metric_name: &str,
        selector: Option<&str>,
    ) -> ScalerResult<Vec<MetricSample>>;

    /// Release held resources. Idempotent. The AWS sources hold no
    /// persistent connections across polls, so the default is a no-op.
    async fn close(&self) -> ScalerResult<()> {
        Ok(())
    }
}

/// Construct the scaler for a trigger.
///
/// This is the single selection point between source kinds; nothing
/// downstream inspects trigger types at poll time.
pub async fn build_scaler(
    trigger_type: &str,
    metadata: &TriggerMetadata,
    resolved_env: &ResolvedEnv,
    annotations: &ResolvedAnnotations,
    auth_params: &AuthParams,
    identity: IdentityProvider,
) -> ScalerResult<Box<dyn Scaler>> {
    match trigger_type {
        TRIGGER_AWS_SQS_QUEUE => Ok(Box::new(
            SqsQueueScaler::new(metadata, annotations, auth_params, identity).await?,
        )),
        TRIGGER_AWS_CLOUDWATCH => Ok(Box::new(
            CloudwatchScaler::new(metadata, resolved_env, annotations, auth_params, identity)
                .await?,
        )),
        other => Err(ScalerError::UnknownTrigger(other.to_string())),
    }
}
