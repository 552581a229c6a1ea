//! CloudWatch statistical scaler.
//!
//! Issues a windowed statistic query against a namespaced metric and
//! reports the most recent datapoint. An empty window reports the
//! configured `minMetricValue` floor instead of erroring, so a
//! metric-reporting gap does not read as zero demand.

use async_trait::async_trait;
use tracing::error;

use pulsegrid_aws::auth::{resolve_authorization, EnvCredentials};
use pulsegrid_aws::client::{CloudwatchClient, StatisticQuery, StatsBackend};
use pulsegrid_core::{
    AuthParams, IdentityProvider, MetricSample, MetricSpec, ResolvedAnnotations, ResolvedEnv,
    ScalerTargets, TriggerMetadata,
};

use crate::error::ScalerResult;
use crate::metadata::{lenient_i64, required};
use crate::scaler::Scaler;

/// Trailing collection window (seconds) when `metricCollectionTime` is
/// not set.
pub const DEFAULT_METRIC_COLLECTION_TIME: i64 = 300;

/// Statistic when `metricStat` is not set.
pub const DEFAULT_METRIC_STAT: &str = "Average";

/// Aggregation period (seconds) when `metricStatPeriod` is not set.
pub const DEFAULT_METRIC_STAT_PERIOD: i64 = 300;

/// Validated CloudWatch trigger configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudwatchMetadata {
    pub namespace: String,
    /// Ordered (name, value) pairs identifying the metric stream.
    pub dimensions: Vec<(String, String)>,
    pub metric_name: String,
    pub statistic: String,
    pub period_secs: i64,
    pub collection_window_secs: i64,
    pub region: String,
    pub targets: ScalerTargets,
}

impl CloudwatchMetadata {
    /// Parse and validate raw trigger metadata.
    ///
    /// `namespace`, `dimensionName`, `dimensionValue`, `metricName`, and
    /// `awsRegion` are required. The numeric targets and windowing
    /// parameters are lenient and degrade to their defaults.
    pub fn parse(metadata: &TriggerMetadata) -> ScalerResult<Self> {
        let namespace = required(metadata, "namespace")?;
        let dimension_name = required(metadata, "dimensionName")?;
        let dimension_value = required(metadata, "dimensionValue")?;
        let metric_name = required(metadata, "metricName")?;
        let region = required(metadata, "awsRegion")?;

        let targets = ScalerTargets {
            target_value: lenient_i64(metadata, "targetMetricValue", 0),
            min_value: lenient_i64(metadata, "minMetricValue", 0),
        };

        let statistic = metadata
            .get("metricStat")
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_METRIC_STAT.to_string());
        let period_secs = lenient_i64(metadata, "metricStatPeriod", DEFAULT_METRIC_STAT_PERIOD);
        let collection_window_secs =
            lenient_i64(metadata, "metricCollectionTime", DEFAULT_METRIC_COLLECTION_TIME);

        Ok(Self {
            namespace,
            dimensions: vec![(dimension_name, dimension_value)],
            metric_name,
            statistic,
            period_secs,
            collection_window_secs,
            region,
            targets,
        })
    }

    fn query(&self) -> StatisticQuery {
        StatisticQuery {
            namespace: self.namespace.clone(),
            dimensions: self.dimensions.clone(),
            metric_name: self.metric_name.clone(),
            statistic: self.statistic.clone(),
            period_secs: self.period_secs as i32,
            window_secs: self.collection_window_secs as u64,
        }
    }
}

/// Static-credential *names* in trigger metadata, resolved through the
/// host's environment map. Returns `None` unless both names are present
/// and both resolve.
fn env_credentials(
    metadata: &TriggerMetadata,
    resolved_env: &ResolvedEnv,
) -> Option<EnvCredentials> {
    let key_name = metadata.get("awsAccessKeyID").filter(|v| !v.is_empty())?;
    let secret_name = metadata.get("awsSecretAccessKey").filter(|v| !v.is_empty())?;

    Some(EnvCredentials {
        access_key_id: resolved_env.get(key_name)?.clone(),
        secret_access_key: resolved_env.get(secret_name)?.clone(),
    })
}

/// Scaler over one CloudWatch metric statistic.
pub struct CloudwatchScaler {
    metadata: CloudwatchMetadata,
    backend: Box<dyn StatsBackend>,
}

impl CloudwatchScaler {
    /// Parse metadata, resolve credentials, and build the
    /// CloudWatch-backed scaler.
    pub async fn new(
        metadata: &TriggerMetadata,
        resolved_env: &ResolvedEnv,
        annotations: &ResolvedAnnotations,
        auth_params: &AuthParams,
        identity: IdentityProvider,
    ) -> ScalerResult<Self> {
        let parsed = CloudwatchMetadata::parse(metadata)?;
        let fallback = env_credentials(metadata, resolved_env);
        let authorization = resolve_authorization(identity, auth_params, annotations, fallback)?;
        let backend = CloudwatchClient::new(&authorization, &parsed.region).await;

        Ok(Self {
            metadata: parsed,
            backend: Box::new(backend),
        })
    }

    /// Build a scaler over an already-constructed backend.
    pub fn with_backend(metadata: CloudwatchMetadata, backend: Box<dyn StatsBackend>) -> Self {
        Self { metadata, backend }
    }

    /// Most recent datapoint in the window, or the `minMetricValue`
    /// floor when the window is empty.
    async fn metric_value(&self) -> ScalerResult<f64> {
        let values = self.backend.latest_values(&self.metadata.query()).await?;
        Ok(values
            .first()
            .copied()
            .unwrap_or(self.metadata.targets.min_value as f64))
    }
}

#[async_trait]
impl Scaler for CloudwatchScaler {
    async fn is_active(&self) -> ScalerResult<bool> {
        Ok(self.metric_value().await? > 0.0)
    }

    fn metric_spec(&self) -> MetricSpec {
        MetricSpec {
            metric_name: self.metadata.metric_name.clone(),
            target_value: self.metadata.targets.target_value,
        }
    }

    async fn get_metrics(
        &self,
        metric_name: &str,
        _selector: Option<&str>,
    ) -> ScalerResult<Vec<MetricSample>> {
        let value = match self.metric_value().await {
            Ok(value) => value,
            Err(e) => {
                error!(
                    error = %e,
                    namespace = %self.metadata.namespace,
                    metric = %self.metadata.metric_name,
                    "statistic query failed"
                );
                return Err(e);
            }
        };

        Ok(vec![MetricSample::now(metric_name, value as i64)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsegrid_aws::auth::AuthError;
    use pulsegrid_aws::{BackendError, BackendResult};
    use crate::error::ScalerError;
    use std::collections::HashMap;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolved_env() -> ResolvedEnv {
        map(&[("AWS_ACCESS_KEY", "none"), ("AWS_SECRET_ACCESS_KEY", "none")])
    }

    fn base_metadata() -> Vec<(&'static str, &'static str)> {
        vec![
            ("namespace", "AWS/SQS"),
            ("dimensionName", "QueueName"),
            ("dimensionValue", "orders"),
            ("metricName", "ApproximateNumberOfMessagesVisible"),
            ("targetMetricValue", "2"),
            ("minMetricValue", "0"),
            ("awsRegion", "eu-west-1"),
        ]
    }

    struct ParseCase {
        comment: &'static str,
        metadata: Vec<(&'static str, &'static str)>,
        auth_params: Vec<(&'static str, &'static str)>,
        identity: IdentityProvider,
        is_error: bool,
    }

    fn parse_case(case: &ParseCase) -> ScalerResult<()> {
        let metadata = map(&case.metadata);
        let auth_params = map(&case.auth_params);
        CloudwatchMetadata::parse(&metadata)?;
        let fallback = env_credentials(&metadata, &resolved_env());
        resolve_authorization(case.identity, &auth_params, &HashMap::new(), fallback)?;
        Ok(())
    }

    #[test]
    fn metadata_validation_matrix() {
        let mut with_env_names = base_metadata();
        with_env_names.push(("awsAccessKeyID", "AWS_ACCESS_KEY"));
        with_env_names.push(("awsSecretAccessKey", "AWS_SECRET_ACCESS_KEY"));

        let mut with_optionals = with_env_names.clone();
        with_optionals.push(("metricCollectionTime", "300"));
        with_optionals.push(("metricStat", "Average"));
        with_optionals.push(("metricStatPeriod", "300"));

        let empty_region: Vec<_> = with_env_names
            .iter()
            .map(|&(k, v)| if k == "awsRegion" { (k, "") } else { (k, v) })
            .collect();

        let drop_key = |key: &str| -> Vec<_> {
            with_env_names
                .iter()
                .copied()
                .filter(|&(k, _)| k != key)
                .collect()
        };

        let cases = vec![
            ParseCase {
                comment: "empty structures",
                metadata: vec![],
                auth_params: vec![],
                identity: IdentityProvider::None,
                is_error: true,
            },
            ParseCase {
                comment: "properly formed query with env-resolved keys",
                metadata: with_env_names.clone(),
                auth_params: vec![],
                identity: IdentityProvider::None,
                is_error: false,
            },
            ParseCase {
                comment: "properly formed query with optional parameters",
                metadata: with_optionals,
                auth_params: vec![],
                identity: IdentityProvider::None,
                is_error: false,
            },
            ParseCase {
                comment: "empty region",
                metadata: empty_region,
                auth_params: vec![],
                identity: IdentityProvider::None,
                is_error: true,
            },
            ParseCase {
                comment: "missing namespace",
                metadata: drop_key("namespace"),
                auth_params: vec![],
                identity: IdentityProvider::None,
                is_error: true,
            },
            ParseCase {
                comment: "missing dimensionName",
                metadata: drop_key("dimensionName"),
                auth_params: vec![],
                identity: IdentityProvider::None,
                is_error: true,
            },
            ParseCase {
                comment: "missing dimensionValue",
                metadata: drop_key("dimensionValue"),
                auth_params: vec![],
                identity: IdentityProvider::None,
                is_error: true,
            },
            ParseCase {
                comment: "missing metricName",
                metadata: drop_key("metricName"),
                auth_params: vec![],
                identity: IdentityProvider::None,
                is_error: true,
            },
            ParseCase {
                comment: "credentials from trigger authentication",
                metadata: base_metadata(),
                auth_params: vec![
                    ("awsAccessKeyId", "none"),
                    ("awsSecretAccessKey", "none"),
                ],
                identity: IdentityProvider::AwsCredentials,
                is_error: false,
            },
            ParseCase {
                comment: "role from trigger authentication",
                metadata: base_metadata(),
                auth_params: vec![
                    ("awsRoleArn", "none"),
                    ("awsAssumeRoleDuration", "5"),
                ],
                identity: IdentityProvider::AwsRole,
                is_error: false,
            },
            ParseCase {
                comment: "role with empty awsAssumeRoleDuration",
                metadata: base_metadata(),
                auth_params: vec![
                    ("awsRoleArn", "none"),
                    ("awsAssumeRoleDuration", ""),
                ],
                identity: IdentityProvider::AwsRole,
                is_error: true,
            },
        ];

        for case in &cases {
            let result = parse_case(case);
            assert_eq!(
                result.is_err(),
                case.is_error,
                "{}: got {result:?}",
                case.comment
            );
        }
    }

    #[test]
    fn parse_fills_defaults() {
        let parsed = CloudwatchMetadata::parse(&map(&base_metadata())).unwrap();
        assert_eq!(parsed.statistic, DEFAULT_METRIC_STAT);
        assert_eq!(parsed.period_secs, DEFAULT_METRIC_STAT_PERIOD);
        assert_eq!(parsed.collection_window_secs, DEFAULT_METRIC_COLLECTION_TIME);
        assert_eq!(parsed.targets.target_value, 2);
        assert_eq!(parsed.targets.min_value, 0);
        assert_eq!(
            parsed.dimensions,
            vec![("QueueName".to_string(), "orders".to_string())]
        );
    }

    #[test]
    fn env_indirection_resolves_secret_values() {
        let mut metadata = base_metadata();
        metadata.push(("awsAccessKeyID", "AWS_ACCESS_KEY"));
        metadata.push(("awsSecretAccessKey", "AWS_SECRET_ACCESS_KEY"));

        let creds = env_credentials(&map(&metadata), &resolved_env()).unwrap();
        assert_eq!(creds.access_key_id, "none");
        assert_eq!(creds.secret_access_key, "none");
    }

    #[test]
    fn env_indirection_requires_both_names_to_resolve() {
        let mut metadata = base_metadata();
        metadata.push(("awsAccessKeyID", "NOT_IN_ENV"));
        metadata.push(("awsSecretAccessKey", "AWS_SECRET_ACCESS_KEY"));
        assert!(env_credentials(&map(&metadata), &resolved_env()).is_none());
    }

    #[test]
    fn no_strategy_reports_no_authentication() {
        let err = parse_case(&ParseCase {
            comment: "no auth anywhere",
            metadata: base_metadata(),
            auth_params: vec![],
            identity: IdentityProvider::None,
            is_error: true,
        })
        .unwrap_err();
        assert!(matches!(err, ScalerError::Auth(AuthError::NoCredentials)));
    }

    // ── Poll behavior over stub backends ───────────────────────────

    struct FixedStats(Vec<f64>);

    #[async_trait]
    impl StatsBackend for FixedStats {
        async fn latest_values(&self, _query: &StatisticQuery) -> BackendResult<Vec<f64>> {
            Ok(self.0.clone())
        }
    }

    struct FailingStats;

    #[async_trait]
    impl StatsBackend for FailingStats {
        async fn latest_values(&self, _query: &StatisticQuery) -> BackendResult<Vec<f64>> {
            Err(BackendError::Query("access denied".to_string()))
        }
    }

    fn scaler_with(backend: Box<dyn StatsBackend>) -> CloudwatchScaler {
        let mut metadata = base_metadata();
        metadata.push(("minMetricValue", "3"));
        CloudwatchScaler::with_backend(
            CloudwatchMetadata::parse(&map(&metadata)).unwrap(),
            backend,
        )
    }

    #[tokio::test]
    async fn newest_datapoint_wins() {
        let scaler = scaler_with(Box::new(FixedStats(vec![7.0, 4.0, 2.0])));
        let samples = scaler.get_metrics("visible-messages", None).await.unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 7);
        assert_eq!(samples[0].metric_name, "visible-messages");
    }

    #[tokio::test]
    async fn empty_window_falls_back_to_min_value() {
        let scaler = scaler_with(Box::new(FixedStats(Vec::new())));
        let samples = scaler.get_metrics("visible-messages", None).await.unwrap();
        assert_eq!(samples[0].value, 3);
        assert!(scaler.is_active().await.unwrap());
    }

    #[tokio::test]
    async fn is_active_false_on_zero_datapoint() {
        let scaler = scaler_with(Box::new(FixedStats(vec![0.0])));
        assert!(!scaler.is_active().await.unwrap());
    }

    #[tokio::test]
    async fn query_failure_surfaces_per_poll() {
        let scaler = scaler_with(Box::new(FailingStats));
        assert!(scaler.get_metrics("visible-messages", None).await.is_err());
        // The metric spec is still served from construction-time state.
        assert_eq!(scaler.metric_spec().target_value, 2);
    }

    #[tokio::test]
    async fn metric_spec_uses_configured_metric_name() {
        let scaler = scaler_with(Box::new(FixedStats(vec![1.0])));
        let spec = scaler.metric_spec();
        assert_eq!(spec.metric_name, "ApproximateNumberOfMessagesVisible");
        assert_eq!(spec, scaler.metric_spec());
    }
}
