//! pulsegrid-scaler — pluggable metric sources for the autoscaler.
//!
//! Each trigger gets one scaler, constructed once from its raw
//! string-keyed configuration, resolved secrets, auth parameters, and
//! identity-provider mode. The host control loop then polls it through
//! the uniform [`Scaler`] contract on every reconciliation tick:
//!
//! - [`Scaler::is_active`]: should we scale up from zero?
//! - [`Scaler::metric_spec`]: the one external metric to register.
//! - [`Scaler::get_metrics`]: the current measurement as a tagged sample.
//! - [`Scaler::close`]: explicit teardown.
//!
//! Configuration errors abort construction and never reach the poll
//! path; query errors fail a single poll and leave the scaler usable on
//! the next tick.

pub mod cloudwatch;
pub mod error;
pub mod scaler;
pub mod sqs;

mod metadata;

pub use cloudwatch::{CloudwatchMetadata, CloudwatchScaler};
pub use error::{ScalerError, ScalerResult};
pub use scaler::{build_scaler, Scaler, TRIGGER_AWS_CLOUDWATCH, TRIGGER_AWS_SQS_QUEUE};
pub use sqs::{SqsQueueMetadata, SqsQueueScaler};
