//! pulsegrid-aws — AWS plumbing for the metric-source scalers.
//!
//! Two concerns live here:
//!
//! - [`auth`] resolves the trigger's identity-provider mode and auth
//!   parameters into exactly one [`auth::AwsAuthorization`] strategy,
//!   decided once at scaler construction.
//! - [`client`] defines the narrow backend capability traits
//!   ([`client::QueueBackend`], [`client::StatsBackend`]) the query
//!   executors call, plus the AWS-SDK-backed implementations.
//!
//! The scaler crates never touch the SDK directly; everything goes
//! through the capability traits so polls can be exercised against stub
//! backends in tests.

pub mod auth;
pub mod client;

pub use auth::{resolve_authorization, AuthError, AuthResult, AwsAuthorization, EnvCredentials};
pub use client::{
    BackendError, BackendResult, CloudwatchClient, QueueBackend, SqsQueueClient, StatisticQuery,
    StatsBackend,
};
