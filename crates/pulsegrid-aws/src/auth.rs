//! AWS credential strategy resolution.
//!
//! A scaler resolves exactly one authorization strategy at construction
//! time and holds it for its lifetime; polls never re-resolve. Precedence:
//! workload identity (kiam annotation), then an assumable role from the
//! trigger's auth parameters, then static keys from the auth parameters,
//! then static keys named in trigger metadata and resolved through the
//! host's environment map.
//!
//! Session renewal for assumed roles is the SDK credential provider's
//! concern, not this module's.

use std::time::Duration;

use thiserror::Error;

use pulsegrid_core::{AuthParams, IdentityProvider, ResolvedAnnotations};

/// Annotation carrying the platform-assigned role for kiam workloads.
pub const KIAM_ROLE_ANNOTATION: &str = "iam.amazonaws.com/role";

/// Assumed-role session length when `awsAssumeRoleDuration` is not set.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(15 * 60);

/// Result type alias for credential resolution.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while resolving a credential strategy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no authentication was found")]
    NoCredentials,

    #[error("workload identity annotation {0} is missing or empty")]
    MissingIdentityAnnotation(&'static str),

    #[error("awsAssumeRoleDuration is not a valid integer: {0:?}")]
    InvalidSessionDuration(String),
}

/// Exactly one authorization strategy per scaler instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwsAuthorization {
    /// Long-lived access keys supplied by the host.
    StaticCredentials {
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
    },
    /// Temporary credentials obtained by assuming a role for a bounded
    /// session.
    AssumedRole {
        role_arn: String,
        session_duration: Duration,
    },
    /// Credentials served by the platform for the annotated role.
    WorkloadIdentity { role_arn: String },
}

/// Static keys already looked up from the resolved environment map.
///
/// The statistical source allows `awsAccessKeyID`/`awsSecretAccessKey` in
/// trigger metadata to name entries in the host's resolved-env map; the
/// metadata parser performs that lookup and passes the values here as the
/// lowest-precedence fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Select the authorization strategy for a trigger.
///
/// Evaluated once at scaler construction. Fails when the kiam annotation
/// is absent in kiam mode, when `awsAssumeRoleDuration` is present but
/// unparseable, or when no strategy matches.
pub fn resolve_authorization(
    identity: IdentityProvider,
    auth_params: &AuthParams,
    annotations: &ResolvedAnnotations,
    env_fallback: Option<EnvCredentials>,
) -> AuthResult<AwsAuthorization> {
    if identity == IdentityProvider::Kiam {
        let role_arn = annotations
            .get(KIAM_ROLE_ANNOTATION)
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::MissingIdentityAnnotation(KIAM_ROLE_ANNOTATION))?;
        return Ok(AwsAuthorization::WorkloadIdentity {
            role_arn: role_arn.clone(),
        });
    }

    if let Some(role_arn) = non_empty(auth_params, "awsRoleArn") {
        return Ok(AwsAuthorization::AssumedRole {
            role_arn: role_arn.to_string(),
            session_duration: session_duration(auth_params)?,
        });
    }

    if let (Some(key_id), Some(secret)) = (
        non_empty(auth_params, "awsAccessKeyId"),
        non_empty(auth_params, "awsSecretAccessKey"),
    ) {
        return Ok(AwsAuthorization::StaticCredentials {
            access_key_id: key_id.to_string(),
            secret_access_key: secret.to_string(),
            session_token: non_empty(auth_params, "awsSessionToken").map(str::to_string),
        });
    }

    if let Some(env) = env_fallback {
        return Ok(AwsAuthorization::StaticCredentials {
            access_key_id: env.access_key_id,
            secret_access_key: env.secret_access_key,
            session_token: None,
        });
    }

    Err(AuthError::NoCredentials)
}

/// Strict parse of `awsAssumeRoleDuration` (minutes). A present but
/// unparseable value is a hard error; absence yields the default.
fn session_duration(auth_params: &AuthParams) -> AuthResult<Duration> {
    match auth_params.get("awsAssumeRoleDuration") {
        None => Ok(DEFAULT_SESSION_DURATION),
        Some(raw) => {
            let minutes: u64 = raw
                .parse()
                .map_err(|_| AuthError::InvalidSessionDuration(raw.clone()))?;
            Ok(Duration::from_secs(minutes * 60))
        }
    }
}

fn non_empty<'a>(map: &'a AuthParams, key: &str) -> Option<&'a str> {
    map.get(key).map(String::as_str).filter(|v| !v.is_empty())
}
