//! Config derivation
//!
//! Turns a raw inbound event plus the project secrets into an immutable
//! [`RunConfig`]. Pure: the only input that varies between retries of the
//! same event is `now`.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::domain::event::{Event, ProjectSecrets};
use crate::domain::run::{PULL_REQUEST_BRANCH, RunConfig, RunConfigParts};
use crate::error::ConfigDerivationError;
use crate::settings::PipelineSettings;

/// Length of the `refs/heads/` prefix stripped from branch refs
const REF_PREFIX_LEN: usize = "refs/heads/".len();

/// Length of the short commit id
const SHORT_SHA_LEN: usize = 7;

/// Derives the run configuration for `event`
pub fn derive_run_config(
    event: &Event,
    secrets: &ProjectSecrets,
    settings: &PipelineSettings,
    now: DateTime<Utc>,
) -> Result<RunConfig, ConfigDerivationError> {
    let payload: JsonValue = serde_json::from_str(&event.payload)
        .map_err(|e| ConfigDerivationError::MalformedPayload(e.to_string()))?;

    let branch = branch_from_payload(&payload)?;

    if event.commit.trim().is_empty() {
        return Err(ConfigDerivationError::MissingCommit);
    }

    Ok(RunConfig::compose(RunConfigParts {
        registry_url: secrets.registry_url.clone(),
        registry_username: secrets.registry_username.clone(),
        registry_password: secrets.registry_password.clone(),
        base_image_name: settings.base_image_name.clone(),
        commit_sha: short_sha(&event.commit),
        event_kind: event.kind.clone(),
        branch,
        build_date: now.format("%Y-%m-%d").to_string(),
    }))
}

/// Extracts the branch from the payload's `ref`, or `"PR"` when there is none
fn branch_from_payload(payload: &JsonValue) -> Result<String, ConfigDerivationError> {
    let object = payload.as_object().ok_or_else(|| {
        ConfigDerivationError::MalformedPayload("payload is not a JSON object".to_string())
    })?;

    match object.get("ref") {
        None | Some(JsonValue::Null) => Ok(PULL_REQUEST_BRANCH.to_string()),
        Some(JsonValue::String(r)) if r.is_empty() => Ok(PULL_REQUEST_BRANCH.to_string()),
        // Fixed-width strip: refs that don't start with refs/heads/ lose
        // their first 11 characters all the same.
        Some(JsonValue::String(r)) => Ok(r.chars().skip(REF_PREFIX_LEN).collect()),
        Some(other) => Err(ConfigDerivationError::MalformedPayload(format!(
            "ref must be a string, got {}",
            other
        ))),
    }
}

fn short_sha(commit: &str) -> String {
    commit.chars().take(SHORT_SHA_LEN).collect()
}
