//! Run configuration
//!
//! The immutable, strongly-typed configuration of one pipeline run. Built
//! once per event by [`crate::derive::derive_run_config`] and passed by
//! reference to the pure builder functions.

use crate::domain::event::EventKind;
use crate::domain::secret::Secret;

/// Branch value used when the payload carries no `ref`
pub const PULL_REQUEST_BRANCH: &str = "PR";

/// Immutable configuration of one pipeline run
///
/// Fields are private so nothing can mutate the value after derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    registry_url: String,
    registry_username: String,
    registry_password: Secret,
    base_image_name: String,
    commit_sha: String,
    event_kind: EventKind,
    branch: String,
    build_date: String,
    image_tag: String,
    container_image: String,
}

/// Raw parts a `RunConfig` is composed from
pub(crate) struct RunConfigParts {
    pub registry_url: String,
    pub registry_username: String,
    pub registry_password: Secret,
    pub base_image_name: String,
    pub commit_sha: String,
    pub event_kind: EventKind,
    pub branch: String,
    pub build_date: String,
}

impl RunConfig {
    /// Composes the derived fields (`image_tag`, `container_image`)
    pub(crate) fn compose(parts: RunConfigParts) -> Self {
        let image_tag = format!("{}-{}", parts.branch, parts.commit_sha);
        let container_image = format!("{}/{}", parts.registry_url, parts.base_image_name);

        Self {
            registry_url: parts.registry_url,
            registry_username: parts.registry_username,
            registry_password: parts.registry_password,
            base_image_name: parts.base_image_name,
            commit_sha: parts.commit_sha,
            event_kind: parts.event_kind,
            branch: parts.branch,
            build_date: parts.build_date,
            image_tag,
            container_image,
        }
    }

    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    pub fn registry_username(&self) -> &str {
        &self.registry_username
    }

    pub fn registry_password(&self) -> &Secret {
        &self.registry_password
    }

    pub fn base_image_name(&self) -> &str {
        &self.base_image_name
    }

    /// Short commit id (first 7 characters)
    pub fn commit_sha(&self) -> &str {
        &self.commit_sha
    }

    pub fn event_kind(&self) -> &EventKind {
        &self.event_kind
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// UTC calendar date the run started, `YYYY-MM-DD`
    pub fn build_date(&self) -> &str {
        &self.build_date
    }

    /// `{branch}-{commit_sha}`
    pub fn image_tag(&self) -> &str {
        &self.image_tag
    }

    /// `{registry_url}/{base_image_name}`
    pub fn container_image(&self) -> &str {
        &self.container_image
    }

    /// Fully qualified reference that gets pushed and deployed
    pub fn image_reference(&self) -> String {
        format!("{}:{}", self.container_image, self.image_tag)
    }

    pub fn is_pull_request(&self) -> bool {
        self.branch == PULL_REQUEST_BRANCH
    }
}
