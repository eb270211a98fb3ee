//! Event domain types
//!
//! What the event-delivery transport hands us: the triggering event and the
//! project's secret bundle.

use serde::{Deserialize, Serialize};

use crate::domain::secret::Secret;

/// A source-control event that may trigger a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Full commit identifier
    #[serde(default)]
    pub commit: String,

    /// Serialized JSON body of the source-control webhook
    #[serde(default)]
    pub payload: String,
}

/// Category of the triggering event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Push,
    /// Manually triggered run
    Exec,
    PullRequest,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Push => "push",
            EventKind::Exec => "exec",
            EventKind::PullRequest => "pull_request",
            EventKind::Other(name) => name,
        }
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "push" => EventKind::Push,
            "exec" => EventKind::Exec,
            "pull_request" => EventKind::PullRequest,
            _ => EventKind::Other(value),
        }
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        EventKind::from(value.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-project secret bundle. Read-only input to every run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSecrets {
    pub registry_url: String,
    pub registry_username: String,
    pub registry_password: Secret,
    pub notification_webhook: Secret,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_names() {
        assert_eq!(EventKind::from("push"), EventKind::Push);
        assert_eq!(EventKind::from("exec"), EventKind::Exec);
        assert_eq!(EventKind::from("pull_request"), EventKind::PullRequest);
        assert_eq!(
            EventKind::from("image_push"),
            EventKind::Other("image_push".to_string())
        );
        assert_eq!(EventKind::Other("x".to_string()).to_string(), "x");
    }

    #[test]
    fn test_event_deserializes_type_field() {
        let event: Event = serde_json::from_str(
            r#"{"type":"push","commit":"abcdef1234567","payload":"{\"ref\":\"refs/heads/master\"}"}"#,
        )
        .unwrap();

        assert_eq!(event.kind, EventKind::Push);
        assert_eq!(event.commit, "abcdef1234567");
        assert!(event.payload.contains("refs/heads/master"));
    }

    #[test]
    fn test_secrets_debug_hides_credentials() {
        let secrets = ProjectSecrets {
            registry_url: "registry.example.com".to_string(),
            registry_username: "bot".to_string(),
            registry_password: Secret::new("s3cret"),
            notification_webhook: Secret::new("https://hooks.example.com/T000"),
        };

        let debug = format!("{:?}", secrets);
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("hooks.example.com"));
    }
}
