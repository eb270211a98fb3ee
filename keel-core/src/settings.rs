//! Pipeline settings
//!
//! Static knobs for the build and deploy jobs. Defaults reproduce the
//! single-project setup this pipeline was written for; every field can be
//! overridden through serde.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Only pushes to this branch execute the pipeline
    pub release_branch: String,

    /// Logical name of the application image
    pub base_image_name: String,

    /// Image with a container daemon for build-and-push
    pub builder_image: String,

    /// Image with chart-deployment tooling
    pub deploy_image: String,

    /// Seconds to wait for the container daemon to come up
    pub daemon_grace_secs: u64,

    /// Where the checked-out source lives inside job containers
    pub source_dir: String,

    pub chart_repository: String,
    pub chart_checkout_dir: String,
    pub chart_path: String,

    /// Release name is `{release_prefix}-{deploy_type}`
    pub release_prefix: String,
    pub deploy_type: String,

    pub notifier_image: String,

    /// Sender identity on completion notifications
    pub sender: String,
}

impl PipelineSettings {
    pub fn release_name(&self, deploy_type: &str) -> String {
        format!("{}-{}", self.release_prefix, deploy_type)
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            release_branch: "master".to_string(),
            base_image_name: "squillace/node-debug".to_string(),
            builder_image: "chzbrgr71/dockernd:node".to_string(),
            deploy_image: "chzbrgr71/k8s-helm:v2.7.2".to_string(),
            daemon_grace_secs: 20,
            source_dir: "/src/".to_string(),
            chart_repository: "https://github.com/squillace/draft-env-sample.git".to_string(),
            chart_checkout_dir: "rating-charts".to_string(),
            chart_path: "charts/javascript".to_string(),
            release_prefix: "node".to_string(),
            deploy_type: "prod".to_string(),
            notifier_image: "technosophos/slack-notify:latest".to_string(),
            sender: "keel".to_string(),
        }
    }
}
