//! Pipeline assembly
//!
//! Pure functions composing the build-and-push and deploy jobs from a
//! [`RunConfig`]. The returned pipeline always runs build-and-push first.

use crate::domain::job::JobSpec;
use crate::domain::pipeline::Pipeline;
use crate::domain::run::RunConfig;
use crate::settings::PipelineSettings;

pub const BUILD_JOB_NAME: &str = "job-runner-docker";
pub const DEPLOY_JOB_NAME: &str = "job-runner-helm";

/// Env var carrying the registry password into the build job
pub const REGISTRY_PASSWORD_ENV: &str = "REGISTRY_PASSWORD";

/// Builds the two-stage pipeline for `config`
pub fn build_pipeline(config: &RunConfig, settings: &PipelineSettings) -> Pipeline {
    Pipeline::new(vec![
        build_and_push_job(config, settings),
        deploy_job(config, settings, &settings.deploy_type),
    ])
}

/// Builds the image inside a privileged container-daemon environment and
/// pushes `{container_image}:{image_tag}`
pub fn build_and_push_job(config: &RunConfig, settings: &PipelineSettings) -> JobSpec {
    let image_ref = config.image_reference();
    let base_image = config.base_image_name();

    JobSpec::new(BUILD_JOB_NAME)
        .image(&settings.builder_image)
        .privileged(true)
        .persistent_storage(false)
        .secret_env(REGISTRY_PASSWORD_ENV, config.registry_password().clone())
        .step("dockerd-entrypoint.sh &")
        .step(format!("echo waiting && sleep {}", settings.daemon_grace_secs))
        .step(format!("cd {}", settings.source_dir))
        .step(format!(
            "printf '%s' \"${}\" | docker login {} -u {} --password-stdin",
            REGISTRY_PASSWORD_ENV,
            config.registry_url(),
            config.registry_username()
        ))
        .step(format!(
            "docker build --build-arg BUILD_DATE={} --build-arg IMAGE_TAG_REF={} --build-arg VCS_REF={} -t {} .",
            config.build_date(),
            config.image_tag(),
            config.commit_sha(),
            base_image
        ))
        .step(format!("docker tag {} {}", base_image, image_ref))
        .step(format!("docker push {}", image_ref))
        .step("killall dockerd")
}

/// Upgrades (or installs) the `{release_prefix}-{deploy_type}` release with
/// the freshly pushed image
pub fn deploy_job(config: &RunConfig, settings: &PipelineSettings, deploy_type: &str) -> JobSpec {
    JobSpec::new(DEPLOY_JOB_NAME)
        .image(&settings.deploy_image)
        .persistent_storage(false)
        .step(format!("cd {}", settings.source_dir))
        .step(format!("git clone {}", settings.chart_repository))
        .step(format!("cd {}", settings.chart_checkout_dir))
        .step(format!(
            "helm upgrade --install {} {} --set web.image={} --set web.imageTag={}",
            settings.release_name(deploy_type),
            settings.chart_path,
            config.container_image(),
            config.image_tag()
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::derive_run_config;
    use crate::domain::event::{Event, EventKind, ProjectSecrets};
    use crate::domain::secret::Secret;
    use chrono::{TimeZone, Utc};

    fn run_config() -> RunConfig {
        let event = Event {
            kind: EventKind::Push,
            commit: "abcdef1234567".to_string(),
            payload: r#"{"ref":"refs/heads/master"}"#.to_string(),
        };
        let secrets = ProjectSecrets {
            registry_url: "registry.example.com".to_string(),
            registry_username: "deployer".to_string(),
            registry_password: Secret::new("p4ss"),
            notification_webhook: Secret::new("https://hooks.example.com/T0"),
        };
        derive_run_config(
            &event,
            &secrets,
            &PipelineSettings::default(),
            Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_runs_before_deploy() {
        let pipeline = build_pipeline(&run_config(), &PipelineSettings::default());
        assert_eq!(pipeline.job_names(), vec![BUILD_JOB_NAME, DEPLOY_JOB_NAME]);
    }

    #[test]
    fn test_build_job_shape() {
        let job = build_and_push_job(&run_config(), &PipelineSettings::default());

        assert_eq!(job.runtime_image.as_deref(), Some("chzbrgr71/dockernd:node"));
        assert!(job.privileged);
        assert!(!job.persistent_storage_enabled);
        assert_eq!(job.steps.len(), 8);
        assert_eq!(job.steps[0], "dockerd-entrypoint.sh &");
        assert_eq!(job.steps[1], "echo waiting && sleep 20");
        assert_eq!(job.steps[2], "cd /src/");
        assert!(job.steps[3].contains("docker login registry.example.com -u deployer"));
        assert_eq!(
            job.steps[4],
            "docker build --build-arg BUILD_DATE=2024-03-09 --build-arg IMAGE_TAG_REF=master-abcdef1 --build-arg VCS_REF=abcdef1 -t squillace/node-debug ."
        );
        assert_eq!(
            job.steps[5],
            "docker tag squillace/node-debug registry.example.com/squillace/node-debug:master-abcdef1"
        );
        assert_eq!(
            job.steps[6],
            "docker push registry.example.com/squillace/node-debug:master-abcdef1"
        );
        assert_eq!(job.steps[7], "killall dockerd");
    }

    #[test]
    fn test_password_only_travels_as_secret_env() {
        let job = build_and_push_job(&run_config(), &PipelineSettings::default());

        assert!(job.steps.iter().all(|step| !step.contains("p4ss")));
        assert_eq!(
            job.secret_env
                .get(REGISTRY_PASSWORD_ENV)
                .map(|s| s.expose()),
            Some("p4ss")
        );
    }

    #[test]
    fn test_deploy_job_shape() {
        let job = deploy_job(&run_config(), &PipelineSettings::default(), "prod");

        assert_eq!(job.runtime_image.as_deref(), Some("chzbrgr71/k8s-helm:v2.7.2"));
        assert!(!job.privileged);
        assert!(!job.persistent_storage_enabled);
        assert_eq!(
            job.steps,
            vec![
                "cd /src/".to_string(),
                "git clone https://github.com/squillace/draft-env-sample.git".to_string(),
                "cd rating-charts".to_string(),
                "helm upgrade --install node-prod charts/javascript --set web.image=registry.example.com/squillace/node-debug --set web.imageTag=master-abcdef1".to_string(),
            ]
        );
    }

    #[test]
    fn test_deploy_type_selects_release() {
        let job = deploy_job(&run_config(), &PipelineSettings::default(), "staging");
        assert!(job.steps[3].starts_with("helm upgrade --install node-staging "));
    }
}
