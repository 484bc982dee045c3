//! AWS provisioner implementation

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration,
    PublicAccessBlockConfiguration, ServerSideEncryption, ServerSideEncryptionByDefault,
    ServerSideEncryptionConfiguration, ServerSideEncryptionRule, Tag, Tagging,
    VersioningConfiguration,
};

use aws_sdk_apprunner::types::{
    AuthenticationConfiguration, ImageConfiguration, ImageRepository, ImageRepositoryType,
    SourceConfiguration,
};

use skylift_core::{
    AppServiceSpec, Encryption, Provisioner, ResourceHandle, Result, StackError, StorageProps,
};

/// Trust policy for the App Runner build principal.
const APPRUNNER_ASSUME_ROLE_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Effect": "Allow",
      "Principal": { "Service": "build.apprunner.amazonaws.com" },
      "Action": "sts:AssumeRole"
    }
  ]
}"#;

/// Managed policy granting App Runner pull access to ECR.
const ECR_ACCESS_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSAppRunnerServicePolicyForECRAccess";

/// Bucket tags recording lifecycle intent the SDK has no native
/// equivalent for (teardown tooling honors these).
const TAG_REMOVAL_POLICY: &str = "skylift:removal-policy";
const TAG_AUTO_DELETE: &str = "skylift:auto-delete-objects";

/// Provisioner backed by the AWS SDK.
pub struct AwsProvisioner {
    s3: aws_sdk_s3::Client,
    ecr: aws_sdk_ecr::Client,
    iam: aws_sdk_iam::Client,
    apprunner: aws_sdk_apprunner::Client,
    region: Option<String>,
}

impl AwsProvisioner {
    /// Builds clients from the default credential/region chain.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(&config)
    }

    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            s3: aws_sdk_s3::Client::new(config),
            ecr: aws_sdk_ecr::Client::new(config),
            iam: aws_sdk_iam::Client::new(config),
            apprunner: aws_sdk_apprunner::Client::new(config),
            region: config.region().map(|r| r.to_string()),
        }
    }

    /// ARN of the App Runner service registered under `service_name`,
    /// resolved through the paginated service listing.
    async fn find_service_arn(&self, service_name: &str) -> Result<Option<String>> {
        let mut next_token: Option<String> = None;
        loop {
            let mut request = self.apprunner.list_services();
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }
            let response = request.send().await.map_err(backend_error)?;

            if let Some(summary) = response
                .service_summary_list()
                .iter()
                .find(|s| s.service_name() == Some(service_name))
            {
                return Ok(summary.service_arn().map(str::to_string));
            }

            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                return Ok(None);
            }
        }
    }
}

#[async_trait]
impl Provisioner for AwsProvisioner {
    async fn create_bucket(&self, name: &str, props: &StorageProps) -> Result<ResourceHandle> {
        debug!(bucket = %name, ?props, "creating S3 bucket");

        let mut request = self
            .s3
            .create_bucket()
            .bucket(name)
            .object_lock_enabled_for_bucket(props.object_lock_enabled);
        // us-east-1 is the one region that must not carry a location
        // constraint.
        if let Some(region) = self.region.as_deref().filter(|r| *r != "us-east-1") {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        request.send().await.map_err(backend_error)?;

        if props.versioned {
            self.s3
                .put_bucket_versioning()
                .bucket(name)
                .versioning_configuration(
                    VersioningConfiguration::builder()
                        .status(BucketVersioningStatus::Enabled)
                        .build(),
                )
                .send()
                .await
                .map_err(backend_error)?;
        }

        let algorithm = match props.encryption {
            Encryption::ProviderManaged => ServerSideEncryption::Aes256,
            Encryption::Kms => ServerSideEncryption::AwsKms,
        };
        self.s3
            .put_bucket_encryption()
            .bucket(name)
            .server_side_encryption_configuration(
                ServerSideEncryptionConfiguration::builder()
                    .rules(
                        ServerSideEncryptionRule::builder()
                            .apply_server_side_encryption_by_default(
                                ServerSideEncryptionByDefault::builder()
                                    .sse_algorithm(algorithm)
                                    .build()
                                    .map_err(config_error)?,
                            )
                            .build(),
                    )
                    .build()
                    .map_err(config_error)?,
            )
            .send()
            .await
            .map_err(backend_error)?;

        if props.public_read_access {
            self.s3
                .put_public_access_block()
                .bucket(name)
                .public_access_block_configuration(
                    PublicAccessBlockConfiguration::builder()
                        .block_public_acls(false)
                        .ignore_public_acls(false)
                        .block_public_policy(false)
                        .restrict_public_buckets(false)
                        .build(),
                )
                .send()
                .await
                .map_err(backend_error)?;
        }

        self.s3
            .put_bucket_tagging()
            .bucket(name)
            .tagging(
                Tagging::builder()
                    .tag_set(
                        Tag::builder()
                            .key(TAG_REMOVAL_POLICY)
                            .value(props.removal_policy.to_string())
                            .build()
                            .map_err(config_error)?,
                    )
                    .tag_set(
                        Tag::builder()
                            .key(TAG_AUTO_DELETE)
                            .value(props.auto_delete_objects.to_string())
                            .build()
                            .map_err(config_error)?,
                    )
                    .build()
                    .map_err(config_error)?,
            )
            .send()
            .await
            .map_err(backend_error)?;

        info!(bucket = %name, "S3 bucket created");
        Ok(ResourceHandle::new(format!("arn:aws:s3:::{name}"))
            .with_attribute("bucket_name", json!(name))
            .with_attribute("bucket_uri", json!(format!("s3://{name}"))))
    }

    async fn resolve_image_repo(&self, repository_name: &str) -> Result<ResourceHandle> {
        debug!(repository = %repository_name, "resolving ECR repository");

        let response = self
            .ecr
            .describe_repositories()
            .repository_names(repository_name)
            .send()
            .await
            .map_err(backend_error)?;

        let repository = response.repositories().first().ok_or_else(|| {
            StackError::Backend {
                code: "RepositoryNotFoundException".to_string(),
                message: format!("ECR repository '{repository_name}' not found"),
            }
        })?;

        let arn = repository.repository_arn().unwrap_or_default().to_string();
        let uri = repository.repository_uri().unwrap_or_default().to_string();

        Ok(ResourceHandle::new(arn)
            .with_attribute("repository_name", json!(repository_name))
            .with_attribute("repository_uri", json!(uri)))
    }

    async fn create_service_role(&self, service_name: &str) -> Result<ResourceHandle> {
        let role_name = execution_role_name(service_name);
        info!(role = %role_name, "creating App Runner execution role");

        let response = self
            .iam
            .create_role()
            .role_name(&role_name)
            .assume_role_policy_document(APPRUNNER_ASSUME_ROLE_POLICY)
            .send()
            .await
            .map_err(backend_error)?;

        let role_arn = response
            .role()
            .map(|r| r.arn().to_string())
            .ok_or_else(|| StackError::Backend {
                code: "ServiceFailure".to_string(),
                message: format!("IAM returned no role for '{role_name}'"),
            })?;

        self.iam
            .attach_role_policy()
            .role_name(&role_name)
            .policy_arn(ECR_ACCESS_POLICY_ARN)
            .send()
            .await
            .map_err(backend_error)?;

        Ok(ResourceHandle::new(role_arn).with_attribute("role_name", json!(role_name)))
    }

    async fn create_app_service(&self, spec: &AppServiceSpec) -> Result<ResourceHandle> {
        info!(service = %spec.service_name, image = %spec.image_identifier, "creating App Runner service");

        let mut image_configuration = ImageConfiguration::builder().port(spec.port.to_string());
        for (key, value) in &spec.env_vars {
            image_configuration = image_configuration.runtime_environment_variables(key, value);
        }

        let source_configuration = SourceConfiguration::builder()
            .image_repository(
                ImageRepository::builder()
                    .image_identifier(&spec.image_identifier)
                    .image_repository_type(ImageRepositoryType::Ecr)
                    .image_configuration(image_configuration.build())
                    .build()
                    .map_err(config_error)?,
            )
            .auto_deployments_enabled(spec.auto_deployments)
            .authentication_configuration(
                AuthenticationConfiguration::builder()
                    .access_role_arn(&spec.access_role_arn)
                    .build(),
            )
            .build();

        let response = self
            .apprunner
            .create_service()
            .service_name(&spec.service_name)
            .source_configuration(source_configuration)
            .send()
            .await
            .map_err(backend_error)?;

        let service = response.service().ok_or_else(|| StackError::Backend {
            code: "ServiceFailure".to_string(),
            message: format!("App Runner returned no service for '{}'", spec.service_name),
        })?;

        info!(service = %spec.service_name, "App Runner service creation submitted");
        Ok(ResourceHandle::new(service.service_arn())
            .with_attribute("service_url", json!(service.service_url().unwrap_or_default()))
            .with_attribute("status", json!(service.status().as_str())))
    }

    async fn destroy_service(&self, service_name: &str) -> Result<()> {
        let arn = self
            .find_service_arn(service_name)
            .await?
            .ok_or_else(|| StackError::Backend {
                code: "ResourceNotFoundException".to_string(),
                message: format!("no App Runner service named '{service_name}'"),
            })?;

        info!(service = %service_name, "deleting App Runner service");
        self.apprunner
            .delete_service()
            .service_arn(arn)
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}

fn execution_role_name(service_name: &str) -> String {
    format!("{service_name}-apprunner-ecr-access")
}

/// Maps any SDK failure to the core backend error, keeping the native
/// error code.
fn backend_error<E, R>(err: SdkError<E, R>) -> StackError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
    R: std::fmt::Debug,
{
    let code = err.code().unwrap_or("Unknown").to_string();
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{err:?}"));
    StackError::Backend { code, message }
}

/// Builder-level configuration failures (missing required members).
fn config_error(err: impl std::fmt::Display) -> StackError {
    StackError::Backend {
        code: "InvalidConfiguration".to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assume_role_policy_is_valid_json() {
        let policy: serde_json::Value = serde_json::from_str(APPRUNNER_ASSUME_ROLE_POLICY).unwrap();
        assert_eq!(
            policy["Statement"][0]["Principal"]["Service"],
            json!("build.apprunner.amazonaws.com")
        );
    }

    #[test]
    fn test_execution_role_name() {
        assert_eq!(execution_role_name("svc-a"), "svc-a-apprunner-ecr-access");
    }
}
