//! Construction of AWS service clients, redirected to Localstack when the
//! emulator is configured.
//!
//! One `SdkConfig` is built at startup and shared by every service client.
//! Under the emulator it carries the endpoint URL (plain HTTP) and the
//! placeholder credentials; otherwise the ambient provider chain applies.

use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region};
use aws_types::sdk_config::SdkConfig;
use tracing::info;

use crate::settings::LocalstackSettings;

/// Region SQS queues live in, pinned in production.
const SQS_REGION: &str = "eu-west-1";

/// Region reported to the emulator, which accepts any.
const LOCALSTACK_REGION: &str = "us-east-1";

/// AWS SDK config from the ambient environment.
pub async fn default_aws_config() -> SdkConfig {
    let region_provider = RegionProviderChain::default_provider();
    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}

/// AWS SDK config pointed at a Localstack endpoint.
pub async fn localstack_aws_config(settings: &LocalstackSettings) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .endpoint_url(settings.endpoint_url())
        .credentials_provider(settings.credentials())
        .region(Region::new(LOCALSTACK_REGION))
        .load()
        .await
}

/// Factory for AWS service clients sharing one SDK configuration.
#[derive(Clone, Debug)]
pub struct ClientSettings {
    config: SdkConfig,
    localstack: bool,
}

impl ClientSettings {
    /// Build the shared configuration once, at startup.
    pub async fn new(localstack: Option<&LocalstackSettings>) -> Self {
        match localstack {
            Some(settings) => {
                info!(endpoint = %settings.endpoint_url(), "redirecting AWS clients to Localstack");
                Self {
                    config: localstack_aws_config(settings).await,
                    localstack: true,
                }
            }
            None => Self {
                config: default_aws_config().await,
                localstack: false,
            },
        }
    }

    /// Secrets Manager client.
    pub fn secrets_manager(&self) -> aws_sdk_secretsmanager::Client {
        aws_sdk_secretsmanager::Client::new(&self.config)
    }

    /// SNS client.
    pub fn sns(&self) -> aws_sdk_sns::Client {
        aws_sdk_sns::Client::new(&self.config)
    }

    /// SES client.
    pub fn ses(&self) -> aws_sdk_ses::Client {
        aws_sdk_ses::Client::new(&self.config)
    }

    /// S3 client. The emulator requires path-style bucket addressing.
    pub fn s3(&self) -> aws_sdk_s3::Client {
        let mut builder = aws_sdk_s3::config::Builder::from(&self.config);
        if self.localstack {
            builder = builder.force_path_style(true);
        }
        aws_sdk_s3::Client::from_conf(builder.build())
    }

    /// SQS client, pinned to its queue region in production.
    pub fn sqs(&self) -> aws_sdk_sqs::Client {
        if self.localstack {
            return aws_sdk_sqs::Client::new(&self.config);
        }
        let config = aws_sdk_sqs::config::Builder::from(&self.config)
            .region(Region::new(SQS_REGION))
            .build();
        aws_sdk_sqs::Client::from_conf(config)
    }

    /// DynamoDB client.
    pub fn dynamodb(&self) -> aws_sdk_dynamodb::Client {
        aws_sdk_dynamodb::Client::new(&self.config)
    }
}
