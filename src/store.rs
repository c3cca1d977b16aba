//! Access to the remote secrets store.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_secretsmanager::types::{Filter, FilterNameStringType};
use aws_sdk_secretsmanager::Client;
use tracing::info;

use crate::clients;
use crate::resolver::SecretDescriptor;
use crate::settings::LocalstackSettings;

/// Ordered enumeration and retrieval of secrets from a remote store.
#[async_trait]
pub trait SecretsStore: Send + Sync {
    /// List available secrets, optionally filtered by exact name on the
    /// server side.
    async fn list(&self, name_filter: Option<&str>) -> Result<Vec<SecretDescriptor>>;

    /// Fetch the payload string of one secret.
    async fn fetch(&self, descriptor: &SecretDescriptor) -> Result<String>;
}

/// Secrets store backed by AWS Secrets Manager.
#[derive(Clone, Debug)]
pub struct AwsSecretsStore {
    client: Client,
}

impl AwsSecretsStore {
    /// Store reachable with ambient credentials and default endpoints.
    pub async fn from_env() -> Self {
        let config = clients::default_aws_config().await;
        Self {
            client: Client::new(&config),
        }
    }

    /// Store pointed at a Localstack instance.
    pub async fn localstack(settings: &LocalstackSettings) -> Self {
        let config = clients::localstack_aws_config(settings).await;
        Self {
            client: Client::new(&config),
        }
    }
}

#[async_trait]
impl SecretsStore for AwsSecretsStore {
    async fn list(&self, name_filter: Option<&str>) -> Result<Vec<SecretDescriptor>> {
        let mut request = self.client.list_secrets();
        if let Some(name) = name_filter {
            let filter = Filter::builder()
                .key(FilterNameStringType::Name)
                .values(name)
                .build();
            request = request.filters(filter);
        }

        let mut descriptors = Vec::new();
        let mut pages = request.into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page?;
            for entry in page.secret_list() {
                let name = entry.name().context("secret entry is missing a name")?;
                let arn = entry.arn().context("secret entry is missing an ARN")?;
                descriptors.push(SecretDescriptor::new(name, arn));
            }
        }
        Ok(descriptors)
    }

    async fn fetch(&self, descriptor: &SecretDescriptor) -> Result<String> {
        info!(name = %descriptor.name, "fetching secret");

        let resp = self
            .client
            .get_secret_value()
            .secret_id(&descriptor.arn)
            .send()
            .await?;

        let secret = resp.secret_string().context("missing secret string")?;
        Ok(secret.to_string())
    }
}

/// An in-memory store with fixed contents, used for testing importers.
#[doc(hidden)]
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    secrets: Vec<(SecretDescriptor, String)>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a secret with its payload, preserving insertion order.
    pub fn with(mut self, descriptor: SecretDescriptor, payload: impl Into<String>) -> Self {
        self.secrets.push((descriptor, payload.into()));
        self
    }
}

#[async_trait]
impl SecretsStore for MemoryStore {
    async fn list(&self, name_filter: Option<&str>) -> Result<Vec<SecretDescriptor>> {
        Ok(self
            .secrets
            .iter()
            .map(|(descriptor, _)| descriptor)
            .filter(|descriptor| name_filter.map_or(true, |name| descriptor.name == name))
            .cloned()
            .collect())
    }

    async fn fetch(&self, descriptor: &SecretDescriptor) -> Result<String> {
        match self.secrets.iter().find(|(d, _)| d.arn == descriptor.arn) {
            Some((_, payload)) => Ok(payload.clone()),
            None => bail!("no secret stored under {}", descriptor.arn),
        }
    }
}
