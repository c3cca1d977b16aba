//! Importing remote secrets into the application's configuration layer.
//!
//! An importer pairs a [`SecretsStore`] with a [`ResolutionPolicy`] and
//! produces ordered `(configuration key, value)` entries. Loading is
//! all-or-nothing: the first failure aborts the whole import, so no partial
//! configuration is ever produced.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::info;

use crate::config::flatten_document;
use crate::resolver::{KeyMapping, ResolutionPolicy, SecretDescriptor};
use crate::settings::{AppEnv, LocalstackSettings};
use crate::store::{AwsSecretsStore, SecretsStore};

/// Where a secrets import runs, decided once at startup.
#[derive(Clone, Debug)]
pub enum ImportTarget {
    /// Real AWS with ambient credentials.
    Aws,
    /// The Localstack emulator.
    Localstack(LocalstackSettings),
    /// No import at all: development without an emulator configured.
    Skip,
}

impl ImportTarget {
    /// Select the target from the environment/emulator pair.
    ///
    /// The four combinations are closed: development with the emulator runs
    /// against it, development without one skips the import silently,
    /// production without one runs against AWS, and production with the
    /// emulator configured refuses to start.
    pub fn select(env: AppEnv, localstack: Option<LocalstackSettings>) -> Result<Self> {
        match (env, localstack) {
            (AppEnv::Development, Some(settings)) => Ok(Self::Localstack(settings)),
            (AppEnv::Development, None) => Ok(Self::Skip),
            (AppEnv::Production, Some(_)) => bail!("Localstack is only allowed in Development"),
            (AppEnv::Production, None) => Ok(Self::Aws),
        }
    }
}

/// Pulls secrets from a store and resolves them into configuration entries.
pub struct SecretsImporter<S> {
    store: S,
    policy: ResolutionPolicy,
}

impl<S: SecretsStore> SecretsImporter<S> {
    /// Pair a store with a resolution policy.
    pub fn new(store: S, policy: ResolutionPolicy) -> Self {
        Self { store, policy }
    }

    /// Load all accepted secrets and resolve them into ordered entries.
    pub async fn load(&self) -> Result<Vec<(String, String)>> {
        let name_filter = match &self.policy {
            ResolutionPolicy::Document { secret_name, .. } => Some(secret_name.as_str()),
            ResolutionPolicy::ArnOnly(_) | ResolutionPolicy::NameOrArn(_) => None,
        };

        let mut entries = Vec::new();
        for descriptor in self.store.list(name_filter).await? {
            if !self.policy.accepts(&descriptor) {
                continue;
            }
            let payload = self.store.fetch(&descriptor).await?;
            self.resolve(&descriptor, &payload, &mut entries)?;
        }
        info!(count = entries.len(), "resolved secret entries");
        Ok(entries)
    }

    fn resolve(
        &self,
        descriptor: &SecretDescriptor,
        payload: &str,
        entries: &mut Vec<(String, String)>,
    ) -> Result<()> {
        match &self.policy {
            ResolutionPolicy::Document { .. } => {
                let document: Value = serde_json::from_str(payload).with_context(|| {
                    format!("secret {} does not hold a JSON document", descriptor.name)
                })?;
                for (raw_key, value) in flatten_document(&document)? {
                    let key = self.policy.rename(descriptor, &raw_key)?;
                    entries.push((key, value));
                }
            }
            ResolutionPolicy::ArnOnly(_) | ResolutionPolicy::NameOrArn(_) => {
                let key = self.policy.rename(descriptor, "")?;
                entries.push((key, payload.to_string()));
            }
        }
        Ok(())
    }
}

/// Import individually mapped secrets, one flat value each.
///
/// Outside development the mapping must be keyed strictly by ARN; against the
/// emulator names are accepted too, since its ARNs are synthetic. In
/// development without an emulator the import is skipped and no entries are
/// produced.
pub async fn import_mapped_secrets(
    env: AppEnv,
    localstack: Option<LocalstackSettings>,
    mapping: KeyMapping,
) -> Result<Vec<(String, String)>> {
    match ImportTarget::select(env, localstack)? {
        ImportTarget::Aws => {
            let policy = ResolutionPolicy::arn_only(mapping)?;
            let store = AwsSecretsStore::from_env().await;
            SecretsImporter::new(store, policy).load().await
        }
        ImportTarget::Localstack(settings) => {
            let policy = ResolutionPolicy::NameOrArn(mapping);
            let store = AwsSecretsStore::localstack(&settings).await;
            SecretsImporter::new(store, policy).load().await
        }
        ImportTarget::Skip => Ok(Vec::new()),
    }
}

/// Import one named secret holding a JSON document of configuration values.
///
/// The secret name is also passed to the store as a server-side filter, so
/// only matching secrets are enumerated at all.
pub async fn import_secret_document(
    env: AppEnv,
    localstack: Option<LocalstackSettings>,
    secret_name: &str,
    key_map: KeyMapping,
) -> Result<Vec<(String, String)>> {
    let policy = ResolutionPolicy::Document {
        secret_name: secret_name.to_string(),
        key_map,
    };
    match ImportTarget::select(env, localstack)? {
        ImportTarget::Aws => {
            let store = AwsSecretsStore::from_env().await;
            SecretsImporter::new(store, policy).load().await
        }
        ImportTarget::Localstack(settings) => {
            let store = AwsSecretsStore::localstack(&settings).await;
            SecretsImporter::new(store, policy).load().await
        }
        ImportTarget::Skip => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::{import_mapped_secrets, import_secret_document, ImportTarget};
    use crate::resolver::KeyMapping;
    use crate::settings::{AppEnv, LocalstackSettings};

    fn localstack() -> Option<LocalstackSettings> {
        Some(LocalstackSettings::new("localhost", 4566))
    }

    #[test]
    fn development_with_emulator_targets_localstack() {
        let target = ImportTarget::select(AppEnv::Development, localstack()).unwrap();
        assert!(matches!(target, ImportTarget::Localstack(_)));
    }

    #[test]
    fn development_without_emulator_skips() {
        let target = ImportTarget::select(AppEnv::Development, None).unwrap();
        assert!(matches!(target, ImportTarget::Skip));
    }

    #[test]
    fn production_without_emulator_targets_aws() {
        let target = ImportTarget::select(AppEnv::Production, None).unwrap();
        assert!(matches!(target, ImportTarget::Aws));
    }

    #[test]
    fn production_with_emulator_is_fatal() {
        assert!(ImportTarget::select(AppEnv::Production, localstack()).is_err());
    }

    #[tokio::test]
    async fn development_without_emulator_imports_nothing() {
        let mapping = KeyMapping::new().with("db-password", "Database:Password");
        let entries = import_mapped_secrets(AppEnv::Development, None, mapping)
            .await
            .unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn production_rejects_non_arn_mapping_before_any_fetch() {
        let mapping = KeyMapping::new().with("db-password", "Database:Password");
        let result = import_mapped_secrets(AppEnv::Production, None, mapping).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn document_import_refuses_emulator_in_production() {
        let result =
            import_secret_document(AppEnv::Production, localstack(), "app-config", KeyMapping::new())
                .await;
        assert!(result.is_err());
    }
}
