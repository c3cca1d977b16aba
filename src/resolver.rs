//! Filtering and renaming of remote secrets into configuration keys.
//!
//! A [`ResolutionPolicy`] decides which secrets reported by the store are
//! relevant and what configuration key each raw in-secret key maps to. Both
//! decisions are pure functions of the descriptor, the raw key, and the
//! caller-supplied mapping.

use std::collections::HashMap;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::KEY_DELIMITER;

/// Prefix every real AWS resource identifier starts with.
const ARN_PREFIX: &str = "arn:";

/// Separator expressing nested sections inside a flat secret key, expanded
/// into [`KEY_DELIMITER`] on import.
const SECTION_SEPARATOR: &str = "__";

/// Identity of a secret as reported by the remote store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDescriptor {
    /// Human-readable secret name.
    pub name: String,
    /// Unique, immutable resource identifier.
    pub arn: String,
}

impl SecretDescriptor {
    /// Create a descriptor from its parts.
    pub fn new(name: impl Into<String>, arn: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arn: arn.into(),
        }
    }
}

/// Caller-supplied mapping applied while importing secrets.
///
/// Keys are secret names or ARNs (mapped import) or raw in-secret keys
/// (document import); values are the local configuration keys to store
/// under. Immutable once the import starts.
#[derive(Clone, Debug, Default)]
pub struct KeyMapping {
    map: HashMap<String, String>,
}

impl KeyMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Default::default()
    }

    /// Add one entry, builder style.
    pub fn with(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.map.insert(from.into(), to.into());
        self
    }

    /// Look up the local key mapped under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// Whether `key` has a mapping.
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Iterate over the mapping's keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }
}

impl FromIterator<(String, String)> for KeyMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// How fetched secrets are filtered and renamed into configuration keys.
#[derive(Clone, Debug)]
pub enum ResolutionPolicy {
    /// Secrets are keyed strictly by ARN, one flat value per secret. Built
    /// through [`ResolutionPolicy::arn_only`] so that non-ARN keys are
    /// rejected before anything is fetched.
    ArnOnly(KeyMapping),
    /// Secrets match by name or ARN, one flat value per secret. Used against
    /// the emulator, whose ARNs are synthetic.
    NameOrArn(KeyMapping),
    /// One named secret holding a JSON document; every leaf of the document
    /// becomes a configuration entry.
    Document {
        /// Name of the secret to import.
        secret_name: String,
        /// Raw-key overrides consulted before section expansion.
        key_map: KeyMapping,
    },
}

impl ResolutionPolicy {
    /// Build the strict ARN-keyed policy, rejecting any non-ARN key up front.
    pub fn arn_only(mapping: KeyMapping) -> Result<Self> {
        for key in mapping.keys() {
            ensure!(
                key.starts_with(ARN_PREFIX),
                "only ARNs are allowed outside of Localstack, got {key:?}"
            );
        }
        Ok(Self::ArnOnly(mapping))
    }

    /// Whether a secret reported by the store is relevant to this policy.
    pub fn accepts(&self, descriptor: &SecretDescriptor) -> bool {
        match self {
            Self::ArnOnly(mapping) => mapping.contains(&descriptor.arn),
            Self::NameOrArn(mapping) => {
                mapping.contains(&descriptor.name) || mapping.contains(&descriptor.arn)
            }
            Self::Document { secret_name, .. } => descriptor.name == *secret_name,
        }
    }

    /// Local configuration key for one raw key of an accepted secret.
    ///
    /// For the flat-value policies the raw key is irrelevant: the whole
    /// secret maps to a single configuration key. For document import the
    /// last delimited segment of the raw key is either looked up in the
    /// mapping or has its section separators expanded.
    pub fn rename(&self, descriptor: &SecretDescriptor, raw_key: &str) -> Result<String> {
        match self {
            Self::ArnOnly(mapping) => mapping
                .get(&descriptor.arn)
                .map(String::from)
                .with_context(|| format!("secret {} is not in the key mapping", descriptor.arn)),
            Self::NameOrArn(mapping) => mapping
                .get(&descriptor.name)
                .or_else(|| mapping.get(&descriptor.arn))
                .map(String::from)
                .with_context(|| {
                    format!("no configuration key mapped for secret {}", descriptor.name)
                }),
            Self::Document { key_map, .. } => {
                let candidate = raw_key.rsplit(KEY_DELIMITER).next().unwrap_or(raw_key);
                Ok(match key_map.get(candidate) {
                    Some(mapped) => mapped.to_string(),
                    None => candidate.replace(SECTION_SEPARATOR, KEY_DELIMITER),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyMapping, ResolutionPolicy, SecretDescriptor};

    const DB_ARN: &str = "arn:aws:secretsmanager:eu-west-1:123456789012:secret:db-password-AbCdEf";

    fn descriptor(name: &str, arn: &str) -> SecretDescriptor {
        SecretDescriptor::new(name, arn)
    }

    #[test]
    fn arn_only_rejects_non_arn_keys() {
        let mapping = KeyMapping::new()
            .with(DB_ARN, "Database:Password")
            .with("db-password", "Database:Password");
        assert!(ResolutionPolicy::arn_only(mapping).is_err());
    }

    #[test]
    fn arn_only_accepts_by_arn() {
        let mapping = KeyMapping::new().with(DB_ARN, "Database:Password");
        let policy = ResolutionPolicy::arn_only(mapping).unwrap();

        assert!(policy.accepts(&descriptor("db-password", DB_ARN)));
        assert!(!policy.accepts(&descriptor("db-password", "arn:aws:other")));
    }

    #[test]
    fn arn_only_renames_ignoring_raw_key() {
        let mapping = KeyMapping::new().with(DB_ARN, "Database:Password");
        let policy = ResolutionPolicy::arn_only(mapping).unwrap();

        let key = policy
            .rename(&descriptor("db-password", DB_ARN), "whatever")
            .unwrap();
        assert_eq!(key, "Database:Password");
    }

    #[test]
    fn name_or_arn_accepts_by_either() {
        let mapping = KeyMapping::new().with("db-password", "Database:Password");
        let policy = ResolutionPolicy::NameOrArn(mapping);

        assert!(policy.accepts(&descriptor("db-password", "arn:local:0")));
        assert!(!policy.accepts(&descriptor("other", "arn:local:1")));

        let mapping = KeyMapping::new().with("arn:local:0", "Database:Password");
        let policy = ResolutionPolicy::NameOrArn(mapping);
        assert!(policy.accepts(&descriptor("db-password", "arn:local:0")));
    }

    #[test]
    fn name_or_arn_prefers_name_over_arn() {
        let mapping = KeyMapping::new()
            .with("db-password", "ByName")
            .with("arn:local:0", "ByArn");
        let policy = ResolutionPolicy::NameOrArn(mapping);

        let key = policy
            .rename(&descriptor("db-password", "arn:local:0"), "")
            .unwrap();
        assert_eq!(key, "ByName");
    }

    #[test]
    fn name_or_arn_fails_on_unmapped_secret() {
        let policy = ResolutionPolicy::NameOrArn(KeyMapping::new());
        assert!(policy.rename(&descriptor("ghost", "arn:local:0"), "").is_err());
    }

    #[test]
    fn document_accepts_by_configured_name() {
        let policy = ResolutionPolicy::Document {
            secret_name: "app-config".to_string(),
            key_map: KeyMapping::new(),
        };

        assert!(policy.accepts(&descriptor("app-config", "arn:local:0")));
        assert!(!policy.accepts(&descriptor("other-config", "arn:local:1")));
    }

    #[test]
    fn document_uses_mapped_alias_for_known_keys() {
        let policy = ResolutionPolicy::Document {
            secret_name: "app-config".to_string(),
            key_map: KeyMapping::new().with("ConnectionString", "Database:ConnectionString"),
        };

        let key = policy
            .rename(&descriptor("app-config", "arn:local:0"), "ConnectionString")
            .unwrap();
        assert_eq!(key, "Database:ConnectionString");
    }

    #[test]
    fn document_expands_section_separators() {
        let policy = ResolutionPolicy::Document {
            secret_name: "app-config".to_string(),
            key_map: KeyMapping::new(),
        };
        let descriptor = descriptor("app-config", "arn:local:0");

        assert_eq!(policy.rename(&descriptor, "Foo__Bar").unwrap(), "Foo:Bar");
        assert_eq!(
            policy.rename(&descriptor, "Logging__Level__Default").unwrap(),
            "Logging:Level:Default",
        );
    }

    #[test]
    fn document_takes_last_segment_of_nested_keys() {
        let policy = ResolutionPolicy::Document {
            secret_name: "app-config".to_string(),
            key_map: KeyMapping::new().with("Port", "Smtp:Port"),
        };
        let descriptor = descriptor("app-config", "arn:local:0");

        assert_eq!(policy.rename(&descriptor, "a:b:c__d").unwrap(), "c:d");
        assert_eq!(policy.rename(&descriptor, "Outer:Port").unwrap(), "Smtp:Port");
    }
}
