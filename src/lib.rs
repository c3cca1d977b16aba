//! Rigging wires AWS service clients and remote secrets into an
//! application's configuration, with a parallel Localstack code path for
//! development.
//!
//! Secrets pulled from AWS Secrets Manager are filtered and renamed by a
//! [`resolver::ResolutionPolicy`] into flat configuration entries, then
//! folded into a nested configuration tree. Service clients (Secrets
//! Manager, SNS, SES, S3, SQS, DynamoDB) are constructed from one shared SDK
//! configuration that targets either real AWS or the emulator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod clients;
pub mod config;
pub mod import;
pub mod resolver;
pub mod settings;
pub mod store;

pub use crate::cli::Args;
pub use crate::clients::ClientSettings;
pub use crate::import::{import_mapped_secrets, import_secret_document, SecretsImporter};
pub use crate::resolver::{KeyMapping, ResolutionPolicy, SecretDescriptor};
pub use crate::settings::{AppEnv, LocalstackSettings};
