//! Process settings computed once from the environment at startup.
//!
//! Presence of the Localstack host variable is what switches the process into
//! emulator mode. The resulting settings object is passed explicitly to the
//! client factories and the secrets importer, never re-read per call.

use std::env::{self, VarError};
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use aws_credential_types::Credentials;

/// Environment variable naming the Localstack host.
pub const LOCALSTACK_HOST_VAR: &str = "LOCALSTACK_HOST";

/// Environment variable overriding the Localstack port.
pub const LOCALSTACK_PORT_VAR: &str = "LOCALSTACK_PORT";

const DEFAULT_PORT: u16 = 4566;

/// The hosting environment the application runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppEnv {
    /// Local development, the only environment allowed to talk to Localstack.
    Development,
    /// Everything that is not development.
    Production,
}

impl FromStr for AppEnv {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => bail!("unknown environment {other:?}"),
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Connection settings for a Localstack instance.
#[derive(Clone, Debug)]
pub struct LocalstackSettings {
    host: String,
    port: u16,
}

impl LocalstackSettings {
    /// Create settings directly, bypassing the environment.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Read emulator settings from the environment.
    ///
    /// Returns `None` when the host variable is unset. A present but
    /// malformed port value is a hard error, never a silent fallback to the
    /// default port.
    pub fn from_env() -> Result<Option<Self>> {
        let host = match env::var(LOCALSTACK_HOST_VAR) {
            Ok(host) => host,
            Err(_) => return Ok(None),
        };
        let port = match env::var(LOCALSTACK_PORT_VAR) {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("invalid {LOCALSTACK_PORT_VAR} value {raw:?}"))?,
            Err(VarError::NotPresent) => DEFAULT_PORT,
            Err(err) => {
                return Err(err).with_context(|| format!("could not read {LOCALSTACK_PORT_VAR}"))
            }
        };
        Ok(Some(Self { host, port }))
    }

    /// Endpoint URL the emulator listens on. Always plain HTTP.
    pub fn endpoint_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Placeholder credentials accepted by the emulator.
    pub fn credentials(&self) -> Credentials {
        Credentials::new("accessKey", "secretKey", None, None, "localstack")
    }
}
